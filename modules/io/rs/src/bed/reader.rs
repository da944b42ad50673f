use std::io::BufRead;
use std::path::Path;

use eyre::{bail, ensure, eyre, Result, WrapErr};

use biobit_collections_rs::genomic_index::GenomicIndex;
use biobit_core_rs::loc::{Interval, Orientation};

use super::record::Bed6;
use crate::compression;
use crate::ReadRecord;

pub mod parse {
    use super::*;

    fn field<'a>(parts: &mut impl Iterator<Item = &'a str>, what: &str) -> Result<&'a str> {
        parts.next().ok_or_else(|| eyre!("Missing BED {what}"))
    }

    pub fn interval<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Interval<u64>> {
        let start = field(parts, "start")?.parse();
        let end = field(parts, "end")?.parse();
        match (start, end) {
            (Ok(start), Ok(end)) => Interval::new(start, end),
            _ => bail!("BED coordinates must be non-negative integers"),
        }
    }

    pub fn orientation<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Orientation> {
        match field(parts, "strand")? {
            "+" => Ok(Orientation::Forward),
            "-" => Ok(Orientation::Reverse),
            "." => Ok(Orientation::Dual),
            other => bail!("BED strand must be one of +, - or ., got {other}"),
        }
    }

    pub fn bed6<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Bed6> {
        let seqid = field(parts, "seqid")?.to_owned();
        let interval = interval(parts)?;
        let name = field(parts, "name")?.to_owned();
        let score = field(parts, "score")?
            .parse()
            .wrap_err("BED score must be an integer")?;
        Bed6::new(seqid, interval, name, score, orientation(parts)?)
    }
}

/// Line-oriented BED6 reader. Empty lines and `#`/`track`/`browser` header lines are skipped.
pub struct Reader<R> {
    reader: R,
    buffer: String,
}

impl<R: BufRead> Reader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
        }
    }
}

impl Reader<Box<dyn BufRead + Send + Sync>> {
    /// Create a new BED reader from the given file path. Gzip compression is detected from
    /// the file signature.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(compression::read_file(path)?.box_bufread()))
    }
}

fn is_header(line: &str) -> bool {
    line.is_empty()
        || line.starts_with('#')
        || line.starts_with("track")
        || line.starts_with("browser")
}

impl<R: BufRead> ReadRecord for Reader<R> {
    type Record = Bed6;

    fn read_record(&mut self, into: &mut Bed6) -> Result<bool> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(false);
            }

            let line = self.buffer.trim_end_matches(['\n', '\r']);
            if is_header(line) {
                continue;
            }

            let mut parts = line.split('\t');
            *into = parse::bed6(&mut parts)
                .wrap_err_with(|| format!("Failed to parse BED record: {line}"))?;
            ensure!(
                parts.next().is_none(),
                "BED record has too many fields: {line}"
            );
            return Ok(true);
        }
    }
}

/// Read a BED6 file into a genomic index keyed by (seqid, orientation). Each interval is
/// annotated with its name. Records rejected by the filter are skipped.
pub fn read_index(
    path: impl AsRef<Path>,
    mut filter: impl FnMut(&Bed6) -> bool,
) -> Result<GenomicIndex<String, u64, String>> {
    let path = path.as_ref();
    let mut reader = Reader::from_path(path)?;

    let mut builder = GenomicIndex::builder();
    let (mut total, mut kept) = (0usize, 0usize);
    let mut record = Bed6::default();
    while reader
        .read_record(&mut record)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?
    {
        total += 1;
        if !filter(&record) {
            continue;
        }
        kept += 1;

        let (seqid, interval, name, _, orientation) = std::mem::take(&mut record).dissolve();
        builder.add(seqid, orientation, interval, name);
    }
    log::debug!(
        "Indexed {kept} out of {total} BED records from {}",
        path.display()
    );
    Ok(builder.build())
}
