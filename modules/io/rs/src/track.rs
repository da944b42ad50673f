//! Plain-text coverage tracks: a `#<contig>\t<length>` header line for each contig, followed by
//! `contig\tstart\tend\tvalue` rows. Contigs are sorted by name, rows by start.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use biobit_core_rs::loc::{Interval, IntervalOp};
use eyre::{ensure, eyre, Result};

use crate::compression::{self, Encoding};

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    length: u64,
    cells: Vec<(Interval<u64>, f64)>,
}

/// Accumulates per-contig coverage and writes the whole track at once on `finish`.
pub struct Writer<W: Write> {
    writer: W,
    contigs: BTreeMap<String, Entry>,
}

impl Writer<Box<dyn Write + Send + Sync>> {
    /// Create a writer for the given path, gzip-compressed if the path ends with `.gz`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let encoding = Encoding::from_path(&path);
        Ok(Self::new(compression::write_file(path, encoding)?))
    }
}

impl<W: Write> Writer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            contigs: BTreeMap::new(),
        }
    }

    /// Add the coverage of a single contig. Cells must be sorted, non-overlapping, and lie within
    /// the contig. Each contig can be added only once.
    pub fn add(
        &mut self,
        contig: impl Into<String>,
        length: u64,
        cells: impl IntoIterator<Item = (Interval<u64>, f64)>,
    ) -> Result<&mut Self> {
        let contig = contig.into();
        ensure!(
            !self.contigs.contains_key(&contig),
            "Contig {contig} was already added to the track"
        );

        let cells: Vec<_> = cells.into_iter().collect();
        let mut position = 0;
        for (interval, _) in &cells {
            ensure!(
                interval.start() >= position && interval.end() <= length,
                "Track cells for {contig} must be sorted, disjoint and within [0, {length}), \
                got {interval}"
            );
            position = interval.end();
        }

        self.contigs.insert(contig, Entry { length, cells });
        Ok(self)
    }

    /// Write the header and all rows, returning the underlying stream.
    pub fn finish(mut self) -> Result<W> {
        for (contig, entry) in &self.contigs {
            writeln!(self.writer, "#{}\t{}", contig, entry.length)?;
        }
        for (contig, entry) in &self.contigs {
            for (interval, value) in &entry.cells {
                writeln!(
                    self.writer,
                    "{}\t{}\t{}\t{}",
                    contig,
                    interval.start(),
                    interval.end(),
                    value
                )?;
            }
        }
        self.writer
            .flush()
            .map_err(|err| eyre!("Failed to flush the track: {err}"))?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_writer() -> Result<()> {
        let mut writer = Writer::new(Vec::new());
        writer
            .add("chr2", 10, [(Interval::new(0, 10)?, 0.0)])?
            .add(
                "chr1",
                20,
                [(Interval::new(0, 5)?, 0.0), (Interval::new(5, 20)?, 1.5)],
            )?;

        // Duplicates and malformed cells are rejected
        assert!(writer.add("chr1", 20, []).is_err());
        assert!(writer
            .add("chr3", 5, [(Interval::new(0, 10)?, 1.0)])
            .is_err());
        assert!(writer
            .add(
                "chr4",
                50,
                [(Interval::new(10, 20)?, 1.0), (Interval::new(5, 15)?, 1.0)]
            )
            .is_err());

        let content = String::from_utf8(writer.finish()?)?;
        assert_eq!(
            content,
            "#chr1\t20\n#chr2\t10\nchr1\t0\t5\t0\nchr1\t5\t20\t1.5\nchr2\t0\t10\t0\n"
        );
        Ok(())
    }
}
