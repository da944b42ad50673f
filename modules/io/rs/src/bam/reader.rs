use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{eyre, Result, WrapErr};
use noodles::core::region::Interval as RegionInterval;
use noodles::core::Position;
use noodles::csi::BinningIndex;
use noodles::{bam, sam};

use biobit_core_rs::loc::{Interval, IntervalOp};
use biobit_core_rs::ngs::{AlignedBlocks, Layout};
use biobit_core_rs::source::{Source, SourceStats};

use super::blocks;
use super::bundler::MatesBundler;
use super::indexed_reader::{self, Handle};
use super::query::{Filters, Query};

/// Indexed BAM file as a source of aligned fragments.
///
/// Clones share the header and the index but open their own file handle on the first fetch.
pub struct Reader {
    filename: PathBuf,
    header: Arc<sam::Header>,
    index: Arc<dyn BinningIndex + Send + Sync>,
    handle: Option<Handle>,
    filters: Filters,
    layout: Layout,
    cache: Vec<bam::Record>,
    blocks: Vec<Interval<usize>>,
    bundler: Option<MatesBundler<bam::Record>>,
    stats: SourceStats,
}

impl Reader {
    pub(super) fn new(
        filename: PathBuf,
        handle: Handle,
        header: Arc<sam::Header>,
        index: Arc<dyn BinningIndex + Send + Sync>,
        filters: Filters,
        layout: Layout,
        batch_size: usize,
    ) -> Self {
        let bundler = match layout {
            Layout::Single { .. } => None,
            Layout::Paired { .. } => Some(MatesBundler::default()),
        };
        Self {
            filename,
            header,
            index,
            handle: Some(handle),
            filters,
            layout,
            cache: vec![bam::Record::default(); batch_size],
            blocks: Vec::new(),
            bundler,
            stats: SourceStats::default(),
        }
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn header(&self) -> &sam::Header {
        &self.header
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Names and lengths of all reference sequences listed in the header.
    pub fn contigs(&self) -> Vec<(String, usize)> {
        self.header
            .reference_sequences()
            .iter()
            .map(|(name, seq)| (name.to_string(), seq.length().get()))
            .collect()
    }

    // Turn a batch of filtered records into fragments, returns the number of consumed records
    fn process(
        layout: &Layout,
        records: &mut [bam::Record],
        bundler: Option<&mut MatesBundler<bam::Record>>,
        blocks: &mut Vec<Interval<usize>>,
        into: &mut AlignedBlocks<usize>,
    ) -> Result<()> {
        match bundler {
            None => {
                for record in records.iter() {
                    let flags = record.flags();
                    let orientation =
                        layout.deduce(flags.is_first_segment(), flags.is_reverse_complemented());

                    blocks.clear();
                    blocks::parse_record(record, blocks)?;
                    into.push(orientation, blocks.drain(..))?;
                }
            }
            Some(bundler) => {
                for record in records.iter_mut() {
                    let (lmate, rmate) = match bundler.push(mem::take(record))? {
                        Some(pair) => pair,
                        None => continue,
                    };
                    let orientation = layout.deduce(true, lmate.flags().is_reverse_complemented());

                    blocks.clear();
                    blocks::parse_record(&lmate, blocks)?;
                    blocks::parse_record(&rmate, blocks)?;
                    into.push(orientation, blocks.drain(..))?;
                }
            }
        }
        Ok(())
    }
}

impl Clone for Reader {
    fn clone(&self) -> Self {
        Self {
            filename: self.filename.clone(),
            header: Arc::clone(&self.header),
            index: Arc::clone(&self.index),
            handle: None,
            filters: self.filters,
            layout: self.layout,
            cache: vec![bam::Record::default(); self.cache.len()],
            blocks: Vec::new(),
            bundler: self.bundler.as_ref().map(|_| MatesBundler::default()),
            stats: self.stats,
        }
    }
}

impl Source for Reader {
    type Ctg = String;
    type Idx = usize;

    fn fetch(
        &mut self,
        contig: &Self::Ctg,
        interval: Interval<Self::Idx>,
        into: &mut AlignedBlocks<Self::Idx>,
    ) -> Result<()> {
        if interval.is_empty() {
            return Ok(());
        }

        let reference_sequence_id = self
            .header
            .reference_sequences()
            .get_index_of(contig.as_bytes())
            .ok_or_else(|| {
                eyre!(
                    "Contig {contig} is not present in the header of {}",
                    self.filename.display()
                )
            })?;
        let region = RegionInterval::from(
            Position::try_from(interval.start() + 1)?..=Position::try_from(interval.end())?,
        );
        let chunks = self.index.query(reference_sequence_id, region)?;

        let handle = match &mut self.handle {
            Some(handle) => handle,
            handle @ None => handle.insert(indexed_reader::open(&self.filename)?),
        };
        let mut query = Query::new(
            handle.get_mut(),
            chunks,
            reference_sequence_id,
            region,
            self.filters,
        );

        let mut consumed = 0;
        loop {
            let read = query.read(&mut self.cache)?;
            if read == 0 {
                break;
            }
            consumed += read as u64;
            Self::process(
                &self.layout,
                &mut self.cache[..read],
                self.bundler.as_mut(),
                &mut self.blocks,
                into,
            )
            .wrap_err_with(|| format!("Failed to process records of {contig}{interval}"))?;
        }

        let unpaired = self.bundler.as_mut().map(|x| x.flush()).unwrap_or(0);
        self.stats += SourceStats::new(consumed, query.discarded(), unpaired);
        Ok(())
    }

    fn stats(&self) -> SourceStats {
        self.stats
    }
}
