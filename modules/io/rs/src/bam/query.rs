use std::io;

use noodles::sam::alignment::Record as _;
use noodles::{
    bam, bam::io::Reader, bgzf, core::region::Interval, csi,
    csi::binning_index::index::reference_sequence::bin::Chunk,
};

/// Flag and mapping quality filters applied to every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filters {
    pub inflags: u16,
    pub exflags: u16,
    pub minmapq: u8,
}

impl Filters {
    pub fn accept(&self, record: &bam::Record) -> bool {
        let flags = u16::from(record.flags());
        let mapq = record.mapping_quality().map(|x| x.get()).unwrap_or(255);
        flags & self.inflags == self.inflags && flags & self.exflags == 0 && mapq >= self.minmapq
    }
}

/// Records of one indexed region, read in batches. Records failing the filters are skipped and
/// counted.
pub struct Query<'a, R> {
    reader: Reader<csi::io::Query<'a, R>>,
    reference_sequence_id: usize,
    interval: Interval,
    filters: Filters,
    discarded: u64,
}

impl<'a, R> Query<'a, R>
where
    R: bgzf::io::BufRead + bgzf::io::Seek,
{
    pub fn new(
        reader: &'a mut R,
        chunks: Vec<Chunk>,
        reference_sequence_id: usize,
        interval: Interval,
        filters: Filters,
    ) -> Self {
        Self {
            reader: Reader::from(csi::io::Query::new(reader, chunks)),
            reference_sequence_id,
            interval,
            filters,
            discarded: 0,
        }
    }

    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    fn in_region(&self, record: &bam::Record) -> io::Result<bool> {
        match (
            record.reference_sequence_id().transpose()?,
            record.alignment_start().transpose()?,
            record.alignment_end().transpose()?,
        ) {
            (Some(id), Some(start), Some(end)) => Ok(id == self.reference_sequence_id
                && self.interval.intersects((start..=end).into())),
            _ => Ok(false),
        }
    }

    /// Fill the cache with the next records, returns the number of records read. Zero means the
    /// region is exhausted.
    pub fn read(&mut self, cache: &mut [bam::Record]) -> io::Result<usize> {
        let mut processed = 0;
        while processed < cache.len() {
            if self.reader.read_record(&mut cache[processed])? == 0 {
                break;
            }

            // Chunks may contain records outside of the region
            if !self.in_region(&cache[processed])? {
                continue;
            }
            if !self.filters.accept(&cache[processed]) {
                self.discarded += 1;
                continue;
            }
            processed += 1;
        }
        Ok(processed)
    }
}
