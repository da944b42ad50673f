use std::path::PathBuf;
use std::sync::Arc;

use eyre::{ensure, Result};

use biobit_core_rs::ngs::Layout;

use super::indexed_reader;
use super::query::Filters;
use super::reader::Reader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderBuilder {
    filename: PathBuf,
    inflags: Option<u16>,
    exflags: Option<u16>,
    minmapq: Option<u8>,
    batch_size: Option<usize>,
    layout: Option<Layout>,
}

impl ReaderBuilder {
    pub const DEFAULT_BATCH_SIZE: usize = 1024;
    /// Unmapped, QC-failed and supplementary alignments.
    pub const DEFAULT_EXFLAGS: u16 = 2564;

    pub fn new<T: Into<PathBuf>>(filename: T) -> Self {
        Self {
            filename: filename.into(),
            inflags: None,
            exflags: None,
            minmapq: None,
            batch_size: None,
            layout: None,
        }
    }

    pub fn with_inflags(mut self, inflags: u16) -> Self {
        self.inflags = Some(inflags);
        self
    }

    pub fn with_exflags(mut self, exflags: u16) -> Self {
        self.exflags = Some(exflags);
        self
    }

    pub fn with_minmapq(mut self, minmapq: u8) -> Self {
        self.minmapq = Some(minmapq);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Library layout used to deduce fragment orientation. Paired-end layouts enable mate
    /// bundling: each fragment is built from both mates.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn build(self) -> Result<Reader> {
        let batch_size = self.batch_size.unwrap_or(Self::DEFAULT_BATCH_SIZE);
        ensure!(batch_size > 0, "Batch size must be positive");

        let filters = Filters {
            inflags: self.inflags.unwrap_or(0),
            exflags: self.exflags.unwrap_or(Self::DEFAULT_EXFLAGS),
            minmapq: self.minmapq.unwrap_or(0),
        };
        let (handle, header, index) = indexed_reader::open_indexed(&self.filename)?;

        Ok(Reader::new(
            self.filename,
            handle,
            Arc::new(header),
            index,
            filters,
            self.layout.unwrap_or_default(),
            batch_size,
        ))
    }
}
