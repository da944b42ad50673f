use std::io::Write;
use std::marker::PhantomData;
use std::path::Path;

use biobit_core_rs::loc::IntervalOp;
use eyre::Result;

use super::record::{Bed6, NarrowPeak};
use crate::compression::{self, Encoding};
use crate::WriteRecord;

pub struct Writer<W, Bed> {
    writer: W,
    _phantom: PhantomData<Bed>,
}

impl<Bed> Writer<Box<dyn Write + Send + Sync>, Bed> {
    /// Create a writer for the given path, gzip-compressed if the path ends with `.gz`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let encoding = Encoding::from_path(&path);
        Ok(Self::new(compression::write_file(path, encoding)?))
    }
}

impl<W: Write, Bed> Writer<W, Bed> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            _phantom: PhantomData,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> WriteRecord for Writer<W, Bed6> {
    type Record = Bed6;

    fn write_record(&mut self, record: &Self::Record) -> Result<()> {
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            record.seqid(),
            record.interval().start(),
            record.interval().end(),
            record.name(),
            record.score(),
            record.orientation().bed_symbol()
        )?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> WriteRecord for Writer<W, NarrowPeak> {
    type Record = NarrowPeak;

    fn write_record(&mut self, record: &Self::Record) -> Result<()> {
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            record.seqid(),
            record.interval().start(),
            record.interval().end(),
            record.name(),
            record.score(),
            record.orientation().bed_symbol(),
            record.signal(),
            record.pvalue(),
            record.qvalue(),
            record.peak()
        )?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
