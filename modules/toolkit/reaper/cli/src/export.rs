use std::io::Write;
use std::path::Path;

use eyre::{eyre, Result};

use biobit_core_rs::loc::{Interval, IntervalOp, Orientation, Strand};
use biobit_io_rs::bed::{self, NarrowPeak};
use biobit_io_rs::{track, WriteRecord};
use biobit_reaper_rs::{track as rtrack, Harvest};

pub type Results = [Harvest<String, usize, f32>];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Signal {
    Treatment,
    Control,
    FoldEnrichment,
}

impl Signal {
    pub const ALL: [Signal; 3] = [Signal::Treatment, Signal::Control, Signal::FoldEnrichment];

    fn name(&self) -> &'static str {
        match self {
            Signal::Treatment => "treatment",
            Signal::Control => "control",
            Signal::FoldEnrichment => "fe",
        }
    }

    fn cells(&self, harvest: &Harvest<String, usize, f32>) -> Result<Vec<(Interval<u64>, f64)>> {
        let cells: Vec<(u64, u64, f32)> = match self {
            Signal::Treatment => rtrack::cells(harvest.treatment()).collect(),
            Signal::Control => rtrack::cells(harvest.control()).collect(),
            Signal::FoldEnrichment => harvest
                .enrichment()
                .cells()
                .map(|x| (x.start, x.end, x.fe))
                .collect(),
        };
        cells
            .into_iter()
            .map(|(start, end, value)| Ok((Interval::new(start, end)?, value as f64)))
            .collect()
    }
}

fn strand_suffix(strand: Strand) -> &'static str {
    match strand {
        Strand::Forward => "fwd",
        Strand::Reverse => "rev",
    }
}

/// Write one gzipped track per signal and strand: `<signal>.<fwd|rev>.track.gz`.
pub fn tracks(outdir: &Path, results: &Results) -> Result<()> {
    for signal in Signal::ALL {
        for strand in Strand::BOTH {
            let path = outdir.join(format!(
                "{}.{}.track.gz",
                signal.name(),
                strand_suffix(strand)
            ));

            let mut writer = track::Writer::from_path(&path)?;
            for harvest in results.iter().filter(|x| *x.strand() == strand) {
                writer.add(
                    harvest.contig().clone(),
                    *harvest.length() as u64,
                    signal.cells(harvest)?,
                )?;
            }
            writer.finish()?.flush()?;
            log::debug!("Saved {}", path.display());
        }
    }
    Ok(())
}

/// Convert called peaks to narrowPeak records, ordered as the results.
pub fn narrowpeaks(results: &Results) -> Result<Vec<NarrowPeak>> {
    let mut records = Vec::new();
    for harvest in results {
        let orientation = Orientation::from(*harvest.strand());
        for peak in harvest.peaks() {
            let interval = peak
                .interval()
                .cast::<u64>()
                .ok_or_else(|| eyre!("Peak {:?} doesn't fit in u64", peak.interval()))?;
            let summit = (peak.summit() - peak.interval().start()) as i64;

            records.push(NarrowPeak::new(
                harvest.contig().clone(),
                interval,
                ".".to_string(),
                0,
                orientation,
                *peak.fe() as f64,
                *peak.pvalue() as f64,
                *peak.qvalue() as f64,
                summit,
            )?);
        }
    }
    Ok(records)
}

pub fn peaks(path: &Path, results: &Results) -> Result<usize> {
    let records = narrowpeaks(results)?;
    let mut writer = bed::Writer::<_, NarrowPeak>::from_path(path)?;
    writer.write_records(&records)?;
    writer.flush()?;
    Ok(records.len())
}
