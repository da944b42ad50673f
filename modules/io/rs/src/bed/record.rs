use biobit_core_rs::loc::{Interval, IntervalOp, Orientation};
use derive_getters::{Dissolve, Getters};
use eyre::Result;

use super::validate;

/// A BED6 record: seqid, interval, name, score, and orientation.
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Getters, Dissolve)]
pub struct Bed6 {
    seqid: String,
    interval: Interval<u64>,
    name: String,
    score: u16,
    orientation: Orientation,
}

impl Bed6 {
    pub fn new(
        seqid: String,
        interval: Interval<u64>,
        name: String,
        score: u16,
        orientation: Orientation,
    ) -> Result<Self> {
        validate::seqid(&seqid)?;
        validate::name(&name)?;
        validate::score(&score)?;
        Ok(Self {
            seqid,
            interval,
            name,
            score,
            orientation,
        })
    }
}

impl Default for Bed6 {
    fn default() -> Self {
        Self {
            seqid: "_".to_owned(),
            interval: Interval::default(),
            name: ".".to_owned(),
            score: 0,
            orientation: Orientation::Dual,
        }
    }
}

/// A narrowPeak record (BED6+4): signal value, -log10 p-value, -log10 q-value, and the summit
/// offset relative to the peak start. Missing values are encoded as -1.
#[derive(Debug, Clone, PartialOrd, PartialEq, Getters, Dissolve)]
pub struct NarrowPeak {
    seqid: String,
    interval: Interval<u64>,
    name: String,
    score: u16,
    orientation: Orientation,
    signal: f64,
    pvalue: f64,
    qvalue: f64,
    peak: i64,
}

impl NarrowPeak {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seqid: String,
        interval: Interval<u64>,
        name: String,
        score: u16,
        orientation: Orientation,
        signal: f64,
        pvalue: f64,
        qvalue: f64,
        peak: i64,
    ) -> Result<Self> {
        validate::seqid(&seqid)?;
        validate::name(&name)?;
        validate::score(&score)?;
        for value in [&signal, &pvalue, &qvalue] {
            validate::signal(value)?;
        }
        validate::peak(interval.len(), &peak)?;

        Ok(Self {
            seqid,
            interval,
            name,
            score,
            orientation,
            signal,
            pvalue,
            qvalue,
            peak,
        })
    }
}

impl From<NarrowPeak> for Bed6 {
    fn from(value: NarrowPeak) -> Self {
        Bed6 {
            seqid: value.seqid,
            interval: value.interval,
            name: value.name,
            score: value.score,
            orientation: value.orientation,
        }
    }
}
