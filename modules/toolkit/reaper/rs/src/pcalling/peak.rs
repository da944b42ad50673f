use derive_getters::{Dissolve, Getters};
use eyre::{ensure, Result};

use biobit_core_rs::loc::{Interval, IntervalOp};
use biobit_core_rs::num::{Float, PrimInt};

/// An enriched region. P/q-values are -log10 transformed.
#[derive(Clone, PartialEq, Debug, Dissolve, Getters)]
pub struct Peak<Idx: PrimInt, Cnts> {
    interval: Interval<Idx>,
    fe: Cnts,
    pvalue: Cnts,
    qvalue: Cnts,
    summits: Vec<Idx>,
}

impl<Idx: PrimInt, Cnts: Float> Peak<Idx, Cnts> {
    pub fn new(
        interval: Interval<Idx>,
        fe: Cnts,
        pvalue: Cnts,
        qvalue: Cnts,
        summits: Vec<Idx>,
    ) -> Result<Self> {
        ensure!(!summits.is_empty(), "Peak must have at least one summit");
        for summit in &summits {
            ensure!(
                interval.start() <= *summit && *summit < interval.end(),
                "Summit must be within the peak, got {summit:?} for {interval:?}"
            );
        }

        Ok(Self {
            interval,
            fe,
            pvalue,
            qvalue,
            summits,
        })
    }

    /// The first summit, reported when a single position is needed.
    pub fn summit(&self) -> Idx {
        self.summits[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_new() -> Result<()> {
        let interval = Interval::new(10u32, 20)?;
        let peak = Peak::new(interval, 2.0f32, 5.0, 3.0, vec![12, 17])?;
        assert_eq!(peak.summit(), 12);
        assert_eq!(peak.interval(), &interval);

        assert!(Peak::new(interval, 2.0f32, 5.0, 3.0, vec![]).is_err());
        assert!(Peak::new(interval, 2.0f32, 5.0, 3.0, vec![20]).is_err());
        assert!(Peak::new(interval, 2.0f32, 5.0, 3.0, vec![15, 9]).is_err());
        Ok(())
    }
}
