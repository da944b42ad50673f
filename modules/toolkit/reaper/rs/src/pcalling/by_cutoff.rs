use derive_getters::{Dissolve, Getters};
use eyre::{ensure, eyre, Result};

use biobit_core_rs::loc::{Interval, IntervalOp};
use biobit_core_rs::num::{Float, PrimInt};

use crate::cmp::{Cell, Enrichment};

use super::peak::Peak;

/// Threshold-and-stitch peak calling.
///
/// Cells passing all active cutoffs are stitched together when separated by at most
/// `merge_within` positions. Candidates shorter than `min_length` are dropped. P/q-value cutoffs
/// are probabilities, e.g. 0.01; fold-enrichment cutoff is a plain ratio.
#[derive(Clone, PartialEq, Debug, Dissolve, Getters)]
pub struct ByCutoff<Idx, Cnts> {
    qvcutoff: Option<Cnts>,
    pvcutoff: Option<Cnts>,
    fecutoff: Option<Cnts>,
    min_length: Idx,
    merge_within: Idx,
}

impl<Idx: PrimInt, Cnts: Float> Default for ByCutoff<Idx, Cnts> {
    fn default() -> Self {
        Self {
            qvcutoff: Cnts::from(0.01),
            pvcutoff: None,
            fecutoff: Cnts::from(2.0),
            min_length: Idx::from(50).unwrap_or_else(Idx::zero),
            merge_within: Idx::from(25).unwrap_or_else(Idx::zero),
        }
    }
}

impl<Idx: PrimInt, Cnts: Float> ByCutoff<Idx, Cnts> {
    pub fn new() -> Self {
        Self::default()
    }

    fn validate_probability(name: &str, value: Option<Cnts>) -> Result<()> {
        if let Some(value) = value {
            ensure!(
                value > Cnts::zero() && value <= Cnts::one(),
                "{name} cutoff must be in (0, 1], got {value:?}"
            );
        }
        Ok(())
    }

    pub fn set_qvcutoff(&mut self, qvcutoff: Option<Cnts>) -> Result<&mut Self> {
        Self::validate_probability("Q-value", qvcutoff)?;
        self.qvcutoff = qvcutoff;
        Ok(self)
    }

    pub fn set_pvcutoff(&mut self, pvcutoff: Option<Cnts>) -> Result<&mut Self> {
        Self::validate_probability("P-value", pvcutoff)?;
        self.pvcutoff = pvcutoff;
        Ok(self)
    }

    pub fn set_fecutoff(&mut self, fecutoff: Option<Cnts>) -> Result<&mut Self> {
        if let Some(fe) = fecutoff {
            ensure!(
                fe.is_finite() && fe > Cnts::zero(),
                "Fold-enrichment cutoff must be positive, got {fe:?}"
            );
        }
        self.fecutoff = fecutoff;
        Ok(self)
    }

    pub fn set_min_length(&mut self, min_length: Idx) -> &mut Self {
        self.min_length = min_length;
        self
    }

    pub fn set_merge_within(&mut self, merge_within: Idx) -> &mut Self {
        self.merge_within = merge_within;
        self
    }

    pub fn run(&self, enrichment: &Enrichment<Cnts>) -> Result<Vec<Peak<Idx, Cnts>>> {
        ensure!(
            self.qvcutoff.is_some() || self.pvcutoff.is_some() || self.fecutoff.is_some(),
            "At least one peak calling cutoff must be set"
        );
        ensure!(
            self.qvcutoff.is_none() || enrichment.has_qvalues(),
            "Q-value cutoff requires q-values to be calculated first"
        );

        // -log10 thresholds
        let neglog10 = |x: Cnts| -x.log10();
        let qvcutoff = self.qvcutoff.map(neglog10);
        let pvcutoff = self.pvcutoff.map(neglog10);
        let passes = |cell: &Cell<Cnts>| {
            qvcutoff.is_none_or(|cutoff| cell.qvalue >= cutoff)
                && pvcutoff.is_none_or(|cutoff| cell.pvalue >= cutoff)
                && self.fecutoff.is_none_or(|cutoff| cell.fe >= cutoff)
        };

        let mut peaks = Vec::new();
        let mut buffer: Vec<Cell<Cnts>> = Vec::new();
        for cell in enrichment.cells().filter(passes) {
            if let Some(last) = buffer.last() {
                let gap = self.to_idx(cell.start)? - self.to_idx(last.end)?;
                if gap > self.merge_within {
                    self.stitch(&buffer, &mut peaks)?;
                    buffer.clear();
                }
            }
            buffer.push(cell);
        }
        self.stitch(&buffer, &mut peaks)?;

        Ok(peaks)
    }

    fn to_idx(&self, x: u64) -> Result<Idx> {
        Idx::from(x).ok_or_else(|| eyre!("Position {x} doesn't fit in {:?}", Idx::max_value()))
    }

    fn stitch(&self, cells: &[Cell<Cnts>], saveto: &mut Vec<Peak<Idx, Cnts>>) -> Result<()> {
        let (first, last) = match (cells.first(), cells.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(()),
        };

        let interval = Interval::new(self.to_idx(first.start)?, self.to_idx(last.end)?)?;
        if interval.len() < self.min_length {
            return Ok(());
        }

        // Summits are midpoints of all cells with the maximum fold-enrichment
        let maxfe = cells.iter().map(|x| x.fe).fold(first.fe, Cnts::max);
        let summits = cells
            .iter()
            .filter(|x| x.fe == maxfe)
            .map(|x| self.to_idx((x.start + x.end) / 2))
            .collect::<Result<Vec<_>>>()?;

        // Report significance of the most significant cell
        let best = cells
            .iter()
            .fold(first, |acc, x| if x.qvalue > acc.qvalue { x } else { acc });

        saveto.push(Peak::new(
            interval,
            maxfe,
            best.pvalue,
            best.qvalue,
            summits,
        )?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cmp::{PValues, QTableBuilder};
    use crate::track::tests::track;

    use super::*;

    fn enrichment(treatment: &[(u64, f32)], control: &[(u64, f32)]) -> Enrichment<f32> {
        let mut enrichment =
            Enrichment::calculate(&track(treatment), &track(control), &mut PValues::new())
                .unwrap();
        let mut builder = QTableBuilder::new();
        enrichment.count_pvalues(&mut builder).unwrap();
        enrichment.apply(&builder.build().unwrap()).unwrap();
        enrichment
    }

    #[test]
    fn test_single_peak() -> Result<()> {
        let enrichment = enrichment(&[(200, 0.0), (250, 10.0), (1000, 0.0)], &[(1000, 1.0)]);
        let peaks = ByCutoff::<u64, f32>::new().run(&enrichment)?;

        assert_eq!(peaks.len(), 1);
        let peak = &peaks[0];
        assert_eq!(peak.interval(), &(200, 250));
        assert_eq!(peak.summits(), &[225]);
        assert!((peak.fe() - 10.0).abs() < 1e-6);
        assert!(*peak.qvalue() > 2.0);
        Ok(())
    }

    #[test]
    fn test_stitching_and_summits() -> Result<()> {
        let enrichment = enrichment(
            &[
                (100, 0.0),
                (120, 20.0),
                (130, 30.0),
                (140, 0.0),
                (150, 30.0),
                (170, 20.0),
                (300, 0.0),
                (310, 30.0),
                (1000, 0.0),
            ],
            &[(1000, 1.0)],
        );

        let mut caller = ByCutoff::<u64, f32>::new();
        caller
            .set_qvcutoff(None)?
            .set_fecutoff(Some(2.0))?
            .set_min_length(50)
            .set_merge_within(10);

        let peaks = caller.run(&enrichment)?;
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].interval(), &(100, 170));
        assert_eq!(peaks[0].summits(), &[125, 145]);
        assert_eq!(*peaks[0].fe(), 30.0);

        // Short candidates are kept once the size limit is lifted
        caller.set_min_length(0).set_merge_within(9);
        let peaks = caller.run(&enrichment)?;
        let intervals = peaks.iter().map(|x| *x.interval()).collect::<Vec<_>>();
        assert_eq!(intervals, vec![(100, 130), (140, 170), (300, 310)]);
        Ok(())
    }

    #[test]
    fn test_cutoffs_are_combined() -> Result<()> {
        let enrichment = enrichment(
            &[(100, 0.0), (200, 3.0), (1000, 0.0)],
            &[(1000, 1.0)],
        );

        let mut caller = ByCutoff::<u64, f32>::new();
        caller.set_qvcutoff(None)?.set_fecutoff(Some(2.0))?;
        assert_eq!(caller.run(&enrichment)?.len(), 1);

        // P(X >= 3; 1) ~ 0.08
        caller.set_pvcutoff(Some(0.01))?;
        assert!(caller.run(&enrichment)?.is_empty());
        caller.set_pvcutoff(Some(0.1))?;
        assert_eq!(caller.run(&enrichment)?.len(), 1);

        caller.set_fecutoff(Some(5.0))?;
        assert!(caller.run(&enrichment)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_config() -> Result<()> {
        let mut caller = ByCutoff::<u64, f32>::new();
        assert!(caller.set_qvcutoff(Some(0.0)).is_err());
        assert!(caller.set_pvcutoff(Some(1.5)).is_err());
        assert!(caller.set_fecutoff(Some(-1.0)).is_err());

        caller
            .set_qvcutoff(None)?
            .set_pvcutoff(None)?
            .set_fecutoff(None)?;
        let enrichment = enrichment(&[(10, 1.0)], &[(10, 1.0)]);
        assert!(caller.run(&enrichment).is_err());

        // Q-values must be calculated first
        let raw = Enrichment::calculate(
            &track(&[(10, 1.0)]),
            &track(&[(10, 1.0)]),
            &mut PValues::new(),
        )?;
        assert!(ByCutoff::<u64, f32>::new().run(&raw).is_err());
        Ok(())
    }
}
