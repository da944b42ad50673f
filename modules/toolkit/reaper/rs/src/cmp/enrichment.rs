use derive_getters::{Dissolve, Getters};
use eyre::{bail, ensure, eyre, Result};

use biobit_core_rs::num::Float;

use crate::track::Track;

use super::pvalue::{PValues, FILTERED};
use super::qtable::{QTable, QTableBuilder};

/// A single cell of the differential signal.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Cell<Cnts> {
    pub start: u64,
    pub end: u64,
    pub fe: Cnts,
    pub pvalue: Cnts,
    pub qvalue: Cnts,
}

/// Fold-enrichment, p-values, and q-values of treatment over control. All three share the same
/// breakpoints: the union of treatment and control boundaries.
#[derive(Clone, PartialEq, Debug, Default, Dissolve, Getters)]
pub struct Enrichment<Cnts: Float> {
    ends: Vec<u64>,
    fe: Vec<Cnts>,
    pvalues: Vec<Cnts>,
    // Empty until a q-value table is applied
    qvalues: Vec<Cnts>,
}

impl<Cnts: Float> Enrichment<Cnts> {
    pub fn calculate(
        treatment: &Track<Cnts>,
        control: &Track<Cnts>,
        pvcache: &mut PValues,
    ) -> Result<Self> {
        let length = treatment.total_length();
        ensure!(
            length == control.total_length(),
            "Treatment and control must cover the same number of positions, got {} and {}",
            length,
            control.total_length()
        );

        let capacity = treatment.len() + control.len();
        let mut result = Self {
            ends: Vec::with_capacity(capacity),
            fe: Vec::with_capacity(capacity),
            pvalues: Vec::with_capacity(capacity),
            qvalues: Vec::new(),
        };

        let mut trt = treatment.runs();
        let mut cnt = control.runs();
        let (mut trtend, mut cntend) = (0u64, 0u64);
        let (mut trtval, mut cntval) = (Cnts::zero(), Cnts::zero());

        let mut cursor = 0;
        while cursor < length {
            if trtend == cursor {
                let (val, len) = trt
                    .next()
                    .ok_or_else(|| eyre!("Treatment track ended prematurely"))?;
                trtval = *val;
                trtend += *len as u64;
            }
            if cntend == cursor {
                let (val, len) = cnt
                    .next()
                    .ok_or_else(|| eyre!("Control track ended prematurely"))?;
                cntval = *val;
                cntend += *len as u64;
            }

            let end = trtend.min(cntend);
            if end == cursor {
                // Zero-length runs don't produce cells
                continue;
            }

            let (fe, pvalue) = Self::score(trtval, cntval, pvcache)?;
            result.ends.push(end);
            result.fe.push(fe);
            result.pvalues.push(pvalue);
            cursor = end;
        }

        Ok(result)
    }

    fn score(treatment: Cnts, control: Cnts, pvcache: &mut PValues) -> Result<(Cnts, Cnts)> {
        if treatment <= Cnts::zero() {
            let filtered = Cnts::from(FILTERED).unwrap_or(-Cnts::one());
            return Ok((Cnts::zero(), filtered));
        }
        if control <= Cnts::zero() || !control.is_finite() {
            bail!("Control signal must be positive where treatment is present, got {control:?}");
        }

        let fe = treatment / control;

        let counts = treatment
            .floor()
            .to_u64()
            .ok_or_else(|| eyre!("Treatment signal {treatment:?} doesn't fit in u64"))?;
        let lambda = control
            .to_f64()
            .ok_or_else(|| eyre!("Control signal {control:?} doesn't fit in f64"))?;
        let pvalue = pvcache.get(counts, lambda)?;
        let pvalue =
            Cnts::from(pvalue).ok_or_else(|| eyre!("P-value {pvalue} can't be represented"))?;

        Ok((fe, pvalue))
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Total number of covered positions.
    pub fn length(&self) -> u64 {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn has_qvalues(&self) -> bool {
        !self.qvalues.is_empty() || self.ends.is_empty()
    }

    /// Register tested positions for each p-value in the q-value table.
    pub fn count_pvalues(&self, builder: &mut QTableBuilder) -> Result<()> {
        let mut start = 0;
        for (end, pvalue) in self.ends.iter().zip(&self.pvalues) {
            let pvalue = pvalue
                .to_f64()
                .ok_or_else(|| eyre!("P-value {pvalue:?} doesn't fit in f64"))?;
            builder.add(pvalue, end - start);
            start = *end;
        }
        Ok(())
    }

    pub fn apply(&mut self, table: &QTable) -> Result<&mut Self> {
        self.qvalues.clear();
        self.qvalues.reserve(self.pvalues.len());
        for pvalue in &self.pvalues {
            let pv = pvalue
                .to_f64()
                .ok_or_else(|| eyre!("P-value {pvalue:?} doesn't fit in f64"))?;
            let qvalue = table.get(pv)?;
            self.qvalues.push(
                Cnts::from(qvalue).ok_or_else(|| eyre!("Q-value {qvalue} can't be represented"))?,
            );
        }
        Ok(self)
    }

    /// Iterate over cells. Q-values are reported as filtered until a table is applied.
    pub fn cells(&self) -> impl Iterator<Item = Cell<Cnts>> + '_ {
        let filtered = Cnts::from(FILTERED).unwrap_or(-Cnts::one());
        let starts = std::iter::once(0).chain(self.ends.iter().copied());
        starts
            .zip(self.ends.iter())
            .enumerate()
            .map(move |(ind, (start, end))| Cell {
                start,
                end: *end,
                fe: self.fe[ind],
                pvalue: self.pvalues[ind],
                qvalue: self.qvalues.get(ind).copied().unwrap_or(filtered),
            })
    }
}
