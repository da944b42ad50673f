use ahash::HashMap;
use eyre::{ensure, eyre, Result};
use itertools::Itertools;

use super::pvalue::FILTERED;

/// Genome-wide number of positions tested at each p-value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct QTableBuilder {
    widths: HashMap<u64, u64>,
}

impl QTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `width` positions with the given -log10 p-value. Filtered cells are not tested.
    pub fn add(&mut self, pvalue: f64, width: u64) -> &mut Self {
        if pvalue != FILTERED && width > 0 {
            *self.widths.entry(pvalue.to_bits()).or_default() += width;
        }
        self
    }

    pub fn extend(&mut self, other: QTableBuilder) -> &mut Self {
        for (pvalue, width) in other.widths {
            *self.widths.entry(pvalue).or_default() += width;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Rank-based correction over all tested positions:
    /// q = p + log10(rank) - log10(N), where rank advances by the width of each p-value.
    /// Once q drops to zero, all weaker p-values get zero as well.
    pub fn build(self) -> Result<QTable> {
        ensure!(
            !self.widths.is_empty(),
            "Can't build a q-value table without any tested p-values"
        );

        let total = self.widths.values().sum::<u64>() as f64;
        let offset = -total.log10();

        let ordered = self
            .widths
            .into_iter()
            .map(|(pvalue, width)| (f64::from_bits(pvalue), width))
            .sorted_by(|a, b| b.0.total_cmp(&a.0))
            .collect::<Vec<_>>();

        let mut table = HashMap::default();
        table.reserve(ordered.len());

        let (mut rank, mut previous, mut exhausted) = (1u64, f64::INFINITY, false);
        for (pvalue, width) in ordered {
            let qvalue = if exhausted {
                0.0
            } else {
                let q = pvalue + (rank as f64).log10() + offset;
                if q <= 0.0 {
                    exhausted = true;
                    0.0
                } else {
                    q.min(previous)
                }
            };
            table.insert(pvalue.to_bits(), qvalue);
            previous = qvalue;
            rank += width;
        }

        Ok(QTable { table })
    }
}

/// Mapping from -log10 p-values to -log10 q-values.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct QTable {
    table: HashMap<u64, f64>,
}

impl QTable {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, pvalue: f64) -> Result<f64> {
        if pvalue == FILTERED {
            return Ok(FILTERED);
        }
        self.table
            .get(&pvalue.to_bits())
            .copied()
            .ok_or_else(|| eyre!("P-value {pvalue} is missing in the q-value table"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table() {
        assert!(QTableBuilder::new().build().is_err());

        let mut builder = QTableBuilder::new();
        builder.add(FILTERED, 100).add(5.0, 0);
        assert!(builder.is_empty());
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_single_pvalue() -> Result<()> {
        let mut builder = QTableBuilder::new();
        builder.add(6.96, 50).add(FILTERED, 950);
        let table = builder.build()?;

        assert_eq!(table.len(), 1);
        assert!((table.get(6.96)? - (6.96 - 50f64.log10())).abs() < 1e-9);
        assert_eq!(table.get(FILTERED)?, FILTERED);
        assert!(table.get(1.0).is_err());
        Ok(())
    }

    #[test]
    fn test_ranked_by_width() -> Result<()> {
        let mut first = QTableBuilder::new();
        first.add(10.0, 10).add(3.0, 80);
        let mut second = QTableBuilder::new();
        second.add(5.0, 10).add(0.5, 900);
        second.add(3.0, 0);

        first.extend(second);
        let table = first.build()?;

        // N = 1000
        assert!((table.get(10.0)? - 7.0).abs() < 1e-9);
        assert!((table.get(5.0)? - (5.0 + 11f64.log10() - 3.0)).abs() < 1e-9);
        assert!((table.get(3.0)? - (3.0 + 21f64.log10() - 3.0)).abs() < 1e-9);
        assert_eq!(table.get(0.5)?, 0.0);
        Ok(())
    }

    #[test]
    fn test_monotone() -> Result<()> {
        let mut builder = QTableBuilder::new();
        let pvalues = [12.0, 11.99, 8.0, 7.5, 4.0, 3.9, 2.0, 1.0, 0.1, 0.0];
        for (ind, pv) in pvalues.iter().enumerate() {
            builder.add(*pv, 1 + 37 * ind as u64);
        }
        let table = builder.build()?;

        let qvalues = pvalues
            .iter()
            .map(|x| table.get(*x))
            .collect::<Result<Vec<_>>>()?;
        for (a, b) in qvalues.iter().tuple_windows() {
            assert!(a >= b, "{qvalues:?}");
        }
        assert!(qvalues.iter().all(|x| *x >= 0.0));
        assert_eq!(*qvalues.last().unwrap(), 0.0);

        // Zero for everything past the first non-positive value
        let first_zero = qvalues.iter().position(|x| *x == 0.0).unwrap();
        assert!(qvalues[first_zero..].iter().all(|x| *x == 0.0));
        Ok(())
    }
}
