use std::f64::consts::LN_10;

use ahash::HashMap;
use eyre::{ensure, eyre, Result};
use statrs::distribution::{DiscreteCDF, Poisson};
use statrs::function::gamma::ln_gamma;

/// Placeholder p/q-value for cells without treatment signal.
pub const FILTERED: f64 = -1.0;

/// Memoized Poisson p-values, -log10 P(X >= treatment; λ = control).
///
/// The same (treatment, control) pairs repeat across the genome, so each one is computed once.
#[derive(Debug, Default, Clone)]
pub struct PValues {
    cache: HashMap<(u64, u64), f64>,
}

impl PValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn get(&mut self, treatment: u64, control: f64) -> Result<f64> {
        if treatment == 0 {
            return Ok(FILTERED);
        }

        let key = (treatment, control.to_bits());
        if let Some(pvalue) = self.cache.get(&key) {
            return Ok(*pvalue);
        }

        let pvalue = -upper_tail_log10(treatment, control)?;
        self.cache.insert(key, pvalue);
        Ok(pvalue)
    }
}

// log10 P(X >= k) for X ~ Poisson(lambda), k > 0
fn upper_tail_log10(k: u64, lambda: f64) -> Result<f64> {
    ensure!(
        lambda.is_finite() && lambda > 0.0,
        "Poisson rate must be positive and finite, got {lambda}"
    );

    // Bulk of the distribution: the tail is large and the survival function is accurate
    if (k as f64) <= lambda + 1.0 {
        let poisson = Poisson::new(lambda)
            .map_err(|e| eyre!("Failed to create Poisson({lambda}): {e:?}"))?;
        return Ok(poisson.sf(k - 1).log10());
    }

    // Far tail: sum pmf terms in log-space, starting from the largest one
    let first = (k as f64) * lambda.ln() - lambda - ln_gamma(k as f64 + 1.0);
    let (mut term, mut sum) = (1.0, 1.0);
    let mut i = k;
    loop {
        i += 1;
        term *= lambda / i as f64;
        sum += term;
        if term < sum * f64::EPSILON {
            break;
        }
    }
    Ok((first + sum.ln()) / LN_10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered() -> Result<()> {
        let mut pvalues = PValues::new();
        assert_eq!(pvalues.get(0, 1.0)?, FILTERED);
        assert_eq!(pvalues.get(0, 0.0)?, FILTERED);
        assert!(pvalues.is_empty());
        Ok(())
    }

    #[test]
    fn test_poisson_pvalues() -> Result<()> {
        let mut pvalues = PValues::new();

        // P(X >= 1; 1) = 1 - e^-1
        let expected = -(1.0 - (-1.0f64).exp()).log10();
        assert!((pvalues.get(1, 1.0)? - expected).abs() < 1e-9);

        // P(X >= 10; 1)
        let tail: f64 = (10..40)
            .map(|i| (-1.0f64).exp() / (1..=i).map(|x| x as f64).product::<f64>())
            .sum();
        assert!((pvalues.get(10, 1.0)? - -tail.log10()).abs() < 1e-6);

        // Both branches agree around the switch point
        for (k, lambda) in [(5, 4.5), (6, 4.5), (20, 18.0), (21, 19.5)] {
            let poisson = Poisson::new(lambda).unwrap();
            let expected = -poisson.sf(k - 1).log10();
            assert!((pvalues.get(k, lambda)? - expected).abs() < 1e-6);
        }

        assert_eq!(pvalues.len(), 6);
        pvalues.get(10, 1.0)?;
        assert_eq!(pvalues.len(), 6);
        Ok(())
    }

    #[test]
    fn test_extreme_pvalues_are_finite() -> Result<()> {
        let mut pvalues = PValues::new();
        let pv = pvalues.get(10_000, 0.01)?;
        assert!(pv.is_finite() && pv > 1_000.0);
        assert!(pvalues.get(10, 0.0).is_err());
        assert!(pvalues.get(10, f64::NAN).is_err());
        Ok(())
    }
}
