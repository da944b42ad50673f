use eyre::{ensure, eyre, Result};

use biobit_core_rs::num::PrimUInt;

pub(super) fn to_length<L: PrimUInt>(length: u64) -> Result<L> {
    L::from(length).ok_or_else(|| eyre!("Run length {length} doesn't fit in {:?}", L::max_value()))
}

pub(super) fn to_u64<L: PrimUInt>(length: L) -> Result<u64> {
    length
        .to_u64()
        .ok_or_else(|| eyre!("Run length {length:?} doesn't fit in u64"))
}

/// Values stored as consecutive runs. Each run repeats a single value `length` times.
///
/// Which neighbours are joined into one run is decided by the caller: constructors and
/// [`RleVec::append`] take a `same(first, second)` predicate, where `first` is the value that
/// opened the current run. Comparing against the run's first value keeps slowly drifting
/// values from being chained into a single run.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RleVec<V, L: PrimUInt> {
    values: Vec<V>,
    lengths: Vec<L>,
}

impl<V, L: PrimUInt> Default for RleVec<V, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, L: PrimUInt> RleVec<V, L> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(runs: usize) -> Self {
        Self {
            values: Vec::with_capacity(runs),
            lengths: Vec::with_capacity(runs),
        }
    }

    /// Wrap already encoded runs. Runs are kept as is, zero-length runs are rejected.
    pub fn from_runs(values: Vec<V>, lengths: Vec<L>) -> Result<Self> {
        ensure!(
            values.len() == lengths.len(),
            "Got {} values for {} run lengths",
            values.len(),
            lengths.len()
        );
        ensure!(
            lengths.iter().all(|x| *x > L::zero()),
            "Run lengths must be positive"
        );
        Ok(Self { values, lengths })
    }

    /// Encode a dense sequence of values.
    pub fn from_dense(dense: &[V], same: impl Fn(&V, &V) -> bool) -> Result<Self>
    where
        V: Clone,
    {
        let mut rle = Self::new();
        let mut iter = dense.iter();
        let Some(mut current) = iter.next() else {
            return Ok(rle);
        };

        let mut length = 1u64;
        for value in iter {
            if same(current, value) {
                length += 1;
            } else {
                rle.push(current.clone(), to_length(length)?);
                current = value;
                length = 1;
            }
        }
        rle.push(current.clone(), to_length(length)?);
        Ok(rle)
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.lengths.clear();
    }

    /// Add a new run without looking at the last one.
    pub fn push(&mut self, value: V, length: L) {
        debug_assert!(length > L::zero());
        self.values.push(value);
        self.lengths.push(length);
    }

    /// Add a run, extending the last one instead if `same` holds for their values.
    /// Zero-length runs are ignored.
    pub fn append(&mut self, value: V, length: L, same: impl Fn(&V, &V) -> bool) -> Result<()> {
        if length == L::zero() {
            return Ok(());
        }
        match (self.values.last(), self.lengths.last_mut()) {
            (Some(last), Some(total)) if same(last, &value) => {
                *total = total
                    .checked_add(&length)
                    .ok_or_else(|| eyre!("Run length overflow in {:?}", L::max_value()))?;
            }
            _ => self.push(value, length),
        }
        Ok(())
    }

    /// Sum of all run lengths.
    pub fn total_length(&self) -> u64 {
        self.lengths.iter().filter_map(|x| x.to_u64()).sum()
    }

    pub fn runs(&self) -> impl Iterator<Item = (&V, &L)> {
        self.values.iter().zip(self.lengths.iter())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.values.iter_mut()
    }
}

impl<V, L: PrimUInt> From<RleVec<V, L>> for (Vec<V>, Vec<L>) {
    fn from(rle: RleVec<V, L>) -> Self {
        (rle.values, rle.lengths)
    }
}
