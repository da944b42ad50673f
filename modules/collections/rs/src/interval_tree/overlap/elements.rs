use biobit_core_rs::loc::Interval;
use biobit_core_rs::num::PrimInt;

use super::steps::Steps;

/// Hits collected for a batch of queries, one entry per query and in query order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Elements<Idx: PrimInt, T> {
    intervals: Vec<Interval<Idx>>,
    annotations: Vec<T>,
    // Query i owns hits ends[i - 1]..ends[i]
    ends: Vec<usize>,
}

impl<Idx: PrimInt, T> Default for Elements<Idx, T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<Idx: PrimInt, T> Elements<Idx, T> {
    pub fn with_capacity(hits: usize) -> Self {
        Self {
            intervals: Vec::with_capacity(hits),
            annotations: Vec::with_capacity(hits),
            ends: Vec::new(),
        }
    }

    /// Record hits of the next query. An empty iterator still records the query.
    pub fn push(&mut self, hits: impl IntoIterator<Item = (Interval<Idx>, T)>) {
        for (interval, annotation) in hits {
            self.intervals.push(interval);
            self.annotations.push(annotation);
        }
        self.ends.push(self.intervals.len());
    }

    pub fn clear(&mut self) {
        self.intervals.clear();
        self.annotations.clear();
        self.ends.clear();
    }

    /// Number of queries.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[Interval<Idx>], &[T])> {
        let starts = std::iter::once(0).chain(self.ends.iter().copied());
        starts
            .zip(self.ends.iter())
            .map(move |(start, &end)| (&self.intervals[start..end], &self.annotations[start..end]))
    }

    pub fn intervals(&self) -> impl Iterator<Item = &[Interval<Idx>]> {
        self.iter().map(|(intervals, _)| intervals)
    }

    pub fn annotations(&self) -> impl Iterator<Item = &[T]> {
        self.iter().map(|(_, annotations)| annotations)
    }

    /// Cut each query at the boundaries of its hits. Queries must be the ones the hits were
    /// collected for, in the same order.
    pub fn to_steps(&self, queries: &[Interval<Idx>], into: &mut Steps<Idx, T>)
    where
        T: PartialEq + Clone,
    {
        debug_assert_eq!(queries.len(), self.len());
        into.clear();
        for (query, (hits, annotations)) in queries.iter().zip(self.iter()) {
            into.push(query, hits, annotations);
        }
    }
}
