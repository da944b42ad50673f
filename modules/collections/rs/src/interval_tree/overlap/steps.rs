use std::ops::Range;

use biobit_core_rs::loc::{Interval, IntervalOp};
use biobit_core_rs::num::PrimInt;

/// Hits of each query re-expressed as pieces of the query cut at every hit boundary inside it.
///
/// Pieces of a query tile it from start to end without gaps. Each piece is labeled with the
/// annotations of all hits covering it, without duplicates and in the order hits were given.
/// Empty queries have no pieces, empty hits neither cut nor label anything.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Steps<Idx: PrimInt, T> {
    // Number of pieces for each query
    queries: Vec<usize>,
    pieces: Vec<(Idx, Idx, Range<usize>)>,
    labels: Vec<T>,
    cuts: Vec<Idx>,
}

impl<Idx: PrimInt, T> Default for Steps<Idx, T> {
    fn default() -> Self {
        Self {
            queries: Vec::new(),
            pieces: Vec::new(),
            labels: Vec::new(),
            cuts: Vec::new(),
        }
    }
}

impl<Idx: PrimInt, T> Steps<Idx, T> {
    /// Cut the next query at the boundaries of its hits.
    pub fn push(&mut self, query: &Interval<Idx>, hits: &[Interval<Idx>], annotations: &[T])
    where
        T: PartialEq + Clone,
    {
        debug_assert_eq!(hits.len(), annotations.len());

        let (qstart, qend) = (query.start(), query.end());
        self.cuts.clear();
        self.cuts.extend([qstart, qend]);
        for hit in hits.iter().filter(|x| !x.is_empty()) {
            for cut in [hit.start(), hit.end()] {
                if cut > qstart && cut < qend {
                    self.cuts.push(cut);
                }
            }
        }
        self.cuts.sort_unstable();
        self.cuts.dedup();

        let before = self.pieces.len();
        for window in self.cuts.windows(2) {
            let (start, end) = (window[0], window[1]);
            let first = self.labels.len();
            for (hit, annotation) in hits.iter().zip(annotations) {
                let covers = hit.start() <= start && end <= hit.end();
                if covers && !self.labels[first..].contains(annotation) {
                    self.labels.push(annotation.clone());
                }
            }
            self.pieces.push((start, end, first..self.labels.len()));
        }
        self.queries.push(self.pieces.len() - before);
    }

    /// Pieces of each query, in the order queries were pushed.
    pub fn iter(&self) -> impl Iterator<Item = impl Iterator<Item = (Idx, Idx, &[T])>> {
        let mut offset = 0;
        self.queries.iter().map(move |&count| {
            let pieces = &self.pieces[offset..offset + count];
            offset += count;
            pieces
                .iter()
                .map(move |(start, end, labels)| (*start, *end, &self.labels[labels.clone()]))
        })
    }

    pub fn clear(&mut self) {
        self.queries.clear();
        self.pieces.clear();
        self.labels.clear();
    }

    /// Number of queries.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
