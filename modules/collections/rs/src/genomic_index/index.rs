use ahash::HashMap;
use derive_getters::Dissolve;
use eyre::{ensure, Result};

use biobit_core_rs::loc::{Contig, Interval, Orientation, PerOrientation};
use biobit_core_rs::num::PrimInt;

use crate::interval_tree::overlap::Elements;
use crate::interval_tree::Bits;

/// Strand-aware genomic index: an interval tree for each (contig, orientation) pair.
#[derive(Clone, PartialEq, Eq, Debug, Dissolve)]
pub struct GenomicIndex<Ctg: Contig, Idx: PrimInt, Data> {
    itrees: HashMap<Ctg, PerOrientation<Bits<Idx, Data>>>,
}

impl<Ctg: Contig, Idx: PrimInt, Data> Default for GenomicIndex<Ctg, Idx, Data> {
    fn default() -> Self {
        Self {
            itrees: HashMap::default(),
        }
    }
}

impl<Ctg: Contig, Idx: PrimInt, Data> GenomicIndex<Ctg, Idx, Data> {
    pub fn builder() -> GenomicIndexBuilder<Ctg, Idx, Data> {
        GenomicIndexBuilder::default()
    }

    /// Build the index from flat records, keeping only those that pass the filter.
    pub fn from_records(
        records: impl IntoIterator<Item = (Ctg, Orientation, Interval<Idx>, Data)>,
        mut filter: impl FnMut(&Ctg, Orientation, &Interval<Idx>, &Data) -> bool,
    ) -> Self {
        let mut builder = Self::builder();
        for (contig, orientation, interval, data) in records {
            if filter(&contig, orientation, &interval, &data) {
                builder.add(contig, orientation, interval, data);
            }
        }
        builder.build()
    }

    /// Key-wise union of several indices. Fails if no indices are given.
    pub fn merge(indices: impl IntoIterator<Item = Self>) -> Result<Self> {
        let mut builder = Self::builder();
        let mut total = 0;
        for index in indices {
            total += 1;
            for (contig, trees) in index.itrees {
                for (orientation, tree) in trees {
                    builder.extend(contig.clone(), orientation, tree.into_records());
                }
            }
        }
        ensure!(total > 0, "At least one index is required for merging");
        Ok(builder.build())
    }

    pub fn contigs(&self) -> impl Iterator<Item = &Ctg> {
        self.itrees.keys()
    }

    pub fn get(&self, contig: &Ctg, orientation: Orientation) -> Option<&Bits<Idx, Data>> {
        self.itrees
            .get(contig)
            .map(|trees| trees.get(orientation))
            .filter(|tree| !tree.is_empty())
    }

    /// Total number of indexed intervals.
    pub fn len(&self) -> usize {
        self.itrees
            .values()
            .flat_map(|trees| trees.iter().map(|(_, tree)| tree.len()))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Intervals intersecting the query, clipped to the query bounds and ordered by start.
    /// The result holds exactly one entry, empty if the contig/orientation was never indexed.
    pub fn overlap<'a>(
        &'a self,
        contig: &Ctg,
        orientation: Orientation,
        interval: Interval<Idx>,
    ) -> Elements<Idx, &'a Data> {
        let mut result = Elements::with_capacity(4);
        self.overlap_into(contig, orientation, &[interval], &mut result);
        result
    }

    /// Overlap a batch of query intervals (e.g. all blocks of a single fragment). The buffer is
    /// cleared first and then holds one entry per query, in the same order.
    pub fn overlap_into<'a>(
        &'a self,
        contig: &Ctg,
        orientation: Orientation,
        queries: &[Interval<Idx>],
        into: &mut Elements<Idx, &'a Data>,
    ) {
        into.clear();
        let tree = self.get(contig, orientation);
        for query in queries {
            let hits = tree.into_iter().flat_map(|tree| tree.query(*query));
            into.push(hits.filter_map(|(hit, data)| Some((hit.intersection(query)?, data))));
        }
    }
}

/// Accumulates records for a [`GenomicIndex`].
#[derive(Clone, Debug)]
pub struct GenomicIndexBuilder<Ctg: Contig, Idx: PrimInt, Data> {
    records: HashMap<Ctg, PerOrientation<Vec<(Interval<Idx>, Data)>>>,
}

impl<Ctg: Contig, Idx: PrimInt, Data> Default for GenomicIndexBuilder<Ctg, Idx, Data> {
    fn default() -> Self {
        Self {
            records: HashMap::default(),
        }
    }
}

impl<Ctg: Contig, Idx: PrimInt, Data> GenomicIndexBuilder<Ctg, Idx, Data> {
    pub fn add(
        &mut self,
        contig: Ctg,
        orientation: Orientation,
        interval: Interval<Idx>,
        data: Data,
    ) -> &mut Self {
        self.records
            .entry(contig)
            .or_default()
            .get_mut(orientation)
            .push((interval, data));
        self
    }

    pub fn extend(
        &mut self,
        contig: Ctg,
        orientation: Orientation,
        records: impl IntoIterator<Item = (Interval<Idx>, Data)>,
    ) -> &mut Self {
        self.records
            .entry(contig)
            .or_default()
            .get_mut(orientation)
            .extend(records);
        self
    }

    pub fn build(self) -> GenomicIndex<Ctg, Idx, Data> {
        let itrees = self
            .records
            .into_iter()
            .map(|(contig, records)| (contig, records.map(|_, records| Bits::new(records))))
            .collect();
        GenomicIndex { itrees }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval_tree::overlap::Steps;
    use itertools::Itertools;

    fn index() -> GenomicIndex<&'static str, i32, &'static str> {
        let mut builder = GenomicIndex::builder();
        builder
            .add("chr1", Orientation::Forward, Interval::new(0, 10).unwrap(), "a")
            .add("chr1", Orientation::Forward, Interval::new(5, 15).unwrap(), "b")
            .add("chr1", Orientation::Reverse, Interval::new(0, 100).unwrap(), "c")
            .add("chr2", Orientation::Dual, Interval::new(10, 20).unwrap(), "d");
        builder.build()
    }

    #[test]
    fn test_overlap() {
        let index = index();
        assert_eq!(index.len(), 4);

        let overlap = index.overlap(&"chr1", Orientation::Forward, Interval::new(3, 12).unwrap());
        let (intervals, annotations) = overlap.iter().next().unwrap();
        assert_eq!(intervals, [3..10, 5..12]);
        assert_eq!(annotations, [&"a", &"b"]);

        // Touching queries don't overlap
        let overlap = index.overlap(&"chr1", Orientation::Forward, Interval::new(15, 20).unwrap());
        assert_eq!(overlap.len(), 1);
        assert!(overlap.intervals().next().unwrap().is_empty());

        // Unseen contig/orientation
        for (contig, orientation) in [
            ("chr1", Orientation::Dual),
            ("chr2", Orientation::Forward),
            ("chr3", Orientation::Forward),
        ] {
            let overlap = index.overlap(&contig, orientation, Interval::new(0, 100).unwrap());
            assert_eq!(overlap.len(), 1);
            assert!(overlap.annotations().next().unwrap().is_empty());
        }
    }

    #[test]
    fn test_overlap_into_steps() {
        let index = index();
        let queries = [Interval::new(0, 8).unwrap(), Interval::new(12, 20).unwrap()];

        let mut elements = Elements::default();
        index.overlap_into(&"chr1", Orientation::Forward, &queries, &mut elements);
        assert_eq!(elements.len(), 2);

        let mut steps = Steps::default();
        elements.to_steps(&queries, &mut steps);
        let steps = steps
            .iter()
            .map(|pieces| {
                pieces
                    .map(|(start, end, anno)| (start, end, anno.iter().map(|x| **x).collect_vec()))
                    .collect_vec()
            })
            .collect_vec();
        assert_eq!(
            steps,
            vec![
                vec![(0, 5, vec!["a"]), (5, 8, vec!["a", "b"])],
                vec![(12, 15, vec!["b"]), (15, 20, vec![])],
            ]
        );
    }

    #[test]
    fn test_from_records() {
        let records = vec![
            ("chr1", Orientation::Forward, Interval::new(0, 10).unwrap(), 1),
            ("chr1", Orientation::Forward, Interval::new(20, 30).unwrap(), 2),
            ("chr1", Orientation::Reverse, Interval::new(0, 10).unwrap(), 3),
        ];
        let index = GenomicIndex::from_records(records, |_, orientation, _, _| {
            orientation == Orientation::Forward
        });
        assert_eq!(index.len(), 2);
        assert!(index.get(&"chr1", Orientation::Reverse).is_none());
        let forward = index.get(&"chr1", Orientation::Forward).unwrap();
        assert_eq!(forward.data().copied().collect_vec(), [1, 2]);
    }

    #[test]
    fn test_merge() -> Result<()> {
        let mut builder = GenomicIndex::builder();
        builder.add("chr1", Orientation::Forward, Interval::new(7, 9).unwrap(), "e");
        builder.add("chr3", Orientation::Reverse, Interval::new(0, 1).unwrap(), "f");
        let other = builder.build();

        let merged = GenomicIndex::merge([index(), other.clone()])?;
        assert_eq!(merged.len(), 6);
        assert_eq!(merged.contigs().sorted().collect_vec(), [&"chr1", &"chr2", &"chr3"]);

        let overlap = merged.overlap(&"chr1", Orientation::Forward, Interval::new(8, 9).unwrap());
        assert_eq!(overlap.annotations().next().unwrap(), [&"a", &"b", &"e"]);

        // Commutative
        let reversed = GenomicIndex::merge([other, index()])?;
        for contig in ["chr1", "chr2", "chr3"] {
            for orientation in [Orientation::Forward, Orientation::Reverse, Orientation::Dual] {
                let query = Interval::new(0, 1000).unwrap();
                let annotations = |index: &GenomicIndex<&'static str, i32, &'static str>| {
                    let overlap = index.overlap(&contig, orientation, query);
                    let result = overlap
                        .annotations()
                        .next()
                        .unwrap()
                        .iter()
                        .map(|x| **x)
                        .sorted()
                        .collect_vec();
                    result
                };
                assert_eq!(annotations(&merged), annotations(&reversed));
            }
        }

        assert!(GenomicIndex::<&str, i32, &str>::merge([]).is_err());
        Ok(())
    }
}
