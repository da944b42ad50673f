//! Static interval tree following the BITS layout: records sorted by start plus the longest
//! record length bound the window that has to be scanned for each query.
//! Reference: https://doi.org/10.1093/bioinformatics/bts652

use biobit_core_rs::loc::{Interval, IntervalOp};
use biobit_core_rs::num::PrimInt;
use itertools::Itertools;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bits<Idx: PrimInt, Data> {
    // Sorted by start, ties keep the insertion order
    records: Vec<(Interval<Idx>, Data)>,
    longest: Idx,
}

impl<Idx: PrimInt, Data> Default for Bits<Idx, Data> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            longest: Idx::zero(),
        }
    }
}

impl<Idx: PrimInt, Data> Bits<Idx, Data> {
    pub fn new(records: impl IntoIterator<Item = (Interval<Idx>, Data)>) -> Self {
        let records = records
            .into_iter()
            .sorted_by_key(|(interval, _)| interval.start())
            .collect_vec();
        let longest = records
            .iter()
            .map(|(interval, _)| interval.len())
            .max()
            .unwrap_or_else(Idx::zero);
        Self { records, longest }
    }

    /// Records intersecting the query, ordered by start. Touching and empty records are skipped.
    pub fn query(&self, query: Interval<Idx>) -> impl Iterator<Item = (Interval<Idx>, &Data)> {
        // Nothing starting before this point is long enough to reach the query
        let reach = query.start().saturating_sub(self.longest);
        let first = self
            .records
            .partition_point(|(interval, _)| interval.start() < reach);

        self.records[first..]
            .iter()
            .take_while(move |(interval, _)| interval.start() < query.end())
            .filter(move |(interval, _)| !interval.is_empty() && interval.intersects(&query))
            .map(|(interval, data)| (*interval, data))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Data of all records, ordered by start.
    pub fn data(&self) -> impl Iterator<Item = &Data> {
        self.records.iter().map(|(_, data)| data)
    }

    pub fn into_records(self) -> Vec<(Interval<Idx>, Data)> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(records: &[(i64, i64, char)]) -> Bits<i64, char> {
        Bits::new(
            records
                .iter()
                .map(|(start, end, data)| (Interval::new(*start, *end).unwrap(), *data)),
        )
    }

    fn hits(bits: &Bits<i64, char>, start: i64, end: i64) -> String {
        bits.query(Interval::new(start, end).unwrap())
            .map(|(_, data)| *data)
            .collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree = bits(&[]);
        assert!(tree.is_empty());
        assert_eq!(hits(&tree, -10, 10), "");
    }

    #[test]
    fn test_touching_records_are_skipped() {
        let tree = bits(&[(10, 20, 'a')]);
        for (start, end, expected) in [
            (0, 10, ""),
            (20, 30, ""),
            (0, 11, "a"),
            (19, 30, "a"),
            (12, 13, "a"),
            (0, 100, "a"),
        ] {
            assert_eq!(hits(&tree, start, end), expected, "{start}..{end}");
        }
    }

    #[test]
    fn test_nested_records() {
        let tree = bits(&[
            (40, 60, 'e'),
            (-100, 150, 'a'),
            (10, 90, 'c'),
            (0, 100, 'b'),
            (45, 50, 'f'),
            (47, 48, 'g'),
            (20, 80, 'd'),
        ]);
        assert_eq!(hits(&tree, 47, 48), "abcdefg");
        assert_eq!(hits(&tree, 48, 49), "abcdef");
        assert_eq!(hits(&tree, 85, 95), "abc");
        assert_eq!(hits(&tree, 100, 150), "a");
        assert_eq!(hits(&tree, 150, 200), "");
        assert_eq!(hits(&tree, -200, -100), "");
    }

    #[test]
    fn test_long_record_far_to_the_left() {
        // The long record must be found even though many short ones start after it
        let mut records = vec![(0, 1000, 'L')];
        records.extend((0..50).map(|x| (x * 10 + 1, x * 10 + 2, 's')));
        let tree = bits(&records);
        assert_eq!(hits(&tree, 900, 910), "L");
        assert_eq!(hits(&tree, 411, 412), "Ls");
        assert_eq!(hits(&tree, 999, 2000), "L");
    }

    #[test]
    fn test_records_keep_insertion_order_for_ties() {
        let tree = bits(&[(10, 20, 'b'), (0, 5, 'a'), (10, 15, 'c'), (5, 5, 'e')]);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.data().collect::<String>(), "aebc");
        // Empty records are stored but never reported
        assert_eq!(hits(&tree, 0, 100), "abc");

        let records = tree.into_records();
        assert_eq!(records[0], (Interval::new(0, 5).unwrap(), 'a'));
        assert_eq!(records[3], (Interval::new(10, 15).unwrap(), 'c'));
    }
}
