use std::fmt::{Display, Formatter};
use std::ops::{Range, Shl, Shr};

use eyre::{ensure, Result};
use impl_tools::autoimpl;

use crate::num::PrimInt;

/// Anything that occupies a half-open span [start, end) of a contig.
#[autoimpl(for <T: trait + ?Sized> &T, Box<T>)]
pub trait IntervalOp {
    type Idx: PrimInt;

    fn start(&self) -> Self::Idx;

    fn end(&self) -> Self::Idx;

    fn len(&self) -> Self::Idx {
        self.end() - self.start()
    }

    fn is_empty(&self) -> bool {
        self.start() == self.end()
    }

    fn contains(&self, pos: Self::Idx) -> bool {
        self.start() <= pos && pos < self.end()
    }

    /// Spans sharing at least one position. Spans that only touch don't intersect.
    fn intersects(&self, other: &Self) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }
}

/// Half-open genomic span [start, end) with `start <= end`.
///
/// Empty spans are valid and show up when regions are clipped to contig bounds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Interval<Idx: PrimInt> {
    start: Idx,
    end: Idx,
}

impl<Idx: PrimInt> IntervalOp for Interval<Idx> {
    type Idx = Idx;

    #[inline]
    fn start(&self) -> Idx {
        self.start
    }

    #[inline]
    fn end(&self) -> Idx {
        self.end
    }
}

impl<Idx: PrimInt> Interval<Idx> {
    pub fn new(start: Idx, end: Idx) -> Result<Self> {
        ensure!(start <= end, "Interval start {start:?} is past its end {end:?}");
        Ok(Self { start, end })
    }

    /// Grow by `left` and `right` positions, staying inside `within`.
    pub fn extended_within(&self, left: Idx, right: Idx, within: &Self) -> Self {
        let end = self.end.saturating_add(right).min(within.end);
        let start = self.start.saturating_sub(left).max(within.start).min(end);
        Self { start, end }
    }

    /// Shared non-empty part of two spans.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let (start, end) = (self.start.max(other.start), self.end.min(other.end));
        (start < end).then_some(Self { start, end })
    }

    /// Same as [`Interval::intersection`], consuming `self`.
    pub fn clamped(self, inside: &Self) -> Option<Self> {
        self.intersection(inside)
    }

    /// Smallest span covering both, if they overlap or touch.
    pub fn union(&self, other: &Self) -> Option<Self> {
        let joined = self.start <= other.end && other.start <= self.end;
        joined.then(|| Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        })
    }

    /// Convert coordinates to another integer type, `None` if they don't fit.
    pub fn cast<T: PrimInt>(&self) -> Option<Interval<T>> {
        Some(Interval {
            start: T::from(self.start)?,
            end: T::from(self.end)?,
        })
    }
}

impl<Idx: PrimInt + Display> Display for Interval<Idx> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl<Idx: PrimInt> PartialEq<(Idx, Idx)> for Interval<Idx> {
    fn eq(&self, other: &(Idx, Idx)) -> bool {
        (self.start, self.end) == *other
    }
}

impl<Idx: PrimInt> PartialEq<Range<Idx>> for Interval<Idx> {
    fn eq(&self, other: &Range<Idx>) -> bool {
        self.start == other.start && self.end == other.end
    }
}

/// Move towards the contig start.
impl<Idx: PrimInt> Shl<Idx> for Interval<Idx> {
    type Output = Self;

    fn shl(self, offset: Idx) -> Self {
        Self {
            start: self.start - offset,
            end: self.end - offset,
        }
    }
}

/// Move towards the contig end.
impl<Idx: PrimInt> Shr<Idx> for Interval<Idx> {
    type Output = Self;

    fn shr(self, offset: Idx) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn it(start: i32, end: i32) -> Interval<i32> {
        Interval::new(start, end).unwrap()
    }

    #[test]
    fn test_new() {
        assert_eq!(it(3, 8), (3, 8));
        assert_eq!(it(3, 8).len(), 5);
        assert!(it(4, 4).is_empty());
        assert!(Interval::new(8, 3).is_err());
        assert_eq!(it(-5, 5).to_string(), "[-5, 5)");
    }

    #[test]
    fn test_positions() {
        let span = it(10, 20);
        for (pos, inside) in [(9, false), (10, true), (19, true), (20, false)] {
            assert_eq!(span.contains(pos), inside, "{pos}");
        }
        assert!(!it(5, 5).contains(5));

        // Touching spans
        assert!(!span.intersects(&it(0, 10)));
        assert!(!span.intersects(&it(20, 25)));
        assert!(span.intersects(&it(0, 11)));
        assert!(span.intersects(&it(12, 13)));
        assert!(span.intersects(&it(19, 100)));
    }

    #[test]
    fn test_intersection() {
        let span = it(10, 20);
        for (other, expected) in [
            (it(0, 10), None),
            (it(0, 15), Some(it(10, 15))),
            (it(12, 14), Some(it(12, 14))),
            (it(15, 40), Some(it(15, 20))),
            (it(15, 15), None),
        ] {
            assert_eq!(span.intersection(&other), expected);
            assert_eq!(other.intersection(&span), expected);
        }
        assert_eq!(it(-5, 30).clamped(&span), Some(span));
    }

    #[test]
    fn test_union() {
        let span = it(10, 20);
        assert_eq!(span.union(&it(20, 30)), Some(it(10, 30)));
        assert_eq!(span.union(&it(0, 10)), Some(it(0, 20)));
        assert_eq!(span.union(&it(12, 13)), Some(span));
        assert_eq!(span.union(&it(21, 30)), None);
    }

    #[test]
    fn test_extended_within() {
        let contig = Interval::new(0u32, 100).unwrap();
        let span = Interval::new(10u32, 20).unwrap();
        assert_eq!(span.extended_within(5, 7, &contig), (5, 27));
        assert_eq!(span.extended_within(50, 500, &contig), contig);
        assert_eq!(span.extended_within(0, 0, &contig), span);

        // Spans outside the bounds collapse to an empty one at the bound
        let outside = Interval::new(150u32, 160).unwrap();
        assert_eq!(outside.extended_within(1, 1, &contig), (100, 100));
    }

    #[test]
    fn test_shift_and_cast() {
        let span = it(5, 9);
        assert_eq!(span >> 10, 15..19);
        assert_eq!(span << 5, (0, 4));
        assert_eq!(span.cast::<u8>(), Some(Interval::new(5u8, 9).unwrap()));
        assert_eq!(it(-1, 9).cast::<u8>(), None);
        assert_eq!(it(0, 300).cast::<u8>(), None);
    }
}
