use derive_getters::Dissolve;
use eyre::{bail, Result};

use crate::loc::{Interval, IntervalOp, Orientation};
use crate::num::PrimInt;

/// A batch of aligned fragments. Each fragment is a sorted set of disjoint genomic blocks
/// (e.g. exonic parts of a spliced read or both mates of a read pair) plus its orientation.
///
/// Fragments are packed into a single buffer: the i-th fragment is
/// `blocks[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, PartialEq, Eq, Dissolve)]
pub struct AlignedBlocks<Idx: PrimInt> {
    blocks: Vec<Interval<Idx>>,
    offsets: Vec<usize>,
    orientation: Vec<Orientation>,
}

impl<Idx: PrimInt> Default for AlignedBlocks<Idx> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<Idx: PrimInt> AlignedBlocks<Idx> {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut offsets = Vec::with_capacity(capacity + 1);
        offsets.push(0);
        Self {
            blocks: Vec::with_capacity(capacity),
            offsets,
            orientation: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.orientation.clear();
        self.offsets.clear();
        self.offsets.push(0);
    }

    pub fn is_empty(&self) -> bool {
        self.orientation.is_empty()
    }

    /// Number of fragments in the batch.
    pub fn len(&self) -> usize {
        self.orientation.len()
    }

    /// Add a new fragment. Blocks can be given in any order: they are sorted and overlapping or
    /// touching blocks are merged. Empty blocks are ignored, but at least one non-empty block
    /// is required.
    pub fn push(
        &mut self,
        orientation: Orientation,
        blocks: impl IntoIterator<Item = Interval<Idx>>,
    ) -> Result<()> {
        let start = self.blocks.len();
        self.blocks
            .extend(blocks.into_iter().filter(|x| !x.is_empty()));

        if self.blocks.len() == start {
            bail!("Aligned fragment must have at least one non-empty block");
        }

        let fragment = &mut self.blocks[start..];
        fragment.sort_by_key(|x| x.start());
        let kept = Self::collapse(fragment);
        self.blocks.truncate(start + kept);

        self.offsets.push(self.blocks.len());
        self.orientation.push(orientation);
        Ok(())
    }

    // Merge overlapping/touching blocks in-place, returns the number of blocks kept
    fn collapse(blocks: &mut [Interval<Idx>]) -> usize {
        let mut writeto = 0;
        for pointer in 1..blocks.len() {
            if let Some(union) = blocks[pointer].union(&blocks[writeto]) {
                blocks[writeto] = union;
            } else {
                writeto += 1;
                blocks[writeto] = blocks[pointer];
            }
        }
        writeto + 1
    }

    pub fn at(&self, i: usize) -> (Orientation, &[Interval<Idx>]) {
        (
            self.orientation[i],
            &self.blocks[self.offsets[i]..self.offsets[i + 1]],
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (Orientation, &'_ [Interval<Idx>])> {
        (0..self.len()).map(move |i| self.at(i))
    }

    /// Envelope of the fragment: from the start of the first block to the end of the last one.
    pub fn envelope(&self, i: usize) -> Interval<Idx> {
        let (_, blocks) = self.at(i);
        let (first, last) = (blocks[0], blocks[blocks.len() - 1]);
        // Blocks are sorted and non-empty
        Interval::new(first.start(), last.end()).unwrap_or(first)
    }
}
