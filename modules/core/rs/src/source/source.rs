use std::ops::AddAssign;

use derive_getters::{Dissolve, Getters};
use dyn_clone::DynClone;
use eyre::Result;

use crate::loc::{Contig, Interval};
use crate::ngs::AlignedBlocks;
use crate::num::PrimInt;

/// Counters describing what a source did with the raw records it has seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Getters, Dissolve)]
pub struct SourceStats {
    /// Records turned into fragments.
    consumed: u64,
    /// Records rejected by filters (flags, mapping quality, etc).
    discarded: u64,
    /// Paired-end records whose mate was never found.
    unpaired: u64,
}

impl SourceStats {
    pub fn new(consumed: u64, discarded: u64, unpaired: u64) -> Self {
        Self {
            consumed,
            discarded,
            unpaired,
        }
    }
}

impl AddAssign for SourceStats {
    fn add_assign(&mut self, rhs: Self) {
        self.consumed += rhs.consumed;
        self.discarded += rhs.discarded;
        self.unpaired += rhs.unpaired;
    }
}

/// A source of aligned fragments, e.g. an indexed BAM file.
///
/// Sources are cheap to clone and never shared between threads: each worker owns its own clone.
pub trait Source: DynClone + Send + Sync {
    type Ctg: Contig;
    type Idx: PrimInt;

    /// Fetch all fragments overlapping the given region of the contig. Fragments are appended to
    /// the `into` buffer, which is not cleared beforehand.
    fn fetch(
        &mut self,
        contig: &Self::Ctg,
        interval: Interval<Self::Idx>,
        into: &mut AlignedBlocks<Self::Idx>,
    ) -> Result<()>;

    /// Cumulative statistics over all fetch calls made with this handle.
    fn stats(&self) -> SourceStats;
}

dyn_clone::clone_trait_object!(<Ctg, Idx> Source<Ctg = Ctg, Idx = Idx>);

impl<Ctg: Contig, Idx: PrimInt> Source for Box<dyn Source<Ctg = Ctg, Idx = Idx>> {
    type Ctg = Ctg;
    type Idx = Idx;

    fn fetch(
        &mut self,
        contig: &Self::Ctg,
        interval: Interval<Self::Idx>,
        into: &mut AlignedBlocks<Self::Idx>,
    ) -> Result<()> {
        (**self).fetch(contig, interval, into)
    }

    fn stats(&self) -> SourceStats {
        (**self).stats()
    }
}
