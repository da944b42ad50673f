use std::collections::HashMap;
use std::sync::Arc;

use eyre::Result;

use crate::loc::{Contig, Interval, IntervalOp, Orientation};
use crate::ngs::AlignedBlocks;
use crate::num::PrimInt;

use super::{Source, SourceStats};

/// A source backed by fragments kept in memory. Clones share the underlying data.
#[derive(Debug, Clone)]
pub struct InMemory<Ctg: Contig, Idx: PrimInt> {
    fragments: Arc<HashMap<Ctg, AlignedBlocks<Idx>>>,
    stats: SourceStats,
}

impl<Ctg: Contig, Idx: PrimInt> InMemory<Ctg, Idx> {
    pub fn new(
        fragments: impl IntoIterator<Item = (Ctg, Orientation, Vec<Interval<Idx>>)>,
    ) -> Result<Self> {
        let mut data: HashMap<Ctg, AlignedBlocks<Idx>> = HashMap::new();
        for (contig, orientation, blocks) in fragments {
            data.entry(contig).or_default().push(orientation, blocks)?;
        }
        Ok(Self {
            fragments: Arc::new(data),
            stats: SourceStats::default(),
        })
    }
}

impl<Ctg: Contig, Idx: PrimInt> Source for InMemory<Ctg, Idx> {
    type Ctg = Ctg;
    type Idx = Idx;

    fn fetch(
        &mut self,
        contig: &Self::Ctg,
        interval: Interval<Self::Idx>,
        into: &mut AlignedBlocks<Self::Idx>,
    ) -> Result<()> {
        let fragments = match self.fragments.get(contig) {
            None => return Ok(()),
            Some(x) => x,
        };

        let mut consumed = 0;
        for i in 0..fragments.len() {
            let envelope = fragments.envelope(i);
            if !envelope.intersects(&interval) {
                continue;
            }
            let (orientation, blocks) = fragments.at(i);
            into.push(orientation, blocks.iter().copied())?;
            consumed += 1;
        }
        self.stats += SourceStats::new(consumed, 0, 0);
        Ok(())
    }

    fn stats(&self) -> SourceStats {
        self.stats
    }
}
