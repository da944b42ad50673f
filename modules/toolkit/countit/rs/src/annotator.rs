use std::hash::Hash;

use derive_getters::{Dissolve, Getters};
use eyre::{Result, WrapErr};

use biobit_collections_rs::genomic_index::GenomicIndex;
use biobit_collections_rs::interval_tree::overlap::{Elements, Steps};
use biobit_core_rs::loc::{Contig, Interval, Orientation};
use biobit_core_rs::ngs::AlignedBlocks;
use biobit_core_rs::num::PrimInt;

use crate::category::{Category, Weights};
use crate::resolution::Resolution;

/// Category weights summed over many fragments.
#[derive(Debug, Clone, PartialEq, Getters, Dissolve)]
pub struct Counts<T: Eq + Hash> {
    weights: Weights<T>,
    /// Total number of resolved fragments.
    fragments: u64,
    /// Fragments that don't overlap any annotation.
    unannotated: u64,
}

impl<T: Eq + Hash> Default for Counts<T> {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            fragments: 0,
            unannotated: 0,
        }
    }
}

/// Resolves fragments against a genomic index with a single resolution strategy.
pub struct Annotator<'a, Ctg: Contig, Idx: PrimInt, T: Eq + Hash, K = T> {
    index: &'a GenomicIndex<Ctg, Idx, T>,
    resolution: Resolution<T, K>,
    elements: Elements<Idx, &'a T>,
    steps: Steps<Idx, &'a T>,
    counts: Counts<T>,
}

impl<'a, Ctg, Idx, T, K> Annotator<'a, Ctg, Idx, T, K>
where
    Ctg: Contig,
    Idx: PrimInt,
    T: Clone + Eq + Hash,
    K: PartialEq,
{
    pub fn new(index: &'a GenomicIndex<Ctg, Idx, T>, resolution: Resolution<T, K>) -> Self {
        Self {
            index,
            resolution,
            elements: Elements::default(),
            steps: Steps::default(),
            counts: Counts::default(),
        }
    }

    /// Resolve a single fragment given by its blocks. Running totals are not affected.
    pub fn annotate(
        &mut self,
        contig: &Ctg,
        orientation: Orientation,
        blocks: &[Interval<Idx>],
    ) -> Result<Weights<T>> {
        self.index
            .overlap_into(contig, orientation, blocks, &mut self.elements);
        self.elements.to_steps(blocks, &mut self.steps);
        self.resolution.resolve(&self.steps)
    }

    /// Resolve a batch of fragments and add their weights to the running totals.
    pub fn add(&mut self, contig: &Ctg, fragments: &AlignedBlocks<Idx>) -> Result<&mut Self> {
        for (orientation, blocks) in fragments.iter() {
            let weights = self
                .annotate(contig, orientation, blocks)
                .wrap_err_with(|| format!("Failed to resolve a fragment on {contig}"))?;

            self.counts.fragments += 1;
            if weights.keys().all(Category::is_empty) {
                self.counts.unannotated += 1;
            }
            for (category, weight) in weights {
                *self.counts.weights.entry(category).or_insert(0.0) += weight;
            }
        }
        log::debug!(
            "Resolved {} fragments on {contig}, {} fragments in total",
            fragments.len(),
            self.counts.fragments
        );
        Ok(self)
    }

    pub fn counts(&self) -> &Counts<T> {
        &self.counts
    }

    pub fn finish(self) -> Counts<T> {
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> Result<GenomicIndex<&'static str, u64, &'static str>> {
        let mut builder = GenomicIndex::builder();
        builder
            .add("chr1", Orientation::Forward, Interval::new(0, 100)?, "exon")
            .add("chr1", Orientation::Forward, Interval::new(50, 150)?, "intron")
            .add("chr1", Orientation::Reverse, Interval::new(0, 1000)?, "antisense");
        Ok(builder.build())
    }

    #[test]
    fn test_annotator() -> Result<()> {
        let index = index()?;
        let mut annotator = Annotator::new(&index, Resolution::<_, &str>::Proportional);

        let weights = annotator.annotate(
            &"chr1",
            Orientation::Forward,
            &[Interval::new(90, 100)?, Interval::new(140, 160)?],
        )?;
        assert_eq!(weights.len(), 3);
        assert!((weights[&Category::Annotation("exon")] - 5.0).abs() < 1e-9);
        assert!((weights[&Category::Annotation("intron")] - 15.0).abs() < 1e-9);
        assert!((weights[&Category::Empty] - 10.0).abs() < 1e-9);

        let mut fragments = AlignedBlocks::default();
        fragments.push(Orientation::Forward, [Interval::new(0, 10)?])?;
        fragments.push(Orientation::Reverse, [Interval::new(0, 10)?])?;
        fragments.push(Orientation::Dual, [Interval::new(0, 10)?])?;
        annotator.add(&"chr1", &fragments)?;
        annotator.add(&"chr2", &fragments)?;

        let counts = annotator.finish();
        assert_eq!(*counts.fragments(), 6);
        assert_eq!(*counts.unannotated(), 4);
        assert!((counts.weights()[&Category::Annotation("exon")] - 10.0).abs() < 1e-9);
        assert!((counts.weights()[&Category::Annotation("antisense")] - 10.0).abs() < 1e-9);
        assert!((counts.weights()[&Category::Empty] - 40.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_annotator_chain() -> Result<()> {
        let index = index()?;
        let resolution = Resolution::Binary { normalize: false }
            .apply(Resolution::priority(["exon".into(), "intron".into()]))
            .apply(Resolution::Normalize { target: 1.0 });
        let mut annotator = Annotator::new(&index, resolution);

        let mut fragments = AlignedBlocks::default();
        fragments.push(Orientation::Forward, [Interval::new(60, 70)?])?;
        fragments.push(Orientation::Forward, [Interval::new(120, 130)?])?;
        annotator.add(&"chr1", &fragments)?;
        assert!((annotator.counts().weights()[&Category::Annotation("exon")] - 1.0).abs() < 1e-9);
        assert!((annotator.counts().weights()[&Category::Annotation("intron")] - 1.0).abs() < 1e-9);

        // Neither exon nor intron
        fragments.clear();
        fragments.push(Orientation::Forward, [Interval::new(500, 510)?])?;
        assert!(annotator.add(&"chr1", &fragments).is_err());
        Ok(())
    }
}
