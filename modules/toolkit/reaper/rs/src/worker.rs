use std::fmt::{Display, Formatter};

use ahash::HashMap;
use derive_getters::Dissolve;
use eyre::{Result, WrapErr};
use num::Zero;

use biobit_core_rs::loc::{Interval, IntervalOp, Orientation, PerStrand, Strand};
use biobit_core_rs::ngs::AlignedBlocks;
use biobit_core_rs::num::Float;
use biobit_core_rs::source::Source;

use crate::cmp::{Enrichment, PValues, QTableBuilder};
use crate::coordmap::{self, Transcript};
use crate::pileup;
use crate::track::{RleIdentical, Track};
use crate::workload::Config;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Library {
    Treatment,
    Control,
}

impl Display for Library {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Library::Treatment => write!(f, "treatment"),
            Library::Control => write!(f, "control"),
        }
    }
}

/// Stranded signal of a single library over a single contig.
#[derive(Debug, Default, Dissolve)]
pub struct Coverage<Cnts: Float> {
    // Fragments fetched from all sources
    pub total: u64,
    // Fragments assigned to each strand, dual fragments are counted on both
    pub fragments: PerStrand<u64>,
    pub tracks: PerStrand<Track<Cnts>>,
}

/// Treatment and control after normalization plus their differential signal.
#[derive(Debug, Default, Dissolve)]
pub struct Comparison<Cnts: Float> {
    pub treatment: Track<Cnts>,
    pub control: Track<Cnts>,
    pub enrichment: Enrichment<Cnts>,
    pub pvalues: QTableBuilder,
}

/// Genome-wide normalization applied before the comparison.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Normalization<Cnts> {
    // Minimum raw control signal
    pub baseline: Cnts,
    pub treatment: Cnts,
    pub control: Cnts,
}

pub struct Worker<Src: Source, Cnts: Float> {
    // Thread-local source handles
    sources: HashMap<Library, Vec<Src>>,
    // Internal caches
    fetched: AlignedBlocks<Src::Idx>,
    stranded: PerStrand<AlignedBlocks<Src::Idx>>,
    mapped: AlignedBlocks<Src::Idx>,
    dense: Vec<Cnts>,
    pvalues: PValues,
}

impl<Src: Source, Cnts: Float> Default for Worker<Src, Cnts> {
    fn default() -> Self {
        Self {
            sources: HashMap::default(),
            fetched: AlignedBlocks::default(),
            stranded: PerStrand::default(),
            mapped: AlignedBlocks::default(),
            dense: Vec::new(),
            pvalues: PValues::new(),
        }
    }
}

impl<Src: Source, Cnts: Float> Worker<Src, Cnts> {
    pub fn reset(&mut self) {
        self.sources.clear();
        self.fetched.clear();
        self.stranded.forward.clear();
        self.stranded.reverse.clear();
        self.mapped.clear();

        self.dense.clear();
        self.dense.shrink_to_fit();
        self.pvalues.clear();
    }

    pub fn coverage(
        &mut self,
        library: Library,
        contig: &Src::Ctg,
        length: Src::Idx,
        sources: &[Src],
        transcripts: PerStrand<&[Transcript<Src::Idx>]>,
        config: &Config<Src::Idx, Cnts>,
    ) -> Result<Coverage<Cnts>> {
        let region = Interval::new(Src::Idx::zero(), length)?;

        self.fetched.clear();
        let sources = self
            .sources
            .entry(library)
            .or_insert_with(|| sources.iter().map(|x| dyn_clone::clone(x)).collect());
        for source in sources.iter_mut() {
            source
                .fetch(contig, region, &mut self.fetched)
                .wrap_err_with(|| format!("Failed to fetch {library} fragments for {contig}"))?;
        }

        let fragments = self.split_by_strand()?;
        let forward = self.signal(library, Strand::Forward, length, transcripts.forward, config)?;
        let reverse = self.signal(library, Strand::Reverse, length, transcripts.reverse, config)?;

        log::debug!(
            "{contig}: {} {library} fragments ({}+ / {}-)",
            self.fetched.len(),
            fragments.forward,
            fragments.reverse
        );

        Ok(Coverage {
            total: self.fetched.len() as u64,
            fragments,
            tracks: PerStrand::new(forward, reverse),
        })
    }

    // Sorted by start, fragments of unknown strand go to both strands
    fn split_by_strand(&mut self) -> Result<PerStrand<u64>> {
        let mut order = (0..self.fetched.len()).collect::<Vec<_>>();
        order.sort_by_key(|x| self.fetched.envelope(*x).start());

        self.stranded.forward.clear();
        self.stranded.reverse.clear();

        let mut counts = PerStrand::<u64>::default();
        for ind in order {
            let (orientation, blocks) = self.fetched.at(ind);
            let strands: &[Strand] = match orientation {
                Orientation::Forward => &[Strand::Forward],
                Orientation::Reverse => &[Strand::Reverse],
                Orientation::Dual => &Strand::BOTH,
            };
            for strand in strands {
                self.stranded
                    .get_mut(*strand)
                    .push(orientation, blocks.iter().copied())?;
                *counts.get_mut(*strand) += 1;
            }
        }
        Ok(counts)
    }

    fn signal(
        &mut self,
        library: Library,
        strand: Strand,
        length: Src::Idx,
        transcripts: &[Transcript<Src::Idx>],
        config: &Config<Src::Idx, Cnts>,
    ) -> Result<Track<Cnts>> {
        let identical = RleIdentical::new(*config.sensitivity());
        let fragments = self.stranded.get(strand);

        if library == Library::Treatment {
            return pileup::calculate(
                length,
                fragments.iter().map(|(_, blocks)| blocks),
                *config.trtext(),
                identical,
                &mut self.dense,
            );
        }

        let mut tracks = Vec::with_capacity(config.cntext().len() + transcripts.len());
        for extension in config.cntext() {
            tracks.push(pileup::calculate(
                length,
                fragments.iter().map(|(_, blocks)| blocks),
                *extension,
                identical,
                &mut self.dense,
            )?);
        }

        // Control signal modeled in transcript coordinates
        let mut hint = 0;
        for transcript in transcripts {
            self.mapped.clear();
            hint = coordmap::to_transcript(transcript, fragments, hint, &mut self.mapped)?;
            if self.mapped.is_empty() {
                continue;
            }

            let mut local = Vec::with_capacity(config.trext().len());
            for extension in config.trext() {
                local.push(pileup::calculate(
                    *transcript.length(),
                    self.mapped.iter().map(|(_, blocks)| blocks),
                    *extension,
                    identical,
                    &mut self.dense,
                )?);
            }
            let local = pileup::merge_by_max(&local, *config.trbaseline(), identical)?;
            tracks.push(coordmap::to_genome(transcript, length, &local, identical)?);
        }

        pileup::merge_by_max(&tracks, Cnts::zero(), identical)
    }

    pub fn compare(
        &mut self,
        mut treatment: Track<Cnts>,
        control: Track<Cnts>,
        normalization: &Normalization<Cnts>,
        config: &Config<Src::Idx, Cnts>,
    ) -> Result<Comparison<Cnts>> {
        let identical = RleIdentical::new(*config.sensitivity());

        let mut control = pileup::merge_by_max([&control], normalization.baseline, identical)?;
        for value in control.values_mut() {
            *value = *value * normalization.control;
        }

        let mintrtfrag = *config.mintrtfrag();
        for value in treatment.values_mut() {
            if *value < mintrtfrag {
                *value = Cnts::zero();
            }
            *value = *value * normalization.treatment;
        }
        // Re-simplify after thresholding
        let treatment = pileup::merge_by_max([&treatment], Cnts::zero(), identical)?;

        let enrichment = Enrichment::calculate(&treatment, &control, &mut self.pvalues)?;
        let mut pvalues = QTableBuilder::new();
        enrichment.count_pvalues(&mut pvalues)?;

        Ok(Comparison {
            treatment,
            control,
            enrichment,
            pvalues,
        })
    }
}

#[cfg(test)]
mod tests {
    use biobit_core_rs::source::InMemory;

    use crate::track::tests::{assert_track_eq, track};

    use super::*;

    type Src = InMemory<&'static str, u32>;

    fn interval(start: u32, end: u32) -> Interval<u32> {
        Interval::new(start, end).unwrap()
    }

    #[test]
    fn test_coverage_by_strand() -> Result<()> {
        let source: Src = InMemory::new([
            ("chr1", Orientation::Reverse, vec![interval(5, 10)]),
            ("chr1", Orientation::Forward, vec![interval(0, 4)]),
            ("chr1", Orientation::Dual, vec![interval(2, 6)]),
            ("chr2", Orientation::Forward, vec![interval(0, 10)]),
        ])?;

        let mut config = Config::<u32, f32>::new();
        config.set_mintrtfrag(0.0)?;

        let mut worker = Worker::<Src, f32>::default();
        let coverage = worker.coverage(
            Library::Treatment,
            &"chr1",
            10,
            &[source],
            PerStrand::new(&[][..], &[][..]),
            &config,
        )?;

        assert_eq!(coverage.total, 3);
        assert_eq!(coverage.fragments, PerStrand::new(2, 2));
        assert_track_eq(
            &coverage.tracks.forward,
            &[(2, 1.0), (4, 2.0), (6, 1.0), (10, 0.0)],
        );
        assert_track_eq(
            &coverage.tracks.reverse,
            &[(2, 0.0), (5, 1.0), (6, 2.0), (10, 1.0)],
        );
        Ok(())
    }

    #[test]
    fn test_control_with_transcripts() -> Result<()> {
        // A spliced read and an intronic read on the reverse strand
        let source: Src = InMemory::new([
            (
                "chr1",
                Orientation::Reverse,
                vec![interval(10, 12), interval(20, 22)],
            ),
            ("chr1", Orientation::Reverse, vec![interval(14, 16)]),
        ])?;

        let mut config = Config::<u32, f32>::new();
        config.set_trbaseline(0.5)?;

        let transcript = Transcript::new(vec![interval(8, 12), interval(20, 24)])?;
        let reverse = [transcript];
        let empty: &[Transcript<u32>] = &[];

        let mut worker = Worker::<Src, f32>::default();
        let coverage = worker.coverage(
            Library::Control,
            &"chr1",
            30,
            &[source],
            PerStrand::new(empty, &reverse[..]),
            &config,
        )?;

        assert_track_eq(&coverage.tracks.forward, &[(30, 0.0)]);
        assert_track_eq(
            &coverage.tracks.reverse,
            &[
                (8, 0.0),
                (10, 0.5),
                (12, 1.0),
                (14, 0.0),
                (16, 1.0),
                (20, 0.0),
                (22, 1.0),
                (24, 0.5),
                (30, 0.0),
            ],
        );
        Ok(())
    }

    #[test]
    fn test_compare() -> Result<()> {
        let mut config = Config::<u32, f32>::new();
        config.set_mintrtfrag(2.0)?;

        let normalization = Normalization {
            baseline: 0.5,
            treatment: 1.0,
            control: 2.0,
        };

        let mut worker = Worker::<Src, f32>::default();
        let comparison = worker.compare(
            track(&[(2, 1.0), (4, 4.0), (10, 0.0)]),
            track(&[(5, 0.0), (10, 2.0)]),
            &normalization,
            &config,
        )?;

        assert_track_eq(&comparison.treatment, &[(2, 0.0), (4, 4.0), (10, 0.0)]);
        assert_track_eq(&comparison.control, &[(5, 1.0), (10, 4.0)]);
        assert_eq!(comparison.enrichment.ends(), &[2, 4, 5, 10]);
        assert_eq!(comparison.enrichment.fe()[1], 4.0);
        assert!(!comparison.pvalues.is_empty());
        Ok(())
    }
}
