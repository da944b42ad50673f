use derive_getters::{Dissolve, Getters};
use eyre::{ensure, eyre, Result};

use biobit_core_rs::loc::{Interval, IntervalOp};
use biobit_core_rs::ngs::AlignedBlocks;
use biobit_core_rs::num::{Float, PrimInt};

use crate::track::{self, RleIdentical, Track};

/// A spliced transcript: sorted, non-overlapping exons on a single contig.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Dissolve, Getters)]
pub struct Transcript<Idx: PrimInt> {
    exons: Vec<Interval<Idx>>,
    // Transcript coordinate of each exon start
    offsets: Vec<Idx>,
    length: Idx,
}

impl<Idx: PrimInt> Transcript<Idx> {
    pub fn new(exons: Vec<Interval<Idx>>) -> Result<Self> {
        ensure!(!exons.is_empty(), "Transcript must have at least one exon");

        let mut offsets = Vec::with_capacity(exons.len());
        let mut length = Idx::zero();
        for (ind, exon) in exons.iter().enumerate() {
            ensure!(!exon.is_empty(), "Empty exon {exon:?} in the transcript");
            if ind > 0 {
                ensure!(
                    exons[ind - 1].end() <= exon.start(),
                    "Transcript exons must be sorted and non-overlapping, got {:?} before {:?}",
                    exons[ind - 1],
                    exon
                );
            }
            offsets.push(length);
            length = length + exon.len();
        }

        Ok(Self {
            exons,
            offsets,
            length,
        })
    }

    /// From the start of the first exon to the end of the last one.
    pub fn envelope(&self) -> Interval<Idx> {
        let (first, last) = (self.exons[0], self.exons[self.exons.len() - 1]);
        // Exons are sorted and non-overlapping
        Interval::new(first.start(), last.end()).unwrap_or(first)
    }
}

/// Project genomic fragments onto the transcript. Blocks outside of exons are dropped; pieces of
/// a fragment that become adjacent after splicing are joined together. Fragments without any
/// exonic block are skipped.
///
/// Fragments must be sorted by their start. Mapping begins at the `hint` fragment, and the
/// returned value is a valid hint for the next transcript starting at or after this one.
pub fn to_transcript<Idx: PrimInt>(
    transcript: &Transcript<Idx>,
    fragments: &AlignedBlocks<Idx>,
    hint: usize,
    saveto: &mut AlignedBlocks<Idx>,
) -> Result<usize> {
    let envelope = transcript.envelope();
    let exons = transcript.exons();

    let mut next_hint = hint;
    let mut leading = true;
    let mut mapped = Vec::new();

    for ind in hint..fragments.len() {
        let (orientation, blocks) = fragments.at(ind);
        let (first, last) = (blocks[0], blocks[blocks.len() - 1]);

        if last.end() <= envelope.start() {
            if leading {
                next_hint = ind + 1;
            }
            continue;
        }
        leading = false;

        if first.start() >= envelope.end() {
            break;
        }

        // Walk blocks and exons in lock-step
        mapped.clear();
        let (mut exind, mut blind) = (0, 0);
        while exind < exons.len() && blind < blocks.len() {
            let (exon, block) = (exons[exind], blocks[blind]);
            if block.end() <= exon.start() {
                blind += 1;
                continue;
            } else if exon.end() <= block.start() {
                exind += 1;
                continue;
            }

            if let Some(overlap) = block.intersection(&exon) {
                let shift = transcript.offsets()[exind];
                mapped.push((overlap << exon.start()) >> shift);
            }

            if block.end() < exon.end() {
                blind += 1;
            } else {
                exind += 1;
            }
        }

        if !mapped.is_empty() {
            saveto.push(orientation, mapped.drain(..))?;
        }
    }

    Ok(next_hint)
}

/// Expand a transcript-level track onto the genome. Introns and flanks are filled with zeros and
/// the result spans the whole contig.
pub fn to_genome<Idx: PrimInt, Cnts: Float>(
    transcript: &Transcript<Idx>,
    contig_length: Idx,
    track: &Track<Cnts>,
    identical: RleIdentical<Cnts>,
) -> Result<Track<Cnts>> {
    let to_u64 = |x: Idx| {
        x.to_u64()
            .ok_or_else(|| eyre!("Position {x:?} doesn't fit in u64"))
    };

    let trlen = to_u64(*transcript.length())?;
    ensure!(
        track.total_length() == trlen,
        "Track length ({}) doesn't match the transcript length ({trlen})",
        track.total_length()
    );
    let contig_length = to_u64(contig_length)?;
    let envelope = transcript.envelope();
    ensure!(
        to_u64(envelope.end())? <= contig_length,
        "Transcript {envelope:?} exceeds the contig length ({contig_length})"
    );

    let exons = transcript
        .exons()
        .iter()
        .map(|x| Ok((to_u64(x.start())?, to_u64(x.end())?)))
        .collect::<Result<Vec<_>>>()?;

    let mut cells = Vec::with_capacity(track.len() + 2 * exons.len() + 1);
    if exons[0].0 > 0 {
        cells.push((exons[0].0, Cnts::zero()));
    }

    // Genomic position and the current exon
    let (mut gnpos, mut exind) = (exons[0].0, 0);
    for (trstart, trend, value) in track::cells(track) {
        let mut left = trend - trstart;
        while left > 0 {
            let (_, exend) = exons[exind];
            let step = left.min(exend - gnpos);
            gnpos += step;
            left -= step;
            cells.push((gnpos, value));

            // Jump over the intron
            if gnpos == exend && exind + 1 < exons.len() {
                exind += 1;
                if exons[exind].0 > gnpos {
                    gnpos = exons[exind].0;
                    cells.push((gnpos, Cnts::zero()));
                }
            }
        }
    }

    if gnpos < contig_length {
        cells.push((contig_length, Cnts::zero()));
    }

    track::from_cells(cells, identical)
}
