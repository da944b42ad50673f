use eyre::{ensure, eyre, Result};

use biobit_collections_rs::rle_vec;
use biobit_core_rs::loc::{Interval, IntervalOp};
use biobit_core_rs::num::{Float, PrimInt};

use crate::track::{RleIdentical, Track};

/// Coverage of a contig (or a transcript) by aligned fragments.
///
/// Each fragment is extended by `extension` at its outer ends only, and its weight is
/// `original_length / extended_length`, so that the total signal of a fragment doesn't depend
/// on the extension. Gaps between blocks of a fragment are never filled.
///
/// `buffer` is a scratch space for the dense accumulation; it's resized to the contig length.
pub fn calculate<'a, Idx, Cnts>(
    length: Idx,
    fragments: impl IntoIterator<Item = &'a [Interval<Idx>]>,
    extension: Idx,
    identical: RleIdentical<Cnts>,
    buffer: &mut Vec<Cnts>,
) -> Result<Track<Cnts>>
where
    Idx: PrimInt + 'a,
    Cnts: Float,
{
    let contig = Interval::new(Idx::zero(), length)?;
    let dense_len = length
        .to_usize()
        .ok_or_else(|| eyre!("Contig length {length:?} doesn't fit in usize"))?;

    buffer.clear();
    buffer.resize(dense_len, Cnts::zero());

    let mut clipped = Vec::new();
    for blocks in fragments {
        clipped.clear();
        clipped.extend(blocks.iter().filter_map(|x| x.clamped(&contig)));
        if clipped.is_empty() {
            continue;
        }
        accumulate(&clipped, extension, &contig, buffer)?;
    }

    Track::from_dense(buffer.as_slice(), |a, b| identical.identical(a, b))
}

fn accumulate<Idx: PrimInt, Cnts: Float>(
    blocks: &[Interval<Idx>],
    extension: Idx,
    contig: &Interval<Idx>,
    saveto: &mut [Cnts],
) -> Result<()> {
    let (first, last) = (blocks[0], blocks[blocks.len() - 1]);
    let envelope = Interval::new(first.start(), last.end())?;
    let extended = envelope.extended_within(extension, extension, contig);

    let total = blocks.iter().fold(Idx::zero(), |acc, x| acc + x.len());
    let tails = (first.start() - extended.start()) + (extended.end() - last.end());

    let weight = to_cnts::<_, Cnts>(total)? / to_cnts::<_, Cnts>(total + tails)?;

    let mut add = |start: Idx, end: Idx| -> Result<()> {
        let (start, end) = (to_usize(start)?, to_usize(end)?);
        for x in &mut saveto[start..end] {
            *x = *x + weight;
        }
        Ok(())
    };

    add(extended.start(), first.start())?;
    for block in blocks {
        add(block.start(), block.end())?;
    }
    add(last.end(), extended.end())?;
    Ok(())
}

fn to_usize<Idx: PrimInt>(x: Idx) -> Result<usize> {
    x.to_usize()
        .ok_or_else(|| eyre!("Position {x:?} doesn't fit in usize"))
}

fn to_cnts<Idx: PrimInt, Cnts: Float>(x: Idx) -> Result<Cnts> {
    Cnts::from(x).ok_or_else(|| eyre!("Length {x:?} can't be represented as a float"))
}

/// Combine tracks by taking the maximum across all of them and the `baseline` at each position.
/// All tracks must cover the same number of positions. A single track is floored by the baseline
/// and re-simplified.
pub fn merge_by_max<'a, Cnts: Float + 'a>(
    tracks: impl IntoIterator<Item = &'a Track<Cnts>>,
    baseline: Cnts,
    identical: RleIdentical<Cnts>,
) -> Result<Track<Cnts>> {
    let tracks = tracks.into_iter().collect::<Vec<_>>();
    ensure!(!tracks.is_empty(), "At least one track is required to merge");

    let length = tracks[0].total_length();
    for t in &tracks[1..] {
        ensure!(
            t.total_length() == length,
            "Merged tracks must have the same length, got {} and {}",
            length,
            t.total_length()
        );
    }

    rle_vec::merge(
        &tracks,
        |values: &[&Cnts]| values.iter().fold(baseline, |acc, x| acc.max(**x)),
        |a: &Cnts, b: &Cnts| identical.identical(a, b),
    )
}
