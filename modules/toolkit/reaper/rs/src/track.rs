use derive_getters::Dissolve;
use derive_more::Constructor;
use eyre::{ensure, eyre, Result};

use biobit_collections_rs::rle_vec::RleVec;
use biobit_core_rs::num::Float;

/// Adjacent cells differing by less than `sensitivity` are collapsed into a single run. Equal
/// values are always collapsed, even with zero sensitivity.
#[derive(Clone, Copy, PartialEq, Debug, Default, Dissolve, Constructor)]
pub struct RleIdentical<Cnts: Float> {
    pub sensitivity: Cnts,
}

impl<Cnts: Float> RleIdentical<Cnts> {
    #[inline(always)]
    pub fn identical(&self, first: &Cnts, second: &Cnts) -> bool {
        first == second || (*first - *second).abs() < self.sensitivity
    }
}

/// Run-length encoded signal over a contig or a transcript. Runs start at position 0 and cover
/// the whole sequence.
pub type Track<Cnts> = RleVec<Cnts, u32>;

pub(crate) fn to_length(length: u64) -> Result<u32> {
    u32::try_from(length).map_err(|_| eyre!("Run length {length} doesn't fit in u32"))
}

/// Build a track from `(end, value)` cells. Ends must be strictly increasing, the first cell
/// starts at 0. Adjacent identical cells are collapsed.
pub fn from_cells<Cnts: Float>(
    cells: impl IntoIterator<Item = (u64, Cnts)>,
    identical: RleIdentical<Cnts>,
) -> Result<Track<Cnts>> {
    let mut track = Track::new();
    let mut current: Option<(Cnts, u64)> = None;
    let mut start = 0;
    for (end, value) in cells {
        ensure!(
            end > start,
            "Track boundaries must be strictly increasing, got {end} after {start}"
        );
        let length = end - start;
        start = end;

        current = match current {
            Some((cval, clen)) if identical.identical(&cval, &value) => Some((cval, clen + length)),
            Some((cval, clen)) => {
                track.push(cval, to_length(clen)?);
                Some((value, length))
            }
            None => Some((value, length)),
        };
    }
    if let Some((cval, clen)) = current {
        track.push(cval, to_length(clen)?);
    }
    Ok(track)
}

/// Iterate over track cells as half-open `(start, end, value)` triples.
pub fn cells<Cnts: Float>(track: &Track<Cnts>) -> impl Iterator<Item = (u64, u64, Cnts)> + '_ {
    let mut cursor = 0u64;
    track.runs().map(move |(value, length)| {
        let start = cursor;
        cursor += *length as u64;
        (start, cursor, *value)
    })
}
