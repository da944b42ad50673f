use std::cmp::Ordering;
use std::thread::available_parallelism;

use eyre::{Result, WrapErr};

fn normalize(requested: isize, max: isize) -> usize {
    match requested.cmp(&0) {
        Ordering::Less => (max + requested + 1).max(1) as usize,
        Ordering::Equal => max.max(1) as usize,
        Ordering::Greater => requested.min(max) as usize,
    }
}

/// Number of worker threads to use.
///
/// Positive values are capped by the number of available cores, zero requests all of them, and
/// negative values leave `|requested| - 1` cores idle (-1 is all cores, -2 is all but one, etc).
pub fn available(requested: isize) -> Result<usize> {
    let max = available_parallelism()
        .wrap_err("Failed to query the number of available cores")?
        .get() as isize;
    Ok(normalize(requested, max))
}
