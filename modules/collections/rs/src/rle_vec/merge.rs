use eyre::Result;

use biobit_core_rs::num::PrimUInt;

use super::rle_vec::{to_length, to_u64};
use super::RleVec;

/// Sweep several run-length vectors in lock-step and combine their values.
///
/// The sweep visits every stretch between consecutive run boundaries of all inputs, calling
/// `combine` with the values of the inputs that still cover the stretch (in input order).
/// Inputs may differ in length, the result spans the longest one. Produced runs are joined
/// with [`RleVec::append`] using `same`.
pub fn merge<V, L, C, S>(inputs: &[&RleVec<V, L>], mut combine: C, same: S) -> Result<RleVec<V, L>>
where
    L: PrimUInt,
    C: FnMut(&[&V]) -> V,
    S: Fn(&V, &V) -> bool,
{
    // (remaining runs, current value, end of the current run)
    let mut cursors = Vec::with_capacity(inputs.len());
    for rle in inputs {
        let mut runs = rle.runs();
        if let Some((value, length)) = runs.next() {
            cursors.push((runs, value, to_u64(*length)?));
        }
    }

    let capacity = inputs.iter().map(|x| x.len()).max().unwrap_or(0);
    let mut result = RleVec::with_capacity(capacity);
    let mut active = Vec::with_capacity(cursors.len());
    let mut position = 0u64;

    while !cursors.is_empty() {
        let end = cursors
            .iter()
            .fold(u64::MAX, |acc, (_, _, end)| acc.min(*end));

        active.clear();
        active.extend(cursors.iter().map(|(_, value, _)| *value));
        let value = combine(&active);
        result.append(value, to_length(end - position)?, &same)?;
        position = end;

        let mut ind = 0;
        while ind < cursors.len() {
            let (runs, value, runend) = &mut cursors[ind];
            if *runend > position {
                ind += 1;
                continue;
            }
            match runs.next() {
                Some((next, length)) => {
                    *value = next;
                    *runend += to_u64(*length)?;
                    ind += 1;
                }
                None => {
                    cursors.remove(ind);
                }
            }
        }
    }

    Ok(result)
}
