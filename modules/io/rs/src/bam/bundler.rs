use std::collections::HashMap;
use std::mem;

use eyre::Result;
use noodles::bam;

/// A paired-end alignment record that can be matched with its mate.
pub trait MateRecord {
    /// Query name shared by both mates.
    fn qname(&self) -> Option<&[u8]>;

    /// True for the first segment (left mate) of the template.
    fn is_first_segment(&self) -> bool;

    /// True if the mate information recorded in `self` describes `other`: reference id, start
    /// position, strand and mapped state must all agree.
    fn describes_mate(&self, other: &Self) -> Result<bool>;
}

impl MateRecord for bam::Record {
    fn qname(&self) -> Option<&[u8]> {
        self.name().map(|name| &**name)
    }

    fn is_first_segment(&self) -> bool {
        self.flags().is_first_segment()
    }

    fn describes_mate(&self, other: &Self) -> Result<bool> {
        let (flags, mate) = (self.flags(), other.flags());
        Ok(flags.is_mate_reverse_complemented() == mate.is_reverse_complemented()
            && flags.is_mate_unmapped() == mate.is_unmapped()
            && self.mate_reference_sequence_id().transpose()?
                == other.reference_sequence_id().transpose()?
            && self.mate_alignment_start().transpose()? == other.alignment_start().transpose()?)
    }
}

#[derive(Debug, Clone)]
struct Bundle<R> {
    lmate: Vec<R>,
    rmate: Vec<R>,
}

impl<R> Default for Bundle<R> {
    fn default() -> Self {
        Self {
            lmate: Vec::new(),
            rmate: Vec::new(),
        }
    }
}

impl<R: MateRecord> Bundle<R> {
    fn is_empty(&self) -> bool {
        self.lmate.is_empty() && self.rmate.is_empty()
    }

    fn len(&self) -> usize {
        self.lmate.len() + self.rmate.len()
    }

    fn clear(&mut self) {
        self.lmate.clear();
        self.rmate.clear();
    }

    // Pair the record with the first compatible cached mate or cache it
    fn push(&mut self, record: R) -> Result<Option<(R, R)>> {
        let is_lmate = record.is_first_segment();
        let candidates = if is_lmate { &self.rmate } else { &self.lmate };

        let mut found = None;
        for (ind, mate) in candidates.iter().enumerate() {
            if record.describes_mate(mate)? && mate.describes_mate(&record)? {
                found = Some(ind);
                break;
            }
        }

        Ok(match (found, is_lmate) {
            (Some(ind), true) => Some((record, self.rmate.remove(ind))),
            (Some(ind), false) => Some((self.lmate.remove(ind), record)),
            (None, true) => {
                self.lmate.push(record);
                None
            }
            (None, false) => {
                self.rmate.push(record);
                None
            }
        })
    }
}

/// Reconstructs mate pairs from a stream of paired-end records.
///
/// Records are cached by query name until their mate arrives. Each record is paired with the first
/// compatible unpaired mate, which makes the result deterministic but not necessarily optimal for
/// templates with more than two alignments. Emptied cache entries are evicted every `bundle_every`
/// records.
#[derive(Debug, Clone)]
pub struct MatesBundler<R> {
    bundles: HashMap<Vec<u8>, Bundle<R>>,
    arena: Vec<Bundle<R>>,
    bundle_every: usize,
    pushed: usize,
}

impl<R: MateRecord> Default for MatesBundler<R> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BUNDLE_EVERY)
    }
}

impl<R: MateRecord> MatesBundler<R> {
    pub const DEFAULT_BUNDLE_EVERY: usize = 16;

    pub fn new(bundle_every: usize) -> Self {
        Self {
            bundles: HashMap::new(),
            arena: Vec::new(),
            bundle_every: bundle_every.max(1),
            pushed: 0,
        }
    }

    /// Number of records waiting for their mates.
    pub fn pending(&self) -> usize {
        self.bundles.values().map(Bundle::len).sum()
    }

    /// Add a record to the bundler. Returns the (left, right) pair if the record completes one.
    pub fn push(&mut self, record: R) -> Result<Option<(R, R)>> {
        let qname = record.qname().ok_or_else(|| {
            eyre::eyre!("Query name must be present in paired-end alignment records")
        })?;

        let pair = match self.bundles.get_mut(qname) {
            Some(bundle) => bundle.push(record)?,
            None => {
                let qname = qname.to_vec();
                let mut bundle = self.arena.pop().unwrap_or_default();
                let pair = bundle.push(record)?;
                self.bundles.insert(qname, bundle);
                pair
            }
        };

        self.pushed += 1;
        if self.pushed >= self.bundle_every {
            self.sweep();
            self.pushed = 0;
        }
        Ok(pair)
    }

    fn sweep(&mut self) {
        let arena = &mut self.arena;
        self.bundles = mem::take(&mut self.bundles)
            .into_iter()
            .filter_map(|(qname, bundle)| {
                if bundle.is_empty() {
                    arena.push(bundle);
                    None
                } else {
                    Some((qname, bundle))
                }
            })
            .collect();
    }

    /// Drop all cached records and return the number of orphans, i.e. records whose mate was never
    /// seen.
    pub fn flush(&mut self) -> u64 {
        let mut orphans = 0;
        for (qname, mut bundle) in self.bundles.drain() {
            if !bundle.lmate.is_empty() && !bundle.rmate.is_empty() {
                log::error!(
                    "Mates of {} don't reference each other: {} left and {} right records unpaired",
                    String::from_utf8_lossy(&qname),
                    bundle.lmate.len(),
                    bundle.rmate.len()
                );
            }
            orphans += bundle.len() as u64;
            bundle.clear();
            self.arena.push(bundle);
        }
        self.pushed = 0;
        orphans
    }
}
