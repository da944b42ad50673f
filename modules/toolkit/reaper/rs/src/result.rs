use derive_getters::{Dissolve, Getters};
use derive_more::Constructor;

use biobit_core_rs::loc::{Contig, Strand};
use biobit_core_rs::num::{Float, PrimInt};

use crate::cmp::Enrichment;
use crate::track::Track;

pub use crate::pcalling::Peak;

/// Peak calling results for a single strand of a single contig.
///
/// Treatment and control tracks are normalized: scaled, thresholded, and floored by the baseline,
/// exactly as they were compared.
#[derive(Clone, Debug, Constructor, Dissolve, Getters)]
pub struct Harvest<Ctg: Contig, Idx: PrimInt, Cnts: Float> {
    contig: Ctg,
    strand: Strand,
    length: Idx,
    treatment: Track<Cnts>,
    control: Track<Cnts>,
    enrichment: Enrichment<Cnts>,
    peaks: Vec<Peak<Idx, Cnts>>,
}
