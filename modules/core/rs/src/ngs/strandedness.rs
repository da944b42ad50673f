/// How sequenced reads relate to the strand of the molecule they were sampled from.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, derive_more::Display)]
pub enum Strandedness {
    /// Reads repeat the source molecule.
    Forward,
    /// Reads are reverse complements of the source molecule.
    Reverse,
    /// Either of the above, strand information is lost.
    #[default]
    Unstranded,
}
