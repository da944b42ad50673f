use std::fmt::Debug;

/// Primitive integers used for genomic coordinates.
pub trait PrimInt: ::num::PrimInt + Debug + Default + Send + Sync {}
impl<T: ::num::PrimInt + Debug + Default + Send + Sync> PrimInt for T {}

/// Non-negative primitive integers, e.g. contig lengths or run lengths.
pub trait PrimUInt: PrimInt + ::num::Unsigned {}

impl<T: PrimInt + ::num::Unsigned> PrimUInt for T {}

/// Floating point numbers used for coverage and scores.
pub trait Float: ::num::Float + Debug + Default + Send + Sync {}

impl<T: ::num::Float + Debug + Default + Send + Sync> Float for T {}
