use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Contig is an object that refers to an actual assembly contig (chromosome, scaffold, etc).
/// Usually encoded by a string, but any hashable and ordered type will do.
pub trait Contig:
    Hash + PartialEq + Eq + PartialOrd + Ord + Clone + Default + Debug + Display + Send + Sync
{
}

impl<T> Contig for T where
    T: Hash + PartialEq + Eq + PartialOrd + Ord + Clone + Default + Debug + Display + Send + Sync
{
}
