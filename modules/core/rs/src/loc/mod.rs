pub use contig::Contig;
pub use interval::{Interval, IntervalOp};
pub use orientation::Orientation;
pub use per_orientation::PerOrientation;
pub use per_strand::PerStrand;
pub use strand::Strand;

mod contig;
mod interval;
mod orientation;
mod per_orientation;
mod per_strand;
mod strand;
