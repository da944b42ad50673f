pub use by_cutoff::ByCutoff;
pub use peak::Peak;

mod by_cutoff;
mod peak;
