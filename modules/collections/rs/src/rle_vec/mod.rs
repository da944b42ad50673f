pub use merge::merge;
pub use rle_vec::RleVec;

mod merge;
#[allow(clippy::module_inception)]
mod rle_vec;
