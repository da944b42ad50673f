pub use bits::Bits;

mod bits;
pub mod overlap;
