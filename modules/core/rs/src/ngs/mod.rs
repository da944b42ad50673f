pub use aligned_blocks::AlignedBlocks;
pub use layout::Layout;
pub use strandedness::Strandedness;

mod aligned_blocks;
mod layout;
mod strandedness;
