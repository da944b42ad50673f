pub use index::{GenomicIndex, GenomicIndexBuilder};

mod index;
