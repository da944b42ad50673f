pub mod bam;
pub mod bed;
pub mod compression;
pub mod track;
mod traits;

pub use traits::{ReadRecord, WriteRecord};
