// Format specification: https://samtools.github.io/hts-specs/BEDv1.pdf
// narrowPeak (BED6+4): https://genome.ucsc.edu/FAQ/FAQformat.html#format12

mod reader;
mod record;
pub mod validate;
mod writer;

pub use reader::{parse, read_index, Reader};
pub use record::{Bed6, NarrowPeak};
pub use writer::Writer;
