pub use builder::ReaderBuilder;
pub use bundler::{MateRecord, MatesBundler};
pub use reader::Reader;

mod blocks;
mod builder;
mod bundler;
mod indexed_reader;
mod query;
mod reader;
