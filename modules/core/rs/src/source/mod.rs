pub use memory::InMemory;
pub use source::{Source, SourceStats};

mod memory;
#[allow(clippy::module_inception)]
mod source;
