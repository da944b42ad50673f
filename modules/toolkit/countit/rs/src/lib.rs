pub use annotator::{Annotator, Counts};
pub use category::{Category, Weights};
pub use resolution::Resolution;

mod annotator;
mod category;
mod resolution;
