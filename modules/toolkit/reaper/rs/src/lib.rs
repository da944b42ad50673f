pub use reaper::Reaper;
pub use result::Harvest;
pub use workload::{Config, Scaling, Workload};

pub mod cmp;
pub mod coordmap;
mod engine;
pub mod pcalling;
pub mod pileup;
mod reaper;
pub mod result;
pub mod track;
mod worker;
mod workload;
