pub use elements::Elements;
pub use steps::Steps;

mod elements;
mod steps;
