pub mod diagnosis;

pub use diagnosis::*;
