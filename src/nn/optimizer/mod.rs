mod adam;
mod base;

pub use adam::Adam;
pub use base::{Optimizer, OptimizerConfig};
