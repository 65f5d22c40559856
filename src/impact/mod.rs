//! Price-impact curve analysis for the trade-size chart.

pub mod builder;
pub mod types;

pub use builder::build_curve;
pub use types::{ImpactAnalysis, ImpactInput};
