pub mod metrics;
pub mod regression;

pub use metrics::{MetricsCalculator, SecurityMetrics};
pub use regression::{Conclusion, RegressionResult, RelationshipModel};
