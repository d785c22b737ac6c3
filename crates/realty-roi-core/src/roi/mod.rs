pub mod cache;
pub mod cash_flows;
pub mod engine;
pub mod inputs;
pub mod interpret;
pub mod metrics;
pub mod projection;

pub use engine::{compare_properties, compute_roi, PropertyComparison, RankedProperty, RoiResult};
pub use inputs::{LocalMarketReference, PropertyFinancials, RoiInput};
