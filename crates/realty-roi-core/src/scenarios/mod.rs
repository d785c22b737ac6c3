pub mod scenario;
pub mod sensitivity;

pub use scenario::{apply_scenario, run_roi_scenarios};
pub use sensitivity::sensitivity_analysis;
