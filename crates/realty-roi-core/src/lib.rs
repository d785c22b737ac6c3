pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "roi")]
pub mod roi;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "backtest")]
pub mod backtest;

pub use error::RealtyError;
pub use types::*;

/// Standard result type for all realty-roi operations
pub type RealtyResult<T> = Result<T, RealtyError>;
