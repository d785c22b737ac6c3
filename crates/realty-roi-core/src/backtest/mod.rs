pub mod engine;
pub mod insights;
pub mod performance;
pub mod transactions;

pub use engine::{run_backtest, run_portfolio_backtest, BacktestRequest, BacktestResult};
