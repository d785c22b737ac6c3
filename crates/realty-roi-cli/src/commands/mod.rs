pub mod backtest;
pub mod roi;
