use clap::Args;
use serde_json::Value;

use realty_roi_core::backtest::transactions::Transaction;
use realty_roi_core::backtest::{self, BacktestRequest};

use crate::input;

/// Arguments for a single-property backtest
#[derive(Args)]
pub struct BacktestArgs {
    /// Path to backtest request file (property, window, scenarios, config)
    #[arg(long)]
    pub input: Option<String>,

    /// CSV of transactions (date,kind,amount,category,description);
    /// replaces any transactions in the request
    #[arg(long)]
    pub transactions: Option<String>,
}

/// Arguments for a portfolio backtest
#[derive(Args)]
pub struct PortfolioBacktestArgs {
    /// Path to a file holding an array of backtest requests
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_backtest(args: BacktestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: Value = input::read_input(args.input.as_deref(), "backtest")?;

    if let Some(ref path) = args.transactions {
        let transactions: Vec<Transaction> = input::file::read_csv(path)?;
        tracing::debug!(count = transactions.len(), path = %path, "loaded transactions");
        match request.as_object_mut() {
            Some(map) => {
                map.insert("transactions".into(), serde_json::to_value(transactions)?);
            }
            None => return Err("Backtest request must be an object".into()),
        }
    }

    let request: BacktestRequest = serde_json::from_value(request)?;
    let result = backtest::run_backtest(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_portfolio_backtest(
    args: PortfolioBacktestArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let requests: Vec<BacktestRequest> =
        input::read_input(args.input.as_deref(), "portfolio backtest")?;
    let result = backtest::run_portfolio_backtest(&requests)?;
    Ok(serde_json::to_value(result)?)
}
