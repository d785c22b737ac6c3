mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::backtest::{BacktestArgs, PortfolioBacktestArgs};
use commands::roi::{CompareArgs, ProjectArgs, RoiArgs, ScenarioArgs, SensitivityArgs};

/// Real-estate investment returns, what-if analysis and backtesting
#[derive(Parser)]
#[command(
    name = "rroi",
    version,
    about = "Real-estate investment returns, what-if analysis and backtesting",
    long_about = "A CLI for analysing rental property investments with decimal precision. \
                  Computes cap rate, cash-on-cash, DSCR, NPV and IRR, runs sensitivity \
                  sweeps and named scenarios, projects the holding period, and backtests \
                  recorded rent and expense history."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level used when RUST_LOG is not set (logs go to stderr)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute ROI metrics, DCF and interpretation for one property
    Roi(RoiArgs),
    /// Rank several properties by cash-on-cash return
    Compare(CompareArgs),
    /// Sweep one or more inputs and report the metric response
    Sensitivity(SensitivityArgs),
    /// Evaluate named what-if scenarios against a base property
    Scenarios(ScenarioArgs),
    /// Year-by-year holding-period projection with rent and expense growth
    Project(ProjectArgs),
    /// Backtest a property against its recorded transactions
    Backtest(BacktestArgs),
    /// Backtest several properties and aggregate the results
    PortfolioBacktest(PortfolioBacktestArgs),
    /// Print version information
    Version,
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(&cli.log_level) {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }

    let result = match cli.command {
        Commands::Roi(args) => commands::roi::run_roi(args),
        Commands::Compare(args) => commands::roi::run_compare(args),
        Commands::Sensitivity(args) => commands::roi::run_sensitivity(args),
        Commands::Scenarios(args) => commands::roi::run_scenarios(args),
        Commands::Project(args) => commands::roi::run_project(args),
        Commands::Backtest(args) => commands::backtest::run_backtest(args),
        Commands::PortfolioBacktest(args) => commands::backtest::run_portfolio_backtest(args),
        Commands::Version => {
            println!("rroi {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
