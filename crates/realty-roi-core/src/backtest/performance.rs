use chrono::Datelike;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::backtest::transactions::Transaction;
use crate::types::{Money, Rate};

/// Net cash flow of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCashFlow {
    pub year: i32,
    pub month: u32,
    pub net: Money,
}

/// Risk and return statistics over the monthly cash-flow series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Sum of all net amounts in the window
    pub total_return: Money,
    pub average_monthly_return: Money,
    /// Sample standard deviation of monthly net cash flow
    pub return_volatility: Money,
    /// (average - monthly risk-free) / volatility; 0 when volatility is 0
    pub sharpe_ratio: Rate,
    /// Largest peak-to-trough fall of cumulative cash flow, as a value <= 0
    pub max_drawdown: Money,
    pub months_analyzed: usize,
    pub monthly_series: Vec<MonthlyCashFlow>,
}

// ---------------------------------------------------------------------------
// Helper math
// ---------------------------------------------------------------------------

fn sqrt_decimal(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    x.sqrt().unwrap_or(Decimal::ZERO)
}

/// Sample standard deviation; 0 with fewer than two observations.
pub fn sample_std_dev(values: &[Decimal]) -> Decimal {
    if values.len() < 2 {
        return Decimal::ZERO;
    }
    let n = Decimal::from(values.len());
    let mean = values.iter().copied().sum::<Decimal>() / n;
    let var = values
        .iter()
        .map(|v| {
            let d = *v - mean;
            d * d
        })
        .sum::<Decimal>()
        / (n - Decimal::ONE);
    sqrt_decimal(var)
}

/// Largest drop from a running peak of the cumulative series, reported as a
/// non-positive amount. The running peak starts at the first cumulative value.
pub fn max_drawdown(period_flows: &[Money]) -> Money {
    let mut cumulative = Decimal::ZERO;
    let mut peak: Option<Money> = None;
    let mut worst = Decimal::ZERO;
    for flow in period_flows {
        cumulative += *flow;
        let running_peak = peak.map_or(cumulative, |p| p.max(cumulative));
        peak = Some(running_peak);
        worst = worst.min(cumulative - running_peak);
    }
    worst
}

/// Net cash flow grouped by calendar month, oldest first.
pub fn monthly_series(transactions: &[&Transaction]) -> Vec<MonthlyCashFlow> {
    let mut by_month: BTreeMap<(i32, u32), Money> = BTreeMap::new();
    for t in transactions {
        *by_month.entry((t.date.year(), t.date.month())).or_default() += t.net_amount();
    }
    by_month
        .into_iter()
        .map(|((year, month), net)| MonthlyCashFlow { year, month, net })
        .collect()
}

/// Performance statistics for the window.
pub fn performance_metrics(
    transactions: &[&Transaction],
    risk_free_rate_annual: Rate,
) -> PerformanceMetrics {
    if transactions.is_empty() {
        return PerformanceMetrics::default();
    }

    let series = monthly_series(transactions);
    let flows: Vec<Money> = series.iter().map(|m| m.net).collect();

    let total_return: Money = transactions.iter().map(|t| t.net_amount()).sum();
    let average_monthly_return = flows.iter().copied().sum::<Decimal>() / Decimal::from(flows.len());
    let return_volatility = sample_std_dev(&flows);

    let monthly_risk_free = risk_free_rate_annual / Decimal::from(12);
    let sharpe_ratio = if return_volatility > Decimal::ZERO {
        (average_monthly_return - monthly_risk_free) / return_volatility
    } else {
        Decimal::ZERO
    };

    PerformanceMetrics {
        total_return,
        average_monthly_return,
        return_volatility,
        sharpe_ratio,
        max_drawdown: max_drawdown(&flows),
        months_analyzed: series.len(),
        monthly_series: series,
    }
}

impl PerformanceMetrics {
    /// Round for presentation: money to cents, ratio to 4 dp.
    pub fn rounded(&self) -> PerformanceMetrics {
        PerformanceMetrics {
            total_return: self.total_return.round_dp(2),
            average_monthly_return: self.average_monthly_return.round_dp(2),
            return_volatility: self.return_volatility.round_dp(2),
            sharpe_ratio: self.sharpe_ratio.round_dp(4),
            max_drawdown: self.max_drawdown.round_dp(2),
            months_analyzed: self.months_analyzed,
            monthly_series: self.monthly_series.clone(),
        }
    }
}
