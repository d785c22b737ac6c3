use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::engine::{BacktestConfig, ScenarioBacktest};
use crate::backtest::performance::PerformanceMetrics;
use crate::backtest::transactions::BaseMetrics;

/// Categorised findings from a backtest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub summary: Vec<String>,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Insights {
    /// The only insight produced for a window without transactions.
    pub fn insufficient_data() -> Self {
        Insights {
            summary: vec![
                "Insufficient data: no transactions found for the specified period".into(),
            ],
            ..Insights::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.risks.is_empty()
            && self.opportunities.is_empty()
            && self.recommendations.is_empty()
    }
}

/// Threshold rules, one finding per condition.
pub fn generate_insights(
    base: &BaseMetrics,
    performance: &PerformanceMetrics,
    scenarios: &[ScenarioBacktest],
    config: &BacktestConfig,
) -> Insights {
    let mut insights = Insights::default();

    if base.monthly_cash_flow > Decimal::ZERO {
        insights
            .summary
            .push("Property generated positive cash flow during the analysis period".into());
    } else {
        insights
            .risks
            .push("Property had negative cash flow during the analysis period".into());
    }

    if base.occupancy_rate > config.high_occupancy {
        insights.summary.push("High occupancy rate achieved".into());
    } else if base.occupancy_rate < config.low_occupancy {
        insights
            .risks
            .push("Low occupancy rate may indicate market or management issues".into());
    }

    if performance.sharpe_ratio > config.good_sharpe {
        insights.summary.push("Good risk-adjusted returns".into());
    } else if performance.sharpe_ratio < Decimal::ZERO {
        insights.risks.push("Poor risk-adjusted returns".into());
    }

    if performance.max_drawdown < config.drawdown_alert {
        insights
            .risks
            .push("Significant cash flow volatility observed".into());
    }

    // First occurrence wins on ties.
    let best = scenarios.iter().fold(None::<&ScenarioBacktest>, |best, s| match best {
        Some(b) if b.metrics.monthly_cash_flow >= s.metrics.monthly_cash_flow => Some(b),
        _ => Some(s),
    });
    let worst = scenarios.iter().fold(None::<&ScenarioBacktest>, |worst, s| match worst {
        Some(w) if w.metrics.monthly_cash_flow <= s.metrics.monthly_cash_flow => Some(w),
        _ => Some(s),
    });
    if let (Some(best), Some(worst)) = (best, worst) {
        insights
            .opportunities
            .push(format!("Best performing scenario: {}", best.name));
        insights
            .risks
            .push(format!("Worst performing scenario: {}", worst.name));
    }

    if base.occupancy_rate < config.management_occupancy {
        insights
            .recommendations
            .push("Consider improving property management to increase occupancy".into());
    }

    if base.monthly_expenses > base.monthly_income * config.expense_ratio_alert {
        insights.recommendations.push(
            "Review operating expenses: they may be too high relative to income".into(),
        );
    }

    if performance.return_volatility > config.volatility_alert {
        insights
            .recommendations
            .push("Consider strategies to stabilize cash flow".into());
    }

    insights
}
