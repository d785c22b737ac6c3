use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::backtest::insights::{generate_insights, Insights};
use crate::backtest::performance::{performance_metrics, PerformanceMetrics};
use crate::backtest::transactions::{base_metrics, filter_window, BaseMetrics, Transaction};
use crate::error::RealtyError;
use crate::roi::metrics;
use crate::types::*;
use crate::RealtyResult;

// ---------------------------------------------------------------------------
// Defaults (declared once)
// ---------------------------------------------------------------------------

fn default_risk_free_rate_annual() -> Rate {
    dec!(0.02)
}

fn default_high_occupancy() -> Rate {
    dec!(0.9)
}

fn default_low_occupancy() -> Rate {
    dec!(0.8)
}

fn default_management_occupancy() -> Rate {
    dec!(0.85)
}

fn default_good_sharpe() -> Decimal {
    Decimal::ONE
}

fn default_drawdown_alert() -> Money {
    dec!(-10000)
}

fn default_expense_ratio_alert() -> Rate {
    dec!(0.5)
}

fn default_volatility_alert() -> Money {
    dec!(2000)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Property record the historical transactions belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    pub purchase_price: Money,
    /// Expected annual rent; drives the occupancy estimate
    pub gross_rent_annual: Money,
    #[serde(default)]
    pub vacancy_rate: Rate,
    #[serde(default)]
    pub operating_expenses: Money,
    #[serde(default)]
    pub annual_mortgage_payment: Money,
    #[serde(default)]
    pub equity: Money,
}

/// Risk-free rate and insight thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    #[serde(default = "default_risk_free_rate_annual")]
    pub risk_free_rate_annual: Rate,
    /// Occupancy above this is reported as high
    #[serde(default = "default_high_occupancy")]
    pub high_occupancy: Rate,
    /// Occupancy below this is reported as a risk
    #[serde(default = "default_low_occupancy")]
    pub low_occupancy: Rate,
    /// Occupancy below this triggers a management recommendation
    #[serde(default = "default_management_occupancy")]
    pub management_occupancy: Rate,
    #[serde(default = "default_good_sharpe")]
    pub good_sharpe: Decimal,
    /// Drawdown below this (a negative amount) is flagged
    #[serde(default = "default_drawdown_alert")]
    pub drawdown_alert: Money,
    /// Monthly expenses above this share of monthly income are flagged
    #[serde(default = "default_expense_ratio_alert")]
    pub expense_ratio_alert: Rate,
    #[serde(default = "default_volatility_alert")]
    pub volatility_alert: Money,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            risk_free_rate_annual: default_risk_free_rate_annual(),
            high_occupancy: default_high_occupancy(),
            low_occupancy: default_low_occupancy(),
            management_occupancy: default_management_occupancy(),
            good_sharpe: default_good_sharpe(),
            drawdown_alert: default_drawdown_alert(),
            expense_ratio_alert: default_expense_ratio_alert(),
            volatility_alert: default_volatility_alert(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestRequest {
    pub property: BacktestProperty,
    pub transactions: Vec<Transaction>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub config: BacktestConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktestStatus {
    Complete,
    /// No transactions fell inside the window; aggregates are zero
    NoTransactions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: i64,
}

/// Historical metrics re-read under one scenario's assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioBacktest {
    pub name: String,
    pub probability: Option<Rate>,
    /// (rent'/rent) * ((1 - vacancy')/(1 - vacancy))
    pub income_factor: Decimal,
    /// opex'/opex
    pub expense_factor: Decimal,
    pub metrics: BaseMetrics,
    pub projected_noi: Money,
    pub cap_rate: Rate,
    pub cash_on_cash: Rate,
    /// The adjusted property record
    pub property: BacktestProperty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub status: BacktestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub period: BacktestPeriod,
    pub base: BaseMetrics,
    pub performance: PerformanceMetrics,
    pub scenarios: Vec<ScenarioBacktest>,
    pub insights: Insights,
    pub property: BacktestProperty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceRating {
    Strong,
    Good,
    Weak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPropertyResult {
    pub property_name: String,
    pub status: BacktestStatus,
    pub monthly_cash_flow: Money,
    pub occupancy_rate: Rate,
    pub rating: PerformanceRating,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioAggregate {
    pub total_monthly_cash_flow: Money,
    /// Mean over properties with transactions in their window
    pub average_occupancy_rate: Rate,
    pub portfolio_rating: PerformanceRating,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioBacktest {
    pub total_properties: usize,
    pub properties: Vec<PortfolioPropertyResult>,
    pub aggregate: PortfolioAggregate,
    pub insights: Vec<String>,
}

// ---------------------------------------------------------------------------
// Property record
// ---------------------------------------------------------------------------

/// Names accepted by [`BacktestProperty::with_override`].
pub const BACKTEST_FIELDS: &[&str] = &[
    "purchase_price",
    "gross_rent_annual",
    "vacancy_rate",
    "operating_expenses",
    "annual_mortgage_payment",
    "equity",
];

impl BacktestProperty {
    pub fn new(purchase_price: Money, gross_rent_annual: Money) -> Self {
        Self {
            property_name: None,
            purchase_price,
            gross_rent_annual,
            vacancy_rate: Decimal::ZERO,
            operating_expenses: Decimal::ZERO,
            annual_mortgage_payment: Decimal::ZERO,
            equity: Decimal::ZERO,
        }
    }

    fn validate(&self) -> RealtyResult<()> {
        let non_negative = [
            ("purchase_price", self.purchase_price),
            ("gross_rent_annual", self.gross_rent_annual),
            ("operating_expenses", self.operating_expenses),
            ("annual_mortgage_payment", self.annual_mortgage_payment),
            ("equity", self.equity),
        ];
        for (field, value) in non_negative {
            if value < Decimal::ZERO {
                return Err(RealtyError::invalid(field, "Must not be negative"));
            }
        }
        if self.vacancy_rate < Decimal::ZERO || self.vacancy_rate > Decimal::ONE {
            return Err(RealtyError::invalid(
                "vacancy_rate",
                "Vacancy rate must be between 0 and 1",
            ));
        }
        Ok(())
    }

    /// A copy with one field adjusted; `self` is left untouched.
    pub fn with_override(&self, field: &str, adjustment: &Adjustment) -> RealtyResult<Self> {
        let mut next = self.clone();
        let slot = match field {
            "purchase_price" => &mut next.purchase_price,
            "gross_rent_annual" => &mut next.gross_rent_annual,
            "vacancy_rate" => &mut next.vacancy_rate,
            "operating_expenses" => &mut next.operating_expenses,
            "annual_mortgage_payment" => &mut next.annual_mortgage_payment,
            "equity" => &mut next.equity,
            other => {
                return Err(RealtyError::invalid(
                    other,
                    format!(
                        "Unknown property field (expected one of: {})",
                        BACKTEST_FIELDS.join(", ")
                    ),
                ))
            }
        };
        *slot = adjustment.apply(*slot);
        Ok(next)
    }

    /// Apply every adjustment of a scenario to a copy of this record.
    pub fn with_scenario(&self, scenario: &Scenario) -> RealtyResult<Self> {
        let adjusted = scenario
            .parameters
            .iter()
            .try_fold(self.clone(), |property, (field, adjustment)| {
                property.with_override(field, adjustment)
            })
            .map_err(|e| match e {
                RealtyError::InvalidInput { field, reason } => RealtyError::InvalidInput {
                    field: format!("scenario:{} {field}", scenario.name),
                    reason,
                },
                other => other,
            })?;
        adjusted.validate()?;
        Ok(adjusted)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Replay historical transactions for one property over a date window.
///
/// An empty window is not an error: the result carries
/// [`BacktestStatus::NoTransactions`], zeroed aggregates and a single
/// "insufficient data" insight.
pub fn run_backtest(request: &BacktestRequest) -> RealtyResult<ComputationOutput<BacktestResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = backtest_property(request, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Historical cash-flow backtest with scenario rescaling",
        &serde_json::json!({
            "start_date": request.start_date,
            "end_date": request.end_date,
            "num_transactions": request.transactions.len(),
            "num_scenarios": request.scenarios.len(),
            "config": request.config,
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Backtest each property and aggregate cash flow, occupancy and ratings.
pub fn run_portfolio_backtest(
    requests: &[BacktestRequest],
) -> RealtyResult<ComputationOutput<PortfolioBacktest>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if requests.is_empty() {
        return Err(RealtyError::InsufficientData(
            "At least one property required for a portfolio backtest".into(),
        ));
    }
    tracing::debug!(count = requests.len(), "running portfolio backtest");

    let mut properties = Vec::with_capacity(requests.len());
    for (index, request) in requests.iter().enumerate() {
        let name = request
            .property
            .property_name
            .clone()
            .unwrap_or_else(|| format!("Property {}", index + 1));

        let mut property_warnings = Vec::new();
        let result = backtest_property(request, &mut property_warnings)?;
        warnings.extend(property_warnings.into_iter().map(|w| format!("{name}: {w}")));

        properties.push(PortfolioPropertyResult {
            rating: rate_performance(
                result.base.occupancy_rate,
                result.base.monthly_cash_flow,
                &request.config,
            ),
            property_name: name,
            status: result.status,
            monthly_cash_flow: result.base.monthly_cash_flow,
            occupancy_rate: result.base.occupancy_rate,
        });
    }

    let total_monthly_cash_flow: Money = properties.iter().map(|p| p.monthly_cash_flow).sum();
    let with_data: Vec<&PortfolioPropertyResult> = properties
        .iter()
        .filter(|p| p.status == BacktestStatus::Complete)
        .collect();
    let average_occupancy_rate = if with_data.is_empty() {
        Decimal::ZERO
    } else {
        (with_data.iter().map(|p| p.occupancy_rate).sum::<Decimal>()
            / Decimal::from(with_data.len()))
        .round_dp(4)
    };

    let portfolio_rating = rate_performance(
        average_occupancy_rate,
        total_monthly_cash_flow,
        &BacktestConfig::default(),
    );

    let mut insights = Vec::new();
    let missing = properties.len() - with_data.len();
    if missing > 0 {
        insights.push(format!(
            "{missing} of {} properties had no transactions in their window",
            properties.len()
        ));
    }
    let weak: Vec<&str> = properties
        .iter()
        .filter(|p| p.rating == PerformanceRating::Weak)
        .map(|p| p.property_name.as_str())
        .collect();
    if !weak.is_empty() {
        insights.push(format!("Weak performers: {}", weak.join(", ")));
    }
    if total_monthly_cash_flow > Decimal::ZERO {
        insights.push("Portfolio generated positive combined monthly cash flow".into());
    } else {
        insights.push("Portfolio combined monthly cash flow is not positive".into());
    }

    let output = PortfolioBacktest {
        total_properties: properties.len(),
        aggregate: PortfolioAggregate {
            total_monthly_cash_flow,
            average_occupancy_rate,
            portfolio_rating,
        },
        properties,
        insights,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio backtest aggregation",
        &serde_json::json!({ "num_properties": requests.len() }),
        warnings,
        elapsed,
        output,
    ))
}

/// Strong: positive cash flow with high occupancy. Good: positive cash flow.
/// Weak: anything else.
pub fn rate_performance(
    occupancy_rate: Rate,
    monthly_cash_flow: Money,
    config: &BacktestConfig,
) -> PerformanceRating {
    if monthly_cash_flow <= Decimal::ZERO {
        PerformanceRating::Weak
    } else if occupancy_rate > config.high_occupancy {
        PerformanceRating::Strong
    } else {
        PerformanceRating::Good
    }
}

// ---------------------------------------------------------------------------
// Core evaluation
// ---------------------------------------------------------------------------

fn backtest_property(
    request: &BacktestRequest,
    warnings: &mut Vec<String>,
) -> RealtyResult<BacktestResult> {
    if request.start_date > request.end_date {
        return Err(RealtyError::invalid(
            "start_date",
            format!(
                "Start date {} is after end date {}",
                request.start_date, request.end_date
            ),
        ));
    }
    request.property.validate()?;

    let period = BacktestPeriod {
        start_date: request.start_date,
        end_date: request.end_date,
        duration_days: (request.end_date - request.start_date).num_days(),
    };

    // Scenario parameters are checked even when there is nothing to replay.
    let adjusted: Vec<BacktestProperty> = request
        .scenarios
        .iter()
        .map(|s| request.property.with_scenario(s))
        .collect::<RealtyResult<_>>()?;

    let window = filter_window(&request.transactions, request.start_date, request.end_date);
    tracing::debug!(
        in_window = window.len(),
        total = request.transactions.len(),
        "filtered backtest transactions"
    );

    if window.is_empty() {
        tracing::warn!(
            start = %request.start_date,
            end = %request.end_date,
            "no transactions in backtest window"
        );
        if !request.scenarios.is_empty() {
            warnings.push(format!(
                "{} scenario(s) skipped: no transactions to replay",
                request.scenarios.len()
            ));
        }
        return Ok(BacktestResult {
            status: BacktestStatus::NoTransactions,
            message: Some("No transactions found for the specified period".into()),
            period,
            base: BaseMetrics::default(),
            performance: PerformanceMetrics::default(),
            scenarios: Vec::new(),
            insights: Insights::insufficient_data(),
            property: request.property.clone(),
        });
    }

    let base = base_metrics(&window, request.property.gross_rent_annual);
    let performance = performance_metrics(&window, request.config.risk_free_rate_annual);

    if request.property.gross_rent_annual.is_zero() {
        warnings.push("Expected rent is zero: occupancy reported as 0".into());
    }
    if base.period_months.is_zero() {
        warnings.push("All transactions share one date: monthly averages reported as 0".into());
    }

    let scenarios: Vec<ScenarioBacktest> = request
        .scenarios
        .iter()
        .zip(adjusted)
        .map(|(scenario, property)| {
            scenario_backtest(scenario, &request.property, property, &base)
        })
        .collect();

    let base = base.rounded();
    let performance = performance.rounded();
    let insights = generate_insights(&base, &performance, &scenarios, &request.config);

    Ok(BacktestResult {
        status: BacktestStatus::Complete,
        message: None,
        period,
        base,
        performance,
        scenarios,
        insights,
        property: request.property.clone(),
    })
}

fn scenario_backtest(
    scenario: &Scenario,
    original: &BacktestProperty,
    adjusted: BacktestProperty,
    base: &BaseMetrics,
) -> ScenarioBacktest {
    let income_factor = ratio_or_one(adjusted.gross_rent_annual, original.gross_rent_annual)
        * ratio_or_one(
            Decimal::ONE - adjusted.vacancy_rate,
            Decimal::ONE - original.vacancy_rate,
        );
    let expense_factor = ratio_or_one(adjusted.operating_expenses, original.operating_expenses);

    let metrics_under_scenario = base
        .rescaled(income_factor, expense_factor, adjusted.gross_rent_annual)
        .rounded();

    let egi = metrics::effective_gross_income(adjusted.gross_rent_annual, adjusted.vacancy_rate);
    let projected_noi = metrics::net_operating_income(egi, adjusted.operating_expenses);
    let cash_flow = metrics::pre_tax_cash_flow(projected_noi, adjusted.annual_mortgage_payment);

    ScenarioBacktest {
        name: scenario.name.clone(),
        probability: scenario.probability,
        income_factor,
        expense_factor,
        metrics: metrics_under_scenario,
        projected_noi,
        cap_rate: metrics::cap_rate(projected_noi, adjusted.purchase_price),
        cash_on_cash: metrics::cash_on_cash_return(cash_flow, adjusted.equity),
        property: adjusted,
    }
}

fn ratio_or_one(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ONE
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::transactions::TransactionKind;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_property() -> BacktestProperty {
        BacktestProperty {
            property_name: Some("Duplex".into()),
            vacancy_rate: dec!(0.05),
            operating_expenses: dec!(15000),
            annual_mortgage_payment: dec!(30000),
            equity: dec!(100000),
            ..BacktestProperty::new(dec!(500000), dec!(60000))
        }
    }

    /// Rent of 5000 and expenses of 3750 on the 1st of each month of 2024.
    fn monthly_transactions(months: u32) -> Vec<Transaction> {
        (1..=months)
            .flat_map(|m| {
                [
                    Transaction {
                        date: date(2024, m, 1),
                        kind: TransactionKind::Rent,
                        amount: dec!(5000),
                        category: Some("income".into()),
                        description: None,
                    },
                    Transaction {
                        date: date(2024, m, 1),
                        kind: TransactionKind::Expense,
                        amount: dec!(-3750),
                        category: Some("operating".into()),
                        description: None,
                    },
                ]
            })
            .collect()
    }

    fn request(scenarios: Vec<Scenario>) -> BacktestRequest {
        BacktestRequest {
            property: sample_property(),
            transactions: monthly_transactions(6),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
            scenarios,
            config: BacktestConfig::default(),
        }
    }

    fn scenario(name: &str, params: &[(&str, Adjustment)]) -> Scenario {
        Scenario {
            name: name.into(),
            probability: None,
            parameters: params
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_complete_backtest() {
        let result = run_backtest(&request(vec![])).unwrap();
        let out = &result.result;

        assert_eq!(out.status, BacktestStatus::Complete);
        assert_eq!(out.base.total_income, dec!(30000));
        assert_eq!(out.base.total_expenses, dec!(22500));
        assert_eq!(out.base.net_cash_flow, dec!(7500));
        assert_eq!(out.base.transaction_count, 12);
        assert_eq!(out.performance.months_analyzed, 6);
        assert_eq!(out.performance.average_monthly_return, dec!(1250));
        assert_eq!(out.performance.return_volatility, Decimal::ZERO);
        assert_eq!(out.performance.sharpe_ratio, Decimal::ZERO);
        assert_eq!(out.period.duration_days, 365);
    }

    #[test]
    fn test_empty_window_is_marked_not_error() {
        let mut req = request(vec![scenario(
            "Up",
            &[("gross_rent_annual", Adjustment::Scale(dec!(0.1)))],
        )]);
        req.start_date = date(2025, 1, 1);
        req.end_date = date(2025, 12, 31);

        let result = run_backtest(&req).unwrap();
        let out = &result.result;
        assert_eq!(out.status, BacktestStatus::NoTransactions);
        assert!(out.message.as_deref().unwrap().contains("No transactions found"));
        assert_eq!(out.base, BaseMetrics::default());
        assert_eq!(out.performance, PerformanceMetrics::default());
        assert!(out.scenarios.is_empty());
        assert_eq!(out.insights, Insights::insufficient_data());
        assert!(result.warnings.iter().any(|w| w.contains("skipped")));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let mut req = request(vec![]);
        req.start_date = date(2024, 12, 31);
        req.end_date = date(2024, 1, 1);
        assert!(matches!(
            run_backtest(&req),
            Err(RealtyError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_scenarios_rescale_history_without_mutating_property() {
        let req = request(vec![
            scenario("Optimistic", &[("gross_rent_annual", Adjustment::Scale(dec!(0.10)))]),
            scenario("Pessimistic", &[("gross_rent_annual", Adjustment::Scale(dec!(-0.10)))]),
            scenario("Leaner", &[("operating_expenses", Adjustment::Set(dec!(7500)))]),
        ]);
        let snapshot = req.property.clone();
        let result = run_backtest(&req).unwrap();
        let out = &result.result;

        assert_eq!(req.property, snapshot);
        assert_eq!(out.property, snapshot);

        let optimistic = &out.scenarios[0];
        assert_eq!(optimistic.income_factor, dec!(1.1));
        assert_eq!(optimistic.expense_factor, Decimal::ONE);
        assert_eq!(optimistic.metrics.total_income, dec!(33000));
        assert_eq!(optimistic.metrics.total_expenses, dec!(22500));
        assert_eq!(optimistic.property.gross_rent_annual, dec!(66000));
        // 66000 * 0.95 - 15000
        assert_eq!(optimistic.projected_noi, dec!(47700));

        let leaner = &out.scenarios[2];
        assert_eq!(leaner.expense_factor, dec!(0.5));
        assert_eq!(leaner.metrics.total_expenses, dec!(11250));

        assert_eq!(out.insights.opportunities, vec!["Best performing scenario: Leaner"]);
        assert!(out
            .insights
            .risks
            .contains(&"Worst performing scenario: Pessimistic".to_string()));
    }

    #[test]
    fn test_vacancy_scenario_factor() {
        let req = request(vec![scenario("Full", &[("vacancy_rate", Adjustment::Set(dec!(0)))])]);
        let result = run_backtest(&req).unwrap();
        // (1 - 0) / (1 - 0.05)
        assert_eq!(result.result.scenarios[0].income_factor, Decimal::ONE / dec!(0.95));
    }

    #[test]
    fn test_unknown_scenario_field_rejected() {
        let req = request(vec![scenario("Odd", &[("hold_years", Adjustment::Set(dec!(3)))])]);
        let err = run_backtest(&req).unwrap_err();
        assert!(matches!(err, RealtyError::InvalidInput { ref field, .. } if field.contains("Odd")));
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: BacktestConfig =
            serde_json::from_value(serde_json::json!({ "volatility_alert": "500" })).unwrap();
        assert_eq!(config.volatility_alert, dec!(500));
        assert_eq!(config.risk_free_rate_annual, dec!(0.02));
        assert_eq!(config.drawdown_alert, dec!(-10000));
    }

    #[test]
    fn test_rating_rules() {
        let config = BacktestConfig::default();
        assert_eq!(rate_performance(dec!(0.95), dec!(100), &config), PerformanceRating::Strong);
        assert_eq!(rate_performance(dec!(0.85), dec!(100), &config), PerformanceRating::Good);
        assert_eq!(rate_performance(dec!(0.95), dec!(0), &config), PerformanceRating::Weak);
    }

    #[test]
    fn test_portfolio_aggregation() {
        let first = request(vec![]);
        let mut empty = request(vec![]);
        empty.property.property_name = Some("Vacant lot".into());
        empty.transactions.clear();

        let result = run_portfolio_backtest(&[first.clone(), empty]).unwrap();
        let out = &result.result;
        let single = run_backtest(&first).unwrap().result;

        assert_eq!(out.total_properties, 2);
        assert_eq!(out.properties[1].status, BacktestStatus::NoTransactions);
        assert_eq!(out.properties[1].rating, PerformanceRating::Weak);
        assert_eq!(out.aggregate.total_monthly_cash_flow, single.base.monthly_cash_flow);
        // Only the property with data counts toward average occupancy.
        assert_eq!(out.aggregate.average_occupancy_rate, single.base.occupancy_rate);
        assert!(out.insights.iter().any(|i| i.contains("1 of 2")));
    }

    #[test]
    fn test_portfolio_requires_properties() {
        assert!(run_portfolio_backtest(&[]).is_err());
    }
}
