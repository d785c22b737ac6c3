use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyError;
use crate::roi::cash_flows::{build_cash_flows, CashFlowParams};
use crate::roi::inputs::{LocalMarketReference, PropertyFinancials, RoiInput};
use crate::roi::interpret::interpret;
use crate::roi::metrics::{self, DSCR_UNCONSTRAINED};
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::RealtyResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Full return analysis for one property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiResult {
    pub egi: Money,
    pub noi: Money,
    pub cap_rate: Rate,
    pub gross_yield: Rate,
    pub pre_tax_cash_flow: Money,
    pub cash_on_cash: Rate,
    /// `DSCR_UNCONSTRAINED` when there is no debt service
    pub dscr: Multiple,
    pub npv: Money,
    /// `None` when no rate could be established for the series
    pub irr: Option<Rate>,
    pub cash_flows: Vec<Money>,
    pub terminal_value: Money,
    pub projected_value: Money,
    pub total_cash_flow: Money,
    pub total_return: Rate,
    pub annualized_return: Rate,
    /// Cap rate, cash-on-cash and DSCR findings, in that order
    pub explanation: Vec<String>,
    pub financials: PropertyFinancials,
    pub inputs: RoiInput,
    pub computed_at: DateTime<Utc>,
}

/// One entry in a property ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedProperty {
    /// 1-based rank
    pub rank: usize,
    /// Position in the caller's list
    pub input_index: usize,
    pub property_name: String,
    pub cash_on_cash: Rate,
    pub cap_rate: Rate,
    pub npv: Money,
    pub irr: Option<Rate>,
    pub roi: RoiResult,
}

/// Properties ranked by cash-on-cash return, best first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyComparison {
    pub ranked: Vec<RankedProperty>,
    pub best: Option<RankedProperty>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute every ROI metric for one property against local market bands.
///
/// Structural problems (negative prices, `hold_years == 0`, ...) are rejected
/// with `InvalidInput`; numeric degeneracies (zero price, no debt, IRR with no
/// defined root) are encoded in the result and reported as warnings.
pub fn compute_roi(
    input: &RoiInput,
    refs: &LocalMarketReference,
) -> RealtyResult<ComputationOutput<RoiResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = evaluate(input, refs, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Real Estate ROI (income, leverage and DCF metrics)",
        &serde_json::json!({ "inputs": input, "local_market": refs }),
        warnings,
        elapsed,
        result,
    ))
}

/// Compute ROI for each property and rank by cash-on-cash return, descending.
///
/// Ties keep the caller's order.
pub fn compare_properties(
    properties: &[RoiInput],
    refs: &LocalMarketReference,
) -> RealtyResult<ComputationOutput<PropertyComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    tracing::debug!(count = properties.len(), "comparing properties");

    let mut entries = Vec::with_capacity(properties.len());
    for (index, property) in properties.iter().enumerate() {
        let name = property
            .property_name
            .clone()
            .unwrap_or_else(|| format!("Property {}", index + 1));

        let mut property_warnings = Vec::new();
        let roi = evaluate(property, refs, &mut property_warnings)?;
        warnings.extend(property_warnings.into_iter().map(|w| format!("{name}: {w}")));

        entries.push(RankedProperty {
            rank: 0,
            input_index: index,
            property_name: name,
            cash_on_cash: roi.cash_on_cash,
            cap_rate: roi.cap_rate,
            npv: roi.npv,
            irr: roi.irr,
            roi,
        });
    }

    // Vec::sort_by is stable, so equal cash-on-cash keeps input order.
    entries.sort_by(|a, b| b.cash_on_cash.cmp(&a.cash_on_cash));
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    if entries.is_empty() {
        warnings.push("No properties supplied for comparison".into());
    }

    let output = PropertyComparison {
        best: entries.first().cloned(),
        ranked: entries,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Property comparison ranked by cash-on-cash return",
        &serde_json::json!({
            "num_properties": properties.len(),
            "ranking_metric": "cash_on_cash",
            "local_market": refs,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Core evaluation
// ---------------------------------------------------------------------------

/// MetricPrimitives -> CashFlowBuilder -> DiscountedValuation -> Interpreter.
pub(crate) fn evaluate(
    input: &RoiInput,
    refs: &LocalMarketReference,
    warnings: &mut Vec<String>,
) -> RealtyResult<RoiResult> {
    let fin = input.normalize(refs)?;

    let egi = metrics::effective_gross_income(fin.gross_rent_annual, fin.vacancy_rate);
    let noi = metrics::net_operating_income(egi, fin.operating_expenses);
    let cap_rate = metrics::cap_rate(noi, fin.purchase_price);
    let gross_yield = metrics::gross_yield(fin.gross_rent_annual, fin.purchase_price);
    let pre_tax_cash_flow = metrics::pre_tax_cash_flow(noi, fin.annual_mortgage_payment);
    let cash_on_cash = metrics::cash_on_cash_return(pre_tax_cash_flow, fin.equity);
    let dscr = metrics::debt_service_coverage_ratio(noi, fin.annual_mortgage_payment);

    let series = build_cash_flows(&CashFlowParams {
        equity: fin.equity,
        renovation_cost: fin.renovation_cost,
        pre_tax_cash_flow,
        noi,
        hold_years: fin.hold_years,
        terminal_cap_rate: refs.terminal_cap_rate(),
    })?;

    let npv = time_value::npv(fin.discount_rate, series.as_slice())?;
    let irr = time_value::irr(series.as_slice());

    let projected_value =
        metrics::appreciated_value(fin.purchase_price, fin.annual_appreciation, fin.hold_years)?;
    let total_cash_flow = pre_tax_cash_flow
        .checked_mul(Decimal::from(fin.hold_years))
        .ok_or_else(|| RealtyError::NumericOverflow {
            context: "total cash flow".into(),
        })?;
    let total_return = metrics::total_return(fin.equity, projected_value, total_cash_flow)?;
    let annualized_return = match metrics::annualized_return(total_return, fin.hold_years) {
        Some(rate) => rate,
        None => {
            tracing::warn!(%total_return, hold_years = fin.hold_years, "annualized return unavailable");
            warnings.push(format!(
                "Annualized return unavailable for a total return of {total_return:.4}: reported as 0"
            ));
            Decimal::ZERO
        }
    };

    let defined_coc = (!fin.equity.is_zero()).then_some(cash_on_cash);
    let explanation = interpret(cap_rate, defined_coc, dscr, refs);

    collect_warnings(&fin, refs, noi, dscr, irr, warnings);

    Ok(RoiResult {
        egi,
        noi,
        cap_rate,
        gross_yield,
        pre_tax_cash_flow,
        cash_on_cash,
        dscr,
        npv,
        irr,
        cash_flows: series.flows,
        terminal_value: series.terminal_value,
        projected_value,
        total_cash_flow,
        total_return,
        annualized_return,
        explanation,
        financials: fin,
        inputs: input.clone(),
        computed_at: Utc::now(),
    })
}

fn collect_warnings(
    fin: &PropertyFinancials,
    refs: &LocalMarketReference,
    noi: Money,
    dscr: Multiple,
    irr: Option<Rate>,
    warnings: &mut Vec<String>,
) {
    if fin.purchase_price.is_zero() {
        warnings.push("Purchase price is zero: cap rate and gross yield reported as 0".into());
    }
    if fin.equity.is_zero() {
        warnings.push("Equity is zero: cash-on-cash and total return reported as 0".into());
    }
    if noi < Decimal::ZERO {
        warnings.push(format!("NOI is negative ({noi:.2}): operating expenses exceed income"));
    }
    if dscr != DSCR_UNCONSTRAINED && dscr < Decimal::ONE {
        warnings.push(format!(
            "DSCR of {dscr:.2} is below 1.00x: NOI does not cover debt service"
        ));
    }
    if fin.vacancy_rate > dec!(0.15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15%: above typical market norms",
            fin.vacancy_rate * dec!(100)
        ));
    }
    if refs.terminal_cap_rate() <= Decimal::ZERO {
        warnings.push("Terminal cap rate is not positive: terminal value set to 0".into());
    }
    if irr.is_none() {
        tracing::warn!(hold_years = fin.hold_years, "IRR unavailable for cash-flow series");
        warnings.push("IRR unavailable: no defined rate for this cash-flow series".into());
    }
}
