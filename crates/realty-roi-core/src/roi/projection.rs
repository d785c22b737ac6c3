use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyError;
use crate::roi::cash_flows::terminal_value;
use crate::roi::inputs::{LocalMarketReference, RoiInput};
use crate::roi::metrics;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::RealtyResult;

/// Growth assumptions for a year-by-year projection.
///
/// Both rates default to 0, which reproduces the flat series used by
/// `compute_roi`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectionAssumptions {
    /// Annual growth of gross rent, applied from year 2 onwards
    #[serde(default)]
    pub rent_growth: Rate,
    /// Annual growth of operating expenses, applied from year 2 onwards
    #[serde(default)]
    pub expense_growth: Rate,
}

/// One projected holding year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionYear {
    pub year: u32,
    pub gross_rent: Money,
    pub operating_expenses: Money,
    pub noi: Money,
    pub pre_tax_cash_flow: Money,
    pub cumulative_cash_flow: Money,
    pub property_value: Money,
    /// Appreciated value less purchase price
    pub equity_gain: Money,
    /// Only on the final year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_value: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingPeriodProjection {
    pub years: Vec<ProjectionYear>,
    /// Equity series: outlay, yearly cash flows, terminal value in the last year
    pub cash_flows: Vec<Money>,
    pub npv: Money,
    pub irr: Option<Rate>,
}

/// Project the holding period year by year with explicit growth rates.
pub fn project_holding_period(
    input: &RoiInput,
    assumptions: &ProjectionAssumptions,
    refs: &LocalMarketReference,
) -> RealtyResult<ComputationOutput<HoldingPeriodProjection>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let fin = input.normalize(refs)?;
    tracing::debug!(hold_years = fin.hold_years, "projecting holding period");

    let rent_factor = Decimal::ONE + assumptions.rent_growth;
    let expense_factor = Decimal::ONE + assumptions.expense_growth;
    let exit_cap = refs.terminal_cap_rate();
    let overflow = |what: &str, year: u32| RealtyError::NumericOverflow {
        context: format!("projected {what} in year {year}"),
    };

    let mut years = Vec::with_capacity(fin.hold_years as usize);
    let mut cash_flows = Vec::with_capacity(fin.hold_years as usize + 1);
    let outlay = fin
        .equity
        .checked_add(fin.renovation_cost)
        .ok_or_else(|| overflow("initial outlay", 0))?;
    cash_flows.push(-outlay);
    let mut cumulative = Decimal::ZERO;

    for year in 1..=fin.hold_years {
        let elapsed = u64::from(year - 1);
        let gross_rent = grown(fin.gross_rent_annual, rent_factor, elapsed)
            .ok_or_else(|| overflow("gross rent", year))?;
        let operating_expenses = grown(fin.operating_expenses, expense_factor, elapsed)
            .ok_or_else(|| overflow("operating expenses", year))?;

        let egi = gross_rent
            .checked_mul(Decimal::ONE - fin.vacancy_rate)
            .ok_or_else(|| overflow("effective gross income", year))?;
        let noi = egi
            .checked_sub(operating_expenses)
            .ok_or_else(|| overflow("NOI", year))?;
        let pre_tax_cash_flow = noi
            .checked_sub(fin.annual_mortgage_payment)
            .ok_or_else(|| overflow("cash flow", year))?;
        cumulative = cumulative
            .checked_add(pre_tax_cash_flow)
            .ok_or_else(|| overflow("cumulative cash flow", year))?;

        let property_value =
            metrics::appreciated_value(fin.purchase_price, fin.annual_appreciation, year)?;

        let terminal = if year == fin.hold_years {
            Some(terminal_value(noi, exit_cap)?)
        } else {
            None
        };
        let flow = pre_tax_cash_flow
            .checked_add(terminal.unwrap_or_default())
            .ok_or_else(|| overflow("terminal cash flow", year))?;
        cash_flows.push(flow);

        if noi < Decimal::ZERO {
            warnings.push(format!("Year {year}: NOI is negative ({noi:.2})"));
        }

        years.push(ProjectionYear {
            year,
            gross_rent,
            operating_expenses,
            noi,
            pre_tax_cash_flow,
            cumulative_cash_flow: cumulative,
            property_value,
            equity_gain: property_value - fin.purchase_price,
            terminal_value: terminal,
        });
    }

    let npv = time_value::npv(fin.discount_rate, &cash_flows)?;
    let irr = time_value::irr(&cash_flows);
    if irr.is_none() {
        warnings.push("IRR unavailable: no defined rate for the projected series".into());
    }

    let output = HoldingPeriodProjection {
        years,
        cash_flows,
        npv,
        irr,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Holding-period projection with rent and expense growth",
        &serde_json::json!({
            "inputs": input,
            "assumptions": assumptions,
            "terminal_cap_rate": exit_cap.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// `base * factor^periods`, `None` on overflow.
fn grown(base: Money, factor: Decimal, periods: u64) -> Option<Money> {
    factor
        .checked_powu(periods)
        .and_then(|growth| base.checked_mul(growth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi::engine::compute_roi;
    use rust_decimal_macros::dec;

    fn sample_input() -> RoiInput {
        RoiInput {
            vacancy_rate: dec!(0.05),
            operating_expenses: dec!(15000),
            annual_mortgage_payment: Some(dec!(30000)),
            equity: Some(dec!(100000)),
            ..RoiInput::new(dec!(500000), dec!(60000))
        }
    }

    #[test]
    fn test_flat_projection_matches_base_series() {
        let refs = LocalMarketReference::default();
        let projection =
            project_holding_period(&sample_input(), &ProjectionAssumptions::default(), &refs)
                .unwrap();
        let roi = compute_roi(&sample_input(), &refs).unwrap();

        assert_eq!(projection.result.cash_flows, roi.result.cash_flows);
        assert_eq!(projection.result.npv, roi.result.npv);
        assert_eq!(projection.result.years.len(), 5);
        assert!(projection.result.years.iter().all(|y| y.noi == dec!(42000)));
    }

    #[test]
    fn test_cumulative_and_terminal_rows() {
        let projection = project_holding_period(
            &sample_input(),
            &ProjectionAssumptions::default(),
            &LocalMarketReference::default(),
        )
        .unwrap();
        let years = &projection.result.years;

        assert_eq!(years[0].cumulative_cash_flow, dec!(12000));
        assert_eq!(years[4].cumulative_cash_flow, dec!(60000));
        assert!(years[..4].iter().all(|y| y.terminal_value.is_none()));
        assert_eq!(years[4].terminal_value, Some(dec!(42000) / dec!(0.055)));
        assert_eq!(years[0].property_value, dec!(515000));
        assert_eq!(years[0].equity_gain, dec!(15000));
    }

    #[test]
    fn test_rent_growth_compounds_from_second_year() {
        let assumptions = ProjectionAssumptions {
            rent_growth: dec!(0.10),
            expense_growth: Decimal::ZERO,
        };
        let projection = project_holding_period(
            &sample_input(),
            &assumptions,
            &LocalMarketReference::default(),
        )
        .unwrap();
        let years = &projection.result.years;

        assert_eq!(years[0].gross_rent, dec!(60000));
        assert_eq!(years[1].gross_rent, dec!(66000));
        assert_eq!(years[2].gross_rent, dec!(72600));
        // 66000 * 0.95 - 15000
        assert_eq!(years[1].noi, dec!(47700));
    }

    #[test]
    fn test_expense_growth_reduces_noi() {
        let assumptions = ProjectionAssumptions {
            rent_growth: Decimal::ZERO,
            expense_growth: dec!(0.20),
        };
        let projection = project_holding_period(
            &sample_input(),
            &assumptions,
            &LocalMarketReference::default(),
        )
        .unwrap();
        let years = &projection.result.years;
        assert_eq!(years[1].operating_expenses, dec!(18000));
        assert!(years[4].noi < years[0].noi);
    }

    #[test]
    fn test_invalid_hold_years_rejected() {
        let mut input = sample_input();
        input.hold_years = 0;
        assert!(project_holding_period(
            &input,
            &ProjectionAssumptions::default(),
            &LocalMarketReference::default()
        )
        .is_err());
    }

    #[test]
    fn test_runaway_rent_growth_is_overflow_not_panic() {
        let mut input = sample_input();
        input.hold_years = 100;
        let assumptions = ProjectionAssumptions {
            rent_growth: dec!(0.8),
            expense_growth: Decimal::ZERO,
        };
        let err = project_holding_period(&input, &assumptions, &LocalMarketReference::default())
            .unwrap_err();
        assert!(matches!(err, RealtyError::NumericOverflow { .. }), "{err}");
    }

    #[test]
    fn test_runaway_appreciation_is_overflow_not_panic() {
        let mut input = sample_input();
        input.hold_years = 90;
        input.annual_appreciation = Decimal::ONE;
        let err = project_holding_period(
            &input,
            &ProjectionAssumptions::default(),
            &LocalMarketReference::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RealtyError::NumericOverflow { .. }), "{err}");
    }
}
