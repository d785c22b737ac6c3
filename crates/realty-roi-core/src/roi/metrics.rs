//! Stateless single-period return metrics.
//!
//! Each single-period formula is total on its domain: zero denominators
//! produce a documented value (0, or [`DSCR_UNCONSTRAINED`]) instead of an
//! error. Multi-year compounding reports overflow as `NumericOverflow`.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::RealtyError;
use crate::types::{Money, Multiple, Rate};
use crate::RealtyResult;

/// DSCR reported when there is no debt service: coverage is unconstrained.
///
/// Decimal has no infinity, so the largest representable value stands in for
/// it. Every finite lender minimum compares below it.
pub const DSCR_UNCONSTRAINED: Multiple = Decimal::MAX;

/// EGI = gross rent * (1 - vacancy rate)
pub fn effective_gross_income(gross_rent_annual: Money, vacancy_rate: Rate) -> Money {
    gross_rent_annual * (Decimal::ONE - vacancy_rate)
}

/// NOI = EGI - operating expenses
pub fn net_operating_income(egi: Money, operating_expenses: Money) -> Money {
    egi - operating_expenses
}

/// NOI / purchase price; 0 when the price is 0.
pub fn cap_rate(noi: Money, purchase_price: Money) -> Rate {
    if purchase_price.is_zero() {
        return Decimal::ZERO;
    }
    noi / purchase_price
}

/// Gross rent / purchase price; 0 when the price is 0.
pub fn gross_yield(gross_rent_annual: Money, purchase_price: Money) -> Rate {
    if purchase_price.is_zero() {
        return Decimal::ZERO;
    }
    gross_rent_annual / purchase_price
}

/// NOI - annual debt service
pub fn pre_tax_cash_flow(noi: Money, annual_mortgage_payment: Money) -> Money {
    noi - annual_mortgage_payment
}

/// Pre-tax cash flow / equity; 0 when equity is 0.
pub fn cash_on_cash_return(pre_tax_cash_flow: Money, equity: Money) -> Rate {
    if equity.is_zero() {
        return Decimal::ZERO;
    }
    pre_tax_cash_flow / equity
}

/// NOI / annual debt service; [`DSCR_UNCONSTRAINED`] when there is no debt.
pub fn debt_service_coverage_ratio(noi: Money, annual_mortgage_payment: Money) -> Multiple {
    if annual_mortgage_payment.is_zero() {
        return DSCR_UNCONSTRAINED;
    }
    noi / annual_mortgage_payment
}

/// Standard fixed-rate mortgage payment: P * r(1+r)^n / ((1+r)^n - 1).
///
/// A zero rate amortises the principal linearly over `years * 12` payments.
pub fn monthly_mortgage_payment(
    loan_amount: Money,
    annual_rate: Rate,
    years: u32,
) -> RealtyResult<Money> {
    if years == 0 {
        return Err(RealtyError::InvalidInput {
            field: "loan_term_years".into(),
            reason: "Loan term must be at least 1 year".into(),
        });
    }

    let total_months = years * 12;
    let monthly_rate = annual_rate / dec!(12);

    if monthly_rate.is_zero() {
        return Ok(loan_amount / Decimal::from(total_months));
    }

    let compound = (Decimal::ONE + monthly_rate)
        .checked_powu(u64::from(total_months))
        .ok_or_else(|| RealtyError::NumericOverflow {
            context: "mortgage compounding factor".into(),
        })?;

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(RealtyError::DivisionByZero {
            context: "mortgage payment denominator".into(),
        });
    }

    Ok(loan_amount * monthly_rate * compound / denominator)
}

/// Twelve monthly payments collapsed to an annual debt-service figure.
pub fn annual_mortgage_payment(
    loan_amount: Money,
    annual_rate: Rate,
    years: u32,
) -> RealtyResult<Money> {
    Ok(monthly_mortgage_payment(loan_amount, annual_rate, years)? * dec!(12))
}

/// Value after compounding appreciation for `years`.
pub fn appreciated_value(
    current_value: Money,
    annual_appreciation: Rate,
    years: u32,
) -> RealtyResult<Money> {
    (Decimal::ONE + annual_appreciation)
        .checked_powu(u64::from(years))
        .and_then(|growth| current_value.checked_mul(growth))
        .ok_or_else(|| RealtyError::NumericOverflow {
            context: format!("appreciation at {annual_appreciation} over {years} years"),
        })
}

/// (final value + cumulative cash flow - initial investment) / initial investment;
/// 0 when nothing was invested.
pub fn total_return(
    initial_investment: Money,
    final_value: Money,
    total_cash_flow: Money,
) -> RealtyResult<Rate> {
    if initial_investment.is_zero() {
        return Ok(Decimal::ZERO);
    }
    final_value
        .checked_add(total_cash_flow)
        .and_then(|v| v.checked_sub(initial_investment))
        .and_then(|gain| gain.checked_div(initial_investment))
        .ok_or_else(|| RealtyError::NumericOverflow {
            context: "total return".into(),
        })
}

/// (1 + total_return)^(1/years) - 1.
///
/// 0 for a zero-year horizon; -1 when the total return wiped out the capital.
/// `None` when the root cannot be evaluated in decimal precision.
pub fn annualized_return(total_return: Rate, years: u32) -> Option<Rate> {
    if years == 0 {
        return Some(Decimal::ZERO);
    }
    let growth = Decimal::ONE.checked_add(total_return)?;
    if growth <= Decimal::ZERO {
        return Some(dec!(-1));
    }
    let exponent = Decimal::ONE / Decimal::from(years);
    growth.checked_powd(exponent).map(|g| g - Decimal::ONE)
}
