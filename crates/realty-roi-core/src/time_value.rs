use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::RealtyError;
use crate::types::{Money, Rate};
use crate::RealtyResult;

/// Newton stops once successive estimates differ by less than this.
const STEP_TOLERANCE: Decimal = dec!(0.000001);
/// Below this |dNPV/dr| the Newton step is abandoned.
const DERIVATIVE_FLOOR: Decimal = dec!(0.0000000001);
const MAX_IRR_ITERATIONS: u32 = 100;
pub const DEFAULT_IRR_GUESS: Rate = dec!(0.10);

const BRACKET_FLOOR: Rate = dec!(-0.99);
const BRACKET_CEILING: Rate = dec!(10);
const BRACKET_STEP: Rate = dec!(0.01);
const MIN_POSITIVE_RATE: Rate = dec!(0.000001);
const BISECTION_TOLERANCE: Decimal = dec!(0.0000000001);
const MAX_BISECTION_ITERATIONS: u32 = 200;

/// Net Present Value of a series of cash flows.
///
/// `cash_flows[0]` is at time zero and is not discounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> RealtyResult<Money> {
    if rate <= dec!(-1) {
        return Err(RealtyError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    discounted_sum(rate, cash_flows).ok_or_else(|| RealtyError::NumericOverflow {
        context: format!("NPV at rate {rate}"),
    })
}

/// Internal Rate of Return with a defined answer or none at all.
///
/// Conventional series (one sign change) are solved by Newton-Raphson from
/// 10%, falling back to a bracketed bisection over (-99%, 1000%] when Newton
/// fails. Series with several sign changes may have several roots; the
/// smallest strictly positive root is returned. `None` means unavailable.
pub fn irr(cash_flows: &[Money]) -> Option<Rate> {
    match sign_changes(cash_flows) {
        0 => None,
        1 => solve_irr_newton(cash_flows, DEFAULT_IRR_GUESS)
            .ok()
            .or_else(|| first_root_in(cash_flows, BRACKET_FLOOR, BRACKET_CEILING)),
        _ => smallest_positive_root(cash_flows),
    }
}

/// Newton-Raphson IRR on the analytic NPV derivative.
///
/// Returns `ConvergenceFailure` when the derivative vanishes, the estimate
/// leaves the (-100%, inf) domain, or the iteration budget runs out. The last
/// estimate is never returned in those cases.
pub fn solve_irr_newton(cash_flows: &[Money], guess: Rate) -> RealtyResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(RealtyError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let mut rate = guess;
    let mut last_step = Decimal::ZERO;

    for i in 0..MAX_IRR_ITERATIONS {
        if rate <= dec!(-1) {
            return Err(RealtyError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: last_step,
            });
        }

        let (value, slope) =
            npv_and_derivative(cash_flows, rate).ok_or_else(|| RealtyError::NumericOverflow {
                context: format!("IRR iteration {i} at rate {rate}"),
            })?;

        if slope.abs() < DERIVATIVE_FLOOR {
            return Err(RealtyError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: value,
            });
        }

        let step = value
            .checked_div(slope)
            .ok_or_else(|| RealtyError::NumericOverflow {
                context: format!("IRR Newton step at rate {rate}"),
            })?;
        let next = rate
            .checked_sub(step)
            .ok_or_else(|| RealtyError::NumericOverflow {
                context: format!("IRR Newton step at rate {rate}"),
            })?;

        if (next - rate).abs() < STEP_TOLERANCE {
            return Ok(next);
        }

        last_step = step;
        rate = next;
    }

    Err(RealtyError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: last_step,
    })
}

/// Number of sign changes in the series, ignoring zero flows.
pub fn sign_changes(cash_flows: &[Money]) -> usize {
    let mut changes = 0;
    let mut previous: Option<bool> = None;
    for cf in cash_flows.iter().filter(|cf| !cf.is_zero()) {
        let negative = cf.is_sign_negative();
        if let Some(prev) = previous {
            if prev != negative {
                changes += 1;
            }
        }
        previous = Some(negative);
    }
    changes
}

/// Smallest strictly positive rate at which NPV is zero, if any lies at or
/// below 1000%.
///
/// Roots are located by scanning a 1% grid for sign changes, so two roots
/// closer than one grid step (or a root where NPV touches zero without
/// crossing) can be missed. The next bracketed root, or `None`, is returned
/// in that case.
pub fn smallest_positive_root(cash_flows: &[Money]) -> Option<Rate> {
    first_root_in(cash_flows, MIN_POSITIVE_RATE, BRACKET_CEILING)
}

/// Scan `[lo, hi]` on a fixed grid and bisect the first bracketed sign change.
fn first_root_in(cash_flows: &[Money], lo: Rate, hi: Rate) -> Option<Rate> {
    let mut previous: Option<(Rate, Decimal)> = None;
    let mut rate = lo;

    loop {
        let point = rate.min(hi);
        match discounted_sum(point, cash_flows) {
            Some(value) if value.is_zero() => return Some(point),
            Some(value) => {
                if let Some((prev_rate, prev_value)) = previous {
                    if prev_value.is_sign_negative() != value.is_sign_negative() {
                        return bisect(cash_flows, prev_rate, point, prev_value);
                    }
                }
                previous = Some((point, value));
            }
            None => previous = None,
        }

        if point >= hi {
            return None;
        }
        rate += BRACKET_STEP;
    }
}

fn bisect(cash_flows: &[Money], mut lo: Rate, mut hi: Rate, mut f_lo: Decimal) -> Option<Rate> {
    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let f_mid = discounted_sum(mid, cash_flows)?;
        if f_mid.is_zero() || (hi - lo) < BISECTION_TOLERANCE {
            return Some(mid);
        }
        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Some((lo + hi) / dec!(2))
}

/// Sum of CF_t / (1+r)^t, `None` on overflow or a vanishing discount factor.
fn discounted_sum(rate: Rate, cash_flows: &[Money]) -> Option<Decimal> {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut total = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        total = total.checked_add(cf.checked_div(discount)?)?;
    }

    Some(total)
}

/// NPV(r) and d(NPV)/dr = sum -t * CF_t / (1+r)^(t+1).
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        let pv = cf.checked_div(discount)?;
        npv = npv.checked_add(pv)?;
        if t > 0 {
            let term = Decimal::from(t as u64)
                .checked_mul(pv)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(term)?;
        }
    }

    Some((npv, dnpv))
}
