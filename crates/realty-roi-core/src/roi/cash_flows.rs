use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RealtyError;
use crate::types::{Money, Rate};
use crate::RealtyResult;

/// Longest holding period a series is built for.
pub const MAX_HOLD_YEARS: u32 = 100;

/// Parameters for a holding-period cash-flow series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowParams {
    pub equity: Money,
    pub renovation_cost: Money,
    /// Flat periodic flow for years 1..=hold_years
    pub pre_tax_cash_flow: Money,
    /// NOI capitalised into the terminal value
    pub noi: Money,
    pub hold_years: u32,
    /// Exit cap rate; a non-positive rate yields no terminal value
    pub terminal_cap_rate: Rate,
}

/// Annual equity cash flows over a holding period.
///
/// `flows[0]` is the initial outlay (negative), `flows[1..]` the periodic
/// pre-tax cash flows, with the terminal value added into the last entry.
/// `flows.len() == hold_years + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSeries {
    pub flows: Vec<Money>,
    pub terminal_value: Money,
}

impl CashFlowSeries {
    pub fn as_slice(&self) -> &[Money] {
        &self.flows
    }

    pub fn initial_outlay(&self) -> Money {
        self.flows.first().copied().unwrap_or_default()
    }

    /// Number of forward periods.
    pub fn periods(&self) -> usize {
        self.flows.len().saturating_sub(1)
    }
}

/// NOI / exit cap rate, or 0 when the cap rate is not positive.
pub fn terminal_value(noi: Money, terminal_cap_rate: Rate) -> RealtyResult<Money> {
    if terminal_cap_rate <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    noi.checked_div(terminal_cap_rate)
        .ok_or_else(|| RealtyError::NumericOverflow {
            context: format!("terminal value at cap rate {terminal_cap_rate}"),
        })
}

/// Build the flat holding-period series with the terminal value injected into
/// the final year.
pub fn build_cash_flows(params: &CashFlowParams) -> RealtyResult<CashFlowSeries> {
    if params.hold_years < 1 || params.hold_years > MAX_HOLD_YEARS {
        return Err(RealtyError::InvalidInput {
            field: "hold_years".into(),
            reason: format!(
                "A cash-flow series needs between 1 and {MAX_HOLD_YEARS} forward periods"
            ),
        });
    }
    let overflow = || RealtyError::NumericOverflow {
        context: "cash-flow series".into(),
    };

    let n = params.hold_years as usize;
    let outlay = params
        .equity
        .checked_add(params.renovation_cost)
        .ok_or_else(overflow)?;
    let mut flows = Vec::with_capacity(n + 1);
    flows.push(-outlay);
    flows.extend(std::iter::repeat(params.pre_tax_cash_flow).take(n));

    let terminal = terminal_value(params.noi, params.terminal_cap_rate)?;
    flows[n] = flows[n].checked_add(terminal).ok_or_else(overflow)?;

    Ok(CashFlowSeries {
        flows,
        terminal_value: terminal,
    })
}
