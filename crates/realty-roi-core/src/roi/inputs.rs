use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RealtyError;
use crate::roi::cash_flows::MAX_HOLD_YEARS;
use crate::roi::metrics;
use crate::types::{Adjustment, Money, Multiple, Rate};
use crate::RealtyResult;

// ---------------------------------------------------------------------------
// Defaults (declared once)
// ---------------------------------------------------------------------------

fn default_vacancy_rate() -> Rate {
    dec!(0.10)
}

fn default_loan_term_years() -> u32 {
    30
}

fn default_annual_appreciation() -> Rate {
    dec!(0.03)
}

fn default_hold_years() -> u32 {
    5
}

fn default_cap_low() -> Rate {
    dec!(0.03)
}

fn default_cap_high() -> Rate {
    dec!(0.08)
}

fn default_cash_on_cash_target() -> Rate {
    dec!(0.08)
}

fn default_dscr_minimum() -> Multiple {
    dec!(1.2)
}

fn default_discount_rate() -> Rate {
    dec!(0.10)
}

/// Share of purchase price assumed as equity when neither equity nor a down
/// payment is given.
const DEFAULT_EQUITY_SHARE: Rate = dec!(0.20);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Local market calibration bands used to interpret metrics and to pick the
/// exit cap rate for the terminal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalMarketReference {
    /// Low end of typical local cap rates
    #[serde(default = "default_cap_low")]
    pub cap_low: Rate,
    /// High end of typical local cap rates
    #[serde(default = "default_cap_high")]
    pub cap_high: Rate,
    /// Investor cash-on-cash target
    #[serde(default = "default_cash_on_cash_target", alias = "coc_target")]
    pub cash_on_cash_target: Rate,
    /// Typical lender DSCR minimum
    #[serde(default = "default_dscr_minimum", alias = "dscr_min")]
    pub dscr_minimum: Multiple,
    /// Discount rate used when the property input does not carry one
    #[serde(default = "default_discount_rate")]
    pub discount_rate: Rate,
}

impl Default for LocalMarketReference {
    fn default() -> Self {
        Self {
            cap_low: default_cap_low(),
            cap_high: default_cap_high(),
            cash_on_cash_target: default_cash_on_cash_target(),
            dscr_minimum: default_dscr_minimum(),
            discount_rate: default_discount_rate(),
        }
    }
}

impl LocalMarketReference {
    /// Exit cap rate: midpoint of the local band.
    pub fn terminal_cap_rate(&self) -> Rate {
        (self.cap_low + self.cap_high) / dec!(2)
    }
}

/// Caller-supplied property parameters for an ROI computation.
///
/// Only `purchase_price` and `gross_rent_annual` are required. Explicit values
/// always win over derived ones (see [`RoiInput::normalize`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoiInput {
    /// Label used in comparisons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    pub purchase_price: Money,
    pub gross_rent_annual: Money,
    #[serde(default = "default_vacancy_rate")]
    pub vacancy_rate: Rate,
    #[serde(default)]
    pub operating_expenses: Money,
    /// Explicit annual debt service; takes precedence over loan terms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_mortgage_payment: Option<Money>,
    /// Cash equity invested; falls back to down payment, then 20% of price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<Money>,
    /// Falls back to purchase price less down payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<Money>,
    /// Annual loan rate; when present, debt service is derived from loan terms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Rate>,
    #[serde(default = "default_loan_term_years")]
    pub loan_term_years: u32,
    #[serde(default = "default_annual_appreciation")]
    pub annual_appreciation: Rate,
    #[serde(default = "default_hold_years")]
    pub hold_years: u32,
    #[serde(default)]
    pub renovation_cost: Money,
    /// Falls back to the local market reference discount rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
}

impl RoiInput {
    /// Minimal input with every optional field at its default.
    pub fn new(purchase_price: Money, gross_rent_annual: Money) -> Self {
        Self {
            property_name: None,
            purchase_price,
            gross_rent_annual,
            vacancy_rate: default_vacancy_rate(),
            operating_expenses: Decimal::ZERO,
            annual_mortgage_payment: None,
            equity: None,
            down_payment: None,
            loan_amount: None,
            interest_rate: None,
            loan_term_years: default_loan_term_years(),
            annual_appreciation: default_annual_appreciation(),
            hold_years: default_hold_years(),
            renovation_cost: Decimal::ZERO,
            discount_rate: None,
        }
    }
}

/// Fully resolved property financials: every derived field filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFinancials {
    pub purchase_price: Money,
    pub gross_rent_annual: Money,
    pub vacancy_rate: Rate,
    pub operating_expenses: Money,
    pub annual_mortgage_payment: Money,
    pub equity: Money,
    pub loan_amount: Money,
    pub hold_years: u32,
    pub renovation_cost: Money,
    pub annual_appreciation: Rate,
    pub discount_rate: Rate,
}

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

impl RoiInput {
    /// Validate and resolve derived fields.
    ///
    /// Equity falls back to the down payment, then to 20% of the purchase
    /// price. Loan amount falls back to price less down payment. Debt service
    /// is derived from loan terms only when an interest rate is supplied and
    /// no explicit payment was given.
    pub fn normalize(&self, refs: &LocalMarketReference) -> RealtyResult<PropertyFinancials> {
        self.validate()?;

        let equity = self
            .equity
            .or(self.down_payment)
            .unwrap_or(self.purchase_price * DEFAULT_EQUITY_SHARE);

        let loan_amount = self
            .loan_amount
            .or_else(|| self.down_payment.map(|dp| self.purchase_price - dp))
            .unwrap_or(Decimal::ZERO);

        let annual_mortgage_payment = match (self.annual_mortgage_payment, self.interest_rate) {
            (Some(explicit), _) => explicit,
            (None, Some(rate)) if loan_amount > Decimal::ZERO => {
                metrics::annual_mortgage_payment(loan_amount, rate, self.loan_term_years)?
            }
            _ => Decimal::ZERO,
        };

        let discount_rate = self.discount_rate.unwrap_or(refs.discount_rate);
        if discount_rate <= dec!(-1) {
            return Err(RealtyError::invalid(
                "discount_rate",
                "Discount rate must be greater than -100%",
            ));
        }

        Ok(PropertyFinancials {
            purchase_price: self.purchase_price,
            gross_rent_annual: self.gross_rent_annual,
            vacancy_rate: self.vacancy_rate,
            operating_expenses: self.operating_expenses,
            annual_mortgage_payment,
            equity,
            loan_amount,
            hold_years: self.hold_years,
            renovation_cost: self.renovation_cost,
            annual_appreciation: self.annual_appreciation,
            discount_rate,
        })
    }

    fn validate(&self) -> RealtyResult<()> {
        if self.hold_years < 1 || self.hold_years > MAX_HOLD_YEARS {
            return Err(RealtyError::invalid(
                "hold_years",
                format!("Holding period must be between 1 and {MAX_HOLD_YEARS} years"),
            ));
        }

        let non_negative = [
            ("purchase_price", Some(self.purchase_price)),
            ("gross_rent_annual", Some(self.gross_rent_annual)),
            ("operating_expenses", Some(self.operating_expenses)),
            ("renovation_cost", Some(self.renovation_cost)),
            ("annual_mortgage_payment", self.annual_mortgage_payment),
            ("equity", self.equity),
            ("down_payment", self.down_payment),
            ("loan_amount", self.loan_amount),
            ("interest_rate", self.interest_rate),
        ];
        for (field, value) in non_negative {
            if let Some(v) = value {
                if v < Decimal::ZERO {
                    return Err(RealtyError::invalid(field, "Must not be negative"));
                }
            }
        }

        if self.vacancy_rate < Decimal::ZERO || self.vacancy_rate > Decimal::ONE {
            return Err(RealtyError::invalid(
                "vacancy_rate",
                "Vacancy rate must be between 0 and 1",
            ));
        }

        if let Some(dp) = self.down_payment {
            if dp > self.purchase_price {
                return Err(RealtyError::invalid(
                    "down_payment",
                    "Down payment cannot exceed purchase price",
                ));
            }
        }

        if self.interest_rate.is_some() && self.loan_term_years == 0 {
            return Err(RealtyError::invalid(
                "loan_term_years",
                "Loan term must be at least 1 year when an interest rate is given",
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Field overrides (sensitivity sweeps and scenarios)
// ---------------------------------------------------------------------------

/// Names accepted by [`RoiInput::with_override`].
pub const OVERRIDABLE_FIELDS: &[&str] = &[
    "purchase_price",
    "gross_rent_annual",
    "vacancy_rate",
    "operating_expenses",
    "annual_mortgage_payment",
    "equity",
    "down_payment",
    "loan_amount",
    "interest_rate",
    "loan_term_years",
    "annual_appreciation",
    "hold_years",
    "renovation_cost",
    "discount_rate",
];

impl RoiInput {
    /// A copy of `self` with one field replaced by `value`.
    pub fn with_value(
        &self,
        field: &str,
        value: Decimal,
        refs: &LocalMarketReference,
    ) -> RealtyResult<RoiInput> {
        self.with_override(field, &Adjustment::Set(value), refs)
    }

    /// A copy of `self` with one field adjusted; `self` is left untouched.
    ///
    /// Percentage adjustments of an unset optional field scale the value
    /// `normalize(refs)` would resolve for it (e.g. equity scales the derived
    /// equity, discount_rate scales the market discount rate).
    pub fn with_override(
        &self,
        field: &str,
        adjustment: &Adjustment,
        refs: &LocalMarketReference,
    ) -> RealtyResult<RoiInput> {
        let mut next = self.clone();
        match field {
            "purchase_price" => next.purchase_price = adjustment.apply(self.purchase_price),
            "gross_rent_annual" => next.gross_rent_annual = adjustment.apply(self.gross_rent_annual),
            "vacancy_rate" => next.vacancy_rate = adjustment.apply(self.vacancy_rate),
            "operating_expenses" => {
                next.operating_expenses = adjustment.apply(self.operating_expenses)
            }
            "renovation_cost" => next.renovation_cost = adjustment.apply(self.renovation_cost),
            "annual_appreciation" => {
                next.annual_appreciation = adjustment.apply(self.annual_appreciation)
            }
            "annual_mortgage_payment" => {
                let current = self.resolved(refs, |f| f.annual_mortgage_payment);
                next.annual_mortgage_payment = Some(adjustment.apply(current));
            }
            "equity" => {
                let current = self.resolved(refs, |f| f.equity);
                next.equity = Some(adjustment.apply(current));
            }
            "loan_amount" => {
                let current = self.resolved(refs, |f| f.loan_amount);
                next.loan_amount = Some(adjustment.apply(current));
            }
            "down_payment" => {
                next.down_payment = Some(adjustment.apply(self.down_payment.unwrap_or_default()))
            }
            "interest_rate" => {
                next.interest_rate = Some(adjustment.apply(self.interest_rate.unwrap_or_default()))
            }
            "discount_rate" => {
                let current = self.discount_rate.unwrap_or(refs.discount_rate);
                next.discount_rate = Some(adjustment.apply(current));
            }
            "hold_years" => {
                next.hold_years = whole_years(field, adjustment.apply(Decimal::from(self.hold_years)))?
            }
            "loan_term_years" => {
                next.loan_term_years =
                    whole_years(field, adjustment.apply(Decimal::from(self.loan_term_years)))?
            }
            other => {
                return Err(RealtyError::invalid(
                    other,
                    format!(
                        "Unknown ROI input field (expected one of: {})",
                        OVERRIDABLE_FIELDS.join(", ")
                    ),
                ))
            }
        }
        Ok(next)
    }

    /// Current resolved value of a derived field, or zero if the input does
    /// not normalise.
    fn resolved(
        &self,
        refs: &LocalMarketReference,
        pick: impl Fn(&PropertyFinancials) -> Money,
    ) -> Money {
        self.normalize(refs)
            .map(|f| pick(&f))
            .unwrap_or_default()
    }
}

fn whole_years(field: &str, value: Decimal) -> RealtyResult<u32> {
    if value.fract() != Decimal::ZERO {
        return Err(RealtyError::invalid(field, format!("{value} is not a whole number of years")));
    }
    value
        .to_u32()
        .ok_or_else(|| RealtyError::invalid(field, format!("{value} is out of range")))
}
