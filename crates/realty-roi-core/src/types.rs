use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::RealtyError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiples and coverage ratios (e.g., 1.4x DSCR)
pub type Multiple = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// A single parameter override applied by a scenario.
///
/// Deserialises from either a JSON number (absolute replacement) or a string.
/// Strings ending in `%` are signed percentage changes (`"+10%"`, `"-5%"`);
/// any other string must parse as a plain decimal and replaces the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAdjustment", into = "RawAdjustment")]
pub enum Adjustment {
    /// Replace the field outright
    Set(Decimal),
    /// Scale the field by (1 + pct); pct is a decimal rate (0.10 = +10%)
    Scale(Rate),
}

impl Adjustment {
    /// Apply the adjustment to an existing field value.
    pub fn apply(&self, current: Decimal) -> Decimal {
        match self {
            Adjustment::Set(value) => *value,
            Adjustment::Scale(pct) => current * (Decimal::ONE + pct),
        }
    }
}

impl FromStr for Adjustment {
    type Err = RealtyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(number) = trimmed.strip_suffix('%') {
            let number = number.trim();
            let number = number.strip_prefix('+').unwrap_or(number);
            let pct = Decimal::from_str(number).map_err(|e| RealtyError::InvalidInput {
                field: "adjustment".into(),
                reason: format!("'{s}' is not a valid percentage: {e}"),
            })?;
            return Ok(Adjustment::Scale(pct / Decimal::ONE_HUNDRED));
        }
        let value = Decimal::from_str(trimmed).map_err(|e| RealtyError::InvalidInput {
            field: "adjustment".into(),
            reason: format!("'{s}' is neither a number nor a percentage: {e}"),
        })?;
        Ok(Adjustment::Set(value))
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::Set(value) => write!(f, "{value}"),
            Adjustment::Scale(pct) => {
                let pct = (pct * Decimal::ONE_HUNDRED).normalize();
                if pct.is_sign_negative() {
                    write!(f, "{pct}%")
                } else {
                    write!(f, "+{pct}%")
                }
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawAdjustment {
    Text(String),
    Number(Decimal),
}

impl TryFrom<RawAdjustment> for Adjustment {
    type Error = RealtyError;

    fn try_from(raw: RawAdjustment) -> Result<Self, Self::Error> {
        match raw {
            RawAdjustment::Text(s) => s.parse(),
            RawAdjustment::Number(n) => Ok(Adjustment::Set(n)),
        }
    }
}

impl From<Adjustment> for RawAdjustment {
    fn from(adj: Adjustment) -> Self {
        match adj {
            Adjustment::Set(n) => RawAdjustment::Number(n),
            Adjustment::Scale(_) => RawAdjustment::Text(adj.to_string()),
        }
    }
}

/// Scenario definition: a named set of parameter overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Optional probability weight (0..1) used for probability-weighted summaries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<Rate>,
    /// Field name -> adjustment
    #[serde(alias = "overrides")]
    pub parameters: BTreeMap<String, Adjustment>,
}

/// Candidate values for a one-at-a-time sensitivity sweep.
///
/// Either an explicit list of values or a min/max/step range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SweepValues {
    List(Vec<Decimal>),
    Stepped {
        min: Decimal,
        max: Decimal,
        step: Decimal,
    },
}

/// Sensitivity variable specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: String,
    pub values: SweepValues,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
