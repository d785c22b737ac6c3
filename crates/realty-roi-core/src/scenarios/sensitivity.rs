use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyError;
use crate::roi::engine::evaluate;
use crate::roi::inputs::{LocalMarketReference, RoiInput};
use crate::types::*;
use crate::RealtyResult;

/// Guard against runaway stepped ranges (e.g. a tiny step over a wide range).
const MAX_SWEEP_POINTS: usize = 1_000;

/// Metrics recomputed for one candidate value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub value: Decimal,
    pub cash_on_cash: Rate,
    pub cap_rate: Rate,
    pub npv: Money,
    pub irr: Option<Rate>,
}

/// All sweep points for one variable, in the order the values were supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivitySeries {
    pub variable: String,
    pub points: Vec<SensitivityPoint>,
}

/// Headline metrics of the unmodified input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseCaseMetrics {
    pub cash_on_cash: Rate,
    pub cap_rate: Rate,
    pub npv: Money,
    pub irr: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub base_case: BaseCaseMetrics,
    pub series: Vec<SensitivitySeries>,
}

/// Expand a variable's candidate values.
///
/// Lists are taken verbatim. Stepped ranges run from min to max inclusive,
/// with max appended when the step does not land on it.
pub fn generate_sweep_values(var: &SensitivityVariable) -> RealtyResult<Vec<Decimal>> {
    let field = || format!("variable:{}", var.name);

    let values = match &var.values {
        SweepValues::List(values) => {
            if values.is_empty() {
                return Err(RealtyError::InvalidInput {
                    field: field(),
                    reason: "At least one candidate value required".into(),
                });
            }
            values.clone()
        }
        SweepValues::Stepped { min, max, step } => {
            if *step <= Decimal::ZERO {
                return Err(RealtyError::InvalidInput {
                    field: field(),
                    reason: "Step must be positive".into(),
                });
            }
            if min > max {
                return Err(RealtyError::InvalidInput {
                    field: field(),
                    reason: "Min must be <= max".into(),
                });
            }

            let mut values = Vec::new();
            let mut current = *min;
            while current <= *max {
                values.push(current);
                if values.len() > MAX_SWEEP_POINTS {
                    return Err(RealtyError::InvalidInput {
                        field: field(),
                        reason: format!("Range expands to more than {MAX_SWEEP_POINTS} points"),
                    });
                }
                current += *step;
            }
            if let Some(&last) = values.last() {
                if last < *max {
                    values.push(*max);
                }
            }
            values
        }
    };

    Ok(values)
}

/// One-at-a-time sensitivity: each candidate value is substituted into a
/// fresh copy of `base` and the full ROI recomputed.
///
/// Variables do not interact, and the base input is never modified.
pub fn sensitivity_analysis(
    base: &RoiInput,
    variables: &[SensitivityVariable],
    refs: &LocalMarketReference,
) -> RealtyResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if variables.is_empty() {
        return Err(RealtyError::InsufficientData(
            "At least one sensitivity variable required".into(),
        ));
    }

    let mut scratch = Vec::new();
    let base_result = evaluate(base, refs, &mut scratch)?;
    let base_case = BaseCaseMetrics {
        cash_on_cash: base_result.cash_on_cash,
        cap_rate: base_result.cap_rate,
        npv: base_result.npv,
        irr: base_result.irr,
    };

    let mut series = Vec::with_capacity(variables.len());
    for var in variables {
        let values = generate_sweep_values(var)?;
        tracing::debug!(variable = %var.name, points = values.len(), "sweeping variable");

        let mut points = Vec::with_capacity(values.len());
        let mut unavailable_irr = 0usize;
        for value in values {
            let candidate = base.with_value(&var.name, value, refs)?;
            let mut point_warnings = Vec::new();
            let roi = evaluate(&candidate, refs, &mut point_warnings)?;
            if roi.irr.is_none() {
                unavailable_irr += 1;
            }
            points.push(SensitivityPoint {
                value,
                cash_on_cash: roi.cash_on_cash,
                cap_rate: roi.cap_rate,
                npv: roi.npv,
                irr: roi.irr,
            });
        }

        if unavailable_irr > 0 {
            warnings.push(format!(
                "{}: IRR unavailable for {unavailable_irr} of {} values",
                var.name,
                points.len()
            ));
        }

        series.push(SensitivitySeries {
            variable: var.name.clone(),
            points,
        });
    }

    let output = SensitivityOutput { base_case, series };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-at-a-time ROI sensitivity sweep",
        &serde_json::json!({
            "variables": variables.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            "local_market": refs,
        }),
        warnings,
        elapsed,
        output,
    ))
}
