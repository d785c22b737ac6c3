use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyError;
use crate::roi::engine::evaluate;
use crate::roi::inputs::{LocalMarketReference, RoiInput};
use crate::types::*;
use crate::RealtyResult;

const PROBABILITY_TOLERANCE: Decimal = dec!(0.001);

/// ROI metrics of one scenario, with deviations from the base case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiScenarioResult {
    pub name: String,
    pub probability: Option<Rate>,
    pub cash_on_cash: Rate,
    pub cap_rate: Rate,
    pub dscr: Multiple,
    pub npv: Money,
    pub irr: Option<Rate>,
    pub cash_on_cash_deviation: Rate,
    pub npv_deviation: Money,
    /// 0 when the base NPV is 0
    pub npv_deviation_pct: Rate,
    /// The adjusted input the metrics were computed from
    pub inputs: RoiInput,
}

/// Expected values across scenarios with a complete probability set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbabilityWeighted {
    pub npv: Money,
    pub cash_on_cash: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiScenarioOutput {
    pub base_cash_on_cash: Rate,
    pub base_npv: Money,
    pub scenarios: Vec<RoiScenarioResult>,
    /// Present only when every scenario has a probability and they sum to 1
    pub probability_weighted: Option<ProbabilityWeighted>,
}

/// Apply every adjustment of `scenario` to a copy of `base`.
///
/// Percentage adjustments of unset fields scale the values `refs` resolves.
pub fn apply_scenario(
    base: &RoiInput,
    scenario: &Scenario,
    refs: &LocalMarketReference,
) -> RealtyResult<RoiInput> {
    scenario
        .parameters
        .iter()
        .try_fold(base.clone(), |input, (field, adjustment)| {
            input
                .with_override(field, adjustment, refs)
                .map_err(|e| match e {
                    RealtyError::InvalidInput { reason, .. } => RealtyError::InvalidInput {
                        field: format!("scenario:{} {field}", scenario.name),
                        reason,
                    },
                    other => other,
                })
        })
}

/// Recompute the full ROI under each scenario and compare with the base case.
pub fn run_roi_scenarios(
    base: &RoiInput,
    scenarios: &[Scenario],
    refs: &LocalMarketReference,
) -> RealtyResult<ComputationOutput<RoiScenarioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if scenarios.is_empty() {
        return Err(RealtyError::InsufficientData(
            "At least one scenario required".into(),
        ));
    }

    for s in scenarios {
        if let Some(p) = s.probability {
            if p < Decimal::ZERO || p > Decimal::ONE {
                return Err(RealtyError::InvalidInput {
                    field: format!("scenario:{} probability", s.name),
                    reason: "Probability must be between 0 and 1".into(),
                });
            }
        }
    }

    tracing::debug!(count = scenarios.len(), "running ROI scenarios");

    let mut scratch = Vec::new();
    let base_result = evaluate(base, refs, &mut scratch)?;

    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let adjusted = apply_scenario(base, scenario, refs)?;
        let mut scenario_warnings = Vec::new();
        let roi = evaluate(&adjusted, refs, &mut scenario_warnings)?;
        warnings.extend(
            scenario_warnings
                .into_iter()
                .map(|w| format!("{}: {w}", scenario.name)),
        );

        let npv_deviation = roi.npv - base_result.npv;
        let npv_deviation_pct = if base_result.npv.is_zero() {
            if !npv_deviation.is_zero() {
                warnings.push(format!(
                    "Base NPV is zero; cannot compute npv_deviation_pct for scenario '{}'",
                    scenario.name
                ));
            }
            Decimal::ZERO
        } else {
            npv_deviation / base_result.npv.abs()
        };

        results.push(RoiScenarioResult {
            name: scenario.name.clone(),
            probability: scenario.probability,
            cash_on_cash: roi.cash_on_cash,
            cap_rate: roi.cap_rate,
            dscr: roi.dscr,
            npv: roi.npv,
            irr: roi.irr,
            cash_on_cash_deviation: roi.cash_on_cash - base_result.cash_on_cash,
            npv_deviation,
            npv_deviation_pct,
            inputs: adjusted,
        });
    }

    let probability_weighted = weighted_summary(&results, &mut warnings);

    let output = RoiScenarioOutput {
        base_cash_on_cash: base_result.cash_on_cash,
        base_npv: base_result.npv,
        scenarios: results,
        probability_weighted,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "ROI scenario analysis (parameter overrides, probability-weighted)",
        &serde_json::json!({
            "num_scenarios": scenarios.len(),
            "base_npv": output.base_npv.to_string(),
            "local_market": refs,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn weighted_summary(
    results: &[RoiScenarioResult],
    warnings: &mut Vec<String>,
) -> Option<ProbabilityWeighted> {
    let probabilities: Option<Vec<Rate>> = results.iter().map(|r| r.probability).collect();
    let probabilities = probabilities?;

    let total: Decimal = probabilities.iter().sum();
    if (total - Decimal::ONE).abs() > PROBABILITY_TOLERANCE {
        warnings.push(format!(
            "Probabilities sum to {total}, not 1.0; probability-weighted values omitted"
        ));
        return None;
    }
    if total != Decimal::ONE {
        warnings.push(format!(
            "Probabilities sum to {total}; treated as approximately 1.0"
        ));
    }

    let (npv, cash_on_cash) = results.iter().zip(&probabilities).fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(npv, coc), (r, p)| (npv + *p * r.npv, coc + *p * r.cash_on_cash),
    );
    Some(ProbabilityWeighted { npv, cash_on_cash })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn sample_input() -> RoiInput {
        RoiInput {
            vacancy_rate: dec!(0.05),
            operating_expenses: dec!(15000),
            annual_mortgage_payment: Some(dec!(30000)),
            equity: Some(dec!(100000)),
            ..RoiInput::new(dec!(500000), dec!(60000))
        }
    }

    fn scenario(name: &str, probability: Option<Decimal>, params: &[(&str, Adjustment)]) -> Scenario {
        Scenario {
            name: name.into(),
            probability,
            parameters: params
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn bear_base_bull() -> Vec<Scenario> {
        vec![
            scenario(
                "Bear",
                Some(dec!(0.25)),
                &[("gross_rent_annual", Adjustment::Scale(dec!(-0.10)))],
            ),
            scenario("Base", Some(dec!(0.50)), &[]),
            scenario(
                "Bull",
                Some(dec!(0.25)),
                &[("gross_rent_annual", Adjustment::Scale(dec!(0.10)))],
            ),
        ]
    }

    #[test]
    fn test_apply_scenario_mixed_adjustments() {
        let s = scenario(
            "Mixed",
            None,
            &[
                ("gross_rent_annual", Adjustment::Scale(dec!(0.10))),
                ("vacancy_rate", Adjustment::Set(dec!(0.02))),
            ],
        );
        let adjusted =
            apply_scenario(&sample_input(), &s, &LocalMarketReference::default()).unwrap();
        assert_eq!(adjusted.gross_rent_annual, dec!(66000));
        assert_eq!(adjusted.vacancy_rate, dec!(0.02));
    }

    #[test]
    fn test_rate_scenario_scales_market_discount_rate() {
        let refs = LocalMarketReference {
            discount_rate: dec!(0.07),
            ..LocalMarketReference::default()
        };
        let s = scenario(
            "Higher hurdle",
            None,
            &[("discount_rate", Adjustment::Scale(dec!(0.10)))],
        );
        let adjusted = apply_scenario(&sample_input(), &s, &refs).unwrap();
        assert_eq!(adjusted.discount_rate, Some(dec!(0.077)));

        let result = run_roi_scenarios(&sample_input(), &[s], &refs).unwrap();
        assert!(result.result.scenarios[0].npv_deviation < Decimal::ZERO);
    }

    #[test]
    fn test_scenario_deviations() {
        let result =
            run_roi_scenarios(&sample_input(), &bear_base_bull(), &LocalMarketReference::default())
                .unwrap();
        let out = &result.result;

        assert_eq!(out.scenarios.len(), 3);
        assert_eq!(out.base_cash_on_cash, dec!(0.12));
        // Bear: rent 54000 -> EGI 51300, NOI 36300, cash flow 6300
        assert_eq!(out.scenarios[0].cash_on_cash, dec!(0.063));
        assert_eq!(out.scenarios[0].cash_on_cash_deviation, dec!(-0.057));
        assert_eq!(out.scenarios[1].npv_deviation, Decimal::ZERO);
        assert!(out.scenarios[2].npv_deviation > Decimal::ZERO);
        assert!(out.scenarios[0].npv_deviation_pct < Decimal::ZERO);
    }

    #[test]
    fn test_probability_weighted_summary() {
        let result =
            run_roi_scenarios(&sample_input(), &bear_base_bull(), &LocalMarketReference::default())
                .unwrap();
        let out = &result.result;
        let weighted = out.probability_weighted.as_ref().unwrap();

        // Symmetric +/-10% rent shocks are linear in cash-on-cash.
        assert_eq!(weighted.cash_on_cash, dec!(0.12));
        let expected_npv = dec!(0.25) * out.scenarios[0].npv
            + dec!(0.50) * out.scenarios[1].npv
            + dec!(0.25) * out.scenarios[2].npv;
        assert_eq!(weighted.npv, expected_npv);
    }

    #[test]
    fn test_incomplete_probabilities_skip_weighting() {
        let mut scenarios = bear_base_bull();
        scenarios[1].probability = None;
        let result =
            run_roi_scenarios(&sample_input(), &scenarios, &LocalMarketReference::default())
                .unwrap();
        assert!(result.result.probability_weighted.is_none());

        let mut scenarios = bear_base_bull();
        scenarios[1].probability = Some(dec!(0.10));
        let result =
            run_roi_scenarios(&sample_input(), &scenarios, &LocalMarketReference::default())
                .unwrap();
        assert!(result.result.probability_weighted.is_none());
        assert!(result.warnings.iter().any(|w| w.contains("omitted")));
    }

    #[test]
    fn test_base_input_never_mutated() {
        let base = sample_input();
        let snapshot = base.clone();
        run_roi_scenarios(&base, &bear_base_bull(), &LocalMarketReference::default()).unwrap();
        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let scenarios = vec![scenario("Odd", None, &[("rent", Adjustment::Set(dec!(1)))])];
        let err = run_roi_scenarios(&sample_input(), &scenarios, &LocalMarketReference::default())
            .unwrap_err();
        assert!(matches!(err, RealtyError::InvalidInput { ref field, .. } if field.contains("Odd")));
    }

    #[test]
    fn test_invalid_probability_and_empty_list() {
        let scenarios = vec![scenario("Bad", Some(dec!(1.5)), &[])];
        assert!(
            run_roi_scenarios(&sample_input(), &scenarios, &LocalMarketReference::default())
                .is_err()
        );
        assert!(run_roi_scenarios(&sample_input(), &[], &LocalMarketReference::default()).is_err());
    }
}
