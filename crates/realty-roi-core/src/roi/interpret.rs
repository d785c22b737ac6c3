use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::roi::inputs::LocalMarketReference;
use crate::roi::metrics::DSCR_UNCONSTRAINED;
use crate::types::{Multiple, Rate};

/// Qualitative findings for the headline metrics against local bands.
///
/// Always returns exactly three notes, in cap-rate, cash-on-cash, DSCR order.
/// `cash_on_cash` is `None` when it is undefined (no equity invested).
pub fn interpret(
    cap_rate: Rate,
    cash_on_cash: Option<Rate>,
    dscr: Multiple,
    refs: &LocalMarketReference,
) -> Vec<String> {
    vec![
        cap_rate_note(cap_rate, refs),
        cash_on_cash_note(cash_on_cash, refs),
        dscr_note(dscr, refs),
    ]
}

fn cap_rate_note(cap_rate: Rate, refs: &LocalMarketReference) -> String {
    if cap_rate <= Decimal::ZERO {
        return "Cap rate could not be calculated due to missing or non-positive inputs.".into();
    }
    let shown = pct(cap_rate);
    if cap_rate < refs.cap_low {
        format!(
            "Cap rate {shown:.2}% is below the local low ({:.2}%): pricing leans toward appreciation rather than current income.",
            pct(refs.cap_low)
        )
    } else if cap_rate > refs.cap_high {
        format!(
            "Cap rate {shown:.2}% is higher than typical ({:.2}%): strong current income or possible undervaluation.",
            pct(refs.cap_high)
        )
    } else {
        format!("Cap rate {shown:.2}% is within the typical local range.")
    }
}

fn cash_on_cash_note(cash_on_cash: Option<Rate>, refs: &LocalMarketReference) -> String {
    let Some(coc) = cash_on_cash else {
        return "Cash-on-cash could not be calculated (missing equity or cash flow).".into();
    };
    let shown = pct(coc);
    if coc < refs.cash_on_cash_target {
        format!(
            "Cash-on-cash {shown:.2}% is lower than the typical investor target ({:.2}%).",
            pct(refs.cash_on_cash_target)
        )
    } else {
        format!("Cash-on-cash {shown:.2}% meets investor yield targets.")
    }
}

fn dscr_note(dscr: Multiple, refs: &LocalMarketReference) -> String {
    if dscr == DSCR_UNCONSTRAINED {
        return "DSCR unconstrained (no debt service): adequate coverage for typical lenders."
            .into();
    }
    if dscr < refs.dscr_minimum {
        format!(
            "DSCR {dscr:.2} is below the typical lender minimum ({}): financing may be harder or require higher rates.",
            refs.dscr_minimum
        )
    } else {
        format!("DSCR {dscr:.2} gives adequate coverage for typical lenders.")
    }
}

fn pct(rate: Rate) -> Decimal {
    rate * dec!(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_one_note_per_metric_in_order() {
        let notes = interpret(
            dec!(0.084),
            Some(dec!(0.12)),
            dec!(1.4),
            &LocalMarketReference::default(),
        );
        assert_eq!(notes.len(), 3);
        assert!(notes[0].starts_with("Cap rate 8.40%"));
        assert!(notes[0].contains("higher than typical"));
        assert!(notes[1].starts_with("Cash-on-cash 12.00%"));
        assert!(notes[1].contains("meets"));
        assert!(notes[2].starts_with("DSCR 1.40"));
        assert!(notes[2].contains("adequate"));
    }

    #[test]
    fn test_cap_rate_bands() {
        let refs = LocalMarketReference::default();
        assert!(interpret(dec!(0.02), None, dec!(2), &refs)[0].contains("below the local low"));
        assert!(interpret(dec!(0.05), None, dec!(2), &refs)[0].contains("within the typical"));
        assert!(interpret(dec!(0.09), None, dec!(2), &refs)[0].contains("higher than typical"));
        assert!(interpret(dec!(0), None, dec!(2), &refs)[0].contains("could not be calculated"));
        assert!(interpret(dec!(-0.01), None, dec!(2), &refs)[0].contains("could not be calculated"));
    }

    #[test]
    fn test_cash_on_cash_bands() {
        let refs = LocalMarketReference::default();
        assert!(interpret(dec!(0.05), None, dec!(2), &refs)[1].contains("could not be calculated"));
        assert!(interpret(dec!(0.05), Some(dec!(0.0)), dec!(2), &refs)[1].contains("lower than"));
        assert!(interpret(dec!(0.05), Some(dec!(0.08)), dec!(2), &refs)[1].contains("meets"));
    }

    #[test]
    fn test_dscr_bands() {
        let refs = LocalMarketReference::default();
        assert!(interpret(dec!(0.05), None, dec!(1.1), &refs)[2].contains("below the typical lender minimum"));
        assert!(interpret(dec!(0.05), None, dec!(1.2), &refs)[2].contains("adequate"));
    }

    #[test]
    fn test_unconstrained_dscr_always_adequate() {
        let strict = LocalMarketReference {
            dscr_minimum: Decimal::MAX,
            ..LocalMarketReference::default()
        };
        let notes = interpret(dec!(0.05), Some(dec!(0.1)), DSCR_UNCONSTRAINED, &strict);
        assert!(notes[2].contains("adequate coverage"));
        assert!(!notes[2].contains("below"));
    }
}
