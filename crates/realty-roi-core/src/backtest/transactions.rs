use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Average days per month used to convert a date span into months.
pub const DAYS_PER_MONTH: Decimal = dec!(30.44);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Rent income
    Rent,
    Expense,
}

/// One historical cash movement for a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(alias = "transaction_date")]
    pub date: NaiveDate,
    #[serde(alias = "type", alias = "transaction_type")]
    pub kind: TransactionKind,
    /// Signed as recorded; expenses are usually negative
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    /// Contribution to net cash flow: rent as recorded, expenses always
    /// as an outflow regardless of the recorded sign.
    pub fn net_amount(&self) -> Money {
        match self.kind {
            TransactionKind::Rent => self.amount,
            TransactionKind::Expense => -self.amount.abs(),
        }
    }
}

/// Realised aggregates over the transactions of a backtest window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseMetrics {
    pub total_income: Money,
    /// Absolute value of all expenses
    pub total_expenses: Money,
    pub net_cash_flow: Money,
    pub monthly_income: Money,
    pub monthly_expenses: Money,
    pub monthly_cash_flow: Money,
    /// Monthly income over expected monthly rent; 0 when no rent is expected
    pub occupancy_rate: Rate,
    pub transaction_count: usize,
    pub period_months: Decimal,
}

/// Transactions dated within `[start, end]`, in their original order.
pub fn filter_window(
    transactions: &[Transaction],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|t| t.date >= start && t.date <= end)
        .collect()
}

/// Months between the first and last transaction date.
pub fn period_months(transactions: &[&Transaction]) -> Decimal {
    let first = transactions.iter().map(|t| t.date).min();
    let last = transactions.iter().map(|t| t.date).max();
    match (first, last) {
        (Some(first), Some(last)) => Decimal::from((last - first).num_days()) / DAYS_PER_MONTH,
        _ => Decimal::ZERO,
    }
}

/// Occupancy estimate: realised monthly income over expected monthly rent.
pub fn occupancy_rate(monthly_income: Money, gross_rent_annual: Money) -> Rate {
    let expected = gross_rent_annual / dec!(12);
    if expected <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    monthly_income / expected
}

/// Totals and monthly averages for the window.
///
/// A zero-length span (all transactions on one date) yields zero monthly
/// averages rather than a division error.
pub fn base_metrics(transactions: &[&Transaction], gross_rent_annual: Money) -> BaseMetrics {
    if transactions.is_empty() {
        return BaseMetrics::default();
    }

    let total_income: Money = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Rent)
        .map(|t| t.amount)
        .sum();
    let total_expenses: Money = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
        .map(|t| t.amount.abs())
        .sum();

    let months = period_months(transactions);
    let (monthly_income, monthly_expenses) = if months > Decimal::ZERO {
        (total_income / months, total_expenses / months)
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    BaseMetrics {
        total_income,
        total_expenses,
        net_cash_flow: total_income - total_expenses,
        monthly_income,
        monthly_expenses,
        monthly_cash_flow: monthly_income - monthly_expenses,
        occupancy_rate: occupancy_rate(monthly_income, gross_rent_annual),
        transaction_count: transactions.len(),
        period_months: months,
    }
}

impl BaseMetrics {
    /// Rescale income and expenses by scenario factors, re-estimating
    /// occupancy against the scenario's expected rent.
    pub fn rescaled(
        &self,
        income_factor: Decimal,
        expense_factor: Decimal,
        gross_rent_annual: Money,
    ) -> BaseMetrics {
        let total_income = self.total_income * income_factor;
        let total_expenses = self.total_expenses * expense_factor;
        let monthly_income = self.monthly_income * income_factor;
        let monthly_expenses = self.monthly_expenses * expense_factor;
        BaseMetrics {
            total_income,
            total_expenses,
            net_cash_flow: total_income - total_expenses,
            monthly_income,
            monthly_expenses,
            monthly_cash_flow: monthly_income - monthly_expenses,
            occupancy_rate: occupancy_rate(monthly_income, gross_rent_annual),
            transaction_count: self.transaction_count,
            period_months: self.period_months,
        }
    }

    /// Round for presentation: money to cents, occupancy to 4 dp, months to 1 dp.
    pub fn rounded(&self) -> BaseMetrics {
        BaseMetrics {
            total_income: self.total_income.round_dp(2),
            total_expenses: self.total_expenses.round_dp(2),
            net_cash_flow: self.net_cash_flow.round_dp(2),
            monthly_income: self.monthly_income.round_dp(2),
            monthly_expenses: self.monthly_expenses.round_dp(2),
            monthly_cash_flow: self.monthly_cash_flow.round_dp(2),
            occupancy_rate: self.occupancy_rate.round_dp(4),
            transaction_count: self.transaction_count,
            period_months: self.period_months.round_dp(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(d: NaiveDate, kind: TransactionKind, amount: Decimal) -> Transaction {
        Transaction {
            date: d,
            kind,
            amount,
            category: None,
            description: None,
        }
    }

    #[test]
    fn test_deserialise_field_aliases() {
        let t: Transaction = serde_json::from_value(serde_json::json!({
            "transaction_date": "2024-01-15",
            "transaction_type": "rent",
            "amount": 5000,
            "category": "income"
        }))
        .unwrap();
        assert_eq!(t.date, date(2024, 1, 15));
        assert_eq!(t.kind, TransactionKind::Rent);
        assert_eq!(t.amount, dec!(5000));
    }

    #[test]
    fn test_net_amount_treats_expenses_as_outflows() {
        let d = date(2024, 1, 1);
        assert_eq!(tx(d, TransactionKind::Expense, dec!(-100)).net_amount(), dec!(-100));
        assert_eq!(tx(d, TransactionKind::Expense, dec!(100)).net_amount(), dec!(-100));
        assert_eq!(tx(d, TransactionKind::Rent, dec!(500)).net_amount(), dec!(500));
    }

    #[test]
    fn test_window_is_inclusive() {
        let txs = vec![
            tx(date(2023, 12, 31), TransactionKind::Rent, dec!(1)),
            tx(date(2024, 1, 1), TransactionKind::Rent, dec!(2)),
            tx(date(2024, 6, 30), TransactionKind::Rent, dec!(3)),
            tx(date(2024, 7, 1), TransactionKind::Rent, dec!(4)),
        ];
        let window = filter_window(&txs, date(2024, 1, 1), date(2024, 6, 30));
        let amounts: Vec<_> = window.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![dec!(2), dec!(3)]);
    }

    #[test]
    fn test_base_metrics_totals_and_averages() {
        let txs = vec![
            tx(date(2024, 1, 1), TransactionKind::Rent, dec!(5000)),
            tx(date(2024, 1, 1), TransactionKind::Expense, dec!(-1500)),
            tx(date(2024, 1, 31), TransactionKind::Rent, dec!(5000)),
            tx(date(2024, 1, 31), TransactionKind::Expense, dec!(-1500)),
        ];
        let window: Vec<&Transaction> = txs.iter().collect();
        let m = base_metrics(&window, dec!(60000));

        assert_eq!(m.total_income, dec!(10000));
        assert_eq!(m.total_expenses, dec!(3000));
        assert_eq!(m.net_cash_flow, dec!(7000));
        assert_eq!(m.transaction_count, 4);
        // 30 days / 30.44
        assert_eq!(m.period_months, dec!(30) / dec!(30.44));
        assert_eq!(m.monthly_income, dec!(10000) / m.period_months);
    }

    #[test]
    fn test_single_date_has_zero_averages() {
        let txs = vec![
            tx(date(2024, 1, 15), TransactionKind::Rent, dec!(5000)),
            tx(date(2024, 1, 15), TransactionKind::Expense, dec!(-1250)),
        ];
        let window: Vec<&Transaction> = txs.iter().collect();
        let m = base_metrics(&window, dec!(60000));
        assert_eq!(m.period_months, Decimal::ZERO);
        assert_eq!(m.monthly_income, Decimal::ZERO);
        assert_eq!(m.occupancy_rate, Decimal::ZERO);
        assert_eq!(m.net_cash_flow, dec!(3750));
    }

    #[test]
    fn test_occupancy_guard() {
        assert_eq!(occupancy_rate(dec!(4500), dec!(60000)), dec!(0.9));
        assert_eq!(occupancy_rate(dec!(4500), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_rescaled_metrics() {
        let base = BaseMetrics {
            total_income: dec!(12000),
            total_expenses: dec!(4000),
            net_cash_flow: dec!(8000),
            monthly_income: dec!(4500),
            monthly_expenses: dec!(1500),
            monthly_cash_flow: dec!(3000),
            occupancy_rate: dec!(0.9),
            transaction_count: 6,
            period_months: dec!(2),
        };
        let scaled = base.rescaled(dec!(1.1), dec!(1), dec!(66000));
        assert_eq!(scaled.monthly_income, dec!(4950));
        assert_eq!(scaled.monthly_cash_flow, dec!(3450));
        assert_eq!(scaled.occupancy_rate, dec!(0.9));
        assert_eq!(scaled.transaction_count, 6);
    }
}
