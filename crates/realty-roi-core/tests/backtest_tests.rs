use realty_roi_core::backtest::engine::{
    BacktestProperty, BacktestStatus, PerformanceRating,
};
use realty_roi_core::backtest::{run_backtest, run_portfolio_backtest, BacktestRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// One year of monthly rent and expenses, plus a large repair in March.
fn year_of_history() -> serde_json::Value {
    let mut transactions = Vec::new();
    for month in 1..=12 {
        let date = format!("2024-{month:02}-05");
        transactions.push(serde_json::json!({
            "date": date, "kind": "rent", "amount": "4750", "category": "income"
        }));
        transactions.push(serde_json::json!({
            "date": date, "kind": "expense", "amount": "-3750", "category": "operating"
        }));
    }
    transactions.push(serde_json::json!({
        "date": "2024-03-20", "kind": "expense", "amount": "-15000",
        "category": "repairs", "description": "Roof"
    }));
    serde_json::Value::Array(transactions)
}

fn request_json(start: &str, end: &str) -> serde_json::Value {
    serde_json::json!({
        "property": {
            "property_name": "Duplex",
            "purchase_price": "500000",
            "gross_rent_annual": "60000",
            "vacancy_rate": "0.05",
            "operating_expenses": "15000",
            "annual_mortgage_payment": "30000",
            "equity": "100000"
        },
        "transactions": year_of_history(),
        "start_date": start,
        "end_date": end,
        "scenarios": [
            {"name": "Rent up", "parameters": {"gross_rent_annual": "+10%"}},
            {"name": "Rent down", "parameters": {"gross_rent_annual": "-10%"}}
        ]
    })
}

#[test]
fn test_full_year_backtest() {
    let request: BacktestRequest =
        serde_json::from_value(request_json("2024-01-01", "2024-12-31")).unwrap();
    let output = run_backtest(&request).unwrap();
    let result = &output.result;

    assert_eq!(result.status, BacktestStatus::Complete);
    assert_eq!(result.base.transaction_count, 25);
    assert_eq!(result.base.total_income, dec!(57000));
    assert_eq!(result.base.total_expenses, dec!(60000));
    assert_eq!(result.base.net_cash_flow, dec!(-3000));
    assert_eq!(result.performance.months_analyzed, 12);
    assert_eq!(result.performance.total_return, dec!(-3000));

    // Cumulative peaks at 2000 in February; the March repair drops it to -12000.
    assert_eq!(result.performance.max_drawdown, dec!(-14000));
    assert!(result.performance.return_volatility > Decimal::ZERO);

    assert!(result
        .insights
        .risks
        .iter()
        .any(|r| r.contains("negative cash flow")));
    assert!(result
        .insights
        .risks
        .iter()
        .any(|r| r.contains("Significant cash flow volatility")));
    assert_eq!(
        result.insights.opportunities,
        vec!["Best performing scenario: Rent up"]
    );
}

#[test]
fn test_window_outside_history_reports_no_transactions() {
    let request: BacktestRequest =
        serde_json::from_value(request_json("2023-01-01", "2023-12-31")).unwrap();
    let output = run_backtest(&request).unwrap();
    let result = &output.result;

    assert_eq!(result.status, BacktestStatus::NoTransactions);
    assert_eq!(result.base.total_income, Decimal::ZERO);
    assert_eq!(result.base.net_cash_flow, Decimal::ZERO);
    assert_eq!(result.performance.months_analyzed, 0);
    assert_eq!(result.insights.summary.len(), 1);
    assert!(result.insights.summary[0].contains("Insufficient data"));

    let json = serde_json::to_value(result).unwrap();
    assert_eq!(json["status"], "no_transactions");
}

#[test]
fn test_scenario_runs_leave_property_untouched() {
    let request: BacktestRequest =
        serde_json::from_value(request_json("2024-01-01", "2024-12-31")).unwrap();
    let before: BacktestProperty = request.property.clone();
    let output = run_backtest(&request).unwrap();
    pretty_assertions::assert_eq!(request.property, before);
    assert_eq!(output.result.scenarios[0].property.gross_rent_annual, dec!(66000));
    assert_eq!(output.result.scenarios[1].property.gross_rent_annual, dec!(54000));
}

#[test]
fn test_unknown_request_field_rejected() {
    let mut json = request_json("2024-01-01", "2024-12-31");
    json["property"]["bedrooms"] = serde_json::json!(3);
    assert!(serde_json::from_value::<BacktestRequest>(json).is_err());
}

#[test]
fn test_portfolio_of_two() {
    let healthy: BacktestRequest = serde_json::from_value(serde_json::json!({
        "property": {"property_name": "Healthy", "purchase_price": "300000", "gross_rent_annual": "24000"},
        "transactions": [
            {"date": "2024-01-01", "kind": "rent", "amount": "2000"},
            {"date": "2024-02-01", "kind": "rent", "amount": "2000"},
            {"date": "2024-03-01", "kind": "rent", "amount": "2000"},
            {"date": "2024-03-01", "kind": "expense", "amount": "-500"}
        ],
        "start_date": "2024-01-01",
        "end_date": "2024-03-31"
    }))
    .unwrap();
    let struggling: BacktestRequest =
        serde_json::from_value(request_json("2024-01-01", "2024-12-31")).unwrap();

    let output = run_portfolio_backtest(&[healthy, struggling]).unwrap();
    let portfolio = &output.result;

    assert_eq!(portfolio.total_properties, 2);
    assert_eq!(portfolio.properties[0].property_name, "Healthy");
    assert_eq!(portfolio.properties[0].rating, PerformanceRating::Strong);
    assert_eq!(portfolio.properties[1].rating, PerformanceRating::Weak);
    assert_eq!(
        portfolio.aggregate.total_monthly_cash_flow,
        portfolio.properties[0].monthly_cash_flow + portfolio.properties[1].monthly_cash_flow
    );
    assert!(portfolio.insights.iter().any(|i| i.contains("Weak performers: Duplex")));
}
