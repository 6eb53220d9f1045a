//! Behavior-driven tests for forecasting and balance-sheet reconciliation
//!
//! These tests verify HOW historical rows flow through classification,
//! projection and the cash plug, including the data-quality gaps that must
//! surface as diagnostics instead of errors.

use valuecast_core::{
    forecast, forecast::balance_gap, generate_synthetic_statements, missing_statements,
    read_historicals, reconcile_balance_sheet, Assumption, AssumptionSet, CanonicalRow,
    CoreError, DriverTable, ForecastEngine, Statement, TagMap, ValidationError, REVENUE_GROWTH,
};
use valuecast_tests::{balance_total, value_of};

// =============================================================================
// Forecast: Projection
// =============================================================================

#[test]
fn when_history_is_balanced_system_forecasts_without_plugs() {
    // Given: Three balanced synthetic years
    let history = generate_synthetic_statements(&[2021, 2022, 2023]);

    // When: Five years are forecast with default growth
    let years = [2024, 2025, 2026, 2027, 2028];
    let result = forecast(&history, &years, &AssumptionSet::new()).expect("forecast");

    // Then: Every line item is projected for every year and no plug is needed
    assert_eq!(result.rows.len(), 9 * years.len());
    assert!(result.diagnostics.plugs.is_empty());
    assert_eq!(result.assumptions_used[REVENUE_GROWTH], vec![0.05; 5]);
    for year in years {
        assert!(balance_gap(&result.rows, year).abs() < 1e-6);
    }
}

#[test]
fn when_growth_path_is_given_system_compounds_revenue_from_last_actual() {
    // Given: Revenue of 1000 in the last historical year and a two-step path
    let history = vec![CanonicalRow::new(Statement::Income, "Revenue", 2023, 1000.0)];
    let assumptions = AssumptionSet::new().with(Assumption::new(REVENUE_GROWTH, vec![0.10, 0.20]));

    // When: Three years are forecast
    let result = forecast(&history, &[2024, 2025, 2026], &assumptions).expect("forecast");

    // Then: The path compounds and its last rate repeats past its end
    assert!((value_of(&result.rows, "Revenue", 2024) - 1100.0).abs() < 1e-9);
    assert!((value_of(&result.rows, "Revenue", 2025) - 1320.0).abs() < 1e-9);
    assert!((value_of(&result.rows, "Revenue", 2026) - 1584.0).abs() < 1e-9);
    assert_eq!(result.assumptions_used[REVENUE_GROWTH], vec![0.10, 0.20, 0.20]);
}

#[test]
fn when_margin_item_exists_system_scales_it_with_median_ratio() {
    // Given: Cost of revenue at 40% and 50% of revenue
    let history = vec![
        CanonicalRow::new(Statement::Income, "Revenue", 2022, 100.0),
        CanonicalRow::new(Statement::Income, "Revenue", 2023, 200.0),
        CanonicalRow::new(Statement::Income, "Cost of revenue", 2022, 40.0),
        CanonicalRow::new(Statement::Income, "Cost of revenue", 2023, 100.0),
    ];
    let assumptions = AssumptionSet::new().with(Assumption::flat(REVENUE_GROWTH, 0.0, 1));

    // When: One year is forecast at zero growth
    let result = forecast(&history, &[2024], &assumptions).expect("forecast");

    // Then: The median ratio (45%) applies to forecast revenue
    assert!((value_of(&result.rows, "Cost of revenue", 2024) - 90.0).abs() < 1e-9);
    let row = result.rows.iter().find(|row| row.line_item == "Cost of revenue").expect("row");
    assert_eq!(row.forecast_method.as_deref(), Some("margin-driven"));
}

#[test]
fn when_revenue_history_is_zero_system_yields_nan_rows_not_errors() {
    // Given: Zero revenue alongside a margin item
    let history = vec![
        CanonicalRow::new(Statement::Income, "Revenue", 2023, 0.0),
        CanonicalRow::new(Statement::Income, "Gross profit", 2023, 10.0),
    ];

    // When: A forecast is run
    let result = forecast(&history, &[2024], &AssumptionSet::new()).expect("forecast");

    // Then: The undefined ratio propagates as NaN
    assert!(value_of(&result.rows, "Gross profit", 2024).is_nan());
    assert_eq!(result.non_finite_rows().count(), 1);
}

#[test]
fn when_forecast_years_are_empty_system_rejects_the_call() {
    // Given: Valid history
    let history = generate_synthetic_statements(&[2023]);

    // When: No forecast years are requested
    let error = forecast(&history, &[], &AssumptionSet::new()).expect_err("must fail");

    // Then: A validation error names the problem
    assert_eq!(error, ValidationError::EmptyForecastYears);
}

#[test]
fn when_custom_table_reclassifies_item_system_projects_it_flat() {
    // Given: A table that marks cost of revenue as fixed
    let table = DriverTable::from_json_str(r#"{"Revenue": "revenue-driven", "Cost of revenue": "fixed"}"#)
        .expect("table");
    let history = vec![
        CanonicalRow::new(Statement::Income, "Revenue", 2022, 100.0),
        CanonicalRow::new(Statement::Income, "Cost of revenue", 2022, 30.0),
        CanonicalRow::new(Statement::Income, "Cost of revenue", 2023, 50.0),
    ];

    // When: The engine forecasts with that table
    let result = ForecastEngine::new(table)
        .forecast(&history, &[2024, 2025], &AssumptionSet::new())
        .expect("forecast");

    // Then: The historical median carries forward unchanged
    assert_eq!(value_of(&result.rows, "Cost of revenue", 2024), 40.0);
    assert_eq!(value_of(&result.rows, "Cost of revenue", 2025), 40.0);
}

// =============================================================================
// Forecast: Reconciliation
// =============================================================================

#[test]
fn when_balance_sheet_is_off_system_plugs_cash_by_the_gap() {
    // Given: Assets exceed liabilities plus equity by 25 in 2024
    let mut rows = vec![
        CanonicalRow::new(Statement::Balance, "Total assets", 2024, 125.0),
        CanonicalRow::new(Statement::Balance, "Total liabilities", 2024, 60.0),
        CanonicalRow::new(Statement::Balance, "Total equity", 2024, 40.0),
        CanonicalRow::new(Statement::Balance, "Cash and equivalents", 2024, 5.0),
    ];

    // When: The reconciler runs
    let plugs = reconcile_balance_sheet(&mut rows);

    // Then: One plug of 25 is added to the existing cash row
    assert_eq!(plugs.len(), 1);
    assert_eq!(plugs[0].year, 2024);
    assert!((plugs[0].amount - 25.0).abs() < 1e-9);
    assert_eq!(value_of(&rows, "Cash and equivalents", 2024), 30.0);
    assert_eq!(rows.len(), 4);
}

#[test]
fn when_cash_row_is_absent_system_appends_a_plug_row() {
    // Given: An unbalanced year without a cash line
    let mut rows = vec![
        CanonicalRow::new(Statement::Balance, "Total assets", 2025, 100.0),
        CanonicalRow::new(Statement::Balance, "Total liabilities", 2025, 80.0),
    ];

    // When: The reconciler runs
    let plugs = reconcile_balance_sheet(&mut rows);

    // Then: A new cash row carries the gap and is tagged as a plug
    assert_eq!(plugs.len(), 1);
    let cash = rows.iter().find(|row| row.line_item == "Cash and equivalents").expect("plug row");
    assert_eq!(cash.value, 20.0);
    assert_eq!(cash.forecast_method.as_deref(), Some("plug"));
}

#[test]
fn when_gap_is_within_tolerance_system_leaves_rows_untouched() {
    // Given: A gap of half a cent
    let mut rows = vec![
        CanonicalRow::new(Statement::Balance, "Total assets", 2024, 100.005),
        CanonicalRow::new(Statement::Balance, "Total liabilities", 2024, 100.0),
    ];
    let before = rows.clone();

    // When: The reconciler runs
    let plugs = reconcile_balance_sheet(&mut rows);

    // Then: Nothing changes
    assert!(plugs.is_empty());
    assert_eq!(rows, before);
}

#[test]
fn when_projected_totals_do_not_balance_system_plugs_cash_and_leaves_totals_alone() {
    // Given: A 2023 balance sheet where assets exceed liabilities plus equity by 10
    let history = vec![
        CanonicalRow::new(Statement::Income, "Revenue", 2023, 100.0),
        CanonicalRow::new(Statement::Balance, "Total assets", 2023, 100.0),
        CanonicalRow::new(Statement::Balance, "Total liabilities", 2023, 60.0),
        CanonicalRow::new(Statement::Balance, "Total equity", 2023, 30.0),
        CanonicalRow::new(Statement::Balance, "Cash and equivalents", 2023, 5.0),
    ];
    let assumptions = AssumptionSet::new().with(Assumption::flat(REVENUE_GROWTH, 0.0, 1));

    // When: 2024 is forecast at zero growth
    let result = forecast(&history, &[2024], &assumptions).expect("forecast");

    // Then: The plugs sum to the gap between the carried-forward totals
    let pre_plug_gap = balance_total(&result.rows, "Total assets", 2024)
        - (balance_total(&result.rows, "Total liabilities", 2024)
            + balance_total(&result.rows, "Total equity", 2024));
    let plugged: f64 = result.diagnostics.plugs.iter().map(|plug| plug.amount).sum();
    assert!((pre_plug_gap - 10.0).abs() < 1e-9);
    assert!((plugged - pre_plug_gap).abs() < 1e-9);

    // And: Only cash moves, so the measured gap is unchanged after plugging
    assert!((value_of(&result.rows, "Cash and equivalents", 2024) - 15.0).abs() < 1e-9);
    assert!((balance_gap(&result.rows, 2024) - pre_plug_gap).abs() < 1e-9);
}

// =============================================================================
// Forecast: Ingestion Into The Engine
// =============================================================================

#[test]
fn when_historicals_are_uploaded_system_feeds_them_to_the_forecast() {
    // Given: A CSV upload with one unparseable row and a missing cash flow statement
    let csv = "statement,line_item,year,value\n\
               IS,Revenue,2023,\"1,000\"\n\
               IS,  Operating   income ,2023,150\n\
               BS,Total assets,2023,n/a\n";

    // When: It is loaded and forecast
    let rows = read_historicals(csv.as_bytes()).expect("csv");
    let result = forecast(&rows, &[2024], &AssumptionSet::new()).expect("forecast");

    // Then: Separators and labels are cleaned, the bad row dropped, gaps reported
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].line_item, "Operating income");
    assert!((value_of(&result.rows, "Revenue", 2024) - 1050.0).abs() < 1e-9);
    let missing = missing_statements(&rows);
    assert!(missing.contains(&Statement::Balance));
    assert!(missing.contains(&Statement::CashFlow));
}

#[test]
fn when_upload_names_unknown_statement_system_rejects_it() {
    // Given: A row with statement code XX
    let csv = "statement,line_item,year,value\nXX,Revenue,2023,10\n";

    // When: It is loaded
    let error = read_historicals(csv.as_bytes()).expect_err("must fail");

    // Then: The statement code is a validation error
    assert!(matches!(error, CoreError::Validation(ValidationError::InvalidStatement { .. })));
}

#[test]
fn when_two_tags_map_to_one_line_system_keeps_the_preferred_tag() {
    // Given: The same revenue reported under a preferred and a fallback tag
    let tags = TagMap::default();
    let rows = vec![
        CanonicalRow::new(Statement::Income, "Revenue", 2023, 90.0)
            .with_source("RevenueFromContractWithCustomerExcludingAssessedTax", "us-gaap"),
        CanonicalRow::new(Statement::Income, "Revenue", 2023, 100.0).with_source("Revenues", "us-gaap"),
        CanonicalRow::new(Statement::Income, "Revenue", 2023, 110.0).with_source("Revenues", "us-gaap"),
    ];

    // When: Duplicates are resolved
    let resolved = tags.resolve_duplicates(&rows);

    // Then: One row remains, averaging the preferred tag's values
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].value, 105.0);
    assert_eq!(resolved[0].source_tag.as_deref(), Some("Revenues"));
}
