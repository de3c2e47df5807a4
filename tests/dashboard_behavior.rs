//! Behavior tests for the dashboard over a real DuckDB warehouse.
//!
//! Each test seeds a scratch warehouse and checks what a dashboard user would
//! see on the products, clients and cohort pages.

use std::fs;
use std::path::Path;

use statlite_core::{
    AnalysisOptions, AnalyticsError, Dashboard, ImportTable, QueryGuardrails, SaleDate, Warehouse,
    WarehouseConfig, WeekStart,
};
use tempfile::tempdir;

const SEED: &str = "
INSERT INTO products VALUES
    (1, 'Espresso'), (2, 'Croissant'), (3, 'Tea'), (4, 'Bagel');
INSERT INTO sale VALUES
    (100, 'card-a', DATE '2024-01-02', TIME '08:15:00'),
    (101, 'card-b', DATE '2024-01-03', TIME '09:30:00'),
    (102, 'card-a', DATE '2024-01-09', TIME '08:45:00'),
    (103, 'card-c', DATE '2024-01-10', TIME '17:05:00'),
    (104, 'card-d', DATE '2024-01-11', TIME '12:00:00');
INSERT INTO detailed_sale VALUES
    (100, 1, 2, 2.50),
    (100, 2, 1, 3.00),
    (101, 1, 1, 2.50),
    (102, 4, 3, 1.50),
    (103, 1, 1, 2.50);
";

fn open_warehouse(root: &Path) -> Warehouse {
    Warehouse::open(WarehouseConfig::for_home(root.join("statlite-home"))).expect("warehouse open")
}

fn seed(warehouse: &Warehouse) {
    warehouse
        .execute_query(SEED, QueryGuardrails::default(), true)
        .expect("seed");
}

fn date(value: &str) -> SaleDate {
    SaleDate::parse(value).expect("date")
}

// =============================================================================
// Products page
// =============================================================================

#[test]
fn when_user_opens_products_page_rankings_reflect_sales() {
    // Given: A warehouse with four products, one of them never sold
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());
    seed(&warehouse);

    // When: The products report is loaded with a top-2 limit
    let options = AnalysisOptions {
        top_n: 2,
        ..AnalysisOptions::default()
    };
    let report = Dashboard::new(&warehouse, options)
        .expect("dashboard")
        .products()
        .expect("products");

    // Then: Espresso leads by quantity, Tea is listed as unsold
    assert_eq!(report.product_count, 4);
    let top = report
        .top_sellers
        .iter()
        .map(|product| product.product_name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(top, vec!["Espresso", "Bagel"]);
    assert_eq!(report.top_sellers[0].total_quantity, 4);
    assert_eq!(report.revenue_leaders[0].product_name, "Espresso");
    assert_eq!(report.revenue_leaders[0].total_sales, 10.0);
    assert_eq!(report.unsold_products.len(), 1);
    assert_eq!(report.unsold_products[0].product_name, "Tea");
    assert!(report
        .bottom_sellers
        .iter()
        .all(|product| product.total_quantity > 0));
}

// =============================================================================
// Clients page
// =============================================================================

#[test]
fn when_user_opens_clients_page_kpis_count_cards_and_transactions() {
    // Given: Four cards, one of which comes back the following week
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());
    seed(&warehouse);

    // When: The clients report is loaded
    let report = Dashboard::new(&warehouse, AnalysisOptions::default())
        .expect("dashboard")
        .clients()
        .expect("clients");

    // Then: One of four customers repeated, and half of week one came back
    assert_eq!(report.customer_count, 4);
    assert_eq!(report.transaction_count, 5);
    assert_eq!(report.repeat_purchase.repeat_customers, 1);
    assert_eq!(report.repeat_purchase.rate, 0.25);

    assert_eq!(report.weekly_return.len(), 1);
    assert_eq!(report.weekly_return[0].week_start, date("2024-01-08"));
    assert_eq!(report.weekly_return[0].return_fraction, Some(0.5));

    let card = report.new_customers.expect("new customer card");
    assert_eq!(card.week_start, date("2024-01-08"));
    assert_eq!(card.new_customers, 2);
    assert_eq!(card.delta, Some(0));

    // Sale 104 has no detail lines but still counts as activity.
    let thursday_noon = report
        .activity
        .iter()
        .find(|cell| cell.day_name == "Thursday" && cell.hour == 12)
        .expect("activity cell");
    assert_eq!(thursday_noon.transactions, 1);
    assert!(report.warnings().is_empty());
}

#[test]
fn empty_warehouse_cannot_produce_client_kpis() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());

    let dashboard = Dashboard::new(&warehouse, AnalysisOptions::default()).expect("dashboard");

    let err = dashboard.clients().expect_err("must fail");
    assert!(matches!(err, AnalyticsError::InvalidState(_)));

    let cohort = dashboard.cohort().expect("cohort");
    assert!(cohort.matrix.is_empty());
    assert_eq!(cohort.warnings().len(), 1);
}

#[test]
fn when_warehouse_has_only_products_the_other_pages_still_load() {
    // Given: A catalog was imported but no sale has been recorded
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());
    warehouse
        .execute_query(
            "INSERT INTO products VALUES (1, 'Espresso')",
            QueryGuardrails::default(),
            true,
        )
        .expect("seed");

    // When: The pages are loaded one by one
    let pages = Dashboard::new(&warehouse, AnalysisOptions::default())
        .expect("dashboard")
        .load_pages();

    // Then: Only the clients page fails
    let products = pages.products.expect("products");
    assert_eq!(products.unsold_products.len(), 1);
    let sales = pages.sales.expect("sales pages");
    assert!(sales.cohort.matrix.is_empty());
    let err = sales.clients.expect_err("clients must fail");
    assert_eq!(err.code(), "invalid_state");
}

// =============================================================================
// Cohort page
// =============================================================================

#[test]
fn when_user_opens_cohort_page_matrix_tracks_each_acquisition_week() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());
    seed(&warehouse);

    let report = Dashboard::new(&warehouse, AnalysisOptions::default())
        .expect("dashboard")
        .cohort()
        .expect("cohort");

    let matrix = &report.matrix;
    assert_eq!(matrix.periods, 2);
    let first = matrix.cohort(date("2024-01-01")).expect("first cohort");
    assert_eq!(first.size, 2);
    assert_eq!(first.retention, vec![Some(1.0), Some(0.5)]);
    let second = matrix.cohort(date("2024-01-08")).expect("second cohort");
    assert_eq!(second.size, 2);
    assert_eq!(second.retention, vec![Some(1.0), None]);
}

#[test]
fn sunday_weeks_regroup_the_same_sales() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());
    seed(&warehouse);

    let options = AnalysisOptions {
        week_start: WeekStart::Sunday,
        ..AnalysisOptions::default()
    };
    let report = Dashboard::new(&warehouse, options)
        .expect("dashboard")
        .cohort()
        .expect("cohort");

    let weeks = report
        .matrix
        .cohorts
        .iter()
        .map(|row| row.cohort_week)
        .collect::<Vec<_>>();
    assert_eq!(weeks, vec![date("2023-12-31"), date("2024-01-07")]);
}

// =============================================================================
// Whole dashboard
// =============================================================================

#[test]
fn full_dashboard_loads_after_csv_import() {
    // Given: Sales arriving as CSV exports
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());

    let products = temp.path().join("products.csv");
    fs::write(&products, "product_id,product_name\n1,Espresso\n2,Tea\n").expect("write csv");
    let sales = temp.path().join("sale.csv");
    fs::write(
        &sales,
        "transaction_id,card_id,transaction_date,transaction_time\n\
         1,card-a,2024-01-01,09:00:00\n\
         2,card-a,2024-01-08,09:00:00\n\
         3,card-b,2024-01-08,10:00:00\n",
    )
    .expect("write csv");
    let lines = temp.path().join("detailed_sale.csv");
    fs::write(
        &lines,
        "transaction_id,product_id,quantity,price\n1,1,1,2.5\n2,1,2,2.5\n3,1,1,2.5\n",
    )
    .expect("write csv");

    for (table, path) in [
        (ImportTable::Products, &products),
        (ImportTable::Sale, &sales),
        (ImportTable::DetailedSale, &lines),
    ] {
        warehouse.import_csv(table, path).expect("import");
    }

    // When: The whole dashboard is loaded
    let report = Dashboard::new(&warehouse, AnalysisOptions::default())
        .expect("dashboard")
        .load()
        .expect("dashboard report");

    // Then: Every page is populated from the imported rows
    assert_eq!(report.products.top_sellers[0].total_quantity, 4);
    assert_eq!(report.products.unsold_products[0].product_name, "Tea");
    assert_eq!(report.clients.customer_count, 2);
    assert_eq!(report.clients.weekly_return[0].return_fraction, Some(1.0));
    assert_eq!(report.cohort.matrix.cohorts.len(), 2);
    assert!(report.warnings().is_empty());

    let json = serde_json::to_value(&report).expect("serialize");
    assert_eq!(json["cohort"]["matrix"]["week_start"], "monday");
    assert!(json["cohort"]["matrix"]["cohorts"][1]["retention"][1].is_null());
}

#[test]
fn truncated_fetch_fails_instead_of_reporting_partial_data() {
    let temp = tempdir().expect("tempdir");
    let mut config = WarehouseConfig::for_home(temp.path().join("statlite-home"));
    config.fetch_guardrails = QueryGuardrails {
        max_rows: 2,
        query_timeout_ms: 5_000,
    };
    let warehouse = Warehouse::open(config).expect("warehouse open");
    seed(&warehouse);

    let err = Dashboard::new(&warehouse, AnalysisOptions::default())
        .expect("dashboard")
        .cohort()
        .expect_err("must fail");

    assert!(matches!(err, AnalyticsError::DatasetTruncated { max_rows: 2 }));
}
