mod common;

use dataspark::{
    catalog::QueryCatalog,
    config::AppConfig,
    data::Value,
    error::QueryError,
    executor::QueryExecutor,
    pipeline,
    store::StoreGateway,
};

use common::TestWorkspace;

const TOP_PRODUCTS: &str = "Top Performing Products by Quantity Sold and Revenue";

fn loaded_store(workspace: &TestWorkspace) -> StoreGateway {
    let config = AppConfig {
        data_dir: workspace.path().to_path_buf(),
        database: ":memory:".to_string(),
        ..AppConfig::default()
    };
    let gateway = StoreGateway::open(&config.database).expect("open store");
    let report = pipeline::ingest_all(&config, &gateway);
    assert!(report.is_success(), "ingest failed: {}", report.summary());
    gateway
}

fn text(value: &Option<Value>) -> String {
    value.as_ref().map(Value::as_display).unwrap_or_default()
}

fn number(value: &Option<Value>) -> f64 {
    value
        .as_ref()
        .and_then(Value::as_f64)
        .unwrap_or_else(|| panic!("expected a number, got {value:?}"))
}

#[test]
fn every_cataloged_query_runs_against_the_loaded_tables() {
    let workspace = TestWorkspace::new();
    workspace.write_retail_sources();
    let gateway = loaded_store(&workspace);
    let catalog = QueryCatalog::standard();
    let executor = QueryExecutor::new(&gateway, &catalog);
    for name in catalog.list_names() {
        let result = executor
            .execute(name)
            .unwrap_or_else(|err| panic!("{name}: {err}"));
        let definition = catalog.get(name).expect("cataloged");
        assert_eq!(result.columns.len(), definition.expected_columns.len());
        assert!(!result.rows.is_empty(), "{name} returned no rows");
    }
}

#[test]
fn top_products_order_by_revenue_then_quantity() {
    let workspace = TestWorkspace::new();
    workspace.write_retail_sources();
    let gateway = loaded_store(&workspace);
    let catalog = QueryCatalog::standard();
    let result = QueryExecutor::new(&gateway, &catalog)
        .execute(TOP_PRODUCTS)
        .expect("top products");

    assert_eq!(
        result.columns,
        vec!["Product Name", "TotalQuantitySold", "TotalRevenue"]
    );
    let names = result.rows.iter().map(|row| text(&row[0])).collect::<Vec<_>>();
    // Doohickey, Widget and Gadget tie on revenue; quantity breaks the tie.
    assert_eq!(names, vec!["Gizmo", "Doohickey", "Widget", "Gadget"]);
    let quantities = result.rows.iter().map(|row| number(&row[1])).collect::<Vec<_>>();
    assert_eq!(quantities, vec![1.0, 8.0, 4.0, 2.0]);
    assert_eq!(number(&result.rows[0][2]), 1500.0);
}

#[test]
fn top_products_return_at_most_ten_rows() {
    let workspace = TestWorkspace::new();
    workspace.write_retail_sources();
    let mut products = String::from("ProductKey,Product Name,Brand,Category,Unit Cost USD,Unit Price USD\n");
    let mut sales = String::from(
        "Order Number,Line Item,Order Date,Delivery Date,CustomerKey,StoreKey,ProductKey,Quantity,Currency Code\n",
    );
    for key in 1..=12 {
        products.push_str(&format!("{key},Item {key:02},Contoso,Audio,$1.00,${key}.00\n"));
        sales.push_str(&format!("{key},1,1/1/2020,1/2/2020,100,1,{key},1,USD\n"));
    }
    workspace.write("Products.csv", &products);
    workspace.write("Sales.csv", &sales);
    let gateway = loaded_store(&workspace);
    let catalog = QueryCatalog::standard();
    let result = QueryExecutor::new(&gateway, &catalog)
        .execute(TOP_PRODUCTS)
        .expect("top products");

    assert_eq!(result.row_count(), 10);
    assert_eq!(text(&result.rows[0][0]), "Item 12");
    assert_eq!(text(&result.rows[9][0]), "Item 03");
    let revenues = result.rows.iter().map(|row| number(&row[2])).collect::<Vec<_>>();
    assert!(revenues.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[test]
fn sales_by_currency_applies_exchange_rates() {
    let workspace = TestWorkspace::new();
    workspace.write_retail_sources();
    let gateway = loaded_store(&workspace);
    let catalog = QueryCatalog::standard();
    let result = QueryExecutor::new(&gateway, &catalog)
        .execute("Sales by Currency")
        .expect("sales by currency");

    assert_eq!(text(&result.rows[0][0]), "EUR");
    assert!((number(&result.rows[0][1]) - 1350.0).abs() < 1e-6);
    assert_eq!(text(&result.rows[1][0]), "USD");
    assert!((number(&result.rows[1][1]) - 120.0).abs() < 1e-6);
}

#[test]
fn unknown_query_is_reported_not_raised() {
    let gateway = StoreGateway::open_in_memory().expect("open store");
    let catalog = QueryCatalog::standard();
    let err = QueryExecutor::new(&gateway, &catalog)
        .execute("Nonexistent Report")
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownQuery(ref name) if name == "Nonexistent Report"));
}

#[test]
fn queries_before_loading_fail_with_execution_errors() {
    let gateway = StoreGateway::open_in_memory().expect("open store");
    let catalog = QueryCatalog::standard();
    let executor = QueryExecutor::new(&gateway, &catalog);
    let err = executor.execute("Store Sales Performance").unwrap_err();
    assert!(matches!(err, QueryError::Execution { .. }));
    // The executor stays usable after a failure.
    assert!(matches!(
        executor.execute("Nonexistent Report"),
        Err(QueryError::UnknownQuery(_))
    ));
}
