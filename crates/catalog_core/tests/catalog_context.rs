use catalog_core::config::CONNECTION_STRING_ENV;
use catalog_core::{
    CatalogContext, ConfigError, ContextError, DbTarget, Product, ProductRepository, StoreConfig,
};
use rust_decimal::Decimal;

#[test]
fn connect_in_memory_exposes_product_collection() {
    let context = CatalogContext::connect(&StoreConfig::in_memory()).unwrap();
    let products = context.products();

    let id = products
        .create_product(&Product::new("Notebook", Decimal::new(350, 2)))
        .unwrap();
    let loaded = products.get_product(id).unwrap().unwrap();
    assert_eq!(loaded.name, "Notebook");
    assert_eq!(products.count_products().unwrap(), 1);
}

#[test]
fn file_backed_context_persists_between_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.db");
    let config = StoreConfig::new(format!("Data Source={}", path.display()));
    assert_eq!(config.target().unwrap(), DbTarget::File(path.clone()));

    let id = {
        let context = CatalogContext::connect(&config).unwrap();
        context
            .products()
            .create_product(&Product::new("Stapler", Decimal::new(1299, 2)).with_description("Full strip"))
            .unwrap()
    };

    let context = CatalogContext::connect(&config).unwrap();
    let loaded = context.products().get_product(id).unwrap().unwrap();
    assert_eq!(loaded.name, "Stapler");
    assert_eq!(loaded.price, Decimal::new(1299, 2));
    assert_eq!(loaded.description, "Full strip");
}

#[test]
fn connect_from_json_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("catalog.json");
    std::fs::write(
        &config_path,
        r#"{ "connection_string": "Data Source=:memory:", "busy_timeout_ms": 100 }"#,
    )
    .unwrap();

    let config = StoreConfig::from_file(&config_path).unwrap();
    assert_eq!(config.busy_timeout_ms, 100);
    let context = CatalogContext::connect(&config).unwrap();
    assert_eq!(context.products().count_products().unwrap(), 0);
}

#[test]
fn malformed_config_fails_construction() {
    let result = CatalogContext::connect(&StoreConfig::new("Server=db;User Id=sa"));
    assert!(matches!(
        result,
        Err(ContextError::Config(ConfigError::Malformed(_)))
    ));
}

#[test]
fn missing_config_file_fails_with_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = StoreConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn context_from_env_requires_connection_string() {
    if std::env::var_os(CONNECTION_STRING_ENV).is_some() {
        return;
    }

    let result = CatalogContext::from_env();
    assert!(matches!(
        result,
        Err(ContextError::Config(ConfigError::Missing(_)))
    ));
}

#[test]
fn unopenable_database_path_surfaces_db_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(format!(
        "Data Source={}",
        dir.path().join("missing-dir").join("catalog.db").display()
    ));

    let result = CatalogContext::connect(&config);
    assert!(matches!(result, Err(ContextError::Db(_))));
}
