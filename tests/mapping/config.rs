//! Table Configuration Tests

use crate::common::*;
use dynamap::{QueryList, TableConfig};
use tempfile::TempDir;

#[test]
fn test_table_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dynamap.toml");
    std::fs::write(
        &path,
        r#"
table_name = "catalog"
ref_index_name = "by-label"
key_delimiter = ":"
label_delimiter = "|"
pagination_ttl_secs = 60
"#,
    )
    .unwrap();

    let config = TableConfig::from_file(&path).unwrap();
    let table = Table::from_config(&config).unwrap();
    assert_eq!(table.table_name, "catalog");
    assert_eq!(table.pagination_ttl.as_secs(), 60);

    let request = table.marshal_put(&product("P1", "books")).unwrap();
    assert_eq!(request.item.get("hk").and_then(|v| v.as_str()), Some("product:P1"));

    let query = QueryList::relationship("order", "O1", "products", &table.options());
    let request = table.marshal_query(&query).unwrap();
    assert_eq!(request.index_name.as_deref(), Some("by-label"));
    assert_eq!(
        request.key_condition.partition_value.as_str(),
        Some("order|O1|products")
    );
}

#[test]
fn test_custom_index_name_round_trip_through_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dynamap.toml");
    let mut config = TableConfig::new(TABLE);
    config.ref_index_name = "by-label".to_string();
    config.write_to_file(&path).unwrap();

    let table = Table::from_config(&TableConfig::from_file(&path).unwrap()).unwrap();
    let store = MemoryStore::new().with_ref_index_name("by-label");
    table.write_entity(&store, &product("P1", "books")).unwrap();

    let output = store
        .query(table.marshal_query(&QueryList::new("product")).unwrap())
        .unwrap();
    assert_eq!(targets(&output.items), vec!["product#P1"]);
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = TableConfig::from_toml_str("table_name = \"shop\"\nkey_delimiter = \"/\"").unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}
