//! Entity Flow Tests
//!
//! An order with two products is written as three records in the order's
//! partition and decoded back with its relationships in order.

use crate::common::*;
use dynamap::{
    split_label, unmarshal_entity, unmarshal_list, unmarshal_self, QueryEntity, Value,
    ATTR_CREATED, ATTR_LABEL, ATTR_SOURCE,
};

fn o1() -> Order {
    order("O1", vec![product("P1", "books"), product("P2", "games")])
}

#[test]
fn test_order_records_share_the_order_partition() {
    let fixture = Fixture::new();
    write(&fixture, &o1());

    let items = fixture.store.items(TABLE);
    assert_eq!(items.len(), 3);
    let triples: Vec<(String, String, String)> = items
        .iter()
        .map(|item| {
            let text = |name: &str| item.get(name).and_then(Value::as_str).unwrap().to_string();
            (text("hk"), text("sk"), text(ATTR_LABEL))
        })
        .collect();
    let expected = [
        ("order#O1", "order#O1", "order"),
        ("order#O1", "product#P1", "order/O1/products"),
        ("order#O1", "product#P2", "order/O1/products"),
    ];
    assert_eq!(triples.len(), expected.len());
    for ((hk, sk, label), (want_hk, want_sk, want_label)) in triples.iter().zip(expected) {
        assert_eq!((hk.as_str(), sk.as_str(), label.as_str()), (want_hk, want_sk, want_label));
    }
}

#[test]
fn test_order_round_trip_through_partition_query() {
    let fixture = Fixture::new();
    let original = o1();
    write(&fixture, &original);

    let request = fixture.table.marshal_query(&QueryEntity::new(&original)).unwrap();
    assert!(request.index_name.is_none());
    let output = fixture.store.query(request).unwrap();

    let mut loaded = Order::default();
    let records = unmarshal_entity(&output.items, &mut loaded, &fixture.table.options()).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(loaded.id, "O1");
    assert_eq!(loaded.purchased_by, "alice");
    assert_eq!(loaded.product_ids, vec!["P1", "P2"]);
    assert_eq!(loaded.created, Some(moment()));

    for record in records.iter().filter(|r| !r.is_self()) {
        let parts = split_label(&record.label, "/").unwrap();
        assert_eq!(parts.name, "products");
    }
}

#[test]
fn test_relationships_inherit_parent_created_time() {
    let fixture = Fixture::new();
    let mut original = o1();
    let created = moment() - chrono::Duration::days(3);
    original.created = Some(created);
    write(&fixture, &original);

    let expected = Value::from("2025-03-01T05:06:07.000000Z");
    for item in fixture.store.items(TABLE) {
        assert_eq!(item.get(ATTR_CREATED), Some(&expected));
    }
}

#[test]
fn test_self_only_entity_round_trip() {
    let fixture = Fixture::new();
    let p1 = product("P1", "books");
    fixture
        .store
        .put_item(fixture.table.marshal_put(&p1).unwrap())
        .unwrap();

    let item = fixture
        .store
        .get_item(fixture.table.marshal_get(&p1).unwrap())
        .unwrap()
        .unwrap();
    let (loaded, record): (Product, _) = unmarshal_self(&item).unwrap();
    assert_eq!(loaded, p1);
    assert!(record.is_self());
    assert_eq!(record.ref_sort_key, "books");
}

#[test]
fn test_put_skips_relationships() {
    let fixture = Fixture::new();
    let request = fixture.table.marshal_put(&o1()).unwrap();
    assert_eq!(request.item.get(ATTR_SOURCE), Some(&Value::from("order#O1")));
    fixture.store.put_item(request).unwrap();
    assert_eq!(fixture.store.len(TABLE), 1);
}

#[test]
fn test_delete_removes_only_the_self_record() {
    let fixture = Fixture::new();
    let original = o1();
    write(&fixture, &original);

    fixture
        .store
        .delete_item(fixture.table.marshal_delete(&original).unwrap())
        .unwrap();
    assert_eq!(fixture.store.len(TABLE), 2);
    let lookup = fixture.table.marshal_get(&original).unwrap();
    assert!(fixture.store.get_item(lookup).unwrap().is_none());
}

#[test]
fn test_empty_partition_is_not_found() {
    let fixture = Fixture::new();
    let request = fixture.table.marshal_query(&QueryEntity::new(&o1())).unwrap();
    let output = fixture.store.query(request).unwrap();
    let mut loaded = Order::default();
    let err = unmarshal_entity(&output.items, &mut loaded, &fixture.table.options()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_list_decoding_keeps_store_order() {
    let fixture = Fixture::new();
    for p in [product("P2", "games"), product("P1", "books"), product("P3", "art")] {
        write(&fixture, &p);
    }
    let request = fixture
        .table
        .marshal_query(&dynamap::QueryList::new("product"))
        .unwrap();
    let output = fixture.store.query(request).unwrap();

    let mut products: Vec<Product> = Vec::new();
    unmarshal_list(&output.items, &mut products).unwrap();
    let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["P3", "P1", "P2"]);
}

#[test]
fn test_invalid_entity_surfaces_marshal_error() {
    let fixture = Fixture::new();
    let broken = order("O1", vec![product("", "books")]);
    let err = fixture.table.write_entity(&fixture.store, &broken).unwrap_err();
    assert!(matches!(err, Error::Reference { .. }));
    assert!(fixture.store.is_empty(TABLE));
}

#[test]
fn test_delimiter_inside_id_is_rejected() {
    let fixture = Fixture::new();
    let err = fixture
        .table
        .marshal_put(&product("P#1", "books"))
        .unwrap_err();
    assert!(matches!(err, Error::Marshal { .. }));
}
