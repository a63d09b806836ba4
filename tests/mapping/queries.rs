//! Query Tests
//!
//! Partition queries (`QueryEntity`) read one entity's records from the
//! primary key; list queries (`QueryList`) read every record carrying a label
//! through the ref index.

use crate::common::*;
use dynamap::{attr, filters, QueryEntity, QueryList, SortKeyCondition, ATTR_REF_SORT_KEY};
use std::time::Duration;

fn seed(fixture: &Fixture) -> Order {
    let o1 = order(
        "O1",
        vec![
            product("P1", "books"),
            product("P2", "games"),
            product("P3", "art"),
        ],
    );
    write(fixture, &o1);
    o1
}

#[test]
fn test_relationship_list_uses_ref_index_in_sort_key_order() {
    let fixture = Fixture::new();
    seed(&fixture);

    let query = QueryList::relationship("order", "O1", "products", &fixture.table.options());
    let request = fixture.table.marshal_query(&query).unwrap();
    assert_eq!(request.index_name.as_deref(), Some("ref-index"));

    let output = fixture.store.query(request).unwrap();
    assert_eq!(targets(&output.items), vec!["product#P3", "product#P1", "product#P2"]);
}

#[test]
fn test_list_ref_sort_condition_and_descending() {
    let fixture = Fixture::new();
    seed(&fixture);

    let query = QueryList::new("order/O1/products")
        .with_ref_sort(SortKeyCondition::Ge("books".into()))
        .descending();
    let output = fixture
        .store
        .query(fixture.table.marshal_query(&query).unwrap())
        .unwrap();
    assert_eq!(targets(&output.items), vec!["product#P2", "product#P1"]);
}

#[test]
fn test_entity_query_target_prefix() {
    let fixture = Fixture::new();
    let o1 = seed(&fixture);

    let opts = fixture.table.options();
    let query = QueryEntity::new(&o1).with_target_prefix("product", &opts);
    let output = fixture
        .store
        .query(fixture.table.marshal_query(&query).unwrap())
        .unwrap();
    assert_eq!(targets(&output.items), vec!["product#P1", "product#P2", "product#P3"]);
}

#[test]
fn test_filter_is_applied_after_limit() {
    let fixture = Fixture::new();
    let o1 = seed(&fixture);

    let query = QueryEntity::new(&o1)
        .with_filter(attr(ATTR_REF_SORT_KEY).eq("art"))
        .with_limit(2);
    let output = fixture
        .store
        .query(fixture.table.marshal_query(&query).unwrap())
        .unwrap();
    assert!(output.items.is_empty());
    assert!(output.last_evaluated_key.is_some());

    let next = query.with_start_key(output.last_evaluated_key);
    let output = fixture
        .store
        .query(fixture.table.marshal_query(&next).unwrap())
        .unwrap();
    assert_eq!(targets(&output.items), vec!["product#P3"]);
    assert!(output.last_evaluated_key.is_none());
}

#[test]
fn test_list_paging_with_start_key() {
    let fixture = Fixture::new();
    seed(&fixture);

    let mut seen = Vec::new();
    let mut start = None;
    loop {
        let query = QueryList::new("order/O1/products")
            .with_limit(1)
            .with_start_key(start.take());
        let output = fixture
            .store
            .query(fixture.table.marshal_query(&query).unwrap())
            .unwrap();
        seen.extend(targets(&output.items));
        match output.last_evaluated_key {
            Some(key) => start = Some(key),
            None => break,
        }
    }
    assert_eq!(seen, vec!["product#P3", "product#P1", "product#P2"]);
}

#[test]
fn test_created_window_filters() {
    let fixture = Fixture::new();
    write(&fixture, &product("P1", "books"));
    fixture.clock.advance(Duration::from_secs(3600));
    write(&fixture, &product("P2", "books"));

    let cutoff = moment() + chrono::Duration::minutes(30);
    let query = QueryList::new("product").with_filter(filters::created_after(cutoff));
    let output = fixture
        .store
        .query(fixture.table.marshal_query(&query).unwrap())
        .unwrap();
    assert_eq!(targets(&output.items), vec!["product#P2"]);

    let query = QueryList::new("product")
        .with_filter(filters::min_age(Duration::from_secs(1800), fixture.table.clock()));
    let output = fixture
        .store
        .query(fixture.table.marshal_query(&query).unwrap())
        .unwrap();
    assert_eq!(targets(&output.items), vec!["product#P1"]);
}

#[test]
fn test_expiring_records_drop_out_of_queries() {
    let fixture = Fixture::new();
    let session = Session {
        id: "S1".to_string(),
        ttl: Duration::from_secs(60),
    };
    write(&fixture, &session);
    write(&fixture, &Session { id: "S2".to_string(), ttl: Duration::ZERO });

    let expiring = QueryList::new("session").with_filter(filters::expires_in(
        Duration::from_secs(120),
        fixture.table.clock(),
    ));
    let output = fixture
        .store
        .query(fixture.table.marshal_query(&expiring).unwrap())
        .unwrap();
    assert_eq!(targets(&output.items), vec!["session#S1"]);

    fixture.clock.advance(Duration::from_secs(60));
    let output = fixture
        .store
        .query(fixture.table.marshal_query(&QueryEntity::new(&session)).unwrap())
        .unwrap();
    assert!(output.items.is_empty());
    assert_eq!(fixture.store.sweep_expired(), 1);
    assert_eq!(fixture.store.len(TABLE), 1);
}

#[test]
fn test_empty_label_fails_planning() {
    let fixture = Fixture::new();
    let err = fixture.table.marshal_query(&QueryList::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
}
