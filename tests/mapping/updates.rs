//! Update Tests

use crate::common::*;
use dynamap::{
    attr, data_attribute, Condition, UpdateExpression, Updater, Value, ATTR_UPDATED,
};
use std::time::Duration;

struct Reprice {
    price: i64,
    only_if_category: Option<&'static str>,
}

impl Updater for Reprice {
    fn update_relationship(&self, update: UpdateExpression) -> UpdateExpression {
        update.set(&data_attribute("price"), self.price)
    }

    fn condition(&self) -> Option<Condition> {
        self.only_if_category
            .map(|category| attr(&data_attribute("category")).eq(category))
    }
}

#[test]
fn test_update_stamps_updated_at_and_returns_new_values() {
    let fixture = Fixture::new();
    let p1 = product("P1", "books");
    write(&fixture, &p1);
    fixture.clock.advance(Duration::from_secs(90));

    let reprice = Reprice {
        price: 250,
        only_if_category: None,
    };
    let request = fixture.table.marshal_update(&p1, Some(&reprice)).unwrap();
    let returned = fixture.store.update_item(request).unwrap();

    assert_eq!(
        returned.get(ATTR_UPDATED),
        Some(&Value::from("2025-03-04T05:07:37.000000Z"))
    );
    let price = returned
        .get("data")
        .and_then(Value::as_map)
        .and_then(|data| data.get("price"));
    assert_eq!(price, Some(&Value::Int(250)));

    let item = fixture
        .store
        .get_item(fixture.table.marshal_get(&p1).unwrap())
        .unwrap()
        .unwrap();
    let (loaded, _): (Product, _) = dynamap::unmarshal_self(&item).unwrap();
    assert_eq!(loaded.price, 250);
}

#[test]
fn test_closure_updater() {
    let fixture = Fixture::new();
    let p1 = product("P1", "books");
    write(&fixture, &p1);

    let updater = |update: UpdateExpression| update.set(&data_attribute("category"), "rare");
    let request = fixture.table.marshal_update(&p1, Some(&updater)).unwrap();
    fixture.store.update_item(request).unwrap();

    let item = fixture
        .store
        .get_item(fixture.table.marshal_get(&p1).unwrap())
        .unwrap()
        .unwrap();
    let (loaded, _): (Product, _) = dynamap::unmarshal_self(&item).unwrap();
    assert_eq!(loaded.category, "rare");
}

#[test]
fn test_failed_condition_leaves_item_unchanged() {
    let fixture = Fixture::new();
    let p1 = product("P1", "books");
    write(&fixture, &p1);

    let reprice = Reprice {
        price: 1,
        only_if_category: Some("games"),
    };
    let request = fixture.table.marshal_update(&p1, Some(&reprice)).unwrap();
    let err = fixture.store.update_item(request).unwrap_err();
    assert!(matches!(err, Error::ConditionFailed(_)));

    let item = fixture
        .store
        .get_item(fixture.table.marshal_get(&p1).unwrap())
        .unwrap()
        .unwrap();
    let (loaded, _): (Product, _) = dynamap::unmarshal_self(&item).unwrap();
    assert_eq!(loaded.price, 100);
}

#[test]
fn test_update_without_updater_is_configuration_error() {
    let fixture = Fixture::new();
    let err = fixture
        .table
        .marshal_update(&product("P1", "books"), None)
        .unwrap_err();
    assert!(err.to_string().contains("updater is required"));
}
