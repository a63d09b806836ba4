//! Shared fixtures for the mapping suite.
//!
//! Entities: `Order` (with `products` relationships), `Product` (listed by
//! category through the ref index) and `Session` (ephemeral, with a TTL).

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub use dynamap::{
    Clock, Descriptor, Error, Item, MarshalOptions, Marshaler, MemoryStore, RefMarshaler,
    RefUnmarshaler, Relationship, RelationshipContext, Result, StoreClient, Table, Unmarshaler,
};

pub const TABLE: &str = "shop";

static INIT_TRACING: Once = Once::new();

/// Install a test subscriber once
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub fn moment() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap()
}

/// Table and store sharing one movable clock
pub struct Fixture {
    pub table: Table,
    pub store: MemoryStore,
    pub clock: ManualClock,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let clock = ManualClock::new(moment());
        let table = Table::new(TABLE).with_clock(clock.clock());
        let store = MemoryStore::new().with_clock(clock.clock());
        Fixture { table, store, clock }
    }

    pub fn client(&self) -> Arc<dyn StoreClient> {
        Arc::new(self.store.clone())
    }
}

/// Clock a test can move forward
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock(Arc::new(Mutex::new(start)))
    }

    pub fn clock(&self) -> Clock {
        let now = Arc::clone(&self.0);
        Arc::new(move || *now.lock().unwrap())
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + chrono::Duration::from_std(by).unwrap();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub category: String,
    pub price: i64,
}

impl Marshaler for Product {
    fn marshal_self(&self, _opts: &MarshalOptions) -> Result<Descriptor> {
        if self.id.is_empty() {
            return Err(Error::entity("product id is required"));
        }
        Ok(Descriptor::self_target("product", &self.id).with_ref_sort_key(&self.category))
    }
}

impl Unmarshaler for Product {}

pub fn product(id: &str, category: &str) -> Product {
    Product {
        id: id.to_string(),
        category: category.to_string(),
        price: 100,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub purchased_by: String,
    #[serde(skip)]
    pub products: Vec<Product>,
    #[serde(skip)]
    pub product_ids: Vec<String>,
    #[serde(skip)]
    pub created: Option<DateTime<Utc>>,
}

impl Marshaler for Order {
    fn marshal_self(&self, _opts: &MarshalOptions) -> Result<Descriptor> {
        Ok(Descriptor::self_target("order", &self.id).with_created(self.created))
    }

    fn as_ref_marshaler(&self) -> Option<&dyn RefMarshaler> {
        Some(self)
    }
}

impl RefMarshaler for Order {
    fn marshal_refs(&self, ctx: &mut RelationshipContext<'_>) -> Result<()> {
        ctx.add_many("products", &self.products);
        Ok(())
    }
}

impl Unmarshaler for Order {
    fn unmarshal_self(&mut self, record: &Relationship) -> Result<()> {
        self.created = Some(record.created_at);
        Ok(())
    }
}

impl RefUnmarshaler for Order {
    fn unmarshal_ref(&mut self, name: &str, id: &str, _record: &Relationship) -> Result<()> {
        match name {
            "products" => {
                self.product_ids.push(id.to_string());
                Ok(())
            }
            other => Err(Error::entity(format!("unexpected relationship {}", other))),
        }
    }
}

pub fn order(id: &str, products: Vec<Product>) -> Order {
    Order {
        id: id.to_string(),
        purchased_by: "alice".to_string(),
        products,
        ..Default::default()
    }
}

/// Ephemeral entity expiring `ttl` after creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(skip)]
    pub ttl: Duration,
}

impl Marshaler for Session {
    fn marshal_self(&self, _opts: &MarshalOptions) -> Result<Descriptor> {
        Ok(Descriptor::self_target("session", &self.id)
            .with_ref_sort_key(&self.id)
            .with_time_to_live(self.ttl))
    }
}

impl Unmarshaler for Session {}

pub fn write(fixture: &Fixture, entity: &(impl Marshaler + Serialize)) {
    fixture
        .table
        .write_entity(&fixture.store, entity)
        .expect("write should succeed");
}

pub fn targets(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.get(dynamap::ATTR_TARGET).and_then(|v| v.as_str()))
        .map(str::to_string)
        .collect()
}
