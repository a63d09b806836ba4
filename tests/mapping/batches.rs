//! Batch Tests
//!
//! Large entity graphs are written in chunks of at most 25 records, issued
//! one after another.

use crate::common::*;
use dynamap::{marshal_relationships, BatchWriteOutput, BatchWriteRequest, MAX_BATCH_SIZE};
use proptest::prelude::*;
use std::sync::Mutex;

fn big_order(products: usize) -> Order {
    let products = (0..products)
        .map(|i| product(&format!("P{i:03}"), "books"))
        .collect();
    order("O1", products)
}

#[test]
fn test_sixty_records_need_three_batches() {
    let fixture = Fixture::new();
    let batches = fixture.table.marshal_batch(&big_order(59)).unwrap();
    let sizes: Vec<usize> = batches.iter().map(|b| b.items.len()).collect();
    assert_eq!(sizes, vec![25, 25, 10]);
    assert!(batches.iter().all(|b| b.table_name == TABLE));
}

#[test]
fn test_large_graph_is_fully_written() {
    let fixture = Fixture::new();
    let output = fixture
        .table
        .write_entity(&fixture.store, &big_order(59))
        .unwrap();
    assert!(output.unprocessed.is_empty());
    assert_eq!(fixture.store.len(TABLE), 60);
}

#[test]
fn test_oversize_batch_is_rejected_by_store() {
    let fixture = Fixture::new();
    let items: Vec<Item> = marshal_relationships(&big_order(25), &fixture.table.options())
        .unwrap()
        .iter()
        .map(Relationship::to_item)
        .collect();
    let err = fixture
        .store
        .batch_write(BatchWriteRequest {
            table_name: TABLE.to_string(),
            items,
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
}

/// Store that fails the n-th batch call
struct FailingStore {
    inner: MemoryStore,
    fail_on: usize,
    calls: Mutex<usize>,
}

impl StoreClient for FailingStore {
    fn put_item(&self, request: dynamap::PutRequest) -> Result<()> {
        self.inner.put_item(request)
    }

    fn batch_write(&self, request: BatchWriteRequest) -> Result<BatchWriteOutput> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls == self.fail_on {
            return Err(Error::store("throttled"));
        }
        self.inner.batch_write(request)
    }

    fn get_item(&self, request: dynamap::GetRequest) -> Result<Option<Item>> {
        self.inner.get_item(request)
    }

    fn delete_item(&self, request: dynamap::DeleteRequest) -> Result<()> {
        self.inner.delete_item(request)
    }

    fn update_item(&self, request: dynamap::UpdateRequest) -> Result<Item> {
        self.inner.update_item(request)
    }

    fn query(&self, request: dynamap::QueryRequest) -> Result<dynamap::QueryOutput> {
        self.inner.query(request)
    }
}

#[test]
fn test_failed_batch_stops_without_rollback() {
    let fixture = Fixture::new();
    let store = FailingStore {
        inner: fixture.store.clone(),
        fail_on: 2,
        calls: Mutex::new(0),
    };
    let err = fixture.table.write_entity(&store, &big_order(59)).unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert_eq!(*store.calls.lock().unwrap(), 2);
    assert_eq!(fixture.store.len(TABLE), 25);
}

proptest! {
    #[test]
    fn prop_chunking_preserves_records(products in 0usize..120) {
        let fixture = Fixture::new();
        let entity = big_order(products);
        let records = marshal_relationships(&entity, &fixture.table.options()).unwrap();
        let batches = fixture.table.batch_requests(&records);

        let expected_batches = (records.len() + MAX_BATCH_SIZE - 1) / MAX_BATCH_SIZE;
        prop_assert_eq!(batches.len(), expected_batches);
        prop_assert!(batches.iter().all(|b| !b.items.is_empty() && b.items.len() <= MAX_BATCH_SIZE));

        let flattened: Vec<Item> = batches.into_iter().flat_map(|b| b.items).collect();
        let expected: Vec<Item> = records.iter().map(Relationship::to_item).collect();
        prop_assert_eq!(flattened, expected);
    }
}
