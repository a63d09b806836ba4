//! Pagination Tests
//!
//! A query page's continuation token is swapped for a cursor id, and the
//! cursor id is later resolved back into the start key of the next page.

use crate::common::*;
use dynamap::{Paginator, QueryList, TablePaginator, CURSOR_PREFIX};
use std::time::Duration;

fn seed(fixture: &Fixture, count: usize) {
    for i in 0..count {
        write(fixture, &product(&format!("P{i:02}"), &format!("c{:02}", i % 4)));
    }
}

fn page(fixture: &Fixture, paginator: &TablePaginator, cursor: &str) -> (Vec<String>, String) {
    let query = QueryList::new("product")
        .with_limit(3)
        .with_start_key(paginator.start_key(cursor).unwrap());
    let output = fixture
        .store
        .query(fixture.table.marshal_query(&query).unwrap())
        .unwrap();
    let next = paginator
        .page_cursor(output.last_evaluated_key.as_ref())
        .unwrap();
    (targets(&output.items), next)
}

#[test]
fn test_walk_every_page_through_cursors() {
    let fixture = Fixture::new();
    seed(&fixture, 8);
    let paginator = TablePaginator::new(fixture.table.clone(), fixture.client());

    let mut seen = Vec::new();
    let mut cursor = String::new();
    let mut pages = 0;
    loop {
        let (targets, next) = page(&fixture, &paginator, &cursor);
        seen.extend(targets);
        pages += 1;
        if next.is_empty() {
            break;
        }
        cursor = next;
    }
    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 8);
    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 8);
}

#[test]
fn test_cursor_records_do_not_mix_with_entities() {
    let fixture = Fixture::new();
    seed(&fixture, 4);
    let paginator = TablePaginator::new(fixture.table.clone(), fixture.client());
    let (_, cursor) = page(&fixture, &paginator, "");
    assert!(!cursor.is_empty());

    let cursors = fixture
        .store
        .query(fixture.table.marshal_query(&QueryList::new(CURSOR_PREFIX)).unwrap())
        .unwrap();
    assert_eq!(cursors.items.len(), 1);

    let products = fixture
        .store
        .query(fixture.table.marshal_query(&QueryList::new("product")).unwrap())
        .unwrap();
    assert_eq!(products.items.len(), 4);
}

#[test]
fn test_cursor_expires_with_table_ttl() {
    let fixture = Fixture::new();
    seed(&fixture, 4);
    let table = fixture.table.clone().with_pagination_ttl(Duration::from_secs(600));
    let paginator = TablePaginator::new(table, fixture.client());
    let (_, cursor) = page(&fixture, &paginator, "");
    assert!(paginator.start_key(&cursor).unwrap().is_some());

    fixture.clock.advance(Duration::from_secs(601));
    assert_eq!(paginator.start_key(&cursor).unwrap(), None);
}

#[test]
fn test_last_page_issues_no_cursor() {
    let fixture = Fixture::new();
    seed(&fixture, 2);
    let paginator = TablePaginator::new(fixture.table.clone(), fixture.client());
    let (targets, cursor) = page(&fixture, &paginator, "");
    assert_eq!(targets.len(), 2);
    assert_eq!(cursor, "");
    assert_eq!(fixture.store.len(TABLE), 2);
}
