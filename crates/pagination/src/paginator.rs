//! Paginator: continuation tokens behind opaque cursor ids

use std::sync::Arc;

use tracing::{debug, warn};

use dynamap_core::{Item, Result, StoreClient};
use dynamap_engine::{unmarshal_self, Table};

use crate::codec::TokenCodec;
use crate::cursor::{generate_cursor, PageCursor};

/// Exchanges store continuation tokens for cursor ids and back
pub trait Paginator {
    /// Persist `token` and return its cursor id
    ///
    /// A missing or empty token yields `""` and writes nothing.
    fn page_cursor(&self, token: Option<&Item>) -> Result<String>;

    /// Resolve a cursor id to the token it was issued for
    ///
    /// `""`, unknown and expired cursors resolve to `None`.
    fn start_key(&self, cursor: &str) -> Result<Option<Item>>;
}

/// Paginator persisting cursors as self records in a table
#[derive(Clone)]
pub struct TablePaginator {
    table: Table,
    client: Arc<dyn StoreClient>,
}

impl std::fmt::Debug for TablePaginator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TablePaginator")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl TablePaginator {
    /// Paginator writing cursors to `table` through `client`
    pub fn new(table: Table, client: Arc<dyn StoreClient>) -> Self {
        TablePaginator { table, client }
    }

    /// Table cursors are written to
    pub fn table(&self) -> &Table {
        &self.table
    }
}

impl Paginator for TablePaginator {
    fn page_cursor(&self, token: Option<&Item>) -> Result<String> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(String::new()),
        };

        let cursor = generate_cursor((self.table.clock())());
        let page = PageCursor::new(
            cursor.clone(),
            TokenCodec::encode(token)?,
            self.table.pagination_ttl,
        );
        let request = self.table.marshal_put(&page)?;
        self.client.put_item(request)?;

        debug!(
            target: "dynamap::pagination",
            cursor = %cursor,
            ttl_secs = self.table.pagination_ttl.as_secs(),
            "Issued page cursor"
        );
        Ok(cursor)
    }

    fn start_key(&self, cursor: &str) -> Result<Option<Item>> {
        if cursor.is_empty() {
            return Ok(None);
        }
        // issued cursors never contain a delimiter, so such a cursor is unknown
        if cursor.contains(self.table.key_delimiter.as_str())
            || cursor.contains(self.table.label_delimiter.as_str())
        {
            debug!(target: "dynamap::pagination", cursor = %cursor, "Unknown page cursor");
            return Ok(None);
        }

        let request = self.table.marshal_get(&PageCursor::lookup(cursor))?;
        let item = match self.client.get_item(request)? {
            Some(item) => item,
            None => {
                debug!(target: "dynamap::pagination", cursor = %cursor, "Unknown page cursor");
                return Ok(None);
            }
        };

        let (page, _) = unmarshal_self::<PageCursor>(&item)?;
        if page.key.is_empty() {
            return Ok(None);
        }
        let token = TokenCodec::decode(&page.key).map_err(|e| {
            warn!(
                target: "dynamap::pagination",
                cursor = %cursor,
                error = %e,
                "Malformed page cursor payload"
            );
            e
        })?;

        debug!(target: "dynamap::pagination", cursor = %cursor, "Resolved page cursor");
        Ok(Some(token))
    }
}
