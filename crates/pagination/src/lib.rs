//! Pagination cursors for dynamap
//!
//! Store continuation tokens are persisted as short-lived `page` self
//! records and handed to callers as opaque cursor ids:
//! - paginator: `Paginator` trait and the table-backed `TablePaginator`
//! - cursor: the `PageCursor` entity and cursor id generation
//! - codec: `TokenCodec` for continuation tokens

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod cursor;
pub mod paginator;

pub use codec::TokenCodec;
pub use cursor::{generate_cursor, PageCursor, CURSOR_PREFIX};
pub use paginator::{Paginator, TablePaginator};
