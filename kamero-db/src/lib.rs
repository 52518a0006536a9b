//! SQLite persistence for the Kamero license record.
//!
//! The installation's license lives in a single row of `product_key`,
//! seeded when the database is first opened. Every license operation runs as
//! one immediate transaction on that row, so concurrent requests are
//! serialized by SQLite itself as well as by the connection lock.
//!
//! The same database holds the host application's business tables. They are
//! created and owned by the host; this crate only empties them when a new key
//! is issued.

mod database;
mod error;

pub use database::{Database, BUSINESS_TABLES, DEFAULT_SITE_NAME, LICENSE_ROW_ID};
pub use error::{DbError, DbResult};
