//! SQLite-backed storage.

mod backend;
pub mod schema;

pub use backend::{SqliteStore, SqliteStoreConfig};
