//! Record store: connection management and page persistence.
//!
//! Layout:
//! - `connector.rs`: transport seam (open / ping / close), SQLite implementation
//! - `manager/`: the lazily connected, shared connection and its actor
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL applied on every fresh connection
//! - `store.rs`: page queries bounded by per-operation budgets

pub mod connector;
pub mod manager;
pub mod models;
pub mod schema;
pub mod store;

pub use connector::{Connector, SqliteConnector};
pub use manager::{
    ConnectionHandle, ConnectionManager, ConnectionState, HealthReport, ManagerSnapshot,
};
pub use models::{GeneratedPage, NewPage};
pub use schema::SQLITE_INIT;
pub use store::PageStore;
