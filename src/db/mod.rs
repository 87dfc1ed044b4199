//! Database module: connection provider, models, schema and queries.
//!
//! Layout:
//! - `connection.rs`: opens one MySQL connection per call
//! - `models.rs`: Rust structs mirroring DB rows, plus request inputs
//! - `schema.rs`: MySQL DDL for bootstrapping the tables
//! - `users.rs` / `ledger.rs`: queries, one connection borrowed per call

pub mod connection;
pub mod ledger;
pub mod models;
pub mod schema;
pub mod users;

pub use connection::{ConnectionError, ConnectionProvider, create_connection};
pub use ledger::Record;
pub use schema::{MYSQL_INIT, init_schema};
