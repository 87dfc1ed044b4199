pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;

pub use config::AppConfig;
pub use db::{ConnectionError, ConnectionProvider, create_connection};
pub use error::AppError;
