pub mod auth;
pub mod extract;
pub mod records;
pub mod users;

use axum::Json;
use serde_json::{Value, json};

/// GET / -> liveness greeting; touches nothing else.
pub async fn root() -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}
