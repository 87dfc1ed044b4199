pub mod auth;

pub use auth::{AuthUser, Claims, JwtKeys, jwt_context};
