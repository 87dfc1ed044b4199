use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use headers::authorization::Bearer;
use headers::{Authorization, HeaderMapExt};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::MySqlConnection;
use std::sync::Arc;
use tracing::warn;

use crate::db::models::DbUser;
use crate::db::users;
use crate::error::AppError;

/// Claims carried by every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing material and token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, user: &DbUser) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

/// Attach the claims of a valid bearer token to the request.
///
/// Requests without a usable token continue unauthenticated; [`AuthUser`] decides
/// whether a route needs one.
pub async fn jwt_context(
    State(keys): State<Arc<JwtKeys>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(auth) = req.headers().typed_get::<Authorization<Bearer>>() {
        match keys.verify(auth.token()) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
            }
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                warn!("Token has expired");
            }
            Err(e) => {
                warn!(error = %e, "Invalid token");
            }
        }
    }
    next.run(req).await
}

/// Extractor for routes that require an authenticated user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> i64 {
        self.0.sub
    }

    /// Users may only act on their own account.
    pub fn ensure_self(&self, user_id: i64) -> Result<(), AppError> {
        if self.user_id() == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden("Wrong User ID."))
        }
    }

    /// Load the account behind the token; a token can outlive its account.
    pub async fn account(&self, conn: &mut MySqlConnection) -> Result<DbUser, AppError> {
        users::find_by_id(conn, self.user_id())
            .await?
            .ok_or(AppError::Unauthorized(
                "Authentication required or token expired",
            ))
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Self)
            .ok_or(AppError::Unauthorized(
                "Authentication required or token expired",
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> DbUser {
        DbUser {
            id: 7,
            public_id: "b1c2".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies() {
        let keys = JwtKeys::new(b"secret", Duration::hours(72));
        let token = keys.issue(&user()).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 72 * 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = JwtKeys::new(b"secret", Duration::hours(1));
        let verifier = JwtKeys::new(b"other", Duration::hours(1));
        let token = issuer.issue(&user()).unwrap();
        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::new(b"secret", Duration::hours(1));
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 7,
            username: "alice".into(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn ensure_self_rejects_other_users() {
        let auth = AuthUser(Claims {
            sub: 7,
            username: "alice".into(),
            iat: 0,
            exp: 0,
        });
        assert!(auth.ensure_self(7).is_ok());
        assert!(matches!(auth.ensure_self(8), Err(AppError::Forbidden(_))));
    }
}
