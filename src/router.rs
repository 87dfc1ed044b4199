use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::ConnectionProvider;
use crate::db::models::{DbBudget, DbExpense, DbIncome, DbSavingsGoal, DbTransaction};
use crate::handlers::{self, auth, records, users};
use crate::middleware::{JwtKeys, jwt_context};

#[derive(Clone)]
pub struct AppState {
    pub provider: ConnectionProvider,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(provider: ConnectionProvider, jwt: JwtKeys) -> Self {
        Self {
            provider,
            jwt: Arc::new(jwt),
        }
    }
}

/// Any origin, method and header, with credentials.
///
/// Browsers refuse a literal `*` together with credentials, so the request's own
/// values are mirrored back instead.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn app_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/users", post(users::create))
        .route(
            "/users/{id}",
            get(users::fetch).patch(users::update).delete(users::remove),
        );

    let router = records::routes::<DbIncome>(router);
    let router = records::routes::<DbExpense>(router);
    let router = records::routes::<DbTransaction>(router);
    let router = records::routes::<DbBudget>(router);
    let router = records::routes::<DbSavingsGoal>(router);

    router
        .layer(from_fn_with_state(state.jwt.clone(), jwt_context))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
