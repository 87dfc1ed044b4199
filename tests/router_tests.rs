use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use pocketbook::config::DatabaseConfig;
use pocketbook::db::ConnectionProvider;
use pocketbook::db::models::DbUser;
use pocketbook::middleware::JwtKeys;
use pocketbook::router::{AppState, app_router};
use serde_json::Value;
use tower::ServiceExt;

const SECRET: &[u8] = b"router-test-secret";

/// Router whose database is a closed local port, so every connection attempt fails fast.
fn app_without_database() -> Router {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .expect("local addr")
        .port();
    let provider = ConnectionProvider::new(DatabaseConfig {
        host: "127.0.0.1".into(),
        user: "root".into(),
        password: "wrong".into(),
        database: "finance".into(),
        port: Some(port),
        connect_timeout_secs: 2,
    });
    app_router(AppState::new(provider, JwtKeys::new(SECRET, Duration::hours(1))))
}

fn token_for(user_id: i64) -> String {
    let user = DbUser {
        id: user_id,
        public_id: "4f1e0d1c-0000-4000-8000-000000000000".into(),
        username: "alice".into(),
        email: "alice@example.com".into(),
        password: String::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    JwtKeys::new(SECRET, Duration::hours(1))
        .issue(&user)
        .expect("issue token")
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.expect("request failed");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("response body was not json")
    };
    (status, json)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("failed to build request")
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

#[tokio::test]
async fn root_answers_without_database() {
    let (status, body) = send(app_without_database(), get("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Hello"], "World");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    for uri in [
        "/auth/me",
        "/incomes",
        "/expenses/1",
        "/transactions",
        "/budgets",
        "/savings-goals/3",
        "/users/1",
    ] {
        let (status, body) = send(app_without_database(), get(uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn tampered_token_is_treated_as_missing() {
    let forged = JwtKeys::new(b"someone-else", Duration::hours(1));
    let user = DbUser {
        id: 1,
        public_id: String::new(),
        username: "mallory".into(),
        email: "mallory@example.com".into(),
        password: String::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let token = forged.issue(&user).expect("issue token");

    let (status, _) = send(app_without_database(), get("/incomes", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unreachable_database_yields_503() {
    let token = token_for(1);
    let (status, body) = send(app_without_database(), get("/incomes", Some(&token))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");

    let (status, _) = send(
        app_without_database(),
        json_request(
            "POST",
            "/auth/login",
            None,
            r#"{"username_or_email":"alice","password":"hunter2"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_connecting() {
    let (status, body) = send(
        app_without_database(),
        json_request(
            "POST",
            "/auth/signup",
            None,
            r#"{"username":"alice","email":"not-an-email","password":"hunter2"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let token = token_for(1);
    let (status, _) = send(
        app_without_database(),
        json_request(
            "POST",
            "/budgets",
            Some(&token),
            r#"{"category":"food","amount_limit":"100","period_start":"2024-02-01","period_end":"2024-01-01"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn users_cannot_touch_other_accounts() {
    let token = token_for(1);
    let (status, body) = send(app_without_database(), get("/users/2", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let req = Request::builder()
        .method("DELETE")
        .uri("/users/2")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("failed to build request");
    let (status, _) = send(app_without_database(), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cors_preflight_allows_any_origin_with_credentials() {
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/incomes")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
        .body(Body::empty())
        .expect("failed to build request");

    let resp = app_without_database()
        .oneshot(req)
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
}

#[tokio::test]
async fn malformed_requests_get_the_error_body() {
    let token = token_for(1);
    let (status, body) = send(app_without_database(), get("/incomes/abc", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, body) = send(
        app_without_database(),
        json_request("POST", "/expenses", Some(&token), r#"{"amount":"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, body) = send(
        app_without_database(),
        json_request("POST", "/auth/login", None, r#"{"username_or_email":"alice"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn amounts_beyond_the_column_precision_are_rejected() {
    let token = token_for(1);
    for amount in ["\"12.345\"", "\"10000000000\""] {
        let (status, body) = send(
            app_without_database(),
            json_request(
                "POST",
                "/incomes",
                Some(&token),
                &format!(r#"{{"amount":{amount}}}"#),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{amount}");
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }
}

/// Router backed by the MySQL described by `HOST`, `USER`, `PASSWORD`, `DATABASE`
/// and `PORT`, with the tables created.
async fn app_with_live_database() -> Router {
    let cfg = DatabaseConfig::from_env().expect("live database config");
    let provider = ConnectionProvider::new(cfg);
    let mut conn = provider.connect().await.expect("connect to live database");
    pocketbook::db::init_schema(&mut conn)
        .await
        .expect("initialize schema");
    app_router(AppState::new(provider, JwtKeys::new(SECRET, Duration::hours(1))))
}

#[tokio::test]
#[ignore = "needs a live MySQL"]
async fn token_of_deleted_account_is_rejected() {
    let app = app_with_live_database().await;
    let name = format!("gone-{}", uuid::Uuid::new_v4().simple());
    let signup = format!(
        r#"{{"username":"{name}","email":"{name}@example.com","password":"hunter2"}}"#
    );
    let (status, body) = send(
        app.clone(),
        json_request("POST", "/auth/signup", None, &signup),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["auth"].as_str().expect("token").to_string();
    let id = body["user"]["id"].as_i64().expect("user id");

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/users/{id}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("failed to build request");
    let (status, _) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app.clone(),
        json_request("POST", "/incomes", Some(&token), r#"{"amount":"10.00"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(app, get("/incomes", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
