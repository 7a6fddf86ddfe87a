mod common;

use axum::{
    body::Body,
    extract::FromRef,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{body_json, body_text, fake_state};
use food_ordering_api::{
    app::build_app, auth::jwt::JwtKeys, db::ConnectionState,
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

fn app(db: ConnectionState) -> (Router, JwtKeys) {
    let state = fake_state(db);
    let keys = JwtKeys::from_ref(&state);
    (build_app(state), keys)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn jwt_keys_come_from_app_state() {
    let (_, keys) = app(ConnectionState::Connected);
    let token = keys.sign_access(Uuid::new_v4()).unwrap();
    let claims = keys.verify(&token).unwrap();
    assert_eq!(claims.iss, "test-issuer");
    assert_eq!(claims.aud, "test-aud");
}

#[tokio::test]
async fn root_reports_database_state() {
    let (app, _) = app(ConnectionState::Disconnected);
    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Food Ordering API");
    assert_eq!(json["status"], "running");
    assert_eq!(json["database"], "disconnected");
}

#[tokio::test]
async fn health_returns_ok_with_fields() {
    let (app, _) = app(ConnectionState::Connected);
    let response = app.oneshot(get("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "connected");
    assert!(json["uptime"].as_f64().unwrap() >= 0.0);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    let ts = json["timestamp"].as_str().unwrap();
    assert!(time::OffsetDateTime::parse(ts, &time::format_description::well_known::Rfc3339).is_ok());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (app, _) = app(ConnectionState::Connected);
    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let (app, _) = app(ConnectionState::Connected);
    let request = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "https://shop.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    for uri in ["/api/cart", "/api/favorites", "/api/users/me"] {
        let (app, _) = app(ConnectionState::Connected);
        let response = app.oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn refresh_token_is_not_accepted_as_bearer() {
    let (app, keys) = app(ConnectionState::Connected);
    let refresh = keys.sign_refresh(Uuid::new_v4()).unwrap();
    let request = Request::builder()
        .uri("/api/cart")
        .header(header::AUTHORIZATION, format!("Bearer {refresh}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cart_rejects_bad_quantity() {
    let (app, keys) = app(ConnectionState::Connected);
    let token = keys.sign_access(Uuid::new_v4()).unwrap();
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/cart/add",
            Some(&token),
            json!({"foodId": Uuid::new_v4(), "quantity": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "quantity must be between 1 and 99");
}

#[tokio::test]
async fn review_rating_out_of_range() {
    let (app, keys) = app(ConnectionState::Connected);
    let token = keys.sign_access(Uuid::new_v4()).unwrap();
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/reviews/add",
            Some(&token),
            json!({"foodId": Uuid::new_v4(), "rating": 6}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_food_refuses_missing_fields() {
    let (app, _) = app(ConnectionState::Connected);
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/foods",
            None,
            json!({"description": "no name", "price": "free"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let text = body_text(response).await;
    assert!(text.contains("missing required fields: name, category"));
}

#[tokio::test]
async fn register_validates_before_touching_the_database() {
    let cases = [
        json!({"name": "", "email": "ann@example.com", "password": "longenough"}),
        json!({"name": "Ann", "email": "not-an-email", "password": "longenough"}),
        json!({"name": "Ann", "email": "ann@example.com", "password": "short"}),
    ];
    for body in cases {
        let (app, _) = app(ConnectionState::Connected);
        let response = app
            .oneshot(json_request(Method::POST, "/api/users/register", None, body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn database_errors_become_500() {
    let (app, _) = app(ConnectionState::Disconnected);
    let response = app.oneshot(get("/api/foods/categories")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Internal server error");
}
