use anyhow::Result;
use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use jsonwebtoken::Algorithm;
use metrics_exporter_prometheus::PrometheusBuilder;
use pizzeria_api::{AppState, create_router};
use pizzeria_auth::{TokenCodec, TokenSettings};
use pizzeria_db::Database;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

// ─── Test helpers ───────────────────────────────────────────────────────

const SECRET: &str = "integration-test-secret";

async fn setup() -> Result<(Router, Database, Arc<TokenCodec>)> {
    let db = Database::in_memory().await?;
    let tokens = Arc::new(TokenCodec::new(&TokenSettings::new(
        SECRET,
        vec![Algorithm::HS256],
    ))?);
    let state = AppState::new(db.clone(), tokens.clone());
    Ok((create_router(state, None), db, tokens))
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "grant_type=password&username={}&password={}",
            username, password
        )))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn signup(router: &Router, username: &str, email: &str, staff: bool) -> Result<Value> {
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            json!({
                "username": username,
                "email": email,
                "password": "pw1",
                "is_staff": staff,
            }),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(body_json(response).await)
}

async fn login(router: &Router, username: &str) -> Result<Value> {
    let response = router.clone().oneshot(login_request(username, "pw1")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(body_json(response).await)
}

async fn access_token(router: &Router, username: &str) -> Result<String> {
    let body = login(router, username).await?;
    Ok(body["access_token"].as_str().unwrap().to_string())
}

// ─── Authentication ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_signup_login_me_flow() -> Result<()> {
    let (router, _db, _tokens) = setup().await?;

    let created = signup(&router, "alice", "a@x.com", false).await?;
    assert_eq!(created["username"], "alice");
    assert_eq!(created["email"], "a@x.com");
    assert_eq!(created["is_staff"], false);
    assert_eq!(created["is_active"], true);
    assert!(created.get("password_hash").is_none());
    assert!(created.get("password").is_none());

    let body = login(&router, "alice").await?;
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 15 * 60);
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["refresh_token"].as_str().is_some());
    let token = body["access_token"].as_str().unwrap();

    let response = router.clone().oneshot(get("/auth/user/me", Some(token))).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["username"], "alice");
    assert_eq!(me["id"], created["id"]);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() -> Result<()> {
    let (router, _db, _tokens) = setup().await?;
    signup(&router, "alice", "a@x.com", false).await?;

    for body in [
        json!({"username": "alice", "email": "other@x.com", "password": "pw2"}),
        json!({"username": "bob", "email": "a@x.com", "password": "pw2"}),
    ] {
        let response = router
            .clone()
            .oneshot(json_request("POST", "/auth/signup", body, None))
            .await?;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    Ok(())
}

#[tokio::test]
async fn test_signup_rejects_invalid_input() -> Result<()> {
    let (router, _db, _tokens) = setup().await?;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            json!({"username": "alice", "email": "not-an-email", "password": "pw1"}),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_login_failures_are_generic() -> Result<()> {
    let (router, _db, _tokens) = setup().await?;
    signup(&router, "alice", "a@x.com", false).await?;

    let wrong_password = router.clone().oneshot(login_request("alice", "wrong")).await?;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong_password.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    let wrong_password = body_json(wrong_password).await;

    let unknown_user = router.clone().oneshot(login_request("nobody", "pw1")).await?;
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    let unknown_user = body_json(unknown_user).await;

    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password["detail"], "Incorrect username or password");

    Ok(())
}

#[tokio::test]
async fn test_session_gate_rejections() -> Result<()> {
    let (router, db, tokens) = setup().await?;
    let created = signup(&router, "alice", "a@x.com", false).await?;
    let user_id = created["id"].as_i64().unwrap();

    let missing = router.clone().oneshot(get("/auth/user/me", None)).await?;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        missing.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    let missing = body_json(missing).await;

    let malformed = router
        .clone()
        .oneshot(get("/auth/user/me", Some("garbage")))
        .await?;
    assert_eq!(malformed.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(malformed).await, missing);

    let expired = tokens.issue_access("alice", user_id, Some(chrono::Duration::seconds(-5)))?;
    let response = router
        .clone()
        .oneshot(get("/auth/user/me", Some(&expired)))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, missing);

    // The scheme name is case-insensitive, as echoed back from `token_type`
    let token = access_token(&router, "alice").await?;
    let lowercase = Request::builder()
        .uri("/auth/user/me")
        .header(header::AUTHORIZATION, format!("bearer {}", token))
        .body(Body::empty())?;
    let response = router.clone().oneshot(lowercase).await?;
    assert_eq!(response.status(), StatusCode::OK);

    // A still-valid token for a user that no longer exists
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(db.pool())
        .await?;
    let response = router.clone().oneshot(get("/auth/user/me", Some(&token))).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_malformed_requests_use_detail_body() -> Result<()> {
    let (router, _db, _tokens) = setup().await?;
    signup(&router, "alice", "a@x.com", false).await?;
    let token = access_token(&router, "alice").await?;

    // Missing required field
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            json!({"username": "bob"}),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["detail"].is_string());

    // Wrong content type
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/signup")
                .body(Body::from("username=bob"))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body_json(response).await["detail"].is_string());

    // Login form without a password
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=alice"))?,
        )
        .await?;
    assert!(response.status().is_client_error());
    assert!(body_json(response).await["detail"].is_string());

    // Non-numeric order id
    let response = router
        .clone()
        .oneshot(get("/order/user/order/abc", Some(&token)))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["detail"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_refresh_issues_new_pair() -> Result<()> {
    let (router, _db, _tokens) = setup().await?;
    signup(&router, "alice", "a@x.com", false).await?;
    let body = login(&router, "alice").await?;
    let refresh_token = body["refresh_token"].as_str().unwrap();
    let access = body["access_token"].as_str().unwrap();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/refresh",
            json!({"refresh_token": refresh_token}),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed = body_json(response).await;
    assert_eq!(refreshed["user"]["username"], "alice");

    let new_access = refreshed["access_token"].as_str().unwrap();
    let response = router
        .clone()
        .oneshot(get("/auth/user/me", Some(new_access)))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // Access tokens are not refresh tokens, and the reverse
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/refresh",
            json!({"refresh_token": access}),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(get("/auth/user/me", Some(refresh_token)))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

// ─── Orders ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_customer_order_lifecycle() -> Result<()> {
    let (router, _db, _tokens) = setup().await?;
    signup(&router, "alice", "a@x.com", false).await?;
    signup(&router, "bob", "b@x.com", false).await?;
    let alice = access_token(&router, "alice").await?;
    let bob = access_token(&router, "bob").await?;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/order/order",
            json!({"quantity": 2, "pizza_size": "Large"}),
            Some(&alice),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert_eq!(order["order_status"], "Pending");
    assert_eq!(order["pizza_size"], "Large");
    let order_id = order["id"].as_i64().unwrap();

    let response = router
        .clone()
        .oneshot(get("/order/user/orders", Some(&alice)))
        .await?;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    // Bob cannot see or touch Alice's order
    let uri = format!("/order/user/order/{}", order_id);
    let response = router.clone().oneshot(get(&uri, Some(&bob))).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let update_uri = format!("/order/order/update/{}", order_id);
    let response = router
        .clone()
        .oneshot(json_request(
            "PATCH",
            &update_uri,
            json!({"quantity": 5, "pizza_size": "Small"}),
            Some(&bob),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .clone()
        .oneshot(json_request(
            "PATCH",
            &update_uri,
            json!({"quantity": 3, "pizza_size": "Extra_large"}),
            Some(&alice),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["quantity"], 3);
    assert_eq!(updated["pizza_size"], "Extra_large");

    let delete_uri = format!("/order/order/delete/{}", order_id);
    let response = router
        .clone()
        .oneshot(json_request("DELETE", &delete_uri, json!({}), Some(&alice)))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router.clone().oneshot(get(&uri, Some(&alice))).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_orders_require_authentication() -> Result<()> {
    let (router, _db, _tokens) = setup().await?;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/order/order",
            json!({"quantity": 1}),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router.clone().oneshot(get("/order/all/orders", None)).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_staff_only_routes() -> Result<()> {
    let (router, _db, _tokens) = setup().await?;
    signup(&router, "alice", "a@x.com", false).await?;
    signup(&router, "chef", "chef@x.com", true).await?;
    let alice = access_token(&router, "alice").await?;
    let chef = access_token(&router, "chef").await?;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/order/order",
            json!({"quantity": 1}),
            Some(&alice),
        ))
        .await?;
    let order_id = body_json(response).await["id"].as_i64().unwrap();

    let response = router
        .clone()
        .oneshot(get("/order/all/orders", Some(&alice)))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .clone()
        .oneshot(get(&format!("/order/order/{}", order_id), Some(&alice)))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let status_uri = format!("/order/order/status/{}", order_id);
    let response = router
        .clone()
        .oneshot(json_request(
            "PATCH",
            &status_uri,
            json!({"order_status": "Delivered"}),
            Some(&alice),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .clone()
        .oneshot(get("/order/all/orders", Some(&chef)))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = router
        .clone()
        .oneshot(json_request(
            "PATCH",
            &status_uri,
            json!({"order_status": "In_transit"}),
            Some(&chef),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["order_status"], "In_transit");

    let response = router
        .clone()
        .oneshot(get(&format!("/order/order/{}", order_id), Some(&chef)))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["user_id"].as_i64().is_some());

    let response = router
        .clone()
        .oneshot(get("/order/order/9999", Some(&chef)))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

// ─── Misc ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_and_metrics() -> Result<()> {
    let db = Database::in_memory().await?;
    let tokens = Arc::new(TokenCodec::new(&TokenSettings::new(
        SECRET,
        vec![Algorithm::HS256],
    ))?);
    let handle = PrometheusBuilder::new().build_recorder().handle();
    let router = create_router(AppState::new(db, tokens), Some(Arc::new(handle)));

    let response = router.clone().oneshot(get("/health", None)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = router.clone().oneshot(get("/metrics", None)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}
