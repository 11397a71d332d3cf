#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, HeaderMap, Method, Request, StatusCode},
    Router,
};
use config::AppConfig;
use infrastructure::Infrastructure;
use serde_json::Value;
use tower::ServiceExt;
use web_api::{router, AppState, AUTH_TOKEN_HEADER};

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// 内存存储 + 最低 bcrypt cost 的完整路由
pub fn build_router() -> Router {
    let config = AppConfig::default();
    // bcrypt 允许的最低 cost，测试专用
    let infrastructure = Infrastructure::in_memory(Some(4));
    router(AppState::from_infrastructure(&infrastructure, &config))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTH_TOKEN_HEADER, token);
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn register(app: &Router, username: &str, password: &str) -> Value {
    let response = send(
        app,
        Method::POST,
        "/users",
        None,
        Some(serde_json::json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": password,
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body
}

pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    response
        .headers
        .get(AUTH_TOKEN_HEADER)
        .expect("auth-token header")
        .to_str()
        .expect("ascii token")
        .to_string()
}
