//! Common test utilities for integration tests
//!
//! Builds the full router over an in-memory database and a scripted
//! completion client, and mints bearer tokens for it.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;

use taskchat::adapters::completion::ScriptedCompletionClient;
use taskchat::adapters::http::{build_router, AppState};
use taskchat::adapters::sqlite::create_migrated_test_pool;
use taskchat::domain::models::{AuthConfig, Config};

pub const JWT_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub completion: ScriptedCompletionClient,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let pool = create_migrated_test_pool().await.expect("test pool");
        let completion = ScriptedCompletionClient::new();
        let state = AppState::new(pool.clone(), Arc::new(completion.clone()), &config);
        let router = build_router(state, &config.server.cors_origins);
        Self { router, pool, completion }
    }

    /// Send a request and return status plus JSON body (Null when empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn chat(&self, owner: &str, conversation_id: Option<i64>, message: &str) -> (StatusCode, Value) {
        let mut body = json!({ "message": message });
        if let Some(id) = conversation_id {
            body["conversation_id"] = json!(id);
        }
        self.post(&format!("/api/{owner}/chat"), &token_for(owner), body).await
    }
}

pub fn test_config() -> Config {
    Config {
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            ..AuthConfig::default()
        },
        ..Config::default()
    }
}

/// Token whose `user_id` claim is `owner`, valid for an hour.
pub fn token_for(owner: &str) -> String {
    sign(&json!({
        "user_id": owner,
        "exp": chrono::Utc::now().timestamp() + 3600,
    }))
}

pub fn sign(claims: &Value) -> String {
    encode(&Header::default(), claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}
