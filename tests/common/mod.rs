#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use onec_bridge::config::AppConfig;
use onec_bridge::db::run_migrations;
use onec_bridge::entities::{order, product};
use onec_bridge::{app_router, AppState};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Test double of the full application: in-memory database, real router.
pub struct TestApp {
    pub router: Router,
    pub db: Arc<DatabaseConnection>,
}

/// Base config for tests; 1C points at a closed port so anything that
/// accidentally calls out fails fast.
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "warn".to_string(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 5,
        api_keys: None,
        admin_api_keys: None,
        onec_base_url: "http://127.0.0.1:9/1c_mock/hs/exchange".to_string(),
        onec_username: "user1c".to_string(),
        onec_password: "password1c".to_string(),
        onec_catalog_timeout_secs: 1,
        onec_order_timeout_secs: 1,
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = test_config();
        tweak(&mut config);

        // One pooled connection, or every connection would get its own
        // empty in-memory database.
        let mut opt = ConnectOptions::new(config.database_url.clone());
        opt.max_connections(1).min_connections(1);
        let db = Database::connect(opt).await.expect("connect test db");
        run_migrations(&db).await.expect("migrate test db");

        let db = Arc::new(db);
        let state = AppState::new(db.clone(), Arc::new(config));
        TestApp {
            router: app_router(state),
            db,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request_with_token(method, uri, body, None).await
    }

    pub async fn request_with_token(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router call");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            // Plain-text bodies (e.g. the health probe) come back as strings
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    pub async fn seed_product(
        &self,
        name: &str,
        article: Option<&str>,
        onec_id: Option<&str>,
        price: Decimal,
    ) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            onec_id: Set(onec_id.map(str::to_string)),
            article: Set(article.map(str::to_string)),
            name: Set(name.to_string()),
            description: Set(None),
            price: Set(price),
            stock_quantity: Set(10),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("seed product")
    }

    pub async fn seed_order_with_onec_id(&self, onec_id: &str) -> order::Model {
        order::ActiveModel {
            id: Set(Uuid::new_v4()),
            onec_id: Set(Some(onec_id.to_string())),
            customer_info: Set(Some("seeded".to_string())),
            status: Set(order::OrderStatus::New),
            total_amount: Set(Decimal::ZERO),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("seed order")
    }
}

/// Decimal fields travel as JSON strings; lift either representation into
/// a `Decimal` so scale differences do not break comparisons.
pub fn as_decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal value: {:?}", other),
    }
}
