//! Standalone stand-in for the 1C HTTP exchange service, for local
//! development and demos. Serves a small in-memory catalog and accepts
//! orders against it, guarded by basic auth.

use std::env;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use onec_bridge::services::onec::{RemoteOrderPayload, RemoteOrderResponse};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_USERNAME: &str = "user1c";
const DEFAULT_PASSWORD: &str = "password1c";
const DEFAULT_ADDR: &str = "0.0.0.0:8001";

#[derive(Debug, Clone, Serialize)]
struct MockProduct {
    id: String,
    name: String,
    article: String,
    price: f64,
    stock: i64,
    description: Option<String>,
}

struct MockState {
    username: String,
    password: String,
    products: Vec<MockProduct>,
    accepted_orders: Mutex<Vec<serde_json::Value>>,
}

fn seed_products() -> Vec<MockProduct> {
    let product = |name: &str, article: &str, price: f64, stock: i64, description: &str| {
        MockProduct {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            article: article.to_string(),
            price,
            stock,
            description: Some(description.to_string()),
        }
    };

    vec![
        product("Rye bread", "BRD001", 50.00, 100, "Classic dark rye loaf"),
        product("Milk 3.2%", "MLK005", 85.50, 200, "Pasteurized whole milk, 1L"),
        product("Semi-hard cheese", "CHS012", 650.00, 50, "Sold by the kilogram"),
        product("Instant coffee", "CFE003", 350.00, 80, "100g glass jar"),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .try_init();

    let state = Arc::new(MockState {
        username: env::var("MOCK_ONEC_USERNAME").unwrap_or_else(|_| DEFAULT_USERNAME.to_string()),
        password: env::var("MOCK_ONEC_PASSWORD").unwrap_or_else(|_| DEFAULT_PASSWORD.to_string()),
        products: seed_products(),
        accepted_orders: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/", get(root))
        .route("/1c_mock/hs/exchange/products", get(get_products))
        .route("/1c_mock/hs/exchange/orders", post(create_order))
        .with_state(state);

    let addr = env::var("MOCK_ONEC_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Mock 1C exchange service listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Mock 1C HTTP service is running",
        "endpoints": ["/1c_mock/hs/exchange/products", "/1c_mock/hs/exchange/orders"]
    }))
}

async fn get_products(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<MockProduct>>, Response> {
    verify_basic_auth(&state, &headers)?;
    info!(count = state.products.len(), "Serving mock catalog");
    Ok(Json(state.products.clone()))
}

async fn create_order(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(payload): Json<RemoteOrderPayload>,
) -> Result<Json<RemoteOrderResponse>, Response> {
    verify_basic_auth(&state, &headers)?;

    for item in &payload.items {
        let known = state
            .products
            .iter()
            .any(|p| p.id == item.product_id_1c || p.article == item.product_id_1c);
        if !known {
            warn!(product_id_1c = %item.product_id_1c, "Rejecting order for unknown product");
            return Ok(Json(RemoteOrderResponse {
                success: false,
                order_1c_id: None,
                message: Some(format!(
                    "Product with id/article '{}' is not known",
                    item.product_id_1c
                )),
            }));
        }
    }

    let suffix = Uuid::new_v4().simple().to_string();
    let order_id = format!("ORDER-{}", suffix[..8].to_uppercase());
    state
        .accepted_orders
        .lock()
        .expect("mock order store poisoned")
        .push(json!({
            "order_1c_id": order_id,
            "payload": serde_json::to_value(&payload).unwrap_or_default(),
        }));

    info!(%order_id, "Mock order accepted");
    Ok(Json(RemoteOrderResponse {
        success: true,
        order_1c_id: Some(order_id),
        message: Some("Order accepted for processing".to_string()),
    }))
}

fn verify_basic_auth(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let unauthorized = |message: &str| {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic")],
            Json(json!({ "detail": message })),
        )
            .into_response()
    };

    let header_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("Not authenticated"))?;

    let encoded = header_value
        .strip_prefix("Basic ")
        .or_else(|| header_value.strip_prefix("basic "))
        .ok_or_else(|| unauthorized("Invalid authentication scheme"))?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| unauthorized("Invalid authentication credentials"))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| unauthorized("Invalid authentication credentials"))?;

    if username != state.username || password != state.password {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "detail": "Invalid username or password" })),
        )
            .into_response());
    }

    Ok(())
}
