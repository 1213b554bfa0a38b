mod common;

use axum::http::{Method, StatusCode};
use common::{as_decimal, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn create_order_computes_exact_total() {
    let app = TestApp::spawn().await;
    let bread = app.seed_product("Rye bread", Some("BRD001"), None, dec!(0.10)).await;
    let milk = app.seed_product("Milk", Some("MLK005"), None, dec!(85.50)).await;

    let (status, body) = app
        .post(
            "/api/v1/orders",
            json!({
                "customer_info": "Alice, +7 900 000-00-00",
                "items": [
                    { "product_id": bread.id, "quantity": 3, "price_per_item": "0.10" },
                    { "product_id": milk.id, "quantity": 2, "price_per_item": "85.50" }
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    let data = &body["data"];
    // 3 * 0.10 + 2 * 85.50; binary floats would not land on 171.30 exactly
    assert_eq!(as_decimal(&data["total_amount"]), dec!(171.30));
    assert_eq!(data["items"].as_array().unwrap().len(), 2);
    assert_eq!(data["status"], "new");
    assert_eq!(data["status_display"], "New");
    assert!(data["onec_id"].is_null());
}

#[tokio::test]
async fn client_supplied_total_is_ignored() {
    let app = TestApp::spawn().await;
    let p = app.seed_product("Cheese", None, None, dec!(650.00)).await;

    let (status, body) = app
        .post(
            "/api/v1/orders",
            json!({
                "total_amount": "1.00",
                "items": [
                    { "product_id": p.id, "quantity": 1, "price_per_item": "650.00" }
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(as_decimal(&body["data"]["total_amount"]), dec!(650.00));
}

#[tokio::test]
async fn order_with_unknown_product_is_rejected_and_nothing_persists() {
    let app = TestApp::spawn().await;
    let p = app.seed_product("Coffee", None, None, dec!(350.00)).await;

    let (status, body) = app
        .post(
            "/api/v1/orders",
            json!({
                "items": [
                    { "product_id": p.id, "quantity": 1, "price_per_item": "350.00" },
                    { "product_id": uuid::Uuid::new_v4(), "quantity": 1, "price_per_item": "1.00" }
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("items[1].product_id"));

    let (_, orders) = app.get("/api/v1/orders").await;
    assert_eq!(orders["data"]["total"], 0);
    let (_, items) = app.get("/api/v1/order-items").await;
    assert_eq!(items["data"]["total"], 0);
}

#[tokio::test]
async fn invalid_quantities_and_duplicates_are_rejected() {
    let app = TestApp::spawn().await;
    let p = app.seed_product("Bread", None, None, dec!(50.00)).await;

    let (status, body) = app
        .post(
            "/api/v1/orders",
            json!({ "items": [ { "product_id": p.id, "quantity": 0, "price_per_item": "50.00" } ] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("items[0].quantity"));

    let (status, body) = app
        .post(
            "/api/v1/orders",
            json!({ "items": [
                { "product_id": p.id, "quantity": 1, "price_per_item": "50.00" },
                { "product_id": p.id, "quantity": 2, "price_per_item": "50.00" }
            ] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("more than once"));

    let (status, _) = app.post("/api/v1/orders", json!({ "items": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn updating_items_replaces_the_whole_set_and_recomputes_total() {
    let app = TestApp::spawn().await;
    let a = app.seed_product("A", None, None, dec!(10.00)).await;
    let b = app.seed_product("B", None, None, dec!(20.00)).await;

    let (_, created) = app
        .post(
            "/api/v1/orders",
            json!({ "items": [
                { "product_id": a.id, "quantity": 1, "price_per_item": "10.00" },
                { "product_id": b.id, "quantity": 1, "price_per_item": "20.00" }
            ] }),
        )
        .await;
    let order_id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(as_decimal(&created["data"]["total_amount"]), dec!(30.00));

    let (status, updated) = app
        .put(
            &format!("/api/v1/orders/{}", order_id),
            json!({ "items": [
                { "product_id": b.id, "quantity": 5, "price_per_item": "20.00" }
            ] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let data = &updated["data"];
    assert_eq!(data["items"].as_array().unwrap().len(), 1);
    assert_eq!(as_decimal(&data["total_amount"]), dec!(100.00));

    // The old lines are gone, not orphaned
    let (_, items) = app.get("/api/v1/order-items").await;
    assert_eq!(items["data"]["total"], 1);
}

#[tokio::test]
async fn update_without_items_keeps_lines_and_total() {
    let app = TestApp::spawn().await;
    let p = app.seed_product("C", None, None, dec!(7.50)).await;

    let (_, created) = app
        .post(
            "/api/v1/orders",
            json!({ "items": [
                { "product_id": p.id, "quantity": 4, "price_per_item": "7.50" }
            ] }),
        )
        .await;
    let order_id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .put(
            &format!("/api/v1/orders/{}", order_id),
            json!({ "customer_info": "Bob", "status": "processing" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let data = &updated["data"];
    assert_eq!(data["customer_info"], "Bob");
    assert_eq!(data["status"], "processing");
    assert_eq!(data["status_display"], "Processing");
    assert_eq!(data["items"].as_array().unwrap().len(), 1);
    assert_eq!(as_decimal(&data["total_amount"]), dec!(30.00));
}

#[tokio::test]
async fn status_endpoint_updates_only_the_status() {
    let app = TestApp::spawn().await;
    let p = app.seed_product("D", None, None, dec!(1.00)).await;

    let (_, created) = app
        .post(
            "/api/v1/orders",
            json!({ "items": [ { "product_id": p.id, "quantity": 1, "price_per_item": "1.00" } ] }),
        )
        .await;
    let order_id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .put(
            &format!("/api/v1/orders/{}/status", order_id),
            json!({ "status": "shipped" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["status"], "shipped");
    assert_eq!(as_decimal(&updated["data"]["total_amount"]), dec!(1.00));

    let (status, _) = app
        .put(
            &format!("/api/v1/orders/{}/status", order_id),
            json!({ "status": "no-such-status" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn deleting_an_order_removes_its_items() {
    let app = TestApp::spawn().await;
    let p = app.seed_product("E", None, None, dec!(2.00)).await;

    let (_, created) = app
        .post(
            "/api/v1/orders",
            json!({ "items": [ { "product_id": p.id, "quantity": 2, "price_per_item": "2.00" } ] }),
        )
        .await;
    let order_id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.delete(&format!("/api/v1/orders/{}", order_id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/v1/orders/{}", order_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, items) = app.get("/api/v1/order-items").await;
    assert_eq!(items["data"]["total"], 0);
}

#[tokio::test]
async fn order_items_subresource_lists_the_lines() {
    let app = TestApp::spawn().await;
    let p = app.seed_product("G", None, None, dec!(4.00)).await;

    let (_, created) = app
        .post(
            "/api/v1/orders",
            json!({ "items": [ { "product_id": p.id, "quantity": 3, "price_per_item": "4.00" } ] }),
        )
        .await;
    let order_id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.get(&format!("/api/v1/orders/{}/items", order_id)).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(as_decimal(&items[0]["total_price"]), dec!(12.00));

    let (status, _) = app
        .get(&format!("/api/v1/orders/{}/items", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_order_returns_404() {
    let app = TestApp::spawn().await;
    let (status, body) = app
        .get(&format!("/api/v1/orders/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn orders_list_is_newest_first_and_paginated() {
    let app = TestApp::spawn().await;
    let p = app.seed_product("F", None, None, dec!(1.00)).await;

    for i in 1..=3 {
        app.post(
            "/api/v1/orders",
            json!({
                "customer_info": format!("customer {}", i),
                "items": [ { "product_id": p.id, "quantity": i, "price_per_item": "1.00" } ]
            }),
        )
        .await;
    }

    let (status, body) = app.get("/api/v1/orders?page=1&limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total_pages"], 2);
}

#[tokio::test]
async fn bearer_tokens_gate_the_order_api() {
    let app = TestApp::spawn_with(|cfg| {
        cfg.api_keys = Some("user-token".to_string());
        cfg.admin_api_keys = Some("admin-token".to_string());
    })
    .await;

    // No token
    let (status, _) = app.get("/api/v1/orders").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Wrong token
    let (status, _) = app
        .request_with_token(Method::GET, "/api/v1/orders", None, Some("nope"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid user token
    let (status, _) = app
        .request_with_token(Method::GET, "/api/v1/orders", None, Some("user-token"))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Integration endpoints need the admin role
    let (status, _) = app
        .request_with_token(
            Method::POST,
            "/api/v1/integration/sync-products-from-1c",
            None,
            Some("user-token"),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Product reads stay public
    let (status, _) = app.get("/api/v1/products").await;
    assert_eq!(status, StatusCode::OK);
}
