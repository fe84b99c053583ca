mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn product_mutation_is_admin_gated() {
    let app = TestApp::new().await;
    let user = app.create_user("mei", "mei@example.com", "pw123456").await;
    let admin = app.create_admin("root", "root@example.com", "pw123456").await;

    let payload = json!({ "name": "Jade Bangle", "price": 100, "stock": 5 });

    let (status, _) = app
        .request(Method::POST, "/products/add", Some(payload.clone()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user_token = app.token_for(&user);
    let (status, _) = app
        .request(
            Method::POST,
            "/products/add",
            Some(payload.clone()),
            Some(&user_token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = app.token_for(&admin);
    let (status, body) = app
        .request(
            Method::POST,
            "/products/add",
            Some(payload),
            Some(&admin_token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Jade Bangle");
    assert_eq!(body["stock"], 5);
}

#[tokio::test]
async fn product_creation_validates_input() {
    let app = TestApp::new().await;
    let admin = app.create_admin("root", "root@example.com", "pw123456").await;
    let token = app.token_for(&admin);

    let (status, body) = app
        .request(
            Method::POST,
            "/products/add",
            Some(json!({ "name": "Jade Bangle" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Missing"));

    let (status, _) = app
        .request(
            Method::POST,
            "/products/add",
            Some(json!({ "name": "Jade Bangle", "price": -1, "stock": 5 })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            Method::POST,
            "/products/add",
            Some(json!({ "name": "Jade Bangle", "price": 100, "stock": -5 })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn partial_update_leaves_other_fields_alone() {
    let app = TestApp::new().await;
    let admin = app.create_admin("root", "root@example.com", "pw123456").await;
    let token = app.token_for(&admin);
    let product = app.create_product("Jade Bangle", dec!(100), 5).await;

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/products/{}", product.id),
            Some(json!({ "price": 120 })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"].as_f64().unwrap(), 120.0);
    assert_eq!(body["name"], "Jade Bangle");
    assert_eq!(body["stock"], 5);
}

#[tokio::test]
async fn soft_deleted_product_disappears_from_reads() {
    let app = TestApp::new().await;
    let admin = app.create_admin("root", "root@example.com", "pw123456").await;
    let token = app.token_for(&admin);
    let product = app.create_product("Jade Bangle", dec!(100), 5).await;

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/products/{}", product.id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    for _ in 0..2 {
        let (status, _) = app.get(&format!("/products/{}", product.id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (_, listing) = app.get("/products/all").await;
    assert_eq!(listing["pagination"]["total"], 0);
}

#[tokio::test]
async fn listing_paginates_five_products_at_two_per_page() {
    let app = TestApp::new().await;
    for i in 1..=5 {
        app.create_product(&format!("Jade Piece {}", i), dec!(10), 1)
            .await;
    }

    let (status, body) = app.get("/products/all?per_page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 5);
    assert_eq!(body["pagination"]["total_pages"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Page three holds exactly the one remaining product.
    let (_, body) = app.get("/products/all?page=3&per_page=2").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["page"], 3);
}

#[tokio::test]
async fn listing_searches_by_name_substring() {
    let app = TestApp::new().await;
    app.create_product("Jade Bangle", dec!(100), 5).await;
    app.create_product("Jade Ring", dec!(30), 5).await;
    app.create_product("Silk Scarf", dec!(45), 5).await;

    let (_, body) = app.get("/products/all?search=Jade").await;
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = app.get("/products/all?search=Scarf").await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Silk Scarf");
}

#[tokio::test]
async fn default_page_size_is_ten() {
    let app = TestApp::new().await;
    for i in 1..=12 {
        app.create_product(&format!("Jade Piece {}", i), dec!(10), 1)
            .await;
    }

    let (_, body) = app.get("/products/all").await;
    assert_eq!(body["pagination"]["total"], 12);
    assert_eq!(body["pagination"]["per_page"], 10);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["pagination"]["total_pages"], 2);
}
