mod common;

use assert_matches::assert_matches;
use common::TestApp;
use jade_commerce_api::errors::ServiceError;
use rust_decimal_macros::dec;

#[tokio::test]
async fn adding_to_cart_reserves_stock() {
    let app = TestApp::new().await;
    let user = app.create_user("mei", "mei@example.com", "pw123456").await;
    let product = app.create_product("Jade Bangle", dec!(100), 5).await;
    let carts = app.state.services.carts.clone();

    let line = carts.add_item(user.id, product.id, 3).await.unwrap();
    assert_eq!(line.quantity, 3);
    assert_eq!(app.product_stock(product.id).await, 2);

    // Only two left, so another three cannot be reserved.
    let err = carts.add_item(user.id, product.id, 3).await.unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));
    assert_eq!(app.product_stock(product.id).await, 2);
}

#[tokio::test]
async fn adding_same_product_folds_into_one_line() {
    let app = TestApp::new().await;
    let user = app.create_user("mei", "mei@example.com", "pw123456").await;
    let product = app.create_product("Jade Bangle", dec!(100), 5).await;
    let carts = app.state.services.carts.clone();

    carts.add_item(user.id, product.id, 2).await.unwrap();
    let line = carts.add_item(user.id, product.id, 1).await.unwrap();

    assert_eq!(line.quantity, 3);
    assert_eq!(app.product_stock(product.id).await, 2);

    let view = carts.get_cart(user.id).await.unwrap();
    assert_eq!(view.cart.len(), 1);
    assert_eq!(view.cart[0].quantity, 3);
    assert_eq!(view.total_price, dec!(300));
}

#[tokio::test]
async fn removing_a_line_releases_the_reservation() {
    let app = TestApp::new().await;
    let user = app.create_user("mei", "mei@example.com", "pw123456").await;
    let product = app.create_product("Jade Bangle", dec!(100), 5).await;
    let carts = app.state.services.carts.clone();

    carts.add_item(user.id, product.id, 3).await.unwrap();
    assert_eq!(app.product_stock(product.id).await, 2);

    carts.remove_item(user.id, product.id).await.unwrap();
    assert_eq!(app.product_stock(product.id).await, 5);

    let err = carts.remove_item(user.id, product.id).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn clearing_the_cart_releases_every_reservation() {
    let app = TestApp::new().await;
    let user = app.create_user("mei", "mei@example.com", "pw123456").await;
    let bangle = app.create_product("Jade Bangle", dec!(100), 5).await;
    let ring = app.create_product("Jade Ring", dec!(30), 4).await;
    let carts = app.state.services.carts.clone();

    carts.add_item(user.id, bangle.id, 2).await.unwrap();
    carts.add_item(user.id, ring.id, 4).await.unwrap();
    assert_eq!(app.product_stock(bangle.id).await, 3);
    assert_eq!(app.product_stock(ring.id).await, 0);

    let removed = carts.clear_cart(user.id).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(app.product_stock(bangle.id).await, 5);
    assert_eq!(app.product_stock(ring.id).await, 4);

    // Clearing an empty cart is a no-op.
    assert_eq!(carts.clear_cart(user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn updating_quantity_adjusts_the_reservation_by_the_delta() {
    let app = TestApp::new().await;
    let user = app.create_user("mei", "mei@example.com", "pw123456").await;
    let product = app.create_product("Jade Bangle", dec!(100), 10).await;
    let carts = app.state.services.carts.clone();

    carts.add_item(user.id, product.id, 4).await.unwrap();
    assert_eq!(app.product_stock(product.id).await, 6);

    // Shrink: two units go back.
    carts.update_item(user.id, product.id, 2).await.unwrap();
    assert_eq!(app.product_stock(product.id).await, 8);

    // Grow: three more come out.
    carts.update_item(user.id, product.id, 5).await.unwrap();
    assert_eq!(app.product_stock(product.id).await, 5);
}

#[tokio::test]
async fn update_rejects_quantity_beyond_stock() {
    let app = TestApp::new().await;
    let user = app.create_user("mei", "mei@example.com", "pw123456").await;
    let product = app.create_product("Jade Bangle", dec!(100), 5).await;
    let carts = app.state.services.carts.clone();

    carts.add_item(user.id, product.id, 2).await.unwrap();
    assert_eq!(app.product_stock(product.id).await, 3);

    let err = carts.update_item(user.id, product.id, 4).await.unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // Line and stock unchanged.
    let view = carts.get_cart(user.id).await.unwrap();
    assert_eq!(view.cart[0].quantity, 2);
    assert_eq!(app.product_stock(product.id).await, 3);
}

#[tokio::test]
async fn cart_rejects_unknown_products_and_bad_quantities() {
    let app = TestApp::new().await;
    let user = app.create_user("mei", "mei@example.com", "pw123456").await;
    let product = app.create_product("Jade Bangle", dec!(100), 5).await;
    let carts = app.state.services.carts.clone();

    assert_matches!(
        carts.add_item(user.id, 999, 1).await.unwrap_err(),
        ServiceError::NotFound(_)
    );
    assert_matches!(
        carts.add_item(user.id, product.id, 0).await.unwrap_err(),
        ServiceError::InvalidInput(_)
    );
    assert_matches!(
        carts.add_item(user.id, product.id, -2).await.unwrap_err(),
        ServiceError::InvalidInput(_)
    );
}

#[tokio::test]
async fn select_items_returns_only_the_users_lines() {
    let app = TestApp::new().await;
    let mei = app.create_user("mei", "mei@example.com", "pw123456").await;
    let kai = app.create_user("kai", "kai@example.com", "pw123456").await;
    let product = app.create_product("Jade Bangle", dec!(100), 10).await;
    let carts = app.state.services.carts.clone();

    let mei_line = carts.add_item(mei.id, product.id, 1).await.unwrap();
    let kai_line = carts.add_item(kai.id, product.id, 1).await.unwrap();

    let selected = carts
        .select_items(mei.id, &[mei_line.id, kai_line.id])
        .await
        .unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].id, mei_line.id);

    let err = carts
        .select_items(mei.id, &[kai_line.id])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn cart_view_skips_products_deleted_after_adding() {
    let app = TestApp::new().await;
    let user = app.create_user("mei", "mei@example.com", "pw123456").await;
    let bangle = app.create_product("Jade Bangle", dec!(100), 5).await;
    let ring = app.create_product("Jade Ring", dec!(30), 5).await;
    let carts = app.state.services.carts.clone();

    carts.add_item(user.id, bangle.id, 1).await.unwrap();
    carts.add_item(user.id, ring.id, 1).await.unwrap();

    app.state
        .services
        .products
        .delete_product(ring.id)
        .await
        .unwrap();

    let view = carts.get_cart(user.id).await.unwrap();
    assert_eq!(view.cart.len(), 1);
    assert_eq!(view.cart[0].product_id, bangle.id);
    assert_eq!(view.total_price, dec!(100));
}
