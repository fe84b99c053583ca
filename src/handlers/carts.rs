use crate::{
    auth::AuthRouterExt,
    errors::ApiError,
    handlers::common::{created_response, map_service_error, success_response},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

// Request DTOs

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRequest {
    pub user_id: Option<i32>,
    pub product_id: Option<i32>,
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCartLineRequest {
    pub user_id: Option<i32>,
    pub product_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectItemsRequest {
    pub user_id: Option<i32>,
    pub cart_item_ids: Option<Vec<i32>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectedItemResponse {
    pub cart_item_id: i32,
    pub product_id: i32,
    pub quantity: i32,
}

pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_to_cart))
        .route("/update", put(update_cart))
        .route("/delete", delete(delete_from_cart))
        .route("/clear/{user_id}", delete(clear_cart))
        .route("/{user_id}", get(get_cart))
        .route("/select-items", post(select_cart_items))
        .with_auth()
}

/// Add a product to a cart, reserving stock.
#[utoipa::path(
    post,
    path = "/cart/add",
    request_body = CartLineRequest,
    responses(
        (status = 201, description = "Product added to cart"),
        (status = 400, description = "Missing fields or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Json(payload): Json<CartLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(user_id), Some(product_id), Some(quantity)) =
        (payload.user_id, payload.product_id, payload.quantity)
    else {
        return Err(ApiError::ValidationError(
            "Missing required fields".to_string(),
        ));
    };

    state
        .services
        .carts
        .add_item(user_id, product_id, quantity)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(json!({
        "message": "Product added to cart successfully"
    })))
}

/// Set the absolute quantity of an existing cart line.
#[utoipa::path(
    put,
    path = "/cart/update",
    request_body = CartLineRequest,
    responses(
        (status = 200, description = "Cart updated"),
        (status = 400, description = "Missing fields or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart item not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn update_cart(
    State(state): State<AppState>,
    Json(payload): Json<CartLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(user_id), Some(product_id), Some(quantity)) =
        (payload.user_id, payload.product_id, payload.quantity)
    else {
        return Err(ApiError::ValidationError(
            "Missing required fields".to_string(),
        ));
    };

    state
        .services
        .carts
        .update_item(user_id, product_id, quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Cart updated successfully"
    })))
}

/// Remove one line, releasing its reservation.
#[utoipa::path(
    delete,
    path = "/cart/delete",
    request_body = RemoveCartLineRequest,
    responses(
        (status = 200, description = "Product removed from cart"),
        (status = 404, description = "Cart item not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn delete_from_cart(
    State(state): State<AppState>,
    Json(payload): Json<RemoveCartLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(user_id), Some(product_id)) = (payload.user_id, payload.product_id) else {
        return Err(ApiError::ValidationError(
            "Missing required fields".to_string(),
        ));
    };

    state
        .services
        .carts
        .remove_item(user_id, product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Product removed from cart successfully"
    })))
}

/// Empty a user's cart, releasing every reservation.
#[utoipa::path(
    delete,
    path = "/cart/clear/{user_id}",
    params(("user_id" = i32, Path, description = "Cart owner")),
    responses((status = 200, description = "Cart cleared"))
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state
        .services
        .carts
        .clear_cart(user_id)
        .await
        .map_err(map_service_error)?;

    let message = if removed == 0 {
        "Cart is already empty"
    } else {
        "Cart cleared successfully"
    };

    Ok(success_response(json!({ "message": message })))
}

/// The cart's lines joined with live product data, plus a running total.
#[utoipa::path(
    get,
    path = "/cart/{user_id}",
    params(("user_id" = i32, Path, description = "Cart owner")),
    responses((status = 200, description = "Cart contents"))
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .carts
        .get_cart(user_id)
        .await
        .map_err(map_service_error)?;

    if view.cart.is_empty() {
        return Ok(success_response(json!({ "message": "Cart is empty" })));
    }

    Ok(success_response(view))
}

/// Resolve a subset of the user's cart lines, e.g. ahead of checkout.
#[utoipa::path(
    post,
    path = "/cart/select-items",
    request_body = SelectItemsRequest,
    responses(
        (status = 200, description = "Selected lines"),
        (status = 400, description = "Missing fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "No matching lines", body = crate::errors::ErrorResponse)
    )
)]
pub async fn select_cart_items(
    State(state): State<AppState>,
    Json(payload): Json<SelectItemsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(user_id), Some(cart_item_ids)) = (payload.user_id, payload.cart_item_ids) else {
        return Err(ApiError::ValidationError(
            "Missing userId or cartItemIds".to_string(),
        ));
    };

    if cart_item_ids.is_empty() {
        return Err(ApiError::ValidationError(
            "Missing userId or cartItemIds".to_string(),
        ));
    }

    let lines = state
        .services
        .carts
        .select_items(user_id, &cart_item_ids)
        .await
        .map_err(map_service_error)?;

    let selected: Vec<SelectedItemResponse> = lines
        .into_iter()
        .map(|line| SelectedItemResponse {
            cart_item_id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
        })
        .collect();

    Ok(success_response(json!({ "selectedItems": selected })))
}
