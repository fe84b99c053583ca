use crate::{
    auth::AuthRouterExt,
    entities::{OrderItemModel, OrderStatus},
    errors::{ApiError, ServiceError},
    handlers::common::{
        created_response, default_page, default_per_page, map_service_error, success_response,
        PaginatedResponse,
    },
    services::orders::{OrderLineInput, OrderSource, OrderWithItems},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

// Request and response DTOs

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: i32,
    pub quantity: i32,
}

/// Order placement payload: `items` for a direct purchase, or
/// `cartItemIds` to check out existing cart lines. Exactly one must be
/// present.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: Option<i32>,
    pub items: Option<Vec<OrderLineRequest>>,
    pub cart_item_ids: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    #[schema(value_type = f64)]
    pub unit_price: Decimal,
}

impl From<OrderItemModel> for OrderItemResponse {
    fn from(item: OrderItemModel) -> Self {
        Self {
            id: item.id,
            order_id: item.order_id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i32,
    pub user_id: i32,
    #[schema(value_type = f64)]
    pub total_price: Decimal,
    #[schema(value_type = String)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderWithItems> for OrderResponse {
    fn from(value: OrderWithItems) -> Self {
        Self {
            id: value.order.id,
            user_id: value.order.user_id,
            total_price: value.order.total_price,
            status: value.order.status,
            created_at: value.order.created_at,
            updated_at: value.order.updated_at,
            items: value.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListOrdersQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    #[serde(rename = "userId")]
    pub user_id: Option<i32>,
}

pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(list_orders))
        .route("/{id}", get(get_order))
        .merge(
            Router::new()
                .route("/create", post(create_order))
                .with_auth(),
        )
        .merge(
            Router::new()
                .route("/{id}/status", put(update_order_status))
                .route("/{id}", delete(delete_order))
                .with_role("admin"),
        )
}

/// Paginated order listing, optionally filtered to one user.
#[utoipa::path(
    get,
    path = "/orders/all",
    params(ListOrdersQuery),
    responses((status = 200, description = "Page of orders"))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .services
        .orders
        .list_orders(query.page, query.per_page, query.user_id)
        .await
        .map_err(map_service_error)?;

    let orders: Vec<OrderResponse> = page.orders.into_iter().map(Into::into).collect();
    Ok(success_response(PaginatedResponse::new(
        orders,
        query.page,
        query.per_page,
        page.total,
    )))
}

/// Place an order. All lines are validated before any stock moves, and the
/// stock decrements, order, items and consumed cart lines commit atomically.
#[utoipa::path(
    post,
    path = "/orders/create",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Missing user id, malformed items, invalid quantity or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or cart line not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(user_id) = payload.user_id else {
        return Err(ApiError::ValidationError("Missing userId".to_string()));
    };

    let source = match (payload.items, payload.cart_item_ids) {
        (Some(items), None) => OrderSource::Items(
            items
                .into_iter()
                .map(|line| OrderLineInput {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
        ),
        (None, Some(cart_item_ids)) => OrderSource::CartItems(cart_item_ids),
        _ => {
            return Err(ApiError::ValidationError(
                "Invalid items format".to_string(),
            ));
        }
    };

    let order = state
        .services
        .orders
        .create_order(user_id, source)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(json!({
        "message": "Order created successfully",
        "order": OrderResponse::from(order)
    })))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order returned", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_order(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(OrderResponse::from(order)))
}

/// Move an order to a new status. The value must name a member of the
/// status enum.
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(("id" = i32, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Invalid status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = payload
        .status
        .as_deref()
        .and_then(|s| OrderStatus::from_str(s).ok())
        .ok_or_else(|| {
            ApiError::ServiceError(ServiceError::InvalidStatus(
                payload.status.unwrap_or_default(),
            ))
        })?;

    let order = state
        .services
        .orders
        .update_status(id, status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Order status updated successfully",
        "order": OrderResponse::from(order)
    })))
}

/// Soft delete.
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order soft-deleted", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .delete_order(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Order deleted successfully",
        "order": OrderResponse::from(order)
    })))
}
