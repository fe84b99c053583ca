use crate::{
    auth::AuthRouterExt,
    entities::ProductModel,
    errors::ApiError,
    handlers::common::{
        created_response, default_page, default_per_page, map_service_error, success_response,
        PaginatedResponse,
    },
    services::products::{CreateProductInput, UpdateProductInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

// Request and response DTOs

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub stock: i32,
    pub is_deleted: bool,
}

impl From<ProductModel> for ProductResponse {
    fn from(product: ProductModel) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            is_deleted: product.is_deleted,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListProductsQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub search: Option<String>,
}

pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(list_products))
        .route("/{id}", get(get_product))
        .merge(
            Router::new()
                .route("/add", post(add_product))
                .route("/{id}", put(update_product))
                .route("/{id}", delete(delete_product))
                .with_role("admin"),
        )
}

/// Paginated catalog listing with optional name search.
#[utoipa::path(
    get,
    path = "/products/all",
    params(ListProductsQuery),
    responses((status = 200, description = "Page of products"))
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .services
        .products
        .list_products(query.page, query.per_page, query.search.as_deref())
        .await
        .map_err(map_service_error)?;

    let products: Vec<ProductResponse> = page.products.into_iter().map(Into::into).collect();
    Ok(success_response(PaginatedResponse::new(
        products,
        query.page,
        query.per_page,
        page.total,
    )))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product returned", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from(product)))
}

#[utoipa::path(
    post,
    path = "/products/add",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse)
    )
)]
pub async fn add_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(name), Some(price), Some(stock)) = (payload.name, payload.price, payload.stock)
    else {
        return Err(ApiError::ValidationError(
            "Missing name, price, or stock".to_string(),
        ));
    };

    let product = state
        .services
        .products
        .create_product(CreateProductInput {
            name,
            description: payload.description,
            price,
            stock,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(ProductResponse::from(product)))
}

/// Partial update: only supplied fields change.
#[utoipa::path(
    put,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .update_product(
            id,
            UpdateProductInput {
                name: payload.name,
                description: payload.description,
                price: payload.price,
                stock: payload.stock,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from(product)))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product soft-deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .products
        .delete_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Product deleted successfully"
    })))
}
