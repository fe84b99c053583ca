use crate::{
    auth::AuthRouterExt,
    entities::UserModel,
    errors::ApiError,
    handlers::common::{
        created_response, default_page, default_per_page, map_service_error, success_response,
        PaginatedResponse,
    },
    services::users::{CreateUserInput, UpdateUserInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

// Request and response DTOs

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Wire shape of an account; the password hash is never serialized.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_deleted: bool,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_deleted: user.is_deleted,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub search: Option<String>,
}

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(get_all_users))
        .route("/", get(list_users))
        .route("/{id}", get(get_user))
        .route("/add", post(add_user))
        .merge(
            Router::new()
                .route("/{id}", put(update_user))
                .with_ownership(),
        )
        .merge(
            Router::new()
                .route("/{id}", delete(delete_user))
                .with_role("admin"),
        )
}

/// Every live account, unpaginated.
#[utoipa::path(
    get,
    path = "/users/all",
    responses((status = 200, description = "All users"))
)]
pub async fn get_all_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .services
        .users
        .list_all()
        .await
        .map_err(map_service_error)?;

    let users: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    Ok(success_response(json!({ "users": users })))
}

/// Paginated listing with optional username search.
#[utoipa::path(
    get,
    path = "/users/",
    params(ListUsersQuery),
    responses((status = 200, description = "Page of users"))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .services
        .users
        .list_users(query.page, query.per_page, query.search.as_deref())
        .await
        .map_err(map_service_error)?;

    let users: Vec<UserResponse> = page.users.into_iter().map(Into::into).collect();
    Ok(success_response(PaginatedResponse::new(
        users,
        query.page,
        query.per_page,
        page.total,
    )))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User returned", body = UserResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .services
        .users
        .get_user(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(UserResponse::from(user)))
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/users/add",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Missing fields or duplicate", body = crate::errors::ErrorResponse)
    )
)]
pub async fn add_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(username), Some(email), Some(password)) =
        (payload.username, payload.email, payload.password)
    else {
        return Err(ApiError::ValidationError(
            "Missing username, email, or password".to_string(),
        ));
    };

    let user = state
        .services
        .users
        .create_user(CreateUserInput {
            username,
            email,
            password,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(json!({
        "message": "User created successfully",
        "user": UserResponse::from(user)
    })))
}

/// Partial update of one's own account. Only supplied fields change.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated"),
        (status = 403, description = "Not the account owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .services
        .users
        .update_user(
            id,
            UpdateUserInput {
                username: payload.username,
                email: payload.email,
                password: payload.password,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "User updated successfully",
        "user": UserResponse::from(user)
    })))
}

/// Soft delete.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User soft-deleted"),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .users
        .delete_user(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": format!("User with id {} has been logically deleted.", id)
    })))
}
