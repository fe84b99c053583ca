use crate::{
    auth::AuthRouterExt,
    errors::ApiError,
    handlers::common::success_response,
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

/// Login request payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token response
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .merge(Router::new().route("/logout", post(logout)).with_auth())
}

/// Authenticate with email and password, returning a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing fields", body = crate::errors::ErrorResponse),
        (status = 401, description = "Bad credentials", body = crate::errors::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ApiError::ValidationError(
            "Email and password are required".to_string(),
        ));
    };

    let user = state
        .services
        .users
        .find_by_email(&email)
        .await
        .map_err(ApiError::ServiceError)?;

    let Some(user) = user else {
        return Err(ApiError::ServiceError(crate::errors::ServiceError::Unauthorized(
            "Invalid email or password".to_string(),
        )));
    };

    let valid = state
        .auth_service
        .verify_password(&user.password, &password)
        .unwrap_or(false);

    if !valid {
        return Err(ApiError::ServiceError(crate::errors::ServiceError::Unauthorized(
            "Invalid email or password".to_string(),
        )));
    }

    let access_token = state
        .auth_service
        .generate_token(&user)
        .map_err(|_| ApiError::ServiceError(crate::errors::ServiceError::InternalError(
            "Token generation failed".to_string(),
        )))?;

    info!("User logged in: {}", email);

    Ok(success_response(LoginResponse {
        message: "Login successful".to_string(),
        access_token,
    }))
}

/// Tokens are stateless, so logout is an acknowledgement: the client drops
/// the token.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse)
    )
)]
pub async fn logout() -> impl IntoResponse {
    success_response(json!({ "message": "Logged out successfully" }))
}
