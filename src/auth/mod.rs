/*!
 * # Authentication and Authorization Module
 *
 * JWT bearer authentication plus the role and ownership guards used by the
 * HTTP layer. Guards are composable middleware applied to route groups via
 * [`AuthRouterExt`]; handlers never perform credential checks themselves.
 */

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::entities::UserModel;
use crate::errors::ErrorResponse;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Subject (user id)
    pub email: String, // User's email
    pub role: String,  // User's role
    pub jti: String,   // Unique identifier for this token
    pub iat: i64,      // Issued at time
    pub exp: i64,      // Expiration time
}

/// Authenticated identity extracted from a validated bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub role: String,
    pub token_id: String,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing or invalid token")]
    MissingToken,

    #[error("Invalid or missing token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("You do not have permission to perform this action.")]
    InsufficientPermissions,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Hash error: {0}")]
    HashError(String),
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::TokenCreation(_) | Self::HashError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match &self {
            AuthError::TokenCreation(_) | AuthError::HashError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Issues and validates bearer tokens and owns the password hashing scheme.
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: usize,
}

impl AuthService {
    pub fn new(jwt_secret: &str, expiration_secs: usize) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            expiration_secs,
        }
    }

    pub fn expiration_secs(&self) -> usize {
        self.expiration_secs
    }

    /// Issues an access token for the given account.
    pub fn generate_token(&self, user: &UserModel) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.expiration_secs as i64,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validates a token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::HashError(e.to_string()))
    }

    pub fn verify_password(&self, hash: &str, password: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

fn auth_user_from_claims(claims: Claims) -> Result<AuthUser, AuthError> {
    let user_id = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
    Ok(AuthUser {
        user_id,
        email: claims.email,
        role: claims.role,
        token_id: claims.jti,
    })
}

/// Extract and validate the bearer token from request headers.
fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if let Some(token) = auth_value.strip_prefix("Bearer ") {
                let claims = auth_service.validate_token(token.trim())?;
                return auth_user_from_claims(claims);
            }
        }
    }

    Err(AuthError::MissingToken)
}

/// Authentication middleware: validates the bearer token and stores the
/// resulting [`AuthUser`] in request extensions for downstream guards and
/// handlers.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let headers = request.headers().clone();

    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Authentication service not available".to_string(),
                }),
            )
                .into_response();
        }
    };

    match extract_auth_from_headers(&headers, &auth_service) {
        Ok(user) => {
            debug!(user_id = user.user_id, "authenticated request");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Role guard: requires the authenticated identity to carry `required_role`.
pub async fn role_middleware(
    State(required_role): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AuthError::MissingToken)?;

    if !user.has_role(&required_role) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Ownership guard: requires the path id to match the authenticated identity.
pub async fn ownership_middleware(
    Path(id): Path<i32>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AuthError::MissingToken)?;

    if user.user_id != id {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Extension methods for Router to add auth guards
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_role(self, role: &str) -> Self;
    fn with_ownership(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_role(self, role: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            role.to_string(),
            role_middleware,
        ))
        .with_auth()
    }

    fn with_ownership(self) -> Self {
        self.layer(axum::middleware::from_fn(ownership_middleware))
            .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> UserModel {
        UserModel {
            id: 7,
            username: "mei".into(),
            email: "mei@example.com".into(),
            password: "<hash>".into(),
            role: "user".into(),
            is_deleted: false,
        }
    }

    fn service() -> AuthService {
        AuthService::new("unit_test_secret_key_that_is_long_enough", 3600)
    }

    #[test]
    fn token_round_trips_claims() {
        let svc = service();
        let token = svc.generate_token(&test_user()).unwrap();
        let claims = svc.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "mei@example.com");
        assert_eq!(claims.role, "user");

        let user = auth_user_from_claims(claims).unwrap();
        assert_eq!(user.user_id, 7);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let svc = service();
        let other = AuthService::new("a_completely_different_signing_secret_here", 3600);
        let token = other.generate_token(&test_user()).unwrap();
        assert!(matches!(
            svc.validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let svc = service();
        let hash = svc.hash_password("jade$tone99").unwrap();
        assert_ne!(hash, "jade$tone99");
        assert!(svc.verify_password(&hash, "jade$tone99").unwrap());
        assert!(!svc.verify_password(&hash, "wrong").unwrap());
    }

    #[test]
    fn missing_header_is_missing_token() {
        let svc = service();
        let headers = HeaderMap::new();
        assert!(matches!(
            extract_auth_from_headers(&headers, &svc),
            Err(AuthError::MissingToken)
        ));
    }
}
