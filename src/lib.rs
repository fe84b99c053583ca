//! Jade Commerce API Library
//!
//! This crate provides the core functionality for the Jade Commerce backend:
//! users, products, shopping carts and order placement over a relational
//! database, behind JWT bearer authentication.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;

use axum::{routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared application state injected into every handler.
///
/// Everything here is constructed once at startup and cloned per request;
/// there are no process-global handles.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub auth_service: Arc<auth::AuthService>,
}

async fn welcome() -> &'static str {
    "Welcome to Jade Commerce Backend API!"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// All application routes, unnested from any state or middleware.
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/users", handlers::users::users_routes())
        .nest("/products", handlers::products::products_routes())
        .nest("/cart", handlers::carts::carts_routes())
        .nest("/orders", handlers::orders::orders_routes())
}

/// Builds the complete router: routes, Swagger UI, and the extension layer
/// that makes the auth service visible to the auth middleware. Transport
/// concerns (CORS, tracing) are layered on by the binary.
pub fn build_router(state: AppState) -> Router {
    let auth_service = state.auth_service.clone();

    app_routes()
        .merge(openapi::swagger_ui())
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            |axum::extract::State(auth): axum::extract::State<Arc<auth::AuthService>>,
             mut req: axum::http::Request<axum::body::Body>,
             next: axum::middleware::Next| async move {
                req.extensions_mut().insert(auth);
                next.run(req).await
            },
        ))
        .with_state(state)
}
