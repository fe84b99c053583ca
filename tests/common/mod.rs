#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use jade_commerce_api::{
    auth::AuthService,
    config::AppConfig,
    db::{self, DbConfig},
    entities::{user, ProductModel, UserModel},
    events::{self, EventSender},
    handlers::AppServices,
    services::products::CreateProductInput,
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Test harness: the full application wired against a private in-memory
/// SQLite database. One instance per test, so tests never share state.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        // A single-connection pool so every query sees the same in-memory
        // database.
        let db_cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");
        let db = Arc::new(pool);

        let cfg = AppConfig::new(
            db_cfg.url.clone(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(&cfg.jwt_secret, cfg.jwt_expiration));
        let services = AppServices::new(db.clone(), Arc::new(event_sender.clone()), auth_service.clone());

        let state = AppState {
            db,
            config: cfg,
            event_sender,
            services,
            auth_service,
        };

        let router = jade_commerce_api::build_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Fire a request at the router and decode the JSON response.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response was not JSON")
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    /// Register an account directly through the service layer.
    pub async fn create_user(&self, username: &str, email: &str, password: &str) -> UserModel {
        self.state
            .services
            .users
            .create_user(jade_commerce_api::services::users::CreateUserInput {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .expect("failed to create test user")
    }

    /// Register an account and promote it to the admin role.
    pub async fn create_admin(&self, username: &str, email: &str, password: &str) -> UserModel {
        let created = self.create_user(username, email, password).await;
        let mut active: user::ActiveModel = created.into();
        active.role = Set("admin".to_string());
        active
            .update(&*self.state.db)
            .await
            .expect("failed to promote test admin")
    }

    /// Issue a bearer token for the given account.
    pub fn token_for(&self, user: &UserModel) -> String {
        self.state
            .auth_service
            .generate_token(user)
            .expect("failed to issue test token")
    }

    /// Seed a catalog product.
    pub async fn create_product(&self, name: &str, price: Decimal, stock: i32) -> ProductModel {
        self.state
            .services
            .products
            .create_product(CreateProductInput {
                name: name.to_string(),
                description: None,
                price,
                stock,
            })
            .await
            .expect("failed to create test product")
    }

    /// Current stock of a product, read through the service layer.
    pub async fn product_stock(&self, product_id: i32) -> i32 {
        self.state
            .services
            .products
            .get_product(product_id)
            .await
            .expect("product lookup failed")
            .stock
    }
}
