pub mod auth;
pub mod carts;
pub mod common;
pub mod orders;
pub mod products;
pub mod users;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<crate::services::UserService>,
    pub products: Arc<crate::services::ProductService>,
    pub carts: Arc<crate::services::CartService>,
    pub orders: Arc<crate::services::OrderService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        auth_service: Arc<AuthService>,
    ) -> Self {
        Self {
            users: Arc::new(crate::services::UserService::new(
                db.clone(),
                event_sender.clone(),
                auth_service,
            )),
            products: Arc::new(crate::services::ProductService::new(
                db.clone(),
                event_sender.clone(),
            )),
            carts: Arc::new(crate::services::CartService::new(
                db.clone(),
                event_sender.clone(),
            )),
            orders: Arc::new(crate::services::OrderService::new(db, event_sender)),
        }
    }
}
