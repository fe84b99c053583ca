use crate::{
    entities::{product, Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Catalog management. Stock mutation during cart/order flows lives in the
/// cart and order services; this service owns plain CRUD.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone)]
pub struct CreateProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
}

#[derive(Debug)]
pub struct ProductPage {
    pub products: Vec<ProductModel>,
    pub total: u64,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        if input.price < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Price must not be negative".to_string(),
            ));
        }
        if input.stock < 0 {
            return Err(ServiceError::InvalidInput(
                "Stock must not be negative".to_string(),
            ));
        }

        let new_product = product::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            stock: Set(input.stock),
            is_deleted: Set(false),
            ..Default::default()
        };

        let created = new_product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;

        info!("Created product {}", created.id);
        Ok(created)
    }

    pub async fn get_product(&self, id: i32) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(id)
            .filter(product::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
    }

    /// Paginated listing with optional name substring search.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        per_page: u64,
        search: Option<&str>,
    ) -> Result<ProductPage, ServiceError> {
        let mut query = Product::find().filter(product::Column::IsDeleted.eq(false));

        if let Some(term) = search.filter(|s| !s.is_empty()) {
            query = query.filter(product::Column::Name.contains(term));
        }

        let total = query.clone().count(&*self.db).await?;

        let products = query
            .order_by_asc(product::Column::Id)
            .limit(per_page)
            .offset(page.saturating_sub(1) * per_page)
            .all(&*self.db)
            .await?;

        Ok(ProductPage { products, total })
    }

    /// Partial update: only supplied fields change.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: i32,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let existing = self.get_product(id).await?;

        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "Price must not be negative".to_string(),
                ));
            }
        }
        if let Some(stock) = input.stock {
            if stock < 0 {
                return Err(ServiceError::InvalidInput(
                    "Stock must not be negative".to_string(),
                ));
            }
        }

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(stock) = input.stock {
            active.stock = Set(stock);
        }

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(updated.id))
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        let existing = self.get_product(id).await?;

        let mut active: product::ActiveModel = existing.into();
        active.is_deleted = Set(true);
        active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;

        info!("Soft-deleted product {}", id);
        Ok(())
    }
}
