use crate::{
    entities::{cart_item, product, CartItem, CartItemModel, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, ModelTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Shopping cart service.
///
/// A cart line is a stock reservation: adding to the cart provisionally
/// decrements the product's stock, and the reservation is released when the
/// line is removed, shrunk, or the cart is cleared. Checkout consumes the
/// reservation without touching stock again. All mutations run in a
/// transaction so a failed step never leaves stock and cart out of step.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// One cart line joined with its live product, priced at the current
/// product price.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub cart_item_id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart: Vec<CartLineView>,
    pub total_price: Decimal,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Adds a product to the user's cart, folding into an existing line when
    /// present, and reserves the quantity out of the product's stock.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<CartItemModel, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "Quantity must be greater than 0".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let product = find_live_product(&txn, product_id).await?;
        if quantity > product.stock {
            return Err(ServiceError::insufficient_stock_for(product_id));
        }

        // Reservation: the guarded decrement is the critical section; losing
        // the race to a concurrent purchase rolls the whole operation back.
        reserve_stock(&txn, product_id, quantity).await?;

        let existing = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?;

        let line = match existing {
            Some(item) => {
                let new_quantity = item.quantity + quantity;
                let mut active: cart_item::ActiveModel = item.into();
                active.quantity = Set(new_quantity);
                active.updated_at = Set(Utc::now());
                active.update(&txn).await?
            }
            None => {
                let new_line = cart_item::ActiveModel {
                    user_id: Set(user_id),
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                };
                new_line.insert(&txn).await?
            }
        };

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                user_id,
                product_id,
                quantity,
            })
            .await;

        info!(
            "Added product {} x{} to cart of user {}",
            product_id, quantity, user_id
        );
        Ok(line)
    }

    /// Sets the absolute quantity of an existing cart line and adjusts the
    /// reservation by the difference.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<CartItemModel, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "Quantity must be greater than 0".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let line = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Cart item not found".to_string()))?;

        let product = find_live_product(&txn, product_id).await?;
        if quantity > product.stock {
            return Err(ServiceError::insufficient_stock_for(product_id));
        }

        let delta = quantity - line.quantity;
        if delta > 0 {
            reserve_stock(&txn, product_id, delta).await?;
        } else if delta < 0 {
            release_stock(&txn, product_id, -delta).await?;
        }

        let mut active: cart_item::ActiveModel = line.into();
        active.quantity = Set(quantity);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemUpdated {
                user_id,
                product_id,
                quantity,
            })
            .await;

        Ok(updated)
    }

    /// Removes a line and releases its reservation back to stock.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: i32, product_id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let line = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Cart item not found".to_string()))?;

        release_stock(&txn, product_id, line.quantity).await?;
        line.delete(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                user_id,
                product_id,
            })
            .await;

        Ok(())
    }

    /// Empties the user's cart, releasing every reservation. Returns the
    /// number of lines removed.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: i32) -> Result<usize, ServiceError> {
        let txn = self.db.begin().await?;

        let lines = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .all(&txn)
            .await?;

        let removed = lines.len();
        for line in lines {
            release_stock(&txn, line.product_id, line.quantity).await?;
            line.delete(&txn).await?;
        }

        txn.commit().await?;

        if removed > 0 {
            self.event_sender
                .send_or_log(Event::CartCleared(user_id))
                .await;
        }

        Ok(removed)
    }

    /// The user's cart joined with live product data. Lines whose product
    /// has been soft-deleted since are skipped, matching the read filters
    /// used everywhere else.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: i32) -> Result<CartView, ServiceError> {
        let lines = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        let mut cart = Vec::new();
        let mut total_price = Decimal::ZERO;

        for (line, maybe_product) in lines {
            let Some(product) = maybe_product.filter(|p| !p.is_deleted) else {
                continue;
            };

            let line_total = product.price * Decimal::from(line.quantity);
            total_price += line_total;
            cart.push(CartLineView {
                cart_item_id: line.id,
                product_id: product.id,
                product_name: product.name,
                unit_price: product.price,
                quantity: line.quantity,
                total_price: line_total,
            });
        }

        Ok(CartView { cart, total_price })
    }

    /// Resolves a set of the user's cart lines by id, for cart-based
    /// checkout. Ids that do not belong to the user are ignored; an empty
    /// resolution is an error.
    #[instrument(skip(self))]
    pub async fn select_items(
        &self,
        user_id: i32,
        cart_item_ids: &[i32],
    ) -> Result<Vec<CartItemModel>, ServiceError> {
        let lines = CartItem::find()
            .filter(cart_item::Column::Id.is_in(cart_item_ids.to_vec()))
            .filter(cart_item::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?;

        if lines.is_empty() {
            return Err(ServiceError::NotFound(
                "No valid items found in cart".to_string(),
            ));
        }

        Ok(lines)
    }
}

pub(crate) async fn find_live_product<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
) -> Result<crate::entities::ProductModel, ServiceError> {
    Product::find_by_id(product_id)
        .filter(product::Column::IsDeleted.eq(false))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product with ID {} not found", product_id)))
}

/// Guarded decrement: `stock = stock - quantity` only while `stock >=
/// quantity`. Zero rows affected means a concurrent request drained the
/// stock first.
pub(crate) async fn reserve_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
    quantity: i32,
) -> Result<(), ServiceError> {
    let result = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::IsDeleted.eq(false))
        .filter(product::Column::Stock.gte(quantity))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::insufficient_stock_for(product_id));
    }

    Ok(())
}

/// Returns a reservation to stock.
pub(crate) async fn release_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
    quantity: i32,
) -> Result<(), ServiceError> {
    Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).add(quantity),
        )
        .filter(product::Column::Id.eq(product_id))
        .exec(conn)
        .await?;

    Ok(())
}
