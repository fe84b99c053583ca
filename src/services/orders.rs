use crate::{
    entities::{cart_item, order, order_item, CartItem, Order, OrderItem, OrderModel, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::carts::{find_live_product, reserve_stock},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Order placement and lifecycle.
///
/// Placement is the one multi-entity mutation in the system: stock
/// decrements, the order row, its items and (for cart checkout) the consumed
/// cart lines commit as a single transaction. Every line is validated before
/// anything is written, so a failing line can never leave a partial
/// decrement behind.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// One requested line of a direct-items order.
#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub product_id: i32,
    pub quantity: i32,
}

/// Order placement request: either explicit lines or a set of the user's
/// cart line ids, never both.
#[derive(Debug, Clone)]
pub enum OrderSource {
    Items(Vec<OrderLineInput>),
    CartItems(Vec<i32>),
}

#[derive(Debug)]
pub struct OrderWithItems {
    pub order: OrderModel,
    pub items: Vec<order_item::Model>,
}

#[derive(Debug)]
pub struct OrderPage {
    pub orders: Vec<OrderWithItems>,
    pub total: u64,
}

/// A validated line, priced at validation time. `unit_price` is what gets
/// frozen into the order item.
struct PricedLine {
    product_id: i32,
    quantity: i32,
    unit_price: Decimal,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Places an order for `user_id`. See the type-level docs for the
    /// atomicity contract.
    #[instrument(skip(self, source))]
    pub async fn create_order(
        &self,
        user_id: i32,
        source: OrderSource,
    ) -> Result<OrderWithItems, ServiceError> {
        let txn = self.db.begin().await?;

        // Phase one: validate and price every line. Nothing is written yet,
        // so any failure here aborts with stock and cart untouched.
        let (lines, consumed_cart_lines) = match &source {
            OrderSource::Items(items) => {
                if items.is_empty() {
                    return Err(ServiceError::InvalidInput(
                        "Invalid items format".to_string(),
                    ));
                }

                let mut lines = Vec::with_capacity(items.len());
                for item in items {
                    let product = find_live_product(&txn, item.product_id).await?;
                    if item.quantity <= 0 {
                        return Err(ServiceError::InvalidInput(
                            "Quantity must be greater than 0".to_string(),
                        ));
                    }
                    if item.quantity > product.stock {
                        return Err(ServiceError::insufficient_stock_for(product.id));
                    }
                    lines.push(PricedLine {
                        product_id: product.id,
                        quantity: item.quantity,
                        unit_price: product.price,
                    });
                }
                (lines, Vec::new())
            }
            OrderSource::CartItems(cart_item_ids) => {
                if cart_item_ids.is_empty() {
                    return Err(ServiceError::InvalidInput(
                        "Invalid items format".to_string(),
                    ));
                }

                let cart_lines = CartItem::find()
                    .filter(cart_item::Column::Id.is_in(cart_item_ids.clone()))
                    .filter(cart_item::Column::UserId.eq(user_id))
                    .all(&txn)
                    .await?;

                if cart_lines.len() != cart_item_ids.len() {
                    return Err(ServiceError::NotFound(
                        "No valid items found in cart".to_string(),
                    ));
                }

                let mut lines = Vec::with_capacity(cart_lines.len());
                for cart_line in &cart_lines {
                    let product = find_live_product(&txn, cart_line.product_id).await?;
                    lines.push(PricedLine {
                        product_id: product.id,
                        quantity: cart_line.quantity,
                        unit_price: product.price,
                    });
                }
                (lines, cart_lines)
            }
        };

        // Phase two: apply the side effects. Direct lines decrement stock
        // under the per-product guard; cart lines already hold their
        // reservation, so they are consumed by deletion instead.
        if consumed_cart_lines.is_empty() {
            for line in &lines {
                reserve_stock(&txn, line.product_id, line.quantity).await?;
            }
        } else {
            for cart_line in consumed_cart_lines {
                cart_line.delete(&txn).await?;
            }
        }

        let total_price: Decimal = lines
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();

        let new_order = order::ActiveModel {
            user_id: Set(user_id),
            total_price: Set(total_price),
            status: Set(OrderStatus::Pending),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            is_deleted: Set(false),
            ..Default::default()
        };
        let created = new_order.insert(&txn).await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let new_item = order_item::ActiveModel {
                order_id: Set(created.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                ..Default::default()
            };
            items.push(new_item.insert(&txn).await?);
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderCreated(created.id))
            .await;

        info!(
            "Created order {} for user {} ({} lines, total {})",
            created.id,
            user_id,
            items.len(),
            created.total_price
        );

        Ok(OrderWithItems {
            order: created,
            items,
        })
    }

    pub async fn get_order(&self, id: i32) -> Result<OrderWithItems, ServiceError> {
        let order = Order::find_by_id(id)
            .filter(order::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let items = order.find_related(OrderItem).all(&*self.db).await?;

        Ok(OrderWithItems { order, items })
    }

    /// Paginated listing, optionally restricted to one user's orders.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
        user_id: Option<i32>,
    ) -> Result<OrderPage, ServiceError> {
        let mut query = Order::find().filter(order::Column::IsDeleted.eq(false));

        if let Some(user_id) = user_id {
            query = query.filter(order::Column::UserId.eq(user_id));
        }

        let total = query.clone().count(&*self.db).await?;

        let orders = query
            .order_by_asc(order::Column::Id)
            .limit(per_page)
            .offset(page.saturating_sub(1) * per_page)
            .all(&*self.db)
            .await?;

        // One batched item fetch instead of a query per order.
        let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let all_items = OrderItem::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .all(&*self.db)
            .await?;

        let orders = orders
            .into_iter()
            .map(|order| {
                let items = all_items
                    .iter()
                    .filter(|item| item.order_id == order.id)
                    .cloned()
                    .collect();
                OrderWithItems { order, items }
            })
            .collect();

        Ok(OrderPage { orders, total })
    }

    /// Moves an order to a new status. Membership in [`OrderStatus`] is the
    /// only check; there is no transition graph.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: i32,
        new_status: OrderStatus,
    ) -> Result<OrderWithItems, ServiceError> {
        let order = Order::find_by_id(id)
            .filter(order::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let old_status = order.status;

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;

        let items = updated.find_related(OrderItem).all(&*self.db).await?;

        Ok(OrderWithItems {
            order: updated,
            items,
        })
    }

    /// Soft delete. Items stay attached to the hidden order.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: i32) -> Result<OrderWithItems, ServiceError> {
        let order = Order::find_by_id(id)
            .filter(order::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let mut active: order::ActiveModel = order.into();
        active.is_deleted = Set(true);
        let updated = active.update(&*self.db).await?;

        self.event_sender.send_or_log(Event::OrderDeleted(id)).await;

        let items = updated.find_related(OrderItem).all(&*self.db).await?;

        Ok(OrderWithItems {
            order: updated,
            items,
        })
    }
}
