use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Domain events emitted by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // User events
    UserCreated(i32),
    UserUpdated(i32),
    UserDeleted(i32),

    // Product events
    ProductCreated(i32),
    ProductUpdated(i32),
    ProductDeleted(i32),

    // Cart events
    CartItemAdded {
        user_id: i32,
        product_id: i32,
        quantity: i32,
    },
    CartItemUpdated {
        user_id: i32,
        product_id: i32,
        quantity: i32,
    },
    CartItemRemoved {
        user_id: i32,
        product_id: i32,
    },
    CartCleared(i32),

    // Order events
    OrderCreated(i32),
    OrderStatusChanged {
        order_id: i32,
        old_status: String,
        new_status: String,
    },
    OrderDeleted(i32),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Event delivery is best-effort and must never abort a request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Consumes events from the channel and records them. Runs as a background
/// task for the lifetime of the process.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated(order_id) => {
                info!(order_id, "order created");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(order_id, %old_status, %new_status, "order status changed");
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or error out.
        sender.send_or_log(Event::OrderCreated(1)).await;
    }

    #[tokio::test]
    async fn events_round_trip_through_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send(Event::CartItemAdded {
                user_id: 1,
                product_id: 2,
                quantity: 3,
            })
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            Event::CartItemAdded {
                user_id,
                product_id,
                quantity,
            } => {
                assert_eq!((user_id, product_id, quantity), (1, 2, 3));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
