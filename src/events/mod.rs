use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::order::OrderStatus;

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
    /// Events are advisory; they never gate the request path.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

// The events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },

    // Payment events
    PaymentSessionInitiated {
        order_id: Uuid,
        payment_id: Uuid,
    },
    PaymentReconciled {
        order_id: Uuid,
        payment_id: Uuid,
        provider_status: String,
    },

    // Cart events
    CartItemAdded {
        customer_id: Uuid,
        product_id: Uuid,
    },
    CartItemRemoved {
        customer_id: Uuid,
        product_id: Uuid,
    },
    CartCleared(Uuid),

    // Wishlist events
    WishlistItemAdded {
        customer_id: Uuid,
        product_id: Uuid,
    },
    WishlistItemRemoved {
        customer_id: Uuid,
        product_id: Uuid,
    },

    // Customer events
    CustomerRegistered(Uuid),
    AddressChanged {
        customer_id: Uuid,
        address_id: Uuid,
    },

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// Drains the event channel and logs each event. The processor exists so
/// downstream consumers (mail, analytics) can be attached without touching
/// the request path.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated(order_id) => {
                info!(order_id = %order_id, "order created");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(order_id = %order_id, from = %old_status, to = %new_status, "order status changed");
            }
            Event::PaymentReconciled {
                order_id,
                payment_id,
                provider_status,
            } => {
                info!(order_id = %order_id, payment_id = %payment_id, provider_status = %provider_status, "payment reconciled");
            }
            other => {
                info!(event = ?other, "event");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or error out
        sender.send_or_log(Event::OrderCreated(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn events_reach_the_processor() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let order_id = Uuid::new_v4();
        sender.send(Event::OrderCreated(order_id)).await.unwrap();

        match rx.recv().await {
            Some(Event::OrderCreated(id)) => assert_eq!(id, order_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
