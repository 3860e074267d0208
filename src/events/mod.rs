use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Events emitted after a transaction commits. Delivery is best-effort:
/// a full or closed channel is logged and dropped, never surfaced to the
/// caller, so event loss cannot affect transactional state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Ledger events
    ItemCreated { item_id: i64 },
    ItemAdjusted { item_id: i64, delta: i32 },

    // Catalog events
    ProductCreated { product_id: i64 },
    ProductRevised { old_id: i64, new_id: i64 },
    ProductArchived { product_id: i64 },

    // Goal lifecycle events
    GoalScheduled { goal_id: i64, product_id: i64 },
    GoalQuantityChanged { goal_id: i64, overage: i32 },
    GoalDeleted { goal_id: i64, released_to_stock: i32 },
    OverageReleased { goal_id: i64, qty: i32 },

    // Production events
    ProductionLogged { goal_id: i64, product_id: i64 },
    GoalFulfilled { goal_id: i64, packed: i32 },
    StockProduced { product_id: i64 },
    ProductionUndone { goal_id: i64 },
    FulfillmentUndone { goal_id: i64 },
    StockProductionUndone { product_id: i64 },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing the failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Fire-and-forget send used after commit points.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Drains the event channel, tracing each event. Embedders that want to
/// react to events should consume the receiver themselves instead of
/// spawning this loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        debug!(?event, "event processed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_round_trip_through_json() {
        let event = Event::GoalFulfilled {
            goal_id: 7,
            packed: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        match back {
            Event::GoalFulfilled { goal_id, packed } => {
                assert_eq!(goal_id, 7);
                assert_eq!(packed, 3);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_a_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        sender
            .send_or_log(Event::ProductArchived { product_id: 1 })
            .await;
    }
}
