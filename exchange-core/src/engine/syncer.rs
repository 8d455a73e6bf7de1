use super::types::{Execution, Order};

/// PersistenceSink is called by the book-mutation thread after the book lock is released,
/// to append orders and executions to an external store (§6). Implementations must be
/// non-blocking or accept queuing themselves; a slow sink must never stall matching.
pub trait PersistenceSink: Send + Sync {
    /// Idempotent upsert of an order's current state, keyed on `order.id`.
    fn save_order(&self, order: &Order);
    /// Append an execution record.
    fn save_execution(&self, execution: &Execution);
}

/// NullPersistenceSink is the default, no-op sink. The core must run identically with this
/// attached as with any other sink (§2).
pub struct NullPersistenceSink;

impl PersistenceSink for NullPersistenceSink {
    fn save_order(&self, _order: &Order) {}
    fn save_execution(&self, _execution: &Execution) {}
}

/// BroadcastEvent is the payload `BroadcastSink::emit` distributes to observers (§6).
#[derive(Debug, Clone)]
pub enum BroadcastEvent {
    NewOrder(Order),
    CancelOrder(Order),
    Execution(Execution),
    OrderBookSnapshot {
        symbol: String,
        bids: Vec<Order>,
        asks: Vec<Order>,
    },
}

/// BroadcastSink pushes book/execution events to external observers (e.g. a browser push
/// channel). Delivery is best-effort and unordered relative to the wire channel (§5).
pub trait BroadcastSink: Send + Sync {
    fn emit(&self, event: BroadcastEvent);
}

/// NullBroadcastSink is the default, no-op sink.
pub struct NullBroadcastSink;

impl BroadcastSink for NullBroadcastSink {
    fn emit(&self, _event: BroadcastEvent) {}
}

/// ChannelBroadcastSink fans events out over a `tokio::sync::broadcast` channel. A slow or
/// absent observer is simply lagged/dropped by the channel itself rather than blocking the
/// book lock — this is the "bounded channel per observer with drop-oldest on overflow"
/// behavior §9 allows, implemented with the runtime's native broadcast primitive.
pub struct ChannelBroadcastSink {
    sender: tokio::sync::broadcast::Sender<BroadcastEvent>,
}

impl ChannelBroadcastSink {
    /// `capacity` bounds how many unconsumed events a lagging subscriber may fall behind by
    /// before it starts missing events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to the event stream. Each subscriber gets its own lag tolerance.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }
}

impl BroadcastSink for ChannelBroadcastSink {
    fn emit(&self, event: BroadcastEvent) {
        // No subscribers is not an error; the event is simply dropped.
        let _ = self.sender.send(event);
    }
}
