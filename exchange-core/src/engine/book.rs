use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use super::error::CancelError;
use super::matching;
use super::syncer::{BroadcastEvent, BroadcastSink, NullBroadcastSink, NullPersistenceSink, PersistenceSink};
use super::types::{
    is_known_symbol, AdmissionOutcome, BookKey, BookSnapshot, Execution, NewOrderRequest, Order,
    OrderID, OrderStatus, OrderType, RejectReason,
};

/// Bound on the retained execution history per symbol (§3 "a bounded ring of the last 100
/// executions per book").
const EXECUTION_RING_CAPACITY: usize = 100;

/// SymbolBook holds one symbol's resting sides, order index, and recent-execution ring.
/// Every field is only ever touched while `OrderBook`'s mutex is held.
pub(super) struct SymbolBook {
    pub(super) bids: BTreeMap<BookKey, Order>,
    pub(super) asks: BTreeMap<BookKey, Order>,
    pub(super) order_index: HashMap<OrderID, BookKey>,
    pub(super) execution_ring: VecDeque<Execution>,
    pub(super) last_trade_price: Option<super::types::Price>,
}

impl SymbolBook {
    fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_index: HashMap::new(),
            execution_ring: VecDeque::new(),
            last_trade_price: None,
        }
    }

    fn side_mut(&mut self, side: super::types::Side) -> &mut BTreeMap<BookKey, Order> {
        match side {
            super::types::Side::Buy => &mut self.bids,
            super::types::Side::Sell => &mut self.asks,
        }
    }

    fn side(&self, side: super::types::Side) -> &BTreeMap<BookKey, Order> {
        match side {
            super::types::Side::Buy => &self.bids,
            super::types::Side::Sell => &self.asks,
        }
    }

    pub(super) fn push_execution(&mut self, execution: Execution) {
        if self.execution_ring.len() >= EXECUTION_RING_CAPACITY {
            self.execution_ring.pop_front();
        }
        self.execution_ring.push_back(execution);
    }

    fn has_any_resting(&self, side: super::types::Side) -> bool {
        !self.side(side).is_empty()
    }

    /// Removes `order_id` from its side without marking it Canceled, if it's still resting.
    /// Used to drop an unfilled Market order remainder rather than let it rest (Market orders
    /// never rest, per `admit`'s liquidity-exhaustion handling). A no-op if the order already
    /// left the book (fully filled, or never inserted).
    pub(super) fn drop_if_resting(&mut self, order_id: OrderID) {
        if let Some(&book_key) = self.order_index.get(&order_id) {
            self.side_mut(book_key.side).remove(&book_key);
            self.order_index.remove(&order_id);
        }
    }
}

/// Book-wide counters, protected by the same mutex as the per-symbol maps since admission
/// must assign them atomically with respect to every other admit/cancel (§5).
struct BookState {
    symbols: HashMap<String, SymbolBook>,
    next_order_id: OrderID,
    next_enqueue_seq: u64,
    next_exec_id: u64,
    /// `(originating session, cl_ord_id) -> (symbol, order_id)`, the lookup key a cancel
    /// request is scoped by (§3 "Invariants").
    cl_ord_index: HashMap<(u64, String), (String, OrderID)>,
}

impl BookState {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            next_order_id: 1,
            next_enqueue_seq: 1,
            next_exec_id: 1,
            cl_ord_index: HashMap::new(),
        }
    }

    fn symbol_mut(&mut self, symbol: &str) -> &mut SymbolBook {
        self.symbols
            .entry(symbol.to_string())
            .or_insert_with(SymbolBook::new)
    }
}

/// OrderBook is the single per-process matching engine, covering every symbol behind one
/// exclusive lock (§5). `admit`, `cancel`, and `snapshot` each take the lock for their whole
/// operation, including the matching loop run by `admit`.
pub struct OrderBook {
    state: Mutex<BookState>,
    persistence: Arc<dyn PersistenceSink>,
    broadcast: Arc<dyn BroadcastSink>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::with_sinks(Arc::new(NullPersistenceSink), Arc::new(NullBroadcastSink))
    }

    pub fn with_sinks(persistence: Arc<dyn PersistenceSink>, broadcast: Arc<dyn BroadcastSink>) -> Self {
        Self {
            state: Mutex::new(BookState::new()),
            persistence,
            broadcast,
        }
    }

    /// Validates, admits, and matches a new order against its symbol's book in one critical
    /// section (§4.2 `admit`). Returns the New-ack descriptor plus any resulting matches, even
    /// for a rejected order (whose `accepted.status == Rejected` and whose `matches` is empty).
    pub fn admit(&self, req: NewOrderRequest) -> AdmissionOutcome {
        let mut state = self.state.lock();

        if let Some(reject_reason) = validate(&req) {
            let rejected = Order {
                id: 0,
                cl_ord_id: req.cl_ord_id,
                session_id: req.session_id,
                symbol: req.symbol,
                side: req.side,
                order_type: req.order_type,
                price: req.price,
                order_qty: req.order_qty,
                filled_qty: 0,
                status: OrderStatus::Rejected,
                enqueue_seq: 0,
                reject_reason: Some(reject_reason),
            };
            self.persistence.save_order(&rejected);
            self.broadcast.emit(BroadcastEvent::NewOrder(rejected.clone()));
            return AdmissionOutcome {
                accepted: rejected,
                matches: Vec::new(),
            };
        }

        let symbol_book = state.symbols.entry(req.symbol.clone()).or_insert_with(SymbolBook::new);
        if req.order_type == OrderType::Market
            && !symbol_book.has_any_resting(req.side.opposite())
        {
            let rejected = Order {
                id: 0,
                cl_ord_id: req.cl_ord_id,
                session_id: req.session_id,
                symbol: req.symbol,
                side: req.side,
                order_type: req.order_type,
                price: req.price,
                order_qty: req.order_qty,
                filled_qty: 0,
                status: OrderStatus::Rejected,
                enqueue_seq: 0,
                reject_reason: Some(RejectReason::InsufficientLiquidity),
            };
            self.persistence.save_order(&rejected);
            self.broadcast.emit(BroadcastEvent::NewOrder(rejected.clone()));
            return AdmissionOutcome {
                accepted: rejected,
                matches: Vec::new(),
            };
        }

        let order_id = state.next_order_id;
        state.next_order_id += 1;
        let enqueue_seq = state.next_enqueue_seq;
        state.next_enqueue_seq += 1;

        let order = Order {
            id: order_id,
            cl_ord_id: req.cl_ord_id,
            session_id: req.session_id,
            symbol: req.symbol.clone(),
            side: req.side,
            order_type: req.order_type,
            price: req.price,
            order_qty: req.order_qty,
            filled_qty: 0,
            status: OrderStatus::New,
            enqueue_seq,
            reject_reason: None,
        };
        let accepted = order.clone();

        let symbol_book = state.symbol_mut(&req.symbol);
        let book_key = order.book_key();
        symbol_book.side_mut(req.side).insert(book_key, order);
        symbol_book.order_index.insert(order_id, book_key);
        state
            .cl_ord_index
            .insert((req.session_id, accepted.cl_ord_id.clone()), (req.symbol.clone(), order_id));

        self.persistence.save_order(&accepted);
        self.broadcast.emit(BroadcastEvent::NewOrder(accepted.clone()));

        let symbol_book = state.symbol_mut(&req.symbol);
        let matches = matching::run_match_cycle(symbol_book, &mut state.next_exec_id);

        for m in &matches {
            self.persistence.save_execution(&m.execution);
            self.broadcast.emit(BroadcastEvent::Execution(m.execution.clone()));
        }

        if req.order_type == OrderType::Market {
            state.symbol_mut(&req.symbol).drop_if_resting(order_id);
        }

        AdmissionOutcome { accepted, matches }
    }

    /// Cancels a resting order by exchange-assigned `order_id` (§4.2 `cancel`).
    pub fn cancel(&self, symbol: &str, order_id: OrderID) -> Result<Order, CancelError> {
        let mut state = self.state.lock();
        let symbol_book = state
            .symbols
            .get_mut(symbol)
            .ok_or(CancelError::Unknown)?;

        let book_key = *symbol_book
            .order_index
            .get(&order_id)
            .ok_or(CancelError::Unknown)?;

        let side_map = symbol_book.side_mut(book_key.side);
        let mut order = side_map.remove(&book_key).ok_or(CancelError::Unknown)?;

        if !order.is_resting() {
            // Already terminal; put it back untouched and report it as not cancellable.
            side_map.insert(book_key, order);
            return Err(CancelError::NotCancellable);
        }

        order.status = OrderStatus::Canceled;
        symbol_book.order_index.remove(&order_id);

        self.persistence.save_order(&order);
        self.broadcast.emit(BroadcastEvent::CancelOrder(order.clone()));

        Ok(order)
    }

    /// Resolves a cancel request by `(originating session, OrigClOrdID)` (§4.4 `handle_cancel`)
    /// rather than the exchange-assigned `order_id`, then delegates to `cancel`.
    pub fn cancel_by_cl_ord_id(&self, session_id: u64, orig_cl_ord_id: &str) -> Result<Order, CancelError> {
        let (symbol, order_id) = {
            let state = self.state.lock();
            state
                .cl_ord_index
                .get(&(session_id, orig_cl_ord_id.to_string()))
                .cloned()
                .ok_or(CancelError::Unknown)?
        };
        self.cancel(&symbol, order_id)
    }

    /// Allocates a fresh book-scoped exec id (tag 17) without running a match, for Execution
    /// Reports that aren't themselves a fill: New acks, Cancel acks, Cancel rejects.
    pub fn next_exec_id(&self) -> u64 {
        let mut state = self.state.lock();
        let id = state.next_exec_id;
        state.next_exec_id += 1;
        id
    }

    /// Immutable view of one symbol's resting orders and recent executions (§4.2 `snapshot`),
    /// taken under the same lock as writes.
    pub fn snapshot(&self, symbol: &str) -> BookSnapshot {
        let mut state = self.state.lock();
        let symbol_book = state.symbol_mut(symbol);
        BookSnapshot {
            symbol: symbol.to_string(),
            bids: symbol_book.bids.values().cloned().collect(),
            asks: symbol_book.asks.values().cloned().collect(),
            recent_executions: symbol_book.execution_ring.iter().cloned().collect(),
        }
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

/// Admission-time validation (§4.2 "Admission validation"). Returns `None` when the request is
/// admissible; liquidity checks for market orders happen separately, once the symbol's book is
/// known to exist.
fn validate(req: &NewOrderRequest) -> Option<RejectReason> {
    if !is_known_symbol(&req.symbol) {
        return Some(RejectReason::InvalidSymbol);
    }
    if req.order_qty == 0 {
        return Some(RejectReason::InvalidQuantity);
    }
    if req.order_type == OrderType::Limit {
        match req.price {
            Some(price) if price > super::types::Price::ZERO => {}
            _ => return Some(RejectReason::InvalidPrice),
        }
    }
    None
}
