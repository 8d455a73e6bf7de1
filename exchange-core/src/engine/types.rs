use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// OrderID is the exchange-assigned identifier for an order, unique for the process life.
pub type OrderID = u64;

/// Price is the type used for order and trade prices.
pub type Price = Decimal;

/// Quantity is the type used for order and trade quantities. Always integral.
pub type Quantity = u64;

/// EnqueueSeq is the per-book monotone integer assigned at admission; the time-priority tiebreaker.
pub type EnqueueSeq = u64;

/// Symbol whitelist fixed by the exchange (§6). No other symbols are admissible.
pub const SYMBOL_WHITELIST: [&str; 5] = ["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA"];

/// Returns true iff `symbol` is in the fixed whitelist.
pub fn is_known_symbol(symbol: &str) -> bool {
    SYMBOL_WHITELIST.contains(&symbol)
}

/// Side indicates the direction of the order.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Side {
    /// Buy means the user wants to acquire the asset.
    Buy,
    /// Sell means the user wants to dispose of the asset.
    Sell,
}

impl Side {
    /// The opposite side, used to find the book an aggressor crosses against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// OrderType determines how the order will be executed.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum OrderType {
    /// Limit orders specify a price and rest on the book until matched or canceled.
    Limit,
    /// Market orders have no limit price and cross at whatever price is available.
    Market,
}

/// OrderStatus represents the current status of an order during its lifecycle.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum OrderStatus {
    /// The order has been admitted and acknowledged; not yet matched.
    New,
    /// The order is partially filled and still resting for the remainder.
    PartiallyFilled,
    /// The order has been fully filled.
    Filled,
    /// The order was canceled before being fully filled.
    Canceled,
    /// The order was rejected at admission; it never entered the book.
    Rejected,
}

impl OrderStatus {
    /// Terminal statuses allow no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected
        )
    }

    /// The single-digit FIX OrdStatus (tag 39) code for this status.
    pub fn fix_code(self) -> &'static str {
        match self {
            OrderStatus::New => "0",
            OrderStatus::PartiallyFilled => "1",
            OrderStatus::Filled => "2",
            OrderStatus::Canceled => "4",
            OrderStatus::Rejected => "8",
        }
    }
}

/// RejectReason indicates why an order was rejected at admission.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum RejectReason {
    /// `55=<symbol>` is not in the fixed whitelist.
    InvalidSymbol,
    /// Order quantity is not strictly positive.
    InvalidQuantity,
    /// Limit order price is missing or not strictly positive.
    InvalidPrice,
    /// Market order found no resting opposite-side liquidity at all.
    InsufficientLiquidity,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidSymbol => write!(f, "Invalid symbol"),
            RejectReason::InvalidQuantity => write!(f, "Invalid quantity"),
            RejectReason::InvalidPrice => write!(f, "Invalid price"),
            RejectReason::InsufficientLiquidity => write!(f, "Insufficient liquidity"),
        }
    }
}

/// BookKey is the composite sort key for an order's position in a book side.
///
/// Ordering semantics:
/// - Buy side: higher price first, then smaller `enqueue_seq` first.
/// - Sell side: lower price first, then smaller `enqueue_seq` first.
///
/// This lets a single ordered map sort an entire side correctly without a
/// secondary price-level grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookKey {
    pub side: Side,
    pub price_rank: PriceRank,
    pub enqueue_seq: EnqueueSeq,
}

/// PriceRank is a side-aware, orderable encoding of effective price.
///
/// A Market order sorts ahead of every Limit order on the same side:
/// `effective_price(Buy Market) = +∞`, `effective_price(Sell Market) = 0`. Encoding this
/// directly as a `(tier, price)` pair lets `BookKey`'s `Ord` stay a plain field comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PriceRank {
    /// `0` for Market (always best), `1` for Limit.
    tier: u8,
    /// Meaningful only when `tier == 1`.
    price: Price,
}

impl PriceRank {
    pub fn market() -> Self {
        PriceRank {
            tier: 0,
            price: Decimal::ZERO,
        }
    }

    pub fn limit(price: Price) -> Self {
        PriceRank { tier: 1, price }
    }
}

impl Ord for BookKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        debug_assert_eq!(self.side, other.side, "BookKeys compared across sides");
        let price_order = match self.side {
            // Higher price (and Market over Limit) ranks first for buys.
            Side::Buy => other
                .price_rank
                .tier
                .cmp(&self.price_rank.tier)
                .then_with(|| self.price_rank.price.cmp(&other.price_rank.price).reverse()),
            // Lower price ranks first for sells; Market (tier 0) still sorts first.
            Side::Sell => self
                .price_rank
                .tier
                .cmp(&other.price_rank.tier)
                .then_with(|| self.price_rank.price.cmp(&other.price_rank.price)),
        };
        price_order.then_with(|| self.enqueue_seq.cmp(&other.enqueue_seq))
    }
}

impl PartialOrd for BookKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Order represents a single order, resting or otherwise, tracked by the book.
///
/// Mutated only while the book's lock is held (§5).
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderID,
    pub cl_ord_id: String,
    pub session_id: u64,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Option<Price>,
    pub order_qty: Quantity,
    pub filled_qty: Quantity,
    pub status: OrderStatus,
    pub enqueue_seq: EnqueueSeq,
    pub reject_reason: Option<RejectReason>,
}

impl Order {
    /// Quantity still needing a counterparty.
    pub fn remaining_qty(&self) -> Quantity {
        self.order_qty - self.filled_qty
    }

    pub fn is_resting(&self) -> bool {
        matches!(self.status, OrderStatus::New | OrderStatus::PartiallyFilled)
    }

    /// The book key this order occupies (or would occupy) on its side.
    pub fn book_key(&self) -> BookKey {
        let price_rank = match self.order_type {
            OrderType::Market => PriceRank::market(),
            OrderType::Limit => PriceRank::limit(self.price.unwrap_or(Decimal::ZERO)),
        };
        BookKey {
            side: self.side,
            price_rank,
            enqueue_seq: self.enqueue_seq,
        }
    }

    /// Applies a fill of `traded_qty`, updating `filled_qty` and `status`.
    pub(crate) fn apply_fill(&mut self, traded_qty: Quantity) {
        self.filled_qty += traded_qty;
        self.status = if self.filled_qty >= self.order_qty {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }
}

/// Execution records one matched quantity slice between a buy and a sell order.
#[derive(Debug, Clone)]
pub struct Execution {
    pub exec_id: u64,
    pub symbol: String,
    pub buy_order_id: OrderID,
    pub sell_order_id: OrderID,
    pub last_qty: Quantity,
    pub last_px: Price,
    /// When the match was struck. Stamped once by the matching loop so every report of this
    /// same execution (aggressor-side, persistence, broadcast) carries the same instant.
    pub timestamp: DateTime<Utc>,
    pub buy_status_after: OrderStatus,
    pub sell_status_after: OrderStatus,
}

/// AdmissionOutcome is returned by `OrderBook::admit`.
#[derive(Debug, Clone)]
pub struct AdmissionOutcome {
    /// The admitted (or rejected) order, in its state immediately after admission, before
    /// any matching-caused mutation (the New ack always reports `order_qty`/`filled_qty=0`,
    /// per §4.4: "even if it then fully fills").
    pub accepted: Order,
    /// Matches produced by running the matching loop once over this symbol, in trade order.
    pub matches: Vec<MatchResult>,
}

/// One resulting match from a single matching-loop iteration, with both sides' post-trade state.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub execution: Execution,
    pub buy_after: Order,
    pub sell_after: Order,
}

/// NewOrderRequest is the input to `OrderBook::admit`, built by the dispatcher from a decoded
/// NewOrderSingle (35=D).
#[derive(Debug, Clone)]
pub struct NewOrderRequest {
    pub cl_ord_id: String,
    pub session_id: u64,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Option<Price>,
    pub order_qty: Quantity,
}

/// BookSnapshot is an immutable view of one symbol's resting orders and recent executions
/// (§4.2 `snapshot`), read under the same lock as writes.
#[derive(Debug, Clone)]
pub struct BookSnapshot {
    pub symbol: String,
    pub bids: Vec<Order>,
    pub asks: Vec<Order>,
    pub recent_executions: Vec<Execution>,
}
