use chrono::Utc;

use super::book::SymbolBook;
use super::types::{Execution, MatchResult, OrderType, Quantity};

/// Bound on crossing iterations per admission, set well above any realistic single sweep
/// against many small resting orders, while still guaranteeing termination if a bug ever
/// produces a non-decreasing cycle.
const MATCH_CYCLE_SAFETY_MAX: usize = 10_000;

/// Runs the price-time priority crossing loop against the top of `book`'s bid/ask sides until
/// either side empties, the two no longer cross, or the safety bound is hit. Returns every
/// match produced, in trade order (§4.2).
pub(super) fn run_match_cycle(book: &mut SymbolBook, next_exec_id: &mut u64) -> Vec<MatchResult> {
    let mut results = Vec::new();

    for _ in 0..MATCH_CYCLE_SAFETY_MAX {
        let Some((&buy_key, _)) = book.bids.first_key_value() else {
            break;
        };
        let Some((&sell_key, _)) = book.asks.first_key_value() else {
            break;
        };

        let buy_is_market = book.bids[&buy_key].order_type == OrderType::Market;
        let sell_is_market = book.asks[&sell_key].order_type == OrderType::Market;

        let trade_px = match (buy_is_market, sell_is_market) {
            (false, false) => {
                let buy_px = book.bids[&buy_key].price.expect("limit order has price");
                let sell_px = book.asks[&sell_key].price.expect("limit order has price");
                if buy_px < sell_px {
                    break;
                }
                sell_px
            }
            (true, false) => book.asks[&sell_key].price.expect("limit order has price"),
            (false, true) => book.bids[&buy_key].price.expect("limit order has price"),
            (true, true) => match book.last_trade_price {
                Some(px) => px,
                None => break,
            },
        };

        let buy_remaining = book.bids[&buy_key].remaining_qty();
        let sell_remaining = book.asks[&sell_key].remaining_qty();
        let trade_qty: Quantity = buy_remaining.min(sell_remaining);
        if trade_qty == 0 {
            break;
        }

        book.bids.get_mut(&buy_key).unwrap().apply_fill(trade_qty);
        book.asks.get_mut(&sell_key).unwrap().apply_fill(trade_qty);
        book.last_trade_price = Some(trade_px);

        let buy_order = &book.bids[&buy_key];
        let sell_order = &book.asks[&sell_key];

        let exec_id = *next_exec_id;
        *next_exec_id += 1;
        let execution = Execution {
            exec_id,
            symbol: buy_order.symbol.clone(),
            buy_order_id: buy_order.id,
            sell_order_id: sell_order.id,
            last_qty: trade_qty,
            last_px: trade_px,
            timestamp: Utc::now(),
            buy_status_after: buy_order.status,
            sell_status_after: sell_order.status,
        };

        let buy_after = buy_order.clone();
        let sell_after = sell_order.clone();

        if buy_after.status.is_terminal() {
            book.bids.remove(&buy_key);
            book.order_index.remove(&buy_after.id);
        }
        if sell_after.status.is_terminal() {
            book.asks.remove(&sell_key);
            book.order_index.remove(&sell_after.id);
        }

        book.push_execution(execution.clone());
        results.push(MatchResult {
            execution,
            buy_after,
            sell_after,
        });
    }

    results
}
