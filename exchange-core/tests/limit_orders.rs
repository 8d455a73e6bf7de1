mod common;

use crate::common::*;
use exchange_core::prelude::*;

#[test]
fn exact_price_cross_fills_both_sides() {
    let book = OrderBook::new();

    book.admit(limit_req("buy-1", Side::Buy, "AAPL", "150.00", 100));
    let outcome = book.admit(limit_req("sell-1", Side::Sell, "AAPL", "150.00", 100));

    assert_eq!(outcome.matches.len(), 1);
    let m = &outcome.matches[0];
    assert_eq!(m.execution.last_qty, 100);
    assert_eq!(m.execution.last_px.to_string(), "150.00");
    assert_eq!(m.buy_after.status, OrderStatus::Filled);
    assert_eq!(m.sell_after.status, OrderStatus::Filled);

    let snapshot = book.snapshot("AAPL");
    assert!(snapshot.bids.is_empty());
    assert!(snapshot.asks.is_empty());
}

#[test]
fn no_cross_gap_leaves_both_orders_resting() {
    let book = OrderBook::new();

    book.admit(limit_req("buy-1", Side::Buy, "GOOGL", "170.00", 100));
    let outcome = book.admit(limit_req("sell-1", Side::Sell, "GOOGL", "180.00", 100));

    assert!(outcome.matches.is_empty());
    let snapshot = book.snapshot("GOOGL");
    assert_eq!(snapshot.bids.len(), 1);
    assert_eq!(snapshot.asks.len(), 1);
}

#[test]
fn partial_fill_when_taker_is_larger() {
    let book = OrderBook::new();

    book.admit(limit_req("buy-1", Side::Buy, "TSLA", "250.00", 100));
    let outcome = book.admit(limit_req("sell-1", Side::Sell, "TSLA", "250.00", 50));

    let m = &outcome.matches[0];
    assert_eq!(m.buy_after.status, OrderStatus::PartiallyFilled);
    assert_eq!(m.buy_after.filled_qty, 50);
    assert_eq!(m.sell_after.status, OrderStatus::Filled);

    let snapshot = book.snapshot("TSLA");
    assert_eq!(snapshot.bids.len(), 1);
    assert_eq!(snapshot.bids[0].remaining_qty(), 50);
    assert!(snapshot.asks.is_empty());
}

#[test]
fn price_time_priority_fills_the_earlier_order_first() {
    let book = OrderBook::new();

    book.admit(limit_req("buy-1", Side::Buy, "MSFT", "380.00", 200));
    book.admit(limit_req("buy-2", Side::Buy, "MSFT", "380.00", 200));
    let outcome = book.admit(limit_req("sell-1", Side::Sell, "MSFT", "380.00", 200));

    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].buy_after.cl_ord_id, "buy-1");
    assert_eq!(outcome.matches[0].buy_after.status, OrderStatus::Filled);

    let snapshot = book.snapshot("MSFT");
    assert_eq!(snapshot.bids.len(), 1);
    assert_eq!(snapshot.bids[0].cl_ord_id, "buy-2");
    assert_eq!(snapshot.bids[0].filled_qty, 0);
}

#[test]
fn price_improvement_favors_the_aggressor() {
    let book = OrderBook::new();

    // Resting sell at 99.00; an aggressive buy at 100.00 trades at the resting price.
    book.admit(limit_req("sell-1", Side::Sell, "AMZN", "99.00", 10));
    let outcome = book.admit(limit_req("buy-1", Side::Buy, "AMZN", "100.00", 10));

    assert_eq!(outcome.matches[0].execution.last_px.to_string(), "99.00");
}

#[test]
fn invalid_symbol_is_rejected_without_entering_the_book() {
    let book = OrderBook::new();

    let outcome = book.admit(limit_req("buy-1", Side::Buy, "FOO", "10.00", 10));

    assert_eq!(outcome.accepted.status, OrderStatus::Rejected);
    assert_eq!(outcome.accepted.reject_reason, Some(RejectReason::InvalidSymbol));
    assert!(outcome.matches.is_empty());
}

#[test]
fn zero_quantity_is_rejected() {
    let book = OrderBook::new();

    let outcome = book.admit(limit_req("buy-1", Side::Buy, "AAPL", "10.00", 0));

    assert_eq!(outcome.accepted.reject_reason, Some(RejectReason::InvalidQuantity));
}

#[test]
fn missing_limit_price_is_rejected() {
    let book = OrderBook::new();

    let mut req = limit_req("buy-1", Side::Buy, "AAPL", "10.00", 5);
    req.price = None;
    let outcome = book.admit(req);

    assert_eq!(outcome.accepted.reject_reason, Some(RejectReason::InvalidPrice));
}
