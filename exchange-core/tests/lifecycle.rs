mod common;

use crate::common::*;
use exchange_core::prelude::*;

#[test]
fn new_order_starts_in_the_new_status() {
    let book = OrderBook::new();
    let outcome = book.admit(limit_req("buy-1", Side::Buy, "AAPL", "150.00", 10));

    assert_eq!(outcome.accepted.status, OrderStatus::New);
    assert_eq!(outcome.accepted.filled_qty, 0);
}

#[test]
fn partial_fill_transitions_new_to_partially_filled() {
    let book = OrderBook::new();
    book.admit(limit_req("sell-1", Side::Sell, "GOOGL", "170.00", 10));
    let outcome = book.admit(limit_req("buy-1", Side::Buy, "GOOGL", "170.00", 4));

    assert_eq!(outcome.matches[0].sell_after.status, OrderStatus::PartiallyFilled);
    assert!(!outcome.matches[0].sell_after.status.is_terminal());
}

#[test]
fn full_fill_transitions_partially_filled_to_filled() {
    let book = OrderBook::new();
    book.admit(limit_req("sell-1", Side::Sell, "MSFT", "380.00", 10));
    book.admit(limit_req("buy-1", Side::Buy, "MSFT", "380.00", 4));
    let outcome = book.admit(limit_req("buy-2", Side::Buy, "MSFT", "380.00", 6));

    assert_eq!(outcome.matches[0].sell_after.status, OrderStatus::Filled);
    assert!(outcome.matches[0].sell_after.status.is_terminal());
}

#[test]
fn cancel_transitions_new_directly_to_canceled() {
    let book = OrderBook::new();
    let outcome = book.admit(limit_req("buy-1", Side::Buy, "TSLA", "250.00", 10));

    let canceled = book.cancel("TSLA", outcome.accepted.id).unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);
    assert!(canceled.status.is_terminal());
}

#[test]
fn rejected_orders_never_reach_a_resting_status() {
    let book = OrderBook::new();
    let outcome = book.admit(limit_req("buy-1", Side::Buy, "NOPE", "150.00", 10));

    assert_eq!(outcome.accepted.status, OrderStatus::Rejected);
    assert!(outcome.accepted.status.is_terminal());
    assert!(book.snapshot("NOPE").bids.is_empty());
}

#[test]
fn terminal_statuses_map_to_the_documented_fix_ord_status_codes() {
    assert_eq!(OrderStatus::New.fix_code(), "0");
    assert_eq!(OrderStatus::PartiallyFilled.fix_code(), "1");
    assert_eq!(OrderStatus::Filled.fix_code(), "2");
    assert_eq!(OrderStatus::Canceled.fix_code(), "4");
    assert_eq!(OrderStatus::Rejected.fix_code(), "8");
}
