use std::sync::Arc;

use exchange_core::prelude::*;

fn logon(seq: u64) -> Vec<u8> {
    encode::build(msg_type::LOGON, seq, &[(tags::HEARTBEAT_INT, "30".to_string())])
}

fn new_order_single(
    seq: u64,
    cl_ord_id: &str,
    symbol: &str,
    side: &str,
    order_type: &str,
    price: Option<&str>,
    qty: u64,
) -> Vec<u8> {
    let mut fields = vec![
        (tags::CL_ORD_ID, cl_ord_id.to_string()),
        (tags::SYMBOL, symbol.to_string()),
        (tags::SIDE, side.to_string()),
        (tags::ORD_TYPE, order_type.to_string()),
        (tags::ORDER_QTY, qty.to_string()),
    ];
    if let Some(price) = price {
        fields.push((tags::PRICE, price.to_string()));
    }
    encode::build(msg_type::NEW_ORDER_SINGLE, seq, &fields)
}

fn cancel_request(seq: u64, orig_cl_ord_id: &str) -> Vec<u8> {
    encode::build(
        msg_type::ORDER_CANCEL_REQUEST,
        seq,
        &[(tags::ORIG_CL_ORD_ID, orig_cl_ord_id.to_string())],
    )
}

#[test]
fn full_wire_round_trip_places_and_fills_an_order() {
    let book = Arc::new(OrderBook::new());
    let dispatcher = Dispatcher::new(book);

    let mut resting = Session::new(1);
    let outbound = resting.feed(&logon(1), &dispatcher);
    assert_eq!(resting.state(), SessionState::LoggedIn);
    assert_eq!(outbound.len(), 1);

    let outbound = resting.feed(
        &new_order_single(2, "resting-sell", "AAPL", "2", "2", Some("150.00"), 10),
        &dispatcher,
    );
    // Just the New ack; nothing resting to cross against yet.
    assert_eq!(outbound.len(), 1);
    let ack = decode(&outbound[0]).unwrap();
    assert_eq!(ack.get(tags::EXEC_TYPE), Some("0"));

    let mut aggressor = Session::new(2);
    aggressor.feed(&logon(1), &dispatcher);
    let outbound = aggressor.feed(
        &new_order_single(2, "aggressor-buy", "AAPL", "1", "2", Some("150.00"), 10),
        &dispatcher,
    );

    // New ack (now Filled) plus one fill report.
    assert_eq!(outbound.len(), 2);
    let new_ack = decode(&outbound[0]).unwrap();
    assert_eq!(new_ack.get(tags::ORD_STATUS), Some("2"));
    let fill = decode(&outbound[1]).unwrap();
    assert_eq!(fill.get(tags::LAST_QTY), Some("10"));
    assert_eq!(fill.get(tags::LAST_PX), Some("150.00"));

    assert!(book.snapshot("AAPL").bids.is_empty());
    assert!(book.snapshot("AAPL").asks.is_empty());
}

#[test]
fn cancel_over_the_wire_resolves_by_orig_cl_ord_id() {
    let book = Arc::new(OrderBook::new());
    let dispatcher = Dispatcher::new(book.clone());

    let mut session = Session::new(1);
    session.feed(&logon(1), &dispatcher);
    session.feed(
        &new_order_single(2, "my-order", "GOOGL", "1", "2", Some("170.00"), 10),
        &dispatcher,
    );

    let outbound = session.feed(&cancel_request(3, "my-order"), &dispatcher);
    assert_eq!(outbound.len(), 1);
    let ack = decode(&outbound[0]).unwrap();
    assert_eq!(ack.get(tags::ORD_STATUS), Some("4"));

    assert!(book.snapshot("GOOGL").bids.is_empty());
}

#[test]
fn cancel_for_a_session_that_never_placed_the_order_is_rejected() {
    let book = Arc::new(OrderBook::new());
    let dispatcher = Dispatcher::new(book);

    let mut placer = Session::new(1);
    placer.feed(&logon(1), &dispatcher);
    placer.feed(
        &new_order_single(2, "owned-by-1", "MSFT", "1", "2", Some("380.00"), 10),
        &dispatcher,
    );

    let mut stranger = Session::new(2);
    stranger.feed(&logon(1), &dispatcher);
    let outbound = stranger.feed(&cancel_request(2, "owned-by-1"), &dispatcher);

    assert_eq!(outbound.len(), 1);
    let reject = decode(&outbound[0]).unwrap();
    assert_eq!(reject.get(tags::ORD_STATUS), Some("8"));
}

#[test]
fn an_invalid_symbol_is_rejected_with_the_symbol_named_in_the_text() {
    let book = Arc::new(OrderBook::new());
    let dispatcher = Dispatcher::new(book.clone());

    let mut session = Session::new(1);
    session.feed(&logon(1), &dispatcher);
    let outbound = session.feed(
        &new_order_single(2, "bad-symbol", "FOO", "1", "2", Some("10.00"), 10),
        &dispatcher,
    );

    assert_eq!(outbound.len(), 1);
    let reject = decode(&outbound[0]).unwrap();
    assert_eq!(reject.get(tags::ORD_STATUS), Some("8"));
    assert_eq!(reject.get(tags::TEXT), Some("Invalid symbol: FOO"));
    assert!(book.snapshot("FOO").bids.is_empty());
}

#[test]
fn messages_before_logon_are_silently_dropped() {
    let book = Arc::new(OrderBook::new());
    let dispatcher = Dispatcher::new(book);
    let mut session = Session::new(1);

    let outbound = session.feed(
        &new_order_single(1, "too-early", "AAPL", "1", "2", Some("150.00"), 10),
        &dispatcher,
    );
    assert!(outbound.is_empty());
    assert_eq!(session.state(), SessionState::Open);
}

#[test]
fn a_bad_checksum_never_reaches_the_dispatcher() {
    let book = Arc::new(OrderBook::new());
    let dispatcher = Dispatcher::new(book);
    let mut session = Session::new(1);
    session.feed(&logon(1), &dispatcher);

    let mut frame = new_order_single(2, "corrupt", "AAPL", "1", "2", Some("150.00"), 10);
    let last_byte_index = frame.len() - 2; // before the trailing SOH
    frame[last_byte_index] = b'9';

    let outbound = session.feed(&frame, &dispatcher);
    assert!(outbound.is_empty());
    assert_eq!(session.state(), SessionState::LoggedIn);
}

#[test]
fn a_market_order_with_no_resting_liquidity_is_rejected_over_the_wire() {
    let book = Arc::new(OrderBook::new());
    let dispatcher = Dispatcher::new(book.clone());

    let mut session = Session::new(1);
    session.feed(&logon(1), &dispatcher);
    let outbound = session.feed(
        &new_order_single(2, "no-liquidity", "AMZN", "1", "1", None, 10),
        &dispatcher,
    );

    assert_eq!(outbound.len(), 1);
    let reject = decode(&outbound[0]).unwrap();
    assert_eq!(reject.get(tags::ORD_STATUS), Some("8"));
    assert_eq!(reject.get(tags::TEXT), Some("Insufficient liquidity"));
    assert!(book.snapshot("AMZN").bids.is_empty());
}
