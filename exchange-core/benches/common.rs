use exchange_core::prelude::*;
use rust_decimal::Decimal;

pub fn limit_req(cl_ord_id: &str, side: Side, symbol: &str, price: &str, qty: u64) -> NewOrderRequest {
    NewOrderRequest {
        cl_ord_id: cl_ord_id.to_string(),
        session_id: 1,
        symbol: symbol.to_string(),
        side,
        order_type: OrderType::Limit,
        price: Some(price.parse::<Decimal>().unwrap()),
        order_qty: qty,
    }
}

pub fn market_req(cl_ord_id: &str, side: Side, symbol: &str, qty: u64) -> NewOrderRequest {
    NewOrderRequest {
        cl_ord_id: cl_ord_id.to_string(),
        session_id: 1,
        symbol: symbol.to_string(),
        side,
        order_type: OrderType::Market,
        price: None,
        order_qty: qty,
    }
}
