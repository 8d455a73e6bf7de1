use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::codec::encode;
use crate::codec::prelude::*;
use crate::engine::book::OrderBook;
use crate::engine::error::CancelError;
use crate::engine::types::{MatchResult, NewOrderRequest, Order, OrderStatus, OrderType, RejectReason, Side};
use crate::session::{Session, SessionState};

/// Dispatcher owns the mapping from a decoded message type to its business handler, and is the
/// only component that builds outbound Execution Reports (§4.4).
pub struct Dispatcher {
    book: Arc<OrderBook>,
}

impl Dispatcher {
    pub fn new(book: Arc<OrderBook>) -> Self {
        Self { book }
    }

    /// Routes `msg` to the handler allowed by `session`'s current state (§4.3), returning every
    /// outbound frame produced, in order.
    pub fn dispatch(&self, session: &mut Session, msg: Message) -> Vec<Vec<u8>> {
        let msg_type = msg.msg_type().unwrap_or_default().to_string();

        match (session.state(), msg_type.as_str()) {
            (SessionState::Open, msg_type::LOGON) => self.handle_logon(session, &msg),
            (SessionState::Open, _) => {
                debug!(session_id = session.id, %msg_type, "dropping message before logon");
                Vec::new()
            }
            (SessionState::LoggedIn, msg_type::HEARTBEAT) => self.handle_heartbeat(session, &msg),
            (SessionState::LoggedIn, msg_type::NEW_ORDER_SINGLE) => self.handle_new_order(session, &msg),
            (SessionState::LoggedIn, msg_type::ORDER_CANCEL_REQUEST) => self.handle_cancel(session, &msg),
            (SessionState::LoggedIn, msg_type::LOGOUT) => self.handle_logout(session, &msg),
            (SessionState::LoggedIn, _) => {
                debug!(session_id = session.id, %msg_type, "dropping unhandled message type");
                Vec::new()
            }
            (SessionState::Closing, _) => Vec::new(),
        }
    }

    fn handle_logon(&self, session: &mut Session, msg: &Message) -> Vec<Vec<u8>> {
        let inbound_sender = msg.get(tags::SENDER_COMP_ID).unwrap_or_default().to_string();
        let inbound_target = msg.get(tags::TARGET_COMP_ID).unwrap_or_default().to_string();
        session.adopt_comp_ids(&inbound_sender, &inbound_target);
        session.transition(SessionState::LoggedIn);
        let mut fields = Vec::new();
        if let Some(heartbeat_int) = msg.get(tags::HEARTBEAT_INT) {
            fields.push((tags::HEARTBEAT_INT, heartbeat_int.to_string()));
        }
        vec![session.build_frame(msg_type::LOGON, &fields)]
    }

    fn handle_heartbeat(&self, session: &mut Session, msg: &Message) -> Vec<Vec<u8>> {
        let mut fields = Vec::new();
        if let Some(test_req_id) = msg.get(tags::TEST_REQ_ID) {
            fields.push((tags::TEST_REQ_ID, test_req_id.to_string()));
        }
        vec![session.build_frame(msg_type::HEARTBEAT, &fields)]
    }

    fn handle_logout(&self, session: &mut Session, _msg: &Message) -> Vec<Vec<u8>> {
        let frame = session.build_frame(msg_type::LOGOUT, &[]);
        session.transition(SessionState::Closing);
        vec![frame]
    }

    fn handle_new_order(&self, session: &mut Session, msg: &Message) -> Vec<Vec<u8>> {
        let Some(req) = parse_new_order_request(session.id, msg) else {
            debug!(session_id = session.id, "dropping malformed new order single");
            return Vec::new();
        };

        let cl_ord_id = req.cl_ord_id.clone();
        let side = req.side;
        let symbol = req.symbol.clone();
        let order_qty = req.order_qty;

        let outcome = self.book.admit(req);
        let mut frames = Vec::new();

        frames.push(self.build_new_ack(session, &outcome.accepted));

        if outcome.accepted.status == OrderStatus::Rejected {
            return frames;
        }

        for m in &outcome.matches {
            frames.push(self.build_fill_report(session, side, &cl_ord_id, &symbol, order_qty, m));
        }

        frames
    }

    fn handle_cancel(&self, session: &mut Session, msg: &Message) -> Vec<Vec<u8>> {
        let Some(orig_cl_ord_id) = msg.get(tags::ORIG_CL_ORD_ID) else {
            debug!(session_id = session.id, "cancel request missing OrigClOrdID");
            return Vec::new();
        };

        match self.book.cancel_by_cl_ord_id(session.id, orig_cl_ord_id) {
            Ok(order) => vec![self.build_cancel_ack(session, &order)],
            Err(CancelError::Unknown) => {
                vec![self.build_cancel_reject(session, msg, "Order not found")]
            }
            Err(CancelError::NotCancellable) => {
                vec![self.build_cancel_reject(session, msg, "Order is not cancellable")]
            }
        }
    }

    fn build_new_ack(&self, session: &mut Session, order: &Order) -> Vec<u8> {
        let exec_type = order.status.fix_code();
        let mut fields = vec![
            (tags::ORDER_ID, order.id.to_string()),
            (tags::EXEC_ID, self.book.next_exec_id().to_string()),
            (tags::EXEC_TYPE, exec_type.to_string()),
            (tags::ORD_STATUS, exec_type.to_string()),
            (tags::SYMBOL, order.symbol.clone()),
            (tags::SIDE, side_to_fix(order.side).to_string()),
            (tags::ORDER_QTY, order.order_qty.to_string()),
            (tags::LAST_QTY, "0".to_string()),
            (tags::LAST_PX, "0".to_string()),
            (tags::CUM_QTY, "0".to_string()),
            (tags::AVG_PX, "0".to_string()),
            (tags::CL_ORD_ID, order.cl_ord_id.clone()),
        ];
        if let Some(reason) = order.reject_reason {
            fields.push((tags::TEXT, reject_text(reason, order)));
        }
        fields.push((tags::TRANSACT_TIME, encode::timestamp_now()));
        session.build_frame(msg_type::EXECUTION_REPORT, &fields)
    }

    fn build_fill_report(
        &self,
        session: &mut Session,
        side: Side,
        cl_ord_id: &str,
        symbol: &str,
        order_qty: u64,
        m: &MatchResult,
    ) -> Vec<u8> {
        let (this_side_after, last_px) = match side {
            Side::Buy => (&m.buy_after, m.execution.last_px),
            Side::Sell => (&m.sell_after, m.execution.last_px),
        };
        let exec_type = this_side_after.status.fix_code();

        let fields = vec![
            (tags::ORDER_ID, this_side_after.id.to_string()),
            (tags::EXEC_ID, m.execution.exec_id.to_string()),
            (tags::EXEC_TYPE, exec_type.to_string()),
            (tags::ORD_STATUS, exec_type.to_string()),
            (tags::SYMBOL, symbol.to_string()),
            (tags::SIDE, side_to_fix(side).to_string()),
            (tags::ORDER_QTY, order_qty.to_string()),
            (tags::LAST_QTY, m.execution.last_qty.to_string()),
            (tags::LAST_PX, last_px.to_string()),
            (tags::CUM_QTY, this_side_after.filled_qty.to_string()),
            // AvgPx kept equal to the last fill's price rather than a quantity-weighted
            // average across fills.
            (tags::AVG_PX, last_px.to_string()),
            (tags::CL_ORD_ID, cl_ord_id.to_string()),
            (tags::TRANSACT_TIME, encode::format_timestamp(m.execution.timestamp)),
        ];
        session.build_frame(msg_type::EXECUTION_REPORT, &fields)
    }

    fn build_cancel_ack(&self, session: &mut Session, order: &Order) -> Vec<u8> {
        let fields = vec![
            (tags::ORDER_ID, order.id.to_string()),
            (tags::EXEC_ID, self.book.next_exec_id().to_string()),
            (tags::EXEC_TYPE, "4".to_string()),
            (tags::ORD_STATUS, "4".to_string()),
            (tags::SYMBOL, order.symbol.clone()),
            (tags::SIDE, side_to_fix(order.side).to_string()),
            (tags::ORDER_QTY, order.order_qty.to_string()),
            (tags::LAST_QTY, "0".to_string()),
            (tags::LAST_PX, "0".to_string()),
            (tags::CUM_QTY, order.filled_qty.to_string()),
            (tags::AVG_PX, "0".to_string()),
            (tags::CL_ORD_ID, order.cl_ord_id.clone()),
            (tags::TRANSACT_TIME, encode::timestamp_now()),
        ];
        session.build_frame(msg_type::EXECUTION_REPORT, &fields)
    }

    fn build_cancel_reject(&self, session: &mut Session, msg: &Message, text: &str) -> Vec<u8> {
        let fields = vec![
            (tags::ORDER_ID, "0".to_string()),
            (tags::EXEC_ID, self.book.next_exec_id().to_string()),
            (tags::EXEC_TYPE, "8".to_string()),
            (tags::ORD_STATUS, "8".to_string()),
            (tags::SYMBOL, msg.get(tags::SYMBOL).unwrap_or_default().to_string()),
            (tags::SIDE, msg.get(tags::SIDE).unwrap_or_default().to_string()),
            (tags::ORDER_QTY, msg.get(tags::ORDER_QTY).unwrap_or("0").to_string()),
            (tags::LAST_QTY, "0".to_string()),
            (tags::LAST_PX, "0".to_string()),
            (tags::CUM_QTY, "0".to_string()),
            (tags::AVG_PX, "0".to_string()),
            (tags::TEXT, text.to_string()),
            (tags::TRANSACT_TIME, encode::timestamp_now()),
        ];
        session.build_frame(msg_type::EXECUTION_REPORT, &fields)
    }
}

/// Renders the `58=Text` carried on a reject ExecutionReport, folding in the offending
/// field's value where one exists.
fn reject_text(reason: RejectReason, order: &Order) -> String {
    match reason {
        RejectReason::InvalidSymbol => format!("Invalid symbol: {}", order.symbol),
        RejectReason::InvalidQuantity => format!("Invalid quantity: {}", order.order_qty),
        RejectReason::InvalidPrice => match order.price {
            Some(price) => format!("Invalid price: {price}"),
            None => "Invalid price: missing".to_string(),
        },
        RejectReason::InsufficientLiquidity => reason.to_string(),
    }
}

fn side_to_fix(side: Side) -> &'static str {
    match side {
        Side::Buy => "1",
        Side::Sell => "2",
    }
}

fn side_from_fix(value: &str) -> Option<Side> {
    match value {
        "1" => Some(Side::Buy),
        "2" => Some(Side::Sell),
        _ => None,
    }
}

fn order_type_from_fix(value: &str) -> Option<OrderType> {
    match value {
        "1" => Some(OrderType::Market),
        "2" => Some(OrderType::Limit),
        _ => None,
    }
}

fn parse_new_order_request(session_id: u64, msg: &Message) -> Option<NewOrderRequest> {
    let cl_ord_id = msg.get(tags::CL_ORD_ID)?.to_string();
    let symbol = msg.get(tags::SYMBOL)?.to_string();
    let side = side_from_fix(msg.get(tags::SIDE)?)?;
    let order_type = order_type_from_fix(msg.get(tags::ORD_TYPE)?)?;
    let order_qty: u64 = msg.get(tags::ORDER_QTY)?.parse().ok()?;
    let price = match order_type {
        OrderType::Market => None,
        OrderType::Limit => Some(msg.get(tags::PRICE)?.parse::<Decimal>().ok()?),
    };

    Some(NewOrderRequest {
        cl_ord_id,
        session_id,
        symbol,
        side,
        order_type,
        price,
        order_qty,
    })
}
