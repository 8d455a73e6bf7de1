use chrono::{DateTime, Utc};

use super::checksum;
use super::frame::SOH;
use super::message::tags;

/// Exchange's own identity, used as tag 49 until a session echoes a peer-supplied pair.
pub const DEFAULT_SENDER_COMP_ID: &str = "EXCHANGE";
/// Placeholder peer identity, used as tag 56 until a session echoes a peer-supplied pair.
pub const DEFAULT_TARGET_COMP_ID: &str = "CLIENT";

const FIX_VERSION: &str = "FIX.4.2";

/// Renders a FIX UTC calendar timestamp (`YYYYMMDD-HH:MM:SS`, tags 52/60).
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%d-%H:%M:%S").to_string()
}

/// `format_timestamp` of the current instant, for reports with no underlying dated event.
pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

/// Builds one complete wire message with the default (pre-logon) CompID pair. See `build_for`
/// for the session-scoped form used once a Logon has been exchanged.
pub fn build(msg_type: &str, seq_num: u64, body_fields: &[(u32, String)]) -> Vec<u8> {
    build_for(DEFAULT_SENDER_COMP_ID, DEFAULT_TARGET_COMP_ID, msg_type, seq_num, body_fields)
}

/// Builds one complete wire message: the fixed header (tags 8, 9, 35, 49, 56, 34, 52) in order,
/// then `body_fields` verbatim, then the computed tag 10 (§4.1 "Encoder"), matching
/// `fix_engine.py::_build_message`/`_build_header`. `sender_comp_id`/`target_comp_id` are the
/// exchange's own identity and the peer's, as captured by the session at Logon (§4.3).
pub fn build_for(
    sender_comp_id: &str,
    target_comp_id: &str,
    msg_type: &str,
    seq_num: u64,
    body_fields: &[(u32, String)],
) -> Vec<u8> {
    let mut body = String::new();
    body.push_str(&format!("35={}", msg_type));
    body.push(SOH as char);
    body.push_str(&format!("49={}", sender_comp_id));
    body.push(SOH as char);
    body.push_str(&format!("56={}", target_comp_id));
    body.push(SOH as char);
    body.push_str(&format!("34={}", seq_num));
    body.push(SOH as char);
    body.push_str(&format!("52={}", timestamp_now()));
    body.push(SOH as char);

    for (tag, value) in body_fields {
        body.push_str(&format!("{}={}", tag, value));
        body.push(SOH as char);
    }

    let without_checksum = format!(
        "8={}{soh}9={}{soh}{body}",
        FIX_VERSION,
        body.len(),
        soh = SOH as char,
        body = body
    );

    let checksum = checksum::compute(without_checksum.as_bytes());
    let mut complete = without_checksum.into_bytes();
    complete.extend_from_slice(format!("{}={}", tags::CHECKSUM, checksum).as_bytes());
    complete.push(SOH);
    complete
}
