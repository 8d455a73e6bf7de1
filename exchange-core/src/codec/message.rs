use std::collections::HashMap;

use super::checksum;
use super::error::CodecError;
use super::frame::SOH;

/// Named tag numbers this dialect understands. Unknown tags are preserved on decode and simply
/// never looked up by name (§4.1 "Parse contract").
pub mod tags {
    pub const BEGIN_STRING: u32 = 8;
    pub const BODY_LENGTH: u32 = 9;
    pub const MSG_TYPE: u32 = 35;
    pub const SENDER_COMP_ID: u32 = 49;
    pub const TARGET_COMP_ID: u32 = 56;
    pub const MSG_SEQ_NUM: u32 = 34;
    pub const SENDING_TIME: u32 = 52;
    pub const CHECKSUM: u32 = 10;
    pub const CL_ORD_ID: u32 = 11;
    pub const ORIG_CL_ORD_ID: u32 = 41;
    pub const SYMBOL: u32 = 55;
    pub const SIDE: u32 = 54;
    pub const ORDER_QTY: u32 = 38;
    pub const ORD_TYPE: u32 = 40;
    pub const PRICE: u32 = 44;
    pub const TRANSACT_TIME: u32 = 60;
    pub const ORDER_ID: u32 = 37;
    pub const EXEC_ID: u32 = 17;
    pub const EXEC_TYPE: u32 = 150;
    pub const ORD_STATUS: u32 = 39;
    pub const LAST_QTY: u32 = 32;
    pub const LAST_PX: u32 = 31;
    pub const CUM_QTY: u32 = 14;
    pub const AVG_PX: u32 = 6;
    pub const TEXT: u32 = 58;
    pub const HEARTBEAT_INT: u32 = 108;
    pub const TEST_REQ_ID: u32 = 112;

    /// The header tags every message must carry (§4.1 "Fails-with contract").
    pub const REQUIRED_HEADER: [u32; 8] = [
        BEGIN_STRING,
        BODY_LENGTH,
        MSG_TYPE,
        SENDER_COMP_ID,
        TARGET_COMP_ID,
        MSG_SEQ_NUM,
        SENDING_TIME,
        CHECKSUM,
    ];
}

/// Message types this dialect routes (§1, §4.4).
pub mod msg_type {
    pub const HEARTBEAT: &str = "0";
    pub const LOGON: &str = "A";
    pub const LOGOUT: &str = "5";
    pub const NEW_ORDER_SINGLE: &str = "D";
    pub const EXECUTION_REPORT: &str = "8";
    pub const ORDER_CANCEL_REQUEST: &str = "F";

    pub const KNOWN: [&str; 5] = [HEARTBEAT, LOGON, LOGOUT, NEW_ORDER_SINGLE, ORDER_CANCEL_REQUEST];
}

/// A decoded tag-value message plus its original bytes, retained for checksum re-verification
/// and diagnostics (§3 "Message").
#[derive(Debug, Clone)]
pub struct Message {
    fields: HashMap<u32, String>,
    raw: Vec<u8>,
}

impl Message {
    pub fn get(&self, tag: u32) -> Option<&str> {
        self.fields.get(&tag).map(String::as_str)
    }

    pub fn msg_type(&self) -> Option<&str> {
        self.get(tags::MSG_TYPE)
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

/// Splits `frame` (one complete message, trailing SOH included) at SOH, then each field at its
/// first `=`; last occurrence of a repeated tag wins, fields without `=` are ignored (§4.1
/// "Parse contract"), matching `fix_engine.py::parse_message`. Validates the checksum and the
/// presence of every required header tag before returning.
pub fn decode(frame: &[u8]) -> Result<Message, CodecError> {
    let mut fields = HashMap::new();

    for field in frame.split(|&b| b == SOH) {
        if field.is_empty() {
            continue;
        }
        let Some(eq_pos) = field.iter().position(|&b| b == b'=') else {
            continue;
        };
        let Ok(tag_str) = std::str::from_utf8(&field[..eq_pos]) else {
            continue;
        };
        let Ok(tag) = tag_str.parse::<u32>() else {
            continue;
        };
        let value = String::from_utf8_lossy(&field[eq_pos + 1..]).into_owned();
        fields.insert(tag, value);
    }

    for &required in tags::REQUIRED_HEADER.iter() {
        if !fields.contains_key(&required) {
            return Err(CodecError::MissingRequiredHeaderTag(required));
        }
    }

    let checksum_marker = b"10=";
    let checksum_pos = frame
        .windows(checksum_marker.len())
        .rposition(|w| w == checksum_marker)
        .ok_or(CodecError::MissingRequiredHeaderTag(tags::CHECKSUM))?;
    let preceding = &frame[..checksum_pos];
    let provided = fields.get(&tags::CHECKSUM).expect("checked above");
    if !checksum::verify(preceding, provided) {
        return Err(CodecError::ChecksumMismatch);
    }

    let msg_type = fields
        .get(&tags::MSG_TYPE)
        .expect("checked above")
        .clone();
    if !msg_type::KNOWN.contains(&msg_type.as_str()) {
        return Err(CodecError::UnknownMessageType(msg_type));
    }

    Ok(Message {
        fields,
        raw: frame.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::encode;

    #[test]
    fn decodes_a_well_formed_logon() {
        let bytes = encode::build(msg_type::LOGON, 1, &[(tags::HEARTBEAT_INT, "30".to_string())]);
        let msg = decode(&bytes).expect("decode should succeed");
        assert_eq!(msg.msg_type(), Some(msg_type::LOGON));
        assert_eq!(msg.get(tags::HEARTBEAT_INT), Some("30"));
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut bytes = encode::build(msg_type::LOGON, 1, &[]);
        let len = bytes.len();
        // Tag 10's three digits sit right before the trailing SOH.
        bytes[len - 4] = b'9';
        bytes[len - 3] = b'9';
        bytes[len - 2] = b'9';
        assert_eq!(decode(&bytes), Err(CodecError::ChecksumMismatch));
    }

    #[test]
    fn rejects_unknown_message_type() {
        let bytes = encode::build("Z", 1, &[]);
        assert!(matches!(decode(&bytes), Err(CodecError::UnknownMessageType(_))));
    }

    #[test]
    fn last_occurrence_of_a_repeated_tag_wins() {
        let bytes = encode::build(
            msg_type::HEARTBEAT,
            1,
            &[(tags::TEST_REQ_ID, "first".to_string()), (tags::TEST_REQ_ID, "second".to_string())],
        );
        let msg = decode(&bytes).unwrap();
        assert_eq!(msg.get(tags::TEST_REQ_ID), Some("second"));
    }
}
