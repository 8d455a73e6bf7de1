use super::error::CodecError;

pub const SOH: u8 = 0x01;

/// Result of scanning a buffer for the next complete message.
pub enum FrameResult {
    /// `buf[..len]` is a complete message; the caller should split it off and re-scan the rest.
    Complete(usize),
    /// No complete message yet; wait for more bytes.
    Incomplete,
}

/// Scans an append-only buffer for the next complete message (§4.1 "Framing contract").
///
/// A message is complete when, after the first occurrence of the literal `10=`, three ASCII
/// digits and one SOH follow. The buffer must begin with `8=`; anything else is a framing
/// error, matching `exchange_server.py::handle_client`'s `"10=" in buffer` scan generalized
/// into a pure function.
pub fn frame_next(buf: &[u8]) -> Result<FrameResult, CodecError> {
    if buf.is_empty() {
        return Ok(FrameResult::Incomplete);
    }
    if !buf.starts_with(b"8=") {
        return Err(CodecError::MalformedFraming);
    }

    let checksum_tag = b"10=";
    let Some(tag_pos) = find_subslice(buf, checksum_tag) else {
        return Ok(FrameResult::Incomplete);
    };

    let digits_start = tag_pos + checksum_tag.len();
    let digits_end = digits_start + 3;
    if buf.len() < digits_end + 1 {
        return Ok(FrameResult::Incomplete);
    }
    if !buf[digits_start..digits_end].iter().all(u8::is_ascii_digit) {
        return Err(CodecError::MalformedFraming);
    }
    if buf[digits_end] != SOH {
        return Ok(FrameResult::Incomplete);
    }

    Ok(FrameResult::Complete(digits_end + 1))
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
