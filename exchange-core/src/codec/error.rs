use thiserror::Error;

/// CodecError types the ways an inbound byte stream can fail to become a `Message` (§4.1,
/// "Fails-with contract"). The session layer matches on these variants to decide whether to
/// drop the single message or close the whole connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Bytes before `8=` at buffer start, or no message ever resolves to a complete frame.
    /// Fatal to the session: `frame_next` defines no recovery from a bad start.
    #[error("malformed framing")]
    MalformedFraming,

    /// The computed checksum over the bytes preceding `10=` does not match the value carried
    /// in tag 10. The message is dropped silently; the session continues.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// One of the mandatory header tags (8, 9, 35, 49, 56, 34, 52, 10) is absent.
    #[error("missing required header tag {0}")]
    MissingRequiredHeaderTag(u32),

    /// Tag 35 (MsgType) is present but not one of the message types this dialect understands.
    #[error("unknown message type {0}")]
    UnknownMessageType(String),
}
