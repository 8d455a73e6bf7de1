pub mod checksum;
pub mod encode;
pub mod error;
pub mod frame;
pub mod message;

pub mod prelude {
    pub use super::encode;
    pub use super::error::CodecError;
    pub use super::frame::{frame_next, FrameResult, SOH};
    pub use super::message::{decode, msg_type, tags, Message};
}
