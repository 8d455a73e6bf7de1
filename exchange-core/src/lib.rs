pub mod acceptor;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod session;

pub mod prelude {
    pub use crate::codec::prelude::*;
    pub use crate::config::Config;
    pub use crate::dispatcher::Dispatcher;
    pub use crate::engine::prelude::*;
    pub use crate::session::{Session, SessionState};
}
