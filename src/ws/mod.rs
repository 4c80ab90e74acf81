//! Relay protocol, transport and event routing

pub mod adapter;
pub mod client;
pub mod protocol;

pub use adapter::{EventSink, SyncProtocolAdapter};
pub use protocol::{ClientMsg, PlayerState, ServerMsg};
