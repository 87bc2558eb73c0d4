//! Live frame streaming over a bidirectional channel

pub mod driver;
pub mod protocol;
pub mod ws;

pub use driver::{run_stream, Channel, ChannelClosed, StreamConfig, StreamEnd};
pub use protocol::{ClientMessage, ControlMessage, ErrorMessage, ProtocolError, ServerMessage};
pub use ws::WsChannel;
