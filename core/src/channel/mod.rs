pub mod realtime;
pub mod state;
pub mod websocket;

pub use realtime::{ChannelEvent, ChannelNotice, FrameSink, RealtimeChannel};
pub use state::ChannelState;
pub use websocket::{connect, WsFrameSink};
