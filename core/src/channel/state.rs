use serde::{Deserialize, Serialize};

/// Connection lifecycle: `Connecting -> Open -> Closed`. `Closed` is terminal
/// for a channel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

impl ChannelState {
    pub fn label(self) -> &'static str {
        match self {
            ChannelState::Connecting => "Connecting...",
            ChannelState::Open => "Connected",
            ChannelState::Closed => "Disconnected",
        }
    }
}
