use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::detection::Detection;
use crate::prelude::{ConsoleError, ConsoleResult};

/// One encoded capture, alive only between the capture tick and the send.
#[derive(Debug, Clone)]
pub struct Frame {
    /// `data:image/jpeg;base64,...` payload, sent without an envelope.
    pub payload: String,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(payload: String, timestamp: Instant) -> Self {
        Self { payload, timestamp }
    }
}

/// Annotated result for some earlier frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub image: String,
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub server_time_ms: f64,
}

/// Everything the backend may push down the duplex channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Error { error: String },
    Annotated(InboundMessage),
}

impl ServerMessage {
    pub fn parse(text: &str) -> ConsoleResult<Self> {
        let message: ServerMessage = serde_json::from_str(text)
            .map_err(|e| ConsoleError::InvalidMessage(format!("malformed json: {e}")))?;
        if let ServerMessage::Annotated(inbound) = &message {
            if !inbound.server_time_ms.is_finite() || inbound.server_time_ms < 0.0 {
                return Err(ConsoleError::InvalidMessage(format!(
                    "server_time_ms out of range: {}",
                    inbound.server_time_ms
                )));
            }
        }
        Ok(message)
    }
}
