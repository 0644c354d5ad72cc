use std::time::Instant;

use super::state::ChannelState;
use crate::prelude::{ConsoleError, ConsoleResult};
use crate::stream_interface::Frame;
use crate::telemetry::LogManager;

/// Outbound half of a duplex connection.
pub trait FrameSink {
    fn send(&mut self, payload: String) -> ConsoleResult<()>;
    fn close(&mut self);
}

/// Lifecycle and inbound traffic reported by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened,
    Message(String),
    Closed(Option<String>),
}

/// A [`ChannelEvent`] tagged with the connection it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelNotice {
    pub generation: u64,
    pub event: ChannelEvent,
}

/// Owns one connection: its state, its sink and the latest send timestamp.
pub struct RealtimeChannel<K: FrameSink> {
    generation: u64,
    state: ChannelState,
    sink: Option<K>,
    last_send: Option<Instant>,
    logger: LogManager,
}

impl<K: FrameSink> RealtimeChannel<K> {
    /// Wraps a sink whose handshake is in flight.
    pub fn open(generation: u64, sink: K) -> Self {
        Self {
            generation,
            state: ChannelState::Connecting,
            sink: Some(sink),
            last_send: None,
            logger: LogManager::new("channel"),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn last_send_at(&self) -> Option<Instant> {
        self.last_send
    }

    pub fn send(&mut self, frame: Frame) -> ConsoleResult<()> {
        if self.state != ChannelState::Open {
            return Err(ConsoleError::ChannelNotOpen);
        }
        let sink = self.sink.as_mut().ok_or(ConsoleError::ChannelNotOpen)?;
        if let Err(err) = sink.send(frame.payload) {
            self.logger.warn(&format!("send failed, closing: {err}"));
            self.close();
            return Err(err);
        }
        self.last_send = Some(frame.timestamp);
        Ok(())
    }

    /// Applies a transport event; returns the payload of inbound messages.
    pub fn handle(&mut self, event: ChannelEvent) -> Option<String> {
        match event {
            ChannelEvent::Opened => {
                if self.state == ChannelState::Connecting {
                    self.state = ChannelState::Open;
                    self.logger
                        .record(&format!("generation {} open", self.generation));
                }
                None
            }
            ChannelEvent::Message(text) => {
                if self.state == ChannelState::Closed {
                    self.logger.trace("dropping message on closed channel");
                    None
                } else {
                    Some(text)
                }
            }
            ChannelEvent::Closed(reason) => {
                if self.state != ChannelState::Closed {
                    self.logger.warn(&format!(
                        "generation {} closed: {}",
                        self.generation,
                        reason.as_deref().unwrap_or("remote closed")
                    ));
                }
                self.close();
                None
            }
        }
    }

    pub fn close(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.close();
        }
        self.state = ChannelState::Closed;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Sink that records payloads; clones share the same log.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingSink {
        pub sent: Arc<Mutex<Vec<String>>>,
        pub closed: Arc<Mutex<bool>>,
        pub fail: bool,
    }

    impl RecordingSink {
        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        pub fn is_closed(&self) -> bool {
            *self.closed.lock().unwrap()
        }
    }

    impl FrameSink for RecordingSink {
        fn send(&mut self, payload: String) -> ConsoleResult<()> {
            if self.fail {
                return Err(ConsoleError::Transport("broken pipe".into()));
            }
            self.sent.lock().unwrap().push(payload);
            Ok(())
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    pub fn open_channel(sink: RecordingSink) -> RealtimeChannel<RecordingSink> {
        let mut channel = RealtimeChannel::open(1, sink);
        channel.handle(ChannelEvent::Opened);
        channel
    }
}
