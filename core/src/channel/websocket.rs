use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::realtime::{ChannelEvent, ChannelNotice, FrameSink};
use crate::prelude::{ConsoleError, ConsoleResult};
use crate::telemetry::LogManager;

/// Websocket-backed [`FrameSink`].
///
/// Holds at most one pending outbound frame: a newer frame replaces one the
/// socket has not written yet.
pub struct WsFrameSink {
    outbound: Option<watch::Sender<Option<String>>>,
}

impl FrameSink for WsFrameSink {
    fn send(&mut self, payload: String) -> ConsoleResult<()> {
        let outbound = self
            .outbound
            .as_ref()
            .ok_or(ConsoleError::ChannelNotOpen)?;
        outbound
            .send(Some(payload))
            .map_err(|_| ConsoleError::Transport("connection task has ended".into()))
    }

    /// Dropping the outbound sender makes the connection task send a close
    /// frame and exit.
    fn close(&mut self) {
        self.outbound.take();
    }
}

/// Starts the handshake with `url` in the background. Lifecycle and inbound
/// text arrive on `notices` tagged with `generation`.
pub fn connect(
    url: &str,
    generation: u64,
    notices: mpsc::UnboundedSender<ChannelNotice>,
) -> WsFrameSink {
    let (outbound_tx, outbound_rx) = watch::channel(None);
    tokio::spawn(run_connection(
        url.to_string(),
        generation,
        outbound_rx,
        notices,
    ));
    WsFrameSink {
        outbound: Some(outbound_tx),
    }
}

async fn run_connection(
    url: String,
    generation: u64,
    mut outbound: watch::Receiver<Option<String>>,
    notices: mpsc::UnboundedSender<ChannelNotice>,
) {
    let logger = LogManager::new("websocket");
    let notify = |event: ChannelEvent| {
        let _ = notices.send(ChannelNotice { generation, event });
    };

    logger.record(&format!("connecting to {url} (generation {generation})"));
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(err) => {
            logger.warn(&format!("handshake with {url} failed: {err}"));
            notify(ChannelEvent::Closed(Some(err.to_string())));
            return;
        }
    };
    notify(ChannelEvent::Opened);

    let (mut write, mut read) = stream.split();
    let reason = loop {
        tokio::select! {
            changed = outbound.changed() => {
                if changed.is_err() {
                    let _ = write.send(Message::Close(None)).await;
                    break Some("closed locally".to_string());
                }
                let pending = outbound.borrow_and_update().clone();
                if let Some(payload) = pending {
                    if let Err(err) = write.send(Message::Text(payload)).await {
                        break Some(err.to_string());
                    }
                }
            }
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => notify(ChannelEvent::Message(text)),
                Some(Ok(Message::Close(frame))) => {
                    break frame.map(|f| f.reason.to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => break Some(err.to_string()),
                None => break None,
            }
        }
    };
    notify(ChannelEvent::Closed(reason));
}

#[cfg(test)]
pub(crate) mod testing {
    use std::future::Future;
    use warp::ws::{WebSocket, Ws};
    use warp::Filter;

    /// Serves `handler` for every connection on an ephemeral local port and
    /// returns the websocket URL.
    pub fn spawn_endpoint<H, F>(handler: H) -> String
    where
        H: Fn(WebSocket) -> F + Clone + Send + Sync + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        let route = warp::path("ws")
            .and(warp::path("live-enhance"))
            .and(warp::ws())
            .map(move |ws: Ws| {
                let handler = handler.clone();
                ws.on_upgrade(move |socket| handler(socket))
            });
        let (address, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("ws://{address}/ws/live-enhance/")
    }
}
