use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use super::event::{SessionCommand, SessionEffect, SessionEvent};
use super::stream::StreamSession;
use super::view::SessionView;
use crate::channel::{self, RealtimeChannel};
use crate::prelude::StreamConfig;
use crate::sighting::SightingStore;
use crate::telemetry::LogManager;
use crate::threat::Notification;

/// UI-side handles for a running session.
pub struct SessionHandle {
    pub commands: mpsc::UnboundedSender<SessionCommand>,
    pub view: watch::Receiver<SessionView>,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
}

/// Wires the channels a UI needs and returns the future that drives the
/// session. The future completes after a `Shutdown` command or once every
/// command sender is dropped.
pub fn spawn_parts<T: SightingStore>(
    config: StreamConfig,
    store: Arc<T>,
) -> (SessionHandle, impl std::future::Future<Output = ()> + Send) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = watch::channel(SessionView::idle(
        config.display_width,
        config.display_height,
    ));
    let (note_tx, note_rx) = mpsc::unbounded_channel();
    let handle = SessionHandle {
        commands: command_tx,
        view: view_rx,
        notifications: note_rx,
    };
    (handle, run_session(config, store, command_rx, view_tx, note_tx))
}

/// Drives one session on the current task: capture ticks, channel traffic,
/// operator commands and sighting outcomes are handled strictly one at a time.
pub async fn run_session<T: SightingStore>(
    config: StreamConfig,
    store: Arc<T>,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    view: watch::Sender<SessionView>,
    notifications: mpsc::UnboundedSender<Notification>,
) {
    let logger = LogManager::new("runner");
    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

    let sink = channel::connect(&config.channel_url, 1, notice_tx.clone());
    let mut session = StreamSession::new(config.clone(), RealtimeChannel::open(1, sink));
    view.send_replace(session.view());

    loop {
        let event = tokio::select! {
            _ = session.wait_tick() => SessionEvent::Tick,
            Some(notice) = notice_rx.recv() => SessionEvent::Channel(notice),
            Some(outcome) = outcome_rx.recv() => SessionEvent::SightingSubmitted(outcome),
            command = commands.recv() => {
                SessionEvent::Command(command.unwrap_or(SessionCommand::Shutdown))
            }
        };

        let mut finished = false;
        for effect in session.dispatch(event) {
            match effect {
                SessionEffect::SubmitSighting(sighting) => {
                    let store = Arc::clone(&store);
                    let outcome_tx = outcome_tx.clone();
                    tokio::spawn(async move {
                        let outcome = store.submit(sighting).await;
                        let _ = outcome_tx.send(outcome);
                    });
                }
                SessionEffect::Reconnect => {
                    let generation = session.next_generation();
                    logger.record(&format!("reconnecting as generation {generation}"));
                    let sink = channel::connect(&config.channel_url, generation, notice_tx.clone());
                    session.attach_channel(RealtimeChannel::open(generation, sink));
                }
                SessionEffect::Shutdown => finished = true,
            }
        }

        for note in session.drain_notifications() {
            let _ = notifications.send(note);
        }
        view.send_replace(session.view());

        if finished {
            logger.record("session shut down");
            break;
        }
    }
}
