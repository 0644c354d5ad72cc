use clap::Parser;
use iced::{
    time,
    widget::{button, column, container, image, row, scrollable, text, text_input, Column},
    Alignment, Color, Element, Length, Subscription, Task, Theme,
};
use ::image::RgbaImage;
use netracore::channel::ChannelState;
use netracore::session::{SessionCommand, SessionHandle, SessionView};
use netracore::threat::{Notification, Severity};
use std::sync::Arc;
use std::time::Duration;

mod bridge;
mod config;

const HISTORY_LIMIT: usize = 20;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let stream_config = config::Args::parse().into_config()?;
    log::info!(
        "[console] channel {} sightings {}",
        stream_config.channel_url,
        stream_config.sighting_endpoint()
    );

    iced::application(
        move || Console::boot(stream_config.clone()),
        Console::update,
        Console::view,
    )
    .title(application_title)
    .subscription(application_subscription)
    .theme(application_theme)
    .run()
    .map_err(|err| anyhow::anyhow!("console window failed: {err}"))
}

fn application_title(_: &Console) -> String {
    "NETRA Live Mission".into()
}

fn application_subscription(_: &Console) -> Subscription<Message> {
    time::every(Duration::from_millis(100)).map(|_| Message::Tick)
}

fn application_theme(_: &Console) -> Theme {
    Theme::Dark
}

struct Console {
    session: Option<SessionHandle>,
    view: SessionView,
    frame: image::Handle,
    notes: String,
    status: String,
    history: Vec<Notification>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    Start,
    Stop,
    Reconnect,
    NotesChanged(String),
    LogSighting,
}

impl Console {
    fn boot(stream_config: netracore::StreamConfig) -> (Self, Task<Message>) {
        let view = SessionView::idle(stream_config.display_width, stream_config.display_height);
        let (session, status) = match bridge::launch(stream_config) {
            Ok(handle) => (Some(handle), "Connecting to analysis backend...".to_string()),
            Err(err) => {
                log::warn!("[console] {err:#}");
                (None, format!("Session unavailable: {err:#}"))
            }
        };
        let frame = frame_handle(&view.frame);
        (
            Console {
                session,
                view,
                frame,
                notes: String::new(),
                status,
                history: Vec::new(),
            },
            Task::none(),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => state.poll_session(),
            Message::Start => state.command(SessionCommand::Start),
            Message::Stop => state.command(SessionCommand::Stop),
            Message::Reconnect => state.command(SessionCommand::Reconnect),
            Message::NotesChanged(notes) => state.notes = notes,
            Message::LogSighting => {
                if Controls::for_view(&state.view).streaming {
                    let notes = std::mem::take(&mut state.notes);
                    state.command(SessionCommand::LogSighting { notes: Some(notes) });
                }
            }
        }
        Task::none()
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let threat = state.view.threat;
        let [r, g, b] = threat.rgb();
        let banner_color = Color::from_rgb8(r, g, b);
        let banner = container(text(format!("STATUS: {}", threat.label())).size(22))
            .padding(10)
            .width(Length::Fill)
            .style(move |_theme: &Theme| container::Style {
                background: Some(banner_color.into()),
                text_color: Some(Color::WHITE),
                ..container::Style::default()
            });

        let telemetry = state.view.telemetry;
        let stats = row![
            text(format!("Server: {} ms", telemetry.server_time_ms.round())).size(16),
            text(format!("Latency: {} ms", telemetry.latency_ms)).size(16),
            text(format!("FPS: {}", telemetry.fps)).size(16),
            text(format!("Link: {}", state.view.channel.label())).size(16),
        ]
        .spacing(24);

        let controls = Controls::for_view(&state.view);
        let buttons = row![
            button("Start")
                .on_press_maybe(controls.start.then_some(Message::Start))
                .padding(10),
            button("Stop")
                .on_press_maybe(controls.stop.then_some(Message::Stop))
                .padding(10),
            button("Reconnect")
                .on_press_maybe(controls.reconnect.then_some(Message::Reconnect))
                .padding(10),
        ]
        .spacing(10);

        let live = image(state.frame.clone())
            .width(Length::Fixed(state.view.frame.width() as f32))
            .height(Length::Fixed(state.view.frame.height() as f32));

        let mut feed_column = Column::new().spacing(12).padding(16).width(Length::Fill);
        if controls.streaming {
            feed_column = feed_column.push(banner);
        }
        feed_column = feed_column.push(stats).push(live).push(buttons);
        if controls.streaming {
            feed_column = feed_column.push(
                row![
                    text_input("Notes for this sighting", &state.notes)
                        .on_input(Message::NotesChanged)
                        .on_submit(Message::LogSighting)
                        .padding(6),
                    button("Log Sighting")
                        .on_press(Message::LogSighting)
                        .padding(10),
                ]
                .spacing(10)
                .align_y(Alignment::Center),
            );
        }
        feed_column = feed_column.push(text(&state.status).size(14));

        let detections = if state.view.detections.is_empty() {
            Column::new().push(text("No contacts").size(12))
        } else {
            state
                .view
                .detections
                .iter()
                .fold(Column::new().spacing(4), |col, det| {
                    col.push(text(det.caption()).size(12))
                })
        };

        let history = if state.history.is_empty() {
            Column::new().push(text("No alerts yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, note| {
                    col.push(
                        text(note.message.clone())
                            .size(12)
                            .color(severity_color(note.severity)),
                    )
                })
        };

        let metrics = state.view.metrics;
        let side_column = column![
            text("Source").size(18),
            text(state.view.source.clone().unwrap_or_else(|| "idle".into())).size(12),
            text("Contacts").size(18),
            container(detections).padding(6),
            text("Alerts").size(18),
            container(scrollable(history).height(Length::Fixed(220.0))).padding(6),
            text("Counters").size(18),
            text(format!(
                "sent {} / dropped {} / capture failures {}",
                metrics.frames_sent, metrics.frames_dropped, metrics.capture_failures
            ))
            .size(12),
            text(format!(
                "received {} / invalid {}",
                metrics.messages_received, metrics.invalid_messages
            ))
            .size(12),
        ]
        .spacing(8)
        .padding(16)
        .width(Length::Fixed(320.0));

        container(
            row![feed_column, side_column]
                .spacing(20)
                .align_y(Alignment::Start)
                .padding(20),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
    }

    fn poll_session(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let latest = session.view.borrow().clone();
        if !Arc::ptr_eq(&latest.frame, &self.view.frame) {
            self.frame = frame_handle(&latest.frame);
        }
        self.view = latest;

        let mut notes = Vec::new();
        while let Ok(note) = session.notifications.try_recv() {
            notes.push(note);
        }
        for note in notes {
            self.status = note.message.clone();
            self.push_history(note);
        }
    }

    fn command(&mut self, command: SessionCommand) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.commands.send(command).is_err() {
            self.status = "Streaming session has ended.".into();
            self.session = None;
        }
    }

    fn push_history(&mut self, note: Notification) {
        self.history.push(note);
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = session.commands.send(SessionCommand::Shutdown);
        }
    }
}

/// Which controls are live for a session state. The threat banner and the
/// sighting form only exist while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Controls {
    start: bool,
    stop: bool,
    reconnect: bool,
    streaming: bool,
}

impl Controls {
    fn for_view(view: &SessionView) -> Self {
        Self {
            start: view.channel == ChannelState::Open && !view.streaming,
            stop: view.streaming,
            reconnect: view.channel == ChannelState::Closed,
            streaming: view.streaming,
        }
    }
}

fn frame_handle(frame: &RgbaImage) -> image::Handle {
    image::Handle::from_rgba(frame.width(), frame.height(), frame.as_raw().clone())
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Success => Color::from_rgb8(0x34, 0xa8, 0x53),
        Severity::Warning => Color::from_rgb8(0xff, 0xc1, 0x07),
        Severity::Error => Color::from_rgb8(0xdc, 0x35, 0x45),
    }
}
