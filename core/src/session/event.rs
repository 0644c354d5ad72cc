use crate::channel::ChannelNotice;
use crate::prelude::ConsoleResult;
use crate::stream_interface::Sighting;

/// Operator actions.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Start,
    Stop,
    LogSighting { notes: Option<String> },
    Reconnect,
    Shutdown,
}

/// Everything a session reacts to, funnelled through one dispatch point.
#[derive(Debug)]
pub enum SessionEvent {
    Tick,
    Channel(ChannelNotice),
    Command(SessionCommand),
    SightingSubmitted(ConsoleResult<()>),
}

/// Work the session asks its runner to perform outside the dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    SubmitSighting(Sighting),
    Reconnect,
    Shutdown,
}
