pub mod event;
pub mod runner;
pub mod stream;
pub mod view;

pub use event::{SessionCommand, SessionEffect, SessionEvent};
pub use runner::{run_session, spawn_parts, SessionHandle};
pub use stream::StreamSession;
pub use view::SessionView;
