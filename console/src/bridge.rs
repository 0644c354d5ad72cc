use anyhow::Context;
use netracore::session::{spawn_parts, SessionHandle};
use netracore::sighting::HttpSightingStore;
use netracore::StreamConfig;
use std::sync::Arc;
use std::thread;
use tokio::runtime::Builder;

/// Runs the streaming session on its own thread and hands back the UI side.
pub fn launch(config: StreamConfig) -> anyhow::Result<SessionHandle> {
    let store = Arc::new(HttpSightingStore::new(config.sighting_endpoint()));
    let (handle, session) = spawn_parts(config, store);
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for the streaming session")?;
    thread::Builder::new()
        .name("stream-session".into())
        .spawn(move || runtime.block_on(session))
        .context("spawning the streaming session thread")?;
    Ok(handle)
}
