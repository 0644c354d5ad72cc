use log::{debug, info, warn};

/// Namespaced front for the `log` facade.
#[derive(Debug, Clone, Copy)]
pub struct LogManager {
    namespace: &'static str,
}

impl LogManager {
    pub fn new(namespace: &'static str) -> Self {
        Self { namespace }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.namespace, message);
    }

    pub fn trace(&self, message: &str) {
        debug!("[{}] {}", self.namespace, message);
    }

    pub fn warn(&self, message: &str) {
        warn!("[{}] {}", self.namespace, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("netra")
    }
}
