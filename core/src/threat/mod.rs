pub mod classifier;
pub mod level;
pub mod notifier;

pub use classifier::ThreatClassifier;
pub use level::ThreatLevel;
pub use notifier::{Notification, Severity, ThreatNotifier};
