use serde::{Deserialize, Serialize};

use super::detection::Detection;

/// Operator-annotated snapshot handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub timestamp: String,
    pub notes: String,
    pub snapshot: String,
    pub detections: Vec<Detection>,
}
