use netracore::stream_interface::Sighting;
use serde::{Deserialize, Serialize};

/// A sighting as the backend keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSighting {
    pub id: u64,
    #[serde(flatten)]
    pub sighting: Sighting,
}

#[derive(Debug, Default)]
pub struct SightingLog {
    entries: Vec<StoredSighting>,
}

impl SightingLog {
    pub fn append(&mut self, sighting: Sighting) -> u64 {
        let id = self.entries.len() as u64 + 1;
        self.entries.push(StoredSighting { id, sighting });
        id
    }

    pub fn entries(&self) -> &[StoredSighting] {
        &self.entries
    }
}
