use super::level::ThreatLevel;
use crate::stream_interface::Detection;

/// Maps a detection set onto a [`ThreatLevel`]. Any critical label wins.
#[derive(Debug, Clone)]
pub struct ThreatClassifier {
    critical_labels: Vec<String>,
}

impl ThreatClassifier {
    pub fn new<I, S>(critical_labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            critical_labels: critical_labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_critical(&self, label: &str) -> bool {
        self.critical_labels.iter().any(|critical| critical == label)
    }

    pub fn classify(&self, detections: &[Detection]) -> ThreatLevel {
        if detections.is_empty() {
            ThreatLevel::None
        } else if self.first_critical(detections).is_some() {
            ThreatLevel::Critical
        } else {
            ThreatLevel::Low
        }
    }

    pub fn first_critical<'a>(&self, detections: &'a [Detection]) -> Option<&'a Detection> {
        detections.iter().find(|det| self.is_critical(&det.label))
    }
}

impl Default for ThreatClassifier {
    fn default() -> Self {
        Self::new(["Submarine", "Mine"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(label: &str) -> Detection {
        Detection::new(label, 0.9, [0.0, 0.0, 10.0, 10.0])
    }

    #[test]
    fn empty_sequence_is_nominal() {
        assert_eq!(ThreatClassifier::default().classify(&[]), ThreatLevel::None);
    }

    #[test]
    fn benign_detections_are_low() {
        let dets = vec![det("Unidentified Debris"), det("Buoy")];
        assert_eq!(ThreatClassifier::default().classify(&dets), ThreatLevel::Low);
    }

    #[test]
    fn one_critical_label_anywhere_forces_critical() {
        let classifier = ThreatClassifier::default();
        for position in 0..10 {
            let mut dets: Vec<Detection> = (0..9).map(|_| det("Unidentified Debris")).collect();
            dets.insert(position, det("Mine"));
            assert_eq!(classifier.classify(&dets), ThreatLevel::Critical);
        }
    }

    #[test]
    fn critical_label_ignores_confidence() {
        let dets = vec![Detection::new("Submarine", 0.01, [0.0; 4])];
        assert_eq!(ThreatClassifier::default().classify(&dets), ThreatLevel::Critical);
    }

    #[test]
    fn labels_match_exactly() {
        let dets = vec![det("Minesweeper"), det("submarine")];
        assert_eq!(ThreatClassifier::default().classify(&dets), ThreatLevel::Low);
    }

    #[test]
    fn configured_labels_replace_defaults() {
        let classifier = ThreatClassifier::new(["Torpedo"]);
        assert_eq!(classifier.classify(&[det("Mine")]), ThreatLevel::Low);
        assert_eq!(classifier.classify(&[det("Torpedo")]), ThreatLevel::Critical);
    }
}
