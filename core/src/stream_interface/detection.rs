use serde::{Deserialize, Serialize};

/// One externally produced detection, boxed in the normalization space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: [f32; 4],
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: [f32; 4]) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    /// Overlay caption, e.g. `Mine (87%)`.
    pub fn caption(&self) -> String {
        let percent = (self.confidence * 100.0).round() as i64;
        format!("{} ({}%)", self.label, percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_rounds_confidence_to_whole_percent() {
        assert_eq!(Detection::new("Mine", 0.874, [0.0; 4]).caption(), "Mine (87%)");
        assert_eq!(Detection::new("Buoy", 0.995, [0.0; 4]).caption(), "Buoy (100%)");
    }

    #[test]
    fn detection_reads_integer_box_from_wire() {
        let det: Detection =
            serde_json::from_str(r#"{"label":"Submarine","box":[10,20,110,90],"confidence":0.91}"#)
                .unwrap();
        assert_eq!(det.bbox, [10.0, 20.0, 110.0, 90.0]);
        assert_eq!(det.label, "Submarine");
    }
}
