use serde::{Deserialize, Serialize};

/// Derived classification of the current detection set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum ThreatLevel {
    #[default]
    None,
    Low,
    Critical,
}

impl ThreatLevel {
    pub fn label(self) -> &'static str {
        match self {
            ThreatLevel::None => "NOMINAL",
            ThreatLevel::Low => "CAUTION",
            ThreatLevel::Critical => "THREAT DETECTED",
        }
    }

    /// Banner colour as `#rrggbb`.
    pub fn color(self) -> &'static str {
        match self {
            ThreatLevel::None => "#34a853",
            ThreatLevel::Low => "#ffc107",
            ThreatLevel::Critical => "#dc3545",
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            ThreatLevel::None => [0x34, 0xa8, 0x53],
            ThreatLevel::Low => [0xff, 0xc1, 0x07],
            ThreatLevel::Critical => [0xdc, 0x35, 0x45],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_totally_ordered() {
        assert!(ThreatLevel::None < ThreatLevel::Low);
        assert!(ThreatLevel::Low < ThreatLevel::Critical);
        assert_eq!(ThreatLevel::default(), ThreatLevel::None);
    }

    #[test]
    fn rgb_matches_hex_colour() {
        for level in [ThreatLevel::None, ThreatLevel::Low, ThreatLevel::Critical] {
            let [r, g, b] = level.rgb();
            assert_eq!(format!("#{r:02x}{g:02x}{b:02x}"), level.color());
        }
    }
}
