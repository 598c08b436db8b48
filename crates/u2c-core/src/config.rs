//! Session configuration and bus speed selection.

use anyhow::Result;
use serde::{Deserialize, Serialize};

const FREQ_HIGH: u32 = 750_000;
const FREQ_FAST: u32 = 400_000;
const FREQ_STANDARD: u32 = 200_000;

/// Hardware bus speed grades, the 2-bit field of the speed-set opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeedGrade {
    /// 20 kHz.
    Low = 0,
    /// 100 kHz.
    #[default]
    Standard = 1,
    /// 400 kHz.
    Fast = 2,
    /// 750 kHz.
    High = 3,
}

impl SpeedGrade {
    /// Classify a target frequency into a hardware grade.
    ///
    /// This is a coarse threshold mapping, not an exact-frequency program;
    /// the controller does not reproduce the requested frequency. Zero
    /// means "unset" and selects the standard grade.
    pub fn from_frequency(hz: u32) -> Self {
        if hz >= FREQ_HIGH {
            Self::High
        } else if hz >= FREQ_FAST {
            Self::Fast
        } else if hz >= FREQ_STANDARD || hz == 0 {
            Self::Standard
        } else {
            Self::Low
        }
    }

    pub(crate) fn bits(self) -> u8 {
        self as u8
    }
}

/// Configuration for a bridge session.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Target bus frequency in hertz; classified into a speed grade.
    pub frequency_hz: Option<u32>,
    /// Bulk transfer deadline in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Speed grade selected by the configured frequency.
    pub fn speed_grade(&self) -> SpeedGrade {
        SpeedGrade::from_frequency(self.frequency_hz.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_thresholds() {
        assert_eq!(SpeedGrade::from_frequency(1_000_000), SpeedGrade::High);
        assert_eq!(SpeedGrade::from_frequency(750_000), SpeedGrade::High);
        assert_eq!(SpeedGrade::from_frequency(749_999), SpeedGrade::Fast);
        assert_eq!(SpeedGrade::from_frequency(400_000), SpeedGrade::Fast);
        assert_eq!(SpeedGrade::from_frequency(399_999), SpeedGrade::Standard);
        assert_eq!(SpeedGrade::from_frequency(200_000), SpeedGrade::Standard);
        assert_eq!(SpeedGrade::from_frequency(199_999), SpeedGrade::Low);
        assert_eq!(SpeedGrade::from_frequency(20_000), SpeedGrade::Low);
    }

    #[test]
    fn unset_frequency_selects_standard() {
        assert_eq!(SpeedGrade::from_frequency(0), SpeedGrade::Standard);
        assert_eq!(BridgeConfig::default().speed_grade(), SpeedGrade::Standard);
    }
}
