//! Camera configuration record and reconfiguration levels.

use serde::{Deserialize, Serialize};

/// Reconfiguration level at or above which settings require a stop/start
/// cycle on the hardware before they take effect.
pub const LEVEL_RECONFIGURE_STOP: u32 = 1;

/// Reconfiguration level for settings applied while streaming.
pub const LEVEL_RECONFIGURE_RUNNING: u32 = 0;

/// One camera configuration request.
///
/// Supplied by an external parameter layer together with a level that
/// classifies how disruptive the change is. Region fields of `0` mean
/// "use the sensor maximum".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Target acquisition frame rate in Hz.
    pub frame_rate: f64,
    /// Whether the fixed frame rate is enforced at all.
    pub frame_rate_enable: bool,
    /// Continuous auto exposure; `exposure_time_us` is ignored when set.
    pub auto_exposure: bool,
    /// Manual exposure time in microseconds.
    pub exposure_time_us: f64,
    /// Continuous auto gain; `gain_db` is ignored when set.
    pub auto_gain: bool,
    /// Manual gain in dB.
    pub gain_db: f64,
    /// Continuous auto white balance on color models.
    pub auto_white_balance: bool,
    /// Region-of-interest left edge in pixels.
    pub offset_x: u32,
    /// Region-of-interest top edge in pixels.
    pub offset_y: u32,
    /// Region-of-interest width in pixels, 0 for the sensor maximum.
    pub width: u32,
    /// Region-of-interest height in pixels, 0 for the sensor maximum.
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            frame_rate_enable: true,
            auto_exposure: true,
            exposure_time_us: 10_000.0,
            auto_gain: true,
            gain_db: 0.0,
            auto_white_balance: true,
            offset_x: 0,
            offset_y: 0,
            width: 0,
            height: 0,
        }
    }
}

impl CameraConfig {
    /// Set the target frame rate.
    #[must_use]
    pub const fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self.frame_rate_enable = true;
        self
    }

    /// Switch to manual exposure with the given time in microseconds.
    #[must_use]
    pub const fn with_exposure_time(mut self, exposure_time_us: f64) -> Self {
        self.auto_exposure = false;
        self.exposure_time_us = exposure_time_us;
        self
    }

    /// Switch to manual gain with the given value in dB.
    #[must_use]
    pub const fn with_gain(mut self, gain_db: f64) -> Self {
        self.auto_gain = false;
        self.gain_db = gain_db;
        self
    }

    /// Restrict capture to a region of interest.
    #[must_use]
    pub const fn with_roi(mut self, offset_x: u32, offset_y: u32, width: u32, height: u32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self.width = width;
        self.height = height;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_auto() {
        let config = CameraConfig::default();
        assert!(config.auto_exposure);
        assert!(config.auto_gain);
        assert_eq!(config.width, 0);
    }

    #[test]
    fn test_manual_builders_disable_auto() {
        let config = CameraConfig::default()
            .with_exposure_time(5_000.0)
            .with_gain(6.0);
        assert!(!config.auto_exposure);
        assert!(!config.auto_gain);
    }

    #[test]
    fn test_roundtrips_through_serde() {
        let config = CameraConfig::default().with_roi(64, 32, 800, 600);
        let json = serde_json::to_string(&config).expect("serialize");
        let back: CameraConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }
}
