// src/config.rs
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::palette::DensityScale;
use crate::types::SignalKind;
use crate::views::ViewerError;

pub const CONFIG_ENV: &str = "SIGNAL_SCOPE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "signal-scope.json";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeWindow {
    pub seconds: f64,
}

impl TimeWindow {
    pub fn new(seconds: f64) -> Self {
        Self {
            seconds: if seconds.is_finite() { seconds.max(0.1) } else { 0.1 },
        }
    }

    /// `floor(seconds * rate)`, at least one sample.
    pub fn samples(&self, sample_rate_hz: f64) -> usize {
        ((self.seconds * sample_rate_hz).floor() as usize).max(1)
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        // Scrolling recorder and polar revolution both span 10 seconds.
        TimeWindow { seconds: 10.0 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    pub channels: usize,
    pub sampling_rate: f64,
    pub duration_seconds: f64,
    pub seed: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            channels: 4,
            sampling_rate: 250.0,
            duration_seconds: 30.0,
            seed: 7,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub viewport_seconds: f64,
    pub polar_window_seconds: f64,
    pub polar_highlight_points: usize,
    pub default_chunk_seconds: f64,
    pub default_zoom: f64,
    pub density_scale: DensityScale,
    pub progressive_density: bool,
    pub signal_kind: SignalKind,
    pub demo: DemoConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            viewport_seconds: 10.0,
            polar_window_seconds: 10.0,
            polar_highlight_points: 500,
            default_chunk_seconds: 1.0,
            default_zoom: 1.0,
            density_scale: DensityScale::Log,
            progressive_density: true,
            signal_kind: SignalKind::Generic,
            demo: DemoConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn viewport(&self) -> TimeWindow {
        TimeWindow::new(self.viewport_seconds)
    }

    pub fn polar_window(&self) -> TimeWindow {
        TimeWindow::new(self.polar_window_seconds)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ViewerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ViewerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// `$SIGNAL_SCOPE_CONFIG`, then `./signal-scope.json`, then defaults.
    pub fn discover() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                local.exists().then_some(local)
            });
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => {
                info!("loaded viewer config from {}", path.display());
                config
            }
            Err(err) => {
                warn!("ignoring config {}: {err}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_samples_floor() {
        assert_eq!(TimeWindow::new(10.0).samples(250.0), 2500);
        assert_eq!(TimeWindow::new(0.5).samples(3.0), 1);
        assert_eq!(TimeWindow::new(0.0).seconds, 0.1);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ViewerConfig::from_json_str(
            r#"{"signal_kind": "ecg", "density_scale": "linear", "demo": {"channels": 12}}"#,
        )
        .unwrap();
        assert_eq!(config.signal_kind, SignalKind::Ecg);
        assert_eq!(config.density_scale, DensityScale::Linear);
        assert_eq!(config.demo.channels, 12);
        assert_eq!(config.demo.sampling_rate, 250.0);
        assert_eq!(config.polar_highlight_points, 500);
    }

    #[test]
    fn bad_config_is_an_error() {
        assert!(ViewerConfig::from_json_str(r#"{"signal_kind": "radar"}"#).is_err());
    }
}
