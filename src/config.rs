use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ExplorerError, Result};
use crate::plot::types::{DEFAULT_FOLD_CHANGE_THRESHOLD, DEFAULT_SIGNIFICANCE_THRESHOLD};
use crate::plot::{InteractionRadii, ThresholdState, ViewMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "ThresholdConfig::default_fold_change")]
    pub fold_change: f64,
    #[serde(default = "ThresholdConfig::default_significance")]
    pub significance: f64,
}

impl ThresholdConfig {
    fn default_fold_change() -> f64 {
        DEFAULT_FOLD_CHANGE_THRESHOLD
    }
    fn default_significance() -> f64 {
        DEFAULT_SIGNIFICANCE_THRESHOLD
    }

    /// Initial thresholds, clamped into the legal ranges.
    pub fn to_state(&self) -> ThresholdState {
        ThresholdState::new(self.fold_change, self.significance)
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            fold_change: Self::default_fold_change(),
            significance: Self::default_significance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub mode: ViewMode,
    #[serde(default = "ViewConfig::default_point_radius")]
    pub point_radius: f32,
    #[serde(default = "ViewConfig::default_pick_radius")]
    pub pick_radius: f32,
    #[serde(default = "ViewConfig::default_handle_radius")]
    pub handle_radius: f32,
}

impl ViewConfig {
    fn default_point_radius() -> f32 {
        3.0
    }
    fn default_pick_radius() -> f32 {
        6.0
    }
    fn default_handle_radius() -> f32 {
        8.0
    }

    pub fn radii(&self) -> InteractionRadii {
        let fallback = InteractionRadii::default();
        let sane = |r: f32, d: f32| if r.is_finite() && r > 0.0 { r } else { d };
        InteractionRadii {
            pick: sane(self.pick_radius, fallback.pick),
            handle: sane(self.handle_radius, fallback.handle),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            mode: ViewMode::default(),
            point_radius: Self::default_point_radius(),
            pick_radius: Self::default_pick_radius(),
            handle_radius: Self::default_handle_radius(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "WindowConfig::default_width")]
    pub width: f32,
    #[serde(default = "WindowConfig::default_height")]
    pub height: f32,
}

impl WindowConfig {
    fn default_width() -> f32 {
        1200.0
    }
    fn default_height() -> f32 {
        800.0
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Read `path`, or write the defaults there when it does not exist.
    /// Unreadable or invalid files fall back to the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            let loaded = fs::read_to_string(path)
                .map_err(ExplorerError::from)
                .and_then(|text| Self::from_toml(&text));
            return match loaded {
                Ok(cfg) => {
                    tracing::debug!(path = %path.display(), "config loaded");
                    cfg
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "config unusable, using defaults");
                    Self::default()
                }
            };
        }

        let cfg = Self::default();
        match cfg.write(path) {
            Ok(()) => tracing::info!(path = %path.display(), "default config written"),
            Err(err) => tracing::warn!(path = %path.display(), %err, "failed to write default config"),
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_or_default_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("de_explorer.toml");
        let cfg = AppConfig::load_or_default(&path);
        assert_eq!(cfg, AppConfig::default());
        assert!(path.exists(), "config file should be created");
        let reread = AppConfig::load_or_default(&path);
        assert_eq!(reread, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [thresholds]
            significance = 0.01

            [view]
            mode = "ranked-bar"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.thresholds.fold_change, 1.0);
        assert_eq!(cfg.thresholds.significance, 0.01);
        assert_eq!(cfg.view.mode, ViewMode::RankedBar);
        assert_eq!(cfg.view.pick_radius, 6.0);
        assert_eq!(cfg.window, WindowConfig::default());
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[view]\nmode = 42\n").unwrap();
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let cfg = AppConfig::from_toml(
            "[thresholds]\nfold_change = 0.0\nsignificance = 5.0\n[view]\npick_radius = -1.0\n",
        )
        .unwrap();
        let state = cfg.thresholds.to_state();
        assert_eq!(state.fold_change_threshold(), 0.1);
        assert_eq!(state.significance_threshold(), 1.0);
        assert_eq!(cfg.view.radii().pick, 6.0);
    }
}
