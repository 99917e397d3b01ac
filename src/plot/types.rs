//! Core data types shared by the plot engine

use serde::{Deserialize, Serialize};

/// Smallest fold-change magnitude a threshold may take.
pub const MIN_FOLD_CHANGE_THRESHOLD: f64 = 0.1;
/// Significance threshold bounds, inclusive.
pub const MIN_SIGNIFICANCE_THRESHOLD: f64 = 1e-12;
pub const MAX_SIGNIFICANCE_THRESHOLD: f64 = 1.0;
/// Ceiling for -log10(significance) when significance is zero or underflows.
pub const NEG_LOG10_CEILING: f64 = 10.0;
/// A dataset has a significance channel if any entity exceeds this on the -log10 axis.
pub const SIGNIFICANCE_PRESENT_EPSILON: f64 = 0.01;

pub const DEFAULT_FOLD_CHANGE_THRESHOLD: f64 = 1.0;
pub const DEFAULT_SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// One scored entity as supplied by the host.
///
/// Accepts both the canonical camelCase names and the column names used by
/// volcano-row exports (`gene`, `x`, `log2FC`, `pvalue`, `mean`). Any other
/// field, including a precomputed `status`, is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    #[serde(alias = "gene")]
    pub id: String,
    #[serde(default, alias = "x", alias = "log2FC")]
    pub fold_change: Option<f64>,
    #[serde(default, alias = "pvalue", skip_serializing_if = "Option::is_none")]
    pub significance: Option<f64>,
    #[serde(default, alias = "mean", skip_serializing_if = "Option::is_none")]
    pub mean_expression: Option<f64>,
}

impl EntityRecord {
    pub fn new(id: impl Into<String>, fold_change: f64, significance: Option<f64>) -> Self {
        Self {
            id: id.into(),
            fold_change: Some(fold_change),
            significance,
            mean_expression: None,
        }
    }

    pub fn with_mean(mut self, mean_expression: f64) -> Self {
        self.mean_expression = Some(mean_expression);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegulationStatus {
    Up,
    Down,
    NotSignificant,
}

impl RegulationStatus {
    pub fn is_regulated(self) -> bool {
        !matches!(self, RegulationStatus::NotSignificant)
    }

    pub fn label(self) -> &'static str {
        match self {
            RegulationStatus::Up => "UP",
            RegulationStatus::Down => "DOWN",
            RegulationStatus::NotSignificant => "NS",
        }
    }
}

/// User-adjustable cutoffs. Construct through [`ThresholdState::new`] so both
/// values stay inside their legal ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdState {
    fold_change_threshold: f64,
    significance_threshold: f64,
}

impl Default for ThresholdState {
    fn default() -> Self {
        Self {
            fold_change_threshold: DEFAULT_FOLD_CHANGE_THRESHOLD,
            significance_threshold: DEFAULT_SIGNIFICANCE_THRESHOLD,
        }
    }
}

impl ThresholdState {
    /// Build a threshold pair, clamping each value into range. Non-finite
    /// inputs fall back to the defaults.
    pub fn new(fold_change_threshold: f64, significance_threshold: f64) -> Self {
        let fold_change_threshold = if fold_change_threshold.is_finite() {
            fold_change_threshold.abs().max(MIN_FOLD_CHANGE_THRESHOLD)
        } else {
            DEFAULT_FOLD_CHANGE_THRESHOLD
        };
        let significance_threshold = if significance_threshold.is_finite() {
            significance_threshold.clamp(MIN_SIGNIFICANCE_THRESHOLD, MAX_SIGNIFICANCE_THRESHOLD)
        } else {
            DEFAULT_SIGNIFICANCE_THRESHOLD
        };
        Self {
            fold_change_threshold,
            significance_threshold,
        }
    }

    pub fn fold_change_threshold(&self) -> f64 {
        self.fold_change_threshold
    }

    pub fn significance_threshold(&self) -> f64 {
        self.significance_threshold
    }

    pub fn with_fold_change(self, fold_change_threshold: f64) -> Self {
        Self::new(fold_change_threshold, self.significance_threshold)
    }

    pub fn with_significance(self, significance_threshold: f64) -> Self {
        Self::new(self.fold_change_threshold, significance_threshold)
    }

    /// Position of the significance marker on the -log10 axis.
    pub fn significance_marker(&self) -> f64 {
        -self.significance_threshold.log10()
    }
}

/// Projection selected by the host.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    /// Fold change against -log10 significance ("volcano")
    #[default]
    ScoredScatter,
    /// Mean expression against fold change ("MA")
    MeanDifference,
    /// Bars sorted by fold change, descending
    RankedBar,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [
        ViewMode::ScoredScatter,
        ViewMode::MeanDifference,
        ViewMode::RankedBar,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::ScoredScatter => "Volcano",
            ViewMode::MeanDifference => "MA",
            ViewMode::RankedBar => "Ranked",
        }
    }

    pub fn has_drag_handles(self) -> bool {
        matches!(self, ViewMode::ScoredScatter)
    }
}

/// A point in data space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

impl DataPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}
