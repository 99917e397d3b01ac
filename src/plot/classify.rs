//! Live regulation classification

use super::dataset::{EntityDataset, PlottedEntity};
use super::types::{RegulationStatus, ThresholdState};

/// Classify one entity against the current thresholds.
///
/// Without a significance channel only the fold change decides. With one, the
/// entity must also carry a significance at or below the threshold; a
/// significance of zero or below counts as maximally significant.
pub fn classify(
    fold_change: f64,
    significance: Option<f64>,
    thresholds: &ThresholdState,
    significance_present: bool,
) -> RegulationStatus {
    let meets_fold_change = fold_change.abs() >= thresholds.fold_change_threshold();
    let meets_significance = !significance_present
        || match significance {
            Some(s) if s.is_nan() => false,
            Some(s) if s <= 0.0 => true,
            Some(s) => s <= thresholds.significance_threshold(),
            None => false,
        };

    if meets_fold_change && meets_significance {
        if fold_change >= 0.0 {
            RegulationStatus::Up
        } else {
            RegulationStatus::Down
        }
    } else {
        RegulationStatus::NotSignificant
    }
}

pub fn classify_entity(
    entity: &PlottedEntity,
    thresholds: &ThresholdState,
    significance_present: bool,
) -> RegulationStatus {
    classify(
        entity.fold_change,
        entity.significance,
        thresholds,
        significance_present,
    )
}

/// Status of every entity, in dataset order.
pub fn classify_all(dataset: &EntityDataset, thresholds: &ThresholdState) -> Vec<RegulationStatus> {
    let present = dataset.significance_present();
    dataset
        .entities()
        .iter()
        .map(|e| classify_entity(e, thresholds, present))
        .collect()
}

/// Sign-only status used by the ranked bar view, which has no significance axis.
pub fn sign_status(fold_change: f64) -> RegulationStatus {
    if fold_change > 0.0 {
        RegulationStatus::Up
    } else if fold_change < 0.0 {
        RegulationStatus::Down
    } else {
        RegulationStatus::NotSignificant
    }
}

/// Identifiers of every entity currently classified UP or DOWN.
pub fn passing_identifiers(dataset: &EntityDataset, statuses: &[RegulationStatus]) -> Vec<String> {
    dataset
        .entities()
        .iter()
        .zip(statuses)
        .filter(|(_, status)| status.is_regulated())
        .map(|(e, _)| e.id.clone())
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegulationSummary {
    pub up: usize,
    pub down: usize,
    pub not_significant: usize,
}

impl RegulationSummary {
    pub fn from_statuses(statuses: &[RegulationStatus]) -> Self {
        let mut summary = Self::default();
        for status in statuses {
            match status {
                RegulationStatus::Up => summary.up += 1,
                RegulationStatus::Down => summary.down += 1,
                RegulationStatus::NotSignificant => summary.not_significant += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.up + self.down + self.not_significant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_change_only_without_significance_channel() {
        let t = ThresholdState::default();
        assert_eq!(classify(1.5, None, &t, false), RegulationStatus::Up);
        assert_eq!(classify(-1.0, None, &t, false), RegulationStatus::Down);
        assert_eq!(classify(0.5, None, &t, false), RegulationStatus::NotSignificant);
        // significance value ignored entirely
        assert_eq!(classify(2.0, Some(0.9), &t, false), RegulationStatus::Up);
    }

    #[test]
    fn significance_gate_applies_when_channel_present() {
        let t = ThresholdState::default();
        assert_eq!(classify(2.0, Some(0.01), &t, true), RegulationStatus::Up);
        assert_eq!(classify(2.0, Some(0.05), &t, true), RegulationStatus::Up);
        assert_eq!(classify(2.0, Some(0.2), &t, true), RegulationStatus::NotSignificant);
        assert_eq!(classify(2.0, None, &t, true), RegulationStatus::NotSignificant);
        assert_eq!(classify(0.2, Some(0.001), &t, true), RegulationStatus::NotSignificant);
    }

    #[test]
    fn non_positive_significance_passes_the_gate() {
        let t = ThresholdState::default();
        assert_eq!(classify(-2.0, Some(0.0), &t, true), RegulationStatus::Down);
        assert_eq!(classify(2.0, Some(-1.0), &t, true), RegulationStatus::Up);
        assert_eq!(classify(2.0, Some(f64::NAN), &t, true), RegulationStatus::NotSignificant);
    }

    #[test]
    fn zero_fold_change_is_never_regulated() {
        let t = ThresholdState::new(0.1, 0.05);
        assert_eq!(classify(0.0, None, &t, false), RegulationStatus::NotSignificant);
        assert_eq!(sign_status(0.0), RegulationStatus::NotSignificant);
        assert_eq!(sign_status(-0.3), RegulationStatus::Down);
    }

    #[test]
    fn summary_counts_each_status() {
        let statuses = [
            RegulationStatus::Up,
            RegulationStatus::Up,
            RegulationStatus::Down,
            RegulationStatus::NotSignificant,
        ];
        let summary = RegulationSummary::from_statuses(&statuses);
        assert_eq!(summary.up, 2);
        assert_eq!(summary.down, 1);
        assert_eq!(summary.not_significant, 1);
        assert_eq!(summary.total(), 4);
    }
}
