//! Normalized, render-ready view of the host's entity records

use std::collections::HashSet;

use super::types::{
    EntityRecord, NEG_LOG10_CEILING, SIGNIFICANCE_PRESENT_EPSILON, ViewMode,
};

/// An entity that can be plotted, with its derived values.
#[derive(Debug, Clone, PartialEq)]
pub struct PlottedEntity {
    pub id: String,
    pub fold_change: f64,
    pub significance: Option<f64>,
    pub neg_log10_significance: f64,
    /// Mean expression, 0 when the record carried none.
    pub mean_expression: f64,
    pub has_mean_expression: bool,
}

/// Entities in host order, plus the orderings each view mode indexes by.
#[derive(Debug, Clone, Default)]
pub struct EntityDataset {
    entities: Vec<PlottedEntity>,
    dataset_order: Vec<usize>,
    ranked_order: Vec<usize>,
    significance_present: bool,
    has_mean_expression: bool,
    excluded: usize,
}

/// -log10 of a significance value, never NaN or infinite.
pub fn neg_log10_significance(significance: Option<f64>) -> f64 {
    match significance {
        None => 0.0,
        Some(s) if s.is_nan() => 0.0,
        Some(s) if s <= 0.0 => NEG_LOG10_CEILING,
        Some(s) if s >= 1.0 => 0.0,
        Some(s) => {
            let v = -s.log10();
            if v.is_finite() {
                v.min(NEG_LOG10_CEILING)
            } else {
                NEG_LOG10_CEILING
            }
        }
    }
}

impl EntityDataset {
    /// Normalize host records. The input slice is only read; records without
    /// a finite fold change are excluded.
    pub fn from_records(records: &[EntityRecord]) -> Self {
        let mut entities = Vec::with_capacity(records.len());
        let mut excluded = 0;
        let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
        let mut duplicates = 0;

        for record in records {
            let Some(fold_change) = record.fold_change.filter(|fc| fc.is_finite()) else {
                excluded += 1;
                continue;
            };
            if !seen.insert(record.id.as_str()) {
                duplicates += 1;
            }
            let mean = record.mean_expression.filter(|m| m.is_finite());
            entities.push(PlottedEntity {
                id: record.id.clone(),
                fold_change,
                significance: record.significance,
                neg_log10_significance: neg_log10_significance(record.significance),
                mean_expression: mean.unwrap_or(0.0),
                has_mean_expression: mean.is_some(),
            });
        }

        if excluded > 0 {
            tracing::warn!(excluded, "records without a usable fold change were not plotted");
        }
        if duplicates > 0 {
            tracing::warn!(duplicates, "dataset contains duplicate identifiers");
        }

        let significance_present = entities
            .iter()
            .any(|e| e.neg_log10_significance > SIGNIFICANCE_PRESENT_EPSILON);
        let has_mean_expression = entities.iter().any(|e| e.has_mean_expression);

        let dataset_order: Vec<usize> = (0..entities.len()).collect();
        let mut ranked_order = dataset_order.clone();
        // sort_by is stable, so ties keep their dataset order
        ranked_order.sort_by(|&a, &b| {
            entities[b]
                .fold_change
                .total_cmp(&entities[a].fold_change)
        });

        Self {
            entities,
            dataset_order,
            ranked_order,
            significance_present,
            has_mean_expression,
            excluded,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[PlottedEntity] {
        &self.entities
    }

    pub fn get(&self, index: usize) -> Option<&PlottedEntity> {
        self.entities.get(index)
    }

    pub fn significance_present(&self) -> bool {
        self.significance_present
    }

    pub fn has_mean_expression(&self) -> bool {
        self.has_mean_expression
    }

    /// Number of host records that could not be plotted.
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Dataset indices sorted by fold change, descending.
    pub fn ranked_order(&self) -> &[usize] {
        &self.ranked_order
    }

    /// Ordering that a mode's render indices refer to: position `i` in the
    /// mode's series is dataset entity `order(mode)[i]`.
    pub fn order(&self, mode: ViewMode) -> &[usize] {
        match mode {
            ViewMode::ScoredScatter | ViewMode::MeanDifference => &self.dataset_order,
            ViewMode::RankedBar => &self.ranked_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, fc: Option<f64>, p: Option<f64>) -> EntityRecord {
        EntityRecord {
            id: id.to_string(),
            fold_change: fc,
            significance: p,
            mean_expression: None,
        }
    }

    #[test]
    fn neg_log10_is_capped_and_finite() {
        assert_eq!(neg_log10_significance(Some(0.0)), NEG_LOG10_CEILING);
        assert_eq!(neg_log10_significance(Some(-0.5)), NEG_LOG10_CEILING);
        assert_eq!(neg_log10_significance(Some(1e-300)), NEG_LOG10_CEILING);
        assert_eq!(neg_log10_significance(Some(f64::MIN_POSITIVE / 1e10)), NEG_LOG10_CEILING);
        assert_eq!(neg_log10_significance(Some(1.0)), 0.0);
        assert_eq!(neg_log10_significance(Some(f64::NAN)), 0.0);
        assert_eq!(neg_log10_significance(None), 0.0);
        assert!((neg_log10_significance(Some(0.001)) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn missing_or_non_finite_fold_change_is_excluded() {
        let records = vec![
            record("A", Some(1.0), None),
            record("B", None, Some(0.01)),
            record("C", Some(f64::NAN), None),
            record("D", Some(f64::INFINITY), None),
        ];
        let dataset = EntityDataset::from_records(&records);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.excluded(), 3);
        assert_eq!(dataset.entities()[0].id, "A");
    }

    #[test]
    fn significance_channel_requires_a_value_above_epsilon() {
        let none = EntityDataset::from_records(&[record("A", Some(1.0), None)]);
        assert!(!none.significance_present());

        // -log10(0.99) is about 0.0044, below the epsilon
        let weak = EntityDataset::from_records(&[record("A", Some(1.0), Some(0.99))]);
        assert!(!weak.significance_present());

        let some = EntityDataset::from_records(&[
            record("A", Some(1.0), None),
            record("B", Some(1.0), Some(0.5)),
        ]);
        assert!(some.significance_present());
    }

    #[test]
    fn ranked_order_is_descending_and_stable() {
        let records = vec![
            record("low", Some(-1.0), None),
            record("tie_a", Some(2.0), None),
            record("high", Some(5.0), None),
            record("tie_b", Some(2.0), None),
            record("tie_c", Some(2.0), None),
        ];
        let dataset = EntityDataset::from_records(&records);
        let ids: Vec<&str> = dataset
            .ranked_order()
            .iter()
            .map(|&i| dataset.entities()[i].id.as_str())
            .collect();
        assert_eq!(ids, vec!["high", "tie_a", "tie_b", "tie_c", "low"]);
    }

    #[test]
    fn absent_mean_expression_plots_at_zero() {
        let mut with_mean = record("A", Some(1.0), None);
        with_mean.mean_expression = Some(7.5);
        let dataset = EntityDataset::from_records(&[with_mean, record("B", Some(1.0), None)]);
        assert!(dataset.has_mean_expression());
        assert_eq!(dataset.entities()[0].mean_expression, 7.5);
        assert_eq!(dataset.entities()[1].mean_expression, 0.0);
        assert!(!dataset.entities()[1].has_mean_expression);
    }
}
