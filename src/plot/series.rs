//! Renderable series for each view mode
//!
//! Building a series never touches the dataset; switching modes only changes
//! which projection is produced and which drag handles come with it.

use egui::{Pos2, Rect};

use super::classify::{classify_entity, sign_status};
use super::dataset::EntityDataset;
use super::drag::HandleId;
use super::transform::{AxisRange, CoordinateTransform, LinearTransform};
use super::types::{
    DEFAULT_FOLD_CHANGE_THRESHOLD, DEFAULT_SIGNIFICANCE_THRESHOLD, DataPoint, RegulationStatus,
    ThresholdState, ViewMode,
};

const EXTENT_PADDING: f64 = 0.05;
const BAR_WIDTH_FRACTION: f64 = 0.8;
/// Handles sit this far inside the plot edge.
const HANDLE_INSET: f32 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPoint {
    /// Index in the mode's ordering (what a brush reports).
    pub order_index: usize,
    pub dataset_index: usize,
    pub data: DataPoint,
    pub pixel: Pos2,
    pub status: RegulationStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBar {
    pub order_index: usize,
    pub dataset_index: usize,
    pub fold_change: f64,
    pub rect: Rect,
    pub status: RegulationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOrientation {
    Vertical,
    Horizontal,
}

/// A threshold or reference line, already in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLine {
    pub orientation: MarkerOrientation,
    pub value: f64,
    pub from: Pos2,
    pub to: Pos2,
    /// Handle that moves this line, `None` for fixed reference lines.
    pub handle: Option<HandleId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleGeometry {
    pub id: HandleId,
    pub center: Pos2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSeries {
    pub mode: ViewMode,
    pub plot_rect: Rect,
    pub x_range: AxisRange,
    pub y_range: AxisRange,
    pub points: Vec<RenderedPoint>,
    pub bars: Vec<RenderedBar>,
    pub markers: Vec<MarkerLine>,
    pub handles: Vec<HandleGeometry>,
}

impl RenderedSeries {
    pub fn x_label(&self) -> &'static str {
        match self.mode {
            ViewMode::ScoredScatter => "log2 fold change",
            ViewMode::MeanDifference => "mean expression",
            ViewMode::RankedBar => "rank",
        }
    }

    pub fn y_label(&self) -> &'static str {
        match self.mode {
            ViewMode::ScoredScatter => "-log10 significance",
            ViewMode::MeanDifference | ViewMode::RankedBar => "log2 fold change",
        }
    }

    pub fn handle(&self, id: HandleId) -> Option<&HandleGeometry> {
        self.handles.iter().find(|h| h.id == id)
    }
}

/// Axis extents for a mode. Depends on the data only, so the mapping under
/// the pointer does not move while a threshold is being dragged.
pub fn axis_extents(dataset: &EntityDataset, mode: ViewMode) -> (AxisRange, AxisRange) {
    let entities = dataset.entities();
    match mode {
        ViewMode::ScoredScatter => {
            let max_abs = entities
                .iter()
                .map(|e| e.fold_change.abs())
                .fold(DEFAULT_FOLD_CHANGE_THRESHOLD, f64::max);
            let max_y = entities
                .iter()
                .map(|e| e.neg_log10_significance)
                .fold(-DEFAULT_SIGNIFICANCE_THRESHOLD.log10(), f64::max);
            (
                AxisRange::new(-max_abs, max_abs).padded(EXTENT_PADDING),
                AxisRange::new(0.0, max_y).padded_top(EXTENT_PADDING),
            )
        }
        ViewMode::MeanDifference => {
            let x = AxisRange::from_values(entities.iter().map(|e| e.mean_expression))
                .unwrap_or(AxisRange::new(0.0, 0.0));
            let y = AxisRange::from_values(entities.iter().map(|e| e.fold_change))
                .unwrap_or(AxisRange::new(0.0, 0.0))
                .include(0.0);
            (
                x.non_degenerate().padded(EXTENT_PADDING),
                y.non_degenerate().padded(EXTENT_PADDING),
            )
        }
        ViewMode::RankedBar => {
            let n = entities.len().max(1) as f64;
            let y = AxisRange::from_values(entities.iter().map(|e| e.fold_change))
                .unwrap_or(AxisRange::new(0.0, 0.0))
                .include(0.0);
            (
                AxisRange::new(-0.5, n - 0.5),
                y.non_degenerate().padded(EXTENT_PADDING),
            )
        }
    }
}

/// Transform for a mode over the given plot rectangle, `None` for a
/// zero-area viewport.
pub fn transform_for(dataset: &EntityDataset, mode: ViewMode, plot_rect: Rect) -> Option<LinearTransform> {
    let (x, y) = axis_extents(dataset, mode);
    LinearTransform::new(plot_rect, x, y)
}

pub fn build_series(
    dataset: &EntityDataset,
    thresholds: &ThresholdState,
    mode: ViewMode,
    transform: &LinearTransform,
) -> RenderedSeries {
    let mut series = RenderedSeries {
        mode,
        plot_rect: transform.plot_rect(),
        x_range: transform.x_range(),
        y_range: transform.y_range(),
        points: Vec::new(),
        bars: Vec::new(),
        markers: Vec::new(),
        handles: Vec::new(),
    };
    match mode {
        ViewMode::ScoredScatter => build_scored(&mut series, dataset, thresholds, transform),
        ViewMode::MeanDifference => build_mean_difference(&mut series, dataset, thresholds, transform),
        ViewMode::RankedBar => build_ranked(&mut series, dataset, transform),
    }
    tracing::trace!(
        ?mode,
        points = series.points.len(),
        bars = series.bars.len(),
        handles = series.handles.len(),
        "series rebuilt"
    );
    series
}

fn build_scored(
    series: &mut RenderedSeries,
    dataset: &EntityDataset,
    thresholds: &ThresholdState,
    transform: &LinearTransform,
) {
    let present = dataset.significance_present();
    let order = dataset.order(ViewMode::ScoredScatter);
    series.points = order
        .iter()
        .enumerate()
        .map(|(order_index, &dataset_index)| {
            let e = &dataset.entities()[dataset_index];
            let data = DataPoint::new(e.fold_change, e.neg_log10_significance);
            RenderedPoint {
                order_index,
                dataset_index,
                data,
                pixel: transform.to_pixel(data),
                status: classify_entity(e, thresholds, present),
            }
        })
        .collect();

    let rect = transform.plot_rect();
    let fc = thresholds.fold_change_threshold();
    for (value, id) in [(fc, HandleId::FoldChangePositive), (-fc, HandleId::FoldChangeNegative)] {
        let px = transform.x_to_pixel(value);
        if transform.x_range().contains(value) {
            series.markers.push(MarkerLine {
                orientation: MarkerOrientation::Vertical,
                value,
                from: Pos2::new(px, rect.top()),
                to: Pos2::new(px, rect.bottom()),
                handle: Some(id),
            });
        }
        series.handles.push(HandleGeometry {
            id,
            center: Pos2::new(
                px.clamp(rect.left(), rect.right()),
                rect.top() + HANDLE_INSET,
            ),
        });
    }

    if present {
        let value = thresholds.significance_marker();
        let py = transform.y_to_pixel(value);
        if transform.y_range().contains(value) {
            series.markers.push(MarkerLine {
                orientation: MarkerOrientation::Horizontal,
                value,
                from: Pos2::new(rect.left(), py),
                to: Pos2::new(rect.right(), py),
                handle: Some(HandleId::Significance),
            });
        }
        series.handles.push(HandleGeometry {
            id: HandleId::Significance,
            center: Pos2::new(
                rect.right() - HANDLE_INSET,
                py.clamp(rect.top(), rect.bottom()),
            ),
        });
    }
}

fn build_mean_difference(
    series: &mut RenderedSeries,
    dataset: &EntityDataset,
    thresholds: &ThresholdState,
    transform: &LinearTransform,
) {
    let present = dataset.significance_present();
    let order = dataset.order(ViewMode::MeanDifference);
    series.points = order
        .iter()
        .enumerate()
        .map(|(order_index, &dataset_index)| {
            let e = &dataset.entities()[dataset_index];
            let data = DataPoint::new(e.mean_expression, e.fold_change);
            RenderedPoint {
                order_index,
                dataset_index,
                data,
                pixel: transform.to_pixel(data),
                status: classify_entity(e, thresholds, present),
            }
        })
        .collect();

    let rect = transform.plot_rect();
    let py = transform.y_to_pixel(0.0);
    series.markers.push(MarkerLine {
        orientation: MarkerOrientation::Horizontal,
        value: 0.0,
        from: Pos2::new(rect.left(), py),
        to: Pos2::new(rect.right(), py),
        handle: None,
    });
}

fn build_ranked(series: &mut RenderedSeries, dataset: &EntityDataset, transform: &LinearTransform) {
    let half = BAR_WIDTH_FRACTION / 2.0;
    let baseline = transform.y_to_pixel(0.0);
    series.bars = dataset
        .order(ViewMode::RankedBar)
        .iter()
        .enumerate()
        .map(|(order_index, &dataset_index)| {
            let e = &dataset.entities()[dataset_index];
            let rank = order_index as f64;
            let left = transform.x_to_pixel(rank - half);
            let right = transform.x_to_pixel(rank + half);
            let top = transform.y_to_pixel(e.fold_change);
            RenderedBar {
                order_index,
                dataset_index,
                fold_change: e.fold_change,
                rect: Rect::from_two_pos(Pos2::new(left, baseline), Pos2::new(right, top)),
                status: sign_status(e.fold_change),
            }
        })
        .collect();

    let rect = transform.plot_rect();
    series.markers.push(MarkerLine {
        orientation: MarkerOrientation::Horizontal,
        value: 0.0,
        from: Pos2::new(rect.left(), baseline),
        to: Pos2::new(rect.right(), baseline),
        handle: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::types::EntityRecord;

    fn plot_rect() -> Rect {
        Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(800.0, 600.0))
    }

    fn dataset() -> EntityDataset {
        EntityDataset::from_records(&[
            EntityRecord::new("TP53", 2.5, Some(0.001)).with_mean(8.0),
            EntityRecord::new("MYC", -3.0, Some(0.0001)).with_mean(3.0),
            EntityRecord::new("ACT1", 0.2, Some(0.5)),
        ])
    }

    fn series(dataset: &EntityDataset, mode: ViewMode) -> RenderedSeries {
        let t = transform_for(dataset, mode, plot_rect()).unwrap();
        build_series(dataset, &ThresholdState::default(), mode, &t)
    }

    #[test]
    fn scored_scatter_has_three_handles_with_significance() {
        let ds = dataset();
        let s = series(&ds, ViewMode::ScoredScatter);
        assert_eq!(s.points.len(), 3);
        assert_eq!(s.handles.len(), 3);
        assert_eq!(s.markers.len(), 3);
        let statuses: Vec<_> = s.points.iter().map(|p| p.status).collect();
        assert_eq!(
            statuses,
            vec![
                RegulationStatus::Up,
                RegulationStatus::Down,
                RegulationStatus::NotSignificant
            ]
        );
        // fold-change handles mirror each other around x = 0
        let pos = s.handle(HandleId::FoldChangePositive).unwrap().center;
        let neg = s.handle(HandleId::FoldChangeNegative).unwrap().center;
        assert!((pos.x - 400.0 - (400.0 - neg.x)).abs() < 1e-3);
    }

    #[test]
    fn scored_scatter_without_significance_drops_that_handle() {
        let ds = EntityDataset::from_records(&[
            EntityRecord::new("A", 2.0, None),
            EntityRecord::new("B", -0.5, None),
        ]);
        let s = series(&ds, ViewMode::ScoredScatter);
        assert!(s.handle(HandleId::Significance).is_none());
        assert_eq!(s.handles.len(), 2);
        assert!(s.markers.iter().all(|m| m.orientation == MarkerOrientation::Vertical));
    }

    #[test]
    fn mean_difference_has_a_fixed_zero_line_and_no_handles() {
        let ds = dataset();
        let s = series(&ds, ViewMode::MeanDifference);
        assert!(s.handles.is_empty());
        assert_eq!(s.markers.len(), 1);
        assert_eq!(s.markers[0].value, 0.0);
        assert!(s.markers[0].handle.is_none());
        // ACT1 has no mean and is plotted at x = 0, not dropped
        assert_eq!(s.points.len(), 3);
        assert_eq!(s.points[2].data.x, 0.0);
    }

    #[test]
    fn ranked_bars_follow_descending_fold_change() {
        let ds = dataset();
        let s = series(&ds, ViewMode::RankedBar);
        assert!(s.handles.is_empty());
        let ids: Vec<&str> = s
            .bars
            .iter()
            .map(|b| ds.entities()[b.dataset_index].id.as_str())
            .collect();
        assert_eq!(ids, vec!["TP53", "ACT1", "MYC"]);
        assert_eq!(s.bars[1].status, RegulationStatus::Up);
        assert_eq!(s.bars[2].status, RegulationStatus::Down);
        assert!(s.bars.windows(2).all(|w| w[0].rect.center().x < w[1].rect.center().x));
    }

    #[test]
    fn empty_dataset_still_has_usable_extents() {
        let ds = EntityDataset::from_records(&[]);
        for mode in ViewMode::ALL {
            assert!(transform_for(&ds, mode, plot_rect()).is_some(), "{mode:?}");
        }
    }
}
