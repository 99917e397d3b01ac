//! Plot engine: owns one mounted dataset and everything derived from it
//!
//! All mutation happens synchronously from the caller's UI event. Rendering
//! state is fully re-derivable from (dataset, thresholds, mode, viewport).

use egui::{Pos2, Rect};

use super::classify::{RegulationSummary, classify_all, passing_identifiers};
use super::dataset::{EntityDataset, PlottedEntity};
use super::drag::{DragHandleController, DragState, HandleId};
use super::selection::{flatten_batches, resolve_identifiers};
use super::series::{RenderedSeries, build_series, transform_for};
use super::transform::LinearTransform;
use super::types::{EntityRecord, RegulationStatus, ThresholdState, ViewMode};

/// Output surface towards the surrounding application.
pub trait PlotHost {
    fn on_selection_change(&mut self, identifiers: &[String]);
    fn on_point_click(&mut self, identifier: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotEvent {
    SelectionChanged(Vec<String>),
    PointClicked(String),
}

/// Host that records every callback, in order.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub events: Vec<PlotEvent>,
}

impl RecordingHost {
    pub fn last_selection(&self) -> Option<&[String]> {
        self.events.iter().rev().find_map(|e| match e {
            PlotEvent::SelectionChanged(ids) => Some(ids.as_slice()),
            PlotEvent::PointClicked(_) => None,
        })
    }

    pub fn clicks(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PlotEvent::PointClicked(id) => Some(id.as_str()),
                PlotEvent::SelectionChanged(_) => None,
            })
            .collect()
    }
}

impl PlotHost for RecordingHost {
    fn on_selection_change(&mut self, identifiers: &[String]) {
        self.events.push(PlotEvent::SelectionChanged(identifiers.to_vec()));
    }

    fn on_point_click(&mut self, identifier: &str) {
        self.events.push(PlotEvent::PointClicked(identifier.to_string()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionRadii {
    /// Max distance from a point for a click to hit it.
    pub pick: f32,
    /// Max distance from a handle for a press to grab it.
    pub handle: f32,
}

impl Default for InteractionRadii {
    fn default() -> Self {
        Self {
            pick: 6.0,
            handle: 8.0,
        }
    }
}

pub struct PlotEngine {
    dataset: EntityDataset,
    thresholds: ThresholdState,
    mode: ViewMode,
    radii: InteractionRadii,
    statuses: Vec<RegulationStatus>,
    summary: RegulationSummary,

    viewport: Option<Rect>,
    /// Viewport that arrived while a drag was active.
    pending_viewport: Option<Rect>,
    transform: Option<LinearTransform>,
    series: Option<RenderedSeries>,

    drag: DragHandleController,
    /// Dataset index of the last clicked entity.
    clicked: Option<usize>,
    brush_selection: Vec<String>,
    brush_indices: Vec<usize>,
}

impl PlotEngine {
    /// Mount the engine for a fresh dataset. Thresholds start from
    /// `thresholds`; the records are copied, never modified.
    pub fn mount(records: &[EntityRecord], thresholds: ThresholdState, mode: ViewMode) -> Self {
        let dataset = EntityDataset::from_records(records);
        let statuses = classify_all(&dataset, &thresholds);
        let summary = RegulationSummary::from_statuses(&statuses);
        tracing::info!(
            entities = dataset.len(),
            excluded = dataset.excluded(),
            significance = dataset.significance_present(),
            up = summary.up,
            down = summary.down,
            "plot engine mounted"
        );
        Self {
            dataset,
            thresholds,
            mode,
            radii: InteractionRadii::default(),
            statuses,
            summary,
            viewport: None,
            pending_viewport: None,
            transform: None,
            series: None,
            drag: DragHandleController::new(),
            clicked: None,
            brush_selection: Vec::new(),
            brush_indices: Vec::new(),
        }
    }

    pub fn with_radii(mut self, radii: InteractionRadii) -> Self {
        self.radii = radii;
        self
    }

    pub fn radii(&self) -> InteractionRadii {
        self.radii
    }

    pub fn dataset(&self) -> &EntityDataset {
        &self.dataset
    }

    pub fn thresholds(&self) -> ThresholdState {
        self.thresholds
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn statuses(&self) -> &[RegulationStatus] {
        &self.statuses
    }

    pub fn summary(&self) -> RegulationSummary {
        self.summary
    }

    pub fn series(&self) -> Option<&RenderedSeries> {
        self.series.as_ref()
    }

    pub fn transform(&self) -> Option<&LinearTransform> {
        self.transform.as_ref()
    }

    pub fn viewport(&self) -> Option<Rect> {
        self.viewport
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Dataset index of the last clicked entity.
    pub fn clicked_index(&self) -> Option<usize> {
        self.clicked
    }

    /// Identifiers from the last completed brush gesture.
    pub fn brush_selection(&self) -> &[String] {
        &self.brush_selection
    }

    /// Dataset indices of the last brush selection, for highlighting.
    pub fn brush_indices(&self) -> &[usize] {
        &self.brush_indices
    }

    /// Switch projection. The dataset is untouched; an active drag is
    /// cancelled since its handle may no longer exist.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if mode == self.mode {
            return;
        }
        if self.drag.is_dragging() {
            self.cancel_drag();
        }
        tracing::debug!(from = ?self.mode, to = ?mode, "view mode changed");
        self.mode = mode;
        self.rebuild_geometry();
    }

    /// New plot rectangle from layout or a resize notification. Deferred
    /// while a drag is active so the handle keeps its pixel anchor.
    pub fn set_viewport(&mut self, rect: Rect) {
        if self.drag.is_dragging() {
            if Some(rect) == self.viewport {
                self.pending_viewport = None;
            } else if Some(rect) != self.pending_viewport {
                tracing::debug!(?rect, "viewport change deferred until drag ends");
                self.pending_viewport = Some(rect);
            }
            return;
        }
        if Some(rect) == self.viewport && self.series.is_some() {
            return;
        }
        self.viewport = Some(rect);
        self.rebuild_geometry();
    }

    /// Re-derive transform and series. With no usable viewport the previous
    /// geometry is kept.
    fn rebuild_geometry(&mut self) {
        let Some(rect) = self.viewport else {
            return;
        };
        match transform_for(&self.dataset, self.mode, rect) {
            Some(transform) => {
                self.series = Some(build_series(
                    &self.dataset,
                    &self.thresholds,
                    self.mode,
                    &transform,
                ));
                self.transform = Some(transform);
            }
            None => {
                tracing::trace!(?rect, "zero-area viewport, geometry kept");
                // geometry from another mode would map indices through the wrong ordering
                if self.series.as_ref().is_some_and(|s| s.mode != self.mode) {
                    self.series = None;
                    self.transform = None;
                }
            }
        }
    }

    /// Press at `pointer`: grab a handle if one is under it. Only the scored
    /// scatter mode has handles.
    pub fn begin_drag(&mut self, pointer: Pos2) -> bool {
        if !self.mode.has_drag_handles() {
            return false;
        }
        let Some(series) = &self.series else {
            return false;
        };
        match DragHandleController::hit_test(&series.handles, pointer, self.radii.handle) {
            Some(handle) => self.drag.begin(handle),
            None => false,
        }
    }

    /// Grab a specific handle, if it is currently rendered.
    pub fn begin_drag_handle(&mut self, handle: HandleId) -> bool {
        let rendered = self
            .series
            .as_ref()
            .is_some_and(|s| s.handle(handle).is_some());
        self.mode.has_drag_handles() && rendered && self.drag.begin(handle)
    }

    /// Pointer moved during a drag. Commits the new threshold, reclassifies,
    /// rebuilds geometry and re-emits the passing entities as the selection.
    /// Returns whether a new threshold was committed.
    pub fn drag_to(&mut self, pointer: Pos2, host: &mut impl PlotHost) -> bool {
        let Some(transform) = self.transform else {
            return false;
        };
        let Some(next) = self.drag.update(pointer, &transform, &self.thresholds) else {
            return false;
        };
        if next == self.thresholds {
            return false;
        }
        self.commit_thresholds(next, host);
        true
    }

    fn commit_thresholds(&mut self, next: ThresholdState, host: &mut impl PlotHost) {
        tracing::debug!(
            fold_change = next.fold_change_threshold(),
            significance = next.significance_threshold(),
            "thresholds committed"
        );
        self.thresholds = next;
        self.statuses = classify_all(&self.dataset, &self.thresholds);
        self.summary = RegulationSummary::from_statuses(&self.statuses);
        // the transform is threshold-independent, only markers and colors move
        if let Some(transform) = &self.transform {
            self.series = Some(build_series(
                &self.dataset,
                &self.thresholds,
                self.mode,
                transform,
            ));
        }
        if self.mode == ViewMode::ScoredScatter {
            // the passing set replaces any earlier brush selection
            self.brush_selection.clear();
            self.brush_indices.clear();
            let passing = passing_identifiers(&self.dataset, &self.statuses);
            host.on_selection_change(&passing);
        }
    }

    /// Release the active handle and apply any deferred viewport.
    pub fn end_drag(&mut self) {
        self.drag.end();
        self.apply_pending_viewport();
    }

    /// Abort the active drag. Thresholds already committed stay committed.
    pub fn cancel_drag(&mut self) {
        if self.drag.end().is_some() {
            tracing::debug!("threshold drag cancelled");
        }
        self.apply_pending_viewport();
    }

    fn apply_pending_viewport(&mut self) {
        if let Some(rect) = self.pending_viewport.take() {
            self.set_viewport(rect);
        }
    }

    /// Index (in the active ordering) of whatever sits under `pointer`.
    pub fn hit_test(&self, pointer: Pos2) -> Option<usize> {
        let series = self.series.as_ref()?;
        match self.mode {
            ViewMode::RankedBar => series
                .bars
                .iter()
                .find(|b| {
                    pointer.x >= b.rect.left()
                        && pointer.x <= b.rect.right()
                        && series.plot_rect.y_range().contains(pointer.y)
                })
                .map(|b| b.order_index),
            ViewMode::ScoredScatter | ViewMode::MeanDifference => series
                .points
                .iter()
                .map(|p| (p.order_index, p.pixel.distance(pointer)))
                .filter(|&(_, d)| d <= self.radii.pick)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i),
        }
    }

    /// Dataset entity for an index in the active ordering.
    pub fn entity_at(&self, order_index: usize) -> Option<&PlottedEntity> {
        let dataset_index = *self.dataset.order(self.mode).get(order_index)?;
        self.dataset.get(dataset_index)
    }

    /// Single click: report the entity under the pointer. The brush
    /// selection is left as is.
    pub fn click(&mut self, pointer: Pos2, host: &mut impl PlotHost) -> Option<String> {
        let order_index = self.hit_test(pointer)?;
        let dataset_index = *self.dataset.order(self.mode).get(order_index)?;
        let id = self.dataset.get(dataset_index)?.id.clone();
        self.clicked = Some(dataset_index);
        tracing::debug!(%id, "point clicked");
        host.on_point_click(&id);
        Some(id)
    }

    /// A brush gesture finished with one matched-index batch per sub-region.
    pub fn complete_brush(&mut self, batches: &[Vec<usize>], host: &mut impl PlotHost) {
        let order = self.dataset.order(self.mode);
        let ids = resolve_identifiers(batches, order, &self.dataset);
        self.brush_indices = flatten_batches(batches)
            .into_iter()
            .filter_map(|i| order.get(i).copied())
            .collect();
        tracing::debug!(
            batches = batches.len(),
            selected = ids.len(),
            mode = ?self.mode,
            "brush selection resolved"
        );
        self.brush_selection = ids;
        host.on_selection_change(&self.brush_selection);
    }

    pub fn clear_brush(&mut self, host: &mut impl PlotHost) {
        self.complete_brush(&[], host);
    }
}

impl Drop for PlotEngine {
    fn drop(&mut self) {
        tracing::debug!(entities = self.dataset.len(), "plot engine unmounted");
    }
}
