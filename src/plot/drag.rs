//! Threshold drag handles
//!
//! A drag is an explicit state machine, `Idle -> Dragging(handle) -> Idle`,
//! so clamping and resize-during-drag can be exercised without a window.

use egui::Pos2;

use super::series::HandleGeometry;
use super::transform::CoordinateTransform;
use super::types::{
    MAX_SIGNIFICANCE_THRESHOLD, MIN_FOLD_CHANGE_THRESHOLD, MIN_SIGNIFICANCE_THRESHOLD,
    ThresholdState,
};

/// Decimal places kept when committing a fold-change threshold.
const FOLD_CHANGE_DECIMALS: i32 = 2;
/// Significant digits kept when committing a significance threshold.
const SIGNIFICANCE_DIGITS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleId {
    FoldChangePositive,
    FoldChangeNegative,
    Significance,
}

impl HandleId {
    pub fn is_fold_change(self) -> bool {
        matches!(self, HandleId::FoldChangePositive | HandleId::FoldChangeNegative)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(HandleId),
}

#[derive(Debug, Clone, Default)]
pub struct DragHandleController {
    state: DragState,
}

impl DragHandleController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn active_handle(&self) -> Option<HandleId> {
        match self.state {
            DragState::Dragging(id) => Some(id),
            DragState::Idle => None,
        }
    }

    /// Closest handle within `radius` pixels of the pointer.
    pub fn hit_test(handles: &[HandleGeometry], pointer: Pos2, radius: f32) -> Option<HandleId> {
        handles
            .iter()
            .map(|h| (h.id, h.center.distance(pointer)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Start dragging `handle`. Ignored unless idle.
    pub fn begin(&mut self, handle: HandleId) -> bool {
        if self.is_dragging() {
            return false;
        }
        tracing::debug!(?handle, "threshold drag started");
        self.state = DragState::Dragging(handle);
        true
    }

    /// Threshold state implied by the pointer for the active handle, or
    /// `None` when idle. The pointer is clamped onto the plot first.
    pub fn update(
        &self,
        pointer: Pos2,
        transform: &dyn CoordinateTransform,
        thresholds: &ThresholdState,
    ) -> Option<ThresholdState> {
        let handle = self.active_handle()?;
        let pointer = transform.clamp_pixel(pointer);
        let next = match handle {
            HandleId::FoldChangePositive | HandleId::FoldChangeNegative => {
                thresholds.with_fold_change(fold_change_at(pointer, transform))
            }
            HandleId::Significance => {
                thresholds.with_significance(significance_at(pointer, transform))
            }
        };
        Some(next)
    }

    /// Finish the drag, returning the handle that was active.
    pub fn end(&mut self) -> Option<HandleId> {
        let handle = self.active_handle();
        if handle.is_some() {
            tracing::debug!(?handle, "threshold drag finished");
        }
        self.state = DragState::Idle;
        handle
    }
}

/// Fold-change magnitude under a pointer; both handles share it.
pub fn fold_change_at(pointer: Pos2, transform: &dyn CoordinateTransform) -> f64 {
    let x = transform.to_data(transform.clamp_pixel(pointer)).x;
    if !x.is_finite() {
        return MIN_FOLD_CHANGE_THRESHOLD;
    }
    round_decimals(x.abs().max(MIN_FOLD_CHANGE_THRESHOLD), FOLD_CHANGE_DECIMALS)
        .max(MIN_FOLD_CHANGE_THRESHOLD)
}

/// Significance threshold under a pointer on the -log10 axis.
pub fn significance_at(pointer: Pos2, transform: &dyn CoordinateTransform) -> f64 {
    let neg_log10 = transform.to_data(transform.clamp_pixel(pointer)).y;
    if !neg_log10.is_finite() {
        return MAX_SIGNIFICANCE_THRESHOLD;
    }
    round_significant(10f64.powf(-neg_log10), SIGNIFICANCE_DIGITS)
        .clamp(MIN_SIGNIFICANCE_THRESHOLD, MAX_SIGNIFICANCE_THRESHOLD)
}

fn round_decimals(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(digits - 1 - magnitude);
    (value * scale).round() / scale
}
