//! Brush and lasso selection
//!
//! The drawing surface reports one batch of matched indices per sub-region
//! of a gesture. Indices refer to the active mode's ordering and are mapped
//! back to identifiers here.

use std::collections::HashSet;

use egui::{Pos2, Rect};

use super::dataset::EntityDataset;
use super::series::RenderedSeries;

/// Drags shorter than this are clicks, not brushes.
pub const MIN_BRUSH_DISTANCE: f32 = 4.0;

/// One sub-region of a brush gesture, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum BrushRegion {
    Rect(Rect),
    Lasso(Vec<Pos2>),
}

impl BrushRegion {
    pub fn rect(a: Pos2, b: Pos2) -> Self {
        BrushRegion::Rect(Rect::from_two_pos(a, b))
    }

    pub fn contains(&self, p: Pos2) -> bool {
        match self {
            BrushRegion::Rect(rect) => rect.contains(p),
            BrushRegion::Lasso(polygon) => point_in_polygon(p, polygon),
        }
    }

    /// Whether the region is large enough to count as a deliberate brush.
    pub fn is_deliberate(&self) -> bool {
        match self {
            BrushRegion::Rect(rect) => rect.min.distance(rect.max) >= MIN_BRUSH_DISTANCE,
            BrushRegion::Lasso(polygon) => {
                polygon.len() >= 3 && bounding_rect(polygon).is_some_and(|r| {
                    r.min.distance(r.max) >= MIN_BRUSH_DISTANCE
                })
            }
        }
    }

    /// Order indices of the rendered points or bars this region covers.
    /// Bars count when the region touches them; points when inside.
    pub fn matched_indices(&self, series: &RenderedSeries) -> Vec<usize> {
        let mut matched: Vec<usize> = series
            .points
            .iter()
            .filter(|p| self.contains(p.pixel))
            .map(|p| p.order_index)
            .collect();
        matched.extend(
            series
                .bars
                .iter()
                .filter(|b| match self {
                    BrushRegion::Rect(rect) => rect.intersects(b.rect),
                    BrushRegion::Lasso(_) => self.contains(b.rect.center()),
                })
                .map(|b| b.order_index),
        );
        matched
    }
}

/// Even-odd rule; fewer than three vertices never contains anything.
pub fn point_in_polygon(p: Pos2, polygon: &[Pos2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn bounding_rect(points: &[Pos2]) -> Option<Rect> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold(Rect::from_min_max(first, first), |r, &p| r.union(Rect::from_min_max(p, p))),
    )
}

/// Flatten and deduplicate batches, keeping first-seen order.
pub fn flatten_batches(batches: &[Vec<usize>]) -> Vec<usize> {
    let mut seen = HashSet::new();
    batches
        .iter()
        .flatten()
        .copied()
        .filter(|i| seen.insert(*i))
        .collect()
}

/// Map brush batches to identifiers through the mode's ordering. Indices
/// outside the ordering are dropped.
pub fn resolve_identifiers(
    batches: &[Vec<usize>],
    order: &[usize],
    dataset: &EntityDataset,
) -> Vec<String> {
    let indices = flatten_batches(batches);
    let mut dropped = 0usize;
    let ids: Vec<String> = indices
        .into_iter()
        .filter_map(|i| {
            let entity = order.get(i).and_then(|&d| dataset.get(d));
            if entity.is_none() {
                dropped += 1;
            }
            entity.map(|e| e.id.clone())
        })
        .collect();
    if dropped > 0 {
        tracing::debug!(dropped, "brush indices outside the dataset were ignored");
    }
    ids
}
