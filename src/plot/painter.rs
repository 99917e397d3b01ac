//! egui drawing surface for the plot engine
//!
//! Paints a [`RenderedSeries`] with the widget painter and turns pointer
//! input into engine calls: handle drags, point clicks, and brush gestures.

use std::collections::HashSet;

use egui::{Align2, Color32, CursorIcon, FontId, Pos2, Rect, Sense, Shape, Stroke, StrokeKind, Ui};

use super::drag::{DragHandleController, DragState, HandleId};
use super::engine::{PlotEngine, PlotHost};
use super::selection::BrushRegion;
use super::series::RenderedSeries;
use super::transform::{AxisRange, LinearTransform};
use super::types::{RegulationStatus, ViewMode};

const MARGIN_LEFT: f32 = 56.0;
const MARGIN_RIGHT: f32 = 16.0;
const MARGIN_TOP: f32 = 12.0;
const MARGIN_BOTTOM: f32 = 36.0;
const TARGET_TICKS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotStyle {
    pub point_radius: f32,
    pub background: Color32,
    pub grid: Color32,
    pub axis_text: Color32,
    pub up: Color32,
    pub down: Color32,
    pub not_significant: Color32,
    pub selected: Color32,
    pub marker: Color32,
    pub handle: Color32,
    pub brush: Color32,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            point_radius: 3.0,
            background: Color32::from_rgb(24, 24, 28),
            grid: Color32::from_rgb(48, 48, 54),
            axis_text: Color32::LIGHT_GRAY,
            up: Color32::from_rgb(220, 50, 50),
            down: Color32::from_rgb(60, 120, 230),
            not_significant: Color32::from_rgb(120, 120, 120),
            selected: Color32::from_rgb(255, 200, 60),
            marker: Color32::from_rgb(200, 200, 200),
            handle: Color32::from_rgb(255, 255, 255),
            brush: Color32::from_rgb(100, 180, 255),
        }
    }
}

impl PlotStyle {
    pub fn status_color(&self, status: RegulationStatus) -> Color32 {
        match status {
            RegulationStatus::Up => self.up,
            RegulationStatus::Down => self.down,
            RegulationStatus::NotSignificant => self.not_significant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrushTool {
    #[default]
    Rectangle,
    Lasso,
}

#[derive(Debug, Clone)]
enum Draft {
    Rect { start: Pos2, current: Pos2 },
    Lasso(Vec<Pos2>),
}

impl Draft {
    fn start(tool: BrushTool, pos: Pos2) -> Self {
        match tool {
            BrushTool::Rectangle => Draft::Rect {
                start: pos,
                current: pos,
            },
            BrushTool::Lasso => Draft::Lasso(vec![pos]),
        }
    }

    fn extend(&mut self, pos: Pos2) {
        match self {
            Draft::Rect { current, .. } => *current = pos,
            Draft::Lasso(points) => {
                if points.last().is_none_or(|last| last.distance(pos) >= 2.0) {
                    points.push(pos);
                }
            }
        }
    }

    fn into_region(self) -> BrushRegion {
        match self {
            Draft::Rect { start, current } => BrushRegion::rect(start, current),
            Draft::Lasso(points) => BrushRegion::Lasso(points),
        }
    }
}

/// Gesture state owned by the drawing surface, separate from the engine.
///
/// Holding Shift when a brush starts appends a sub-region to the previous
/// gesture instead of replacing it.
#[derive(Debug, Clone, Default)]
pub struct PlotSurface {
    pub tool: BrushTool,
    regions: Vec<BrushRegion>,
    regions_frame: Option<(Rect, ViewMode)>,
    draft: Option<Draft>,
}

impl PlotSurface {
    pub fn reset(&mut self) {
        self.regions.clear();
        self.regions_frame = None;
        self.draft = None;
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

/// Plot rectangle inside a widget rectangle, after axis margins.
pub fn plot_rect_for(outer: Rect) -> Rect {
    Rect::from_min_max(
        Pos2::new(outer.left() + MARGIN_LEFT, outer.top() + MARGIN_TOP),
        Pos2::new(outer.right() - MARGIN_RIGHT, outer.bottom() - MARGIN_BOTTOM),
    )
}

/// Draw the plot into the remaining space and process this frame's input.
pub fn show_plot(
    ui: &mut Ui,
    engine: &mut PlotEngine,
    surface: &mut PlotSurface,
    style: &PlotStyle,
    host: &mut impl PlotHost,
) -> egui::Response {
    let size = ui.available_size();
    let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
    let plot_rect = plot_rect_for(response.rect);
    engine.set_viewport(plot_rect);

    handle_input(ui, &response, engine, surface, host);

    painter.rect_filled(response.rect, 0.0, style.background);

    let Some(series) = engine.series() else {
        painter.text(
            response.rect.center(),
            Align2::CENTER_CENTER,
            "Plot area too small",
            FontId::proportional(13.0),
            style.axis_text,
        );
        return response;
    };

    draw_axes(&painter, series, style);
    let selected: HashSet<usize> = engine.brush_indices().iter().copied().collect();
    draw_data(&painter, series, &selected, style);
    draw_markers(&painter, series, engine, style);
    draw_brush(&painter, surface, style);

    if !engine.is_dragging() && surface.draft.is_none() {
        if let Some(pos) = response.hover_pos() {
            let over_handle = engine.mode().has_drag_handles()
                && DragHandleController::hit_test(&series.handles, pos, engine.radii().handle)
                    .is_some();
            if over_handle {
                ui.ctx().set_cursor_icon(CursorIcon::Grab);
            } else if let Some(text) = hover_text(engine, pos) {
                response.clone().on_hover_text(text);
            }
        }
    } else if engine.is_dragging() {
        ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
    }

    response
}

fn handle_input(
    ui: &Ui,
    response: &egui::Response,
    engine: &mut PlotEngine,
    surface: &mut PlotSurface,
    host: &mut impl PlotHost,
) {
    let (shift, escape, press_origin) = ui.input(|i| {
        (
            i.modifiers.shift,
            i.key_pressed(egui::Key::Escape),
            i.pointer.press_origin(),
        )
    });

    // stale sub-regions from another layout or mode cannot be extended
    let frame = engine.series().map(|s| (s.plot_rect, s.mode));
    if surface.regions_frame != frame {
        surface.regions.clear();
        surface.regions_frame = frame;
    }

    if response.drag_started() {
        if let Some(pos) = response.interact_pointer_pos() {
            let origin = press_origin.unwrap_or(pos);
            if engine.begin_drag(origin) {
                if engine.drag_to(pos, host) {
                    surface.regions.clear();
                }
            } else if engine.series().is_some_and(|s| s.plot_rect.contains(origin)) {
                if !shift {
                    surface.regions.clear();
                }
                let mut draft = Draft::start(surface.tool, origin);
                draft.extend(pos);
                surface.draft = Some(draft);
            }
        }
    } else if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            if engine.is_dragging() {
                // a committed threshold supersedes the drawn brush
                if engine.drag_to(pos, host) {
                    surface.regions.clear();
                }
            } else if let Some(draft) = surface.draft.as_mut() {
                draft.extend(pos);
            }
        }
    }

    if response.drag_stopped() {
        if engine.is_dragging() {
            engine.end_drag();
        } else if let Some(draft) = surface.draft.take() {
            let region = draft.into_region();
            if region.is_deliberate() {
                surface.regions.push(region);
                let batches: Vec<Vec<usize>> = match engine.series() {
                    Some(series) => surface
                        .regions
                        .iter()
                        .map(|r| r.matched_indices(series))
                        .collect(),
                    None => Vec::new(),
                };
                engine.complete_brush(&batches, host);
            }
        }
    }

    if response.double_clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            if engine.hit_test(pos).is_none() {
                surface.regions.clear();
                engine.clear_brush(host);
            }
        }
    } else if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            engine.click(pos, host);
        }
    }

    if escape && response.hovered() {
        if engine.is_dragging() {
            engine.cancel_drag();
        } else if surface.draft.take().is_none() {
            surface.regions.clear();
            engine.clear_brush(host);
        }
    }
}

fn hover_text(engine: &PlotEngine, pos: Pos2) -> Option<String> {
    let order_index = engine.hit_test(pos)?;
    let dataset_index = *engine.dataset().order(engine.mode()).get(order_index)?;
    let entity = engine.dataset().get(dataset_index)?;
    let status = engine.statuses().get(dataset_index)?;
    let mut text = format!(
        "{}\nlog2FC: {:.3}\nStatus: {}",
        entity.id,
        entity.fold_change,
        status.label()
    );
    if let Some(p) = entity.significance {
        text.push_str(&format!("\nSignificance: {:.3e}", p));
    }
    if entity.has_mean_expression {
        text.push_str(&format!("\nMean: {:.3}", entity.mean_expression));
    }
    if engine.mode() == ViewMode::RankedBar {
        text.push_str(&format!("\nRank: {}", order_index + 1));
    }
    Some(text)
}

fn draw_axes(painter: &egui::Painter, series: &RenderedSeries, style: &PlotStyle) {
    let rect = series.plot_rect;
    let font = FontId::proportional(10.0);
    let Some(transform) = LinearTransform::new(rect, series.x_range, series.y_range) else {
        return;
    };

    let x_ticks = nice_ticks(series.x_range, TARGET_TICKS);
    let x_step = tick_step(&x_ticks);
    for &x in &x_ticks {
        if series.mode == ViewMode::RankedBar && x.fract() != 0.0 {
            continue;
        }
        let px = transform.x_to_pixel(x);
        painter.line_segment(
            [Pos2::new(px, rect.top()), Pos2::new(px, rect.bottom())],
            Stroke::new(1.0, style.grid),
        );
        let label = if series.mode == ViewMode::RankedBar {
            format!("{}", x as i64 + 1)
        } else {
            format_tick(x, x_step)
        };
        painter.text(
            Pos2::new(px, rect.bottom() + 4.0),
            Align2::CENTER_TOP,
            label,
            font.clone(),
            style.axis_text,
        );
    }

    let y_ticks = nice_ticks(series.y_range, TARGET_TICKS);
    let y_step = tick_step(&y_ticks);
    for &y in &y_ticks {
        let py = transform.y_to_pixel(y);
        painter.line_segment(
            [Pos2::new(rect.left(), py), Pos2::new(rect.right(), py)],
            Stroke::new(1.0, style.grid),
        );
        painter.text(
            Pos2::new(rect.left() - 4.0, py),
            Align2::RIGHT_CENTER,
            format_tick(y, y_step),
            font.clone(),
            style.axis_text,
        );
    }

    painter.rect_stroke(rect, 0.0, Stroke::new(1.0, style.grid), StrokeKind::Inside);
    painter.text(
        Pos2::new(rect.center().x, rect.bottom() + 20.0),
        Align2::CENTER_TOP,
        series.x_label(),
        FontId::proportional(11.0),
        style.axis_text,
    );
    painter.text(
        Pos2::new(rect.left() + 4.0, rect.top() + 2.0),
        Align2::LEFT_TOP,
        series.y_label(),
        FontId::proportional(11.0),
        style.axis_text,
    );
}

fn draw_data(
    painter: &egui::Painter,
    series: &RenderedSeries,
    selected: &HashSet<usize>,
    style: &PlotStyle,
) {
    let clip = painter.with_clip_rect(series.plot_rect);

    // not-significant first so regulated entities stay on top
    let mut points: Vec<_> = series.points.iter().collect();
    points.sort_by_key(|p| p.status.is_regulated());
    for point in points {
        let color = style.status_color(point.status);
        clip.circle_filled(point.pixel, style.point_radius, color);
        if selected.contains(&point.dataset_index) {
            clip.circle_stroke(
                point.pixel,
                style.point_radius + 2.0,
                Stroke::new(1.5, style.selected),
            );
        }
    }

    for bar in &series.bars {
        clip.rect_filled(bar.rect, 0.0, style.status_color(bar.status));
        if selected.contains(&bar.dataset_index) {
            clip.rect_stroke(bar.rect, 0.0, Stroke::new(1.5, style.selected), StrokeKind::Outside);
        }
    }
}

fn draw_markers(painter: &egui::Painter, series: &RenderedSeries, engine: &PlotEngine, style: &PlotStyle) {
    let stroke = Stroke::new(1.0, style.marker);
    for marker in &series.markers {
        if marker.handle.is_some() {
            painter.extend(Shape::dashed_line(&[marker.from, marker.to], stroke, 6.0, 4.0));
        } else {
            painter.line_segment([marker.from, marker.to], stroke);
        }
    }

    let thresholds = engine.thresholds();
    let active = engine.drag_state();
    for handle in &series.handles {
        let grabbed = active == DragState::Dragging(handle.id);
        let radius = if grabbed { 7.0 } else { 5.5 };
        painter.circle_filled(handle.center, radius, style.handle);
        painter.circle_stroke(handle.center, radius, Stroke::new(1.5, style.background));

        let (label, anchor, offset) = match handle.id {
            HandleId::FoldChangePositive => (
                format!("+{:.2}", thresholds.fold_change_threshold()),
                Align2::LEFT_CENTER,
                egui::vec2(9.0, 0.0),
            ),
            HandleId::FoldChangeNegative => (
                format!("-{:.2}", thresholds.fold_change_threshold()),
                Align2::RIGHT_CENTER,
                egui::vec2(-9.0, 0.0),
            ),
            HandleId::Significance => (
                format!("p ≤ {:.3e}", thresholds.significance_threshold()),
                Align2::RIGHT_BOTTOM,
                egui::vec2(-9.0, -4.0),
            ),
        };
        painter.text(
            handle.center + offset,
            anchor,
            label,
            FontId::proportional(10.0),
            style.marker,
        );
    }
}

fn draw_brush(painter: &egui::Painter, surface: &PlotSurface, style: &PlotStyle) {
    let fill = style.brush.gamma_multiply(0.15);
    let stroke = Stroke::new(1.0, style.brush);
    let regions = surface
        .regions
        .iter()
        .cloned()
        .chain(surface.draft.clone().map(Draft::into_region));
    for region in regions {
        match region {
            BrushRegion::Rect(rect) => {
                painter.rect_filled(rect, 0.0, fill);
                painter.rect_stroke(rect, 0.0, stroke, StrokeKind::Inside);
            }
            BrushRegion::Lasso(points) if points.len() >= 2 => {
                painter.add(Shape::closed_line(points, stroke));
            }
            BrushRegion::Lasso(_) => {}
        }
    }
}

/// Round tick positions covering `range`, about `target` of them.
pub fn nice_ticks(range: AxisRange, target: usize) -> Vec<f64> {
    let span = range.span();
    if !(span.is_finite() && span > 0.0) || target == 0 {
        return Vec::new();
    }
    let raw = span / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);

    let first = (range.min / step).ceil();
    let last = (range.max / step).floor();
    if !(first.is_finite() && last.is_finite()) || last - first > 1000.0 {
        return Vec::new();
    }
    (first as i64..=last as i64)
        .map(|k| k as f64 * step)
        .collect()
}

fn tick_step(ticks: &[f64]) -> f64 {
    match ticks {
        [a, b, ..] => b - a,
        _ => 1.0,
    }
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step > 0.0 && step < 1.0 {
        (-step.log10().floor()) as usize
    } else {
        0
    };
    let value = if value.abs() < step * 1e-9 { 0.0 } else { value };
    format!("{:.*}", decimals, value)
}
