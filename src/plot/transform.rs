//! Mapping between data space and screen pixels

use egui::{Pos2, Rect};

use super::types::DataPoint;

/// Bidirectional data/pixel mapping for one axis pair.
///
/// Classification and selection only see this trait, so tests can drive them
/// with a plain linear mapping over a made-up rectangle.
pub trait CoordinateTransform {
    fn to_pixel(&self, point: DataPoint) -> Pos2;
    fn to_data(&self, pixel: Pos2) -> DataPoint;
    /// Screen rectangle covered by the plotted extents.
    fn plot_rect(&self) -> Rect;

    /// Clamp a pointer position onto the plot rectangle.
    fn clamp_pixel(&self, pixel: Pos2) -> Pos2 {
        let rect = self.plot_rect();
        Pos2::new(
            pixel.x.clamp(rect.left(), rect.right()),
            pixel.y.clamp(rect.top(), rect.bottom()),
        )
    }
}

/// Closed value interval for one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Smallest range covering every finite value, `None` if there is none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |range: Option<AxisRange>, v| match range {
                None => Some(AxisRange { min: v, max: v }),
                Some(r) => Some(r.include(v)),
            })
    }

    pub fn include(self, value: f64) -> Self {
        if !value.is_finite() {
            return self;
        }
        Self {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Widen a degenerate range by ±1 around its value.
    pub fn non_degenerate(self) -> Self {
        if self.span() > f64::EPSILON * self.max.abs().max(1.0) {
            self
        } else {
            Self {
                min: self.min - 1.0,
                max: self.max + 1.0,
            }
        }
    }

    /// Pad both ends by `fraction` of the span.
    pub fn padded(self, fraction: f64) -> Self {
        let pad = self.span() * fraction;
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Pad only the upper end.
    pub fn padded_top(self, fraction: f64) -> Self {
        Self {
            min: self.min,
            max: self.max + self.span() * fraction,
        }
    }
}

/// Linear mapping of `x_range × y_range` onto a screen rectangle, y pointing up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransform {
    rect: Rect,
    x_range: AxisRange,
    y_range: AxisRange,
}

impl LinearTransform {
    /// `None` when the viewport has no area or an extent has no span, in
    /// which case the caller keeps its previous geometry.
    pub fn new(rect: Rect, x_range: AxisRange, y_range: AxisRange) -> Option<Self> {
        let usable = rect.is_finite() && rect.width() > 0.0 && rect.height() > 0.0;
        let spans = x_range.span() > 0.0
            && y_range.span() > 0.0
            && x_range.span().is_finite()
            && y_range.span().is_finite();
        if !(usable && spans) {
            return None;
        }
        Some(Self {
            rect,
            x_range,
            y_range,
        })
    }

    pub fn x_range(&self) -> AxisRange {
        self.x_range
    }

    pub fn y_range(&self) -> AxisRange {
        self.y_range
    }

    pub fn x_to_pixel(&self, x: f64) -> f32 {
        let t = (x - self.x_range.min) / self.x_range.span();
        finite_or(
            self.rect.left() as f64 + t * self.rect.width() as f64,
            self.rect.center().x as f64,
        ) as f32
    }

    pub fn y_to_pixel(&self, y: f64) -> f32 {
        let t = (y - self.y_range.min) / self.y_range.span();
        finite_or(
            self.rect.bottom() as f64 - t * self.rect.height() as f64,
            self.rect.center().y as f64,
        ) as f32
    }

    pub fn pixel_to_x(&self, px: f32) -> f64 {
        let t = (px as f64 - self.rect.left() as f64) / self.rect.width() as f64;
        self.x_range.min + t * self.x_range.span()
    }

    pub fn pixel_to_y(&self, py: f32) -> f64 {
        let t = (self.rect.bottom() as f64 - py as f64) / self.rect.height() as f64;
        self.y_range.min + t * self.y_range.span()
    }
}

impl CoordinateTransform for LinearTransform {
    fn to_pixel(&self, point: DataPoint) -> Pos2 {
        Pos2::new(self.x_to_pixel(point.x), self.y_to_pixel(point.y))
    }

    fn to_data(&self, pixel: Pos2) -> DataPoint {
        DataPoint::new(self.pixel_to_x(pixel.x), self.pixel_to_y(pixel.y))
    }

    fn plot_rect(&self) -> Rect {
        self.rect
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> LinearTransform {
        LinearTransform::new(
            Rect::from_min_max(Pos2::new(50.0, 10.0), Pos2::new(650.0, 410.0)),
            AxisRange::new(-5.0, 5.0),
            AxisRange::new(0.0, 10.0),
        )
        .expect("valid transform")
    }

    #[test]
    fn corners_map_to_rect_corners() {
        let t = transform();
        assert_eq!(t.to_pixel(DataPoint::new(-5.0, 0.0)), Pos2::new(50.0, 410.0));
        assert_eq!(t.to_pixel(DataPoint::new(5.0, 10.0)), Pos2::new(650.0, 10.0));
        assert_eq!(t.to_pixel(DataPoint::new(0.0, 5.0)), Pos2::new(350.0, 210.0));
    }

    #[test]
    fn round_trip_inside_the_plot() {
        let t = transform();
        for &(x, y) in &[(0.0, 0.5), (-4.9, 9.9), (1.234, 3.21), (4.5, 0.01)] {
            let back = t.to_data(t.to_pixel(DataPoint::new(x, y)));
            assert!((back.x - x).abs() < 1e-4, "x {x} -> {}", back.x);
            assert!((back.y - y).abs() < 1e-4, "y {y} -> {}", back.y);
        }
    }

    #[test]
    fn zero_area_viewport_is_rejected() {
        let flat = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(100.0, 0.0));
        assert!(LinearTransform::new(flat, AxisRange::new(0.0, 1.0), AxisRange::new(0.0, 1.0)).is_none());
        let narrow = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(0.0, 100.0));
        assert!(LinearTransform::new(narrow, AxisRange::new(0.0, 1.0), AxisRange::new(0.0, 1.0)).is_none());
        let rect = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(100.0, 100.0));
        assert!(LinearTransform::new(rect, AxisRange::new(1.0, 1.0), AxisRange::new(0.0, 1.0)).is_none());
    }

    #[test]
    fn clamp_keeps_pointer_on_the_plot() {
        let t = transform();
        assert_eq!(t.clamp_pixel(Pos2::new(-100.0, 900.0)), Pos2::new(50.0, 410.0));
        assert_eq!(t.clamp_pixel(Pos2::new(300.0, 200.0)), Pos2::new(300.0, 200.0));
    }

    #[test]
    fn axis_range_helpers() {
        let r = AxisRange::from_values([3.0, f64::NAN, -1.0, 2.0]).unwrap();
        assert_eq!(r, AxisRange::new(-1.0, 3.0));
        assert_eq!(AxisRange::from_values(std::iter::empty()), None);
        assert_eq!(AxisRange::new(2.0, 2.0).non_degenerate(), AxisRange::new(1.0, 3.0));
        assert_eq!(AxisRange::new(0.0, 10.0).padded(0.1), AxisRange::new(-1.0, 11.0));
        assert_eq!(AxisRange::new(0.0, 10.0).padded_top(0.1), AxisRange::new(0.0, 11.0));
    }
}
