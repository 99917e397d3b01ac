//! Interactive differential-expression plot engine
//!
//! Everything except [`painter`] is headless and can be driven without a
//! window.

pub mod classify;
pub mod dataset;
pub mod drag;
pub mod engine;
pub mod painter;
pub mod selection;
pub mod series;
pub mod transform;
pub mod types;

pub use classify::{RegulationSummary, classify, classify_all};
pub use dataset::{EntityDataset, PlottedEntity};
pub use drag::{DragHandleController, DragState, HandleId};
pub use engine::{InteractionRadii, PlotEngine, PlotEvent, PlotHost, RecordingHost};
pub use painter::{BrushTool, PlotStyle, PlotSurface, show_plot};
pub use selection::BrushRegion;
pub use series::RenderedSeries;
pub use transform::{AxisRange, CoordinateTransform, LinearTransform};
pub use types::{DataPoint, EntityRecord, RegulationStatus, ThresholdState, ViewMode};
