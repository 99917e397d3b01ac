//! Main application state and UI

use std::path::{Path, PathBuf};

use eframe::egui;

use crate::config::AppConfig;
use crate::io::{load_entities, save_selection};
use crate::plot::{
    BrushTool, EntityRecord, PlotEngine, PlotHost, PlotStyle, PlotSurface, RegulationStatus,
    ThresholdState, ViewMode, show_plot,
};

/// Receives the engine's callbacks. Kept apart from the engine so both can
/// be borrowed mutably in the same frame.
#[derive(Debug, Default)]
pub struct SelectionState {
    pub selected: Vec<String>,
    pub clicked: Option<String>,
}

impl PlotHost for SelectionState {
    fn on_selection_change(&mut self, identifiers: &[String]) {
        self.selected = identifiers.to_vec();
    }

    fn on_point_click(&mut self, identifier: &str) {
        self.clicked = Some(identifier.to_string());
    }
}

/// Application state
pub struct ExplorerApp {
    config: AppConfig,

    // Loaded data
    file_name: Option<String>,
    records: Vec<EntityRecord>,
    engine: Option<PlotEngine>,

    // Plot front-end
    view_mode: ViewMode,
    surface: PlotSurface,
    style: PlotStyle,
    selection: SelectionState,

    load_error: Option<String>,
    save_error: Option<String>,
}

impl ExplorerApp {
    pub fn new(config: AppConfig, view_mode: ViewMode) -> Self {
        let style = PlotStyle {
            point_radius: config.view.point_radius.max(0.5),
            ..PlotStyle::default()
        };
        Self {
            config,
            file_name: None,
            records: Vec::new(),
            engine: None,
            view_mode,
            surface: PlotSurface::default(),
            style,
            selection: SelectionState::default(),
            load_error: None,
            save_error: None,
        }
    }

    /// Start with records already loaded, e.g. from the command line.
    pub fn with_records(mut self, file_name: String, records: Vec<EntityRecord>) -> Self {
        self.mount(file_name, records);
        self
    }

    pub fn engine(&self) -> Option<&PlotEngine> {
        self.engine.as_ref()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    fn current_thresholds(&self) -> ThresholdState {
        self.engine
            .as_ref()
            .map(PlotEngine::thresholds)
            .unwrap_or_else(|| self.config.thresholds.to_state())
    }

    /// Replace the dataset. Thresholds carry over from the previous one.
    fn mount(&mut self, file_name: String, records: Vec<EntityRecord>) {
        let thresholds = self.current_thresholds();
        // drop the old engine first so its unmount is logged before the new mount
        self.engine = None;
        let engine = PlotEngine::mount(&records, thresholds, self.view_mode)
            .with_radii(self.config.view.radii());
        self.engine = Some(engine);
        self.records = records;
        self.file_name = Some(file_name);
        self.surface.reset();
        self.selection = SelectionState::default();
        self.fall_back_from_mean_difference();
    }

    fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        if let Some(engine) = self.engine.as_mut() {
            engine.set_view_mode(mode);
        }
        self.fall_back_from_mean_difference();
    }

    fn mean_difference_available(&self) -> bool {
        self.engine
            .as_ref()
            .is_some_and(|e| e.dataset().has_mean_expression())
    }

    fn fall_back_from_mean_difference(&mut self) {
        if self.view_mode != ViewMode::MeanDifference || self.engine.is_none() {
            return;
        }
        if !self.mean_difference_available() {
            tracing::warn!("no entity carries a mean expression, showing volcano view instead");
            self.set_view_mode(ViewMode::ScoredScatter);
        }
    }

    /// Restore the configured thresholds on the current dataset.
    fn reset_thresholds(&mut self) {
        let Some(file_name) = self.file_name.clone() else {
            return;
        };
        let records = std::mem::take(&mut self.records);
        self.engine = None;
        self.mount(file_name, records);
    }

    fn open_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            self.load_path(&path);
        }
    }

    pub fn load_path(&mut self, path: &Path) {
        match load_entities(path) {
            Ok(records) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.mount(name, records);
                self.load_error = None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load records");
                self.load_error = Some(format!("Failed to load {}: {}", path.display(), e));
            }
        }
    }

    fn save_selection_dialog(&mut self) {
        if self.selection.selected.is_empty() {
            self.save_error = Some("Nothing selected".to_string());
            return;
        }
        let path: Option<PathBuf> = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("selection.json")
            .save_file();
        if let Some(path) = path {
            self.save_error = save_selection(&path, &self.selection.selected)
                .err()
                .map(|e| format!("Failed to save selection: {}", e));
        }
    }

    fn copy_selection(&self, ctx: &egui::Context) {
        ctx.copy_text(self.selection.selected.join("\n"));
        tracing::debug!(count = self.selection.selected.len(), "selection copied");
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Records...").clicked() {
                        self.open_file();
                        ui.close_menu();
                    }
                    ui.separator();
                    let has_selection = !self.selection.selected.is_empty();
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Save Selection..."))
                        .clicked()
                    {
                        self.save_selection_dialog();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Copy Selection"))
                        .clicked()
                    {
                        self.copy_selection(ctx);
                        ui.close_menu();
                    }
                });
                ui.menu_button("Thresholds", |ui| {
                    if ui
                        .add_enabled(self.engine.is_some(), egui::Button::new("Reset to Config"))
                        .clicked()
                    {
                        self.reset_thresholds();
                        ui.close_menu();
                    }
                });
            });
        });

        // View controls
        egui::TopBottomPanel::top("view_controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("View:");
                let ma_available = self.mean_difference_available();
                for mode in ViewMode::ALL {
                    let enabled = mode != ViewMode::MeanDifference || ma_available;
                    let button = egui::SelectableLabel::new(self.view_mode == mode, mode.label());
                    let response = ui
                        .add_enabled(enabled, button)
                        .on_disabled_hover_text("No entity has a mean expression");
                    if response.clicked() && self.view_mode != mode {
                        self.set_view_mode(mode);
                    }
                }

                ui.separator();
                ui.label("Brush:");
                ui.selectable_value(&mut self.surface.tool, BrushTool::Rectangle, "Rectangle");
                ui.selectable_value(&mut self.surface.tool, BrushTool::Lasso, "Lasso");
                ui.weak("(Shift adds regions, Esc clears)");

                if let Some(engine) = &self.engine {
                    ui.separator();
                    let t = engine.thresholds();
                    ui.label(format!(
                        "|log2FC| ≥ {:.2}   p ≤ {:.3e}",
                        t.fold_change_threshold(),
                        t.significance_threshold()
                    ));
                }
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(err) = &self.load_error {
                    ui.colored_label(egui::Color32::RED, err);
                } else if let Some(err) = &self.save_error {
                    ui.colored_label(egui::Color32::RED, err);
                } else if let Some(engine) = &self.engine {
                    let summary = engine.summary();
                    let mut parts = Vec::new();
                    if let Some(name) = &self.file_name {
                        parts.push(name.clone());
                    }
                    parts.push(format!("{} entities", engine.dataset().len()));
                    if engine.dataset().excluded() > 0 {
                        parts.push(format!("{} excluded", engine.dataset().excluded()));
                    }
                    parts.push(format!(
                        "{} UP, {} DOWN, {} NS",
                        summary.up, summary.down, summary.not_significant
                    ));
                    if !self.selection.selected.is_empty() {
                        parts.push(format!("{} selected", self.selection.selected.len()));
                    }
                    ui.label(parts.join(" | "));
                } else {
                    ui.label("Open a JSON file of scored entities to begin");
                }
            });
        });

        // Selection panel
        egui::SidePanel::right("selection_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                self.show_selection_panel(ui);
            });

        // Main content
        egui::CentralPanel::default().show(ctx, |ui| match self.engine.as_mut() {
            Some(engine) => {
                show_plot(ui, engine, &mut self.surface, &self.style, &mut self.selection);
            }
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label("No data loaded (File > Open Records...)");
                });
            }
        });
    }
}

impl ExplorerApp {
    fn show_selection_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Clicked");
        match self.clicked_details() {
            Some(lines) => {
                for line in lines {
                    ui.label(line);
                }
            }
            None => {
                ui.weak("Click a point to inspect it");
            }
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.heading(format!("Selected ({})", self.selection.selected.len()));
            if ui
                .add_enabled(!self.selection.selected.is_empty(), egui::Button::new("Copy"))
                .clicked()
            {
                self.copy_selection(ui.ctx());
            }
        });

        let row_height = ui.text_style_height(&egui::TextStyle::Body);
        let ids = &self.selection.selected;
        let current = self.selection.clicked.as_deref();
        let mut picked: Option<String> = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show_rows(ui, row_height, ids.len(), |ui, rows| {
                for id in &ids[rows] {
                    let is_current = current == Some(id.as_str());
                    if ui.selectable_label(is_current, id).clicked() {
                        picked = Some(id.clone());
                    }
                }
            });
        if let Some(id) = picked {
            self.selection.on_point_click(&id);
        }
    }

    /// Dataset index behind the clicked identifier. The engine's own click
    /// wins so duplicate identifiers resolve to the record that was hit.
    fn clicked_index(&self) -> Option<usize> {
        let id = self.selection.clicked.as_deref()?;
        let engine = self.engine.as_ref()?;
        let entities = engine.dataset().entities();
        engine
            .clicked_index()
            .filter(|&i| entities.get(i).is_some_and(|e| e.id == id))
            .or_else(|| entities.iter().position(|e| e.id == id))
    }

    fn clicked_details(&self) -> Option<Vec<String>> {
        let index = self.clicked_index()?;
        let engine = self.engine.as_ref()?;
        let entity = engine.dataset().get(index)?;
        let status = engine
            .statuses()
            .get(index)
            .copied()
            .unwrap_or(RegulationStatus::NotSignificant);

        let mut lines = vec![
            entity.id.clone(),
            format!("log2FC: {:.3}", entity.fold_change),
            format!("Status: {}", status.label()),
        ];
        if let Some(p) = entity.significance {
            lines.push(format!("Significance: {:.3e}", p));
        }
        if entity.has_mean_expression {
            lines.push(format!("Mean expression: {:.3}", entity.mean_expression));
        }
        Some(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<EntityRecord> {
        vec![
            EntityRecord::new("TP53", 2.5, Some(0.001)),
            EntityRecord::new("MYC", -3.0, Some(0.0001)),
        ]
    }

    #[test]
    fn mean_difference_falls_back_without_means() {
        let app = ExplorerApp::new(AppConfig::default(), ViewMode::MeanDifference)
            .with_records("genes.json".into(), records());
        assert_eq!(app.view_mode, ViewMode::ScoredScatter);
        assert_eq!(app.engine().map(PlotEngine::mode), Some(ViewMode::ScoredScatter));
    }

    #[test]
    fn mean_difference_kept_when_means_exist() {
        let mut with_mean = records();
        with_mean[0] = with_mean[0].clone().with_mean(7.0);
        let app = ExplorerApp::new(AppConfig::default(), ViewMode::MeanDifference)
            .with_records("genes.json".into(), with_mean);
        assert_eq!(app.view_mode, ViewMode::MeanDifference);
    }

    #[test]
    fn reload_clears_selection() {
        let mut app = ExplorerApp::new(AppConfig::default(), ViewMode::ScoredScatter)
            .with_records("a.json".into(), records());
        app.selection.on_selection_change(&["TP53".to_string()]);
        app.selection.on_point_click("MYC");
        app.mount("b.json".into(), records());
        assert!(app.selection().selected.is_empty());
        assert!(app.selection().clicked.is_none());
    }

    #[test]
    fn clicked_details_follow_the_duplicate_that_was_hit() {
        let dupes = vec![
            EntityRecord::new("DUP", -3.0, Some(0.0001)),
            EntityRecord::new("DUP", 2.5, Some(0.001)),
        ];
        let mut app = ExplorerApp::new(AppConfig::default(), ViewMode::ScoredScatter)
            .with_records("dupes.json".into(), dupes);
        let engine = app.engine.as_mut().unwrap();
        engine.set_viewport(egui::Rect::from_min_max(
            egui::Pos2::new(0.0, 0.0),
            egui::Pos2::new(800.0, 600.0),
        ));
        let second = engine.series().unwrap().points[1].pixel;
        engine.click(second, &mut app.selection);

        assert_eq!(app.clicked_index(), Some(1));
        let lines = app.clicked_details().unwrap();
        assert!(lines.iter().any(|l| l == "Status: UP"));
    }

    #[test]
    fn clicked_details_describe_the_entity() {
        let mut app = ExplorerApp::new(AppConfig::default(), ViewMode::ScoredScatter)
            .with_records("a.json".into(), records());
        app.selection.on_point_click("MYC");
        let lines = app.clicked_details().unwrap();
        assert_eq!(lines[0], "MYC");
        assert!(lines.iter().any(|l| l == "Status: DOWN"));
    }
}
