use std::fs;

use de_explorer::config::AppConfig;
use de_explorer::io::load_entities;
use de_explorer::plot::{PlotEngine, RegulationStatus, ViewMode};

#[test]
fn analysis_export_loads_and_mounts_with_configured_thresholds() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("de.json");
    fs::write(
        &data,
        r#"{"volcano_data": [
            {"gene": "TP53", "x": 2.5, "y": 3.0, "pvalue": 0.001, "status": "NS", "mean": 9.1},
            {"gene": "MYC", "x": -3.0, "pvalue": 0.0001, "mean": 4.2},
            {"gene": "ACT1", "x": 0.2, "pvalue": 0.5},
            {"gene": "BROKEN", "pvalue": 0.01}
        ], "has_pvalue": true}"#,
    )
    .unwrap();
    let config_path = dir.path().join("de_explorer.toml");
    fs::write(&config_path, "[thresholds]\nfold_change = 2.8\n").unwrap();

    let config = AppConfig::load_or_default(&config_path);
    let records = load_entities(&data).unwrap();
    let engine = PlotEngine::mount(&records, config.thresholds.to_state(), ViewMode::MeanDifference);

    assert_eq!(engine.dataset().len(), 3);
    assert_eq!(engine.dataset().excluded(), 1);
    assert!(engine.dataset().has_mean_expression());
    // the precomputed status in the file is ignored
    assert_eq!(
        engine.statuses(),
        &[RegulationStatus::NotSignificant, RegulationStatus::Down, RegulationStatus::NotSignificant]
    );
}
