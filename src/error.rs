//! Error type for host-side operations (file loading, config)

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// Parsed fine but nothing in it could be plotted
    #[error("No plottable records in {}", .0.display())]
    EmptyDataset(PathBuf),

    #[error("Graphics backend error: {0}")]
    Gui(String),
}

impl From<eframe::Error> for ExplorerError {
    fn from(err: eframe::Error) -> Self {
        ExplorerError::Gui(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
