use std::path::PathBuf;

use clap::Parser;

use crate::plot::ViewMode;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Interactive differential-expression plot explorer")]
pub struct Args {
    /// JSON file of entity records to open at startup
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Path to config TOML
    #[arg(long, default_value = "de_explorer.toml")]
    pub config: PathBuf,

    /// Initial view mode (overrides config)
    #[arg(long, value_enum)]
    pub view_mode: Option<ViewMode>,

    /// Log filter directive, e.g. "debug" or "de_explorer=trace" (overrides RUST_LOG)
    #[arg(long)]
    pub log_level: Option<String>,
}
