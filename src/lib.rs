pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod plot;

pub use error::{ExplorerError, Result};
