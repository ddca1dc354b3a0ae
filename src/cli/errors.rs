use std::path::PathBuf;

use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid size parameter: {value}. Expected \"width,height\" with non-negative integers")]
    InvalidSize { value: String },

    #[error("Invalid bbox parameter: {value}. Expected \"xmin,ymin,xmax,ymax\"")]
    InvalidBbox { value: String },

    #[error("Invalid resolution parameter: {value}. Expected \"xres\" or \"xres,yres\"")]
    InvalidResolution { value: String },

    #[error("Cannot read preset {path:?}: {reason}")]
    PresetRead { path: PathBuf, reason: String },
}
