//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O and GeoTIFF errors, and provides semantic variants
//! for CRS resolution, grid resolution, and argument validation failures.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown CRS: {ident}")]
    UnknownCrs { ident: String },

    #[error("Unable to compute a transformation between {src} and {dst}: {reason}")]
    NoTransformPath {
        src: String,
        dst: String,
        reason: String,
    },

    #[error("Invalid output grid: {0}")]
    InvalidGrid(String),

    #[error("Cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: crate::io::GeoTiffError,
    },

    #[error("Cannot create {path:?}: {source}")]
    Create {
        path: PathBuf,
        source: crate::io::GeoTiffError,
    },

    #[error("Source raster has no usable georeferencing: {0}")]
    MissingGeoreference(String),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },
}

impl Error {
    pub(crate) fn no_transform<S: Into<String>, D: Into<String>, R: std::fmt::Display>(
        src: S,
        dst: D,
        reason: R,
    ) -> Self {
        Error::NoTransformPath {
            src: src.into(),
            dst: dst.into(),
            reason: reason.to_string(),
        }
    }
}
