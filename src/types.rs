//! Shared types and enums used across REWARP.
//! Includes `ResamplingMethod`, the pixel `DataType` carried from source to
//! destination, and the terminal `Outcome` of a reprojection run.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Resampling kernel applied when a destination pixel lands between source
/// pixel centers. Selected once per invocation; the warp loop dispatches on
/// the variant, never on strings.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplingMethod {
    Nearest,
    Bilinear,
    Cubic,
}

impl std::fmt::Display for ResamplingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResamplingMethod::Nearest => "nearest",
            ResamplingMethod::Bilinear => "bilinear",
            ResamplingMethod::Cubic => "cubic",
        };
        write!(f, "{}", s)
    }
}

/// Pixel storage type of a raster band. Band math runs in f64 regardless;
/// this only controls how destination pixels are encoded on disk.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum DataType {
    U8,
    U16,
    F32,
    F64,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::U8 => write!(f, "U8"),
            DataType::U16 => write!(f, "U16"),
            DataType::F32 => write!(f, "F32"),
            DataType::F64 => write!(f, "F64"),
        }
    }
}

/// Terminal state of a reprojection run. Cancellation requested through the
/// progress callback is a successful abort, not an error.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Outcome {
    /// All blocks warped, destination flushed, final progress was 1.0.
    Completed,
    /// The progress callback requested a stop; blocks completed before the
    /// stop are written and the destination is well-formed.
    Cancelled,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Completed => write!(f, "Completed"),
            Outcome::Cancelled => write!(f, "Cancelled"),
        }
    }
}
