//! I/O layer for reading and writing georeferenced GeoTIFF rasters.
//! Provides the `geotiff` reader and `writers` for GeoTIFF output and
//! world-file/projection sidecars.
pub mod geotiff;
pub use geotiff::{GeoTiffError, read_geotiff};

pub mod writers;
