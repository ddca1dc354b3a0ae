//! In-memory raster model shared by the reader, the warp engine, and the
//! writer. Band math always runs on `Array2<f64>` with NaN as the internal
//! no-data marker; the declared `DataType` only matters when pixels are
//! encoded back to disk.

use ndarray::Array2;

use crate::core::crs::Crs;
use crate::core::geotransform::GeoTransform;
use crate::core::grid::GridSpec;
use crate::types::DataType;

/// Read-only input raster.
#[derive(Debug, Clone)]
pub struct SourceRaster {
    pub width: usize,
    pub height: usize,
    pub geotransform: GeoTransform,
    /// CRS read from the file, if the file declared one.
    pub crs: Option<Crs>,
    pub bands: Vec<Array2<f64>>,
    pub data_type: DataType,
    /// Declared no-data value; already mapped to NaN inside `bands`.
    pub nodata: Option<f64>,
}

impl SourceRaster {
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }
}

/// Destination raster owned by the orchestrator for the duration of a warp.
#[derive(Debug)]
pub struct DestRaster {
    pub grid: GridSpec,
    pub crs: Crs,
    pub bands: Vec<Array2<f64>>,
    pub data_type: DataType,
    /// Value written for NaN pixels on output.
    pub nodata: Option<f64>,
}

impl DestRaster {
    /// Allocates all bands filled with NaN (no-data) for the resolved grid.
    pub fn allocate(grid: GridSpec, crs: Crs, band_count: usize, data_type: DataType, nodata: Option<f64>) -> Self {
        let bands = (0..band_count)
            .map(|_| Array2::from_elem((grid.height, grid.width), f64::NAN))
            .collect();
        Self {
            grid,
            crs,
            bands,
            data_type,
            nodata,
        }
    }

    pub fn width(&self) -> usize {
        self.grid.width
    }

    pub fn height(&self) -> usize {
        self.grid.height
    }

    pub fn geotransform(&self) -> GeoTransform {
        self.grid.geotransform()
    }
}
