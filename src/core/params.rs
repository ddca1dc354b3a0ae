//! Reprojection parameters suitable for config files and presets.

use serde::{Deserialize, Serialize};

use crate::types::ResamplingMethod;

/// Everything a reprojection run can be configured with. Serializable so
/// presets can live in JSON files next to the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReprojectParams {
    /// Source CRS override; `None` reads it from the source raster.
    pub src_crs: Option<String>,
    /// Destination CRS; `None` keeps the source CRS (grid-only operations).
    pub dst_crs: Option<String>,
    /// Output size (width, height); a zero dimension is derived preserving
    /// square pixels, (0, 0) or `None` is fully automatic.
    pub size: Option<(usize, usize)>,
    /// Output extent (xmin, ymin, xmax, ymax) in `bbox_crs`.
    pub bbox: Option<[f64; 4]>,
    /// CRS of `bbox`; defaults to the destination CRS.
    pub bbox_crs: Option<String>,
    /// Target pixel size (xres, yres) in destination CRS units.
    pub resolution: Option<(f64, f64)>,
    pub resampling: ResamplingMethod,
    /// Source no-data override when the file declares none.
    pub src_nodata: Option<f64>,
    /// No-data value written to the destination; defaults to the source one.
    pub dst_nodata: Option<f64>,
    /// Row-interpolation error tolerance in source pixels; 0 = exact transform.
    pub error_threshold: f64,
    /// Worker threads; `None` uses all cores.
    pub threads: Option<usize>,
    /// Also write world-file and .prj sidecars next to the output.
    pub sidecars: bool,
}

impl Default for ReprojectParams {
    fn default() -> Self {
        Self {
            src_crs: None,
            dst_crs: None,
            size: None,
            bbox: None,
            bbox_crs: None,
            resolution: None,
            resampling: ResamplingMethod::Nearest,
            src_nodata: None,
            dst_nodata: None,
            error_threshold: 0.125,
            threads: None,
            sidecars: false,
        }
    }
}
