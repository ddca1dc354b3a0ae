//! The warp engine: inverse-maps destination pixels into source pixel space
//! and resamples, block strip by block strip.
//!
//! Each destination row is either transformed exactly (one CRS inversion per
//! pixel) or, when the transformation is locally near-linear, interpolated
//! between exactly transformed anchor points with recursive subdivision where
//! the linear error exceeds the configured threshold. Strips are the unit of
//! progress and cancellation; rows within a strip are computed in parallel
//! and written by the orchestrating thread only.

use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;

use crate::core::progress::ProgressReporter;
use crate::core::raster::{DestRaster, SourceRaster};
use crate::core::resample::sample;
use crate::core::transform::CrsTransformer;
use crate::error::{Error, Result};
use crate::types::ResamplingMethod;

/// Rows per block strip. Strips bound progress granularity and the memory
/// held by in-flight row buffers.
const DEFAULT_BLOCK_ROWS: usize = 128;

/// Segments at or below this length are always transformed exactly.
const MIN_SUBDIVISION_SPAN: usize = 3;

#[derive(Debug, Clone)]
pub struct WarpConfig {
    pub method: ResamplingMethod,
    /// Maximum deviation, in source pixels, tolerated when interpolating row
    /// positions linearly. Zero disables the approximation.
    pub error_threshold: f64,
    pub block_rows: usize,
    /// Worker threads; `None` uses the global pool, `Some(1)` is sequential.
    pub threads: Option<usize>,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            method: ResamplingMethod::Nearest,
            error_threshold: 0.125,
            block_rows: DEFAULT_BLOCK_ROWS,
            threads: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarpStatus {
    Completed,
    Cancelled,
}

/// Runs the warp loop. On cancellation, strips completed before the request
/// remain written in `dst` and `WarpStatus::Cancelled` is returned.
pub fn warp(
    src: &SourceRaster,
    dst: &mut DestRaster,
    transformer: &CrsTransformer,
    cfg: &WarpConfig,
    progress: &mut ProgressReporter,
) -> Result<WarpStatus> {
    let pool = match cfg.threads {
        Some(n) if n >= 1 => Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| Error::InvalidArgument {
                    arg: "threads",
                    value: e.to_string(),
                })?,
        ),
        _ => None,
    };

    let width = dst.width();
    let height = dst.height();
    let dst_gt = dst.geotransform();
    let block_rows = cfg.block_rows.max(1);
    let total_area = (width * height) as f64;
    let mut done_area = 0usize;

    debug!(
        "warping {} band(s) into {}x{} px in {}-row strips ({})",
        src.band_count(),
        width,
        height,
        block_rows,
        cfg.method
    );

    progress.report(0.0, "warping");
    let mut row0 = 0usize;
    while row0 < height {
        if progress.cancelled() {
            debug!("warp cancelled at row {}", row0);
            return Ok(WarpStatus::Cancelled);
        }
        let row1 = (row0 + block_rows).min(height);

        let compute_strip = || -> Vec<(usize, Vec<Vec<f64>>)> {
            (row0..row1)
                .into_par_iter()
                .map(|row| {
                    let positions =
                        row_positions(row, width, &dst_gt, src, transformer, cfg.error_threshold);
                    let band_rows = src
                        .bands
                        .iter()
                        .map(|band| sample_row(band, &positions, cfg.method))
                        .collect();
                    (row, band_rows)
                })
                .collect()
        };
        let strip = match &pool {
            Some(pool) => pool.install(compute_strip),
            None => compute_strip(),
        };

        // Single-writer: only this thread touches the destination bands.
        for (row, band_rows) in strip {
            for (band, values) in band_rows.into_iter().enumerate() {
                for (dst_px, v) in dst.bands[band].row_mut(row).iter_mut().zip(values) {
                    *dst_px = v;
                }
            }
        }

        done_area += (row1 - row0) * width;
        progress.report(done_area as f64 / total_area, "warping");
        row0 = row1;
    }

    Ok(WarpStatus::Completed)
}

/// Source pixel position for every pixel center of one destination row.
fn row_positions(
    row: usize,
    width: usize,
    dst_gt: &crate::core::geotransform::GeoTransform,
    src: &SourceRaster,
    transformer: &CrsTransformer,
    error_threshold: f64,
) -> Vec<Option<(f64, f64)>> {
    let to_source = |col: usize| -> Option<(f64, f64)> {
        let (wx, wy) = dst_gt.apply(col as f64 + 0.5, row as f64 + 0.5);
        let (sx, sy) = transformer.inverse(wx, wy)?;
        src.geotransform.invert(sx, sy)
    };

    let mut positions = vec![None; width];
    if error_threshold > 0.0 && width > MIN_SUBDIVISION_SPAN {
        let first = to_source(0);
        let last = to_source(width - 1);
        fill_segment(
            &mut positions,
            0,
            width - 1,
            first,
            last,
            &to_source,
            error_threshold,
        );
    } else {
        for (col, slot) in positions.iter_mut().enumerate() {
            *slot = to_source(col);
        }
    }
    positions
}

/// Fills `positions[c0..=c1]` either by linear interpolation between the
/// exactly transformed endpoints (when the midpoint error stays under the
/// threshold) or by recursive subdivision down to exact transformation.
fn fill_segment(
    positions: &mut [Option<(f64, f64)>],
    c0: usize,
    c1: usize,
    p0: Option<(f64, f64)>,
    p1: Option<(f64, f64)>,
    to_source: &impl Fn(usize) -> Option<(f64, f64)>,
    error_threshold: f64,
) {
    if c1 - c0 <= MIN_SUBDIVISION_SPAN {
        positions[c0] = p0;
        positions[c1] = p1;
        for col in c0 + 1..c1 {
            positions[col] = to_source(col);
        }
        return;
    }

    let mid = (c0 + c1) / 2;
    let pm = to_source(mid);

    if let (Some(a), Some(b), Some(m)) = (p0, p1, pm) {
        let t = (mid - c0) as f64 / (c1 - c0) as f64;
        let lerped = lerp(a, b, t);
        let err = (m.0 - lerped.0).hypot(m.1 - lerped.1);
        if err < error_threshold {
            for col in c0..=c1 {
                let t = (col - c0) as f64 / (c1 - c0) as f64;
                positions[col] = Some(lerp(a, b, t));
            }
            // Keep the exactly transformed midpoint.
            positions[mid] = Some(m);
            return;
        }
    }

    fill_segment(positions, c0, mid, p0, pm, to_source, error_threshold);
    fill_segment(positions, mid, c1, pm, p1, to_source, error_threshold);
}

fn lerp(a: (f64, f64), b: (f64, f64), t: f64) -> (f64, f64) {
    (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1))
}

fn sample_row(
    band: &Array2<f64>,
    positions: &[Option<(f64, f64)>],
    method: ResamplingMethod,
) -> Vec<f64> {
    positions
        .iter()
        .map(|pos| match pos {
            Some((col, row)) => sample(band, *col, *row, method).unwrap_or(f64::NAN),
            None => f64::NAN,
        })
        .collect()
}
