//! Ties the engine together: CRS resolution, grid resolution, destination
//! allocation, the warp loop, and finalization of the output raster.
//!
//! One `Orchestrator` owns all per-invocation state and is not shared across
//! concurrent runs. The run advances through explicit phases; any error
//! aborts the run in place, and a cancellation request surfaces as
//! `Outcome::Cancelled` with the destination still finalized to a
//! well-formed file covering the blocks completed so far.

use std::fs::File;
use std::path::Path;

use tracing::{debug, info};

use crate::core::bbox::BoundingBox;
use crate::core::crs::{Crs, CrsRegistry};
use crate::core::grid::{GridConstraints, resolve_output_grid};
use crate::core::params::ReprojectParams;
use crate::core::progress::{ProgressFn, ProgressReporter};
use crate::core::raster::{DestRaster, SourceRaster};
use crate::core::transform::CrsTransformer;
use crate::core::warp::{WarpConfig, WarpStatus, warp};
use crate::error::{Error, Result};
use crate::io::geotiff::read_geotiff;
use crate::io::writers::tiff::write_geotiff;
use crate::io::writers::worldfile::{write_prj_file, write_world_file};
use crate::types::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    GridResolved,
    DestinationOpen,
    Warping,
    Finalized,
}

pub struct Orchestrator<'a> {
    registry: &'a CrsRegistry,
    params: &'a ReprojectParams,
}

impl<'a> Orchestrator<'a> {
    pub fn new(registry: &'a CrsRegistry, params: &'a ReprojectParams) -> Self {
        Self { registry, params }
    }

    pub fn run(
        &self,
        input: &Path,
        output: &Path,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<Outcome> {
        let mut phase = Phase::Init;
        let params = self.params;

        let mut source = read_geotiff(input, self.registry).map_err(|source| Error::Open {
            path: input.to_path_buf(),
            source,
        })?;
        if let Some(nd) = params.src_nodata {
            apply_source_nodata(&mut source, nd);
        }

        let src_crs = self.source_crs(&source)?;
        let dst_crs = match &params.dst_crs {
            Some(ident) => self.registry.resolve(ident)?,
            None => src_crs.clone(),
        };
        info!(
            "reprojecting {:?} ({}) -> {:?} ({})",
            input, src_crs, output, dst_crs
        );

        let transformer = CrsTransformer::new(&src_crs, &dst_crs)?;

        let bbox = match params.bbox {
            Some([xmin, ymin, xmax, ymax]) => Some(BoundingBox::new(xmin, ymin, xmax, ymax)?),
            None => None,
        };
        let bbox_transformer = match (&bbox, &params.bbox_crs) {
            (Some(_), Some(ident)) => {
                let bbox_crs = self.registry.resolve(ident)?;
                if bbox_crs != dst_crs {
                    Some(CrsTransformer::new(&bbox_crs, &dst_crs)?)
                } else {
                    None
                }
            }
            _ => None,
        };

        let constraints = GridConstraints {
            size: params.size,
            bbox,
            bbox_transformer: bbox_transformer.as_ref(),
            resolution: params.resolution,
        };
        let grid = resolve_output_grid(
            source.width,
            source.height,
            &source.geotransform,
            &transformer,
            &constraints,
        )?;
        advance(&mut phase, Phase::GridResolved);

        // Create the destination before any pixel work so an unwritable
        // output fails fast, and allocate all bands at no-data.
        let file = File::create(output).map_err(|e| Error::Create {
            path: output.to_path_buf(),
            source: e.into(),
        })?;
        let mut dest = DestRaster::allocate(
            grid,
            dst_crs,
            source.band_count(),
            source.data_type,
            params.dst_nodata.or(source.nodata),
        );
        advance(&mut phase, Phase::DestinationOpen);

        let cfg = WarpConfig {
            method: params.resampling,
            error_threshold: params.error_threshold,
            threads: params.threads,
            ..Default::default()
        };
        let mut reporter = ProgressReporter::new(progress);
        advance(&mut phase, Phase::Warping);
        let status = match warp(&source, &mut dest, &transformer, &cfg, &mut reporter) {
            Ok(status) => status,
            Err(e) => {
                // Nothing has been encoded yet; do not leave an empty file.
                drop(file);
                let _ = std::fs::remove_file(output);
                return Err(e);
            }
        };

        // Finalization runs for completed and cancelled warps alike; the
        // file must be well-formed either way, or removed.
        if let Err(source) = write_geotiff(file, &dest) {
            let _ = std::fs::remove_file(output);
            return Err(Error::Create {
                path: output.to_path_buf(),
                source,
            });
        }
        if params.sidecars {
            write_world_file(output, &dest.geotransform())?;
            write_prj_file(output, &dest.crs.authority())?;
        }
        advance(&mut phase, Phase::Finalized);

        match status {
            WarpStatus::Completed => {
                info!("reprojection complete: {}x{} px", dest.width(), dest.height());
                Ok(Outcome::Completed)
            }
            WarpStatus::Cancelled => {
                info!(
                    "reprojection cancelled at {:.0}%",
                    reporter.fraction() * 100.0
                );
                Ok(Outcome::Cancelled)
            }
        }
    }

    fn source_crs(&self, source: &SourceRaster) -> Result<Crs> {
        if let Some(ident) = &self.params.src_crs {
            return self.registry.resolve(ident);
        }
        source.crs.clone().ok_or_else(|| {
            Error::MissingGeoreference(
                "no CRS in the file and no source CRS given".to_string(),
            )
        })
    }
}

fn advance(phase: &mut Phase, next: Phase) {
    debug!("phase {:?} -> {:?}", phase, next);
    *phase = next;
}

fn apply_source_nodata(source: &mut SourceRaster, nodata: f64) {
    for band in &mut source.bands {
        for v in band.iter_mut() {
            if *v == nodata {
                *v = f64::NAN;
            }
        }
    }
    source.nodata = Some(nodata);
}
