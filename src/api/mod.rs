//! High-level, ergonomic library API: reproject a georeferenced raster file
//! into another CRS and/or grid. Prefer these entrypoints over the low-level
//! core modules when embedding REWARP.

use std::path::Path;

use crate::core::crs::CrsRegistry;
use crate::core::orchestrator::Orchestrator;
use crate::core::params::ReprojectParams;
use crate::core::progress::ProgressFn;
use crate::error::Result;
use crate::types::Outcome;

/// Reprojects `input` into `output` according to `params`.
///
/// The optional progress callback receives a clamped, monotone completion
/// fraction and may return `false` to request cancellation at the next block
/// boundary; a cancelled run returns `Ok(Outcome::Cancelled)` with the
/// output finalized for the blocks completed so far.
pub fn reproject(
    input: &Path,
    output: &Path,
    params: &ReprojectParams,
    progress: Option<&mut ProgressFn<'_>>,
) -> Result<Outcome> {
    let registry = CrsRegistry::new();
    reproject_with_registry(&registry, input, output, params, progress)
}

/// Same as [`reproject`] but resolves CRS identifiers against a
/// caller-owned registry, useful when many runs share one.
pub fn reproject_with_registry(
    registry: &CrsRegistry,
    input: &Path,
    output: &Path,
    params: &ReprojectParams,
    progress: Option<&mut ProgressFn<'_>>,
) -> Result<Outcome> {
    Orchestrator::new(registry, params).run(input, output, progress)
}
