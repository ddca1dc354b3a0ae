#![doc = r#"
REWARP — a raster reprojection (warp) engine for georeferenced imagery.

This crate reads a georeferenced GeoTIFF, resolves a destination grid in a
target CRS from partial user constraints (explicit size, bounding box,
target resolution — or fully automatic), inverse-transforms every
destination pixel into source pixel space, resamples with a configurable
kernel, and writes a georeferenced GeoTIFF. Progress is reported through a
caller-supplied callback whose `false` return cooperatively cancels the run
at the next block boundary.

Coordinate transformations are pure Rust (proj4rs over the crs-definitions
EPSG database); no system GDAL/PROJ installation is required.

Quick start: reproject a file
-----------------------------
```rust,no_run
use std::path::Path;
use rewarp::{reproject, Outcome, ReprojectParams, ResamplingMethod};

fn main() -> rewarp::Result<()> {
    let params = ReprojectParams {
        dst_crs: Some("EPSG:4326".to_string()),
        resampling: ResamplingMethod::Bilinear,
        ..Default::default()
    };

    let outcome = reproject(
        Path::new("/data/scene_utm11.tif"),
        Path::new("/out/scene_wgs84.tif"),
        &params,
        None,
    )?;
    assert_eq!(outcome, Outcome::Completed);
    Ok(())
}
```

Progress and cancellation
-------------------------
```rust,no_run
use std::path::Path;
use rewarp::{reproject, Outcome, ReprojectParams};

fn main() -> rewarp::Result<()> {
    let params = ReprojectParams {
        dst_crs: Some("EPSG:3857".to_string()),
        ..Default::default()
    };

    let mut progress = |fraction: f64, _message: &str| {
        eprintln!("{:5.1}%", fraction * 100.0);
        fraction < 0.5 // stop half way through
    };

    let outcome = reproject(
        Path::new("/data/scene.tif"),
        Path::new("/out/half.tif"),
        &params,
        Some(&mut progress),
    )?;
    // A cancelled run is a successful abort, not an error; the output file
    // is well-formed and covers the blocks completed before the stop.
    assert_eq!(outcome, Outcome::Cancelled);
    Ok(())
}
```

Grid constraints
----------------
`ReprojectParams` accepts an explicit `size` (a zero dimension is derived
preserving square pixels), an explicit `bbox` with its own `bbox_crs`
(reprojected before the grid is sized), or a target `resolution`. With no
constraint the grid preserves the source ground sample distance.

Error handling
--------------
All public functions return `rewarp::Result<T>`; match on `rewarp::Error`
to handle specific cases, e.g. an unknown CRS or an unresolvable
transformation.

Useful modules
--------------
- [`api`] — high-level entry points.
- [`core`] — grid resolution, transformation, resampling, warp loop.
- [`io`] — GeoTIFF reader/writers and sidecars.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use core::crs::{Crs, CrsRegistry};
pub use core::params::ReprojectParams;
pub use core::progress::ProgressFn;
pub use error::{Error, Result};
pub use types::{DataType, Outcome, ResamplingMethod};

// High-level API re-exports
pub use api::{reproject, reproject_with_registry};
