//! End-to-end reprojection tests over temporary GeoTIFF files.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use tempfile::TempDir;

use rewarp::core::grid::GridSpec;
use rewarp::core::raster::DestRaster;
use rewarp::io::read_geotiff;
use rewarp::io::writers::tiff::write_geotiff_to_path;
use rewarp::{CrsRegistry, DataType, Outcome, ReprojectParams, reproject};

/// Writes a synthetic scene modeled on the canonical 20x20 byte test
/// raster: UTM zone 11N, 60 m pixels, origin (440720, 3751320).
fn write_utm_scene(path: &Path, width: usize, height: usize, data_type: DataType) {
    let registry = CrsRegistry::new();
    let grid = GridSpec {
        origin_x: 440720.0,
        origin_y: 3751320.0,
        pixel_width: 60.0,
        pixel_height: -60.0,
        width,
        height,
    };
    let mut dest = DestRaster::allocate(
        grid,
        registry.resolve("EPSG:32611").unwrap(),
        1,
        data_type,
        None,
    );
    // Column ramp: smooth enough that nearest-neighbor round trips stay
    // within a known bound.
    dest.bands[0] = Array2::from_shape_fn((height, width), |(_, c)| c as f64);
    write_geotiff_to_path(path, &dest).unwrap();
}

fn scene(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    write_utm_scene(&path, 20, 20, DataType::U8);
    path
}

#[test]
fn utm_to_geographic_completes_with_final_progress_of_one() {
    let dir = TempDir::new().unwrap();
    let input = scene(&dir, "in.tif");
    let output = dir.path().join("out.tif");

    let params = ReprojectParams {
        dst_crs: Some("EPSG:4326".to_string()),
        ..Default::default()
    };

    let mut reports: Vec<f64> = Vec::new();
    let mut progress = |fraction: f64, _: &str| {
        reports.push(fraction);
        true
    };

    let outcome = reproject(&input, &output, &params, Some(&mut progress)).unwrap();
    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(*reports.last().unwrap(), 1.0);
    assert!(reports.windows(2).all(|w| w[0] <= w[1]), "{reports:?}");

    let registry = CrsRegistry::new();
    let result = read_geotiff(&output, &registry).unwrap();
    assert!(result.crs.as_ref().unwrap().is_geographic());
    assert!((15..=25).contains(&result.width), "width {}", result.width);
    assert!((15..=25).contains(&result.height), "height {}", result.height);
    // The scene center survives the warp: the central destination pixel maps
    // back near source column 10 (a ramp of column indices).
    let center = result.bands[0][[result.height / 2, result.width / 2]];
    assert!(
        (center - 10.0).abs() <= 2.0,
        "center pixel {center} drifted from the ramp"
    );
}

#[test]
fn missing_georeferencing_fails_before_any_output_is_written() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bare.tif");
    let output = dir.path().join("out.tif");

    // A plain TIFF without any geo tags.
    let file = std::fs::File::create(&input).unwrap();
    let mut encoder = tiff::encoder::TiffEncoder::new(file).unwrap();
    let data = vec![0u8; 20 * 20];
    encoder
        .write_image::<tiff::encoder::colortype::Gray8>(20, 20, &data)
        .unwrap();

    let params = ReprojectParams {
        src_crs: Some("EPSG:32611".to_string()),
        dst_crs: Some("EPSG:4326".to_string()),
        ..Default::default()
    };
    let err = reproject(&input, &output, &params, None).unwrap_err();
    assert!(
        err.to_string().contains("nable to compute a transformation"),
        "unexpected error: {err}"
    );
    assert!(!output.exists(), "destination was created despite the failure");
}

#[test]
fn explicit_width_with_zero_height_preserves_aspect() {
    let dir = TempDir::new().unwrap();
    let input = scene(&dir, "in.tif");
    let output = dir.path().join("out.tif");

    let params = ReprojectParams {
        size: Some((10, 0)),
        ..Default::default()
    };
    let outcome = reproject(&input, &output, &params, None).unwrap();
    assert_eq!(outcome, Outcome::Completed);

    let registry = CrsRegistry::new();
    let result = read_geotiff(&output, &registry).unwrap();
    assert_eq!((result.width, result.height), (10, 10));
    // No dst CRS given: the output stays in the source CRS.
    assert_eq!(result.crs.as_ref().unwrap().epsg(), 32611);
}

#[test]
fn bbox_in_foreign_crs_is_reprojected_before_sizing() {
    let dir = TempDir::new().unwrap();
    let input = scene(&dir, "in.tif");
    let output = dir.path().join("out.tif");

    // A ~1 km box over the scene, given in lon/lat while the destination
    // stays in UTM meters. Sizing against the raw degree extent would
    // produce a degenerate raster; the resolved grid must be 17x17.
    let params = ReprojectParams {
        bbox: Some([
            -117.638051657173,
            33.8904636339659,
            -117.627303823822,
            33.8995379597727,
        ]),
        bbox_crs: Some("EPSG:4326".to_string()),
        ..Default::default()
    };
    let outcome = reproject(&input, &output, &params, None).unwrap();
    assert_eq!(outcome, Outcome::Completed);

    let registry = CrsRegistry::new();
    let result = read_geotiff(&output, &registry).unwrap();
    assert_eq!((result.width, result.height), (17, 17));
    assert_eq!(result.crs.as_ref().unwrap().epsg(), 32611);
}

#[test]
fn nearest_round_trip_reproduces_the_ramp() {
    let dir = TempDir::new().unwrap();
    let input = scene(&dir, "in.tif");
    let geographic = dir.path().join("geo.tif");
    let back = dir.path().join("back.tif");

    let to_geo = ReprojectParams {
        dst_crs: Some("EPSG:4326".to_string()),
        ..Default::default()
    };
    reproject(&input, &geographic, &to_geo, None).unwrap();

    // Back onto the exact original grid.
    let to_utm = ReprojectParams {
        dst_crs: Some("EPSG:32611".to_string()),
        bbox: Some([440720.0, 3750120.0, 441920.0, 3751320.0]),
        resolution: Some((60.0, 60.0)),
        ..Default::default()
    };
    reproject(&geographic, &back, &to_utm, None).unwrap();

    let registry = CrsRegistry::new();
    let result = read_geotiff(&back, &registry).unwrap();
    assert_eq!((result.width, result.height), (20, 20));

    // Interior pixels of a column ramp may shift by at most one pixel pick
    // per leg under nearest-neighbor resampling.
    for row in 2..18 {
        for col in 2..18 {
            let v = result.bands[0][[row, col]];
            assert!(
                (v - col as f64).abs() <= 2.0,
                "pixel ({row}, {col}) = {v} strayed from the ramp"
            );
        }
    }
}

#[test]
fn callback_refusal_yields_cancelled_outcome_and_wellformed_output() {
    let dir = TempDir::new().unwrap();
    let input = scene(&dir, "in.tif");
    let output = dir.path().join("out.tif");

    let params = ReprojectParams {
        dst_crs: Some("EPSG:4326".to_string()),
        ..Default::default()
    };
    let mut refuse = |_: f64, _: &str| false;
    let outcome = reproject(&input, &output, &params, Some(&mut refuse)).unwrap();
    assert_eq!(outcome, Outcome::Cancelled);

    // The destination is finalized and readable even though no block ran.
    let registry = CrsRegistry::new();
    let result = read_geotiff(&output, &registry).unwrap();
    assert!(result.width >= 1 && result.height >= 1);
}

#[test]
fn mid_run_cancellation_keeps_completed_strips() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tall.tif");
    // Taller than one 128-row strip so cancellation can land mid-run.
    write_utm_scene(&input, 16, 384, DataType::F32);
    let output = dir.path().join("out.tif");

    let params = ReprojectParams {
        // Identity CRS keeps the grid (and the strip layout) predictable.
        threads: Some(1),
        ..Default::default()
    };
    let mut stop_after_first = |fraction: f64, _: &str| fraction <= 0.0;
    let outcome = reproject(&input, &output, &params, Some(&mut stop_after_first)).unwrap();
    assert_eq!(outcome, Outcome::Cancelled);

    let registry = CrsRegistry::new();
    let result = read_geotiff(&output, &registry).unwrap();
    assert_eq!((result.width, result.height), (16, 384));
    // First strip written, remainder still no-data.
    assert!(result.bands[0][[0, 5]].is_finite());
    assert!(result.bands[0][[383, 5]].is_nan());
}

#[test]
fn unknown_destination_crs_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = scene(&dir, "in.tif");
    let output = dir.path().join("out.tif");

    let params = ReprojectParams {
        dst_crs: Some("EPSG:999999".to_string()),
        ..Default::default()
    };
    let err = reproject(&input, &output, &params, None).unwrap_err();
    assert!(matches!(err, rewarp::Error::UnknownCrs { .. }), "{err}");
}

#[test]
fn size_and_resolution_together_are_contradictory() {
    let dir = TempDir::new().unwrap();
    let input = scene(&dir, "in.tif");
    let output = dir.path().join("out.tif");

    let params = ReprojectParams {
        size: Some((10, 10)),
        resolution: Some((30.0, 30.0)),
        ..Default::default()
    };
    let err = reproject(&input, &output, &params, None).unwrap_err();
    assert!(matches!(err, rewarp::Error::InvalidGrid(_)), "{err}");
    assert!(!output.exists());
}
