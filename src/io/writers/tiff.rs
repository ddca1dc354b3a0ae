//! GeoTIFF writing.
//!
//! Encodes a warped destination raster with its georeferencing: pixel scale,
//! tie point, GeoKey directory, proj definition string, and the no-data
//! value. Multi-band rasters are written one band per TIFF directory, each
//! page carrying the same geo tags, so every band stays individually
//! georeferenced.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use tiff::encoder::colortype::{Gray8, Gray16, Gray32Float, Gray64Float};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;

use crate::core::raster::DestRaster;
use crate::io::geotiff::GeoTiffError;
use crate::types::DataType;

// GeoKey ids and values for the directory written into every page.
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Writes the destination raster to `path`.
pub fn write_geotiff_to_path(path: &Path, dest: &DestRaster) -> Result<(), GeoTiffError> {
    write_geotiff(File::create(path)?, dest)
}

/// Writes the destination raster to an already-open writer, typically the
/// file handle created when the destination was opened.
pub fn write_geotiff<W: Write + Seek>(writer: W, dest: &DestRaster) -> Result<(), GeoTiffError> {
    if dest.width() == 0 || dest.height() == 0 || dest.bands.is_empty() {
        return Err(GeoTiffError::Unsupported(
            "destination raster is empty".to_string(),
        ));
    }

    let mut encoder = TiffEncoder::new(BufWriter::new(writer))?;
    let width = dest.width() as u32;
    let height = dest.height() as u32;

    for band in &dest.bands {
        let values = band.iter().copied();
        match dest.data_type {
            DataType::U8 => {
                let buf: Vec<u8> = values
                    .map(|v| encode_int(v, dest.nodata, 255.0) as u8)
                    .collect();
                let mut image = encoder.new_image::<Gray8>(width, height)?;
                write_geo_tags(image.encoder(), dest)?;
                image.write_data(&buf)?;
            }
            DataType::U16 => {
                let buf: Vec<u16> = values
                    .map(|v| encode_int(v, dest.nodata, 65535.0) as u16)
                    .collect();
                let mut image = encoder.new_image::<Gray16>(width, height)?;
                write_geo_tags(image.encoder(), dest)?;
                image.write_data(&buf)?;
            }
            DataType::F32 => {
                let buf: Vec<f32> = values
                    .map(|v| encode_float(v, dest.nodata) as f32)
                    .collect();
                let mut image = encoder.new_image::<Gray32Float>(width, height)?;
                write_geo_tags(image.encoder(), dest)?;
                image.write_data(&buf)?;
            }
            DataType::F64 => {
                let buf: Vec<f64> = values.map(|v| encode_float(v, dest.nodata)).collect();
                let mut image = encoder.new_image::<Gray64Float>(width, height)?;
                write_geo_tags(image.encoder(), dest)?;
                image.write_data(&buf)?;
            }
        }
    }

    Ok(())
}

// Integer encoding: no-data becomes the declared value (0 when none) and
// everything else is rounded and clamped to the type range.
fn encode_int(v: f64, nodata: Option<f64>, max: f64) -> f64 {
    if v.is_nan() {
        nodata.unwrap_or(0.0).clamp(0.0, max)
    } else {
        v.round().clamp(0.0, max)
    }
}

// Float encoding: NaN is itself a valid no-data marker unless the caller
// asked for a specific value.
fn encode_float(v: f64, nodata: Option<f64>) -> f64 {
    match nodata {
        Some(nd) if v.is_nan() => nd,
        _ => v,
    }
}

fn write_geo_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<W, K>,
    dest: &DestRaster,
) -> Result<(), GeoTiffError> {
    let grid = &dest.grid;

    // ModelPixelScale holds magnitudes; orientation lives in the tiepoint.
    let pixel_scale = [grid.pixel_width, grid.pixel_height.abs(), 0.0];
    dir.write_tag(Tag::ModelPixelScaleTag, pixel_scale.as_slice())?;

    // Tie pixel (0, 0) to the grid origin.
    let tiepoint = [0.0, 0.0, 0.0, grid.origin_x, grid.origin_y, 0.0];
    dir.write_tag(Tag::ModelTiepointTag, tiepoint.as_slice())?;

    let geokeys = geokey_directory(dest);
    dir.write_tag(Tag::GeoKeyDirectoryTag, geokeys.as_slice())?;

    // Pipe-terminated proj definition, readable without the EPSG database.
    let ascii_params = format!("{}|", dest.crs.definition());
    dir.write_tag(Tag::GeoAsciiParamsTag, ascii_params.as_str())?;

    if let Some(nd) = dest.nodata {
        dir.write_tag(Tag::GdalNodata, format!("{}", nd).as_str())?;
    }

    Ok(())
}

fn geokey_directory(dest: &DestRaster) -> Vec<u16> {
    // [version, revision, minor, key count] then 4-value key records.
    let is_geographic = dest.crs.is_geographic();
    let mut keys = vec![1, 1, 0, 3];
    keys.extend_from_slice(&[
        GT_MODEL_TYPE_GEO_KEY,
        0,
        1,
        if is_geographic {
            MODEL_TYPE_GEOGRAPHIC
        } else {
            MODEL_TYPE_PROJECTED
        },
    ]);
    keys.extend_from_slice(&[GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
    if is_geographic {
        keys.extend_from_slice(&[GEOGRAPHIC_TYPE_GEO_KEY, 0, 1, dest.crs.epsg()]);
    } else {
        keys.extend_from_slice(&[PROJECTED_CS_TYPE_GEO_KEY, 0, 1, dest.crs.epsg()]);
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crs::CrsRegistry;
    use crate::core::grid::GridSpec;
    use crate::io::geotiff::read_geotiff;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn small_dest(data_type: DataType, nodata: Option<f64>) -> DestRaster {
        let reg = CrsRegistry::new();
        let grid = GridSpec {
            origin_x: 440720.0,
            origin_y: 3751320.0,
            pixel_width: 60.0,
            pixel_height: -60.0,
            width: 4,
            height: 3,
        };
        let mut dest = DestRaster::allocate(
            grid,
            reg.resolve("EPSG:32611").unwrap(),
            1,
            data_type,
            nodata,
        );
        dest.bands[0] = Array2::from_shape_fn((3, 4), |(r, c)| (r * 4 + c) as f64);
        dest
    }

    #[test]
    fn georeferencing_survives_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rt.tif");
        let mut dest = small_dest(DataType::F32, Some(-9999.0));
        dest.bands[0][[2, 3]] = f64::NAN;

        write_geotiff_to_path(&path, &dest).unwrap();

        let reg = CrsRegistry::new();
        let src = read_geotiff(&path, &reg).unwrap();
        assert_eq!((src.width, src.height), (4, 3));
        assert_eq!(src.band_count(), 1);
        assert_eq!(src.crs.as_ref().unwrap().epsg(), 32611);
        assert_eq!(src.nodata, Some(-9999.0));
        assert_relative_eq!(src.geotransform.origin_x, 440720.0, epsilon = 1e-6);
        assert_relative_eq!(src.geotransform.pixel_height, -60.0, epsilon = 1e-6);
        // The NaN pixel went out as -9999 and came back in as NaN.
        assert!(src.bands[0][[2, 3]].is_nan());
        assert_eq!(src.bands[0][[1, 2]], 6.0);
    }

    #[test]
    fn multiband_pages_come_back_as_bands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mb.tif");
        let reg = CrsRegistry::new();
        let grid = GridSpec {
            origin_x: 0.0,
            origin_y: 10.0,
            pixel_width: 1.0,
            pixel_height: -1.0,
            width: 5,
            height: 5,
        };
        let mut dest =
            DestRaster::allocate(grid, reg.resolve("EPSG:4326").unwrap(), 3, DataType::U8, None);
        for (i, band) in dest.bands.iter_mut().enumerate() {
            band.fill((i * 10) as f64);
        }

        write_geotiff_to_path(&path, &dest).unwrap();

        let src = read_geotiff(&path, &reg).unwrap();
        assert_eq!(src.band_count(), 3);
        assert_eq!(src.bands[0][[0, 0]], 0.0);
        assert_eq!(src.bands[1][[0, 0]], 10.0);
        assert_eq!(src.bands[2][[4, 4]], 20.0);
        assert!(src.crs.as_ref().unwrap().is_geographic());
    }

    #[test]
    fn integer_encoding_rounds_and_clamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("u8.tif");
        let mut dest = small_dest(DataType::U8, None);
        dest.bands[0][[0, 0]] = 254.6;
        dest.bands[0][[0, 1]] = 300.0;
        dest.bands[0][[0, 2]] = -5.0;
        dest.bands[0][[0, 3]] = f64::NAN;

        write_geotiff_to_path(&path, &dest).unwrap();

        let reg = CrsRegistry::new();
        let src = read_geotiff(&path, &reg).unwrap();
        assert_eq!(src.bands[0][[0, 0]], 255.0);
        assert_eq!(src.bands[0][[0, 1]], 255.0);
        assert_eq!(src.bands[0][[0, 2]], 0.0);
        assert_eq!(src.bands[0][[0, 3]], 0.0);
    }

    #[test]
    fn empty_destination_is_rejected() {
        let reg = CrsRegistry::new();
        let grid = GridSpec {
            origin_x: 0.0,
            origin_y: 0.0,
            pixel_width: 1.0,
            pixel_height: -1.0,
            width: 2,
            height: 2,
        };
        let dest = DestRaster {
            grid,
            crs: reg.resolve("EPSG:4326").unwrap(),
            bands: Vec::new(),
            data_type: DataType::U8,
            nodata: None,
        };
        let buf = std::io::Cursor::new(Vec::new());
        assert!(write_geotiff(buf, &dest).is_err());
    }
}
