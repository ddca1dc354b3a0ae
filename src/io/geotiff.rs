//! GeoTIFF reading.
//!
//! Decodes a (Geo)TIFF into the in-memory raster model: every page becomes
//! one or more bands (interleaved samples are split apart), the geotransform
//! is recovered from ModelPixelScale+ModelTiepoint (or ModelTransformation),
//! the CRS from the GeoKey directory, and the declared no-data value is
//! mapped to NaN. Files without georeferencing tags still load; their
//! geotransform is marked degenerate and rejected later when a grid has to
//! be resolved against it.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ndarray::Array2;
use thiserror::Error;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::{debug, warn};

use crate::core::crs::{Crs, CrsRegistry};
use crate::core::geotransform::GeoTransform;
use crate::core::raster::SourceRaster;
use crate::types::DataType;

// GeoKey ids inside the GeoKeyDirectory tag.
const GEOGRAPHIC_TYPE_GEO_KEY: u64 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u64 = 3072;

/// Errors encountered while reading or writing GeoTIFF rasters.
#[derive(Debug, Error)]
pub enum GeoTiffError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),
    #[error("Unsupported raster: {0}")]
    Unsupported(String),
    #[error("Dimension mismatch: expected {expected} samples, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Reads a GeoTIFF into memory. CRS lookup goes through the caller's
/// registry so no global CRS state is consulted.
pub fn read_geotiff(path: &Path, registry: &CrsRegistry) -> Result<SourceRaster, GeoTiffError> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))?;

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        return Err(GeoTiffError::Unsupported("empty raster".to_string()));
    }

    // Georeferencing is carried by the first page; additional pages only
    // contribute bands.
    let geotransform = read_geotransform(&mut decoder)?;
    let crs = read_crs(&mut decoder, registry)?;
    let nodata = read_nodata(&mut decoder)?;

    let mut bands = Vec::new();
    let mut data_type = DataType::U8;
    loop {
        let (page_width, page_height) = decoder.dimensions()?;
        if (page_width as usize, page_height as usize) != (width, height) {
            return Err(GeoTiffError::Unsupported(format!(
                "page size {}x{} differs from first page {}x{}",
                page_width, page_height, width, height
            )));
        }
        let samples = match decoder.find_tag(Tag::SamplesPerPixel)? {
            Some(v) => v.into_u64()? as usize,
            None => 1,
        };
        if samples == 0 {
            return Err(GeoTiffError::Unsupported("no raster bands".to_string()));
        }

        let (data, page_type) = decode_samples(decoder.read_image()?);
        data_type = page_type;
        let expected = width * height * samples;
        if data.len() != expected {
            return Err(GeoTiffError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }

        for band in 0..samples {
            let arr = Array2::from_shape_fn((height, width), |(r, c)| {
                let v = data[(r * width + c) * samples + band];
                match nodata {
                    Some(nd) if v == nd => f64::NAN,
                    _ => v,
                }
            });
            bands.push(arr);
        }

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }
    let samples = bands.len();

    debug!(
        "read {:?}: {}x{} px, {} band(s), {:?}, crs {:?}",
        path,
        width,
        height,
        samples,
        data_type,
        crs.as_ref().map(|c| c.to_string())
    );

    Ok(SourceRaster {
        width,
        height,
        geotransform,
        crs,
        bands,
        data_type,
        nodata,
    })
}

fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform, GeoTiffError> {
    let scale = match decoder.find_tag(Tag::ModelPixelScaleTag)? {
        Some(v) => Some(v.into_f64_vec()?),
        None => None,
    };
    let tiepoint = match decoder.find_tag(Tag::ModelTiepointTag)? {
        Some(v) => Some(v.into_f64_vec()?),
        None => None,
    };
    if let (Some(scale), Some(tie)) = (&scale, &tiepoint) {
        if scale.len() >= 2 && tie.len() >= 6 {
            // Tie raster point (i, j) to world (x, y); pixel height is
            // negative for the usual north-up layout.
            let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
            return Ok(GeoTransform::north_up(
                x - i * scale[0],
                y + j * scale[1],
                scale[0],
                -scale[1],
            ));
        }
    }

    if let Some(v) = decoder.find_tag(Tag::ModelTransformationTag)? {
        let m = v.into_f64_vec()?;
        if m.len() >= 8 {
            return Ok(GeoTransform::new([m[3], m[0], m[1], m[7], m[4], m[5]]));
        }
    }

    // No georeferencing at all; poison the transform so grid resolution
    // reports the inability to compute a transformation.
    Ok(GeoTransform::north_up(f64::NAN, f64::NAN, f64::NAN, f64::NAN))
}

fn read_crs<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    registry: &CrsRegistry,
) -> Result<Option<Crs>, GeoTiffError> {
    let directory = match decoder.find_tag(Tag::GeoKeyDirectoryTag)? {
        Some(v) => v.into_u64_vec()?,
        None => return Ok(None),
    };

    let mut geographic = None;
    let mut projected = None;
    // Entries are 4-value records after the 4-value header.
    for entry in directory[4.min(directory.len())..].chunks_exact(4) {
        let (key, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 {
            continue;
        }
        match key {
            GEOGRAPHIC_TYPE_GEO_KEY => geographic = Some(value),
            PROJECTED_CS_TYPE_GEO_KEY => projected = Some(value),
            _ => {}
        }
    }

    let Some(code) = projected.or(geographic) else {
        return Ok(None);
    };
    let Ok(code) = u16::try_from(code) else {
        return Ok(None);
    };
    match registry.from_epsg(code) {
        Ok(crs) => Ok(Some(crs)),
        Err(_) => {
            warn!("EPSG:{} from the GeoKey directory is not in the CRS database", code);
            Ok(None)
        }
    }
}

fn read_nodata<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<Option<f64>, GeoTiffError> {
    let Some(v) = decoder.find_tag(Tag::GdalNodata)? else {
        return Ok(None);
    };
    let s = v.into_string()?;
    Ok(s.trim_end_matches('\0').trim().parse::<f64>().ok())
}

fn decode_samples(result: DecodingResult) -> (Vec<f64>, DataType) {
    match result {
        DecodingResult::U8(v) => (v.into_iter().map(f64::from).collect(), DataType::U8),
        DecodingResult::U16(v) => (v.into_iter().map(f64::from).collect(), DataType::U16),
        DecodingResult::U32(v) => (v.into_iter().map(f64::from).collect(), DataType::F64),
        DecodingResult::U64(v) => (v.into_iter().map(|x| x as f64).collect(), DataType::F64),
        DecodingResult::I8(v) => (v.into_iter().map(f64::from).collect(), DataType::F32),
        DecodingResult::I16(v) => (v.into_iter().map(f64::from).collect(), DataType::F32),
        DecodingResult::I32(v) => (v.into_iter().map(f64::from).collect(), DataType::F64),
        DecodingResult::I64(v) => (v.into_iter().map(|x| x as f64).collect(), DataType::F64),
        DecodingResult::F32(v) => (v.into_iter().map(f64::from).collect(), DataType::F32),
        DecodingResult::F64(v) => (v, DataType::F64),
    }
}
