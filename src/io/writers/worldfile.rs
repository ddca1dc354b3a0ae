//! World-file and projection sidecars for viewers that do not read GeoTIFF
//! tags.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::core::geotransform::GeoTransform;

/// Write a world file next to the raster image. World files store the
/// transform in pixel-center convention.
pub fn write_world_file(output_image: &Path, gt: &GeoTransform) -> std::io::Result<()> {
    let ext = output_image
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let world_ext = match ext.as_str() {
        "tif" | "tiff" => "tfw",
        _ => "wld",
    };
    let world_path = output_image.with_extension(world_ext);

    // Shift the origin by half a pixel: world files reference the center of
    // the upper-left pixel, the geotransform its outer corner.
    let c = gt.origin_x + 0.5 * gt.pixel_width + 0.5 * gt.rot_x;
    let f = gt.origin_y + 0.5 * gt.rot_y + 0.5 * gt.pixel_height;

    let mut file = File::create(world_path)?;
    writeln!(file, "{:.12}", gt.pixel_width)?;
    writeln!(file, "{:.12}", gt.rot_y)?;
    writeln!(file, "{:.12}", gt.rot_x)?;
    writeln!(file, "{:.12}", gt.pixel_height)?;
    writeln!(file, "{:.12}", c)?;
    writeln!(file, "{:.12}", f)?;
    Ok(())
}

/// Write a .prj file with the provided projection identifier (EPSG:XXXX).
pub fn write_prj_file(output_image: &Path, projection: &str) -> std::io::Result<()> {
    let prj_path = output_image.with_extension("prj");
    std::fs::write(prj_path, projection.as_bytes())
}
