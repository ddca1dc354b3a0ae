//! Output grid resolution.
//!
//! Turns the source georeferencing, the source->destination transformer, and
//! the user's partial constraints (explicit size, bounding box, resolution)
//! into a concrete destination grid: origin, pixel size, width, height. The
//! grid is computed once per invocation and immutable afterwards.

use tracing::debug;

use crate::core::bbox::BoundingBox;
use crate::core::geotransform::GeoTransform;
use crate::core::transform::CrsTransformer;
use crate::error::{Error, Result};

/// Boundary points sampled per edge when reprojecting an extent, enough to
/// bound the curvature a projection change introduces.
const EDGE_SAMPLE_COUNT: usize = 21;

/// Resolved destination grid. `pixel_height` is negative for north-up output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub width: usize,
    pub height: usize,
}

impl GridSpec {
    pub fn geotransform(&self) -> GeoTransform {
        GeoTransform::north_up(self.origin_x, self.origin_y, self.pixel_width, self.pixel_height)
    }

    pub fn extent(&self) -> BoundingBox {
        BoundingBox {
            xmin: self.origin_x,
            ymin: self.origin_y + self.height as f64 * self.pixel_height,
            xmax: self.origin_x + self.width as f64 * self.pixel_width,
            ymax: self.origin_y,
        }
    }
}

/// User constraints on the destination grid. All optional and mutually
/// constraining; contradictions are rejected during resolution.
#[derive(Default)]
pub struct GridConstraints<'a> {
    /// Explicit output size; a zero dimension is derived from the other
    /// preserving square pixels, (0, 0) means fully automatic.
    pub size: Option<(usize, usize)>,
    /// Explicit extent. Already in the destination CRS unless
    /// `bbox_transformer` is set.
    pub bbox: Option<BoundingBox>,
    /// Transformer from the bounding box CRS into the destination CRS.
    pub bbox_transformer: Option<&'a CrsTransformer>,
    /// Explicit pixel size (x, y), both positive.
    pub resolution: Option<(f64, f64)>,
}

/// Resolves the destination grid for a source raster of `src_width` x
/// `src_height` pixels under `src_gt`, warped through `transformer`.
pub fn resolve_output_grid(
    src_width: usize,
    src_height: usize,
    src_gt: &GeoTransform,
    transformer: &CrsTransformer,
    constraints: &GridConstraints,
) -> Result<GridSpec> {
    if src_width == 0 || src_height == 0 {
        return Err(Error::InvalidGrid("source raster is empty".to_string()));
    }
    if !src_gt.is_valid() {
        return Err(Error::no_transform(
            "pixel/line coordinates",
            "georeferenced coordinates",
            "source geotransform is degenerate",
        ));
    }
    if constraints.size.is_some() && constraints.resolution.is_some() {
        return Err(Error::InvalidGrid(
            "output size and target resolution are mutually exclusive".to_string(),
        ));
    }

    let extent = match constraints.bbox {
        Some(bbox) => match constraints.bbox_transformer {
            Some(bbox_t) => reproject_bbox(&bbox, bbox_t)?,
            None => bbox,
        },
        None => source_extent(src_width, src_height, src_gt, transformer)?,
    };
    if extent.width() <= 0.0 || extent.height() <= 0.0 {
        return Err(Error::InvalidGrid(format!(
            "resolved extent has zero area: {:?}",
            extent
        )));
    }

    let (pixel_width, pixel_height, fixed_size) = match (constraints.resolution, constraints.size) {
        (Some((rx, ry)), _) => {
            if !(rx > 0.0 && ry > 0.0 && rx.is_finite() && ry.is_finite()) {
                return Err(Error::InvalidGrid(format!(
                    "target resolution must be positive, got ({rx}, {ry})"
                )));
            }
            (rx, ry, None)
        }
        (None, Some((0, 0)) | None) => {
            let res = auto_resolution(src_width, src_height, src_gt, transformer, &extent);
            if !(res > 0.0 && res.is_finite()) {
                return Err(Error::InvalidGrid(format!(
                    "automatic resolution is degenerate ({res})"
                )));
            }
            (res, res, None)
        }
        (None, Some((w, 0))) => {
            let px = extent.width() / w as f64;
            (px, px, None)
        }
        (None, Some((0, h))) => {
            let py = extent.height() / h as f64;
            (py, py, None)
        }
        (None, Some((w, h))) => (
            extent.width() / w as f64,
            extent.height() / h as f64,
            Some((w, h)),
        ),
    };

    let (width, height) = match fixed_size {
        Some((w, h)) => (w, h),
        None => {
            let w = (extent.width() / pixel_width).round() as usize;
            let h = (extent.height() / pixel_height).round() as usize;
            if w == 0 || h == 0 {
                return Err(Error::InvalidGrid(format!(
                    "resolved size {w}x{h} is degenerate for extent {:?} at resolution ({pixel_width}, {pixel_height})",
                    extent
                )));
            }
            (w, h)
        }
    };

    let grid = GridSpec {
        origin_x: extent.xmin,
        origin_y: extent.ymax,
        pixel_width,
        pixel_height: -pixel_height,
        width,
        height,
    };
    debug!(
        "resolved grid: {}x{} px, pixel ({:.6}, {:.6}), origin ({:.6}, {:.6})",
        grid.width, grid.height, grid.pixel_width, grid.pixel_height, grid.origin_x, grid.origin_y
    );
    Ok(grid)
}

/// Transforms the source raster outline into the destination CRS, sampling
/// points along each edge so projection curvature cannot clip the extent.
fn source_extent(
    src_width: usize,
    src_height: usize,
    src_gt: &GeoTransform,
    transformer: &CrsTransformer,
) -> Result<BoundingBox> {
    let w = src_width as f64;
    let h = src_height as f64;
    let mut extent = BoundingBox::empty();
    let mut transformed = 0usize;

    for (col, row) in outline_points(0.0, 0.0, w, h) {
        let (x, y) = src_gt.apply(col, row);
        if let Some((dx, dy)) = transformer.forward(x, y) {
            extent.expand(dx, dy);
            transformed += 1;
        }
    }

    if transformed == 0 || !extent.is_finite() {
        return Err(Error::no_transform(
            "source coordinates",
            "destination coordinates",
            "no boundary point of the source raster could be transformed",
        ));
    }
    Ok(extent)
}

/// Reprojects an explicit bounding box into the destination CRS by edge
/// sampling, same technique as for the source outline.
fn reproject_bbox(bbox: &BoundingBox, bbox_t: &CrsTransformer) -> Result<BoundingBox> {
    let mut extent = BoundingBox::empty();
    let mut transformed = 0usize;

    for (x, y) in outline_points(bbox.xmin, bbox.ymin, bbox.xmax - bbox.xmin, bbox.ymax - bbox.ymin)
    {
        if let Some((dx, dy)) = bbox_t.forward(x, y) {
            extent.expand(dx, dy);
            transformed += 1;
        }
    }

    if transformed == 0 || !extent.is_finite() {
        return Err(Error::no_transform(
            "bounding box coordinates",
            "destination coordinates",
            "no point of the bounding box could be transformed",
        ));
    }
    Ok(extent)
}

/// Points along the four edges of an axis-aligned rectangle, corners
/// included once, `EDGE_SAMPLE_COUNT` samples per edge.
fn outline_points(x0: f64, y0: f64, width: f64, height: f64) -> impl Iterator<Item = (f64, f64)> {
    let n = EDGE_SAMPLE_COUNT;
    let step = 1.0 / (n - 1) as f64;
    (0..n)
        .flat_map(move |i| {
            let t = i as f64 * step;
            [
                (x0 + t * width, y0),
                (x0 + t * width, y0 + height),
                (x0, y0 + t * height),
                (x0 + width, y0 + t * height),
            ]
        })
}

/// Resolution preserving the source ground sample distance: the source
/// bounding-box diagonal measured in pixels must cover the same number of
/// pixels after reprojection.
fn auto_resolution(
    src_width: usize,
    src_height: usize,
    src_gt: &GeoTransform,
    transformer: &CrsTransformer,
    extent: &BoundingBox,
) -> f64 {
    let diagonal_pixels = (src_width as f64).hypot(src_height as f64);

    let (tlx, tly) = src_gt.apply(0.0, 0.0);
    let (brx, bry) = src_gt.apply(src_width as f64, src_height as f64);
    if let (Some((ax, ay)), Some((bx, by))) =
        (transformer.forward(tlx, tly), transformer.forward(brx, bry))
    {
        let dst_diagonal = (bx - ax).hypot(by - ay);
        if dst_diagonal > 0.0 {
            return dst_diagonal / diagonal_pixels;
        }
    }
    // Corners failed to transform (extreme projections): fall back to the
    // already-resolved extent diagonal.
    extent.width().hypot(extent.height()) / diagonal_pixels
}
