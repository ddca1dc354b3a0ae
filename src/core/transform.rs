//! Point transformation between a fixed pair of CRSs.
//!
//! `forward` maps source CRS coordinates into the destination CRS and
//! `inverse` maps back. Construction fails when either definition cannot be
//! turned into a projection (no transformation path); per-point failures are
//! returned as `None` and degrade to no-data at the caller.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::core::crs::Crs;
use crate::error::{Error, Result};

pub struct CrsTransformer {
    src: Proj,
    dst: Proj,
    src_geographic: bool,
    dst_geographic: bool,
    identity: bool,
}

impl CrsTransformer {
    /// Builds the forward/inverse pair. This is the only step that can load
    /// projection machinery; it fails with `NoTransformPath` before any pixel
    /// work when the pair cannot be related.
    pub fn new(src: &Crs, dst: &Crs) -> Result<Self> {
        let src_proj = Proj::from_proj_string(src.definition())
            .map_err(|e| Error::no_transform(src.authority(), dst.authority(), format!("{e:?}")))?;
        let dst_proj = Proj::from_proj_string(dst.definition())
            .map_err(|e| Error::no_transform(src.authority(), dst.authority(), format!("{e:?}")))?;

        Ok(Self {
            src: src_proj,
            dst: dst_proj,
            src_geographic: src.is_geographic(),
            dst_geographic: dst.is_geographic(),
            identity: src == dst,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Source CRS -> destination CRS. `None` when the point lies outside the
    /// mathematical domain of the transformation or is non-finite.
    pub fn forward(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if self.identity {
            return finite(x, y);
        }
        project(&self.src, &self.dst, self.src_geographic, self.dst_geographic, x, y)
    }

    /// Destination CRS -> source CRS.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if self.identity {
            return finite(x, y);
        }
        project(&self.dst, &self.src, self.dst_geographic, self.src_geographic, x, y)
    }
}

fn finite(x: f64, y: f64) -> Option<(f64, f64)> {
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

// proj4rs carries geographic coordinates in radians.
fn project(
    from: &Proj,
    to: &Proj,
    from_geographic: bool,
    to_geographic: bool,
    x: f64,
    y: f64,
) -> Option<(f64, f64)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let (xin, yin) = if from_geographic {
        (x.to_radians(), y.to_radians())
    } else {
        (x, y)
    };
    let mut point = (xin, yin, 0.0);
    transform(from, to, &mut point).ok()?;
    let (xo, yo) = if to_geographic {
        (point.0.to_degrees(), point.1.to_degrees())
    } else {
        (point.0, point.1)
    };
    finite(xo, yo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crs::CrsRegistry;

    fn transformer(src: &str, dst: &str) -> CrsTransformer {
        let reg = CrsRegistry::new();
        CrsTransformer::new(&reg.resolve(src).unwrap(), &reg.resolve(dst).unwrap()).unwrap()
    }

    #[test]
    fn identity_pair_passes_points_through() {
        let t = transformer("EPSG:32611", "EPSG:32611");
        assert!(t.is_identity());
        assert_eq!(t.forward(440720.0, 3751320.0), Some((440720.0, 3751320.0)));
    }

    #[test]
    fn utm_to_geographic_and_back() {
        let t = transformer("EPSG:32611", "EPSG:4326");
        // Center of the canonical 20x20 UTM 11N test scene.
        let (lon, lat) = t.forward(441320.0, 3750720.0).unwrap();
        assert!((-118.0..-117.0).contains(&lon), "lon {lon}");
        assert!((33.0..34.5).contains(&lat), "lat {lat}");

        let (x, y) = t.inverse(lon, lat).unwrap();
        assert!((x - 441320.0).abs() < 0.01, "x {x}");
        assert!((y - 3750720.0).abs() < 0.01, "y {y}");
    }

    #[test]
    fn geographic_to_mercator_origin() {
        let t = transformer("EPSG:4326", "EPSG:3857");
        let (x, y) = t.forward(0.0, 0.0).unwrap();
        assert!(x.abs() < 1e-6);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn non_finite_input_is_a_domain_failure() {
        let t = transformer("EPSG:32611", "EPSG:4326");
        assert!(t.forward(f64::NAN, 0.0).is_none());
        assert!(t.inverse(f64::INFINITY, 1.0).is_none());
    }

    #[test]
    fn out_of_domain_point_is_tolerated() {
        // Latitude beyond the pole is outside the mercator domain.
        let t = transformer("EPSG:4326", "EPSG:3857");
        assert!(t.forward(0.0, 95.0).is_none());
    }
}
