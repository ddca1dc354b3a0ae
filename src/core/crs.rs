//! CRS values and the registry that resolves identifier strings into them.
//!
//! A `Crs` pairs an EPSG code with its proj4 definition from the
//! crs-definitions database. The registry is an explicitly constructed
//! object passed by reference wherever resolution is needed; the engine
//! keeps no process-wide CRS state.

use crate::error::{Error, Result};

/// An immutable coordinate reference system definition.
#[derive(Debug, Clone)]
pub struct Crs {
    epsg: u16,
    proj4: &'static str,
}

impl Crs {
    pub fn epsg(&self) -> u16 {
        self.epsg
    }

    /// The proj4 definition string backing this CRS.
    pub fn definition(&self) -> &'static str {
        self.proj4
    }

    /// Geographic (lon/lat) CRSs carry angular coordinates and need
    /// degree/radian conversion at the transform boundary.
    pub fn is_geographic(&self) -> bool {
        self.proj4.contains("+proj=longlat")
    }

    /// Identifier in `EPSG:code` form, used in error messages and sidecars.
    pub fn authority(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

// Two CRS values are the same system when their definitions agree,
// regardless of how they were looked up.
impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        self.proj4 == other.proj4
    }
}

impl Eq for Crs {}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Resolves CRS identifier strings against the crs-definitions database.
///
/// Accepted forms: `EPSG:4326`, a bare code `4326`, or WKT carrying an
/// `AUTHORITY["EPSG","..."]` tag.
#[derive(Debug, Default)]
pub struct CrsRegistry {
    _private: (),
}

impl CrsRegistry {
    pub fn new() -> Self {
        Self { _private: () }
    }

    pub fn resolve(&self, ident: &str) -> Result<Crs> {
        let ident = ident.trim();
        let code = parse_epsg_code(ident).ok_or_else(|| Error::UnknownCrs {
            ident: ident.to_string(),
        })?;
        self.from_epsg(code)
    }

    pub fn from_epsg(&self, code: u16) -> Result<Crs> {
        match crs_definitions::from_code(code) {
            Some(def) => Ok(Crs {
                epsg: code,
                proj4: def.proj4,
            }),
            None => Err(Error::UnknownCrs {
                ident: format!("EPSG:{}", code),
            }),
        }
    }
}

fn parse_epsg_code(ident: &str) -> Option<u16> {
    if let Some(rest) = ident
        .strip_prefix("EPSG:")
        .or_else(|| ident.strip_prefix("epsg:"))
    {
        return rest.trim().parse().ok();
    }
    if ident.chars().all(|c| c.is_ascii_digit()) && !ident.is_empty() {
        return ident.parse().ok();
    }
    parse_wkt_authority(ident)
}

// Last AUTHORITY tag in a WKT string names the whole CRS.
fn parse_wkt_authority(wkt: &str) -> Option<u16> {
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    let idx = wkt.rfind(KEY)?;
    let start = idx + KEY.len();
    let end = wkt[start..].find('"')?;
    wkt[start..start + end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_authority_code() {
        let reg = CrsRegistry::new();
        let crs = reg.resolve("EPSG:4326").unwrap();
        assert_eq!(crs.epsg(), 4326);
        assert!(crs.is_geographic());
    }

    #[test]
    fn resolves_bare_code() {
        let reg = CrsRegistry::new();
        let crs = reg.resolve("32611").unwrap();
        assert_eq!(crs.epsg(), 32611);
        assert!(!crs.is_geographic());
    }

    #[test]
    fn resolves_wkt_authority_tag() {
        let reg = CrsRegistry::new();
        let wkt = r#"PROJCS["WGS 84 / UTM zone 11N",GEOGCS["WGS 84",AUTHORITY["EPSG","4326"]],AUTHORITY["EPSG","32611"]]"#;
        let crs = reg.resolve(wkt).unwrap();
        assert_eq!(crs.epsg(), 32611);
    }

    #[test]
    fn unknown_code_errors() {
        let reg = CrsRegistry::new();
        let err = reg.resolve("EPSG:65000").unwrap_err();
        assert!(matches!(err, Error::UnknownCrs { .. }));
    }

    #[test]
    fn garbage_ident_errors() {
        let reg = CrsRegistry::new();
        assert!(reg.resolve("not-a-crs").is_err());
    }

    #[test]
    fn equality_is_by_definition() {
        let reg = CrsRegistry::new();
        let a = reg.resolve("EPSG:4326").unwrap();
        let b = reg.resolve("4326").unwrap();
        assert_eq!(a, b);
        let c = reg.resolve("EPSG:3857").unwrap();
        assert_ne!(a, c);
    }
}
