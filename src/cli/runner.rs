use std::fs;

use tracing::{info, warn};

use rewarp::api::reproject;
use rewarp::{Outcome, ReprojectParams};

use super::args::CliArgs;
use super::errors::AppError;

fn parse_size(value: &str) -> Result<(usize, usize), AppError> {
    let invalid = || AppError::InvalidSize {
        value: value.to_string(),
    };
    let (w, h) = value.split_once(',').ok_or_else(invalid)?;
    Ok((
        w.trim().parse().map_err(|_| invalid())?,
        h.trim().parse().map_err(|_| invalid())?,
    ))
}

fn parse_bbox(value: &str) -> Result<[f64; 4], AppError> {
    let invalid = || AppError::InvalidBbox {
        value: value.to_string(),
    };
    let parts: Vec<f64> = value
        .split(',')
        .map(|p| p.trim().parse())
        .collect::<Result<_, _>>()
        .map_err(|_| invalid())?;
    match parts.as_slice() {
        [xmin, ymin, xmax, ymax] => Ok([*xmin, *ymin, *xmax, *ymax]),
        _ => Err(invalid()),
    }
}

fn parse_resolution(value: &str) -> Result<(f64, f64), AppError> {
    let invalid = || AppError::InvalidResolution {
        value: value.to_string(),
    };
    match value.split_once(',') {
        Some((x, y)) => Ok((
            x.trim().parse().map_err(|_| invalid())?,
            y.trim().parse().map_err(|_| invalid())?,
        )),
        None => {
            let res = value.trim().parse().map_err(|_| invalid())?;
            Ok((res, res))
        }
    }
}

/// Merge the preset file (if any) with explicit CLI flags; flags win.
fn build_params(args: &CliArgs) -> Result<ReprojectParams, Box<dyn std::error::Error>> {
    let mut params = match &args.preset {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| AppError::PresetRead {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            serde_json::from_str(&text).map_err(|e| AppError::PresetRead {
                path: path.clone(),
                reason: e.to_string(),
            })?
        }
        None => ReprojectParams::default(),
    };

    if args.src_crs.is_some() {
        params.src_crs = args.src_crs.clone();
    }
    if args.dst_crs.is_some() {
        params.dst_crs = args.dst_crs.clone();
    }
    if let Some(size) = &args.size {
        params.size = Some(parse_size(size)?);
    }
    if let Some(bbox) = &args.bbox {
        params.bbox = Some(parse_bbox(bbox)?);
    }
    if args.bbox_crs.is_some() {
        params.bbox_crs = args.bbox_crs.clone();
    }
    if let Some(resolution) = &args.resolution {
        params.resolution = Some(parse_resolution(resolution)?);
    }
    if args.preset.is_none() || args.resampling != ReprojectParams::default().resampling {
        params.resampling = args.resampling;
    }
    if args.src_nodata.is_some() {
        params.src_nodata = args.src_nodata;
    }
    if args.dst_nodata.is_some() {
        params.dst_nodata = args.dst_nodata;
    }
    if args.threads.is_some() {
        params.threads = args.threads;
    }
    if args.sidecars {
        params.sidecars = true;
    }
    Ok(params)
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    let params = build_params(&args)?;

    let mut last_pct = -1i64;
    let mut progress_line = |fraction: f64, _message: &str| {
        let pct = (fraction * 100.0).floor() as i64;
        if pct != last_pct {
            eprint!("\r{:>3}%", pct);
            if pct >= 100 {
                eprintln!();
            }
            last_pct = pct;
        }
        true
    };

    let outcome = if args.quiet {
        reproject(&args.input, &args.output, &params, None)?
    } else {
        reproject(&args.input, &args.output, &params, Some(&mut progress_line))?
    };

    match outcome {
        Outcome::Completed => {
            info!("Successfully reprojected: {:?} -> {:?}", args.input, args.output);
        }
        Outcome::Cancelled => {
            warn!("Reprojection cancelled; partial output kept at {:?}", args.output);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_pairs() {
        assert_eq!(parse_size("10,0").unwrap(), (10, 0));
        assert_eq!(parse_size(" 800 , 600 ").unwrap(), (800, 600));
        assert!(parse_size("10").is_err());
        assert!(parse_size("a,b").is_err());
    }

    #[test]
    fn bbox_needs_four_numbers() {
        let b = parse_bbox("-117.6,33.89,-117.62,33.9").unwrap();
        assert_eq!(b[0], -117.6);
        assert!(parse_bbox("1,2,3").is_err());
    }

    #[test]
    fn resolution_accepts_single_or_pair() {
        assert_eq!(parse_resolution("30").unwrap(), (30.0, 30.0));
        assert_eq!(parse_resolution("30,15").unwrap(), (30.0, 15.0));
        assert!(parse_resolution("x").is_err());
    }
}
