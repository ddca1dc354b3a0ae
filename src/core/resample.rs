//! Resampling kernels.
//!
//! Positions are continuous source pixel coordinates where integer values lie
//! on pixel corners, so pixel `(i, j)` covers `[i, i+1) x [j, j+1)` and its
//! center sits at `(i + 0.5, j + 0.5)`. NaN marks no-data in the source band
//! and is excluded from interpolation by weight renormalization.

use ndarray::Array2;

use crate::types::ResamplingMethod;

/// Samples a band at a fractional pixel position. `None` when the position
/// falls outside the band or no valid neighbor contributes.
pub fn sample(band: &Array2<f64>, col: f64, row: f64, method: ResamplingMethod) -> Option<f64> {
    let (height, width) = band.dim();
    if col < 0.0 || row < 0.0 || col >= width as f64 || row >= height as f64 {
        return None;
    }
    match method {
        ResamplingMethod::Nearest => nearest(band, col, row),
        ResamplingMethod::Bilinear => bilinear(band, col, row),
        ResamplingMethod::Cubic => cubic(band, col, row),
    }
}

fn nearest(band: &Array2<f64>, col: f64, row: f64) -> Option<f64> {
    let v = band[[row as usize, col as usize]];
    if v.is_nan() { None } else { Some(v) }
}

fn bilinear(band: &Array2<f64>, col: f64, row: f64) -> Option<f64> {
    let (height, width) = band.dim();
    let cx = col - 0.5;
    let cy = row - 0.5;
    let x0 = cx.floor();
    let y0 = cy.floor();
    let dx = cx - x0;
    let dy = cy - y0;

    let xi = |o: i64| (x0 as i64 + o).clamp(0, width as i64 - 1) as usize;
    let yi = |o: i64| (y0 as i64 + o).clamp(0, height as i64 - 1) as usize;

    let weights = [
        ((yi(0), xi(0)), (1.0 - dx) * (1.0 - dy)),
        ((yi(0), xi(1)), dx * (1.0 - dy)),
        ((yi(1), xi(0)), (1.0 - dx) * dy),
        ((yi(1), xi(1)), dx * dy),
    ];

    // NaN neighbors drop out; the rest are renormalized.
    let mut acc = 0.0;
    let mut total = 0.0;
    for ((y, x), w) in weights {
        let v = band[[y, x]];
        if !v.is_nan() && w > 0.0 {
            acc += v * w;
            total += w;
        }
    }
    if total <= f64::EPSILON {
        return None;
    }
    Some(acc / total)
}

// Catmull-Rom weight for a normalized offset, the classic a = -0.5 kernel.
fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        1.5 * t * t * t - 2.5 * t * t + 1.0
    } else if t < 2.0 {
        -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
    } else {
        0.0
    }
}

fn cubic(band: &Array2<f64>, col: f64, row: f64) -> Option<f64> {
    let (height, width) = band.dim();
    let cx = col - 0.5;
    let cy = row - 0.5;
    let x0 = cx.floor() as i64;
    let y0 = cy.floor() as i64;

    // The full 4x4 support must be inside the band and free of no-data;
    // otherwise bilinear (with its renormalization) takes over.
    if x0 < 1 || y0 < 1 || x0 + 2 >= width as i64 || y0 + 2 >= height as i64 {
        return bilinear(band, col, row);
    }

    let dx = cx - x0 as f64;
    let dy = cy - y0 as f64;
    let mut acc = 0.0;
    for j in -1..=2i64 {
        let wy = cubic_weight(j as f64 - dy);
        for i in -1..=2i64 {
            let v = band[[(y0 + j) as usize, (x0 + i) as usize]];
            if v.is_nan() {
                return bilinear(band, col, row);
            }
            acc += v * wy * cubic_weight(i as f64 - dx);
        }
    }
    Some(acc)
}
