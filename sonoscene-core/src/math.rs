//! Math types for sonoscene
//!
//! Positions are meters in a right-handed frame; the renderer works in `f64`
//! so that delay rounding matches the sample grid exactly.

pub use glam::DVec3;

use crate::error::{Result, SonoSceneError};
use std::f64::consts::PI;

/// Build a position from a caller-supplied slice, which must hold exactly `x, y, z`.
pub fn parse_position(position: &[f64]) -> Result<DVec3> {
    match position {
        [x, y, z] => {
            if !(x.is_finite() && y.is_finite() && z.is_finite()) {
                return Err(SonoSceneError::InvalidArgument(format!(
                    "Position components must be finite, got {:?}",
                    position
                )));
            }
            Ok(DVec3::new(*x, *y, *z))
        }
        _ => Err(SonoSceneError::InvalidArgument(format!(
            "Position must have exactly 3 components (x, y, z), got {}",
            position.len()
        ))),
    }
}

/// Horizontal direction of `position` as seen from the origin, in radians within (-π, π].
///
/// Zero points along +X and angles grow counterclockwise towards +Y.
pub fn azimuth(position: DVec3) -> f64 {
    position.y.atan2(position.x)
}

/// Index of the angular sector containing `azimuth`.
///
/// Sectors are `bin_size_degrees` wide and counted counterclockwise from +X,
/// so the result lies in `0..360 / bin_size_degrees`.
pub fn azimuth_bin(azimuth: f64, bin_size_degrees: f64) -> Result<usize> {
    if !(bin_size_degrees > 0.0 && bin_size_degrees <= 360.0) {
        return Err(SonoSceneError::InvalidArgument(format!(
            "Bin size must be in (0, 360] degrees, got {}",
            bin_size_degrees
        )));
    }

    let num_bins = (360.0 / bin_size_degrees).floor() as usize;
    let degrees = azimuth.to_degrees().rem_euclid(360.0);
    let bin = (degrees / bin_size_degrees).floor() as usize;
    Ok(bin.min(num_bins - 1))
}

/// Positions of `count` points evenly spaced on a horizontal circle around the origin.
///
/// Point `i` sits at angle `2πi / count`, with `z = 0`.
pub fn circle_positions(count: usize, radius: f64) -> Vec<DVec3> {
    (0..count)
        .map(|i| {
            let angle = 2.0 * PI / count as f64 * i as f64;
            DVec3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
        })
        .collect()
}
