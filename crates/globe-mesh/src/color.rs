//! Elevation to vertex color.

use glam::Vec3;

/// HSV anchors as `(hue degrees, saturation, value)`.
pub const BEACH: Vec3 = Vec3::new(258.0, 0.06, 0.72);
pub const DEEP_OCEAN: Vec3 = Vec3::new(232.0, 0.77, 0.22);
pub const LOW_LAND: Vec3 = Vec3::new(117.0, 0.92, 0.36);
pub const PLAINS: Vec3 = Vec3::new(88.0, 0.28, 0.56);
pub const GLACIER: Vec3 = Vec3::new(182.0, 0.49, 0.94);

/// RGB returned as-is for the highest band.
pub const ABOVE_GLACIER: Vec3 = Vec3::new(0.90, 0.90, 0.95);

const SEA_LEVEL: f32 = 0.0;
const OCEAN_FLOOR: f32 = -7000.0;
const PLAINS_TOP: f32 = 2000.0;
const GLACIER_TOP: f32 = 5000.0;

/// RGB color for an elevation in meters.
///
/// Each band blends two HSV anchors linearly across its elevation range:
/// beach to deep ocean below sea level, low land to plains up to 2000 m,
/// plains to glacier up to 5000 m. Anything higher is [`ABOVE_GLACIER`].
pub fn elev_to_rgb(elev: f32) -> Vec3 {
    if elev < SEA_LEVEL {
        return lerp_hsv(elev, BEACH, DEEP_OCEAN, SEA_LEVEL, OCEAN_FLOOR);
    }
    if elev < PLAINS_TOP {
        return lerp_hsv(elev, LOW_LAND, PLAINS, SEA_LEVEL, PLAINS_TOP);
    }
    if elev < GLACIER_TOP {
        return lerp_hsv(elev, PLAINS, GLACIER, PLAINS_TOP, GLACIER_TOP);
    }
    ABOVE_GLACIER
}

fn lerp_hsv(elev: f32, from: Vec3, to: Vec3, start: f32, end: f32) -> Vec3 {
    let t = (elev - start) / (end - start);
    hsv_to_rgb(from.lerp(to, t))
}

/// Convert `(hue degrees, saturation, value)` to RGB.
///
/// Zero saturation yields `(0, 0, value)`.
pub fn hsv_to_rgb(hsv: Vec3) -> Vec3 {
    let (h, s, v) = (hsv.x, hsv.y, hsv.z);
    if s == 0.0 {
        return Vec3::new(0.0, 0.0, v);
    }

    let h = (h % 360.0) / 60.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);

    match sector as i32 {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        _ => Vec3::new(v, p, q),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-3
    }

    #[test]
    fn test_primary_hues() {
        assert!(close(hsv_to_rgb(Vec3::new(0.0, 1.0, 1.0)), Vec3::X));
        assert!(close(hsv_to_rgb(Vec3::new(120.0, 1.0, 1.0)), Vec3::Y));
        assert!(close(hsv_to_rgb(Vec3::new(240.0, 1.0, 1.0)), Vec3::Z));
        assert!(close(hsv_to_rgb(Vec3::new(360.0, 1.0, 0.5)), Vec3::new(0.5, 0.0, 0.0)));
        assert!(close(hsv_to_rgb(Vec3::new(300.0, 1.0, 1.0)), Vec3::new(1.0, 0.0, 1.0)));
    }

    #[test]
    fn test_zero_saturation() {
        assert_eq!(hsv_to_rgb(Vec3::new(45.0, 0.0, 0.7)), Vec3::new(0.0, 0.0, 0.7));
    }

    #[test]
    fn test_band_anchors() {
        assert_eq!(elev_to_rgb(0.0), hsv_to_rgb(LOW_LAND));
        assert!(close(elev_to_rgb(-7000.0), hsv_to_rgb(DEEP_OCEAN)));
        assert!(close(elev_to_rgb(1999.999), hsv_to_rgb(PLAINS)));
        assert_eq!(elev_to_rgb(2000.0), hsv_to_rgb(PLAINS));
        assert!(close(elev_to_rgb(4999.99), hsv_to_rgb(GLACIER)));
    }

    #[test]
    fn test_sea_level_limits() {
        // Approaching 0 from below converges on the beach anchor, from above
        // the land band starts exactly at its low-land anchor.
        assert!(close(elev_to_rgb(-0.001), hsv_to_rgb(BEACH)));
        assert!(close(elev_to_rgb(0.001), hsv_to_rgb(LOW_LAND)));
        assert_eq!(elev_to_rgb(0.0), hsv_to_rgb(LOW_LAND));
    }

    #[test]
    fn test_high_band_is_fixed() {
        assert_eq!(elev_to_rgb(5000.0), ABOVE_GLACIER);
        assert_eq!(elev_to_rgb(8848.0), ABOVE_GLACIER);
        assert_eq!(elev_to_rgb(f32::MAX), ABOVE_GLACIER);
    }

    #[test]
    fn test_ocean_is_blue() {
        let c = elev_to_rgb(-3000.0);
        assert!(c.z > c.x && c.z > c.y, "ocean color {c} should be blue");
    }
}
