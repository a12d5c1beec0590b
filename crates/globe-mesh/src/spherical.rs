//! Unit-sphere vertices addressed by latitude and longitude.

use std::f32::consts::{PI, TAU};
use std::fmt;
use std::ops::{Add, Sub};

use glam::{Vec2, Vec3};

/// Elevation a vertex carries until terrain is sampled onto it.
pub const DEFAULT_ELEVATION: f32 = 1.0;

/// A globe vertex: latitude/longitude, the matching unit position, and a
/// terrain elevation in meters.
///
/// `uv` and `pos` are two views of the same point, fixed at construction.
/// Only the elevation can change afterwards. The layout is the on-disk
/// vertex record: 6 little-endian `f32`s.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SphericalCoord {
    uv: Vec2,
    pos: Vec3,
    elev: f32,
}

static_assertions::assert_eq_size!(SphericalCoord, [u8; 24]);

impl SphericalCoord {
    /// Vertex at `lat` in `[-π/2, π/2]` and `lon` in radians. Longitude is
    /// wrapped into `[-π, π]`.
    pub fn from_lat_lon(lat: f32, lon: f32) -> Self {
        let uv = Vec2::new(lat, wrap_longitude(lon));
        Self {
            uv,
            pos: to_cartesian(uv),
            elev: DEFAULT_ELEVATION,
        }
    }

    /// Vertex in the direction of `p`, which need not be normalized.
    /// A zero vector maps to latitude and longitude 0 with a zero position.
    pub fn from_position(p: Vec3) -> Self {
        let pos = p.normalize_or_zero();
        Self {
            uv: to_polar(pos),
            pos,
            elev: DEFAULT_ELEVATION,
        }
    }

    pub fn with_elevation(mut self, elev: f32) -> Self {
        self.elev = elev;
        self
    }

    /// `(latitude, longitude)` in radians.
    pub fn uv(&self) -> Vec2 {
        self.uv
    }

    pub fn lat(&self) -> f32 {
        self.uv.x
    }

    pub fn lon(&self) -> f32 {
        self.uv.y
    }

    /// Position on the unit sphere.
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    pub fn elev(&self) -> f32 {
        self.elev
    }

    pub fn set_elev(&mut self, elev: f32) {
        self.elev = elev;
    }
}

/// Sum of the two positions. Elevation does not take part.
impl Add for SphericalCoord {
    type Output = Vec3;

    fn add(self, rhs: Self) -> Vec3 {
        self.pos + rhs.pos
    }
}

/// Difference of the two positions. Elevation does not take part.
impl Sub for SphericalCoord {
    type Output = Vec3;

    fn sub(self, rhs: Self) -> Vec3 {
        self.pos - rhs.pos
    }
}

impl fmt::Display for SphericalCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[({}, {}), ({}, {}, {})]",
            self.uv.x, self.uv.y, self.pos.x, self.pos.y, self.pos.z
        )
    }
}

/// Bring a longitude into `[-π, π]`.
pub fn wrap_longitude(lon: f32) -> f32 {
    if lon > PI {
        lon - TAU
    } else if lon < -PI {
        lon + TAU
    } else {
        lon
    }
}

/// Unit position for `(lat, lon)`. Longitude 0 points along +Z, latitude
/// π/2 along +Y.
pub fn to_cartesian(uv: Vec2) -> Vec3 {
    let (sin_lat, cos_lat) = uv.x.sin_cos();
    let (sin_lon, cos_lon) = uv.y.sin_cos();
    Vec3::new(cos_lat * sin_lon, sin_lat, cos_lat * cos_lon)
}

/// `(lat, lon)` of a unit position.
pub fn to_polar(pos: Vec3) -> Vec2 {
    Vec2::new(pos.y.clamp(-1.0, 1.0).asin(), pos.x.atan2(pos.z))
}
