//! Planar coordinates and heading arithmetic.
//!
//! Map coordinates are plain Cartesian units (whatever the map loader used,
//! typically pixels or millimetres).  Headings are in degrees, measured with
//! `atan2(dy, dx)` and normalised to `[0, 360)`.

/// A 2-D point stored as single-precision floats.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance.  Used as the edge cost and as the A* heuristic.
    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        self.distance_sq(other).sqrt()
    }

    /// Squared Euclidean distance, for comparisons.
    #[inline]
    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Heading from `self` towards `other` in degrees, normalised to `[0, 360)`.
    pub fn heading_deg_to(self, other: Point) -> f32 {
        normalize_deg((other.y - self.y).atan2(other.x - self.x).to_degrees())
    }

    /// The point `step` units along the straight line towards `other`.
    ///
    /// The caller must ensure `self != other`; the result is undefined
    /// (NaN) for a zero-length direction.
    #[inline]
    pub fn step_toward(self, other: Point, step: f32) -> Point {
        let d = self.distance(other);
        Point {
            x: self.x + step * (other.x - self.x) / d,
            y: self.y + step * (other.y - self.y) / d,
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Wrap an angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_deg(angle: f32) -> f32 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if a >= 360.0 { 0.0 } else { a }
}

/// Signed shortest rotation from `from` to `to`, in `(-180, 180]` degrees.
/// Positive means counter-clockwise (increasing angle).
#[inline]
pub fn shortest_turn_deg(from: f32, to: f32) -> f32 {
    let mut diff = normalize_deg(to) - normalize_deg(from);
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff <= -180.0 {
        diff += 360.0;
    }
    diff
}
