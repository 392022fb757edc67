use serde::{Deserialize, Serialize};

/// A 3D vector, used for positions, rotations (degrees unless noted),
/// scales and raw 0–255 color triples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    /// Convert each component from degrees to radians.
    pub fn to_radians(self) -> Self {
        Self::new(self.x.to_radians(), self.y.to_radians(), self.z.to_radians())
    }

    /// Apply `f` to every component.
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.x), f(self.y), f(self.z))
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_add() {
        let moved = Vec3::new(1.0, 2.0, 3.0) + Vec3::new(0.5, -2.0, 0.0);
        assert_eq!(moved, Vec3::new(1.5, 0.0, 3.0));
    }

    #[test]
    fn test_vec3_to_radians() {
        let r = Vec3::new(180.0, 90.0, 0.0).to_radians();
        assert!((r.x - std::f64::consts::PI).abs() < 1e-9);
        assert!((r.y - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(r.z, 0.0);
    }

    #[test]
    fn test_vec3_display_matches_attribute_syntax() {
        assert_eq!(Vec3::new(-0.5, 1.0, 1.0).to_string(), "-0.5 1 1");
    }
}
