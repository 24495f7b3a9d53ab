use glam::{Mat3, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Common math types re-exported for convenience.
pub use glam::{Mat2, Vec2 as Vector2};

/// 2D cross product of two vectors (a scalar in 2D).
#[inline]
pub fn cross_vv(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Cross product of a vector and a scalar: `cross(v, s) = (s·v.y, −s·v.x)`.
#[inline]
pub fn cross_vs(v: Vec2, s: f32) -> Vec2 {
    Vec2::new(s * v.y, -s * v.x)
}

/// Cross product of a scalar and a vector: `cross(s, v) = (−s·v.y, s·v.x)`.
#[inline]
pub fn cross_sv(s: f32, v: Vec2) -> Vec2 {
    Vec2::new(-s * v.y, s * v.x)
}

/// Solves `K·x = b` for a 2×2 system without inverting a singular matrix.
/// Returns zero when K has no inverse, matching how mass inverses collapse
/// to zero for immovable bodies.
#[inline]
pub fn solve22(k: Mat2, b: Vec2) -> Vec2 {
    let a11 = k.x_axis.x;
    let a12 = k.y_axis.x;
    let a21 = k.x_axis.y;
    let a22 = k.y_axis.y;
    let mut det = a11 * a22 - a12 * a21;
    if det.abs() < f32::EPSILON {
        return Vec2::ZERO;
    }
    det = 1.0 / det;
    Vec2::new(det * (a22 * b.x - a12 * b.y), det * (a11 * b.y - a21 * b.x))
}

/// Solves `K·x = b` for a 3×3 system, returning zero on a singular K.
#[inline]
pub fn solve33(k: Mat3, b: Vec3) -> Vec3 {
    let mut det = k.x_axis.dot(k.y_axis.cross(k.z_axis));
    if det.abs() < f32::EPSILON {
        return Vec3::ZERO;
    }
    det = 1.0 / det;
    Vec3::new(
        det * b.dot(k.y_axis.cross(k.z_axis)),
        det * k.x_axis.dot(b.cross(k.z_axis)),
        det * k.x_axis.dot(k.y_axis.cross(b)),
    )
}

/// Inverts only the upper-left 2×2 block of `k`, zeroing the third
/// row/column. Used by soft weld constraints where the angular channel is
/// handled separately.
#[inline]
pub fn inverse22(k: Mat3) -> Mat3 {
    let a = k.x_axis.x;
    let b = k.y_axis.x;
    let c = k.x_axis.y;
    let d = k.y_axis.y;
    let mut det = a * d - b * c;
    if det.abs() < f32::EPSILON {
        return Mat3::ZERO;
    }
    det = 1.0 / det;
    Mat3::from_cols(
        Vec3::new(det * d, -det * c, 0.0),
        Vec3::new(-det * b, det * a, 0.0),
        Vec3::ZERO,
    )
}

/// Inverse of a symmetric 3×3 matrix, returning zero on singular input.
#[inline]
pub fn sym_inverse33(k: Mat3) -> Mat3 {
    let mut det = k.x_axis.dot(k.y_axis.cross(k.z_axis));
    if det.abs() < f32::EPSILON {
        return Mat3::ZERO;
    }
    det = 1.0 / det;

    let a11 = k.x_axis.x;
    let a12 = k.y_axis.x;
    let a13 = k.z_axis.x;
    let a22 = k.y_axis.y;
    let a23 = k.z_axis.y;
    let a33 = k.z_axis.z;

    let ex = Vec3::new(
        det * (a22 * a33 - a23 * a23),
        det * (a13 * a23 - a12 * a33),
        det * (a12 * a23 - a13 * a22),
    );
    let ey = Vec3::new(
        ex.y,
        det * (a11 * a33 - a13 * a13),
        det * (a13 * a12 - a11 * a23),
    );
    let ez = Vec3::new(ex.z, ey.z, det * (a11 * a22 - a12 * a12));
    Mat3::from_cols(ex, ey, ez)
}

/// Solves the upper-left 2×2 block of a 3×3 system.
#[inline]
pub fn solve33_as22(k: Mat3, b: Vec2) -> Vec2 {
    let a11 = k.x_axis.x;
    let a12 = k.y_axis.x;
    let a21 = k.x_axis.y;
    let a22 = k.y_axis.y;
    let mut det = a11 * a22 - a12 * a21;
    if det.abs() < f32::EPSILON {
        return Vec2::ZERO;
    }
    det = 1.0 / det;
    Vec2::new(det * (a22 * b.x - a12 * b.y), det * (a11 * b.y - a21 * b.x))
}

/// Rotation stored as sine/cosine of the angle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rot {
    pub s: f32,
    pub c: f32,
}

impl Default for Rot {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rot {
    pub const IDENTITY: Self = Self { s: 0.0, c: 1.0 };

    pub fn new(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self { s, c }
    }

    pub fn angle(&self) -> f32 {
        self.s.atan2(self.c)
    }

    pub fn x_axis(&self) -> Vec2 {
        Vec2::new(self.c, self.s)
    }

    pub fn y_axis(&self) -> Vec2 {
        Vec2::new(-self.s, self.c)
    }

    /// Rotates a vector.
    #[inline]
    pub fn apply(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x - self.s * v.y, self.s * v.x + self.c * v.y)
    }

    /// Inverse-rotates a vector.
    #[inline]
    pub fn apply_inv(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x + self.s * v.y, -self.s * v.x + self.c * v.y)
    }

    /// Composition `self ∘ other`.
    #[inline]
    pub fn mul(&self, other: Rot) -> Rot {
        Rot {
            s: self.s * other.c + self.c * other.s,
            c: self.c * other.c - self.s * other.s,
        }
    }

    /// Composition `self⁻¹ ∘ other`.
    #[inline]
    pub fn mul_t(&self, other: Rot) -> Rot {
        Rot {
            s: self.c * other.s - self.s * other.c,
            c: self.c * other.c + self.s * other.s,
        }
    }
}

/// Position and orientation of a body frame.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Transform {
    pub p: Vec2,
    pub q: Rot,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        p: Vec2::ZERO,
        q: Rot::IDENTITY,
    };

    pub fn new(position: Vec2, angle: f32) -> Self {
        Self {
            p: position,
            q: Rot::new(angle),
        }
    }

    /// Maps a point from local space to world space.
    #[inline]
    pub fn apply(&self, v: Vec2) -> Vec2 {
        self.q.apply(v) + self.p
    }

    /// Maps a point from world space to local space.
    #[inline]
    pub fn apply_inv(&self, v: Vec2) -> Vec2 {
        self.q.apply_inv(v - self.p)
    }

    /// Composition: `(self ∘ other)(v) = self(other(v))`.
    pub fn mul(&self, other: Transform) -> Transform {
        Transform {
            p: self.q.apply(other.p) + self.p,
            q: self.q.mul(other.q),
        }
    }

    /// Composition with the inverse of `self`, used to express B in A's frame.
    pub fn mul_t(&self, other: Transform) -> Transform {
        Transform {
            p: self.q.apply_inv(other.p - self.p),
            q: self.q.mul_t(other.q),
        }
    }
}

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub linear: Vec2,
    pub angular: f32,
}

/// Center position and angle used as solver scratch state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Position {
    pub c: Vec2,
    pub a: f32,
}

/// Mass, center of mass, and rotational inertia about the local origin.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MassData {
    pub mass: f32,
    pub center: Vec2,
    pub inertia: f32,
}

/// Describes the motion of a body center over a sub-step for continuous
/// collision. `alpha0` is the fraction of the step already consumed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Sweep {
    /// Center of mass in body-local coordinates.
    pub local_center: Vec2,
    pub c0: Vec2,
    pub c: Vec2,
    pub a0: f32,
    pub a: f32,
    pub alpha0: f32,
}

impl Sweep {
    /// Interpolated transform at `beta ∈ [0, 1]` of the remaining sub-step.
    pub fn transform_at(&self, beta: f32) -> Transform {
        let c = (1.0 - beta) * self.c0 + beta * self.c;
        let a = (1.0 - beta) * self.a0 + beta * self.a;
        let q = Rot::new(a);
        Transform {
            p: c - q.apply(self.local_center),
            q,
        }
    }

    /// Advances the starting state to `alpha`, with `alpha0 <= alpha < 1`.
    pub fn advance(&mut self, alpha: f32) {
        debug_assert!(self.alpha0 < 1.0);
        let beta = (alpha - self.alpha0) / (1.0 - self.alpha0);
        self.c0 += beta * (self.c - self.c0);
        self.a0 += beta * (self.a - self.a0);
        self.alpha0 = alpha;
    }

    /// Normalizes the sweep angles into `(−π, π]` to keep the TOI root
    /// finder away from angle wrap-around.
    pub fn normalize(&mut self) {
        let two_pi = 2.0 * PI;
        let d = two_pi * (self.a0 / two_pi).floor();
        self.a0 -= d;
        self.a -= d;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rotation_round_trip() {
        let q = Rot::new(0.7);
        let v = Vec2::new(1.5, -2.0);
        let back = q.apply_inv(q.apply(v));
        assert_relative_eq!(back.x, v.x, epsilon = 1e-6);
        assert_relative_eq!(back.y, v.y, epsilon = 1e-6);
    }

    #[test]
    fn transform_composition_matches_sequential_application() {
        let a = Transform::new(Vec2::new(1.0, 2.0), 0.3);
        let b = Transform::new(Vec2::new(-0.5, 0.25), -1.1);
        let v = Vec2::new(0.4, 0.9);

        let composed = a.mul(b).apply(v);
        let sequential = a.apply(b.apply(v));
        assert_relative_eq!(composed.x, sequential.x, epsilon = 1e-6);
        assert_relative_eq!(composed.y, sequential.y, epsilon = 1e-6);
    }

    #[test]
    fn sweep_interpolates_translation_and_angle() {
        let sweep = Sweep {
            local_center: Vec2::ZERO,
            c0: Vec2::ZERO,
            c: Vec2::new(2.0, 0.0),
            a0: 0.0,
            a: 1.0,
            alpha0: 0.0,
        };

        let xf = sweep.transform_at(0.5);
        assert_relative_eq!(xf.p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(xf.q.angle(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn solve22_rejects_singular_systems() {
        let singular = Mat2::from_cols(Vec2::new(1.0, 2.0), Vec2::new(2.0, 4.0));
        assert_eq!(solve22(singular, Vec2::new(1.0, 1.0)), Vec2::ZERO);

        let k = Mat2::from_cols(Vec2::new(2.0, 0.0), Vec2::new(0.0, 4.0));
        let x = solve22(k, Vec2::new(2.0, 4.0));
        assert_relative_eq!(x.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(x.y, 1.0, epsilon = 1e-6);
    }
}
