//! Spatial types

use glam::{Mat4, Vec3};

/// Scale, Euler rotation (radians) and translation of an object.
///
/// Rotation is applied about X first, then Y, then Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub scale: Vec3,
    pub rotate: Vec3,
    pub translate: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        scale: Vec3::ONE,
        rotate: Vec3::ZERO,
        translate: Vec3::ZERO,
    };

    pub const fn new(scale: Vec3, rotate: Vec3, translate: Vec3) -> Self {
        Self {
            scale,
            rotate,
            translate,
        }
    }

    pub fn from_translation(translate: Vec3) -> Self {
        Self {
            translate,
            ..Self::IDENTITY
        }
    }

    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_rotation_z(self.rotate.z)
            * Mat4::from_rotation_y(self.rotate.y)
            * Mat4::from_rotation_x(self.rotate.x)
    }

    /// Affine matrix: scale, then rotate, then translate.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translate)
            * self.rotation_matrix()
            * Mat4::from_scale(self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn identity_matrix() {
        assert_eq!(Transform::IDENTITY.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn translation_lands_in_last_column() {
        let t = Transform::new(
            Vec3::splat(2.0),
            Vec3::new(0.3, 1.2, -0.4),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let m = t.to_matrix();
        assert_eq!(m.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn rotation_applies_x_before_y() {
        let half_pi = std::f32::consts::FRAC_PI_2;
        let t = Transform::new(Vec3::ONE, Vec3::new(half_pi, half_pi, 0.0), Vec3::ZERO);
        // X takes +Y to +Z, then Y takes +Z to +X.
        let v = t.to_matrix().transform_vector3(Vec3::Y);
        assert!(approx(v, Vec3::X), "got {v:?}");
    }

    #[test]
    fn scale_is_applied_before_translation() {
        let t = Transform::new(Vec3::splat(3.0), Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let p = t.to_matrix().transform_point3(Vec3::new(1.0, 1.0, 1.0));
        assert!(approx(p, Vec3::new(4.0, 3.0, 3.0)));
    }
}
