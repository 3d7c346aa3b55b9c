//! Parent-relative transforms.
//!
//! A [`Transform`] stores a local position, an Euler rotation (radians) and a
//! non-uniform scale, plus the world matrix of whatever it is attached to.
//! Composing them yields the model matrix that ends up in the entity's
//! uniform buffer.

use cgmath::{Matrix4, Rad, SquareMatrix, Vector3};

/// Local placement of an entity relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    /// Euler angles in radians, composed as `Ry * Rx * Rz`.
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
    /// World matrix of the parent. Identity for root entities.
    pub parent: Matrix4<f32>,
}

impl Transform {
    /// Identity transform: no move, no rotation, unit scale, no parent.
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            parent: Matrix4::identity(),
        }
    }

    pub fn with_position(mut self, position: impl Into<Vector3<f32>>) -> Self {
        self.position = position.into();
        self
    }

    pub fn with_rotation(mut self, rotation: impl Into<Vector3<f32>>) -> Self {
        self.rotation = rotation.into();
        self
    }

    pub fn with_scale(mut self, scale: impl Into<Vector3<f32>>) -> Self {
        self.scale = scale.into();
        self
    }

    pub fn with_parent(mut self, parent: Matrix4<f32>) -> Self {
        self.parent = parent;
        self
    }

    /// Composes the world matrix.
    ///
    /// The order is `parent * T * Ry * Rx * Rz * S`, so scale is applied to a
    /// vertex first and the parent last.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.parent
            * Matrix4::from_translation(self.position)
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// World space position, read from the translation column of the model matrix.
    pub fn world_position(&self) -> Vector3<f32> {
        self.model_matrix().w.truncate()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use cgmath::{Matrix4, Rad, SquareMatrix, Vector3, Vector4};

    use super::Transform;

    fn assert_mat_eq(actual: Matrix4<f32>, expected: Matrix4<f32>) {
        let a: [[f32; 4]; 4] = actual.into();
        let e: [[f32; 4]; 4] = expected.into();
        for c in 0..4 {
            for r in 0..4 {
                assert!(
                    (a[c][r] - e[c][r]).abs() < 1e-5,
                    "mismatch at column {c}, row {r}: {} != {}",
                    a[c][r],
                    e[c][r]
                );
            }
        }
    }

    fn assert_vec_eq(actual: Vector3<f32>, expected: Vector3<f32>) {
        assert!(
            (actual.x - expected.x).abs() < 1e-5
                && (actual.y - expected.y).abs() < 1e-5
                && (actual.z - expected.z).abs() < 1e-5,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn default_is_identity() {
        assert_mat_eq(Transform::default().model_matrix(), Matrix4::identity());
    }

    #[test]
    fn composes_translate_rotate_yxz_then_scale() {
        let transform = Transform::new()
            .with_position([1.0, 2.0, 3.0])
            .with_rotation([0.3, 0.7, -0.4])
            .with_scale([2.0, 0.5, 1.5]);
        let expected = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0))
            * Matrix4::from_angle_y(Rad(0.7))
            * Matrix4::from_angle_x(Rad(0.3))
            * Matrix4::from_angle_z(Rad(-0.4))
            * Matrix4::from_nonuniform_scale(2.0, 0.5, 1.5);
        assert_mat_eq(transform.model_matrix(), expected);
    }

    #[test]
    fn rotation_order_matters() {
        let transform = Transform::new().with_rotation([FRAC_PI_2, FRAC_PI_2, 0.0]);
        // X is applied to the vertex before Y: +Z goes to -Y and stays there.
        // The reverse order would end up on +X.
        let z = transform.model_matrix() * Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert_vec_eq(z.truncate(), Vector3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn scale_applies_before_translation() {
        let transform = Transform::new()
            .with_position([10.0, 0.0, 0.0])
            .with_scale([3.0, 3.0, 3.0]);
        let p = transform.model_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_vec_eq(p.truncate(), Vector3::new(13.0, 0.0, 0.0));
    }

    #[test]
    fn parent_is_applied_last() {
        let parent = Transform::new()
            .with_position([0.0, 5.0, 0.0])
            .with_rotation([0.0, FRAC_PI_2, 0.0]);
        let child = Transform::new()
            .with_position([1.0, 0.0, 0.0])
            .with_parent(parent.model_matrix());
        assert_mat_eq(
            child.model_matrix(),
            parent.model_matrix() * Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0)),
        );
        // +X turned a quarter around Y points to -Z.
        assert_vec_eq(child.world_position(), Vector3::new(0.0, 5.0, -1.0));
    }

    #[test]
    fn world_position_ignores_own_rotation_and_scale() {
        let transform = Transform::new()
            .with_position([-2.0, 4.0, 8.0])
            .with_rotation([1.0, 2.0, 3.0])
            .with_scale([7.0, 7.0, 7.0]);
        assert_vec_eq(transform.world_position(), Vector3::new(-2.0, 4.0, 8.0));
    }

    #[test]
    fn from_position() {
        let transform = Transform::from(Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(transform.scale, Vector3::new(1.0, 1.0, 1.0));
        assert_vec_eq(transform.world_position(), Vector3::new(1.0, 1.0, 1.0));
    }
}
