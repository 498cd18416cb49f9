//! Common ECS components
//!
//! [`Transform`] is the spatial value type shared by local and world poses.
//! Its matrix is a cache: setters only touch translation, rotation and scale,
//! and [`Transform::update`] rebuilds the matrix from them.

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Translation, rotation and scale with a cached homogeneous matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransformDesc", into = "TransformDesc")]
pub struct Transform {
    /// Translation relative to the parent (or world origin for roots)
    translation: Vec3,
    /// Orientation
    rotation: Quat,
    /// Per-axis scale factor
    scale: Vec3,
    /// Cached `T * R * S` matrix
    matrix: Mat4,
    /// Cached matrix for transforming surface normals
    normal_matrix: Mat4,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        matrix: Mat4::IDENTITY,
        normal_matrix: Mat4::IDENTITY,
    };

    /// Create a new transform at the origin
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a translation
    #[must_use]
    pub fn from_translation(translation: impl Into<Vec3>) -> Self {
        Self::from_parts(translation.into(), Quat::IDENTITY, Vec3::ONE)
    }

    /// Create from translation, rotation and scale. The matrix is computed eagerly.
    #[must_use]
    pub fn from_parts(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut transform = Self {
            translation,
            rotation,
            scale,
            ..Self::IDENTITY
        };
        transform.update();
        transform.update_normal_matrix();
        transform
    }

    /// Builder-style translation override
    #[must_use]
    pub fn with_translation(mut self, translation: impl Into<Vec3>) -> Self {
        self.set_translation(translation);
        self.update();
        self
    }

    /// Builder-style rotation override
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.set_rotation(rotation);
        self.update();
        self
    }

    /// Builder-style scale override
    #[must_use]
    pub fn with_scale(mut self, scale: impl Into<Vec3>) -> Self {
        self.set_scale(scale);
        self.update();
        self
    }

    // -------------------------------------------------------------------------
    // Getters
    // -------------------------------------------------------------------------

    #[must_use]
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    #[must_use]
    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[must_use]
    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// The cached matrix, valid as of the last [`update`](Self::update).
    #[must_use]
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// The cached normal matrix, valid as of the last
    /// [`update_normal_matrix`](Self::update_normal_matrix).
    #[must_use]
    #[inline]
    pub fn normal_matrix(&self) -> Mat4 {
        self.normal_matrix
    }

    /// Whether all three scale components are exactly equal.
    #[must_use]
    pub fn has_uniform_scale(&self) -> bool {
        self.scale.x == self.scale.y && self.scale.x == self.scale.z
    }

    // -------------------------------------------------------------------------
    // Setters (cached matrix is stale until `update`)
    // -------------------------------------------------------------------------

    pub fn set_translation(&mut self, translation: impl Into<Vec3>) {
        self.translation = translation.into();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    /// Set the rotation from XYZ Euler angles (radians).
    pub fn set_rotation_euler(&mut self, angles: impl Into<Vec3>) {
        let angles = angles.into();
        self.rotation = Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z);
    }

    pub fn set_scale(&mut self, scale: impl Into<Vec3>) {
        self.scale = scale.into();
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = Vec3::splat(scale);
    }

    /// Translate by a delta.
    pub fn add_translation(&mut self, delta: impl Into<Vec3>) {
        self.translation += delta.into();
    }

    /// Add XYZ Euler angles (radians) to the current orientation.
    pub fn add_rotation(&mut self, delta: impl Into<Vec3>) {
        let delta = delta.into();
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        self.rotation = Quat::from_euler(EulerRot::XYZ, x + delta.x, y + delta.y, z + delta.z);
    }

    /// Orient so that `forward()` points from `eye` towards `target`.
    ///
    /// Returns `false` and leaves the rotation untouched when the direction is
    /// degenerate (zero length or parallel to `up`).
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) -> bool {
        let direction = target - eye;
        if direction.length_squared() <= f32::EPSILON
            || direction.normalize().cross(up).length_squared() <= f32::EPSILON
        {
            return false;
        }
        self.rotation = Quat::from_mat4(&Mat4::look_at_rh(eye, target, up))
            .inverse()
            .normalize();
        true
    }

    // -------------------------------------------------------------------------
    // Derived state
    // -------------------------------------------------------------------------

    /// Rebuild the cached matrix from translation, rotation and scale.
    pub fn update(&mut self) {
        self.matrix =
            Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation);
    }

    /// Rebuild the normal matrix from the cached matrix.
    ///
    /// Under uniform scale the matrix itself is used; otherwise the inverse
    /// transpose.
    pub fn update_normal_matrix(&mut self) {
        self.normal_matrix = if self.has_uniform_scale() {
            self.matrix
        } else {
            self.matrix.inverse().transpose()
        };
    }

    /// Compose a parent's world transform with a child's local transform.
    ///
    /// Both inputs must have current matrices, and the result's matrix is
    /// their exact product. Under a non-uniformly scaled parent translation,
    /// rotation and scale are read back from that product. The normal matrix
    /// of the result is left equal to its matrix.
    #[must_use]
    pub fn compose(parent: &Transform, local: &Transform) -> Transform {
        let matrix = parent.matrix * local.matrix;
        if !parent.has_uniform_scale() {
            return Self::from_matrix(matrix);
        }
        Transform {
            translation: parent.matrix.transform_point3(local.translation),
            rotation: (parent.rotation * local.rotation).normalize(),
            scale: parent.scale * local.scale,
            matrix,
            normal_matrix: matrix,
        }
    }

    /// Decompose an affine matrix, keeping it as the cached matrix.
    ///
    /// Shear cannot be represented, so for a sheared matrix the parts only
    /// approximate it.
    #[must_use]
    pub fn from_matrix(matrix: Mat4) -> Transform {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Transform {
            translation,
            rotation: rotation.normalize(),
            scale,
            matrix,
            normal_matrix: matrix,
        }
    }

    /// The inverse transform, or `None` when the matrix is singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Transform> {
        let det = self.matrix.determinant();
        if !det.is_finite() || det == 0.0 {
            return None;
        }
        let matrix = self.matrix.inverse();
        if !matrix.is_finite() {
            return None;
        }
        let mut inverse = if self.has_uniform_scale() {
            Transform {
                translation: matrix.w_axis.truncate(),
                rotation: self.rotation.inverse(),
                scale: self.scale.recip(),
                matrix,
                normal_matrix: matrix,
            }
        } else {
            Self::from_matrix(matrix)
        };
        inverse.update_normal_matrix();
        Some(inverse)
    }

    /// Transform a point by the cached matrix
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.matrix.transform_point3(point)
    }

    /// Transform a direction by the cached matrix (ignores translation)
    #[must_use]
    pub fn transform_direction(&self, direction: Vec3) -> Vec3 {
        self.matrix.transform_vector3(direction)
    }

    /// Get the forward direction (negative Z in local space)
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the right direction (positive X in local space)
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get the up direction (positive Y in local space)
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Serialized form of a [`Transform`]: the cached matrices are rebuilt on load.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
struct TransformDesc {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl Default for TransformDesc {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl From<TransformDesc> for Transform {
    fn from(desc: TransformDesc) -> Self {
        Self::from_parts(desc.translation, desc.rotation, desc.scale)
    }
}

impl From<Transform> for TransformDesc {
    fn from(t: Transform) -> Self {
        Self {
            translation: t.translation,
            rotation: t.rotation,
            scale: t.scale,
        }
    }
}

/// Name component for debugging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_transform_default_is_identity() {
        let t = Transform::new();
        assert_eq!(t.translation(), Vec3::ZERO);
        assert_eq!(t.rotation(), Quat::IDENTITY);
        assert_eq!(t.scale(), Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_setters_accept_flexible_shapes() {
        let mut t = Transform::new();
        t.set_translation((1.0, 2.0, 3.0));
        assert_eq!(t.translation(), Vec3::new(1.0, 2.0, 3.0));
        t.set_translation([4.0, 5.0, 6.0]);
        assert_eq!(t.translation(), Vec3::new(4.0, 5.0, 6.0));
        t.add_translation(Vec3::X);
        assert_eq!(t.translation(), Vec3::new(5.0, 5.0, 6.0));
        t.set_scale([2.0, 2.0, 2.0]);
        assert!(t.has_uniform_scale());
    }

    #[test]
    fn test_update_recomposes_matrix() {
        let mut t = Transform::new();
        t.set_translation((1.0, 2.0, 3.0));
        // Stale until update
        assert_eq!(t.matrix(), Mat4::IDENTITY);
        t.update();
        assert_eq!(t.matrix().w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));

        let before = t.matrix();
        t.update();
        assert_eq!(before, t.matrix());
    }

    #[test]
    fn test_compose_translations() {
        let parent = Transform::from_translation((1.0, 0.0, 0.0));
        let local = Transform::from_translation((0.0, 1.0, 0.0));
        let world = Transform::compose(&parent, &local);
        assert!(world.translation().abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), EPS));
        assert!(
            world
                .matrix()
                .w_axis
                .truncate()
                .abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), EPS)
        );
    }

    #[test]
    fn test_compose_keeps_uniform_scale_exact() {
        let parent = Transform::from_parts(
            Vec3::ZERO,
            Quat::from_rotation_y(0.7),
            Vec3::splat(2.0),
        );
        let local = Transform::from_parts(Vec3::X, Quat::IDENTITY, Vec3::splat(3.0));
        let world = Transform::compose(&parent, &local);
        assert_eq!(world.scale(), Vec3::splat(6.0));
        assert!(world.has_uniform_scale());
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = Transform::from_parts(
            Vec3::new(3.0, -1.0, 2.0),
            Quat::from_rotation_z(0.5),
            Vec3::new(2.0, 1.0, 0.5),
        );
        let inv = t.inverse().unwrap();
        let product = t.matrix() * inv.matrix();
        assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn test_inverse_of_singular_is_none() {
        let t = Transform::from_parts(Vec3::ONE, Quat::IDENTITY, Vec3::new(1.0, 0.0, 1.0));
        assert!(t.inverse().is_none());
    }

    #[test]
    fn test_inverse_of_tiny_uniform_scale() {
        let t = Transform::from_parts(Vec3::ZERO, Quat::IDENTITY, Vec3::splat(1e-5));
        let inv = t.inverse().unwrap();
        assert!((inv.scale() - Vec3::splat(1e5)).abs().max_element() < 1.0);
        let origin = inv.transform_point(t.transform_point(Vec3::new(2.0, 0.0, 0.0)));
        assert!(origin.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-2));
    }

    #[test]
    fn test_compose_under_rotated_non_uniform_parent() {
        let parent = Transform::from_parts(
            Vec3::ZERO,
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::new(2.0, 1.0, 1.0),
        );
        let local = Transform::from_parts(
            Vec3::X,
            Quat::from_rotation_z(-std::f32::consts::FRAC_PI_2),
            Vec3::ONE,
        );
        let mut world = Transform::compose(&parent, &local);
        let exact = world.matrix();
        world.update();
        assert!(world.matrix().abs_diff_eq(exact, EPS));
        assert!(world.scale().abs_diff_eq(Vec3::new(1.0, 2.0, 1.0), EPS));
    }

    #[test]
    fn test_inverse_of_rotated_non_uniform_matches_matrix() {
        let t = Transform::from_parts(
            Vec3::new(1.0, 2.0, 0.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::new(2.0, 1.0, 1.0),
        );
        let inv = t.inverse().unwrap();
        let child = Transform::IDENTITY;
        let mut local = Transform::compose(&inv, &child);
        local.update();
        let rebuilt = Transform::compose(&t, &local);
        assert!(rebuilt.matrix().abs_diff_eq(Mat4::IDENTITY, EPS));
    }

    #[test]
    fn test_normal_matrix_branches() {
        let mut uniform =
            Transform::from_parts(Vec3::ONE, Quat::from_rotation_x(0.3), Vec3::splat(2.0));
        uniform.update_normal_matrix();
        assert_eq!(uniform.normal_matrix(), uniform.matrix());

        let mut skewed =
            Transform::from_parts(Vec3::ONE, Quat::from_rotation_x(0.3), Vec3::new(1.0, 2.0, 3.0));
        skewed.update_normal_matrix();
        let expected = skewed.matrix().inverse().transpose();
        assert_eq!(skewed.normal_matrix(), expected);
    }

    #[test]
    fn test_look_at_points_forward_at_target() {
        let mut t = Transform::new();
        let eye = Vec3::new(0.0, 0.0, 5.0);
        assert!(t.look_at(eye, Vec3::ZERO, Vec3::Y));
        assert!(t.forward().abs_diff_eq(Vec3::NEG_Z, EPS));

        assert!(t.look_at(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::Y));
        assert!(t.forward().abs_diff_eq(Vec3::X, EPS));
    }

    #[test]
    fn test_look_at_degenerate_is_ignored() {
        let mut t = Transform::new();
        t.set_rotation(Quat::from_rotation_y(1.0));
        let before = t.rotation();
        assert!(!t.look_at(Vec3::ONE, Vec3::ONE, Vec3::Y));
        assert!(!t.look_at(Vec3::ZERO, Vec3::Y * 3.0, Vec3::Y));
        assert_eq!(t.rotation(), before);
    }

    #[test]
    fn test_add_rotation_accumulates() {
        let mut t = Transform::new();
        t.add_rotation((0.0, 0.25, 0.0));
        t.add_rotation((0.0, 0.25, 0.0));
        let expected = Quat::from_rotation_y(0.5);
        let rotation = t.rotation();
        assert!(rotation.abs_diff_eq(expected, EPS) || rotation.abs_diff_eq(-expected, EPS));
    }

    #[test]
    fn test_serde_rebuilds_matrix() {
        let t = Transform::from_translation((1.0, 2.0, 3.0)).with_scale([2.0, 2.0, 2.0]);
        let json = serde_json::to_string(&t).unwrap();
        let loaded: Transform = serde_json::from_str(&json).unwrap();
        assert!(loaded.matrix().abs_diff_eq(t.matrix(), EPS));
    }
}
