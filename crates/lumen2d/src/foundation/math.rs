//! Math utilities and types
//!
//! Provides the fundamental 2D math types for the engine. All spatial
//! values are expressed in world units; matrices are 3x3 homogeneous.

pub use nalgebra::{Matrix3, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3x3 matrix type for homogeneous 2D transforms
pub type Mat3 = Matrix3<f32>;

/// Transform representing 2D position, scale, and rotation
///
/// Pure value type. Composes into a world matrix in scale -> rotate ->
/// translate order. Note that decomposing a matrix back into a
/// `Transform` does not recover rotation; see
/// [`Transform::from_matrix_without_rotation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in world units
    pub position: Vec2,

    /// Scale factors
    pub scale: Vec2,

    /// Rotation in radians, counter-clockwise
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform from position and scale with no rotation
    pub fn new(position: Vec2, scale: Vec2) -> Self {
        Self {
            position,
            scale,
            rotation: 0.0,
        }
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix (scale, then rotate, then translate)
    pub fn to_matrix(&self) -> Mat3 {
        Mat3::new_translation(&self.position)
            * Mat3::new_rotation(self.rotation)
            * Mat3::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose a transformation matrix into position and scale
    ///
    /// Rotation is not recovered and defaults to zero; components that
    /// rotate track their own angle rather than reading it back from the
    /// matrix. Position and scale round-trip exactly for matrices built
    /// by [`Transform::to_matrix`].
    pub fn from_matrix_without_rotation(matrix: &Mat3) -> Self {
        let position = Vec2::new(matrix.m13, matrix.m23);

        let scale_x = Vec2::new(matrix.m11, matrix.m21).magnitude();
        let scale_y = Vec2::new(matrix.m12, matrix.m22).magnitude();

        // A negative determinant means the basis is mirrored; fold the
        // flip into the X scale so scale round-trips for unrotated
        // matrices.
        let det = matrix.m11 * matrix.m22 - matrix.m12 * matrix.m21;
        let scale_x = if det < 0.0 { -scale_x } else { scale_x };

        Self {
            position,
            scale: Vec2::new(scale_x, scale_y),
            rotation: 0.0,
        }
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        let transformed = self.to_matrix() * Vector3::new(point.x, point.y, 1.0);
        Vec2::new(transformed.x, transformed.y)
    }
}

/// Transform a point by a homogeneous 2D matrix
pub fn transform_point(matrix: &Mat3, point: Vec2) -> Vec2 {
    let transformed = matrix * Vector3::new(point.x, point.y, 1.0);
    Vec2::new(transformed.x, transformed.y)
}
