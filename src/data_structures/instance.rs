//! Node transforms and their GPU representation.
//!
//! Every scene node carries a local and a world [`Instance`]. World
//! transforms are built by composing a parent's world instance with the
//! child's local one (`parent * local`). The packed [`InstanceRaw`] is what
//! ends up in the per-mesh instance buffer.

use std::ops::Mul;

use cgmath::{EuclideanSpace, One, Rad, Rotation, Rotation3};

use crate::data_structures::model;

/// Euler angles applied in three.js' default `XYZ` order, i.e. the rotation
/// matrix is `Rx * Ry * Rz`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Euler {
    pub x: Rad<f32>,
    pub y: Rad<f32>,
    pub z: Rad<f32>,
}

impl Euler {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: Rad(x),
            y: Rad(y),
            z: Rad(z),
        }
    }

    pub fn to_quaternion(self) -> cgmath::Quaternion<f32> {
        cgmath::Quaternion::from_angle_x(self.x)
            * cgmath::Quaternion::from_angle_y(self.y)
            * cgmath::Quaternion::from_angle_z(self.z)
    }
}

impl Default for Euler {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Position, rotation (as quaternion) and scale of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_position_euler(position: cgmath::Vector3<f32>, euler: Euler) -> Self {
        Self {
            position,
            rotation: euler.to_quaternion(),
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: cgmath::Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Maps a point from this instance's local space into its parent space.
    pub fn transform_point(&self, point: cgmath::Point3<f32>) -> cgmath::Point3<f32> {
        let scaled = cgmath::Vector3::new(
            point.x * self.scale.x,
            point.y * self.scale.y,
            point.z * self.scale.z,
        );
        cgmath::Point3::from_vec(self.position + self.rotation.rotate_vector(scaled))
    }

    pub fn to_raw(&self, color: [f32; 4]) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            color,
        }
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let new_rotation = self.rotation * rhs.rotation;

        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let new_position = self.position + (self.rotation * scaled_rhs_pos);

        Instance {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Self;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU: the world matrix of
 * the node plus the linear RGBA colour of its material.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

/**
 * offset: zero as we want to use the full space.
 * stride: length of one instance
 *
 * Stride layout here: world matrix as four vec4 columns followed by the colour.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Shaders only advance to the next element once a new instance starts
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use approx::assert_relative_eq;
    use cgmath::{Point3, Vector3};

    use super::*;

    #[test]
    fn euler_matches_xyz_order() {
        // -90° around X maps local +Y onto world -Z
        let q = Euler::new(-FRAC_PI_2, 0.0, 0.0).to_quaternion();
        let v = q.rotate_vector(Vector3::unit_y());
        assert_relative_eq!(v, -Vector3::unit_z(), epsilon = 1e-6);
        // and the plane normal (+Z) onto world +Y
        let n = q.rotate_vector(Vector3::unit_z());
        assert_relative_eq!(n, Vector3::unit_y(), epsilon = 1e-6);
    }

    #[test]
    fn composition_applies_parent_translation() {
        let parent = Instance::from(Vector3::new(1.0, 2.0, 3.0));
        let child = Instance::from(Vector3::new(0.0, 2.0, 0.0));
        let world = &parent * &child;
        assert_relative_eq!(world.position, Vector3::new(1.0, 4.0, 3.0));
    }

    #[test]
    fn composition_rotates_child_offset() {
        let parent = Instance::from_position_euler(
            Vector3::new(0.0, 0.0, 0.0),
            Euler::new(0.0, FRAC_PI_2, 0.0),
        );
        let child = Instance::from(Vector3::new(1.0, 0.0, 0.0));
        let world = parent * child;
        assert_relative_eq!(world.position, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn transform_point_matches_matrix() {
        let instance = Instance::from_position_euler(
            Vector3::new(3.0, 1.0, -2.0),
            Euler::new(0.3, -0.7, 1.1),
        )
        .with_scale(Vector3::new(2.0, 0.5, 1.0));
        let p = Point3::new(0.25, -1.0, 4.0);
        let via_matrix = Point3::from_homogeneous(instance.to_matrix() * p.to_homogeneous());
        assert_relative_eq!(instance.transform_point(p), via_matrix, epsilon = 1e-5);
    }
}
