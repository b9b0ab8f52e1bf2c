//! Procedural primitive meshes.
//!
//! All primitives are centred on their local origin and use the same
//! conventions as the three.js geometries they replace: planes lie in the
//! local XY plane facing +Z, cylinders span `-h/2..h/2` along Y and spheres
//! are UV spheres. Triangles wind counter-clockwise when seen from outside.

use std::f32::consts::{PI, TAU};

use cgmath::{ElementWise, InnerSpace, Vector3};

use crate::data_structures::model::ModelVertex;

/// Which primitive a [`Geometry`] was built from, with its parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    Plane {
        width: f32,
        height: f32,
    },
    Cuboid {
        width: f32,
        height: f32,
        depth: f32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub primitive: Primitive,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// three.js uses 32 radial segments for cylinders by default
    pub const DEFAULT_RADIAL_SEGMENTS: u32 = 32;

    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        let normal = [0.0, 0.0, 1.0];
        let vertices = vec![
            ModelVertex { position: [-hw, hh, 0.0], normal },
            ModelVertex { position: [hw, hh, 0.0], normal },
            ModelVertex { position: [-hw, -hh, 0.0], normal },
            ModelVertex { position: [hw, -hh, 0.0], normal },
        ];
        Self {
            primitive: Primitive::Plane { width, height },
            vertices,
            indices: vec![0, 2, 1, 2, 3, 1],
        }
    }

    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vector3::new(width, height, depth) / 2.0;
        // (normal, u, v) with u x v == normal
        let faces = [
            (Vector3::unit_x(), -Vector3::unit_z(), Vector3::unit_y()),
            (-Vector3::unit_x(), Vector3::unit_z(), Vector3::unit_y()),
            (Vector3::unit_y(), Vector3::unit_x(), -Vector3::unit_z()),
            (-Vector3::unit_y(), Vector3::unit_x(), Vector3::unit_z()),
            (Vector3::unit_z(), Vector3::unit_x(), Vector3::unit_y()),
            (-Vector3::unit_z(), -Vector3::unit_x(), Vector3::unit_y()),
        ];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let centre = normal.mul_element_wise(half);
            let u = u.mul_element_wise(half);
            let v = v.mul_element_wise(half);
            let base = vertices.len() as u32;
            for corner in [centre - u - v, centre + u - v, centre + u + v, centre - u + v] {
                vertices.push(ModelVertex {
                    position: corner.into(),
                    normal: normal.into(),
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self {
            primitive: Primitive::Cuboid {
                width,
                height,
                depth,
            },
            vertices,
            indices,
        }
    }

    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let mut vertices = Vec::new();
        let mut grid = Vec::with_capacity(height_segments as usize + 1);

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let mut row = Vec::with_capacity(width_segments as usize + 1);
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let position = Vector3::new(
                    -radius * (u * TAU).cos() * (v * PI).sin(),
                    radius * (v * PI).cos(),
                    radius * (u * TAU).sin() * (v * PI).sin(),
                );
                let normal = if position.magnitude2() > 0.0 {
                    position.normalize()
                } else {
                    Vector3::unit_y()
                };
                row.push(vertices.len() as u32);
                vertices.push(ModelVertex {
                    position: position.into(),
                    normal: normal.into(),
                });
            }
            grid.push(row);
        }

        let mut indices = Vec::new();
        for iy in 0..height_segments as usize {
            for ix in 0..width_segments as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];
                // the poles collapse into single triangles
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments as usize - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self {
            primitive: Primitive::Sphere {
                radius,
                width_segments,
                height_segments,
            },
            vertices,
            indices,
        }
    }

    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Self {
        let radial_segments = radial_segments.max(3);
        let half_height = height / 2.0;
        let slope = if height != 0.0 {
            (radius_bottom - radius_top) / height
        } else {
            0.0
        };
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Torso: two rings, top (y = +h/2) and bottom (y = -h/2)
        let ring = |radius: f32, y: f32, vertices: &mut Vec<ModelVertex>| {
            let start = vertices.len() as u32;
            for x in 0..=radial_segments {
                let theta = x as f32 / radial_segments as f32 * TAU;
                let (sin, cos) = theta.sin_cos();
                vertices.push(ModelVertex {
                    position: [radius * sin, y, radius * cos],
                    normal: Vector3::new(sin, slope, cos).normalize().into(),
                });
            }
            start
        };
        let top = ring(radius_top, half_height, &mut vertices);
        let bottom = ring(radius_bottom, -half_height, &mut vertices);
        for x in 0..radial_segments {
            let a = top + x;
            let b = bottom + x;
            let c = bottom + x + 1;
            let d = top + x + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }

        for (radius, sign) in [(radius_top, 1.0_f32), (radius_bottom, -1.0)] {
            if radius <= 0.0 {
                continue;
            }
            let y = half_height * sign;
            let normal = [0.0, sign, 0.0];
            let centre = vertices.len() as u32;
            vertices.push(ModelVertex {
                position: [0.0, y, 0.0],
                normal,
            });
            let rim = vertices.len() as u32;
            for x in 0..=radial_segments {
                let theta = x as f32 / radial_segments as f32 * TAU;
                let (sin, cos) = theta.sin_cos();
                vertices.push(ModelVertex {
                    position: [radius * sin, y, radius * cos],
                    normal,
                });
            }
            for x in 0..radial_segments {
                let i = rim + x;
                if sign > 0.0 {
                    indices.extend_from_slice(&[i, i + 1, centre]);
                } else {
                    indices.extend_from_slice(&[i + 1, i, centre]);
                }
            }
        }

        Self {
            primitive: Primitive::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            },
            vertices,
            indices,
        }
    }

    /// Axis-aligned bounds of the local-space vertices as `(min, max)`.
    pub fn bounds(&self) -> (Vector3<f32>, Vector3<f32>) {
        let mut min = Vector3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
        let mut max = Vector3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
        for v in &self.vertices {
            let p = Vector3::from(v.position);
            min = Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::InnerSpace;

    use super::*;

    /// Every triangle's geometric normal should point the same way as the
    /// vertex normals, i.e. outwards.
    fn assert_outward_winding(geometry: &Geometry) {
        for tri in geometry.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| geometry.vertices[i as usize]);
            let pa = Vector3::from(a.position);
            let face = (Vector3::from(b.position) - pa).cross(Vector3::from(c.position) - pa);
            if face.magnitude2() < 1e-12 {
                continue;
            }
            let avg = Vector3::from(a.normal) + Vector3::from(b.normal) + Vector3::from(c.normal);
            assert!(face.dot(avg) > 0.0, "triangle {:?} winds inwards", tri);
        }
    }

    #[test]
    fn plane_spans_width_and_height() {
        let plane = Geometry::plane(5.0, 40.0);
        let (min, max) = plane.bounds();
        assert_relative_eq!(min, Vector3::new(-2.5, -20.0, 0.0));
        assert_relative_eq!(max, Vector3::new(2.5, 20.0, 0.0));
        assert_eq!(plane.indices.len(), 6);
        assert_outward_winding(&plane);
    }

    #[test]
    fn cuboid_has_six_faces() {
        let cuboid = Geometry::cuboid(6.0, 3.0, 7.0);
        assert_eq!(cuboid.vertices.len(), 24);
        assert_eq!(cuboid.indices.len(), 36);
        let (min, max) = cuboid.bounds();
        assert_relative_eq!(min, Vector3::new(-3.0, -1.5, -3.5));
        assert_relative_eq!(max, Vector3::new(3.0, 1.5, 3.5));
        assert_outward_winding(&cuboid);
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let sphere = Geometry::sphere(0.5, 32, 32);
        for v in &sphere.vertices {
            assert_relative_eq!(Vector3::from(v.position).magnitude(), 0.5, epsilon = 1e-5);
        }
        assert!(sphere.indices.iter().all(|&i| (i as usize) < sphere.vertices.len()));
        assert_outward_winding(&sphere);
    }

    #[test]
    fn cylinder_is_centred_on_y() {
        let cylinder = Geometry::cylinder(0.1, 0.1, 1.5, Geometry::DEFAULT_RADIAL_SEGMENTS);
        let (min, max) = cylinder.bounds();
        assert_relative_eq!(min.y, -0.75);
        assert_relative_eq!(max.y, 0.75);
        assert_relative_eq!(max.x, 0.1, epsilon = 1e-5);
        assert_relative_eq!(min.z, -0.1, epsilon = 1e-5);
        assert_outward_winding(&cylinder);
    }

    #[test]
    fn cone_skips_the_degenerate_cap() {
        let cone = Geometry::cylinder(0.0, 1.0, 2.0, 8);
        let closed = Geometry::cylinder(1.0, 1.0, 2.0, 8);
        assert!(cone.vertices.len() < closed.vertices.len());
    }
}
