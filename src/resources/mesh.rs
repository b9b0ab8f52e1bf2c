use wgpu::util::DeviceExt;

use crate::{data_structures::instance::InstanceRaw, resources::geometry::Geometry};

/// GPU-resident copy of a [`Geometry`] with its own single-instance buffer.
///
/// The buffers are tied to the device that created them; they are dropped
/// together with the scene that owns the mesh.
#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub instance_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, name: &str, geometry: &Geometry, instance: InstanceRaw) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Instance Buffer", name)),
            contents: bytemuck::cast_slice(&[instance]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            instance_buffer,
            num_elements: geometry.indices.len() as u32,
        }
    }

    pub fn write_instance(&self, queue: &wgpu::Queue, instance: InstanceRaw) {
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&[instance]));
    }
}
