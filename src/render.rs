//! Render composition and pipeline batching.
//!
//! A [`GpuScene`] owns the GPU copies of every drawable node of a
//! [`SceneGraph`]: one [`GpuMesh`] per mesh node and one textured billboard
//! per sprite node. Each frame the cached world transforms are written into
//! the per-node instance buffers and the scene hands out a [`Render`]
//! describing what to draw. [`Render`] values are sorted into batches per
//! pipeline, so all meshes are drawn before any (blended) label.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the enum describing render operations
//! - [`Instanced<'a>`] is one mesh with its instance buffer
//! - [`Billboard<'a>`] is one camera-facing label quad

use cgmath::{InnerSpace, Point3};
use wgpu::RenderPass;

use crate::{
    context::Context,
    data_structures::{
        instance::Instance,
        model::DrawMesh,
        scene_graph::{NodeId, NodeKind, SceneError, SceneGraph},
        texture::Texture,
    },
    pipelines::sprite::{self, Quad, SpriteRaw},
    resources::mesh::GpuMesh,
};

/// A mesh and the number of instances in its instance buffer.
pub struct Instanced<'a> {
    pub mesh: &'a GpuMesh,
    pub amount: u32,
}

/// A label quad: where it sits and the texture it shows.
pub struct Billboard<'a> {
    pub instance: &'a wgpu::Buffer,
    pub group: &'a wgpu::BindGroup,
    pub center: Point3<f32>,
}

/// Specifies how scene content should be rendered.
///
/// - `Defaults(Vec<Instanced>)` renders a batch of opaque meshes
/// - `Billboards(Vec<Billboard>)` renders camera-facing labels
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
pub enum Render<'a> {
    Defaults(Vec<Instanced<'a>>),
    Billboards(Vec<Billboard<'a>>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    pub(crate) fn set_pipelines(self, basics: &mut Vec<Instanced<'a>>, sprites: &mut Vec<Billboard<'a>>) {
        match self {
            Render::Defaults(mut vec) => basics.append(&mut vec),
            Render::Billboards(mut vec) => sprites.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(basics, sprites)),
        }
    }

    /// Records every draw of `self` into `render_pass`, opaque batches first.
    pub fn draw<'pass>(self, ctx: &'pass Context, quad: &'pass Quad, render_pass: &mut RenderPass<'pass>)
    where
        'a: 'pass,
    {
        let mut basics = Vec::new();
        let mut sprites = Vec::new();
        self.set_pipelines(&mut basics, &mut sprites);

        render_pass.set_pipeline(&ctx.pipelines.basic);
        for instanced in basics {
            if instanced.amount == 0 {
                log::warn!("Skipping mesh `{}` without instances", instanced.mesh.name);
                continue;
            }
            render_pass.draw_mesh_instanced(instanced.mesh, 0..instanced.amount, &ctx.camera.bind_group);
        }

        if sprites.is_empty() {
            return;
        }
        // blended quads go back to front
        let eye = ctx.camera.camera.position();
        sprites.sort_by(|a, b| {
            let da = (a.center - eye).magnitude2();
            let db = (b.center - eye).magnitude2();
            db.total_cmp(&da)
        });
        render_pass.set_pipeline(&ctx.pipelines.sprite);
        render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
        render_pass.set_vertex_buffer(0, quad.vertex_buffer.slice(..));
        render_pass.set_index_buffer(quad.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        for billboard in sprites {
            render_pass.set_bind_group(1, billboard.group, &[]);
            render_pass.set_vertex_buffer(1, billboard.instance.slice(..));
            render_pass.draw_indexed(0..quad.num_indices, 0, 0..1);
        }
    }
}

/// A sprite's world transform reduced to what the billboard shader needs.
pub fn sprite_raw(world: &Instance) -> SpriteRaw {
    SpriteRaw {
        center: world.position.into(),
        size: [world.scale.x, world.scale.y],
    }
}

#[derive(Debug)]
struct GpuSprite {
    node: NodeId,
    #[allow(unused)]
    texture: Texture,
    bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    center: Point3<f32>,
}

/// GPU resources for every drawable node of a scene graph.
#[derive(Debug)]
pub struct GpuScene {
    meshes: Vec<(NodeId, GpuMesh)>,
    sprites: Vec<GpuSprite>,
    pub quad: Quad,
}

impl GpuScene {
    /// Uploads all mesh geometry and label bitmaps. World transforms are
    /// taken from the graph's cache, so refresh it first.
    pub fn new(ctx: &Context, graph: &SceneGraph) -> anyhow::Result<Self> {
        use wgpu::util::DeviceExt;

        let mut meshes = Vec::new();
        let mut sprites = Vec::new();
        for (id, node) in graph.iter() {
            match &node.kind {
                NodeKind::Group => (),
                NodeKind::Mesh { geometry, material } => {
                    let colour = graph
                        .materials
                        .get(*material)
                        .map(|m| m.linear_rgba())
                        .ok_or_else(|| anyhow::anyhow!("Node `{}` uses an unknown material", node.name))?;
                    let mesh = GpuMesh::new(&ctx.device, &node.name, geometry, node.world().to_raw(colour));
                    meshes.push((id, mesh));
                }
                NodeKind::Sprite(label) => {
                    let texture = Texture::from_rgba(&ctx.device, &ctx.queue, &label.image, Some(&node.name));
                    let bind_group =
                        sprite::mk_bind_group(&ctx.device, &texture, &ctx.pipelines.sprite_texture_layout)?;
                    let raw = sprite_raw(node.world());
                    let instance_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{:?} Sprite Buffer", node.name)),
                        contents: bytemuck::cast_slice(&[raw]),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    });
                    sprites.push(GpuSprite {
                        node: id,
                        texture,
                        bind_group,
                        instance_buffer,
                        center: Point3::from(raw.center),
                    });
                }
            }
        }
        Ok(Self {
            meshes,
            sprites,
            quad: Quad::new(&ctx.device),
        })
    }

    /// Writes the cached world transforms of every drawable node.
    pub fn write_to_buffers(&mut self, queue: &wgpu::Queue, graph: &SceneGraph) -> Result<(), SceneError> {
        for (id, mesh) in &self.meshes {
            let node = graph.node(*id)?;
            let NodeKind::Mesh { material, .. } = &node.kind else {
                continue;
            };
            let colour = graph
                .materials
                .get(*material)
                .map(|m| m.linear_rgba())
                .unwrap_or([1.0, 0.0, 1.0, 1.0]);
            mesh.write_instance(queue, node.world().to_raw(colour));
        }
        for sprite in &mut self.sprites {
            let raw = sprite_raw(graph.world_transform(sprite.node)?);
            sprite.center = Point3::from(raw.center);
            queue.write_buffer(&sprite.instance_buffer, 0, bytemuck::cast_slice(&[raw]));
        }
        Ok(())
    }

    pub fn get_render(&self) -> Render<'_> {
        Render::Composed(vec![
            Render::Defaults(
                self.meshes
                    .iter()
                    .map(|(_, mesh)| Instanced { mesh, amount: 1 })
                    .collect(),
            ),
            Render::Billboards(
                self.sprites
                    .iter()
                    .map(|sprite| Billboard {
                        instance: &sprite.instance_buffer,
                        group: &sprite.bind_group,
                        center: sprite.center,
                    })
                    .collect(),
            ),
        ])
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;

    #[test]
    fn sprite_size_follows_world_scale() {
        let parent = Instance::from(Vector3::new(-5.5, 1.5, 14.0));
        let label = Instance::from(Vector3::new(0.0, 2.0, 0.0)).with_scale(Vector3::new(2.0, 1.0, 1.0));
        let raw = sprite_raw(&(&parent * &label));
        assert_eq!(raw.center, [-5.5, 3.5, 14.0]);
        assert_eq!(raw.size, [2.0, 1.0]);
    }

    #[test]
    fn empty_renders_produce_no_batches() {
        let mut basics = Vec::new();
        let mut sprites = Vec::new();
        Render::Composed(vec![Render::Defaults(vec![]), Render::Composed(vec![]), Render::Billboards(vec![])])
            .set_pipelines(&mut basics, &mut sprites);
        assert!(basics.is_empty());
        assert!(sprites.is_empty());
    }
}
