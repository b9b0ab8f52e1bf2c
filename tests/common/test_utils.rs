#![allow(dead_code)]

use campus_walk::{
    Campus, CampusConfig,
    data_structures::scene_graph::NodeId,
    resources::label::TextRasterizer,
};
use cgmath::Vector3;

/// The stock campus; labels share one rasterizer per test binary run.
pub(crate) fn campus() -> Campus {
    Campus::build_with(&CampusConfig::default(), &mut TextRasterizer::new())
        .expect("The stock campus should assemble")
}

pub(crate) fn world_position(campus: &Campus, id: NodeId) -> Vector3<f32> {
    campus
        .graph
        .world_transform(id)
        .expect("Node should exist")
        .position
}

/// Snapshot of every node's world position, for before/after comparisons.
pub(crate) fn positions(campus: &Campus) -> Vec<(NodeId, Vector3<f32>)> {
    campus
        .graph
        .iter()
        .map(|(id, node)| (id, node.world().position))
        .collect()
}

pub(crate) fn assert_pixel_near(pixel: &image::Rgba<u8>, expected: [u8; 3], tolerance: u8) {
    for channel in 0..3 {
        let diff = pixel.0[channel].abs_diff(expected[channel]);
        assert!(
            diff <= tolerance,
            "pixel {:?} differs from {:?} in channel {}",
            pixel,
            expected,
            channel
        );
    }
}

#[cfg(feature = "integration-tests")]
pub(crate) fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Runtime::new()
        .expect("Failed to start the test runtime")
        .block_on(future)
}

/// Renders `campus` once into a `width` x `height` offscreen frame.
#[cfg(feature = "integration-tests")]
pub(crate) fn render_offscreen(
    config: &CampusConfig,
    campus: &Campus,
    width: u32,
    height: u32,
) -> anyhow::Result<image::RgbaImage> {
    use campus_walk::{context::Context, render::GpuScene};

    block_on(async {
        let mut ctx = Context::headless(width, height, config).await?;
        ctx.update_camera(std::time::Duration::ZERO);
        let scene = GpuScene::new(&ctx, &campus.graph)?;
        ctx.capture(&scene).await
    })
}

/// Pixel under normalised device coordinates (`x`, `y` in -1..1, +y up).
pub(crate) fn pixel_at_ndc(image: &image::RgbaImage, x: f32, y: f32) -> image::Rgba<u8> {
    let px = (((x + 1.0) / 2.0) * image.width() as f32) as u32;
    let py = (((1.0 - y) / 2.0) * image.height() as f32) as u32;
    *image.get_pixel(px.min(image.width() - 1), py.min(image.height() - 1))
}
