#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour_above_the_horizon() {
    use campus_walk::CampusConfig;

    use crate::common::test_utils::{assert_pixel_near, campus, pixel_at_ndc, render_offscreen};

    let config = CampusConfig {
        clear_colour: wgpu::Color::WHITE,
        ..Default::default()
    };
    let image = render_offscreen(&config, &campus(), 256, 256).expect("offscreen render failed");
    assert_eq!(image.dimensions(), (256, 256));
    for x in [-0.9, 0.0, 0.9] {
        assert_pixel_near(&pixel_at_ndc(&image, x, 0.95), [255, 255, 255], 0);
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_flat_ground_and_road_colours() {
    use campus_walk::CampusConfig;

    use crate::common::test_utils::{assert_pixel_near, campus, pixel_at_ndc, render_offscreen};

    let config = CampusConfig::default();
    let image = render_offscreen(&config, &campus(), 256, 256).expect("offscreen render failed");
    // grass left of the buildings, road straight ahead
    assert_pixel_near(&pixel_at_ndc(&image, -0.9, -0.3), [0, 128, 0], 2);
    assert_pixel_near(&pixel_at_ndc(&image, 0.0, -0.3), [128, 128, 128], 2);
}

#[test]
#[cfg(feature = "integration-tests")]
fn resize_updates_aspect_surface_and_keeps_the_scene() {
    use approx::assert_relative_eq;
    use campus_walk::{CampusConfig, context::Context};

    use crate::common::test_utils::{block_on, campus, positions};

    let config = CampusConfig::default();
    let campus = campus();
    let before = positions(&campus);
    let mut ctx = block_on(Context::headless(320, 240, &config)).expect("no adapter");

    assert!(ctx.resize(640, 360));
    assert_eq!((ctx.config.width, ctx.config.height), (640, 360));
    assert_relative_eq!(ctx.projection.aspect(), 640.0 / 360.0);

    assert!(!ctx.resize(0, 360));
    assert_eq!((ctx.config.width, ctx.config.height), (640, 360));
    assert_eq!(positions(&campus), before);
}

#[test]
#[cfg(feature = "integration-tests")]
fn gpu_scene_uploads_every_mesh_and_label() {
    use campus_walk::{CampusConfig, context::Context, render::GpuScene};

    use crate::common::test_utils::{block_on, campus};

    let config = CampusConfig::default();
    let campus = campus();
    let ctx = block_on(Context::headless(64, 64, &config)).expect("no adapter");
    let scene = GpuScene::new(&ctx, &campus.graph).expect("scene upload failed");
    // ground, three roads, four buildings and six figure parts
    assert_eq!(scene.mesh_count(), 14);
    assert_eq!(scene.sprite_count(), 4);
}
