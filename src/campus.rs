//! The campus scene: ground, roads, labeled buildings and a walking figure.
//!
//! Every `create_*` helper adds one placed node (with its parts) to a
//! [`SceneGraph`]. [`Campus::build`] lays out the stock campus and binds the
//! tour animation to the stick figure.

use std::f32::consts::PI;

use cgmath::{Vector2, Vector3};

use crate::{
    config::CampusConfig,
    data_structures::{
        instance::{Euler, Instance},
        material::{ColorParseError, Material, MaterialId, MaterialTable},
        scene_graph::{Node, NodeId, SceneError, SceneGraph},
    },
    resources::{
        animation::{Tween, TweenDriver, Waypoints},
        geometry::Geometry,
        label::{Label, TextRasterizer},
    },
};

pub const GROUND_SIZE: f32 = 40.0;
/// Height at which the stick figure's feet group is placed.
pub const FIGURE_BASE_Y: f32 = 0.5;

/// The flat colours shared by all campus meshes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub grass: MaterialId,
    pub road: MaterialId,
    pub building: MaterialId,
    pub figure: MaterialId,
}

impl Palette {
    pub fn register(materials: &mut MaterialTable) -> Result<Self, ColorParseError> {
        Ok(Self {
            grass: materials.insert(Material::from_hex("green", "#008000")?),
            road: materials.insert(Material::from_hex("gray", "#808080")?),
            building: materials.insert(Material::from_hex("building", "#2e8bc0")?),
            figure: materials.insert(Material::from_hex("red", "#ff0000")?),
        })
    }
}

pub fn create_ground(graph: &mut SceneGraph, palette: &Palette) -> NodeId {
    let node = Node::mesh("ground", Geometry::plane(GROUND_SIZE, GROUND_SIZE), palette.grass)
        .with_transform(Instance::from_position_euler(
            Vector3::new(0.0, 0.0, 0.0),
            Euler::new(-PI / 2.0, 0.0, 0.0),
        ));
    graph.add(node)
}

/// A flat `width` x `height` strip laid into the ground plane and yawed by `rotation`.
pub fn create_road(
    graph: &mut SceneGraph,
    palette: &Palette,
    width: f32,
    height: f32,
    position: Vector3<f32>,
    rotation: f32,
) -> NodeId {
    let name = format!("road {}", graph.len());
    let node = Node::mesh(&name, Geometry::plane(width, height), palette.road).with_transform(
        Instance::from_position_euler(position, Euler::new(-PI / 2.0, 0.0, rotation)),
    );
    graph.add(node)
}

/// A box standing on the ground at (`x`, `z`). A non-empty `label` gets a sprite above it.
#[allow(clippy::too_many_arguments)]
pub fn create_building(
    graph: &mut SceneGraph,
    palette: &Palette,
    rasterizer: &mut TextRasterizer,
    x: f32,
    z: f32,
    width: f32,
    height: f32,
    depth: f32,
    rotation_y: f32,
    label: &str,
) -> Result<NodeId, SceneError> {
    let name = if label.is_empty() {
        format!("building {}", graph.len())
    } else {
        format!("building {}", label)
    };
    let node = Node::mesh(&name, Geometry::cuboid(width, height, depth), palette.building)
        .with_transform(Instance::from_position_euler(
            Vector3::new(x, height / 2.0, z),
            Euler::new(0.0, rotation_y, 0.0),
        ));
    let building = graph.add(node);
    if !label.is_empty() {
        attach_label(graph, rasterizer, building, label)?;
    }
    Ok(building)
}

/// Rasterizes `text` and hangs it as a 2x1 sprite two units above `building`.
pub fn attach_label(
    graph: &mut SceneGraph,
    rasterizer: &mut TextRasterizer,
    building: NodeId,
    text: &str,
) -> Result<NodeId, SceneError> {
    let label = Label::rasterize(rasterizer, text);
    let sprite = Node::sprite(&format!("label {}", text), label).with_transform(
        Instance::from(Vector3::new(0.0, 2.0, 0.0)).with_scale(Vector3::new(2.0, 1.0, 1.0)),
    );
    graph.add_child(building, sprite)
}

pub fn create_stick_figure(graph: &mut SceneGraph, palette: &Palette) -> Result<NodeId, SceneError> {
    let figure = graph.add(
        Node::group("stick figure")
            .with_transform(Instance::from(Vector3::new(0.0, FIGURE_BASE_Y, 0.0))),
    );
    let segments = Geometry::DEFAULT_RADIAL_SEGMENTS;
    let limb = |geometry: Geometry, position: [f32; 3], tilt: f32| {
        (
            geometry,
            Instance::from_position_euler(position.into(), Euler::new(0.0, 0.0, tilt)),
        )
    };
    let parts = [
        ("head", limb(Geometry::sphere(0.5, 32, 32), [0.0, 3.0, 0.0], 0.0)),
        ("torso", limb(Geometry::cylinder(0.2, 0.2, 2.0, segments), [0.0, 2.0, 0.0], 0.0)),
        (
            "left arm",
            limb(Geometry::cylinder(0.1, 0.1, 1.5, segments), [-0.75, 2.5, 0.0], PI / 4.0),
        ),
        (
            "right arm",
            limb(Geometry::cylinder(0.1, 0.1, 1.5, segments), [0.75, 2.5, 0.0], -PI / 4.0),
        ),
        (
            "left leg",
            limb(Geometry::cylinder(0.1, 0.1, 2.0, segments), [-0.4, 0.5, 0.0], PI / 10.0),
        ),
        (
            "right leg",
            limb(Geometry::cylinder(0.1, 0.1, 2.0, segments), [0.4, 0.5, 0.0], -PI / 10.0),
        ),
    ];
    for (name, (geometry, local)) in parts {
        graph.add_child(figure, Node::mesh(name, geometry, palette.figure).with_transform(local))?;
    }
    Ok(figure)
}

/// The walking tour: from the start in front of the buildings past each entrance and back.
pub fn tour_waypoints() -> Waypoints {
    [
        (0.0, 0.0),
        (0.0, 15.0),
        (-5.5, 15.0),
        (0.0, 12.0),
        (0.0, 2.0),
        (-5.5, 2.0),
        (0.0, 2.0),
        (0.0, -15.0),
        (-5.5, -15.0),
        (0.0, -12.0),
        (0.0, 0.0),
    ]
    .into_iter()
    .map(|(x, z)| Vector2::new(x, z))
    .collect()
}

/// The assembled campus scene.
#[derive(Debug)]
pub struct Campus {
    pub graph: SceneGraph,
    pub palette: Palette,
    pub ground: NodeId,
    pub roads: Vec<NodeId>,
    pub buildings: Vec<NodeId>,
    pub stick_figure: NodeId,
    pub tour: TweenDriver,
}

impl Campus {
    pub fn build(config: &CampusConfig) -> anyhow::Result<Self> {
        let mut rasterizer = TextRasterizer::new();
        Self::build_with(config, &mut rasterizer)
    }

    pub fn build_with(config: &CampusConfig, rasterizer: &mut TextRasterizer) -> anyhow::Result<Self> {
        let mut graph = SceneGraph::new();
        let palette = Palette::register(&mut graph.materials)?;

        let ground = create_ground(&mut graph, &palette);
        let roads = vec![
            create_road(&mut graph, &palette, 5.0, 40.0, Vector3::new(0.0, 0.01, 0.0), 0.0),
            create_road(&mut graph, &palette, 18.0, 5.0, Vector3::new(-11.0, 0.01, -6.0), 0.0),
            create_road(&mut graph, &palette, 18.0, 5.0, Vector3::new(11.0, 0.01, -6.0), 0.0),
        ];

        let layout = [
            (-5.5, 14.0, 6.0, 3.0, 7.0, 0.0, "301"),
            (-5.5, 5.0, 6.0, 3.0, 7.0, 0.0, "302"),
            (-5.5, -14.0, 6.0, 3.0, 7.0, 0.0, "303"),
            (11.0, 6.0, 8.0, 3.0, 15.0, PI / 10.0, "801"),
        ];
        let mut buildings = Vec::with_capacity(layout.len());
        for (x, z, width, height, depth, rotation, label) in layout {
            buildings.push(create_building(
                &mut graph, &palette, rasterizer, x, z, width, height, depth, rotation, label,
            )?);
        }

        let stick_figure = create_stick_figure(&mut graph, &palette)?;
        let tween = Tween::new(tour_waypoints(), config.tour_duration, config.tour_timing.clone())?;
        let tour = TweenDriver::new(stick_figure, tween);
        tour.apply(&mut graph)?;
        graph.update_world_transforms();

        log::info!(
            "Campus assembled: {} nodes, {} materials",
            graph.len(),
            graph.materials.len()
        );

        Ok(Self {
            graph,
            palette,
            ground,
            roads,
            buildings,
            stick_figure,
            tour,
        })
    }

    /// Advances the tour and refreshes world transforms.
    pub fn tick(&mut self, dt: instant::Duration) -> Result<(), SceneError> {
        self.tour.tick(&mut self.graph, dt)?;
        self.graph.update_world_transforms();
        Ok(())
    }

    pub fn building(&self, label: &str) -> Option<NodeId> {
        self.graph.find(&format!("building {}", label))
    }
}
