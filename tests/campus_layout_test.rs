use std::time::Duration;

use approx::assert_relative_eq;
use campus_walk::{
    CampusConfig,
    campus::tour_waypoints,
    data_structures::scene_graph::NodeKind,
};
use cgmath::Vector3;

use crate::common::test_utils::{campus, positions, world_position};

mod common;

#[test]
fn static_nodes_sit_at_their_layout_constants() {
    let campus = campus();
    assert_eq!(world_position(&campus, campus.ground), Vector3::new(0.0, 0.0, 0.0));

    let roads = [
        Vector3::new(0.0, 0.01, 0.0),
        Vector3::new(-11.0, 0.01, -6.0),
        Vector3::new(11.0, 0.01, -6.0),
    ];
    for (&id, expected) in campus.roads.iter().zip(roads) {
        assert_eq!(world_position(&campus, id), expected);
    }

    for (label, x, z) in [("301", -5.5, 14.0), ("302", -5.5, 5.0), ("303", -5.5, -14.0), ("801", 11.0, 6.0)] {
        let id = campus.building(label).expect("building should exist");
        assert_eq!(world_position(&campus, id), Vector3::new(x, 1.5, z));
    }
}

#[test]
fn every_label_is_a_sprite_below_its_building() {
    let campus = campus();
    for &building in &campus.buildings {
        let node = campus.graph.node(building).unwrap();
        let [label] = node.children() else {
            panic!("{} should carry exactly one label", node.name);
        };
        let label = campus.graph.node(*label).unwrap();
        assert!(matches!(label.kind, NodeKind::Sprite(_)));
        assert_eq!(label.parent(), Some(building));
    }
}

#[test]
fn tour_loop_returns_to_the_start() {
    let mut campus = campus();
    let start = world_position(&campus, campus.stick_figure);
    let points = tour_waypoints();
    assert_eq!(start.x, points[0].x);
    assert_eq!(start.z, points[0].y);

    // a full loop in uneven frames
    let mut left = CampusConfig::default().tour_duration;
    let frame = Duration::from_millis(17);
    while left > frame {
        campus.tick(frame).unwrap();
        left -= frame;
    }
    campus.tick(left).unwrap();

    let end = world_position(&campus, campus.stick_figure);
    assert_relative_eq!(end.x, start.x, epsilon = 1e-5);
    assert_relative_eq!(end.y, start.y, epsilon = 1e-5);
    assert_relative_eq!(end.z, start.z, epsilon = 1e-5);
}

#[test]
fn only_the_stick_figure_moves() {
    let mut campus = campus();
    let before = positions(&campus);
    campus.tick(Duration::from_millis(4300)).unwrap();
    let after = positions(&campus);

    let figure = campus.graph.node(campus.stick_figure).unwrap();
    let moving: Vec<_> = std::iter::once(campus.stick_figure)
        .chain(figure.children().iter().copied())
        .collect();
    for ((id, a), (_, b)) in before.iter().zip(&after) {
        if moving.contains(id) {
            continue;
        }
        assert_eq!(a, b, "{:?} moved", id);
    }
    assert_ne!(world_position(&campus, campus.stick_figure), before[campus.stick_figure.index()].1);
}

#[test]
fn walker_keeps_its_height() {
    let mut campus = campus();
    for _ in 0..100 {
        campus.tick(Duration::from_millis(333)).unwrap();
        assert_eq!(world_position(&campus, campus.stick_figure).y, 0.5);
    }
}

#[test]
fn resizing_the_projection_only_touches_the_aspect() {
    let config = CampusConfig::default();
    let mut projection = config.projection(800, 600);
    let campus = campus();
    let before = positions(&campus);
    projection.resize(1024, 256);
    assert_relative_eq!(projection.aspect(), 4.0);
    assert_eq!(projection.fovy, cgmath::Rad::from(cgmath::Deg(75.0)));
    assert_eq!(positions(&campus), before);
}
