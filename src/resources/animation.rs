//! Looping waypoint tweens.
//!
//! A [`Tween`] walks a point through an ordered list of (x, z) waypoints with
//! linear easing and restarts at the first waypoint once the loop duration
//! has elapsed. Elapsed time is kept as a [`Duration`] and wrapped with
//! integer arithmetic, so long sessions do not drift.

use std::time::Duration;

use cgmath::{Vector2, VectorSpace};
use thiserror::Error;

use crate::data_structures::scene_graph::{NodeId, SceneError, SceneGraph};

/// Ordered, read-only list of (x, z) targets.
pub type Waypoints = Vec<Vector2<f32>>;

#[derive(Debug, Error, PartialEq)]
pub enum AnimationError {
    #[error("a tween needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),
    #[error("tween duration must be positive")]
    ZeroDuration,
    #[error("expected {expected} segment weights, got {actual}")]
    WeightCount { expected: usize, actual: usize },
    #[error("segment weights must be finite, non-negative and sum to a positive value")]
    InvalidWeights,
}

/// How the loop duration is split among segments.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Timing {
    #[default]
    Uniform,
    /// One weight per segment; a segment's share is its weight over the sum.
    PerSegment(Vec<f32>),
}

#[derive(Clone, Debug)]
pub struct Tween {
    waypoints: Waypoints,
    /// Cumulative end time of each segment; the last entry equals `duration`.
    segment_ends: Vec<Duration>,
    duration: Duration,
    elapsed: Duration,
}

impl Tween {
    pub fn new(waypoints: Waypoints, duration: Duration, timing: Timing) -> Result<Self, AnimationError> {
        if waypoints.len() < 2 {
            return Err(AnimationError::TooFewWaypoints(waypoints.len()));
        }
        if duration.is_zero() {
            return Err(AnimationError::ZeroDuration);
        }
        let segments = waypoints.len() - 1;
        let weights = match timing {
            Timing::Uniform => vec![1.0; segments],
            Timing::PerSegment(weights) => {
                if weights.len() != segments {
                    return Err(AnimationError::WeightCount {
                        expected: segments,
                        actual: weights.len(),
                    });
                }
                weights
            }
        };
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AnimationError::InvalidWeights);
        }
        let total: f64 = weights.iter().map(|w| f64::from(*w)).sum();
        if total <= 0.0 {
            return Err(AnimationError::InvalidWeights);
        }

        let nanos = duration.as_nanos() as f64;
        let mut acc = 0.0;
        let mut segment_ends: Vec<Duration> = weights
            .iter()
            .map(|w| {
                acc += f64::from(*w);
                Duration::from_nanos((nanos * acc / total).round() as u64)
            })
            .collect();
        // Rounding must not leave a gap before the wrap.
        if let Some(last) = segment_ends.last_mut() {
            *last = duration;
        }

        Ok(Self {
            waypoints,
            segment_ends,
            duration,
            elapsed: Duration::ZERO,
        })
    }

    pub fn waypoints(&self) -> &[Vector2<f32>] {
        &self.waypoints
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time into the current loop, always below [`Tween::duration`].
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn advance(&mut self, dt: Duration) {
        self.elapsed = self.wrap(self.elapsed + dt);
    }

    /// Segment index and interpolation factor in [0, 1) at loop time `t`.
    pub fn segment_at(&self, t: Duration) -> (usize, f32) {
        let t = self.wrap(t);
        // The first segment whose end lies strictly after `t`.
        let index = self.segment_ends.partition_point(|end| *end <= t);
        let index = index.min(self.segment_ends.len() - 1);
        let start = if index == 0 {
            Duration::ZERO
        } else {
            self.segment_ends[index - 1]
        };
        let length = self.segment_ends[index].saturating_sub(start);
        let factor = if length.is_zero() {
            0.0
        } else {
            ((t - start).as_secs_f64() / length.as_secs_f64()) as f32
        };
        (index, factor)
    }

    pub fn sample_at(&self, t: Duration) -> Vector2<f32> {
        let (index, factor) = self.segment_at(t);
        self.waypoints[index].lerp(self.waypoints[index + 1], factor)
    }

    pub fn position(&self) -> Vector2<f32> {
        self.sample_at(self.elapsed)
    }

    fn wrap(&self, t: Duration) -> Duration {
        let nanos = t.as_nanos() % self.duration.as_nanos();
        Duration::from_nanos(nanos as u64)
    }
}

/// A tween bound to the node whose x/z it drives.
#[derive(Clone, Debug)]
pub struct TweenDriver {
    pub node: NodeId,
    pub tween: Tween,
}

impl TweenDriver {
    pub fn new(node: NodeId, tween: Tween) -> Self {
        Self { node, tween }
    }

    /// Writes the current sample without advancing.
    pub fn apply(&self, graph: &mut SceneGraph) -> Result<(), SceneError> {
        let p = self.tween.position();
        let local = graph.local_transform_mut(self.node)?;
        local.position.x = p.x;
        local.position.z = p.y;
        Ok(())
    }

    pub fn tick(&mut self, graph: &mut SceneGraph, dt: Duration) -> Result<(), SceneError> {
        self.tween.advance(dt);
        self.apply(graph)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::{Vector2, Vector3};

    use super::*;
    use crate::data_structures::{instance::Instance, scene_graph::Node};

    fn square() -> Waypoints {
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(0.0, 0.0),
        ]
    }

    #[test]
    fn rejects_degenerate_input() {
        let one = vec![Vector2::new(0.0, 0.0)];
        assert_eq!(
            Tween::new(one, Duration::from_secs(1), Timing::Uniform).unwrap_err(),
            AnimationError::TooFewWaypoints(1)
        );
        assert_eq!(
            Tween::new(square(), Duration::ZERO, Timing::Uniform).unwrap_err(),
            AnimationError::ZeroDuration
        );
        assert_eq!(
            Tween::new(square(), Duration::from_secs(1), Timing::PerSegment(vec![1.0])).unwrap_err(),
            AnimationError::WeightCount { expected: 4, actual: 1 }
        );
        assert_eq!(
            Tween::new(square(), Duration::from_secs(1), Timing::PerSegment(vec![0.0; 4])).unwrap_err(),
            AnimationError::InvalidWeights
        );
    }

    #[test]
    fn uniform_segments_split_the_loop_evenly() {
        let tween = Tween::new(square(), Duration::from_secs(4), Timing::Uniform).unwrap();
        assert_eq!(tween.segment_at(Duration::ZERO), (0, 0.0));
        let (index, factor) = tween.segment_at(Duration::from_millis(1500));
        assert_eq!(index, 1);
        assert_relative_eq!(factor, 0.5);
        let p = tween.sample_at(Duration::from_millis(1500));
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 0.5);
    }

    #[test]
    fn loop_restarts_at_the_first_waypoint() {
        let mut tween = Tween::new(square(), Duration::from_secs(4), Timing::Uniform).unwrap();
        tween.advance(Duration::from_secs(4));
        assert_eq!(tween.elapsed(), Duration::ZERO);
        assert_eq!(tween.position(), Vector2::new(0.0, 0.0));

        tween.advance(Duration::from_millis(4500));
        assert_eq!(tween.elapsed(), Duration::from_millis(500));
    }

    #[test]
    fn many_small_steps_do_not_drift() {
        let mut tween = Tween::new(square(), Duration::from_secs(4), Timing::Uniform).unwrap();
        let step = Duration::from_nanos(16_666_667);
        for _ in 0..60 * 60 {
            tween.advance(step);
        }
        let expected = (step * 3600).as_nanos() % Duration::from_secs(4).as_nanos();
        assert_eq!(tween.elapsed().as_nanos(), expected);
    }

    #[test]
    fn weighted_segments_take_their_share() {
        let timing = Timing::PerSegment(vec![3.0, 1.0, 0.0, 4.0]);
        let tween = Tween::new(square(), Duration::from_secs(8), timing).unwrap();
        assert_eq!(tween.segment_at(Duration::from_secs(2)).0, 0);
        assert_eq!(tween.segment_at(Duration::from_millis(3500)).0, 1);
        // The zero-weight segment is skipped entirely.
        assert_eq!(tween.segment_at(Duration::from_secs(4)).0, 3);
    }

    #[test]
    fn driver_writes_only_x_and_z() {
        let mut graph = SceneGraph::new();
        let node = graph.add(Node::group("walker").with_transform(Instance::from(Vector3::new(0.0, 0.5, 0.0))));
        let tween = Tween::new(square(), Duration::from_secs(4), Timing::Uniform).unwrap();
        let mut driver = TweenDriver::new(node, tween);

        driver.tick(&mut graph, Duration::from_millis(2500)).unwrap();
        let position = graph.node(node).unwrap().local.position;
        assert_relative_eq!(position.x, 0.5);
        assert_relative_eq!(position.y, 0.5);
        assert_relative_eq!(position.z, 1.0);
    }
}
