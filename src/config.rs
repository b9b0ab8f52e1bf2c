use cgmath::{Deg, Point3};
use instant::Duration;

use crate::{
    camera::{OrbitCamera, OrbitController, Projection},
    resources::animation::Timing,
};

/// Startup settings of the campus viewer.
///
/// The defaults reproduce the stock scene: a 75° camera at (0, 10, 30)
/// looking at the origin, damped orbit controls and a 20 second tour.
#[derive(Clone, Debug)]
pub struct CampusConfig {
    pub title: String,
    pub camera_position: Point3<f32>,
    pub camera_target: Point3<f32>,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Zero disables damping.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub tour_duration: Duration,
    pub tour_timing: Timing,
    pub clear_colour: wgpu::Color,
}

impl Default for CampusConfig {
    fn default() -> Self {
        Self {
            title: "Campus Walk".to_string(),
            camera_position: Point3::new(0.0, 10.0, 30.0),
            camera_target: Point3::new(0.0, 0.0, 0.0),
            fovy: Deg(75.0),
            znear: 0.1,
            zfar: 1000.0,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            tour_duration: Duration::from_secs(20),
            tour_timing: Timing::Uniform,
            clear_colour: wgpu::Color::BLACK,
        }
    }
}

impl CampusConfig {
    pub fn camera(&self) -> OrbitCamera {
        OrbitCamera::from_position(self.camera_position, self.camera_target)
    }

    pub fn controller(&self) -> OrbitController {
        OrbitController::new(
            self.rotate_speed,
            self.zoom_speed,
            self.pan_speed,
            self.damping_factor,
        )
    }

    pub fn projection(&self, width: u32, height: u32) -> Projection {
        Projection::new(width, height, self.fovy, self.znear, self.zfar)
    }
}
