//! Orbit camera, perspective projection and mouse-driven orbit controls.
//!
//! The camera is described in spherical coordinates around a target point:
//! the azimuth turns around +Y, the polar angle is measured down from +Y.
//! [`OrbitController`] collects pointer input between frames and applies it
//! in [`OrbitController::update`]. With damping enabled each frame only
//! applies a fraction of the outstanding rotation and pan; the remainder
//! decays geometrically, so the camera eases into the requested orientation.

use std::f32::consts::PI;

use cgmath::{perspective, InnerSpace, Matrix4, Point3, Rad, Vector3};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the polar angle away from the poles where `look_at` degenerates.
const POLAR_EPSILON: f32 = 1e-6;
/// Damping factors are specified per frame at this rate.
const REFERENCE_FPS: f32 = 60.0;
/// Pixels per wheel line.
const PIXELS_PER_LINE: f32 = 100.0;

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    pub target: Point3<f32>,
    pub azimuth: Rad<f32>,
    pub polar: Rad<f32>,
    pub distance: f32,
}

impl OrbitCamera {
    pub fn new<A: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        target: Point3<f32>,
        azimuth: A,
        polar: P,
        distance: f32,
    ) -> Self {
        Self {
            target,
            azimuth: azimuth.into(),
            polar: polar.into(),
            distance,
        }
    }

    /// Camera at `position` looking at `target`.
    pub fn from_position(position: Point3<f32>, target: Point3<f32>) -> Self {
        let offset = position - target;
        let distance = offset.magnitude();
        if distance <= f32::EPSILON {
            return Self::new(target, Rad(0.0), Rad(PI / 2.0), 0.0);
        }
        Self {
            target,
            azimuth: Rad(offset.x.atan2(offset.z)),
            polar: Rad((offset.y / distance).clamp(-1.0, 1.0).acos()),
            distance,
        }
    }

    /// Offset from the target to the eye.
    pub fn offset(&self) -> Vector3<f32> {
        let (sin_polar, cos_polar) = self.polar.0.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.0.sin_cos();
        Vector3::new(
            self.distance * sin_polar * sin_azimuth,
            self.distance * cos_polar,
            self.distance * sin_polar * cos_azimuth,
        )
    }

    pub fn position(&self) -> Point3<f32> {
        self.target + self.offset()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position(), self.target, Vector3::unit_y())
    }

    /// World-space right axis of the view.
    pub fn right(&self) -> Vector3<f32> {
        let view = self.calc_matrix();
        Vector3::new(view.x.x, view.y.x, view.z.x)
    }

    /// World-space up axis of the view.
    pub fn up(&self) -> Vector3<f32> {
        let view = self.calc_matrix();
        Vector3::new(view.x.y, view.y.y, view.z.y)
    }
}

#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Drag {
    #[default]
    None,
    Rotate,
    Pan,
}

/// Left-drag orbits, right-drag pans, the wheel dollies.
#[derive(Clone, Debug)]
pub struct OrbitController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub enable_damping: bool,
    /// Fraction of the outstanding motion applied per frame at 60 fps.
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: Rad<f32>,
    pub max_polar: Rad<f32>,
    drag: Drag,
    cursor: Option<PhysicalPosition<f64>>,
    // raw pixel input since the last update
    rotate_pixels: (f32, f32),
    pan_pixels: (f32, f32),
    zoom_scale: f32,
    // outstanding motion, decayed when damping
    azimuth_delta: f32,
    polar_delta: f32,
    pan_offset: Vector3<f32>,
}

impl OrbitController {
    pub fn new(rotate_speed: f32, zoom_speed: f32, pan_speed: f32, damping_factor: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed,
            enable_damping: damping_factor > 0.0,
            damping_factor,
            min_distance: 0.1,
            max_distance: f32::INFINITY,
            min_polar: Rad(0.0),
            max_polar: Rad(PI),
            drag: Drag::None,
            cursor: None,
            rotate_pixels: (0.0, 0.0),
            pan_pixels: (0.0, 0.0),
            zoom_scale: 1.0,
            azimuth_delta: 0.0,
            polar_delta: 0.0,
            pan_offset: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    /// Feeds a window event into the controller; returns whether it was used.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => self.handle_mouse_input(*button, *state),
            WindowEvent::CursorMoved { position, .. } => self.handle_cursor_moved(*position),
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y * PIXELS_PER_LINE,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                self.handle_scroll(scroll);
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.drag = Drag::None;
                self.cursor = None;
                false
            }
            _ => false,
        }
    }

    pub fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) -> bool {
        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => self.drag = Drag::Rotate,
            (MouseButton::Right, ElementState::Pressed) => self.drag = Drag::Pan,
            (MouseButton::Left | MouseButton::Right, ElementState::Released) => self.drag = Drag::None,
            _ => return false,
        }
        true
    }

    pub fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) -> bool {
        let previous = self.cursor.replace(position);
        let Some(previous) = previous else {
            return false;
        };
        let dx = (position.x - previous.x) as f32;
        let dy = (position.y - previous.y) as f32;
        self.handle_drag(dx, dy)
    }

    /// Pointer motion in pixels while a button is held.
    pub fn handle_drag(&mut self, dx: f32, dy: f32) -> bool {
        match self.drag {
            Drag::Rotate => {
                self.rotate_pixels.0 += dx;
                self.rotate_pixels.1 += dy;
            }
            Drag::Pan => {
                self.pan_pixels.0 += dx;
                self.pan_pixels.1 += dy;
            }
            Drag::None => return false,
        }
        true
    }

    /// Positive values scroll up and move the camera closer.
    pub fn handle_scroll(&mut self, delta: f32) {
        let step = 0.95f32.powf(self.zoom_speed);
        if delta > 0.0 {
            self.zoom_scale *= step;
        } else if delta < 0.0 {
            self.zoom_scale /= step;
        }
    }

    /// Requests a rotation in radians, as if dragged.
    pub fn rotate(&mut self, azimuth: Rad<f32>, polar: Rad<f32>) {
        self.azimuth_delta += azimuth.0;
        self.polar_delta += polar.0;
    }

    /// Whether any requested motion is still being applied.
    pub fn is_settled(&self) -> bool {
        const REST: f32 = 1e-6;
        self.rotate_pixels == (0.0, 0.0)
            && self.pan_pixels == (0.0, 0.0)
            && self.zoom_scale == 1.0
            && self.azimuth_delta.abs() < REST
            && self.polar_delta.abs() < REST
            && self.pan_offset.magnitude() < REST
    }

    pub fn update(
        &mut self,
        camera: &mut OrbitCamera,
        projection: &Projection,
        viewport_height: u32,
        dt: Duration,
    ) {
        let height = viewport_height.max(1) as f32;

        let (dx, dy) = std::mem::take(&mut self.rotate_pixels);
        self.azimuth_delta -= 2.0 * PI * dx * self.rotate_speed / height;
        self.polar_delta -= 2.0 * PI * dy * self.rotate_speed / height;

        let (px, py) = std::mem::take(&mut self.pan_pixels);
        if px != 0.0 || py != 0.0 {
            let target_distance = camera.distance * (projection.fovy.0 / 2.0).tan();
            let scale = 2.0 * target_distance * self.pan_speed / height;
            self.pan_offset += camera.right() * (-px * scale) + camera.up() * (py * scale);
        }

        let factor = if self.enable_damping {
            1.0 - (1.0 - self.damping_factor.clamp(0.0, 1.0)).powf(dt.as_secs_f32() * REFERENCE_FPS)
        } else {
            1.0
        };

        camera.azimuth += Rad(self.azimuth_delta * factor);
        let min_polar = self.min_polar.0.max(POLAR_EPSILON);
        let max_polar = self.max_polar.0.min(PI - POLAR_EPSILON);
        camera.polar = Rad((camera.polar.0 + self.polar_delta * factor).clamp(min_polar, max_polar));

        camera.distance = (camera.distance * self.zoom_scale).clamp(self.min_distance, self.max_distance);
        self.zoom_scale = 1.0;

        camera.target += self.pan_offset * factor;

        let remaining = 1.0 - factor;
        self.azimuth_delta *= remaining;
        self.polar_delta *= remaining;
        self.pan_offset *= remaining;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    // billboards span their quads along these axes
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            camera_right: [1.0, 0.0, 0.0, 0.0],
            camera_up: [0.0, 1.0, 0.0, 0.0],
        }
    }

    pub fn update_view_proj(&mut self, camera: &OrbitCamera, projection: &Projection) {
        self.view_position = camera.position().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
        self.camera_right = camera.right().extend(0.0).into();
        self.camera_up = camera.up().extend(0.0).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera state together with the GPU resources it is uploaded through.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: OrbitCamera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        camera: OrbitCamera,
        controller: OrbitController,
        projection: &Projection,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Recomputes the uniform and uploads it.
    pub fn write(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::Deg;

    use super::*;

    const FRAME: Duration = Duration::from_micros(16_667);

    fn start() -> (OrbitCamera, Projection) {
        let camera = OrbitCamera::from_position(Point3::new(0.0, 10.0, 30.0), Point3::new(0.0, 0.0, 0.0));
        let projection = Projection::new(800, 600, Deg(75.0), 0.1, 1000.0);
        (camera, projection)
    }

    #[test]
    fn spherical_round_trip_keeps_the_eye_in_place() {
        let (camera, _) = start();
        let eye = camera.position();
        assert_relative_eq!(eye.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(eye.y, 10.0, epsilon = 1e-4);
        assert_relative_eq!(eye.z, 30.0, epsilon = 1e-4);
        assert_relative_eq!(camera.azimuth.0, 0.0);
    }

    #[test]
    fn view_axes_are_orthonormal() {
        let (camera, _) = start();
        let right = camera.right();
        let up = camera.up();
        assert_relative_eq!(right.magnitude(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(up.magnitude(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(right.dot(up), 0.0, epsilon = 1e-5);
        assert_relative_eq!(right.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn resize_changes_the_aspect() {
        let (_, mut projection) = start();
        projection.resize(1920, 1080);
        assert_relative_eq!(projection.aspect(), 1920.0 / 1080.0);
    }

    #[test]
    fn damped_rotation_converges_to_the_request() {
        let (mut camera, projection) = start();
        let mut controller = OrbitController::new(1.0, 1.0, 1.0, 0.05);
        controller.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        controller.handle_cursor_moved(PhysicalPosition::new(100.0, 100.0));
        controller.handle_cursor_moved(PhysicalPosition::new(160.0, 100.0));
        controller.handle_mouse_input(MouseButton::Left, ElementState::Released);

        let requested = -2.0 * PI * 60.0 / 600.0;
        let mut previous_gap = f32::INFINITY;
        for _ in 0..600 {
            controller.update(&mut camera, &projection, 600, FRAME);
            let gap = (requested - camera.azimuth.0).abs();
            assert!(gap <= previous_gap);
            previous_gap = gap;
        }
        assert_relative_eq!(camera.azimuth.0, requested, epsilon = 1e-4);
        assert!(controller.is_settled());
    }

    #[test]
    fn damping_does_not_depend_on_the_frame_rate() {
        let (mut a, projection) = start();
        let mut b = a.clone();
        let mut ca = OrbitController::new(1.0, 1.0, 1.0, 0.05);
        let mut cb = ca.clone();
        ca.rotate(Rad(1.0), Rad(0.0));
        cb.rotate(Rad(1.0), Rad(0.0));

        for _ in 0..60 {
            ca.update(&mut a, &projection, 600, FRAME);
        }
        for _ in 0..30 {
            cb.update(&mut b, &projection, 600, FRAME * 2);
        }
        assert_relative_eq!(a.azimuth.0, b.azimuth.0, epsilon = 1e-3);
    }

    #[test]
    fn polar_angle_stays_off_the_poles() {
        let (mut camera, projection) = start();
        let mut controller = OrbitController::new(1.0, 1.0, 1.0, 0.0);
        controller.rotate(Rad(0.0), Rad(-10.0));
        controller.update(&mut camera, &projection, 600, FRAME);
        assert!(camera.polar.0 > 0.0);
        controller.rotate(Rad(0.0), Rad(20.0));
        controller.update(&mut camera, &projection, 600, FRAME);
        assert!(camera.polar.0 < PI);
    }

    #[test]
    fn scrolling_up_moves_closer_without_damping() {
        let (mut camera, projection) = start();
        let before = camera.distance;
        let mut controller = OrbitController::new(1.0, 1.0, 1.0, 0.05);
        controller.handle_scroll(1.0);
        controller.update(&mut camera, &projection, 600, FRAME);
        assert_relative_eq!(camera.distance, before * 0.95, epsilon = 1e-4);
        controller.handle_scroll(-1.0);
        controller.update(&mut camera, &projection, 600, FRAME);
        assert_relative_eq!(camera.distance, before, epsilon = 1e-4);
    }

    #[test]
    fn right_drag_pans_the_target_sideways() {
        let (mut camera, projection) = start();
        let mut controller = OrbitController::new(1.0, 1.0, 1.0, 0.0);
        controller.handle_mouse_input(MouseButton::Right, ElementState::Pressed);
        controller.handle_cursor_moved(PhysicalPosition::new(300.0, 300.0));
        controller.handle_cursor_moved(PhysicalPosition::new(350.0, 300.0));
        controller.update(&mut camera, &projection, 600, FRAME);
        // dragging right moves the scene right, i.e. the target left
        assert!(camera.target.x < 0.0);
        assert_relative_eq!(camera.target.y, 0.0, epsilon = 1e-5);
    }
}
