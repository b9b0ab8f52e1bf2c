//! Application event loop.
//!
//! [`App`] is the winit [`ApplicationHandler`]. The GPU context and the
//! campus are created when the application is resumed: on native targets
//! the async setup is driven to completion on a tokio runtime, on the web
//! it is spawned and handed back through an [`EventLoopProxy`] user event.
//!
//! # Frame order
//!
//! Every `RedrawRequested` runs, in order:
//! 1. advance the walking tour by the frame delta
//! 2. apply pending orbit input to the camera and upload it
//! 3. write the refreshed world transforms to the GPU
//! 4. draw meshes, then labels, and present
//! 5. request the next redraw

use std::sync::Arc;

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{campus::Campus, config::CampusConfig, context::Context, render::GpuScene};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Everything that exists once the GPU is up.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    pub(crate) campus: Campus,
    pub(crate) scene: GpuScene,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: CampusConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, &config).await?;
        let campus = Campus::build(&config)?;
        let scene = GpuScene::new(&ctx, &campus.graph)?;
        log::info!(
            "Uploaded {} meshes and {} labels",
            scene.mesh_count(),
            scene.sprite_count()
        );
        Ok(Self {
            ctx,
            campus,
            scene,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn update(&mut self, dt: Duration) -> anyhow::Result<()> {
        self.campus.tick(dt)?;
        self.ctx.update_camera(dt);
        self.scene.write_to_buffers(&self.ctx.queue, &self.campus.graph)?;
        Ok(())
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }
        self.ctx.render(&self.scene)
    }

    fn request_redraw(&self) {
        if let Some(window) = self.ctx.window() {
            window.request_redraw();
        }
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized(Box<AppState>),
    #[allow(dead_code)]
    Failed(anyhow::Error),
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: EventLoopProxy<FlowEvent>,
    config: CampusConfig,
    state: Option<AppState>,
    error: Option<anyhow::Error>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: CampusConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            config,
            state: None,
            error: None,
            last_time: Instant::now(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("App initialization failed: {:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn on_initialized(&mut self, mut state: AppState) {
        let size = state.ctx.window().map(|w| w.inner_size());
        if let Some(size) = size {
            state.resize(size.width, size.height);
        }
        state.request_redraw();
        self.last_time = Instant::now();
        self.state = Some(state);
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(self.config.title.clone());

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let init_future = AppState::new(window, self.config.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(state) => self.on_initialized(state),
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(state) => FlowEvent::Initialized(Box::new(state)),
                    Err(e) => FlowEvent::Failed(e),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before initialization finished");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            FlowEvent::Initialized(state) => self.on_initialized(*state),
            FlowEvent::Failed(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                if let Err(e) = state.update(dt) {
                    log::error!("Unable to update the scene: {}", e);
                }
                match state.render() {
                    Ok(_) => (),
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(size) = state.ctx.window().map(|w| w.inner_size()) {
                            state.resize(size.width, size.height);
                        }
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
                state.request_redraw();
            }
            _ => {}
        }
    }
}

/// Opens the campus in a window (or the `canvas` element on the web) and
/// runs until it is closed.
pub fn run(config: CampusConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
