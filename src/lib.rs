//! campus-walk
//!
//! A small campus rendered with wgpu on native windows and in the browser:
//! a grass field, three roads, four labeled buildings and a stick figure
//! that walks a fixed tour between the building entrances while the user
//! orbits, pans and zooms the camera.
//!
//! High-level modules
//! - `camera`: orbit camera, projection, damped orbit controls and uniforms
//! - `campus`: assembly of the campus scene and its walking tour
//! - `config`: startup settings with the stock scene as default
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene graph, transforms, materials, vertices and textures
//! - `flow`: the winit event loop and per-frame update order
//! - `pipelines`: render pipelines for flat meshes and label billboards
//! - `resources`: primitive geometry, label bitmaps and tweens
//! - `render`: GPU copies of the scene and pipeline batching
//!

pub mod camera;
pub mod campus;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use campus::Campus;
pub use config::CampusConfig;
pub use flow::run;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    run(CampusConfig::default()).map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{:#}", e)))
}
