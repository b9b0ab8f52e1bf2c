//! Engine data structures: nodes, transforms, materials and textures.
//!
//! - `instance` holds per-node transformation data and its GPU layout
//! - `material` contains the shared flat-colour material table
//! - `model` contains vertex layouts and mesh draw helpers
//! - `scene_graph` enables hierarchical scene organization
//! - `texture` contains GPU texture wrapper and creation utilities

pub mod instance;
pub mod material;
pub mod model;
pub mod scene_graph;
pub mod texture;
