/**
 * This module contains everything that produces drawable data: primitive
 * geometry, its GPU upload, label bitmaps and the tweens that move nodes.
 */
pub mod animation;
pub mod geometry;
pub mod label;
pub mod mesh;
