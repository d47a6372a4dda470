//! holoscene
//!
//! A single-scene holographic model viewer built on wgpu and winit. Models
//! load asynchronously into a fixed scene and render with a switchable
//! material: a time-driven holographic shader or one of several matcaps,
//! over a vertical gradient background.

pub mod app;
pub mod fx;
pub mod gfx;
pub mod loader;
pub mod material;
pub mod scene;
pub mod ui;
pub mod wgpu_utils;

pub use app::HoloApp;
pub use scene::{Placement, Scene, TargetId};

/// Creates a viewer with the default camera and control panel.
pub fn default() -> HoloApp {
    HoloApp::new()
}
