//! Graphics layer
//!
//! Camera, GPU resources, and the render engine. Everything that talks to
//! wgpu directly lives here; scene state stays device-free in [`crate::scene`].

pub mod camera;
pub mod rendering;
pub mod resources;

pub use camera::{CameraController, CameraManager, OrbitCamera};
pub use rendering::RenderEngine;
