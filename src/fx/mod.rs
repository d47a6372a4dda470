//! # Shader Effects Module
//!
//! CPU-side state and reference math for the procedural materials:
//!
//! - [`holographic`] - the time-driven holographic effect (rim highlight,
//!   scanline line-work, additive blend policy)
//! - [`gradient`] - the vertical background gradient
//!
//! The GPU shaders in `gfx/rendering` mirror the math defined here; the
//! functions in this module exist so the effect contracts can be tested
//! without a device.

pub mod gradient;
pub mod holographic;

pub use gradient::{GradientColors, GradientUniform};
pub use holographic::{HolographicParams, HolographicUniform, LINE_WORK_MAX, LINE_WORK_MIN};
