//! Background gradient state
//!
//! The scene background is a vertical two-color gradient drawn as a
//! fullscreen pass before any geometry. Colors are live-tunable from the
//! control panel.

/// Top and bottom colors of the background gradient, linear RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientColors {
    pub top: [f32; 3],
    pub bottom: [f32; 3],
}

impl Default for GradientColors {
    fn default() -> Self {
        // Black fading into a dark olive.
        Self {
            top: [0.0, 0.0, 0.0],
            bottom: [0.275, 0.302, 0.0],
        }
    }
}

impl GradientColors {
    pub fn to_uniform(&self) -> GradientUniform {
        GradientUniform {
            top: [self.top[0], self.top[1], self.top[2], 1.0],
            bottom: [self.bottom[0], self.bottom[1], self.bottom[2], 1.0],
        }
    }
}

/// GPU uniform data for the gradient pass.
///
/// Must match the `Gradient` struct in `gradient.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GradientUniform {
    pub top: [f32; 4],
    pub bottom: [f32; 4],
}
