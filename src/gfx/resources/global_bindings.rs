//! Global uniform bindings for camera and time
//!
//! One uniform buffer and bind group carry the per-frame state every
//! pipeline shares: camera matrices and the session clock. Bound to slot 0
//! in all mesh pipelines.

use crate::{
    gfx::camera::camera_utils::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content.
///
/// Must match the `Globals` struct in the shaders exactly. Time lives in a
/// vec4 so the struct needs no trailing padding under WGSL layout rules;
/// only the x component carries data.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view: [[f32; 4]; 4],
    view_proj: [[f32; 4]; 4],
    time: [f32; 4],
}

pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Refreshes the global uniform buffer with this frame's camera state and
/// elapsed session time.
pub fn update_global_ubo(
    ubo: &GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    elapsed: f32,
) {
    ubo.update_content(
        queue,
        GlobalUBOContent {
            view_position: camera.view_position,
            view: camera.view,
            view_proj: camera.view_proj,
            time: [elapsed, 0.0, 0.0, 0.0],
        },
    );
}

/// Bind group layout and bind group for the global uniforms.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    /// Must be called once, after the uniform buffer exists and before the
    /// first frame.
    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}
