//! WGPU-based rendering engine
//!
//! Owns the surface, device, and every GPU resource the viewer needs, and
//! draws one frame as a single render pass: background gradient first, then
//! opaque baked and matcap nodes with depth writes, then the additive
//! holographic nodes with depth writes off, and finally the UI overlay.

use std::sync::Arc;
use wgpu::TextureFormat;

use crate::{
    fx::{self, GradientUniform, HolographicUniform},
    gfx::{
        camera::camera_utils::CameraUniform,
        resources::{
            global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
            texture_resource::TextureResource,
        },
    },
    material::{MatcapLibrary, NodeMaterial},
    scene::{DrawMesh, ObjectLayouts, Scene},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};

pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,

    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,

    holo_ubo: UniformBuffer<HolographicUniform>,
    holo_bind_group: wgpu::BindGroup,
    gradient_ubo: UniformBuffer<GradientUniform>,
    gradient_bind_group: wgpu::BindGroup,

    matcaps: MatcapLibrary,
    object_layouts: ObjectLayouts,
}

impl RenderEngine {
    /// Creates a render engine for the given window.
    ///
    /// # Panics
    /// Panics if no wgpu adapter or device is available; the viewer cannot
    /// run without one.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> RenderEngine {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to request adapter!");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("Failed to request a device!");

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let object_layouts = ObjectLayouts::new(&device);

        // Holographic effect parameters, shared by every holographic node.
        let holo_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .create(&device, "Holographic Bind Group");
        let holo_ubo = UniformBuffer::<HolographicUniform>::new(&device);
        let holo_bind_group = BindGroupBuilder::new(&holo_layout)
            .resource(holo_ubo.binding_resource())
            .create(&device, "Holographic Bind Group");

        // Background gradient, drawn as a fullscreen triangle.
        let gradient_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .create(&device, "Gradient Bind Group");
        let gradient_ubo = UniformBuffer::<GradientUniform>::new(&device);
        let gradient_bind_group = BindGroupBuilder::new(&gradient_layout)
            .resource(gradient_ubo.binding_resource())
            .create(&device, "Gradient Bind Group");

        let matcaps = MatcapLibrary::procedural(&device, &queue);

        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("gradient", include_str!("gradient.wgsl"));
        pipeline_manager.load_shader("baked", include_str!("baked.wgsl"));
        pipeline_manager.load_shader("matcap", include_str!("matcap.wgsl"));
        pipeline_manager.load_shader("holographic", include_str!("holographic.wgsl"));

        let depth_format = TextureResource::DEPTH_FORMAT;

        pipeline_manager.register_pipeline(
            "Gradient",
            PipelineConfig::new("gradient", format)
                .with_label("Gradient Pipeline")
                .with_bind_group_layouts(vec![gradient_layout.layout.clone()])
                .with_cull_mode(None)
                // The fullscreen triangle sits at depth 1.0, the clear value.
                .with_depth(depth_format, false)
                .with_depth_compare(wgpu::CompareFunction::LessEqual)
                .with_no_vertex_buffers(),
        );

        pipeline_manager.register_pipeline(
            "Baked",
            PipelineConfig::new("baked", format)
                .with_label("Baked Pipeline")
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    object_layouts.transform.layout.clone(),
                    object_layouts.baked.layout.clone(),
                ])
                .with_depth(depth_format, true),
        );

        pipeline_manager.register_pipeline(
            "Matcap",
            PipelineConfig::new("matcap", format)
                .with_label("Matcap Pipeline")
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    object_layouts.transform.layout.clone(),
                    matcaps.bind_group_layout().clone(),
                ])
                .with_depth(depth_format, true),
        );

        // Both faces glow, so no culling; additive blending with depth
        // writes off keeps overlapping stripes from occluding each other.
        pipeline_manager.register_pipeline(
            "Holographic",
            PipelineConfig::new("holographic", format)
                .with_label("Holographic Pipeline")
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    object_layouts.transform.layout.clone(),
                    holo_layout.layout.clone(),
                ])
                .with_cull_mode(None)
                .with_blend(fx::holographic::blend_state())
                .with_depth(depth_format, fx::holographic::DEPTH_WRITE_ENABLED),
        );

        RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            holo_ubo,
            holo_bind_group,
            gradient_ubo,
            gradient_bind_group,
            matcaps,
            object_layouts,
        }
    }

    /// Pushes this frame's camera, clock, and effect state to the GPU.
    pub fn update_frame_state(&self, scene: &Scene, camera_uniform: CameraUniform) {
        update_global_ubo(&self.global_ubo, &self.queue, camera_uniform, scene.elapsed());
        self.holo_ubo
            .update_content(&self.queue, scene.holographic.to_uniform());
        self.gradient_ubo
            .update_content(&self.queue, scene.gradient.to_uniform());
    }

    /// Renders one frame with an optional UI overlay.
    pub fn render_frame<F>(&mut self, scene: &Scene, ui_callback: Option<F>)
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                log::error!("failed to acquire surface texture: {}", e);
                return;
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            // Background first: fullscreen triangle, no vertex buffers.
            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Gradient") {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.gradient_bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            // Opaque nodes, grouped by pipeline to limit state changes.
            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Baked") {
                render_pass.set_pipeline(pipeline);
                for (object, node) in visible_nodes(scene) {
                    if node.material != NodeMaterial::Baked {
                        continue;
                    }
                    let (Some(transform), Some(baked)) =
                        (object.transform_bind_group(), node.baked_bind_group())
                    else {
                        continue;
                    };
                    render_pass.set_bind_group(1, transform, &[]);
                    render_pass.set_bind_group(2, baked, &[]);
                    render_pass.draw_mesh(&node.mesh);
                }
            }

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Matcap") {
                render_pass.set_pipeline(pipeline);
                for (object, node) in visible_nodes(scene) {
                    let NodeMaterial::Matcap(index) = node.material else {
                        continue;
                    };
                    let Some(transform) = object.transform_bind_group() else {
                        continue;
                    };
                    render_pass.set_bind_group(1, transform, &[]);
                    render_pass.set_bind_group(2, self.matcaps.bind_group(index), &[]);
                    render_pass.draw_mesh(&node.mesh);
                }
            }

            // Holographic last so the additive glow layers over everything
            // already in the frame.
            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Holographic") {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(2, &self.holo_bind_group, &[]);
                for (object, node) in visible_nodes(scene) {
                    if node.material != NodeMaterial::Holographic {
                        continue;
                    }
                    let Some(transform) = object.transform_bind_group() else {
                        continue;
                    };
                    render_pass.set_bind_group(1, transform, &[]);
                    render_pass.draw_mesh(&node.mesh);
                }
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Resizes the surface and recreates the depth buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn object_layouts(&self) -> &ObjectLayouts {
        &self.object_layouts
    }

    pub fn matcap_count(&self) -> usize {
        self.matcaps.count()
    }
}

/// Nodes of every visible loaded object, flattened for pipeline-grouped
/// drawing.
fn visible_nodes(scene: &Scene) -> impl Iterator<Item = (&crate::scene::Object, &crate::scene::MeshNode)> {
    scene
        .registry()
        .loaded_objects()
        .filter(|object| object.visible)
        .flat_map(|object| object.nodes.iter().map(move |node| (object, node)))
}
