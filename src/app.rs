//! Application shell
//!
//! [`HoloApp`] owns the winit event loop and glues the pieces together:
//! models are registered before the window exists, load in the background,
//! and join the scene as their results drain in at the start of each frame.

use std::sync::Arc;

use cgmath::Vector3;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::{
    gfx::{
        camera::{CameraController, CameraManager, OrbitCamera},
        rendering::RenderEngine,
    },
    loader::AssetLoader,
    material::PROCEDURAL_STYLES,
    scene::{Placement, Scene, TargetId},
    ui::{panel, UiManager},
};

/// Per-frame UI callback, run with mutable scene and camera access before
/// rendering.
pub type UiCallback = Box<dyn FnMut(&imgui::Ui, &mut Scene, &mut OrbitCamera)>;

pub struct HoloApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    camera_manager: CameraManager,
    loader: AssetLoader,
    ui_callback: UiCallback,
}

impl Default for HoloApp {
    fn default() -> Self {
        Self::new()
    }
}

impl HoloApp {
    /// Creates the application with the default orbit camera and control
    /// panel.
    pub fn new() -> Self {
        let _ = env_logger::try_init();

        let event_loop = EventLoop::new().expect("Failed to create event loop");

        let mut camera = OrbitCamera::new(12.0, 0.35, 0.8, Vector3::new(0.0, 0.5, 0.0), 1.0);
        camera.bounds.min_distance = Some(2.0);
        let controller = CameraController::new(0.005, 0.4);
        let camera_manager = CameraManager::new(camera, controller);

        Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                ui_manager: None,
                scene: Scene::new(PROCEDURAL_STYLES),
                camera_manager,
                loader: AssetLoader::new(),
                ui_callback: Box::new(panel::control_panel),
            },
        }
    }

    /// Registers a model and starts loading it in the background.
    pub fn add_model(&mut self, path: &str, placement: Placement) -> TargetId {
        let name = model_name(path);
        let id = self.app_state.scene.add_target(&name, placement);
        self.app_state.loader.request(id, path);
        id
    }

    /// Like [`HoloApp::add_model`], but nodes whose name matches `exclude`
    /// keep their baked material when a selection is applied.
    pub fn add_model_with_exclusion(
        &mut self,
        path: &str,
        placement: Placement,
        exclude: impl Fn(&str) -> bool + Send + 'static,
    ) -> TargetId {
        let name = model_name(path);
        let id = self
            .app_state
            .scene
            .add_target_with_exclusion(&name, placement, exclude);
        self.app_state.loader.request(id, path);
        id
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.app_state.scene
    }

    /// Replaces the default control panel.
    pub fn set_ui<F>(&mut self, ui_fn: F)
    where
        F: FnMut(&imgui::Ui, &mut Scene, &mut OrbitCamera) + 'static,
    {
        self.app_state.ui_callback = Box::new(ui_fn);
    }

    /// Consumes the app and runs the event loop until exit.
    pub fn run(mut self) {
        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .expect("Failed to run event loop");
    }
}

fn model_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

impl AppState {
    /// Folds finished loads into the scene. Called at the top of every
    /// frame, on the render thread, so scene mutation stays single-writer.
    fn drain_loader(&mut self) {
        for event in self.loader.drain() {
            match event.result {
                Ok(nodes) => self.scene.complete_load(event.target, nodes),
                Err(e) => {
                    log::error!(
                        "failed to load '{}': {}",
                        self.scene
                            .registry()
                            .name(event.target)
                            .unwrap_or("<unknown>"),
                        e
                    );
                    self.scene.fail_load(event.target);
                }
            }
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Ok(window) = event_loop.create_window(
            WindowAttributes::default()
                .with_title("holoscene")
                .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
        ) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let (width, height) = window_handle.inner_size().into();
            self.camera_manager.camera.resize_projection(width, height);

            let window_clone = window_handle.clone();
            let renderer = pollster::block_on(async move {
                RenderEngine::new(window_clone, width, height).await
            });

            let mut ui_manager = UiManager::new(
                renderer.device(),
                renderer.queue(),
                renderer.surface_format(),
                &window_handle,
            );
            ui_manager.update_display_size(width, height);

            self.ui_manager = Some(ui_manager);
            self.render_engine = Some(renderer);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(window, &ui_event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if matches!(
                    event.physical_key,
                    winit::keyboard::PhysicalKey::Code(winit::keyboard::KeyCode::Escape)
                ) {
                    event_loop.exit();
                }
                self.camera_manager.process_keyboard_event(&event);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.camera_manager.camera.resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.drain_loader();
                self.scene.tick();

                let Some(render_engine) = self.render_engine.as_mut() else {
                    return;
                };

                {
                    let layouts = render_engine.object_layouts();
                    self.scene.registry_mut().prepare_gpu_resources(
                        render_engine.device(),
                        render_engine.queue(),
                        layouts,
                    );
                }

                // UI logic runs before the render pass so the panel can
                // still mutate materials and visibility this frame.
                if let (Some(ui_manager), Some(window)) =
                    (self.ui_manager.as_mut(), self.window.as_ref())
                {
                    let scene = &mut self.scene;
                    let camera = &mut self.camera_manager.camera;
                    let ui_callback = &mut self.ui_callback;
                    ui_manager.update_logic(window, |ui| {
                        ui_callback(ui, scene, camera);
                    });
                }

                self.camera_manager.camera.update_view_proj();
                render_engine.update_frame_state(&self.scene, self.camera_manager.camera.uniform);

                let ui_manager = self.ui_manager.as_mut();
                render_engine.render_frame(
                    &self.scene,
                    ui_manager.map(|ui_manager| {
                        move |device: &wgpu::Device,
                              queue: &wgpu::Queue,
                              encoder: &mut wgpu::CommandEncoder,
                              color_attachment: &wgpu::TextureView| {
                            ui_manager.render_display_only(
                                device,
                                queue,
                                encoder,
                                color_attachment,
                            );
                        }
                    }),
                );
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        if let Some(ui_manager) = self.ui_manager.as_ref() {
            let io = ui_manager.context.io();
            if io.want_capture_mouse || io.want_capture_keyboard {
                return;
            }
        }

        self.camera_manager.process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
