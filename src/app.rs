use crate::{
    config::ViewerConfig,
    core::{FpsCounter, Timer},
    input::InputState,
    mesh::{load_mesh, MeshPackage},
    renderer::MeshRenderer,
    scene::FlyCamera,
};
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    raw_window_handle::HasWindowHandle,
    window::{CursorGrabMode, Window, WindowAttributes, WindowId},
};

pub struct App {
    config: ViewerConfig,
    mesh: MeshPackage,
    window: Option<Window>,
    renderer: Option<MeshRenderer>,
    camera: FlyCamera,
    timer: Timer,
    fps_counter: FpsCounter,
    input_state: InputState,
    cursor_captured: bool,
}

impl App {
    pub fn new(config: ViewerConfig, mesh: MeshPackage) -> Self {
        let aspect_ratio = config.window.width as f32 / config.window.height.max(1) as f32;
        let camera = FlyCamera::from_config(&config.camera, aspect_ratio);
        Self {
            config,
            mesh,
            window: None,
            renderer: None,
            camera,
            timer: Timer::new(),
            fps_counter: FpsCounter::new(),
            input_state: InputState::new(),
            cursor_captured: false,
        }
    }

    /// Imports the configured mesh and runs the viewer until the window closes.
    pub fn run(config: ViewerConfig) -> Result<(), Box<dyn std::error::Error>> {
        let mesh = load_mesh(&config.mesh_path).map_err(|e| {
            error!("Failed to import {}: {e}", config.mesh_path.display());
            e
        })?;
        info!(
            "Imported {}: {} vertices, {} triangles, {} materials",
            config.mesh_path.display(),
            mesh.vertices().len(),
            mesh.triangle_count(),
            mesh.materials().len()
        );

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(config, mesh);
        event_loop.run_app(&mut app)?;
        Ok(())
    }

    fn set_cursor_captured(&mut self, captured: bool) {
        let Some(window) = &self.window else {
            return;
        };

        if captured {
            if let Err(e) = window.set_cursor_grab(CursorGrabMode::Locked) {
                info!("Failed to lock cursor: {e}, trying confined mode");
                if let Err(e) = window.set_cursor_grab(CursorGrabMode::Confined) {
                    warn!("Failed to confine cursor: {e}");
                }
            }
        } else if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
            warn!("Failed to release cursor: {e}");
        }
        window.set_cursor_visible(!captured);
        self.cursor_captured = captured;
    }

    fn window_title(&self, fps: f32) -> String {
        let name = self
            .config
            .mesh_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{} - {name} - {} FPS", self.config.window.title, fps as u32)
    }

    fn redraw(&mut self) {
        let delta = self.timer.delta();

        if self.input_state.key_pressed(KeyCode::Tab) {
            self.set_cursor_captured(!self.cursor_captured);
        }

        self.camera
            .update(&self.input_state, delta, self.cursor_captured);

        if let Some(fps) = self.fps_counter.update(delta) {
            let title = self.window_title(fps);
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
        }

        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.render(&self.camera, self.timer.elapsed()) {
                error!("Render error: {e}");
            }
        }

        self.input_state.end_frame();

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => window,
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        info!("Window created successfully");

        let handle = match window.window_handle() {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to get window handle: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        match MeshRenderer::new(
            handle.as_raw(),
            size.width,
            size.height,
            &self.mesh,
            &self.config.material,
        ) {
            Ok(renderer) => {
                self.camera
                    .set_aspect_ratio(size.width as f32 / size.height.max(1) as f32);
                self.renderer = Some(renderer);
                info!("Renderer initialized successfully");
            }
            Err(e) => {
                error!("Failed to create renderer: {e}");
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
        self.window = Some(window);
        self.set_cursor_captured(true);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(renderer) = &mut self.renderer {
                        renderer.update_drawable_size(size.width, size.height);
                    }
                    self.camera
                        .set_aspect_ratio(size.width as f32 / size.height as f32);
                    info!("Window resized to {}x{}", size.width, size.height);
                }
            }
            WindowEvent::Focused(false) => {
                self.input_state.clear();
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.input_state.set_modifiers(modifiers.state());
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => match (code, state) {
                (KeyCode::Escape, ElementState::Pressed) => {
                    info!("Escape pressed, exiting");
                    event_loop.exit();
                }
                (_, ElementState::Pressed) if !repeat => self.input_state.key_down(code),
                (_, ElementState::Released) => self.input_state.key_up(code),
                _ => {}
            },
            WindowEvent::MouseInput { state, button, .. } => {
                match state {
                    ElementState::Pressed => self.input_state.mouse_down(button),
                    ElementState::Released => self.input_state.mouse_up(button),
                }
                if button == MouseButton::Left
                    && state == ElementState::Pressed
                    && !self.cursor_captured
                {
                    self.set_cursor_captured(true);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input_state
                    .set_mouse_position(position.x as f32, position.y as f32);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.input_state.add_mouse_motion(dx as f32, dy as f32);
        }
    }
}
