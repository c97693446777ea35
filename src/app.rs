//! Window shell: winit event handling around the viewer
//!
//! Startup happens in two phases. `resumed` creates the window and the
//! Vulkan backend; only then is the first model requested, and its decode
//! runs on the background loader.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use aina_render::VulkanBackend;
use aina_viewer::{LoadRequest, ModelLoader, PendingLoad, PointerInput, Viewer};
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalPosition, LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId, WindowLevel};

use crate::settings::{Settings, DEFAULT_MODEL_PATH};

/// Height of the invisible strip at the top that drags the window
const DRAG_AREA_HEIGHT: f64 = 20.0;

/// How often a pending background load is polled
const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(16);

pub struct AinaApp {
    settings: Settings,
    settings_path: Option<PathBuf>,
    startup_request: Option<LoadRequest>,
    window: Option<Arc<Window>>,
    viewer: Option<Viewer<VulkanBackend>>,
    loader: Option<ModelLoader>,
    pending: Option<PendingLoad>,
    input: PointerInput,
    cursor_y: f64,
}

impl AinaApp {
    pub fn new(settings: Settings, settings_path: Option<PathBuf>, startup_request: LoadRequest) -> Self {
        let loader = match ModelLoader::new() {
            Ok(loader) => Some(loader),
            Err(e) => {
                warn!("{}; models will load on the render thread", e);
                None
            }
        };

        Self {
            settings,
            settings_path,
            startup_request: Some(startup_request),
            window: None,
            viewer: None,
            loader,
            pending: None,
            input: PointerInput::new(),
            cursor_y: 0.0,
        }
    }

    fn start_load(&mut self, request: LoadRequest) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        match &self.loader {
            Some(loader) => {
                viewer.begin_loading();
                if self.pending.replace(loader.load(request)).is_some() {
                    info!("Superseding an unfinished model load");
                }
            }
            None => {
                if let Err(e) = viewer.load(request) {
                    warn!("Model load failed: {}", e);
                }
            }
        }
    }

    fn poll_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let Some(decoded) = pending.try_recv() else {
            self.pending = Some(pending);
            return;
        };
        if let Some(viewer) = self.viewer.as_mut() {
            if let Err(e) = viewer.apply_loaded(pending.into_request(), decoded) {
                warn!("Model load failed: {}", e);
            }
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        if code == KeyCode::KeyR {
            info!("Restoring default model");
            self.start_load(LoadRequest::new(DEFAULT_MODEL_PATH).all_visible());
            return;
        }
        if code == KeyCode::Escape {
            self.shutdown(event_loop);
            return;
        }

        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        match code {
            KeyCode::KeyW => viewer.toggle_wireframe(),
            KeyCode::KeyP => viewer.toggle_points(),
            _ => {
                if let Some(id) = digit_part(code) {
                    if let Some(visible) = viewer.toggle_part(id) {
                        info!("Part {} is now {}", id, if visible { "visible" } else { "hidden" });
                    }
                }
            }
        }
    }

    fn keep_on_screen(&self, position: PhysicalPosition<i32>) {
        if self.settings.allow_overflow {
            return;
        }
        let Some(window) = &self.window else {
            return;
        };
        let Some(monitor) = window.current_monitor() else {
            return;
        };

        let clamped = clamp_to_monitor(position, window.outer_size(), monitor.position(), monitor.size());
        if clamped != position {
            window.set_outer_position(clamped);
        }
    }

    fn render(&mut self) {
        let (Some(window), Some(viewer)) = (&self.window, self.viewer.as_mut()) else {
            return;
        };
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }

        let aspect = size.width as f32 / size.height as f32;
        if let Err(e) = viewer.render(aspect) {
            error!("Frame failed: {}", e);
        }
    }

    fn save_settings(&mut self) {
        if let Some(window) = &self.window {
            let scale = window.scale_factor();
            let size: LogicalSize<u32> = window.inner_size().to_logical(scale);
            self.settings.width = size.width;
            self.settings.height = size.height;
            if let Ok(position) = window.outer_position() {
                let position: LogicalPosition<i32> = position.to_logical(scale);
                self.settings.pos_x = Some(position.x);
                self.settings.pos_y = Some(position.y);
            }
        }
        if let Some(viewer) = &self.viewer {
            if let Some(path) = viewer.loaded_path() {
                self.settings.model_path = path.to_path_buf();
                self.settings.part_visibility = viewer.visibility().clone();
            }
        }

        let Some(path) = &self.settings_path else {
            warn!("Could not determine config directory; settings not saved");
            return;
        };
        if let Err(e) = self.settings.save(path) {
            warn!("Failed to save settings: {}", e);
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        info!("Shutting down");
        self.save_settings();
        self.pending = None;
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.clear();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for AinaApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut attributes = Window::default_attributes()
            .with_title("AINA")
            .with_inner_size(LogicalSize::new(self.settings.width, self.settings.height))
            .with_decorations(false)
            .with_transparent(true)
            .with_window_level(WindowLevel::AlwaysOnTop);
        if let (Some(x), Some(y)) = (self.settings.pos_x, self.settings.pos_y) {
            attributes = attributes.with_position(LogicalPosition::new(x, y));
        }

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        if self.settings.pos_x.is_none() || self.settings.pos_y.is_none() {
            if let Some(monitor) = event_loop.primary_monitor() {
                window.set_outer_position(default_position(monitor.position(), monitor.size()));
            }
        }

        let backend = match VulkanBackend::new(event_loop, window.clone()) {
            Ok(backend) => backend,
            Err(e) => {
                error!("Fatal renderer error: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.viewer = Some(Viewer::new(backend));
        self.window = Some(window.clone());

        if let Some(request) = self.startup_request.take() {
            self.start_load(request);
        }
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                self.shutdown(event_loop);
                return;
            }
            WindowEvent::Resized(size) => {
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.backend_mut().resize();
                }
                if let Some(window) = &self.window {
                    info!("Window resized to {}x{}", size.width, size.height);
                    window.request_redraw();
                }
                return;
            }
            WindowEvent::Moved(position) => {
                self.keep_on_screen(*position);
                return;
            }
            WindowEvent::RedrawRequested => {
                self.render();
                return;
            }
            WindowEvent::KeyboardInput { event: key, .. } => {
                if key.state == ElementState::Pressed && !key.repeat {
                    if let PhysicalKey::Code(code) = key.physical_key {
                        self.handle_key(event_loop, code);
                    }
                }
                return;
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_y = position.y;
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } if self.cursor_y < DRAG_AREA_HEIGHT => {
                if let Some(window) = &self.window {
                    if let Err(e) = window.drag_window() {
                        warn!("Window drag unavailable: {}", e);
                    }
                }
                return;
            }
            _ => {}
        }

        if let Some(action) = self.input.handle_event(&event) {
            if let Some(viewer) = self.viewer.as_mut() {
                viewer.apply_camera_action(action);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.poll_pending();

        if let (Some(window), Some(viewer)) = (&self.window, self.viewer.as_mut()) {
            if viewer.take_redraw_request() {
                window.request_redraw();
            }
        }

        if self.pending.is_some() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + LOAD_POLL_INTERVAL));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }
}

/// Number keys 1-9 toggle parts 0-8.
fn digit_part(code: KeyCode) -> Option<usize> {
    let digits = [
        KeyCode::Digit1,
        KeyCode::Digit2,
        KeyCode::Digit3,
        KeyCode::Digit4,
        KeyCode::Digit5,
        KeyCode::Digit6,
        KeyCode::Digit7,
        KeyCode::Digit8,
        KeyCode::Digit9,
    ];
    digits.iter().position(|digit| *digit == code)
}

/// Bottom-right area of the monitor, 70% across and down.
fn default_position(origin: PhysicalPosition<i32>, size: PhysicalSize<u32>) -> PhysicalPosition<i32> {
    PhysicalPosition::new(
        origin.x + (size.width as f64 * 0.7) as i32,
        origin.y + (size.height as f64 * 0.7) as i32,
    )
}

/// Keep a window of `window` size fully inside the monitor.
fn clamp_to_monitor(
    position: PhysicalPosition<i32>,
    window: PhysicalSize<u32>,
    origin: PhysicalPosition<i32>,
    monitor: PhysicalSize<u32>,
) -> PhysicalPosition<i32> {
    let max_x = origin.x + (monitor.width as i32 - window.width as i32).max(0);
    let max_y = origin.y + (monitor.height as i32 - window.height as i32).max(0);
    PhysicalPosition::new(position.x.clamp(origin.x, max_x), position.y.clamp(origin.y, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_monitor() {
        let origin = PhysicalPosition::new(0, 0);
        let monitor = PhysicalSize::new(1920, 1080);
        let window = PhysicalSize::new(400, 300);

        assert_eq!(
            clamp_to_monitor(PhysicalPosition::new(-50, 900), window, origin, monitor),
            PhysicalPosition::new(0, 780)
        );
        assert_eq!(
            clamp_to_monitor(PhysicalPosition::new(100, 100), window, origin, monitor),
            PhysicalPosition::new(100, 100)
        );
    }

    #[test]
    fn test_clamp_on_secondary_monitor() {
        let origin = PhysicalPosition::new(1920, 0);
        let monitor = PhysicalSize::new(1280, 1024);
        let window = PhysicalSize::new(400, 400);

        assert_eq!(
            clamp_to_monitor(PhysicalPosition::new(100, 100), window, origin, monitor),
            PhysicalPosition::new(1920, 100)
        );
    }

    #[test]
    fn test_default_position() {
        let position = default_position(PhysicalPosition::new(0, 0), PhysicalSize::new(1000, 500));
        assert_eq!(position, PhysicalPosition::new(700, 350));
    }

    #[test]
    fn test_digit_keys_map_to_parts() {
        assert_eq!(digit_part(KeyCode::Digit1), Some(0));
        assert_eq!(digit_part(KeyCode::Digit9), Some(8));
        assert_eq!(digit_part(KeyCode::KeyA), None);
    }
}
