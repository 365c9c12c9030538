//=========================================================================
// Platform Subsystem
//
// Bridges Winit (OS-level events) with the scheduler's event channel.
//
// Architecture:
// ```text
//  ┌───────────────────────────┐
//  │  Winit Event Loop (pump)  │   one pump per scheduler tick
//  │   ↓                       │
//  │  InputProcessor           │
//  │   ├─ Converts Winit       │
//  │   └─ Tracks cursor        │
//  │   ↓                       │
//  │  Channel ─────────────────┼──→ Scheduler drain → EventAggregator
//  └───────────────────────────┘    PlatformEvent
// ```
//
// Key Design Decisions:
// - **Pumped event loop**: Everything runs on one thread. The scheduler
//   calls `pump_events` once per tick with a zero timeout, so OS events
//   are serviced between frames without a second thread.
// - **Graceful channel disconnect**: If the scheduler is gone, the
//   platform logs a warning and drops the event instead of panicking.
// - **Lazy window**: The window is created on the first `resumed`
//   callback, which is also where the pending caption, size and cursor
//   state get applied.
//
// Responsibilities:
// - Create and manage the OS window
// - Convert Winit input → PlatformEvent and forward them
// - Carry out caption/cursor changes requested through global writes
// - Journal draw calls issued by the script render hook
//
//=========================================================================

//=== Submodules ==========================================================

mod input_processor;

//=== External Crates =====================================================

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError};
use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowAttributes},
};

//=== Internal Imports ====================================================

use crate::core::error::EngineError;
use crate::core::platform_bridge::{EventPump, PlatformEvent, RenderSurface, Rgb, TextureId};
use input_processor::InputProcessor;

//=== WindowHost ==========================================================

/// Owns the OS window and carries out everything the engine asks of the
/// display: caption and cursor changes, texture bookkeeping and draw
/// journaling, plus translation of incoming window events.
///
/// Not Send; it lives on the main thread behind an `Rc<RefCell>` shared
/// between the pump and the script bindings.
pub struct WindowHost {
    /// OS window handle (None until `resumed` runs).
    window: Option<Window>,

    /// Channel toward the scheduler's per-tick drain.
    events: Sender<PlatformEvent>,

    /// Converts Winit events and tracks the cursor.
    input: InputProcessor,

    /// Pending caption, applied on window creation and on change.
    title: String,

    cursor_visible: bool,
    width: u32,
    height: u32,

    /// Loaded texture paths; the index is the script-visible handle.
    textures: Vec<String>,

    /// Presented frame counter, for the render journal.
    frames: u64,
}

impl WindowHost {
    pub fn new(events: Sender<PlatformEvent>, title: &str, width: u32, height: u32) -> Self {
        info!(target: "platform", "Platform subsystem initialized");
        Self {
            window: None,
            events,
            input: InputProcessor::new(),
            title: title.to_owned(),
            cursor_visible: true,
            width,
            height,
            textures: Vec::new(),
            frames: 0,
        }
    }

    pub fn shared(
        events: Sender<PlatformEvent>,
        title: &str,
        width: u32,
        height: u32,
    ) -> Rc<RefCell<WindowHost>> {
        Rc::new(RefCell::new(Self::new(events, title, width, height)))
    }

    //--- Internal Helpers -------------------------------------------------

    /// Forwards one event to the scheduler. The scheduler drains the
    /// channel on this same thread, so the push must never block: a
    /// full queue or a disconnected receiver drops the event with a
    /// warning.
    fn forward(&self, event: PlatformEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    target: "platform::input",
                    "Channel full, dropping {:?}", event
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!(target: "platform::input", "Channel disconnected, dropping event");
            }
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) {
        let attrs = WindowAttributes::default()
            .with_title(&self.title)
            .with_inner_size(LogicalSize::new(self.width, self.height));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                info!(
                    target: "platform",
                    "Window created: {}x{} @ {}x DPI",
                    window.inner_size().width,
                    window.inner_size().height,
                    window.scale_factor()
                );
                window.set_cursor_visible(self.cursor_visible);
                self.window = Some(window);
            }
            Err(e) => {
                error!(target: "platform", "Window creation failed: {}", e);
                self.forward(PlatformEvent::Quit);
                event_loop.exit();
            }
        }
    }

    fn handle_window_event(&mut self, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                self.forward(PlatformEvent::Quit);
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.input.track_cursor(position.x, position.y);
            }

            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                if let Some(event) = self.input.process_key_event(key_event) {
                    self.forward(event);
                } else {
                    trace!(target: "platform::input", "Auto-repeat ignored");
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                self.forward(self.input.process_mouse_button(*button, *state));
            }

            _ => {
                // Ignore: Resized, Focused, RedrawRequested, etc.
            }
        }
    }

    //--- Test Accessors ---------------------------------------------------

    #[cfg(test)]
    pub(crate) fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }
}

//=== Render Surface ======================================================

impl RenderSurface for WindowHost {
    fn set_caption(&mut self, title: &str) {
        self.title = title.to_owned();
        if let Some(window) = &self.window {
            window.set_title(title);
        }
        debug!(target: "render", "caption set to '{}'", title);
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
        if let Some(window) = &self.window {
            window.set_cursor_visible(visible);
        }
        debug!(target: "render", "cursor visibility set to {}", visible);
    }

    fn begin_frame(&mut self) {
        trace!(target: "render", "frame {} begin", self.frames);
    }

    fn present(&mut self) {
        trace!(target: "render", "frame {} presented", self.frames);
        self.frames += 1;
    }

    fn load_texture(&mut self, path: &str) -> Result<TextureId, EngineError> {
        if !Path::new(path).is_file() {
            return Err(EngineError::Platform {
                message: format!("load_texture failed: cannot open '{}'", path),
            });
        }

        let id = TextureId(self.textures.len() as u32);
        self.textures.push(path.to_owned());
        info!(target: "render", "texture {} loaded from '{}'", id.0, path);
        Ok(id)
    }

    fn draw_texture(&mut self, texture: TextureId, x: i32, y: i32) -> Result<(), EngineError> {
        if texture.0 as usize >= self.textures.len() {
            return Err(EngineError::InvalidArgument {
                message: "draw_texture failed: Invalid texture!".into(),
            });
        }

        trace!(target: "render", "texture {} at ({}, {})", texture.0, x, y);
        Ok(())
    }

    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb) -> Result<(), EngineError> {
        let in_x = |x: i32| x >= 0 && (x as u32) < self.width;
        let in_y = |y: i32| y >= 0 && (y as u32) < self.height;
        if !in_x(x0) || !in_x(x1) || !in_y(y0) || !in_y(y1) {
            return Err(EngineError::Platform {
                message: "draw_line failed: Out of bounds.".into(),
            });
        }

        trace!(
            target: "render",
            "line ({}, {})-({}, {}) rgb({}, {}, {})",
            x0, y0, x1, y1, color.r, color.g, color.b
        );
        Ok(())
    }
}

//=== Winit Integration ===================================================

/// Borrow adapter between the pump and the shared host.
struct HostAdapter {
    host: Rc<RefCell<WindowHost>>,
}

impl ApplicationHandler for HostAdapter {
    /// Called when the app becomes active (startup or mobile resume).
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let mut host = self.host.borrow_mut();
        if host.window.is_some() {
            debug!(target: "platform", "Window already exists (mobile resume?)");
            return;
        }
        host.create_window(event_loop);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        self.host.borrow_mut().handle_window_event(event);
    }
}

//=== WindowPump ==========================================================

/// Drives the Winit event loop in pump mode, one servicing pass per
/// scheduler tick.
pub struct WindowPump {
    event_loop: EventLoop<()>,
    adapter: HostAdapter,
}

impl WindowPump {
    /// Creates the event loop and the shared window host. The window
    /// itself appears on the first pump, when Winit delivers `resumed`.
    pub fn new(
        events: Sender<PlatformEvent>,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<(Self, Rc<RefCell<WindowHost>>), EngineError> {
        let event_loop = EventLoop::new().map_err(|e| EngineError::Platform {
            message: format!("Event loop creation failed: {}", e),
        })?;

        let host = WindowHost::shared(events, title, width, height);
        let pump = Self {
            event_loop,
            adapter: HostAdapter {
                host: Rc::clone(&host),
            },
        };
        Ok((pump, host))
    }
}

impl EventPump for WindowPump {
    fn pump_events(&mut self) -> bool {
        match self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.adapter)
        {
            PumpStatus::Continue => true,
            PumpStatus::Exit(code) => {
                info!(target: "platform", "Event loop exited with status {}", code);
                false
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
