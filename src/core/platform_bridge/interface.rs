//=========================================================================
// Platform Bridge Interface
//=========================================================================
//
// Contracts between the core loop and the platform layer.
//
// The scheduler drives an `EventPump` and drains `PlatformEvent`s from
// a channel; render bindings talk to a `RenderSurface`. Platform
// backends can be swapped without changing core code, and tests
// substitute scripted implementations for both.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::error::EngineError;
use crate::core::events::{KeySym, MouseButton};

//=== PlatformEvent =======================================================

/// Raw event forwarded from the platform layer to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// Key press or release.
    Key { sym: KeySym, pressed: bool },

    /// Mouse button press or release at a cursor position.
    Mouse {
        down: bool,
        button: MouseButton,
        x: i32,
        y: i32,
    },

    /// Termination request (window close or the script `quit` binding).
    Quit,
}

//=== EventPump ===========================================================

/// Per-frame platform dispatch hook.
///
/// The scheduler calls this once per tick before draining the event
/// channel. Implementations run one non-blocking dispatch pass and
/// forward anything pending into the channel.
pub trait EventPump {
    /// Returns `false` once the platform has shut down and can deliver
    /// no further events; the scheduler treats that as a quit.
    fn pump_events(&mut self) -> bool;
}

//=== RenderSurface =======================================================

/// Handle to a texture previously loaded through the surface.
///
/// Handles are dense and start at zero; script code sees them as plain
/// integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// RGB color triple for primitive drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Window and drawing collaborator used by the render bindings.
///
/// Failures carry the internal failure sentence; the binding layer owns
/// recording them on the error trace and re-raising into the script.
pub trait RenderSurface {
    /// Updates the window caption.
    fn set_caption(&mut self, title: &str);

    /// Shows or hides the OS cursor over the window.
    fn set_cursor_visible(&mut self, visible: bool);

    /// Opens the frame the render hook will draw into.
    fn begin_frame(&mut self);

    /// Presents the finished frame.
    fn present(&mut self);

    /// Loads a texture and returns its handle.
    fn load_texture(&mut self, path: &str) -> Result<TextureId, EngineError>;

    /// Blits a previously loaded texture at a position.
    fn draw_texture(&mut self, texture: TextureId, x: i32, y: i32) -> Result<(), EngineError>;

    /// Draws a colored line segment.
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb)
        -> Result<(), EngineError>;
}
