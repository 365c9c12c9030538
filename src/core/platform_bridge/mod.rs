//=========================================================================
// Platform Bridge
//=========================================================================
//
// Contracts between the core loop and platform implementations
// (winit today, anything event-capable tomorrow).
//
// Core code depends only on these traits and event types; the concrete
// window host lives in `crate::platform`.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod interface;

//=== Public API ==========================================================

pub use interface::{EventPump, PlatformEvent, RenderSurface, Rgb, TextureId};
