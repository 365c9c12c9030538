//=========================================================================
// Galvanic Engine — Library Root
//
// This crate defines the public API surface of the Galvanic Engine.
//
// Responsibilities:
// - Expose the engine interface (`Engine`, `EngineBuilder`)
// - Keep internal modules (`platform`, `scripting`) hidden from end
//   users
// - Provide clean separation between the high-level engine facade
//   and lower-level subsystems (globals, events, scheduling, OS
//   integration)
//
// Typical usage:
// ```no_run
// use galvanic_engine::EngineBuilder;
//
// fn main() {
//     let code = EngineBuilder::new("game.lua").build().run();
//     std::process::exit(code);
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the engine systems and logic (global registry, event
// aggregation, frame scheduling). It is exposed publicly for
// engine-level extensibility, but normal application code will mostly
// use the top-level `Engine` facade.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `platform` contains OS-specific logic (window, Winit integration,
// event pump) and is kept private, as it is not part of the public API
// surface.
//
// `scripting` embeds the Lua runtime and its native bindings; scripts
// are the supported extension surface, not the Rust types behind them.
//
// `engine` defines the main engine entry point and bootstrap logic.
//
mod engine;
mod platform;
mod scripting;

//--- Public Exports ------------------------------------------------------
//
// Re-exports the engine entry points so users can simply
// `use galvanic_engine::EngineBuilder;` without having to know the
// internal module structure.
//
pub use engine::{Engine, EngineBuilder};
