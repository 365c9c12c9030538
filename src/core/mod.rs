//=========================================================================
// Core Systems
//=========================================================================
//
// Platform-independent engine core.
//
// Components:
//   globals          shared native/script variable namespace
//   events           key symbols, per-frame snapshot, aggregator
//   scheduler        cooperative frame loop and clock
//   platform_bridge  contracts the platform layer implements
//   error            failure taxonomy and the ordered error trace
//
// Everything here is single-threaded by contract. Shared state is
// `Rc<RefCell<…>>` / `Rc<Cell<…>>`; the only thread boundary in the
// crate is the platform event channel, drained by the scheduler.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod error;
pub mod events;
pub mod globals;
pub mod platform_bridge;
pub mod scheduler;

//=== Public API ==========================================================

pub use error::{EngineError, ErrorTrace, TraceHandle};
pub use events::{EventAggregator, EventSnapshot, KeySym, MouseButton, MouseRecord};
pub use globals::{GlobalRegistry, GlobalValue, SharedRegistry, WriteHook};
pub use platform_bridge::{EventPump, PlatformEvent, RenderSurface, Rgb, TextureId};
pub use scheduler::{FrameClock, FrameHooks, RunOutcome, Scheduler, SystemClock};
