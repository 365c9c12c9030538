//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use galvanic_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine entry points
pub use crate::engine::{Engine, EngineBuilder};

// Error taxonomy and trace
pub use crate::core::error::{EngineError, ErrorTrace};

// Global registry
pub use crate::core::globals::{GlobalRegistry, GlobalValue};

// Event aggregation
pub use crate::core::events::{EventSnapshot, KeySym, MouseButton};

// Scheduling
pub use crate::core::scheduler::RunOutcome;
