//=========================================================================
// Global Namespace
//=========================================================================
//
// The shared native/script variable namespace and its write-hook
// protocol.
//
//=========================================================================

//=== Module Declarations =================================================

mod registry;

//=== Public API ==========================================================

pub use registry::{GlobalRegistry, GlobalValue, SharedRegistry, WriteHook};
