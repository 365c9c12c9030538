//=========================================================================
// Input Events
//=========================================================================
//
// Key symbols and the per-frame event snapshot machinery.
//
//=========================================================================

//=== Module Declarations =================================================

mod aggregator;
mod key;

//=== Public API ==========================================================

pub use aggregator::{EventAggregator, EventSnapshot, MouseRecord};
pub use key::{KeySym, MouseButton};
