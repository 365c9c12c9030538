//=========================================================================
// Event Aggregator
//=========================================================================
//
// Collects raw input events into the per-frame snapshot consumed by
// script logic.
//
// Categories are created lazily on first use each frame. In non-sticky
// mode the whole snapshot is replaced at the frame boundary; in sticky
// mode it persists and individual key entries are overwritten in place.
// The sticky flag is a shared cell updated by the `stickyKeys` write
// hook and re-read at every decision point.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use super::key::{KeySym, MouseButton};

//=== MouseRecord =========================================================

/// Most recent state observed for one mouse button this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseRecord {
    pub down: bool,
    pub x: i32,
    pub y: i32,
}

//=== EventSnapshot =======================================================

/// All input activity observed during one frame (or accumulated across
/// frames in sticky mode).
///
/// A category absent from the snapshot reads as nil on the script side;
/// key categories hold a nested symbol → flag map, the mouse category a
/// per-button record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSnapshot {
    key_down: Option<BTreeMap<KeySym, bool>>,
    key_up: Option<BTreeMap<KeySym, bool>>,
    key_pressed: Option<BTreeMap<KeySym, bool>>,
    mouse: Option<BTreeMap<MouseButton, MouseRecord>>,
}

impl EventSnapshot {
    /// True when no category has been created.
    pub fn is_empty(&self) -> bool {
        self.key_down.is_none()
            && self.key_up.is_none()
            && self.key_pressed.is_none()
            && self.mouse.is_none()
    }

    pub fn key_down(&self) -> Option<&BTreeMap<KeySym, bool>> {
        self.key_down.as_ref()
    }

    pub fn key_up(&self) -> Option<&BTreeMap<KeySym, bool>> {
        self.key_up.as_ref()
    }

    pub fn key_pressed(&self) -> Option<&BTreeMap<KeySym, bool>> {
        self.key_pressed.as_ref()
    }

    pub fn mouse(&self) -> Option<&BTreeMap<MouseButton, MouseRecord>> {
        self.mouse.as_ref()
    }
}

//=== EventAggregator =====================================================

/// Sole owner and mutator of the frame snapshot.
///
/// The scripting side only ever receives a read-only projection built
/// from [`EventSnapshot`].
pub struct EventAggregator {
    snapshot: EventSnapshot,
    sticky: Rc<Cell<bool>>,
}

impl EventAggregator {
    /// `sticky` is the natively cached `stickyKeys` flag, shared with
    /// its write hook.
    pub fn new(sticky: Rc<Cell<bool>>) -> Self {
        Self {
            snapshot: EventSnapshot::default(),
            sticky,
        }
    }

    /// Frame-boundary reset. No-op while sticky mode is on, so held
    /// keys survive into the next frame.
    pub fn reset_if_not_sticky(&mut self) {
        if !self.sticky.get() {
            self.snapshot = EventSnapshot::default();
        }
    }

    /// Records one keyboard event. Never fails; unmapped keys arrive
    /// here already collapsed to [`KeySym::Unknown`].
    ///
    /// Non-sticky: the event lands in `keyDown` or `keyUp` by
    /// direction, and the stored flag is `true` in both categories
    /// (category membership encodes direction). Sticky: the pressed
    /// state itself is stored under `keyPressed`, so releases are
    /// retained as `false` entries.
    pub fn record_key(&mut self, sym: KeySym, pressed: bool) {
        if self.sticky.get() {
            self.snapshot
                .key_pressed
                .get_or_insert_with(BTreeMap::new)
                .insert(sym, pressed);
        } else if pressed {
            self.snapshot
                .key_down
                .get_or_insert_with(BTreeMap::new)
                .insert(sym, true);
        } else {
            self.snapshot
                .key_up
                .get_or_insert_with(BTreeMap::new)
                .insert(sym, true);
        }
    }

    /// Records one mouse button event. Only the most recent event per
    /// button per frame is retained.
    pub fn record_mouse(&mut self, down: bool, button: MouseButton, x: i32, y: i32) {
        self.snapshot
            .mouse
            .get_or_insert_with(BTreeMap::new)
            .insert(button, MouseRecord { down, x, y });
    }

    /// Read-only view of the current snapshot.
    pub fn snapshot(&self) -> &EventSnapshot {
        &self.snapshot
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
