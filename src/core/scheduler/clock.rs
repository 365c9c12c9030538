//=========================================================================
// Frame Clock
//=========================================================================
//
// Injectable delay source for the frame loop. Tests swap in a counting
// clock so many ticks run with zero real delay.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::thread;
use std::time::Duration;

//=== FrameClock ==========================================================

/// Source of the per-frame cooperative delay.
pub trait FrameClock {
    /// Blocks the calling thread for `duration`.
    fn sleep(&mut self, duration: Duration);
}

//=== SystemClock =========================================================

/// Real wall-clock delay via `thread::sleep`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl FrameClock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
