//=========================================================================
// Frame Scheduler
//=========================================================================
//
// The cooperative frame loop.
//
// Per tick: sleep to hold the frame rate, advance the frame counter,
// reset the aggregator (unless sticky), pump the platform and drain
// pending events, then run the script logic and render hooks. A quit
// event short-circuits the tick; a hook error ends the run as failed.
//
// Architecture:
//   EventPump → Receiver<PlatformEvent> → EventAggregator → FrameHooks
//
// Single-threaded throughout; the only suspension point is the
// per-frame delay.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod clock;

//=== External Dependencies ===============================================

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use log::{error, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::error::{EngineError, TraceHandle};
use crate::core::events::{EventAggregator, EventSnapshot};
use crate::core::globals::{GlobalValue, SharedRegistry};
use crate::core::platform_bridge::{EventPump, PlatformEvent};

pub use clock::{FrameClock, SystemClock};

//=== TickControl =========================================================

/// Frame loop control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickControl {
    Continue,
    Exit,
}

//=== RunOutcome ==========================================================

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Clean quit (quit signal or platform shutdown).
    Stopped,

    /// A hook raised a fatal error; the trace holds the details.
    Failed,
}

impl RunOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            RunOutcome::Stopped => 0,
            RunOutcome::Failed => 1,
        }
    }
}

//=== FrameHooks ==========================================================

/// Per-frame script entry points driven by the scheduler.
///
/// The logic hook receives the finished snapshot for the frame; events
/// are never appended after it starts. The render hook runs after the
/// logic hook returns and owns its own frame begin/present bracketing.
pub trait FrameHooks {
    fn run_logic(&mut self, snapshot: &EventSnapshot) -> Result<(), EngineError>;

    fn run_render(&mut self) -> Result<(), EngineError>;
}

//=== Scheduler ===========================================================

/// Drives frames until a quit signal or a fatal hook error.
///
/// Owns the aggregator outright; everything else is shared handles into
/// the single-threaded object graph.
pub struct Scheduler<P: EventPump, H: FrameHooks> {
    pump: P,
    hooks: H,
    events: Receiver<PlatformEvent>,
    aggregator: EventAggregator,
    registry: SharedRegistry,
    trace: TraceHandle,
    fps_cap: Rc<Cell<u32>>,
    clock: Box<dyn FrameClock>,
    frame_count: u64,
}

impl<P: EventPump, H: FrameHooks> Scheduler<P, H> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pump: P,
        hooks: H,
        events: Receiver<PlatformEvent>,
        aggregator: EventAggregator,
        registry: SharedRegistry,
        trace: TraceHandle,
        fps_cap: Rc<Cell<u32>>,
        clock: Box<dyn FrameClock>,
    ) -> Self {
        Self {
            pump,
            hooks,
            events,
            aggregator,
            registry,
            trace,
            fps_cap,
            clock,
            frame_count: 0,
        }
    }

    /// Runs the frame loop to its terminal state.
    ///
    /// A hook error is recorded on the trace exactly once here; the
    /// caller owns dumping the trace afterwards.
    pub fn run(mut self) -> RunOutcome {
        info!(
            target: "scheduler",
            "entering frame loop (fps cap: {})",
            self.fps_cap.get()
        );

        loop {
            match self.tick() {
                Ok(TickControl::Continue) => {}
                Ok(TickControl::Exit) => {
                    info!(
                        target: "scheduler",
                        "quit observed at frame {}",
                        self.frame_count
                    );
                    return RunOutcome::Stopped;
                }
                Err(err) => {
                    error!(
                        target: "scheduler",
                        "fatal {} error at frame {}",
                        err.class(),
                        self.frame_count
                    );
                    self.trace.borrow_mut().record(err);
                    return RunOutcome::Failed;
                }
            }
        }
    }

    /// One frame. Step order is load-bearing: events are fully drained
    /// before the logic hook, and the logic hook finishes before the
    /// render hook starts.
    fn tick(&mut self) -> Result<TickControl, EngineError> {
        //--- 1. Pace the frame -------------------------------------------
        let cap = self.fps_cap.get().max(1);
        self.clock.sleep(Duration::from_millis(1000 / u64::from(cap)));

        //--- 2. Advance the frame counter (native write, no hook) --------
        self.frame_count += 1;
        self.registry
            .borrow_mut()
            .write("frameCount", GlobalValue::Int(self.frame_count as i64))?;

        //--- 3. Frame-boundary reset -------------------------------------
        self.aggregator.reset_if_not_sticky();

        //--- 4. Pump the platform and drain events -----------------------
        if self.drain_events() == TickControl::Exit {
            return Ok(TickControl::Exit);
        }

        //--- 5. Logic hook ------------------------------------------------
        self.hooks.run_logic(self.aggregator.snapshot())?;

        //--- 6. Render hook -----------------------------------------------
        self.hooks.run_render()?;

        Ok(TickControl::Continue)
    }

    /// Drains pending platform events into the aggregator (bounded to
    /// prevent starvation). A quit event or a dead platform ends the
    /// drain immediately, leaving the rest of the queue behind.
    fn drain_events(&mut self) -> TickControl {
        const MAX_EVENTS_PER_FRAME: usize = 100;

        if !self.pump.pump_events() {
            return TickControl::Exit;
        }

        let mut drained = 0;
        while drained < MAX_EVENTS_PER_FRAME {
            match self.events.try_recv() {
                Ok(PlatformEvent::Key { sym, pressed }) => {
                    self.aggregator.record_key(sym, pressed);
                    drained += 1;
                }
                Ok(PlatformEvent::Mouse { down, button, x, y }) => {
                    self.aggregator.record_mouse(down, button, x, y);
                    drained += 1;
                }
                Ok(PlatformEvent::Quit) => return TickControl::Exit,
                Err(TryRecvError::Disconnected) => return TickControl::Exit,
                Err(TryRecvError::Empty) => break,
            }
        }

        if drained >= MAX_EVENTS_PER_FRAME {
            warn!(
                target: "scheduler",
                "Event queue backlog: drained {} events this frame",
                drained
            );
        }

        TickControl::Continue
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
