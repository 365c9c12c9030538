//=========================================================================
// Galvanic Engine
//
// Main entry point and coordinator for the engine.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run()──>  exit code
//         │                          │
//         ├─ with_fps_cap()          ├─ bootstraps subsystems
//         ├─ with_title()            ├─ drives the frame scheduler
//         └─ with_window_size()      └─ dumps the error trace
// ```
//
// Bootstrap order mirrors subsystem dependencies: script runtime,
// quit binding, window, display globals, render bindings, cursor
// global, event list, sticky-keys global, then the game script itself.
// Any failure along the way lands on the trace, which is dumped
// exactly once at termination on every path.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{error, info};

//=== Internal Dependencies ===============================================

use crate::core::error::{EngineError, ErrorTrace, TraceHandle};
use crate::core::events::EventAggregator;
use crate::core::globals::{GlobalRegistry, GlobalValue};
use crate::core::platform_bridge::{PlatformEvent, RenderSurface};
use crate::core::scheduler::{Scheduler, SystemClock};
use crate::platform::WindowPump;
use crate::scripting::{bindings, ScriptDriver, ScriptHost};

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// Only the game script path is required; everything else falls back
/// to the classic defaults.
///
/// # Default Values
///
/// - **Frame cap**: 40 frames per second
/// - **Title**: "Untitled" (scripts usually retitle via `gameName`)
/// - **Window**: 1024x640
/// - **Channel capacity**: 128 events
///
/// # Examples
///
/// ```no_run
/// use galvanic_engine::EngineBuilder;
///
/// let code = EngineBuilder::new("pong.lua")
///     .with_fps_cap(60)
///     .with_title("Pong")
///     .build()
///     .run();
/// std::process::exit(code);
/// ```
pub struct EngineBuilder {
    script: PathBuf,
    fps_cap: u32,
    title: String,
    width: u32,
    height: u32,
    channel_capacity: usize,
}

impl EngineBuilder {
    /// Creates a builder for the given game script with default
    /// settings.
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            fps_cap: 40,
            title: "Untitled".to_owned(),
            width: 1024,
            height: 640,
            channel_capacity: 128,
        }
    }

    /// Sets the initial frame rate cap. Scripts can change it at
    /// runtime through the `fpsCap` global.
    ///
    /// Default: 40
    ///
    /// # Panics
    ///
    /// Panics if `fps_cap == 0`.
    pub fn with_fps_cap(mut self, fps_cap: u32) -> Self {
        assert!(fps_cap > 0, "Frame cap must be positive");
        self.fps_cap = fps_cap;
        self
    }

    /// Sets the initial window title. Scripts can change it at runtime
    /// through the `gameName` global.
    ///
    /// Default: "Untitled"
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the window dimensions, which scripts observe through the
    /// `screenWidth` and `screenHeight` globals.
    ///
    /// Default: 1024x640
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "Window dimensions must be positive");
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the platform → scheduler channel capacity.
    ///
    /// Default: 128
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    /// Builds the engine instance.
    pub fn build(self) -> Engine {
        info!(
            target: "engine",
            "Building engine (script: {}, fps cap: {})",
            self.script.display(),
            self.fps_cap
        );

        Engine {
            script: self.script,
            fps_cap: self.fps_cap,
            title: self.title,
            width: self.width,
            height: self.height,
            channel_capacity: self.channel_capacity,
        }
    }
}

//=== Engine ==============================================================

/// Galvanic Engine runtime.
///
/// Coordinates the subsystems around one game script and owns the
/// process exit semantics: the run outcome maps to the exit code, and
/// the error trace is reported exactly once at the end, whichever way
/// the run terminates.
///
/// # Architecture
///
/// ```text
/// Engine (one thread)
///   ├─► ScriptHost ── GLOBALS bridge ──► GlobalRegistry
///   ├─► WindowPump ── PlatformEvent ───► Scheduler
///   └─► Scheduler  ── FrameHooks ──────► ScriptDriver ──► WindowHost
/// ```
pub struct Engine {
    script: PathBuf,
    fps_cap: u32,
    title: String,
    width: u32,
    height: u32,
    channel_capacity: usize,
}

impl Engine {
    //--- Execution --------------------------------------------------------

    /// Runs the engine to completion and returns the process exit code.
    ///
    /// # Lifecycle
    ///
    /// 1. Bootstraps the subsystems and loads the game script
    /// 2. Drives the frame scheduler until quit or a fatal hook error
    /// 3. Dumps the accumulated error trace
    ///
    /// A bootstrap failure skips straight to the trace dump and returns
    /// a nonzero code.
    pub fn run(self) -> i32 {
        info!(
            target: "engine",
            "Starting engine runtime (fps cap: {})",
            self.fps_cap
        );

        let trace = ErrorTrace::shared();
        let (tx, rx) = bounded(self.channel_capacity);

        let code = match self.bootstrap(&trace, tx, rx) {
            Ok(scheduler) => {
                let outcome = scheduler.run();
                info!(target: "engine", "Frame loop finished: {:?}", outcome);
                outcome.exit_code()
            }
            Err(err) => {
                error!(target: "engine", "Engine bootstrap failed: {}", err);
                trace.borrow_mut().record(err);
                1
            }
        };

        trace.borrow_mut().dump();
        info!(target: "engine", "Engine shutdown complete");
        code
    }

    //--- Bootstrap --------------------------------------------------------

    /// Wires the object graph in dependency order and loads the game
    /// script. Returns the ready-to-run scheduler.
    fn bootstrap(
        &self,
        trace: &TraceHandle,
        tx: Sender<PlatformEvent>,
        rx: Receiver<PlatformEvent>,
    ) -> Result<Scheduler<WindowPump, ScriptDriver>, EngineError> {
        //--- shared state -------------------------------------------------
        let registry = GlobalRegistry::shared();
        registry.borrow_mut().initialize()?;
        registry
            .borrow_mut()
            .register("frameCount", GlobalValue::Int(0), None)?;

        let sticky = Rc::new(Cell::new(false));
        let fps_cap = Rc::new(Cell::new(self.fps_cap));

        //--- script runtime -----------------------------------------------
        let mut host = ScriptHost::new(Rc::clone(&registry), Rc::clone(trace));
        host.install_globals_bridge()?;
        bindings::install_quit(&host, trace, tx.clone()).map_err(|_| EngineError::Platform {
            message: "Failed to add quit function during Lua initialization!".into(),
        })?;

        //--- window and render surface ------------------------------------
        let (pump, window_host) = WindowPump::new(tx, &self.title, self.width, self.height)?;
        let surface: Rc<RefCell<dyn RenderSurface>> = window_host;

        bindings::register_display_globals(
            &registry,
            &surface,
            &fps_cap,
            trace,
            &self.title,
            self.fps_cap,
            self.width,
            self.height,
        )?;
        bindings::install_render_bindings(&host, trace, &surface)?;

        //--- input collaborators ------------------------------------------
        bindings::register_cursor_global(&registry, &surface)?;
        host.init_event_list()?;
        bindings::register_sticky_global(&registry, &sticky)?;

        //--- game script --------------------------------------------------
        host.load_script(&self.script)?;

        let driver = ScriptDriver::new(host, surface);
        Ok(Scheduler::new(
            pump,
            driver,
            rx,
            EventAggregator::new(sticky),
            registry,
            Rc::clone(trace),
            fps_cap,
            Box::new(SystemClock),
        ))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
