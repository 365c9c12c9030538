//=========================================================================
// Error Taxonomy
//=========================================================================
//
// Engine-wide error classification and the ordered error trace.
//
// Errors raised while script code is on the native stack do not unwind
// through it. They accumulate on an ordered trace instead, which the
// run loop drains exactly once at termination. Warnings bypass the
// trace and are reported immediately.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use log::{trace, warn};
use thiserror::Error;

//=== EngineError =========================================================

/// Classified engine failure.
///
/// Display strings match what the trace dump prints, so they carry the
/// full user-facing sentence rather than bare fragments.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A subsystem operation ran before that subsystem finished setup.
    /// Always an ordering defect in bootstrap, never retried.
    #[error("{subsystem} interface not initialized!")]
    NotInitialized { subsystem: &'static str },

    /// A subsystem was asked to initialize twice. Reported as a warning
    /// at the call site; the second init is a no-op.
    #[error("{subsystem} interface already initialized!")]
    AlreadyInitialized { subsystem: &'static str },

    /// A script hook (or the game file itself) raised a runtime error.
    /// Fatal to the run; carries the interpreter's message verbatim.
    #[error("{message}")]
    ScriptRuntime { message: String },

    /// A native binding was invoked from script with bad arity or types.
    /// Recorded on the trace and re-raised into the interpreter; the
    /// script may catch it and continue.
    #[error("{message}")]
    InvalidArgument { message: String },

    /// A name expected to resolve to a callable hook resolved to
    /// something else (or nothing).
    #[error("Value is not a function!")]
    NotAFunction { name: String },

    /// Windowing or event loop failure outside script control.
    #[error("{message}")]
    Platform { message: String },
}

impl EngineError {
    /// Short class label used in log lines.
    pub fn class(&self) -> &'static str {
        match self {
            EngineError::NotInitialized { .. } => "NotInitialized",
            EngineError::AlreadyInitialized { .. } => "AlreadyInitialized",
            EngineError::ScriptRuntime { .. } => "ScriptRuntime",
            EngineError::InvalidArgument { .. } => "InvalidArgument",
            EngineError::NotAFunction { .. } => "NotAFunction",
            EngineError::Platform { .. } => "Platform",
        }
    }
}

//=== ErrorTrace ==========================================================

/// Process-wide ordered error stack.
///
/// `record` appends, `drain`/`dump` consume oldest-first, so the order
/// reported at exit matches causal order. Single-threaded by contract;
/// shared via [`TraceHandle`], never locked.
#[derive(Debug, Default)]
pub struct ErrorTrace {
    entries: VecDeque<EngineError>,
}

/// Shared handle to the process error trace.
pub type TraceHandle = Rc<RefCell<ErrorTrace>>;

impl ErrorTrace {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Creates a fresh trace behind a shared handle.
    pub fn shared() -> TraceHandle {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Appends an error to the trace. Silent apart from a trace-level
    /// log line; the entry surfaces when the trace is dumped.
    pub fn record(&mut self, error: EngineError) {
        trace!(target: "engine", "stacked {} error: {}", error.class(), error);
        self.entries.push_back(error);
    }

    /// Reports a warning immediately. Warnings never stack.
    pub fn warn(&self, message: &str) {
        warn!(target: "engine", "{}", message);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Consumes the trace, yielding entries oldest-first.
    pub fn drain(&mut self) -> Vec<EngineError> {
        self.entries.drain(..).collect()
    }

    /// Drains the trace and prints each entry to the diagnostic stream,
    /// oldest-first. Printing bypasses the log filter so a fatal run
    /// always leaves its trace behind.
    pub fn dump(&mut self) {
        for error in self.entries.drain(..) {
            eprintln!("ERROR: {}", error);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_starts_empty() {
        let trace = ErrorTrace::new();
        assert!(trace.is_empty());
        assert_eq!(trace.len(), 0);
    }

    #[test]
    fn record_appends_in_order() {
        let mut trace = ErrorTrace::new();

        trace.record(EngineError::NotInitialized { subsystem: "Lua" });
        trace.record(EngineError::ScriptRuntime {
            message: "boom".into(),
        });

        let drained = trace.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], EngineError::NotInitialized { .. }));
        assert!(matches!(drained[1], EngineError::ScriptRuntime { .. }));
    }

    #[test]
    fn drain_is_exactly_once() {
        let mut trace = ErrorTrace::new();
        trace.record(EngineError::NotAFunction {
            name: "tw_main".into(),
        });

        assert_eq!(trace.drain().len(), 1);
        assert!(trace.drain().is_empty());
        assert!(trace.is_empty());
    }

    #[test]
    fn warn_does_not_stack() {
        let trace = ErrorTrace::new();
        trace.warn("Lua interface already initialized!");
        assert!(trace.is_empty());
    }

    #[test]
    fn display_strings_are_full_sentences() {
        let err = EngineError::NotInitialized { subsystem: "Lua" };
        assert_eq!(err.to_string(), "Lua interface not initialized!");

        let err = EngineError::NotAFunction {
            name: "tw_display".into(),
        };
        assert_eq!(err.to_string(), "Value is not a function!");

        let err = EngineError::InvalidArgument {
            message: "Lua: Error while calling loadTexture: Not enough arguments!".into(),
        };
        assert_eq!(
            err.to_string(),
            "Lua: Error while calling loadTexture: Not enough arguments!"
        );
    }

    #[test]
    fn class_labels_cover_taxonomy() {
        assert_eq!(
            EngineError::AlreadyInitialized { subsystem: "Lua" }.class(),
            "AlreadyInitialized"
        );
        assert_eq!(
            EngineError::Platform {
                message: "no display".into()
            }
            .class(),
            "Platform"
        );
    }
}
