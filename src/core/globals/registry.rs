//=========================================================================
// Global Registry
//=========================================================================
//
// Name-keyed value namespace shared between native code and script code.
//
// Each entry pairs a value with an optional native write hook. The hook
// fires on the external (script-initiated) write path only; native
// writes update the value silently. On an external write the value is
// stored first, then the hook runs with the registry released, so hooks
// may re-enter the registry.
//
// Shared single-owner state: `Rc<RefCell<…>>`, never a lock.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::trace;

//=== Internal Dependencies ===============================================

use crate::core::error::EngineError;

//=== GlobalValue =========================================================

/// Value stored under a global name.
///
/// A closed union: values crossing the script boundary are coerced into
/// one of these arms or rejected at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl GlobalValue {
    /// Script-style truthiness: only `false` is falsy. Zero and the
    /// empty string are truthy, matching Lua.
    pub fn truthy(&self) -> bool {
        !matches!(self, GlobalValue::Bool(false))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            GlobalValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GlobalValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for GlobalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalValue::Str(s) => write!(f, "{}", s),
            GlobalValue::Int(n) => write!(f, "{}", n),
            GlobalValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for GlobalValue {
    fn from(s: &str) -> Self {
        GlobalValue::Str(s.to_owned())
    }
}

impl From<String> for GlobalValue {
    fn from(s: String) -> Self {
        GlobalValue::Str(s)
    }
}

impl From<i64> for GlobalValue {
    fn from(n: i64) -> Self {
        GlobalValue::Int(n)
    }
}

impl From<bool> for GlobalValue {
    fn from(b: bool) -> Self {
        GlobalValue::Bool(b)
    }
}

//=== WriteHook ===========================================================

/// Native callback invoked with the new value after an external write.
///
/// Cloned out of the registry before invocation, so the hook body may
/// read or write globals itself.
pub type WriteHook = Rc<dyn Fn(&GlobalValue)>;

//=== GlobalRegistry ======================================================

struct GlobalEntry {
    value: GlobalValue,
    on_write: Option<WriteHook>,
}

/// The shared native/script variable namespace.
///
/// Constructed empty and unusable; `initialize` arms it. Every
/// operation except reads fails closed with `NotInitialized` before
/// that point. Entries are never deleted during a run.
pub struct GlobalRegistry {
    entries: HashMap<String, GlobalEntry>,
    initialized: bool,
}

/// Shared handle to the registry.
pub type SharedRegistry = Rc<RefCell<GlobalRegistry>>;

impl GlobalRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            initialized: false,
        }
    }

    /// Creates an uninitialized registry behind a shared handle.
    pub fn shared() -> SharedRegistry {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Arms the registry. A repeated call fails with
    /// `AlreadyInitialized` and leaves existing state untouched; the
    /// caller decides whether that is a warning or a defect.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        if self.initialized {
            return Err(EngineError::AlreadyInitialized {
                subsystem: "Globals",
            });
        }
        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Installs a named value with an optional write hook.
    ///
    /// Registering an existing name overwrites both the value and the
    /// hook pairing.
    pub fn register(
        &mut self,
        name: &str,
        value: GlobalValue,
        on_write: Option<WriteHook>,
    ) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized {
                subsystem: "Globals",
            });
        }

        trace!(
            target: "globals",
            "registered global '{}' = {:?} (hook: {})",
            name,
            value,
            on_write.is_some()
        );

        self.entries.insert(
            name.to_owned(),
            GlobalEntry { value, on_write },
        );
        Ok(())
    }

    /// Native-initiated update. Never triggers the write hook; native
    /// writers already know what they changed. Writing a name that was
    /// never registered creates a hook-less entry.
    pub fn write(&mut self, name: &str, value: GlobalValue) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized {
                subsystem: "Globals",
            });
        }

        match self.entries.get_mut(name) {
            Some(entry) => entry.value = value,
            None => {
                self.entries.insert(
                    name.to_owned(),
                    GlobalEntry {
                        value,
                        on_write: None,
                    },
                );
            }
        }
        Ok(())
    }

    /// Reads a value by name. Returns `None` for unknown names and
    /// before initialization (the namespace is not script-visible yet).
    pub fn read(&self, name: &str) -> Option<GlobalValue> {
        self.entries.get(name).map(|entry| entry.value.clone())
    }

    /// Stores a value and hands back the hook to run, without running
    /// it. Used by `external_write`, which must invoke the hook after
    /// the registry borrow is released.
    fn store(&mut self, name: &str, value: GlobalValue) -> Result<Option<WriteHook>, EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized {
                subsystem: "Globals",
            });
        }

        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.value = value;
                Ok(entry.on_write.clone())
            }
            None => {
                self.entries.insert(
                    name.to_owned(),
                    GlobalEntry {
                        value,
                        on_write: None,
                    },
                );
                Ok(None)
            }
        }
    }

    /// Script-initiated write: stores the value, then fires the write
    /// hook with the new value. This is the only hook-firing path.
    ///
    /// Associated function rather than a method: the registry borrow is
    /// dropped before the hook runs, so a hook that touches the
    /// registry does not panic the `RefCell`.
    pub fn external_write(
        registry: &SharedRegistry,
        name: &str,
        value: GlobalValue,
    ) -> Result<(), EngineError> {
        let hook = registry.borrow_mut().store(name, value.clone())?;
        if let Some(hook) = hook {
            trace!(target: "globals", "external write '{}' firing hook", name);
            hook(&value);
        }
        Ok(())
    }
}

impl Default for GlobalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
