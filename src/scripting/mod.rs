//=========================================================================
// Script Host
//=========================================================================
//
// The embedded Lua runtime and its bridge to the global registry.
//
// Script code sees one synchronized namespace: the `GLOBALS` table.
// Reads go through `__index` into the registry; writes go through
// `__newindex`, which stores into the registry and fires the entry's
// native write hook. Values live on the Rust side only; the Lua table
// itself stays empty so every access hits the metamethods.
//
// The per-frame `eventList` global is a plain table rebuilt from the
// aggregator snapshot before each logic hook.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod bindings;

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use log::{debug, info};
use mlua::{Function, Lua, Table, Value};

//=== Internal Dependencies ===============================================

use crate::core::error::{EngineError, TraceHandle};
use crate::core::events::{EventSnapshot, KeySym};
use crate::core::globals::{GlobalRegistry, GlobalValue, SharedRegistry};
use crate::core::platform_bridge::RenderSurface;
use crate::core::scheduler::FrameHooks;

//=== Error Conversion ====================================================

impl From<mlua::Error> for EngineError {
    fn from(err: mlua::Error) -> Self {
        EngineError::ScriptRuntime {
            message: err.to_string(),
        }
    }
}

//=== Hook Prelude ========================================================

// Installed before any game script runs, so an empty script still has
// callable hooks and the setter entry points.
const HOOK_PRELUDE: &str = r#"
tw_main = function()
    print("Main not set!")
end

tw_display = function()
    print("Display not set!")
end

setMain = function(fn)
    tw_main = fn
end

setDisplay = function(fn)
    tw_display = fn
end
"#;

/// Well-known name of the script logic hook.
pub const LOGIC_HOOK: &str = "tw_main";

/// Well-known name of the script render hook.
pub const RENDER_HOOK: &str = "tw_display";

//=== ScriptHost ==========================================================

/// Owns the Lua state and every native/script crossing point.
///
/// Constructed cold; `install_globals_bridge` arms it. Operations fail
/// with `NotInitialized` before that, mirroring the registry's own
/// fail-closed behavior.
pub struct ScriptHost {
    lua: Lua,
    registry: SharedRegistry,
    trace: TraceHandle,
    initialized: bool,
}

impl ScriptHost {
    pub fn new(registry: SharedRegistry, trace: TraceHandle) -> Self {
        Self {
            lua: Lua::new(),
            registry,
            trace,
            initialized: false,
        }
    }

    /// The raw Lua state, for binding installers.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Creates the `GLOBALS` table with its registry-backed metatable
    /// and installs the hook prelude (`tw_main`, `tw_display`,
    /// `setMain`, `setDisplay`).
    pub fn install_globals_bridge(&mut self) -> Result<(), EngineError> {
        if self.initialized {
            return Err(EngineError::AlreadyInitialized { subsystem: "Lua" });
        }

        let globals_table = self.lua.create_table()?;
        let meta = self.lua.create_table()?;

        let registry = Rc::clone(&self.registry);
        let trace = Rc::clone(&self.trace);
        let newindex =
            self.lua
                .create_function(move |_, (_t, key, value): (Table, String, Value)| {
                    let stored = coerce_global(&key, value, &trace)?;
                    GlobalRegistry::external_write(&registry, &key, stored)
                        .map_err(|err| mlua::Error::RuntimeError(err.to_string()))?;
                    Ok(())
                })?;

        let registry = Rc::clone(&self.registry);
        let index = self
            .lua
            .create_function(move |lua, (_t, key): (Table, String)| {
                match registry.borrow().read(&key) {
                    Some(value) => global_to_lua(lua, &value),
                    None => Ok(Value::Nil),
                }
            })?;

        meta.set("__newindex", newindex)?;
        meta.set("__index", index)?;
        globals_table.set_metatable(Some(meta));
        self.lua.globals().set("GLOBALS", globals_table)?;

        self.lua
            .load(HOOK_PRELUDE)
            .set_name("hook_prelude")
            .exec()?;

        self.initialized = true;
        info!(target: "script", "Lua runtime initialized, GLOBALS bridge installed");
        Ok(())
    }

    /// Installs a native callable under `name` in the script namespace.
    /// Rebinding an existing name overwrites the prior callable.
    pub fn bind(&self, name: &str, function: Function) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized { subsystem: "Lua" });
        }
        debug!(target: "script", "bound native function '{}'", name);
        self.lua.globals().set(name, function)?;
        Ok(())
    }

    /// Publishes an empty `eventList` so scripts can index it before
    /// the first frame.
    pub fn init_event_list(&self) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized { subsystem: "Lua" });
        }
        self.lua.globals().set("eventList", self.lua.create_table()?)?;
        Ok(())
    }

    /// Rebuilds the `eventList` global from the frame snapshot. Absent
    /// categories are absent keys, so scripts see nil for quiet ones.
    pub fn publish_snapshot(&self, snapshot: &EventSnapshot) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized { subsystem: "Lua" });
        }

        let event_list = self.lua.create_table()?;

        if let Some(keys) = snapshot.key_down() {
            event_list.set("keyDown", key_category(&self.lua, keys)?)?;
        }
        if let Some(keys) = snapshot.key_up() {
            event_list.set("keyUp", key_category(&self.lua, keys)?)?;
        }
        if let Some(keys) = snapshot.key_pressed() {
            event_list.set("keyPressed", key_category(&self.lua, keys)?)?;
        }
        if let Some(mouse) = snapshot.mouse() {
            let mouse_table = self.lua.create_table()?;
            for (button, record) in mouse {
                let entry = self.lua.create_table()?;
                entry.set("down", record.down)?;
                entry.set("x", record.x)?;
                entry.set("y", record.y)?;
                mouse_table.set(button.script_index(), entry)?;
            }
            event_list.set("mouse", mouse_table)?;
        }

        self.lua.globals().set("eventList", event_list)?;
        Ok(())
    }

    /// Loads and runs the game script file.
    pub fn load_script(&self, path: &Path) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized { subsystem: "Lua" });
        }

        let source = fs::read_to_string(path).map_err(|err| EngineError::ScriptRuntime {
            message: format!("cannot open {}: {}", path.display(), err),
        })?;

        self.lua
            .load(&source)
            .set_name(format!("@{}", path.display()))
            .exec()?;

        info!(target: "script", "game script '{}' loaded", path.display());
        Ok(())
    }

    /// Invokes a zero-argument script hook by global name.
    pub fn invoke_hook(&self, name: &str) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized { subsystem: "Lua" });
        }

        let value: Value = self.lua.globals().get(name)?;
        match value {
            Value::Function(hook) => hook.call::<()>(()).map_err(|err| {
                EngineError::ScriptRuntime {
                    message: err.to_string(),
                }
            }),
            _ => Err(EngineError::NotAFunction {
                name: name.to_owned(),
            }),
        }
    }
}

//=== Value Conversion ====================================================

/// Coerces a script value into the registry's closed union. Rejections
/// land on the trace and re-raise into the interpreter, so the write
/// never half-happens.
fn coerce_global(key: &str, value: Value, trace: &TraceHandle) -> mlua::Result<GlobalValue> {
    match value {
        Value::Boolean(b) => Ok(GlobalValue::Bool(b)),
        Value::Integer(n) => Ok(GlobalValue::Int(n)),
        Value::Number(n) if n.fract() == 0.0 => Ok(GlobalValue::Int(n as i64)),
        Value::String(s) => Ok(GlobalValue::Str(s.to_str()?.to_string())),
        other => {
            trace.borrow_mut().record(EngineError::InvalidArgument {
                message: format!(
                    "Lua: Error while setting {}: Unsupported value type ({})!",
                    key,
                    other.type_name()
                ),
            });
            Err(mlua::Error::RuntimeError("Unsupported value type.".into()))
        }
    }
}

fn global_to_lua(lua: &Lua, value: &GlobalValue) -> mlua::Result<Value> {
    match value {
        GlobalValue::Str(s) => Ok(Value::String(lua.create_string(s)?)),
        GlobalValue::Int(n) => Ok(Value::Integer(*n)),
        GlobalValue::Bool(b) => Ok(Value::Boolean(*b)),
    }
}

fn key_category(lua: &Lua, keys: &BTreeMap<KeySym, bool>) -> mlua::Result<Table> {
    let category = lua.create_table()?;
    let key_map = lua.create_table()?;
    for (sym, flag) in keys {
        key_map.set(sym.name(), *flag)?;
    }
    category.set("key", key_map)?;
    Ok(category)
}

//=== ScriptDriver ========================================================

/// Binds the script host and the render collaborator into the frame
/// hook contract the scheduler drives.
pub struct ScriptDriver {
    host: ScriptHost,
    surface: Rc<RefCell<dyn RenderSurface>>,
}

impl ScriptDriver {
    pub fn new(host: ScriptHost, surface: Rc<RefCell<dyn RenderSurface>>) -> Self {
        Self { host, surface }
    }
}

impl FrameHooks for ScriptDriver {
    fn run_logic(&mut self, snapshot: &EventSnapshot) -> Result<(), EngineError> {
        self.host.publish_snapshot(snapshot)?;
        self.host.invoke_hook(LOGIC_HOOK)
    }

    fn run_render(&mut self) -> Result<(), EngineError> {
        // Borrows must not outlive the statements: the hook body may
        // call drawing bindings that borrow the surface themselves.
        self.surface.borrow_mut().begin_frame();
        self.host.invoke_hook(RENDER_HOOK)?;
        self.surface.borrow_mut().present();
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Write;

    use crate::core::error::ErrorTrace;
    use crate::core::events::{EventAggregator, MouseButton};
    use crate::core::platform_bridge::{Rgb, TextureId};

    //--- Test Helpers -----------------------------------------------------

    fn ready_host() -> (ScriptHost, SharedRegistry, TraceHandle) {
        let registry = GlobalRegistry::shared();
        registry.borrow_mut().initialize().unwrap();
        let trace = ErrorTrace::shared();

        let mut host = ScriptHost::new(Rc::clone(&registry), Rc::clone(&trace));
        host.install_globals_bridge().unwrap();
        (host, registry, trace)
    }

    fn exec(host: &ScriptHost, source: &str) {
        host.lua().load(source).exec().unwrap();
    }

    /// Surface that counts frame bracketing calls.
    struct CountingSurface {
        begins: Cell<u32>,
        presents: Cell<u32>,
    }

    impl CountingSurface {
        fn new() -> Self {
            Self {
                begins: Cell::new(0),
                presents: Cell::new(0),
            }
        }
    }

    impl RenderSurface for CountingSurface {
        fn set_caption(&mut self, _title: &str) {}

        fn set_cursor_visible(&mut self, _visible: bool) {}

        fn begin_frame(&mut self) {
            self.begins.set(self.begins.get() + 1);
        }

        fn present(&mut self) {
            self.presents.set(self.presents.get() + 1);
        }

        fn load_texture(&mut self, _path: &str) -> Result<TextureId, EngineError> {
            Ok(TextureId(0))
        }

        fn draw_texture(
            &mut self,
            _texture: TextureId,
            _x: i32,
            _y: i32,
        ) -> Result<(), EngineError> {
            Ok(())
        }

        fn draw_line(
            &mut self,
            _x0: i32,
            _y0: i32,
            _x1: i32,
            _y1: i32,
            _color: Rgb,
        ) -> Result<(), EngineError> {
            Ok(())
        }
    }

    //=====================================================================
    // GLOBALS Bridge Tests
    //=====================================================================

    #[test]
    fn script_write_lands_in_the_registry() {
        let (host, registry, _) = ready_host();
        registry
            .borrow_mut()
            .register("gameName", "Untitled".into(), None)
            .unwrap();

        exec(&host, r#"GLOBALS.gameName = "Pong""#);

        assert_eq!(
            registry.borrow().read("gameName"),
            Some(GlobalValue::Str("Pong".into()))
        );
        exec(&host, r#"assert(GLOBALS.gameName == "Pong")"#);
    }

    #[test]
    fn script_write_fires_hook_after_store() {
        let (host, registry, _) = ready_host();
        let observed = Rc::new(RefCell::new(None));

        let inner = Rc::clone(&registry);
        let seen = Rc::clone(&observed);
        registry
            .borrow_mut()
            .register(
                "fpsCap",
                40.into(),
                Some(Rc::new(move |value| {
                    assert_eq!(inner.borrow().read("fpsCap").as_ref(), Some(value));
                    *seen.borrow_mut() = Some(value.clone());
                })),
            )
            .unwrap();

        exec(&host, "GLOBALS.fpsCap = 60");

        assert_eq!(*observed.borrow(), Some(GlobalValue::Int(60)));
    }

    #[test]
    fn native_write_skips_hook_but_reaches_script() {
        let (host, registry, _) = ready_host();
        let fired = Rc::new(Cell::new(0u32));

        let counter = Rc::clone(&fired);
        registry
            .borrow_mut()
            .register(
                "frameCount",
                0.into(),
                Some(Rc::new(move |_| counter.set(counter.get() + 1))),
            )
            .unwrap();

        registry.borrow_mut().write("frameCount", 7.into()).unwrap();

        assert_eq!(fired.get(), 0);
        exec(&host, "assert(GLOBALS.frameCount == 7)");
    }

    #[test]
    fn unknown_global_reads_nil() {
        let (host, _, _) = ready_host();
        exec(&host, "assert(GLOBALS.missing == nil)");
    }

    #[test]
    fn script_values_round_trip_all_arms() {
        let (host, registry, _) = ready_host();

        exec(&host, r#"GLOBALS.title = "abc""#);
        exec(&host, "GLOBALS.count = 12");
        exec(&host, "GLOBALS.float = 3.0");
        exec(&host, "GLOBALS.flag = false");

        let registry = registry.borrow();
        assert_eq!(registry.read("title"), Some(GlobalValue::Str("abc".into())));
        assert_eq!(registry.read("count"), Some(GlobalValue::Int(12)));
        assert_eq!(registry.read("float"), Some(GlobalValue::Int(3)));
        assert_eq!(registry.read("flag"), Some(GlobalValue::Bool(false)));
    }

    #[test]
    fn unsupported_value_type_is_rejected_and_traced() {
        let (host, registry, trace) = ready_host();

        exec(
            &host,
            r#"
            local ok, err = pcall(function() GLOBALS.bad = {} end)
            assert(not ok)
            assert(string.find(tostring(err), "Unsupported value type.", 1, true))
            "#,
        );

        assert_eq!(registry.borrow().read("bad"), None);

        let entries = trace.borrow_mut().drain();
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0], EngineError::InvalidArgument { .. }));
        assert!(entries[0].to_string().contains("bad"));
    }

    #[test]
    fn bridge_installs_only_once() {
        let (mut host, _, _) = ready_host();

        let err = host.install_globals_bridge().unwrap_err();

        assert!(matches!(err, EngineError::AlreadyInitialized { .. }));
        assert_eq!(err.to_string(), "Lua interface already initialized!");
    }

    #[test]
    fn operations_fail_closed_before_bridge_install() {
        let registry = GlobalRegistry::shared();
        registry.borrow_mut().initialize().unwrap();
        let host = ScriptHost::new(registry, ErrorTrace::shared());

        let err = host.invoke_hook(LOGIC_HOOK).unwrap_err();
        assert!(matches!(err, EngineError::NotInitialized { .. }));
        assert_eq!(err.to_string(), "Lua interface not initialized!");

        assert!(host.init_event_list().is_err());
        assert!(host.publish_snapshot(&EventSnapshot::default()).is_err());
    }

    //=====================================================================
    // Hook Tests
    //=====================================================================

    #[test]
    fn default_hooks_are_callable() {
        let (host, _, _) = ready_host();

        host.invoke_hook(LOGIC_HOOK).unwrap();
        host.invoke_hook(RENDER_HOOK).unwrap();
    }

    #[test]
    fn set_main_installs_the_logic_hook() {
        let (host, _, _) = ready_host();

        exec(&host, "setMain(function() marker = 41 end)");
        host.invoke_hook(LOGIC_HOOK).unwrap();

        exec(&host, "assert(marker == 41)");
    }

    #[test]
    fn set_display_installs_the_render_hook() {
        let (host, _, _) = ready_host();

        exec(&host, "setDisplay(function() drawn = true end)");
        host.invoke_hook(RENDER_HOOK).unwrap();

        exec(&host, "assert(drawn == true)");
    }

    #[test]
    fn non_function_hook_is_rejected() {
        let (host, _, _) = ready_host();

        exec(&host, "tw_main = 5");
        let err = host.invoke_hook(LOGIC_HOOK).unwrap_err();

        assert!(matches!(err, EngineError::NotAFunction { .. }));
        assert_eq!(err.to_string(), "Value is not a function!");
    }

    #[test]
    fn hook_error_carries_the_interpreter_message() {
        let (host, _, _) = ready_host();

        exec(&host, r#"setMain(function() error("kaboom") end)"#);
        let err = host.invoke_hook(LOGIC_HOOK).unwrap_err();

        match err {
            EngineError::ScriptRuntime { message } => assert!(message.contains("kaboom")),
            other => panic!("expected ScriptRuntime, got {:?}", other),
        }
    }

    //=====================================================================
    // Event List Tests
    //=====================================================================

    #[test]
    fn publish_structures_key_and_mouse_categories() {
        let (host, _, _) = ready_host();
        let mut aggregator = EventAggregator::new(Rc::new(Cell::new(false)));

        aggregator.record_key(KeySym::A, true);
        aggregator.record_key(KeySym::Escape, false);
        aggregator.record_mouse(true, MouseButton::Left, 3, 4);

        host.publish_snapshot(aggregator.snapshot()).unwrap();

        exec(
            &host,
            r#"
            assert(eventList.keyDown.key.a == true)
            assert(eventList.keyUp.key.escape == true)
            assert(eventList.keyPressed == nil)
            assert(eventList.mouse[1].down == true)
            assert(eventList.mouse[1].x == 3)
            assert(eventList.mouse[1].y == 4)
            assert(eventList.mouse[2] == nil)
            "#,
        );
    }

    #[test]
    fn publish_sticky_category_retains_release_state() {
        let (host, _, _) = ready_host();
        let mut aggregator = EventAggregator::new(Rc::new(Cell::new(true)));

        aggregator.record_key(KeySym::Space, true);
        aggregator.record_key(KeySym::A, false);

        host.publish_snapshot(aggregator.snapshot()).unwrap();

        exec(
            &host,
            r#"
            assert(eventList.keyPressed.key.space == true)
            assert(eventList.keyPressed.key.a == false)
            assert(eventList.keyDown == nil)
            assert(eventList.keyUp == nil)
            "#,
        );
    }

    #[test]
    fn publish_replaces_the_previous_frame() {
        let (host, _, _) = ready_host();
        let sticky = Rc::new(Cell::new(false));
        let mut aggregator = EventAggregator::new(Rc::clone(&sticky));

        aggregator.record_key(KeySym::A, true);
        host.publish_snapshot(aggregator.snapshot()).unwrap();

        aggregator.reset_if_not_sticky();
        host.publish_snapshot(aggregator.snapshot()).unwrap();

        exec(&host, "assert(eventList.keyDown == nil)");
    }

    #[test]
    fn init_event_list_publishes_an_empty_table() {
        let (host, _, _) = ready_host();

        host.init_event_list().unwrap();

        exec(&host, "assert(type(eventList) == 'table')");
        exec(&host, "assert(next(eventList) == nil)");
    }

    //=====================================================================
    // Script Loading Tests
    //=====================================================================

    #[test]
    fn load_script_executes_the_file() {
        let (host, registry, _) = ready_host();
        registry
            .borrow_mut()
            .register("gameName", "Untitled".into(), None)
            .unwrap();

        let mut file = tempfile::Builder::new()
            .suffix(".lua")
            .tempfile()
            .unwrap();
        writeln!(file, r#"GLOBALS.gameName = "Snake""#).unwrap();
        writeln!(file, "setMain(function() end)").unwrap();

        host.load_script(file.path()).unwrap();

        assert_eq!(
            registry.borrow().read("gameName"),
            Some(GlobalValue::Str("Snake".into()))
        );
    }

    #[test]
    fn load_script_missing_file_is_a_script_error() {
        let (host, _, _) = ready_host();

        let err = host
            .load_script(Path::new("/nonexistent/game.lua"))
            .unwrap_err();

        match err {
            EngineError::ScriptRuntime { message } => {
                assert!(message.contains("cannot open"));
            }
            other => panic!("expected ScriptRuntime, got {:?}", other),
        }
    }

    #[test]
    fn load_script_syntax_error_is_a_script_error() {
        let (host, _, _) = ready_host();

        let mut file = tempfile::Builder::new()
            .suffix(".lua")
            .tempfile()
            .unwrap();
        writeln!(file, "function broken(").unwrap();

        let err = host.load_script(file.path()).unwrap_err();
        assert!(matches!(err, EngineError::ScriptRuntime { .. }));
    }

    //=====================================================================
    // ScriptDriver Tests
    //=====================================================================

    #[test]
    fn driver_publishes_then_runs_logic() {
        let (host, _, _) = ready_host();
        exec(
            &host,
            "setMain(function() sawKey = eventList.keyDown.key.d end)",
        );

        let surface = Rc::new(RefCell::new(CountingSurface::new()));
        let mut driver = ScriptDriver::new(host, surface);

        let mut aggregator = EventAggregator::new(Rc::new(Cell::new(false)));
        aggregator.record_key(KeySym::D, true);

        driver.run_logic(aggregator.snapshot()).unwrap();

        exec(&driver.host, "assert(sawKey == true)");
    }

    #[test]
    fn driver_brackets_render_with_begin_and_present() {
        let (host, _, _) = ready_host();
        exec(&host, "setDisplay(function() end)");

        let surface = Rc::new(RefCell::new(CountingSurface::new()));
        let handle = Rc::clone(&surface);
        let mut driver = ScriptDriver::new(host, surface);

        driver.run_render().unwrap();

        assert_eq!(handle.borrow().begins.get(), 1);
        assert_eq!(handle.borrow().presents.get(), 1);
    }

    #[test]
    fn driver_skips_present_when_the_render_hook_fails() {
        let (host, _, _) = ready_host();
        exec(&host, r#"setDisplay(function() error("no") end)"#);

        let surface = Rc::new(RefCell::new(CountingSurface::new()));
        let handle = Rc::clone(&surface);
        let mut driver = ScriptDriver::new(host, surface);

        assert!(driver.run_render().is_err());
        assert_eq!(handle.borrow().begins.get(), 1);
        assert_eq!(handle.borrow().presents.get(), 0);
    }
}
