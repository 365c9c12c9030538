//=========================================================================
// Native Bindings
//=========================================================================
//
// Script-callable engine functions and the registered globals whose
// write hooks steer engine collaborators.
//
// Binding failures report on two layers: a detailed entry lands on the
// error trace, and a short message is raised into the interpreter so
// script `pcall` sees something terse. Surface failures additionally
// keep the surface's own entry, so the trace shows both the cause and
// the call that hit it.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crossbeam_channel::{Sender, TrySendError};
use log::{debug, trace};
use mlua::{Table, Value, Variadic};

//=== Internal Dependencies ===============================================

use crate::core::error::{EngineError, TraceHandle};
use crate::core::globals::{GlobalValue, SharedRegistry};
use crate::core::platform_bridge::{PlatformEvent, RenderSurface, Rgb, TextureId};
use crate::scripting::ScriptHost;

//=== Raise Helper ========================================================

/// Records the detailed entry, then builds the short interpreter error.
fn raise(trace: &TraceHandle, recorded: EngineError, script_message: &str) -> mlua::Error {
    trace.borrow_mut().record(recorded);
    mlua::Error::RuntimeError(script_message.to_string())
}

fn arity_error(trace: &TraceHandle, binding: &str) -> mlua::Error {
    raise(
        trace,
        EngineError::InvalidArgument {
            message: format!("Lua: Error while calling {}: Not enough arguments!", binding),
        },
        "Too few arguments.",
    )
}

//=== Quit Binding ========================================================

/// Installs `quit()`, which pushes a quit event toward the scheduler.
/// Extra arguments are tolerated and ignored.
///
/// The channel is drained by the same thread that is running the hook,
/// so the push must never block. A full queue drops the event with a
/// warning; the script can (and a quit loop will) repeat the call once
/// the scheduler has drained the backlog.
pub fn install_quit(
    host: &ScriptHost,
    trace: &TraceHandle,
    quit_tx: Sender<PlatformEvent>,
) -> Result<(), EngineError> {
    let trace = Rc::clone(trace);
    let quit = host
        .lua()
        .create_function(move |_, _args: Variadic<Value>| {
            match quit_tx.try_send(PlatformEvent::Quit) {
                Ok(()) => {
                    trace!(target: "script", "quit requested");
                    Ok(())
                }
                Err(TrySendError::Full(_)) => {
                    trace.borrow().warn("Event queue full, quit event dropped");
                    Ok(())
                }
                Err(TrySendError::Disconnected(_)) => Err(raise(
                    &trace,
                    EngineError::Platform {
                        message: "Lua: Failed to push quit event!".into(),
                    },
                    "Failed to signal for quit.",
                )),
            }
        })?;
    host.bind("quit", quit)
}

//=== Drawing Bindings ====================================================

/// Installs `loadTexture`, `drawTexture` and `drawLine` against the
/// render surface.
pub fn install_render_bindings(
    host: &ScriptHost,
    trace: &TraceHandle,
    surface: &Rc<RefCell<dyn RenderSurface>>,
) -> Result<(), EngineError> {
    let surface_ref = Rc::clone(surface);
    let trace_ref = Rc::clone(trace);
    let load_texture = host
        .lua()
        .create_function(move |_, args: Variadic<Value>| {
            if args.is_empty() {
                return Err(arity_error(&trace_ref, "loadTexture"));
            }

            let load_failed = |trace: &TraceHandle| {
                raise(
                    trace,
                    EngineError::Platform {
                        message: "Lua: Error while calling loadTexture!".into(),
                    },
                    "Error while loading texture.",
                )
            };

            let path = match &args[0] {
                Value::String(s) => s.to_str()?.to_string(),
                Value::Integer(n) => n.to_string(),
                Value::Number(n) => n.to_string(),
                _ => return Err(load_failed(&trace_ref)),
            };

            match surface_ref.borrow_mut().load_texture(&path) {
                Ok(texture) => Ok(texture.0),
                Err(err) => {
                    trace_ref.borrow_mut().record(err);
                    Err(load_failed(&trace_ref))
                }
            }
        })?;
    host.bind("loadTexture", load_texture)?;

    let surface_ref = Rc::clone(surface);
    let trace_ref = Rc::clone(trace);
    let draw_texture = host
        .lua()
        .create_function(move |lua, args: Variadic<Value>| {
            if args.len() < 3 {
                return Err(arity_error(&trace_ref, "drawTexture"));
            }

            let invalid_texture = |trace: &TraceHandle| {
                raise(
                    trace,
                    EngineError::InvalidArgument {
                        message: "Lua: Error while calling drawTexture: Invalid texture!".into(),
                    },
                    "Invalid texture.",
                )
            };

            let handle = match lua.coerce_number(args[0].clone())? {
                Some(n) if n >= 0.0 && n.fract() == 0.0 => TextureId(n as u32),
                _ => return Err(invalid_texture(&trace_ref)),
            };
            let x = lua.coerce_number(args[1].clone())?.unwrap_or(0.0) as i32;
            let y = lua.coerce_number(args[2].clone())?.unwrap_or(0.0) as i32;

            match surface_ref.borrow_mut().draw_texture(handle, x, y) {
                Ok(()) => Ok(()),
                Err(err) => {
                    trace_ref.borrow_mut().record(err);
                    Err(invalid_texture(&trace_ref))
                }
            }
        })?;
    host.bind("drawTexture", draw_texture)?;

    let surface_ref = Rc::clone(surface);
    let trace_ref = Rc::clone(trace);
    let draw_line = host
        .lua()
        .create_function(move |lua, args: Variadic<Value>| {
            if args.len() != 5 {
                return Err(arity_error(&trace_ref, "drawLine"));
            }

            let x0 = lua.coerce_number(args[0].clone())?.unwrap_or(0.0) as i32;
            let y0 = lua.coerce_number(args[1].clone())?.unwrap_or(0.0) as i32;
            let x1 = lua.coerce_number(args[2].clone())?.unwrap_or(0.0) as i32;
            let y1 = lua.coerce_number(args[3].clone())?.unwrap_or(0.0) as i32;

            let color_table: Table = match &args[4] {
                Value::Table(t) => t.clone(),
                _ => {
                    return Err(raise(
                        &trace_ref,
                        EngineError::InvalidArgument {
                            message:
                                "Lua: Error while trying to convert color: Given index is not a table!"
                                    .into(),
                        },
                        "Given parameter not a table.",
                    ))
                }
            };
            if color_table.len()? < 3 {
                return Err(raise(
                    &trace_ref,
                    EngineError::InvalidArgument {
                        message: "Lua: Error while trying to convert color: Not enough parameters!"
                            .into(),
                    },
                    "Too few parameters.",
                ));
            }
            let mut channels = [0u8; 3];
            for (slot, index) in channels.iter_mut().zip(1i64..) {
                let component: Value = color_table.get(index)?;
                *slot = lua.coerce_number(component)?.unwrap_or(0.0) as u8;
            }
            let color = Rgb {
                r: channels[0],
                g: channels[1],
                b: channels[2],
            };

            match surface_ref.borrow_mut().draw_line(x0, y0, x1, y1, color) {
                Ok(()) => Ok(()),
                Err(err) => {
                    trace_ref.borrow_mut().record(err);
                    Err(raise(
                        &trace_ref,
                        EngineError::Platform {
                            message: "Lua: Error while calling drawLine!".into(),
                        },
                        "Error while drawing line.",
                    ))
                }
            }
        })?;
    host.bind("drawLine", draw_line)?;

    debug!(target: "script", "render bindings installed");
    Ok(())
}

//=== Collaborator Globals ================================================

/// Registers the display-facing globals. `gameName` retitles the
/// window on write; `fpsCap` feeds the scheduler's shared cap cell,
/// with non-positive or non-integer writes traced and ignored by the
/// cap (the stored value still changes). Screen dimensions are plain
/// values with no hooks.
#[allow(clippy::too_many_arguments)]
pub fn register_display_globals(
    registry: &SharedRegistry,
    surface: &Rc<RefCell<dyn RenderSurface>>,
    fps_cap: &Rc<Cell<u32>>,
    trace: &TraceHandle,
    title: &str,
    fps: u32,
    width: u32,
    height: u32,
) -> Result<(), EngineError> {
    let surface_ref = Rc::clone(surface);
    registry.borrow_mut().register(
        "gameName",
        GlobalValue::Str(title.to_owned()),
        Some(Rc::new(move |value| {
            surface_ref.borrow_mut().set_caption(&value.to_string());
        })),
    )?;

    let cap_ref = Rc::clone(fps_cap);
    let trace_ref = Rc::clone(trace);
    registry.borrow_mut().register(
        "fpsCap",
        GlobalValue::Int(fps as i64),
        Some(Rc::new(move |value| match value.as_int() {
            Some(n) if n > 0 => cap_ref.set(n.min(u32::MAX as i64) as u32),
            _ => trace_ref.borrow_mut().record(EngineError::InvalidArgument {
                message: "Lua: Error while setting fpsCap: Invalid value!".into(),
            }),
        })),
    )?;

    registry
        .borrow_mut()
        .register("screenWidth", GlobalValue::Int(width as i64), None)?;
    registry
        .borrow_mut()
        .register("screenHeight", GlobalValue::Int(height as i64), None)?;

    debug!(target: "script", "display globals registered");
    Ok(())
}

/// Registers `showCursor`, defaulting to visible.
pub fn register_cursor_global(
    registry: &SharedRegistry,
    surface: &Rc<RefCell<dyn RenderSurface>>,
) -> Result<(), EngineError> {
    let surface_ref = Rc::clone(surface);
    registry.borrow_mut().register(
        "showCursor",
        GlobalValue::Bool(true),
        Some(Rc::new(move |value| {
            surface_ref.borrow_mut().set_cursor_visible(value.truthy());
        })),
    )
}

/// Registers `stickyKeys`, defaulting to the per-frame event mode.
pub fn register_sticky_global(
    registry: &SharedRegistry,
    sticky: &Rc<Cell<bool>>,
) -> Result<(), EngineError> {
    let sticky_ref = Rc::clone(sticky);
    registry.borrow_mut().register(
        "stickyKeys",
        GlobalValue::Bool(false),
        Some(Rc::new(move |value| {
            sticky_ref.set(value.truthy());
        })),
    )
}

//=========================================================================
// Unit Tests
//=========================================================================
