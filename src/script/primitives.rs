use std::rc::Rc;

use log::warn;
use mlua::{Function, Lua, Value};

use super::{ContextCell, LuaRoutine, ScriptScene};
use crate::core::input::KeyState;
use crate::scene::coroutine::Wait;

// The yield itself has to happen on the Lua side of the call boundary.
const PRELUDE: &str = r#"
return function(set_wait_time, set_wait_frames)
    function YieldTime(seconds)
        if set_wait_time(seconds) then coroutine.yield() end
    end
    function YieldFrames(frames)
        if set_wait_frames(frames) then coroutine.yield() end
    end
end
"#;

fn lua_err(msg: impl Into<String>) -> mlua::Error {
    mlua::Error::RuntimeError(msg.into())
}

/// Stores `wait` for the routine being resumed. Returns false (after a
/// warning) when no routine is running.
fn request_wait(context: &ContextCell, primitive: &str, wait: Wait) -> bool {
    let mut ctx = context.borrow_mut();
    match ctx.wait.as_mut() {
        Some(slot) => {
            *slot = wait;
            true
        }
        None => {
            warn!("{primitive} called outside a coroutine; ignored");
            false
        }
    }
}

fn read_key(
    context: &ContextCell,
    primitive: &str,
    code: i64,
    read: fn(&KeyState, usize) -> bool,
) -> bool {
    let ctx = context.borrow();
    let Some(scene) = ctx.scene.as_ref() else {
        warn!("{primitive} called outside a scene; returning false");
        return false;
    };
    usize::try_from(code).is_ok_and(|idx| read(&scene.keys, idx))
}

pub(super) fn register(lua: &Lua, context: &ContextCell) -> mlua::Result<()> {
    let globals = lua.globals();

    let ctx = Rc::clone(context);
    let set_wait_time = lua.create_function(move |_, seconds: f64| {
        Ok(request_wait(&ctx, "YieldTime", Wait::Time(seconds)))
    })?;

    let ctx = Rc::clone(context);
    let set_wait_frames = lua.create_function(move |_, frames: i64| {
        Ok(request_wait(&ctx, "YieldFrames", Wait::Frames(frames)))
    })?;

    let install: Function = lua.load(PRELUDE).set_name("=prelude").eval()?;
    install
        .call::<()>((set_wait_time, set_wait_frames))
        .map_err(|e| lua_err(format!("scene prelude failed: {e}")))?;

    let ctx = Rc::clone(context);
    globals.set(
        "IsKeyHeld",
        lua.create_function(move |_, code: i64| {
            Ok(read_key(&ctx, "IsKeyHeld", code, KeyState::is_held))
        })?,
    )?;

    let ctx = Rc::clone(context);
    globals.set(
        "IsKeyTriggered",
        lua.create_function(move |_, code: i64| {
            Ok(read_key(&ctx, "IsKeyTriggered", code, KeyState::is_triggered))
        })?,
    )?;

    let ctx = Rc::clone(context);
    globals.set(
        "RunCoroutine",
        lua.create_function(move |lua, (body, owner): (Value, Value)| {
            let Value::Function(body) = body else {
                warn!("RunCoroutine expects a function; ignored");
                return Ok(());
            };
            let spawner = {
                let borrowed = ctx.borrow();
                let Some(scene) = borrowed.scene.as_ref() else {
                    warn!("RunCoroutine called outside a scene; ignored");
                    return Ok(());
                };
                let Some(spawner) = scene.spawner.clone() else {
                    warn!("RunCoroutine called from a scene without coroutines; ignored");
                    return Ok(());
                };
                spawner
            };
            let thread = lua.create_thread(body)?;
            spawner.spawn(LuaRoutine::new(thread, owner, Rc::clone(&ctx), "coroutine"));
            Ok(())
        })?,
    )?;

    let ctx = Rc::clone(context);
    globals.set(
        "AddScene",
        lua.create_function(move |lua, object: Value| {
            let Value::Table(object) = object else {
                warn!("AddScene expects a scene table; ignored");
                return Ok(false);
            };
            let (parent, scenes) = {
                let borrowed = ctx.borrow();
                let Some(scene) = borrowed.scene.as_ref() else {
                    warn!("AddScene called outside a scene; ignored");
                    return Ok(false);
                };
                let Some(scenes) = borrowed.scenes.clone() else {
                    warn!("AddScene called with no scene stack attached; ignored");
                    return Ok(false);
                };
                (scene.name.clone(), scenes)
            };
            let name = format!("{parent}+{}", scenes.len() + 1);
            match ScriptScene::new(lua, &name, object, Rc::clone(&ctx)) {
                Ok(scene) => {
                    scenes.spawn(Box::new(scene));
                    Ok(true)
                }
                Err(e) => {
                    warn!("AddScene from {parent} rejected: {e}");
                    Ok(false)
                }
            }
        })?,
    )?;

    Ok(())
}
