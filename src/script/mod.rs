//! Lua script host for scenes.
//!
//! One host owns one Lua state. Scene primitives (`YieldTime`,
//! `YieldFrames`, `RunCoroutine`, `AddScene`, `IsKeyHeld`, `IsKeyTriggered`)
//! act on whatever execution context is active when they are called; scenes
//! install that context around every call into the script.

mod primitives;
mod scene;

pub use scene::{LuaRoutine, ScriptScene};

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;
use mlua::{Lua, Value};

use crate::core::input::KeyState;
use crate::scene::SceneSpawner;
use crate::scene::coroutine::{Spawner, Wait};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),
    #[error("missing entry point '{0}'")]
    MissingEntryPoint(String),
    #[error("script '{0}' did not return a scene table")]
    NotASceneTable(String),
    #[error("failed to read script {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The scene a primitive call belongs to.
#[derive(Clone)]
pub(crate) struct SceneSlot {
    pub name: String,
    pub keys: KeyState,
    /// Only coroutine scenes can start coroutines.
    pub spawner: Option<Spawner<LuaRoutine>>,
}

/// What the running script is allowed to touch right now.
#[derive(Default)]
pub(crate) struct ActiveContext {
    pub scene: Option<SceneSlot>,
    /// Set only while a routine is being resumed.
    pub wait: Option<Wait>,
    /// Where `AddScene` sends new scenes.
    pub scenes: Option<SceneSpawner>,
}

pub(crate) type ContextCell = Rc<RefCell<ActiveContext>>;

/// Installs a scene slot for the lifetime of the guard and restores the
/// previous one on drop.
pub(crate) struct SceneGuard<'a> {
    context: &'a ContextCell,
    previous: Option<SceneSlot>,
}

impl<'a> SceneGuard<'a> {
    pub fn enter(context: &'a ContextCell, slot: SceneSlot) -> Self {
        let previous = context.borrow_mut().scene.replace(slot);
        Self { context, previous }
    }
}

impl Drop for SceneGuard<'_> {
    fn drop(&mut self) {
        self.context.borrow_mut().scene = self.previous.take();
    }
}

pub struct ScriptHost {
    lua: Lua,
    context: ContextCell,
}

impl ScriptHost {
    pub fn new() -> Result<Self, ScriptError> {
        let lua = Lua::new();
        let context = ContextCell::default();
        primitives::register(&lua, &context)?;
        Ok(Self { lua, context })
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Lets scripts push scenes onto the stack behind `spawner`.
    pub fn attach_scenes(&self, spawner: SceneSpawner) {
        self.context.borrow_mut().scenes = Some(spawner);
    }

    /// Runs a chunk that returns a scene table and wraps it in a scene.
    pub fn load_scene(&self, name: &str, source: &str) -> Result<ScriptScene, ScriptError> {
        let value: Value = self
            .lua
            .load(source)
            .set_name(format!("@{name}"))
            .eval()?;
        let Value::Table(object) = value else {
            return Err(ScriptError::NotASceneTable(name.to_string()));
        };
        debug!("loaded scene script '{name}'");
        ScriptScene::new(&self.lua, name, object, Rc::clone(&self.context))
    }

    pub fn load_scene_file(&self, path: &Path) -> Result<ScriptScene, ScriptError> {
        let source = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_scene(&path.to_string_lossy(), &source)
    }
}
