use std::rc::Rc;

use log::{debug, error};
use mlua::{Function, Lua, Table, Thread, ThreadStatus, Value};

use super::{ContextCell, SceneGuard, SceneSlot, ScriptError};
use crate::core::input::KeyState;
use crate::scene::Scene;
use crate::scene::coroutine::{CoroutineScheduler, Resume, Routine, Wait};

/// A Lua thread driven by the coroutine scheduler.
pub struct LuaRoutine {
    thread: Thread,
    /// Passed to the body on the first resume only.
    owner: Option<Value>,
    started: bool,
    context: ContextCell,
    name: String,
}

impl LuaRoutine {
    pub(crate) fn new(
        thread: Thread,
        owner: Value,
        context: ContextCell,
        name: impl Into<String>,
    ) -> Self {
        Self {
            thread,
            owner: (!owner.is_nil()).then_some(owner),
            started: false,
            context,
            name: name.into(),
        }
    }
}

impl Routine for LuaRoutine {
    fn resume(&mut self, wait: &mut Wait) -> Result<Resume, ScriptError> {
        let previous = self.context.borrow_mut().wait.replace(Wait::default());

        let result = if self.started {
            self.thread.resume::<()>(())
        } else {
            self.started = true;
            match self.owner.take() {
                Some(owner) => self.thread.resume::<()>(owner),
                None => self.thread.resume::<()>(()),
            }
        };

        let requested = std::mem::replace(&mut self.context.borrow_mut().wait, previous);
        result?;

        if matches!(self.thread.status(), ThreadStatus::Resumable) {
            *wait = requested.unwrap_or_default();
            Ok(Resume::Suspended)
        } else {
            Ok(Resume::Completed)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A scene implemented by a Lua table.
///
/// Tables with a `Run` method become coroutine scenes: `Run` is the main
/// routine and the scene dies once it returns. Anything else must provide
/// `Tick(delta)`, called every frame; such a scene never dies on its own.
pub struct ScriptScene {
    name: String,
    object: Table,
    initialize_fn: Option<Function>,
    tick_fn: Option<Function>,
    draw_fn: Option<Function>,
    scheduler: Option<CoroutineScheduler<LuaRoutine>>,
    keys: KeyState,
    context: ContextCell,
}

impl ScriptScene {
    pub(crate) fn new(
        lua: &Lua,
        name: &str,
        object: Table,
        context: ContextCell,
    ) -> Result<Self, ScriptError> {
        let run_fn: Option<Function> = object.get("Run")?;
        let tick_fn: Option<Function> = object.get("Tick")?;

        // The main thread is created up front but first resumed on the
        // first tick, after Initialize has run.
        let scheduler = match run_fn {
            Some(run) => {
                let mut scheduler = CoroutineScheduler::new();
                scheduler.set_main(LuaRoutine::new(
                    lua.create_thread(run)?,
                    Value::Table(object.clone()),
                    Rc::clone(&context),
                    format!("{name}:Run"),
                ));
                Some(scheduler)
            }
            None if tick_fn.is_some() => None,
            None => return Err(ScriptError::MissingEntryPoint(format!("{name}: Run or Tick"))),
        };

        Ok(Self {
            name: name.to_string(),
            initialize_fn: object.get("Initialize")?,
            draw_fn: object.get("Draw")?,
            object,
            tick_fn,
            scheduler,
            keys: KeyState::default(),
            context,
        })
    }

    /// The scene table the script returned.
    pub fn object(&self) -> &Table {
        &self.object
    }

    pub fn is_coroutine_scene(&self) -> bool {
        self.scheduler.is_some()
    }

    fn slot(&self) -> SceneSlot {
        SceneSlot {
            name: self.name.clone(),
            keys: self.keys.clone(),
            spawner: self.scheduler.as_ref().map(CoroutineScheduler::spawner),
        }
    }

    fn call_method(&self, method: &str, function: Option<&Function>, delta: Option<f64>) {
        let Some(function) = function else {
            return;
        };
        let result = match delta {
            Some(delta) => function.call::<()>((self.object.clone(), delta)),
            None => function.call::<()>(self.object.clone()),
        };
        if let Err(e) = result {
            error!("{}:{method} failed: {e}", self.name);
        }
    }
}

impl Scene for ScriptScene {
    fn initialize(&mut self) {
        let slot = self.slot();
        let _guard = SceneGuard::enter(&self.context, slot);
        self.call_method("Initialize", self.initialize_fn.as_ref(), None);
        debug!(
            "{} initialized ({})",
            self.name,
            if self.is_coroutine_scene() { "coroutine" } else { "plain" }
        );
    }

    fn tick(&mut self, delta: f64, keys: &KeyState) {
        self.keys.clone_from(keys);
        let slot = self.slot();
        let _guard = SceneGuard::enter(&self.context, slot);
        match self.scheduler.as_mut() {
            Some(scheduler) => scheduler.tick(delta),
            None => self.call_method("Tick", self.tick_fn.as_ref(), Some(delta)),
        }
    }

    fn draw(&mut self) {
        let slot = self.slot();
        let _guard = SceneGuard::enter(&self.context, slot);
        self.call_method("Draw", self.draw_fn.as_ref(), None);
    }

    fn is_dead(&self) -> bool {
        self.scheduler.as_ref().is_some_and(CoroutineScheduler::is_dead)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
