//! Cooperative routine scheduling.
//!
//! A scene owns one main routine plus any number of coroutines started while
//! it runs. Each tick services the coroutines in the order they were started,
//! then the main routine. A routine only gives control back by suspending
//! with a [`Wait`] or by completing.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use log::{error, trace};

use crate::script::ScriptError;

/// How long a suspended routine sleeps before its next resume.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Wait {
    Frames(i64),
    Time(f64),
}

impl Default for Wait {
    /// Due on the next tick.
    fn default() -> Self {
        Self::Time(0.0)
    }
}

impl Wait {
    /// Counts one tick off the wait. Returns true once it has run out.
    pub fn tick(&mut self, delta: f64) -> bool {
        match self {
            Self::Frames(frames) => {
                *frames -= 1;
                *frames <= 0
            }
            Self::Time(time) => {
                *time -= delta;
                *time <= 0.0
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resume {
    /// Yielded; `wait` holds how long to sleep.
    Suspended,
    Completed,
}

/// An execution context the scheduler can resume.
pub trait Routine {
    /// Runs until the routine suspends or completes. A routine that suspends
    /// writes the wait it asked for into `wait`.
    fn resume(&mut self, wait: &mut Wait) -> Result<Resume, ScriptError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "routine"
    }
}

struct Entry<R> {
    routine: R,
    wait: Wait,
}

impl<R: Routine> Entry<R> {
    fn new(routine: R) -> Self {
        Self {
            routine,
            wait: Wait::default(),
        }
    }

    /// Counts down the wait and resumes when due. Returns true while the
    /// routine is still alive.
    fn service(&mut self, delta: f64) -> bool {
        if !self.wait.tick(delta) {
            return true;
        }
        match self.routine.resume(&mut self.wait) {
            Ok(Resume::Suspended) => true,
            Ok(Resume::Completed) => {
                trace!("{} completed", self.routine.name());
                false
            }
            Err(e) => {
                error!("{} failed: {e}", self.routine.name());
                false
            }
        }
    }
}

/// Shared queue for starting work from inside a running routine. The owner
/// drains it at a point of its choosing: the scheduler at the start of its
/// next tick, the scene manager after its tick pass.
pub struct Spawner<R> {
    queue: Rc<RefCell<VecDeque<R>>>,
}

impl<R> Default for Spawner<R> {
    fn default() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }
}

impl<R> Clone for Spawner<R> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<R> Spawner<R> {
    pub fn spawn(&self, item: R) {
        self.queue.borrow_mut().push_back(item);
    }

    /// Empties the queue in spawn order.
    pub fn take_all(&self) -> Vec<R> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

pub struct CoroutineScheduler<R> {
    main: Option<Entry<R>>,
    coroutines: Vec<Entry<R>>,
    pending: Spawner<R>,
    finished: bool,
}

impl<R: Routine> Default for CoroutineScheduler<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Routine> CoroutineScheduler<R> {
    pub fn new() -> Self {
        Self {
            main: None,
            coroutines: Vec::new(),
            pending: Spawner::default(),
            finished: false,
        }
    }

    /// Installs the main routine. Replaces (and drops) any previous one.
    pub fn set_main(&mut self, routine: R) {
        self.main = Some(Entry::new(routine));
        self.finished = false;
    }

    pub fn spawner(&self) -> Spawner<R> {
        self.pending.clone()
    }

    pub fn spawn(&mut self, routine: R) {
        self.coroutines.push(Entry::new(routine));
    }

    pub fn tick(&mut self, delta: f64) {
        // Take the queue first so routines spawning during this tick never
        // hold the borrow.
        let spawned = self.pending.take_all();
        self.coroutines.extend(spawned.into_iter().map(Entry::new));

        self.coroutines.retain_mut(|entry| entry.service(delta));

        if let Some(main) = self.main.as_mut()
            && !main.service(delta)
        {
            self.main = None;
            self.finished = true;
        }
    }

    /// True once the main routine has completed.
    pub fn is_dead(&self) -> bool {
        self.finished
    }

    /// Coroutines currently scheduled, excluding ones spawned this tick.
    pub fn active_count(&self) -> usize {
        self.coroutines.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
