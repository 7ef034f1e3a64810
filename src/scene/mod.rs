pub mod coroutine;

use log::{debug, info};

use crate::core::input::KeyState;
use crate::scene::coroutine::Spawner;

/// Queue of scenes waiting to join a [`SceneManager`].
pub type SceneSpawner = Spawner<Box<dyn Scene>>;

pub trait Scene {
    fn initialize(&mut self);
    fn tick(&mut self, delta: f64, keys: &KeyState);
    fn draw(&mut self);
    /// A dead scene is removed from the stack after the tick that killed it.
    fn is_dead(&self) -> bool;

    fn name(&self) -> &str {
        "scene"
    }
}

/// Stack of running scenes, ticked in the order they were added.
#[derive(Default)]
pub struct SceneManager {
    scenes: Vec<Box<dyn Scene>>,
    incoming: SceneSpawner,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes `scene` and pushes it on top of the stack.
    pub fn add(&mut self, mut scene: Box<dyn Scene>) {
        info!("scene added: {}", scene.name());
        scene.initialize();
        self.scenes.push(scene);
    }

    /// Handle for adding scenes while the stack is being ticked.
    pub fn spawner(&self) -> SceneSpawner {
        self.incoming.clone()
    }

    /// Ticks every scene, drops the dead ones, then adds the scenes queued
    /// through [`SceneManager::spawner`] during the pass.
    pub fn tick(&mut self, delta: f64, keys: &KeyState) {
        for scene in self.scenes.iter_mut() {
            scene.tick(delta, keys);
        }
        self.scenes.retain(|scene| {
            let dead = scene.is_dead();
            if dead {
                debug!("scene removed: {}", scene.name());
            }
            !dead
        });
        for scene in self.incoming.take_all() {
            self.add(scene);
        }
    }

    pub fn draw(&mut self) {
        for scene in self.scenes.iter_mut() {
            scene.draw();
        }
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}
