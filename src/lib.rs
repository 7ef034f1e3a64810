pub mod config;
pub mod core;
pub mod game;
pub mod scene;
pub mod script;
