pub mod app;
pub mod audio;
pub mod compositor;
pub mod config;
pub mod effect;
pub mod engine;
pub mod frame;
pub mod gradient;
pub mod lattice;
pub mod logging;
pub mod mask;
pub mod prefs;
pub mod render;
pub mod source;
pub mod terminal;
