pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod geometry;
pub mod objects;
pub mod effects;
pub mod history;
pub mod scene;
pub mod transform;
pub mod animation;
pub mod surface;
pub mod engine;
pub mod input;
pub mod render;
pub mod canvas;
pub mod commands;
pub mod project;

pub use engine::AnimationEngine;
pub use error::{EngineError, EngineResult};
pub use types::*;
pub use objects::*;
