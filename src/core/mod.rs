//! Core engine module
//!
//! The window loop, its configuration and frame statistics

mod config;
mod engine;
mod stats;

pub use config::{ConfigError, EngineConfig, RenderSettings};
pub use engine::{Engine, EngineContext, EngineError, Game};
pub use stats::FrameStats;
