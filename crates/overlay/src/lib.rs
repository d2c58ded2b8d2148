pub mod config;
pub mod engine;
pub mod record;

pub use config::{ConfigError, OverlayConfig};
pub use engine::OverlayEngine;
pub use record::RenderRecord;
