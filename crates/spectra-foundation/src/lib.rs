pub mod config;
pub mod error;
pub mod status;

pub use config::PipelineConfig;
pub use error::{AudioError, ConfigError};
pub use status::{PipelineStatus, SharedStatus, StatusGuard};
