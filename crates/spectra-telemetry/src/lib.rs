pub mod pipeline_metrics;

pub use pipeline_metrics::{FpsTracker, PipelineMetrics};
