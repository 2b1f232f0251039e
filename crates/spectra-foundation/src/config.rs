use serde::Deserialize;

use crate::error::ConfigError;

/// Parameters of one capture/process run, fixed before the pipeline starts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frames consumed per processing iteration; also the transform length.
    pub batch_size: usize,
    /// Wall-clock seconds of audio to capture.
    pub capture_secs: f32,
    /// Lower bound of the reported spectrum window (bin index).
    pub index_min: usize,
    /// Upper bound of the reported spectrum window (bin index, inclusive).
    pub index_max: usize,
    /// A CSV row is skipped when both channels are below this power.
    pub record_threshold: f32,
    /// Buffer depth at which a growth warning is logged.
    pub high_water_frames: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 2048,
            capture_secs: 10.0,
            index_min: 0,
            index_max: 40,
            record_threshold: 5.0e-7,
            high_water_frames: 1 << 20,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size < 2 || self.batch_size % 2 != 0 {
            return Err(ConfigError::InvalidBatchSize {
                size: self.batch_size,
            });
        }
        if self.index_min > self.index_max {
            return Err(ConfigError::InvalidIndexRange {
                min: self.index_min,
                max: self.index_max,
            });
        }
        if !(self.capture_secs > 0.0) {
            return Err(ConfigError::InvalidDuration {
                secs: self.capture_secs,
            });
        }
        if !self.record_threshold.is_finite() || self.record_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                threshold: self.record_threshold,
            });
        }
        Ok(())
    }

    /// Length of the one-sided spectrum for this batch size.
    pub fn oneside_size(&self) -> usize {
        self.batch_size / 2 + 1
    }

    /// Reported bin window clamped into `0..oneside_size`.
    pub fn clamped_index_range(&self, oneside_size: usize) -> (usize, usize) {
        let max = self.index_max.min(oneside_size.saturating_sub(1));
        let min = self.index_min.min(max);
        (min, max)
    }

    /// Seconds of audio covered by one batch.
    pub fn time_step(&self, sample_rate: u32) -> f64 {
        self.batch_size as f64 / sample_rate as f64
    }

    /// Frequency resolution of one spectrum bin, in Hz.
    pub fn frequency_step(&self, sample_rate: u32) -> f32 {
        sample_rate as f32 / self.batch_size as f32
    }

    /// Total frames the capture thread must observe before it stops.
    pub fn target_frames(&self, sample_rate: u32) -> u64 {
        (self.capture_secs as f64 * sample_rate as f64) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = PipelineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.oneside_size(), 1025);
    }

    #[test]
    fn odd_batch_size_rejected() {
        let cfg = PipelineConfig {
            batch_size: 15,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidBatchSize { size: 15 })
        ));
    }

    #[test]
    fn batch_size_below_two_rejected() {
        let cfg = PipelineConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn inverted_index_range_rejected() {
        let cfg = PipelineConfig {
            index_min: 41,
            index_max: 40,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidIndexRange { min: 41, max: 40 })
        ));
    }

    #[test]
    fn index_range_clamped_to_oneside() {
        let cfg = PipelineConfig {
            batch_size: 16,
            index_min: 3,
            index_max: 500,
            ..Default::default()
        };
        // oneside is 9 bins, so the window must end at 8
        assert_eq!(cfg.clamped_index_range(cfg.oneside_size()), (3, 8));
    }

    #[test]
    fn min_follows_max_when_clamped() {
        let cfg = PipelineConfig {
            batch_size: 16,
            index_min: 20,
            index_max: 500,
            ..Default::default()
        };
        assert_eq!(cfg.clamped_index_range(cfg.oneside_size()), (8, 8));
    }

    #[test]
    fn steps_follow_sample_rate() {
        let cfg = PipelineConfig {
            batch_size: 2048,
            ..Default::default()
        };
        assert!((cfg.time_step(48_000) - 2048.0 / 48_000.0).abs() < 1e-12);
        assert!((cfg.frequency_step(48_000) - 48_000.0 / 2048.0).abs() < 1e-6);
        assert_eq!(cfg.target_frames(48_000), 480_000);
    }
}
