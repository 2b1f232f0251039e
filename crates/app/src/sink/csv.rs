use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use super::{SinkError, SpectrumBatch, SpectrumSink};

/// Archival sink: one CSV file per batch inside a timestamped run folder.
///
/// A row is written only when at least one channel's power reaches the
/// threshold; a batch with no audible content still produces a file with
/// just the header, matching the per-batch file naming contract.
pub struct CsvSink {
    folder: PathBuf,
    threshold: f32,
    files_written: u64,
}

impl CsvSink {
    /// Creates the run folder `<base_dir>/YYMMDD_HHMMSS`.
    pub fn create(base_dir: &Path, threshold: f32) -> Result<Self, SinkError> {
        let folder_name = Local::now().format("%y%m%d_%H%M%S").to_string();
        let folder = base_dir.join(folder_name);
        fs::create_dir_all(&folder)?;
        tracing::info!(folder = %folder.display(), "CSV archive folder created");
        Ok(Self {
            folder,
            threshold,
            files_written: 0,
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// File name: elapsed time in whole microseconds, zero-padded to 10
    /// digits.
    fn batch_path(&self, elapsed_secs: f64) -> PathBuf {
        let micros = (elapsed_secs * 1e6) as u64;
        self.folder.join(format!("{micros:010}.csv"))
    }
}

impl SpectrumSink for CsvSink {
    fn write(&mut self, batch: &SpectrumBatch<'_>) -> Result<(), SinkError> {
        let path = self.batch_path(batch.elapsed_secs);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(["Frequency", "Power A", "Power B"])?;

        for j in batch.index_min..=batch.index_max {
            let power_a = batch.power_a[j];
            let power_b = batch.power_b[j];
            if power_a < self.threshold && power_b < self.threshold {
                continue;
            }
            writer.write_record(&[
                format!("{:.2}", j as f32 * batch.frequency_step),
                format!("{power_a:.6}"),
                format!("{power_b:.6}"),
            ])?;
        }
        writer.flush()?;
        self.files_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if self.files_written == 0 {
            // Nothing was archived; leave no empty folder behind.
            if let Err(e) = fs::remove_dir(&self.folder) {
                tracing::debug!(
                    folder = %self.folder.display(),
                    "could not remove empty archive folder: {e}"
                );
            }
        } else {
            tracing::info!(
                files = self.files_written,
                folder = %self.folder.display(),
                "CSV archive complete"
            );
        }
        Ok(())
    }
}
