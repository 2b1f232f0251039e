use std::fs;

use tempfile::TempDir;

use spectra_app::sink::{CsvSink, SpectrumBatch, SpectrumSink};

fn batch<'a>(
    elapsed_secs: f64,
    power_a: &'a [f32],
    power_b: &'a [f32],
) -> SpectrumBatch<'a> {
    SpectrumBatch {
        batch_index: 1,
        elapsed_secs,
        frequency_step: 10.0,
        index_min: 0,
        index_max: power_a.len() - 1,
        frames_left: 0,
        power_a,
        power_b,
    }
}

#[test]
fn filenames_are_whole_microseconds_zero_padded() {
    let dir = TempDir::new().unwrap();
    let mut sink = CsvSink::create(dir.path(), 0.0).unwrap();

    let power = [0.5f32; 4];
    sink.write(&batch(0.128, &power, &power)).unwrap();
    sink.write(&batch(12.9, &power, &power)).unwrap();

    let mut names: Vec<String> = fs::read_dir(sink.folder())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["0000128000.csv", "0012900000.csv"]);
}

#[test]
fn rows_below_threshold_on_both_channels_are_skipped() {
    let dir = TempDir::new().unwrap();
    let mut sink = CsvSink::create(dir.path(), 1e-3).unwrap();

    // Only index 2 crosses the threshold, and only on channel A.
    let power_a = [0.0, 1e-5, 0.25, 0.0];
    let power_b = [0.0, 1e-5, 1e-6, 0.0];
    sink.write(&batch(1.0, &power_a, &power_b)).unwrap();

    let path = sink.folder().join("0001000000.csv");
    let text = fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Frequency,Power A,Power B");
    assert_eq!(lines.len(), 2, "exactly one data row expected");
    assert_eq!(lines[1], "20.00,0.250000,0.000001");
}

#[test]
fn silent_batch_still_produces_a_header_only_file() {
    let dir = TempDir::new().unwrap();
    let mut sink = CsvSink::create(dir.path(), 1.0).unwrap();

    let power = [0.0f32; 4];
    sink.write(&batch(0.5, &power, &power)).unwrap();

    let text = fs::read_to_string(sink.folder().join("0000500000.csv")).unwrap();
    assert_eq!(text.trim(), "Frequency,Power A,Power B");
}

#[test]
fn finish_removes_folder_when_nothing_was_written() {
    let dir = TempDir::new().unwrap();
    let mut sink = CsvSink::create(dir.path(), 0.0).unwrap();
    let folder = sink.folder().to_path_buf();
    assert!(folder.is_dir());

    sink.finish().unwrap();
    assert!(!folder.exists());
}

#[test]
fn finish_keeps_folder_with_archived_batches() {
    let dir = TempDir::new().unwrap();
    let mut sink = CsvSink::create(dir.path(), 0.0).unwrap();
    let folder = sink.folder().to_path_buf();

    let power = [0.1f32; 2];
    sink.write(&batch(0.25, &power, &power)).unwrap();
    sink.finish().unwrap();

    assert!(folder.is_dir());
    assert_eq!(fs::read_dir(&folder).unwrap().count(), 1);
}

#[test]
fn only_the_index_window_is_considered() {
    let dir = TempDir::new().unwrap();
    let mut sink = CsvSink::create(dir.path(), 0.0).unwrap();

    let power = [1.0, 2.0, 3.0, 4.0, 5.0];
    let mut b = batch(2.0, &power, &power);
    b.index_min = 1;
    b.index_max = 3;
    sink.write(&b).unwrap();

    let text = fs::read_to_string(sink.folder().join("0002000000.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4, "header plus rows for indexes 1..=3");
    assert!(lines[1].starts_with("10.00,"));
    assert!(lines[3].starts_with("30.00,"));
}
