// src/recorder.rs
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
pub const CSV_HEADER: &str = "Time (s),Signal (V)";
/// Writes the recorded signal as `time,value` rows.
///
/// Times are `index / sample_rate` rounded to two decimals. Returns the
/// number of data rows written.
pub fn write_history_csv<W: Write>(
    out: W,
    signal: &[f64],
    sample_rate: u32,
) -> io::Result<usize> {
    let mut w = BufWriter::new(out);
    writeln!(w, "{CSV_HEADER}")?;
    let interval = 1.0 / sample_rate.max(1) as f64;
    for (i, value) in signal.iter().enumerate() {
        let t = (i as f64 * interval * 100.0).round() / 100.0;
        writeln!(w, "{t:.2},{value}")?;
    }
    w.flush()?;
    Ok(signal.len())
}
pub fn export_history_csv(path: &Path, signal: &[f64], sample_rate: u32) -> io::Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_history_csv(File::create(path)?, signal, sample_rate)
}
/// Timestamped file name under `dir`, e.g. `exports/signal_1700000000.csv`.
pub fn timestamped_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    dir.join(format!("{stem}_{timestamp}.{extension}"))
}
#[cfg(test)]
mod tests {
    use super::*;
    fn rows(csv: &str) -> Vec<(f64, f64)> {
        csv.lines()
            .skip(1)
            .map(|line| {
                let (t, v) = line.split_once(',').unwrap();
                (t.parse().unwrap(), v.parse().unwrap())
            })
            .collect()
    }
    #[test]
    fn one_row_per_history_entry() {
        let signal: Vec<f64> = (0..250).map(|i| i as f64 * 0.1).collect();
        let mut out = Vec::new();
        let n = write_history_csv(&mut out, &signal, 100).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(n, 250);
        assert_eq!(text.lines().next(), Some(CSV_HEADER));
        let parsed = rows(&text);
        assert_eq!(parsed.len(), 250);
        for (i, (t, v)) in parsed.iter().enumerate() {
            assert!((t - i as f64 / 100.0).abs() < 1e-9);
            assert_eq!(*v, signal[i]);
        }
        assert!(parsed.windows(2).all(|w| w[1].0 > w[0].0));
    }
    #[test]
    fn times_are_rounded_to_hundredths() {
        let mut out = Vec::new();
        write_history_csv(&mut out, &[1.0, 2.0, 3.0, 4.0], 3).unwrap();
        let text = String::from_utf8(out).unwrap();
        let times: Vec<&str> = text.lines().skip(1).map(|l| l.split(',').next().unwrap()).collect();
        assert_eq!(times, vec!["0.00", "0.33", "0.67", "1.00"]);
    }
    #[test]
    fn empty_history_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        assert_eq!(export_history_csv(&path, &[], 10).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap().trim_end(), CSV_HEADER);
    }
    #[test]
    fn timestamped_paths_keep_extension() {
        let path = timestamped_path(Path::new("exports"), "signal", "csv");
        assert!(path.starts_with("exports"));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("csv"));
    }
}
