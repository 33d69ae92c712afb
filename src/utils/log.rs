use crate::processing::scope_processor::CaptureSnapshot;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Logs a message to a file with timestamp
///
/// # Arguments
///
/// * `filename` - The name of the log file (created under `logs/`)
/// * `message` - The message to log
pub fn log_to_file(filename: &str, message: &str) -> io::Result<()> {
    // Create directory if it doesn't exist
    let log_dir = "logs";
    if !Path::new(log_dir).exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    let path = format!("{}/{}", log_dir, filename);

    // Open file in append mode, create if it doesn't exist
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    writeln!(file, "[{}] {}", timestamp, message)?;
    file.flush()?;

    Ok(())
}

/// Logs a message to a file with a descriptive header line.
pub fn log_with_header(filename: &str, header: &str, message: &str) -> io::Result<()> {
    let formatted_message = format!("===== {} =====\n{}", header, message);
    log_to_file(filename, &formatted_message)
}

/// Writes a capture snapshot as CSV: one row per time slot (oldest first),
/// one column per channel, for offline inspection of what the echo-back
/// interface would report.
pub fn export_capture<P: AsRef<Path>>(path: P, snapshot: &CaptureSnapshot) -> io::Result<()> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let headers: Vec<String> = (0..snapshot.channels.len())
        .map(|c| format!("channel{}", c))
        .collect();
    writer
        .write_record(&headers)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let rows = snapshot.fill as usize;
    for row in 0..rows {
        let record: Vec<String> = snapshot
            .channels
            .iter()
            .map(|ch| ch.get(row).copied().unwrap_or(0).to_string())
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    }
    writer.flush()?;

    Ok(())
}
