use colored::Colorize;
use std::error::Error;
use std::fs::File;
use std::path::Path;

use trace_scope::processing::{ScopeProcessor, ScopeProcessorConfig};
use trace_scope::protocol::commands::*;
use trace_scope::protocol::element::{Element, ElementStream};
use trace_scope::render::{CollectSink, DisplayMode};
use trace_scope::utils::log::export_capture;

// -----------------------------------------------------------------------------
// CSV CAPTURE REPLAY
// -----------------------------------------------------------------------------

fn read_samples_from_csv(file_path: &str) -> Result<Vec<i32>, Box<dyn Error>> {
    let mut rdr = csv::Reader::from_reader(File::open(file_path)?);
    let mut samples = Vec::new();

    for result in rdr.records() {
        let record = result?;
        if let Some(value) = record.get(0) {
            samples.push(value.parse::<f64>()? as i32);
        }
    }

    Ok(samples)
}

/// Feed a recorded single-column CSV capture through the spectrum pipeline
/// and export the final window for inspection.
pub fn run(file_path: &str) -> Result<(), Box<dyn Error>> {
    if !Path::new(file_path).exists() {
        return Err(format!("Data file not found at path: {}", file_path).into());
    }

    let samples = read_samples_from_csv(file_path)?;
    println!("Replaying {} samples from {}", samples.len(), file_path);

    let mut processor = ScopeProcessor::new(ScopeProcessorConfig {
        display_mode: DisplayMode::Spectrum,
        ..Default::default()
    });
    let mut sink = CollectSink::new();

    let mut stream = ElementStream::new(vec![
        Element::Key(KEY_WINDOW),
        Element::Num(256),
        Element::Key(KEY_RATE),
        Element::Num(64),
        Element::End,
    ]);
    processor.process_elements(&mut stream, &mut sink);

    // Chunked like the device would send it, one data burst per message.
    for chunk in samples.chunks(256) {
        let mut elements = vec![Element::Key(KEY_DATA)];
        elements.extend(chunk.iter().map(|&s| Element::Num(s)));
        elements.push(Element::End);
        let mut stream = ElementStream::new(elements);
        processor.process_elements(&mut stream, &mut sink);
    }

    export_capture("output.csv", &processor.snapshot())?;
    println!(
        "{} frames presented, window of {} exported to {}",
        processor.frame_count().to_string().green(),
        processor.window_len(),
        "output.csv".white()
    );

    Ok(())
}
