use trace_scope::config::ScopeConfig;
use trace_scope::processing::{ScopeProcessor, ScopeProcessorConfig};
use trace_scope::protocol::commands::*;
use trace_scope::protocol::element::{Element, ElementStream};
use trace_scope::protocol::packing::PackingMode;
use trace_scope::render::{CollectSink, DisplayMode, RenderPrimitive, SUBPIXEL_BITS};

fn key(k: i32) -> Element {
    Element::Key(k)
}

fn num(n: i32) -> Element {
    Element::Num(n)
}

#[test]
fn triggered_capture_end_to_end() {
    let mut processor = ScopeProcessor::new(ScopeProcessorConfig::default());
    let mut sink = CollectSink::new();

    let mut elements = vec![
        key(KEY_WINDOW),
        num(8),
        key(KEY_TRIG_MASK),
        num(3),
        key(KEY_TRIG_MATCH),
        num(1),
        key(KEY_TRIG_OFFSET),
        num(2),
        key(KEY_DATA),
    ];
    elements.extend([0, 0, 2, 3, 1, 0, 1, 3].into_iter().map(num));
    elements.push(Element::End);

    let mut stream = ElementStream::new(elements);
    processor.process_elements(&mut stream, &mut sink);

    // The tap sees the matching transition exactly once before the stream
    // ends; the frame is released once the window is full.
    assert_eq!(processor.trigger_count(), 1);
    assert_eq!(processor.frame_count(), 1);

    let snapshot = processor.snapshot();
    assert_eq!(snapshot.fill, 8);
    assert_eq!(snapshot.channels[0], vec![0, 0, 2, 3, 1, 0, 1, 3]);
    // readBack(0) after the feed is the last fed value.
    assert_eq!(*snapshot.channels[0].last().unwrap(), 3);

    // Scope mapping emits one dot per window sample.
    assert_eq!(sink.frames.len(), 1);
    assert_eq!(sink.frames[0].primitives.len(), 8);
}

#[test]
fn packed_cosine_reaches_its_spectrum_bin() {
    // Seed from a configuration file: spectrum display, signed 8-bit
    // samples packed four to a word.
    let mut file = ScopeConfig::default();
    file.processor.display_mode = DisplayMode::Spectrum;
    file.capture.window_len = 32;
    file.capture.packing.bits_per_sample = 8;
    file.capture.packing.samples_per_word = 4;
    file.capture.packing.sign_extend = true;
    file.channels[0].scale_max = 128;
    let mut processor = ScopeProcessor::from_config(&file);
    let mut sink = CollectSink::new();

    let mode = PackingMode {
        bits_per_sample: 8,
        samples_per_word: 4,
        sign_extend: true,
        alt_order: false,
    };
    let n = 32usize;

    // Cosine at bin 4 of a 32-point window, centered on zero so its bin
    // dominates the spectrum.
    let samples: Vec<i32> = (0..n)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * 4.0 * i as f64 / n as f64;
            (100.0 * phase.cos()).round() as i32
        })
        .collect();
    let mut elements = vec![key(KEY_DATA)];
    for chunk in samples.chunks(mode.samples_per_word as usize) {
        elements.push(num(mode.pack(chunk)));
    }
    elements.push(Element::End);

    let mut stream = ElementStream::new(elements);
    processor.process_elements(&mut stream, &mut sink);

    assert!(processor.frame_count() >= 1);
    let frame = sink.frames.last().unwrap();

    // Bins 1..=15 are mapped; the tallest dot must sit at bin 4.
    let mut best = (0, i32::MIN);
    for primitive in &frame.primitives {
        match *primitive {
            RenderPrimitive::Dot { x, y, .. } => {
                let bin = (x >> SUBPIXEL_BITS) + 1; // first_bin offset
                let level = -(y >> SUBPIXEL_BITS); // taller dots sit higher
                if level > best.1 {
                    best = (bin, level);
                }
            }
            _ => panic!("spectrum frames are made of dots"),
        }
    }
    assert_eq!(best.0, 4);
}

#[test]
fn clear_between_messages_restarts_the_capture() {
    let mut processor = ScopeProcessor::new(ScopeProcessorConfig::default());
    let mut sink = CollectSink::new();

    let mut first = vec![key(KEY_WINDOW), num(8), key(KEY_DATA)];
    first.extend((1..=5).map(num));
    first.push(Element::End);
    let mut stream = ElementStream::new(first);
    processor.process_elements(&mut stream, &mut sink);
    assert_eq!(processor.snapshot().fill, 5);

    let second = vec![key(KEY_CLEAR), key(KEY_DATA), num(9), Element::End];
    let mut stream = ElementStream::new(second);
    processor.process_elements(&mut stream, &mut sink);

    let snapshot = processor.snapshot();
    assert_eq!(snapshot.fill, 1);
    assert_eq!(snapshot.channels[0], vec![9]);
}
