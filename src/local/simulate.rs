use colored::Colorize;
use rand::Rng;

use trace_scope::processing::{ScopeProcessor, ScopeProcessorConfig};
use trace_scope::protocol::commands::*;
use trace_scope::protocol::element::{Element, ElementStream};
use trace_scope::protocol::packing::MODE_TABLE;
use trace_scope::render::CollectSink;

// -----------------------------------------------------------------------------
// SIMULATED DEVICE SESSION
// -----------------------------------------------------------------------------
//
// Stands in for an attached microcontroller: emits a configuration burst,
// then packed sample words for a noisy multi-tone signal with occasional
// pulse events, exactly as they would arrive over the tokenized transport.

const BASELINE_AMPLITUDE: f64 = 70.0;
const INCREMENT_TIME: f64 = 0.1;
const BURSTS: usize = 64;
const WORDS_PER_BURST: usize = 16;

const BACKGROUND_I_FREQ: f64 = 0.5;
const BACKGROUND_II_FREQ: f64 = 1.0;
const BACKGROUND_III_FREQ: f64 = 2.0;
const PULSE_FREQ: f64 = 13.0;
const PULSE_AMPLITUDE: f64 = 60.0;
const PULSE_ITERATIONS: usize = 24;

const TRIGGER_LEVEL: i32 = 160;

/// The 8-bit by 4 long-container mode; every word carries four consecutive
/// samples of the single channel.
const PACKING_KEY: i32 = KEY_PACKING_BASE + 3;

fn configuration_burst() -> Vec<Element> {
    vec![
        Element::Key(KEY_WINDOW),
        Element::Num(64),
        Element::Key(KEY_CHANNEL),
        Element::Num(0),
        Element::Key(KEY_LABEL),
        Element::Str("adc0".to_string()),
        Element::Key(KEY_COLOR),
        Element::Num(0x40c040),
        Element::Key(KEY_SCALE_MAX),
        Element::Num(255),
        Element::Key(KEY_HEIGHT),
        Element::Num(40),
        Element::Key(KEY_TRIG_MASK),
        Element::Num(0x80),
        Element::Key(KEY_TRIG_MATCH),
        Element::Num(0x80),
        Element::Key(KEY_HOLDOFF),
        Element::Num(8),
        Element::Key(KEY_RATE),
        Element::Num(4),
        Element::Key(PACKING_KEY),
        Element::End,
    ]
}

struct SignalSource {
    time: f64,
    pulse_remaining: usize,
    pulse_time: f64,
}

impl SignalSource {
    fn new() -> Self {
        Self {
            time: 0.0,
            pulse_remaining: 0,
            pulse_time: 0.0,
        }
    }

    fn next_sample(&mut self, rng: &mut impl Rng) -> i32 {
        let random_signal = rng.gen_range(-10..10) as f64;
        let mut n = 10.0 * (BACKGROUND_I_FREQ * self.time).sin()
            + BASELINE_AMPLITUDE / 2.0 * (BACKGROUND_II_FREQ * self.time).sin()
            + BASELINE_AMPLITUDE
            + 5.0 * (BACKGROUND_III_FREQ * self.time).sin()
            + random_signal;

        // A running pulse rides on top of the background.
        if self.pulse_remaining > 0 {
            n += PULSE_AMPLITUDE * (2.0 * std::f64::consts::PI * PULSE_FREQ * self.pulse_time).sin();
            self.pulse_remaining -= 1;
            self.pulse_time += INCREMENT_TIME;
        } else if rng.gen_range(0..100) < 2 {
            // 2% chance to start a pulse event
            self.pulse_remaining = PULSE_ITERATIONS;
            self.pulse_time = 0.0;
        }

        self.time += INCREMENT_TIME;
        (n as i32).clamp(0, 255)
    }
}

fn data_burst(source: &mut SignalSource, rng: &mut impl Rng) -> Vec<Element> {
    let mode = MODE_TABLE[(PACKING_KEY - KEY_PACKING_BASE) as usize];
    let mut elements = vec![Element::Key(KEY_DATA)];
    for _ in 0..WORDS_PER_BURST {
        let samples: Vec<i32> = (0..mode.samples_per_word)
            .map(|_| source.next_sample(rng))
            .collect();
        elements.push(Element::Num(mode.pack(&samples)));
    }
    elements.push(Element::End);
    elements
}

pub fn run() {
    let mut rng = rand::thread_rng();
    let mut processor = ScopeProcessor::new(ScopeProcessorConfig::default());
    let mut sink = CollectSink::new();

    let mut stream = ElementStream::new(configuration_burst());
    processor.process_elements(&mut stream, &mut sink);

    let mut source = SignalSource::new();
    for _ in 0..BURSTS {
        let mut stream = ElementStream::new(data_burst(&mut source, &mut rng));
        processor.process_elements(&mut stream, &mut sink);
    }

    // Echo the captured window as amplitude bars, flagging samples above
    // the trigger level.
    let snapshot = processor.snapshot();
    for &sample in &snapshot.channels[0] {
        let bar = "|".repeat((sample.max(0) as usize).min(200) / 2);
        if sample >= TRIGGER_LEVEL {
            println!("{:>4} {}", sample, bar.red());
        } else {
            println!("{:>4} {}", sample, bar.white());
        }
    }

    println!(
        "{} samples in window, {} triggers, {} frames, trigger {}",
        snapshot.channels[0].len(),
        processor.trigger_count().to_string().red(),
        processor.frame_count(),
        if snapshot.armed {
            "armed".green()
        } else {
            "disarmed".yellow()
        }
    );
}
