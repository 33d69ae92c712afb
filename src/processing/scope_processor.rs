use super::channels::{Channel, ChannelBank, MAX_CHANNELS};
use super::governor::RateGovernor;
use super::history::HistoryBuffer;
use super::trigger::TriggerEngine;
use crate::analysis::fft::FftContext;
use crate::analysis::fixed::Fixed;
use crate::config::ScopeConfig;
use crate::protocol::commands;
use crate::protocol::element::ElementStream;
use crate::protocol::packing::{PackingMode, UNPACKED};
use crate::render::mapper::{self, ColorMode};
use crate::render::{DisplayMode, RenderPrimitive, RenderSink, SUBPIXEL_BITS};
use crate::utils::log::log_to_file;

// -----------------------------------------------------------------------------
// SCOPE PROCESSOR COMPONENT
// -----------------------------------------------------------------------------
//
// The single pipeline behind every display variant: decode the element
// stream, unpack sample words, push history, run the trigger and the rate
// governor, and on a gated pass map the window (or its spectrum) into render
// primitives for the attached sink. Ingestion is synchronous and never
// allocates; only the analysis pass builds scratch buffers.

pub struct ScopeProcessorConfig {
    pub verbose: bool,
    pub enable_debug_logging: bool,
    pub display_mode: DisplayMode,
    pub color_mode: ColorMode,
}

impl Default for ScopeProcessorConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            enable_debug_logging: false,
            display_mode: DisplayMode::Scope,
            color_mode: ColorMode::Rgb,
        }
    }
}

/// What the device echo-back interface reports: the reachable window per
/// channel (oldest first) and the trigger arming state.
pub struct CaptureSnapshot {
    pub channels: Vec<Vec<i32>>,
    pub armed: bool,
    pub fill: u32,
}

pub struct ScopeProcessor {
    pub index: usize,
    config: ScopeProcessorConfig,
    channels: ChannelBank,
    mode: PackingMode,
    history: HistoryBuffer,
    trigger: TriggerEngine,
    governor: RateGovernor,
    fft: FftContext,
    selected: usize,
    pending_trigger: bool,
    trigger_count: u64,
    frame_count: u64,
    spectro_column: u16,
}

impl ScopeProcessor {
    pub fn new(config: ScopeProcessorConfig) -> Self {
        let channels = ChannelBank::new();
        let history = HistoryBuffer::new(channels.len(), 256);
        Self {
            index: 0,
            config,
            channels,
            mode: UNPACKED,
            history,
            trigger: TriggerEngine::new(Default::default()),
            governor: RateGovernor::new(1),
            fft: FftContext::for_window(256, 0, false),
            selected: 0,
            pending_trigger: false,
            trigger_count: 0,
            frame_count: 0,
            spectro_column: 0,
        }
    }

    /// Seed a processor from a configuration file. Element-stream commands
    /// override any of this at runtime.
    pub fn from_config(file: &ScopeConfig) -> Self {
        let mut processor = Self::new(ScopeProcessorConfig {
            verbose: file.processor.verbose,
            enable_debug_logging: file.processor.enable_debug_logging,
            display_mode: file.processor.display_mode,
            color_mode: file.processor.color_mode,
        });
        processor.channels = ChannelBank::from_channels(file.channels.clone());
        let window = file.capture.window_len.clamp(4, 2048);
        processor.history = HistoryBuffer::new(processor.channels.len(), window);
        processor.governor = RateGovernor::new(file.capture.rate_divisor);
        processor.trigger = TriggerEngine::new(file.trigger.clone());
        processor.mode = PackingMode {
            bits_per_sample: file.capture.packing.bits_per_sample.clamp(1, 32),
            samples_per_word: file.capture.packing.samples_per_word.clamp(1, 32),
            sign_extend: file.capture.packing.sign_extend,
            alt_order: file.capture.packing.alt_order,
        };
        processor.rebuild_fft(file.fft.log_scale);
        processor
            .fft
            .set_bin_range(file.fft.first_bin, file.fft.last_bin);
        processor
    }

    pub fn trigger_count(&self) -> u64 {
        self.trigger_count
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn is_armed(&self) -> bool {
        self.trigger.is_armed()
    }

    pub fn window_len(&self) -> u32 {
        self.history.window_len()
    }

    pub fn packing_mode(&self) -> PackingMode {
        self.mode
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            channels: (0..self.channels.len())
                .map(|c| self.history.snapshot(c))
                .collect(),
            armed: self.trigger.is_armed(),
            fill: self.history.fill(),
        }
    }

    /// Reset capture state: buffer fill, trigger arming, governor phase and
    /// the pending-analysis latch. Channel and scale metadata survive.
    pub fn clear(&mut self, sink: &mut dyn RenderSink) {
        self.history.reset();
        self.trigger.reset();
        self.governor.reset();
        self.pending_trigger = false;
        self.spectro_column = 0;
        sink.clear();
    }

    /// Consume one tokenized message: configuration keywords and sample
    /// data, in device order. Unrecognized elements are skipped, so newer
    /// devices keep working against this host.
    pub fn process_elements(&mut self, stream: &mut ElementStream, sink: &mut dyn RenderSink) {
        while !stream.at_end() {
            match stream.next_key() {
                Some(key) => self.apply_key(key, stream, sink),
                None => stream.skip(),
            }
        }
    }

    fn apply_key(&mut self, key: i32, stream: &mut ElementStream, sink: &mut dyn RenderSink) {
        if let Some(mode) = commands::packing_mode_for_key(key) {
            self.mode = mode;
            return;
        }
        match key {
            commands::KEY_WINDOW => {
                let n = commands::clamp(stream.next_num().unwrap_or(256), 4, 2048) as u32;
                self.history.set_window_len(n);
                let log_scale = self.fft.log_scale();
                self.rebuild_fft(log_scale);
            }
            commands::KEY_CHANNEL => {
                let index = stream.next_num().unwrap_or(0).max(0) as usize;
                if self.channels.ensure(index) {
                    self.selected = index;
                    if self.channels.len() != self.history.channels() {
                        // Interleave layout changed; the old capture cannot
                        // be read under the new geometry.
                        self.history =
                            HistoryBuffer::new(self.channels.len(), self.history.window_len());
                        self.trigger.reset();
                        self.pending_trigger = false;
                    }
                } else {
                    // Past the channel cap: swallow this definition's
                    // follow-up commands instead of mutating a real channel.
                    self.selected = MAX_CHANNELS;
                }
            }
            commands::KEY_LABEL => {
                let label = stream.next_str().unwrap_or("").to_string();
                if let Some(ch) = self.channels.get_mut(self.selected) {
                    ch.label = label;
                }
            }
            commands::KEY_COLOR => {
                let color = stream.next_num().unwrap_or(0xffffff) as u32 & 0x00ff_ffff;
                if let Some(ch) = self.channels.get_mut(self.selected) {
                    ch.color = color;
                }
            }
            commands::KEY_BIT_WIDTH => {
                let width = commands::clamp(stream.next_num().unwrap_or(8), 1, 32) as u32;
                if let Some(ch) = self.channels.get_mut(self.selected) {
                    ch.bit_width = width;
                }
            }
            commands::KEY_SCALE_MAX => {
                let max = stream.next_num().unwrap_or(255).max(1) as i64;
                if let Some(ch) = self.channels.get_mut(self.selected) {
                    ch.scale_max = max;
                }
            }
            commands::KEY_MAG_SHIFT => {
                let shift = commands::clamp(stream.next_num().unwrap_or(0), 0, 11) as u32;
                if let Some(ch) = self.channels.get_mut(self.selected) {
                    ch.magnitude_shift = shift;
                }
                if self.selected == self.trigger.config().channel {
                    let log_scale = self.fft.log_scale();
                    self.rebuild_fft(log_scale);
                }
            }
            commands::KEY_BASELINE => {
                let baseline = stream.next_num().unwrap_or(0);
                if let Some(ch) = self.channels.get_mut(self.selected) {
                    ch.baseline = baseline;
                }
            }
            commands::KEY_HEIGHT => {
                let height = commands::clamp(stream.next_num().unwrap_or(64), 1, 4096);
                if let Some(ch) = self.channels.get_mut(self.selected) {
                    ch.display_height = height;
                }
            }
            commands::KEY_GRID => {
                let flags = stream.next_num().unwrap_or(0) as u32;
                if let Some(ch) = self.channels.get_mut(self.selected) {
                    ch.grid_flags = flags;
                }
            }
            commands::KEY_TRIG_MASK => {
                self.trigger.set_mask(stream.next_num().unwrap_or(0));
            }
            commands::KEY_TRIG_MATCH => {
                self.trigger.set_match_value(stream.next_num().unwrap_or(0));
            }
            commands::KEY_TRIG_OFFSET => {
                let top = self.history.window_len() as i32 - 1;
                let offset = commands::clamp(stream.next_num().unwrap_or(0), 0, top);
                self.trigger.set_offset(offset as u32);
            }
            commands::KEY_HOLDOFF => {
                let holdoff = commands::clamp(stream.next_num().unwrap_or(2), 2, 2048);
                self.trigger.set_holdoff(holdoff);
            }
            commands::KEY_RATE => {
                let divisor = commands::clamp(stream.next_num().unwrap_or(1), 1, 2048);
                self.governor.set_divisor(divisor as u32);
            }
            commands::KEY_LOG_SCALE => {
                let on = stream.next_num().unwrap_or(0) != 0;
                self.fft.set_log_scale(on);
            }
            commands::KEY_CLEAR => self.clear(sink),
            commands::KEY_DATA => {
                while let Some(word) = stream.next_num() {
                    self.process_word(word, sink);
                }
            }
            // Unrecognized keyword: ignore it, the protocol is
            // forward-compatible. Its arguments fall to the skip path.
            _ => {}
        }
    }

    /// Unpack one transmitted word and run the ingestion path for each
    /// decoded slot.
    pub fn process_word(&mut self, word: i32, sink: &mut dyn RenderSink) {
        let per_word = self.mode.samples_per_word;
        if self.channels.len() > 1 {
            // Interleaved: one word carries one time slot across channels;
            // values past the channel count are dropped, missing ones read
            // as zero.
            let count = self.channels.len();
            let mut slot = [0i32; MAX_CHANNELS];
            for i in 0..count.min(per_word as usize) {
                slot[i] = self.mode.unpack(word, i as u32);
            }
            self.push_and_gate(&slot[..count], sink);
        } else {
            for i in 0..per_word {
                let value = self.mode.unpack(word, i);
                self.push_and_gate(&[value], sink);
            }
        }
    }

    fn push_and_gate(&mut self, slot: &[i32], sink: &mut dyn RenderSink) {
        self.history.push_slot(slot);
        self.index += 1;

        if !self.trigger.free_running() {
            let offset = self.trigger.config().offset;
            if self.history.fill() > offset {
                let channel = self.trigger.config().channel.min(self.channels.len() - 1);
                let tap = self.history.read_back(offset, channel);
                if self.trigger.advance(tap) {
                    self.trigger_count += 1;
                    self.pending_trigger = true;
                    if self.config.verbose {
                        println!("trigger fired at sample {}", self.index);
                    }
                    if self.config.enable_debug_logging {
                        log_to_file(
                            "trace-scope.log",
                            &format!("trigger fired - index: {}, tap: {}", self.index, tap),
                        )
                        .ok();
                    }
                }
            }
        }

        let ticked = self.governor.tick();
        if ticked
            && self.history.is_window_full()
            && (self.trigger.free_running() || self.pending_trigger)
        {
            self.run_analysis(sink);
            self.pending_trigger = false;
        }
    }

    /// One gated pipeline pass: map the captured window (or its spectrum)
    /// into primitives and present the frame.
    fn run_analysis(&mut self, sink: &mut dyn RenderSink) {
        sink.clear();
        match self.config.display_mode {
            DisplayMode::Logic => self.map_logic(sink),
            DisplayMode::Scope => self.map_scope(sink),
            DisplayMode::ScopeXY => self.map_xy(sink),
            DisplayMode::Spectrum => self.map_spectrum(sink),
            DisplayMode::Spectrogram => self.map_spectrogram(sink),
        }
        sink.present();
        self.frame_count += 1;
        if self.config.enable_debug_logging {
            log_to_file(
                "trace-scope.log",
                &format!("frame {} presented - index: {}", self.frame_count, self.index),
            )
            .ok();
        }
    }

    fn map_logic(&self, sink: &mut dyn RenderSink) {
        let fill = self.history.fill();
        for c in 0..self.channels.len() {
            let ch = match self.channels.get(c) {
                Some(ch) => ch,
                None => continue,
            };
            for k in 0..fill {
                let sample = self.history.read_back(k, c);
                let level = if sample != 0 { ch.display_height } else { 0 };
                sink.primitive(RenderPrimitive::Dot {
                    x: ((fill - 1 - k) as i32) << SUBPIXEL_BITS,
                    y: (ch.baseline - level) << SUBPIXEL_BITS,
                    color: ch.color,
                    opacity: 255,
                });
            }
        }
    }

    fn map_scope(&self, sink: &mut dyn RenderSink) {
        let fill = self.history.fill();
        let log_scale = self.fft.log_scale();
        for c in 0..self.channels.len() {
            let ch = match self.channels.get(c) {
                Some(ch) => ch,
                None => continue,
            };
            let scale = Fixed::from_f64(ch.display_height as f64 / ch.scale_max as f64);
            for k in 0..fill {
                let sample = self.history.read_back(k, c) as i64;
                let amplitude = if log_scale {
                    sample.signum() * mapper::log_map(sample.abs(), ch.scale_max)
                } else {
                    sample
                };
                let level =
                    mapper::linear_map(amplitude, scale, -ch.display_height, ch.display_height);
                sink.primitive(RenderPrimitive::Dot {
                    x: ((fill - 1 - k) as i32) << SUBPIXEL_BITS,
                    y: (ch.baseline - level) << SUBPIXEL_BITS,
                    color: ch.color,
                    opacity: 255,
                });
            }
        }
    }

    /// XY/polar variant: channel 0 carries the magnitude, channel 1 the
    /// angle in turn units.
    fn map_xy(&self, sink: &mut dyn RenderSink) {
        let ch = match self.channels.get(0) {
            Some(ch) => ch,
            None => return,
        };
        let fill = self.history.fill();
        let log_scale = self.fft.log_scale();
        let scale = Fixed::from_f64(ch.display_height as f64 / ch.scale_max as f64);
        for k in 0..fill {
            let magnitude = self.history.read_back(k, 0).max(0) as i64;
            let phase = if self.channels.len() > 1 {
                self.history.read_back(k, 1) as u32
            } else {
                0
            };
            let amplitude = if log_scale {
                mapper::log_map(magnitude, ch.scale_max)
            } else {
                magnitude
            };
            let radius =
                mapper::linear_map(amplitude, scale, -ch.display_height, ch.display_height);
            let (x, y) = mapper::polar_to_xy(radius as i64, phase);
            sink.primitive(RenderPrimitive::Dot {
                x: (x as i32) << SUBPIXEL_BITS,
                y: (ch.baseline - y as i32) << SUBPIXEL_BITS,
                color: ch.color,
                opacity: 255,
            });
        }
    }

    fn spectrum_input(&self) -> Vec<i32> {
        let n = self.fft.size() as u32;
        let channel = self.trigger.config().channel.min(self.channels.len() - 1);
        let take = n.min(self.history.fill());
        (0..take)
            .rev()
            .map(|k| self.history.read_back(k, channel))
            .collect()
    }

    fn map_spectrum(&self, sink: &mut dyn RenderSink) {
        let channel = self.trigger.config().channel.min(self.channels.len() - 1);
        let ch = match self.channels.get(channel) {
            Some(ch) => ch,
            None => return,
        };
        let spectrum = self.fft.transform(&self.spectrum_input());
        let scale = Fixed::from_f64(ch.display_height as f64 / ch.scale_max as f64);
        let ceiling = ch.scale_max.max(1);
        for bin in self.fft.first_bin()..=self.fft.last_bin() {
            let power = spectrum.power[bin] as i64;
            let amplitude = if self.fft.log_scale() {
                mapper::log_map(power, ch.scale_max)
            } else {
                power
            };
            let level = mapper::linear_map(amplitude, scale, 0, ch.display_height);
            let intensity = (mapper::log_map(power.min(ceiling), ceiling) * 255 / ceiling) as u8;
            let color = self
                .config
                .color_mode
                .apply(intensity, spectrum.phase[bin], ch.color);
            sink.primitive(RenderPrimitive::Dot {
                x: ((bin - self.fft.first_bin()) as i32) << SUBPIXEL_BITS,
                y: (ch.baseline - level) << SUBPIXEL_BITS,
                color,
                opacity: 255,
            });
        }
    }

    fn map_spectrogram(&mut self, sink: &mut dyn RenderSink) {
        let spectrum = self.fft.transform(&self.spectrum_input());
        let channel = self.trigger.config().channel.min(self.channels.len() - 1);
        let ceiling = self
            .channels
            .get(channel)
            .map(|ch| ch.scale_max)
            .unwrap_or(255)
            .max(1);
        for bin in self.fft.first_bin()..=self.fft.last_bin() {
            let power = (spectrum.power[bin] as i64).min(ceiling);
            let color_index = (mapper::log_map(power, ceiling) * 255 / ceiling) as u8;
            sink.primitive(RenderPrimitive::Cell {
                column: self.spectro_column,
                row: (bin - self.fft.first_bin()) as u16,
                color_index,
            });
        }
        self.spectro_column = self.spectro_column.wrapping_add(1);
    }

    fn rebuild_fft(&mut self, log_scale: bool) {
        let channel = self.trigger.config().channel.min(self.channels.len() - 1);
        let shift = self
            .channels
            .get(channel)
            .map(|ch| ch.magnitude_shift)
            .unwrap_or(0);
        let first = self.fft.first_bin();
        let last = self.fft.last_bin();
        self.fft = FftContext::for_window(self.history.window_len(), shift, log_scale);
        self.fft.set_bin_range(first, last);
    }
}
