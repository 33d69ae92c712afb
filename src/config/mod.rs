use crate::processing::channels::Channel;
use crate::processing::trigger::TriggerConfig;
use crate::render::mapper::ColorMode;
use crate::render::DisplayMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScopeConfig {
    pub processor: ProcessorSection,
    pub capture: CaptureSection,
    pub channels: Vec<Channel>,
    pub trigger: TriggerConfig,
    pub fft: FftSection,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProcessorSection {
    pub verbose: bool,
    pub enable_debug_logging: bool,
    pub display_mode: DisplayMode,
    pub color_mode: ColorMode,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CaptureSection {
    pub window_len: u32,
    pub rate_divisor: u32,
    pub packing: PackingSection,
}

/// File-side packing selection. The element stream can override it at any
/// time; the table-selected modes always clear both flags.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PackingSection {
    pub bits_per_sample: u32,
    pub samples_per_word: u32,
    pub sign_extend: bool,
    pub alt_order: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FftSection {
    pub log_scale: bool,
    pub first_bin: usize,
    pub last_bin: usize,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            processor: ProcessorSection {
                verbose: false,
                enable_debug_logging: false,
                display_mode: DisplayMode::Scope,
                color_mode: ColorMode::Rgb,
            },
            capture: CaptureSection {
                window_len: 256,
                rate_divisor: 1,
                packing: PackingSection {
                    bits_per_sample: 32,
                    samples_per_word: 1,
                    sign_extend: false,
                    alt_order: false,
                },
            },
            channels: vec![Channel::default()],
            trigger: TriggerConfig::default(),
            fft: FftSection {
                log_scale: false,
                first_bin: 1,
                last_bin: 127,
            },
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ScopeConfig, String> {
    let config_str =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;

    serde_yaml::from_str(&config_str).map_err(|e| format!("Failed to parse config file: {}", e))
}

pub fn save_config<P: AsRef<Path>>(config: &ScopeConfig, path: P) -> Result<(), String> {
    let yaml =
        serde_yaml::to_string(config).map_err(|e| format!("Failed to serialize config: {}", e))?;

    fs::write(path, yaml).map_err(|e| format!("Failed to write config file: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_yaml() {
        let config = ScopeConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: ScopeConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.capture.window_len, 256);
        assert_eq!(back.channels.len(), 1);
        assert!(!back.fft.log_scale);
    }

    #[test]
    fn missing_file_is_a_readable_error() {
        let err = load_config("/nonexistent/scope.yaml").unwrap_err();
        assert!(err.contains("Failed to read config file"));
    }
}
