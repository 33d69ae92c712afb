// CHANNEL REGISTRY COMPONENT --------------------------------------------------

use serde::{Deserialize, Serialize};

/// Hard cap on configurable channels; definitions past this are ignored.
pub const MAX_CHANNELS: usize = 8;

/// Display and scaling metadata for one capture channel. Created during
/// configuration parse; only label and color are delta-updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub label: String,
    /// Packed 24-bit RGB.
    pub color: u32,
    pub bit_width: u32,
    pub magnitude_shift: u32,
    pub scale_max: i64,
    pub display_height: i32,
    pub baseline: i32,
    pub grid_flags: u32,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            label: String::new(),
            color: 0xffffff,
            bit_width: 8,
            magnitude_shift: 0,
            scale_max: 255,
            display_height: 64,
            baseline: 0,
            grid_flags: 0,
        }
    }
}

/// Owns all channel metadata. The processor addresses channels by index via
/// the channel-select command.
pub struct ChannelBank {
    channels: Vec<Channel>,
}

impl ChannelBank {
    pub fn new() -> Self {
        Self {
            channels: vec![Channel::default()],
        }
    }

    pub fn from_channels(channels: Vec<Channel>) -> Self {
        let mut channels = channels;
        channels.truncate(MAX_CHANNELS);
        if channels.is_empty() {
            channels.push(Channel::default());
        }
        Self { channels }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Channel> {
        self.channels.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// Make `index` addressable, growing with default channels as needed.
    /// Returns false (and changes nothing) past the channel cap.
    pub fn ensure(&mut self, index: usize) -> bool {
        if index >= MAX_CHANNELS {
            return false;
        }
        while self.channels.len() <= index {
            self.channels.push(Channel::default());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_grows_with_defaults() {
        let mut bank = ChannelBank::new();
        assert_eq!(bank.len(), 1);
        assert!(bank.ensure(3));
        assert_eq!(bank.len(), 4);
        assert_eq!(bank.get(2).unwrap().bit_width, 8);
    }

    #[test]
    fn excess_channels_are_ignored() {
        let mut bank = ChannelBank::new();
        assert!(!bank.ensure(MAX_CHANNELS));
        assert_eq!(bank.len(), 1);
        assert!(bank.ensure(MAX_CHANNELS - 1));
        assert_eq!(bank.len(), MAX_CHANNELS);
    }

    #[test]
    fn from_channels_truncates_to_cap() {
        let bank = ChannelBank::from_channels(vec![Channel::default(); 12]);
        assert_eq!(bank.len(), MAX_CHANNELS);
    }
}
