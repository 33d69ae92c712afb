// TRIGGER STATE MACHINE COMPONENT ---------------------------------------------

use serde::{Deserialize, Serialize};

/// Capture condition: fire when the sample at `offset` slots behind the
/// write head transitions into `(t XOR match_value) AND mask == 0`.
/// A zero mask disables the machine; the rate governor then acts as an
/// implicit trigger (free-running mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub mask: i32,
    pub match_value: i32,
    pub offset: u32,
    pub holdoff: i32,
    pub channel: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            mask: 0,
            match_value: 0,
            offset: 0,
            holdoff: 0,
            channel: 0,
        }
    }
}

/// Two-state edge detector. The signal must first move away from the match
/// condition (arming) before a transition back into it fires; a static
/// signal sitting on the match value never re-fires. Holdoff counts down
/// one per re-arm cycle after an accepted fire, suppressing capture chatter
/// until it reaches zero.
pub struct TriggerEngine {
    config: TriggerConfig,
    armed: bool,
    holdoff_remaining: i32,
}

impl TriggerEngine {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            armed: false,
            holdoff_remaining: 0,
        }
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn set_mask(&mut self, mask: i32) {
        self.config.mask = mask;
    }

    pub fn set_match_value(&mut self, match_value: i32) {
        self.config.match_value = match_value;
    }

    pub fn set_offset(&mut self, offset: u32) {
        self.config.offset = offset;
    }

    pub fn set_holdoff(&mut self, holdoff: i32) {
        self.config.holdoff = holdoff;
    }

    pub fn set_channel(&mut self, channel: usize) {
        self.config.channel = channel;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn free_running(&self) -> bool {
        self.config.mask == 0
    }

    /// Disarm and clear the holdoff countdown.
    pub fn reset(&mut self) {
        self.armed = false;
        self.holdoff_remaining = 0;
    }

    /// Advance the machine by one ingested sample; `t` is the tap value at
    /// the configured offset. Returns true when a trigger is accepted.
    pub fn advance(&mut self, t: i32) -> bool {
        if self.free_running() {
            return false;
        }
        let matched = (t ^ self.config.match_value) & self.config.mask == 0;
        if !self.armed {
            if !matched {
                self.armed = true;
                if self.holdoff_remaining > 0 {
                    self.holdoff_remaining -= 1;
                }
            }
            return false;
        }
        if !matched {
            return false;
        }
        self.armed = false;
        if self.holdoff_remaining > 0 {
            return false;
        }
        self.holdoff_remaining = self.config.holdoff;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(mask: i32, match_value: i32, holdoff: i32) -> TriggerEngine {
        TriggerEngine::new(TriggerConfig {
            mask,
            match_value,
            holdoff,
            ..TriggerConfig::default()
        })
    }

    fn fires(engine: &mut TriggerEngine, stream: &[i32]) -> Vec<usize> {
        stream
            .iter()
            .enumerate()
            .filter_map(|(i, &t)| engine.advance(t).then_some(i))
            .collect()
    }

    #[test]
    fn fires_on_transitions_into_match() {
        let mut e = engine(1, 1, 0);
        assert_eq!(fires(&mut e, &[0, 0, 0, 1, 1, 0, 0, 1]), vec![3, 7]);
    }

    #[test]
    fn holdoff_suppresses_second_candidate() {
        let mut e = engine(1, 1, 2);
        assert_eq!(fires(&mut e, &[0, 0, 0, 1, 1, 0, 0, 1]), vec![3]);
    }

    #[test]
    fn static_matching_signal_never_refires() {
        let mut e = engine(0xff, 0x42, 0);
        assert_eq!(fires(&mut e, &[0, 0x42, 0x42, 0x42, 0x42]), vec![1]);
    }

    #[test]
    fn must_arm_before_first_fire() {
        // Signal starts on the match value; no fire until it leaves and
        // comes back.
        let mut e = engine(0xff, 7, 0);
        assert_eq!(fires(&mut e, &[7, 7, 7, 0, 7]), vec![4]);
    }

    #[test]
    fn mask_selects_compared_bits() {
        // Only bit 1 is compared; values 2 and 3 both match 0b10.
        let mut e = engine(0b10, 0b10, 0);
        assert_eq!(fires(&mut e, &[0, 2, 0, 3, 1]), vec![1, 3]);
    }

    #[test]
    fn zero_mask_is_free_running() {
        let mut e = engine(0, 0, 0);
        assert!(e.free_running());
        assert_eq!(fires(&mut e, &[0, 1, 2, 3]), Vec::<usize>::new());
        assert!(!e.is_armed());
    }

    #[test]
    fn reset_disarms_and_clears_holdoff() {
        let mut e = engine(1, 1, 4);
        assert_eq!(fires(&mut e, &[0, 1]), vec![1]);
        e.reset();
        assert!(!e.is_armed());
        // Holdoff is gone: the next arm/fire cycle is accepted.
        assert_eq!(fires(&mut e, &[0, 1]), vec![1]);
    }
}
