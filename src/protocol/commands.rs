// COMMAND KEYWORDS ------------------------------------------------------------
//
// Keyword codes carried by `Element::Key`. Unrecognized codes are skipped by
// the processor, so devices may send newer keywords to older hosts.

use super::packing::{PackingMode, MODE_TABLE, UNPACKED};

/// Sample-window size; one Num argument, 4..2048.
pub const KEY_WINDOW: i32 = 0x10;
/// Select the channel subsequent channel commands apply to; one Num argument.
pub const KEY_CHANNEL: i32 = 0x11;
/// Channel label; one Str argument.
pub const KEY_LABEL: i32 = 0x12;
/// Channel color; one Num argument, 24-bit RGB.
pub const KEY_COLOR: i32 = 0x13;
/// Channel bit width; one Num argument, 1..32.
pub const KEY_BIT_WIDTH: i32 = 0x14;
/// Channel scale ceiling; one Num argument.
pub const KEY_SCALE_MAX: i32 = 0x15;
/// Channel magnitude shift; one Num argument, 0..11.
pub const KEY_MAG_SHIFT: i32 = 0x16;
/// Channel baseline; one Num argument.
pub const KEY_BASELINE: i32 = 0x17;
/// Channel display height; one Num argument.
pub const KEY_HEIGHT: i32 = 0x18;
/// Channel grid flags; one Num argument.
pub const KEY_GRID: i32 = 0x19;

/// Trigger mask; one Num argument. Zero disables triggering (free-running).
pub const KEY_TRIG_MASK: i32 = 0x20;
/// Trigger match value; one Num argument.
pub const KEY_TRIG_MATCH: i32 = 0x21;
/// Trigger offset back from the write head; one Num argument, 0..window-1.
pub const KEY_TRIG_OFFSET: i32 = 0x22;
/// Trigger holdoff; one Num argument, 2..2048.
pub const KEY_HOLDOFF: i32 = 0x23;
/// Rate-governor divisor; one Num argument, 1..2048.
pub const KEY_RATE: i32 = 0x24;
/// Logarithmic amplitude scaling; one Num argument, 0 or 1.
pub const KEY_LOG_SCALE: i32 = 0x25;
/// Clear capture state: buffer fill, trigger arming, holdoff.
pub const KEY_CLEAR: i32 = 0x26;

/// First of the 12 packed-mode keywords (`KEY_PACKING_BASE + i` selects
/// `MODE_TABLE[i]`).
pub const KEY_PACKING_BASE: i32 = 0x30;
/// Revert to the unpacked 32-bit default.
pub const KEY_UNPACKED: i32 = 0x3f;
/// Sample data: every following Num until the next Key or End is one
/// transmitted sample word.
pub const KEY_DATA: i32 = 0x40;

/// Resolve a packing keyword, `None` for non-packing keys.
pub fn packing_mode_for_key(key: i32) -> Option<PackingMode> {
    if key == KEY_UNPACKED {
        return Some(UNPACKED);
    }
    let index = key.wrapping_sub(KEY_PACKING_BASE);
    if (0..MODE_TABLE.len() as i32).contains(&index) {
        return Some(MODE_TABLE[index as usize]);
    }
    None
}

/// Clamp a configuration value into its documented range. Out-of-range
/// values are never an error on this protocol.
pub fn clamp(value: i32, lo: i32, hi: i32) -> i32 {
    value.clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_keys_cover_the_table() {
        for i in 0..12 {
            let m = packing_mode_for_key(KEY_PACKING_BASE + i).unwrap();
            assert_eq!(m, MODE_TABLE[i as usize]);
        }
        assert_eq!(packing_mode_for_key(KEY_UNPACKED), Some(UNPACKED));
        assert_eq!(packing_mode_for_key(KEY_PACKING_BASE + 12), None);
        assert_eq!(packing_mode_for_key(KEY_WINDOW), None);
    }

    #[test]
    fn clamp_is_inclusive() {
        assert_eq!(clamp(0, 4, 2048), 4);
        assert_eq!(clamp(4096, 4, 2048), 2048);
        assert_eq!(clamp(100, 4, 2048), 100);
    }
}
