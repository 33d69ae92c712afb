// PACKING CODEC COMPONENT -----------------------------------------------------

/// How several narrow samples ride inside one transmitted word.
/// Invariant: `bits_per_sample * samples_per_word <= 32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackingMode {
    pub bits_per_sample: u32,
    pub samples_per_word: u32,
    pub sign_extend: bool,
    pub alt_order: bool,
}

/// Default mode: one full 32-bit sample per word, no transformation.
pub const UNPACKED: PackingMode = PackingMode {
    bits_per_sample: 32,
    samples_per_word: 1,
    sign_extend: false,
    alt_order: false,
};

/// The fixed table of 12 legal packed modes: sample widths 1/2/4/8/16 bits
/// filling a long (32-bit), word (16-bit) or byte (8-bit) container.
/// Devices select one by keyword; see `commands::KEY_PACKING_BASE`.
pub const MODE_TABLE: [PackingMode; 12] = [
    // long container
    mode(1, 32),
    mode(2, 16),
    mode(4, 8),
    mode(8, 4),
    mode(16, 2),
    // word container
    mode(1, 16),
    mode(2, 8),
    mode(4, 4),
    mode(8, 2),
    // byte container
    mode(1, 8),
    mode(2, 4),
    mode(4, 2),
];

const fn mode(bits: u32, samples: u32) -> PackingMode {
    PackingMode {
        bits_per_sample: bits,
        samples_per_word: samples,
        sign_extend: false,
        alt_order: false,
    }
}

/// Three-stage perfect shuffle reordering interleaved channel bits before
/// extraction. Each stage swaps adjacent groups (1-bit, 2-bit, 4-bit) and is
/// gated on the sample width; every stage is its own inverse, so the whole
/// transform is as well.
fn shuffle(word: u32, bits_per_sample: u32) -> u32 {
    let mut w = word;
    if bits_per_sample <= 1 {
        w = ((w & 0xaaaa_aaaa) >> 1) | ((w & 0x5555_5555) << 1);
    }
    if bits_per_sample <= 2 {
        w = ((w & 0xcccc_cccc) >> 2) | ((w & 0x3333_3333) << 2);
    }
    if bits_per_sample <= 4 {
        w = ((w & 0xf0f0_f0f0) >> 4) | ((w & 0x0f0f_0f0f) << 4);
    }
    w
}

impl PackingMode {
    /// Extract sample `index` (0-based, LSB-first) from a transmitted word.
    pub fn unpack(&self, word: i32, index: u32) -> i32 {
        if self.bits_per_sample >= 32 {
            return word;
        }
        let mut w = word as u32;
        if self.alt_order {
            w = shuffle(w, self.bits_per_sample);
        }
        let mask = (1u32 << self.bits_per_sample) - 1;
        let mut sample = (w >> (index * self.bits_per_sample)) & mask;
        if self.sign_extend && sample & (1 << (self.bits_per_sample - 1)) != 0 {
            sample |= !mask;
        }
        sample as i32
    }

    /// Assemble a transmitted word from `samples_per_word` values. Inverse of
    /// `unpack`; values wider than the sample width are truncated.
    pub fn pack(&self, samples: &[i32]) -> i32 {
        if self.bits_per_sample >= 32 {
            return samples.first().copied().unwrap_or(0);
        }
        let mask = (1u32 << self.bits_per_sample) - 1;
        let mut w = 0u32;
        for index in 0..self.samples_per_word {
            let v = samples.get(index as usize).copied().unwrap_or(0) as u32 & mask;
            w |= v << (index * self.bits_per_sample);
        }
        if self.alt_order {
            w = shuffle(w, self.bits_per_sample);
        }
        w as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn table_modes_fill_their_container() {
        for m in MODE_TABLE {
            let filled = m.bits_per_sample * m.samples_per_word;
            assert!(matches!(filled, 8 | 16 | 32), "{:?}", m);
            assert!(!m.sign_extend);
        }
    }

    #[test]
    fn unpacked_mode_is_verbatim() {
        assert_eq!(UNPACKED.unpack(-123456, 0), -123456);
        assert_eq!(UNPACKED.pack(&[-123456]), -123456);
    }

    #[test]
    fn round_trip_every_table_mode() {
        let mut rng = rand::thread_rng();
        for m in MODE_TABLE {
            let mask = (1i64 << m.bits_per_sample) - 1;
            let values: Vec<i32> = (0..m.samples_per_word)
                .map(|_| (rng.gen::<i64>() & mask) as i32)
                .collect();
            let word = m.pack(&values);
            for (i, &v) in values.iter().enumerate() {
                assert_eq!(m.unpack(word, i as u32), v, "mode {:?} index {}", m, i);
            }
        }
    }

    #[test]
    fn round_trip_with_alt_order() {
        let mut rng = rand::thread_rng();
        for base in MODE_TABLE {
            let m = PackingMode {
                alt_order: true,
                ..base
            };
            let mask = (1i64 << m.bits_per_sample) - 1;
            let values: Vec<i32> = (0..m.samples_per_word)
                .map(|_| (rng.gen::<i64>() & mask) as i32)
                .collect();
            let word = m.pack(&values);
            for (i, &v) in values.iter().enumerate() {
                assert_eq!(m.unpack(word, i as u32), v, "mode {:?} index {}", m, i);
            }
        }
    }

    #[test]
    fn sign_extension_fills_high_bits() {
        let m = PackingMode {
            sign_extend: true,
            ..mode(4, 8)
        };
        // 0xF in a 4-bit signed field is -1, 0x7 stays 7.
        let word = m.pack(&[0xF, 0x7, 0, 0, 0, 0, 0, 0]);
        assert_eq!(m.unpack(word, 0), -1);
        assert_eq!(m.unpack(word, 1), 7);
    }

    #[test]
    fn sign_extension_round_trips_negative_values() {
        let m = PackingMode {
            sign_extend: true,
            ..mode(8, 4)
        };
        let values = [-128, -1, 127, 5];
        let word = m.pack(&values);
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(m.unpack(word, i as u32), v);
        }
    }

    #[test]
    fn shuffle_is_an_involution() {
        let mut rng = rand::thread_rng();
        for bits in [1, 2, 4] {
            for _ in 0..16 {
                let w: u32 = rng.gen();
                assert_eq!(shuffle(shuffle(w, bits), bits), w);
            }
        }
        // Widths 8 and up pass through untouched.
        assert_eq!(shuffle(0xdead_beef, 8), 0xdead_beef);
    }

    #[test]
    fn one_bit_shuffle_reverses_bits_within_bytes() {
        // All three stages run for 1-bit samples: bit i of each byte moves
        // to bit 7-i.
        assert_eq!(shuffle(0x0000_0001, 1), 0x0000_0080);
        assert_eq!(shuffle(0x0000_0080, 1), 0x0000_0001);
    }
}
