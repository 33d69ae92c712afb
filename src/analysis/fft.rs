// FFT ENGINE COMPONENT --------------------------------------------------------

use super::fixed::Fixed;
use std::f64::consts::PI;

/// Transform size bounds: 2^2 = 4 up to 2^11 = 2048 samples.
pub const MIN_EXPONENT: u32 = 2;
pub const MAX_EXPONENT: u32 = 11;

/// Per-bin output of one transform. `power` is an integer magnitude,
/// `phase` the bin angle in turn units (a full turn spans the u32 range).
pub struct Spectrum {
    pub power: Vec<i32>,
    pub phase: Vec<u32>,
}

/// Radix-2 decimation-in-time transform over fixed-point samples.
///
/// All tables (twiddles, Hanning window, bit-reversal permutation) are
/// computed once at construction and borrowed by `transform`, which never
/// allocates beyond its scratch buffers. Butterfly products are carried in
/// 64-bit accumulators and divided by the fixed-point scale after each
/// complex multiply.
pub struct FftContext {
    exponent: u32,
    first_bin: usize,
    last_bin: usize,
    magnitude_shift: u32,
    log_scale: bool,
    cos: Vec<Fixed>,
    sin: Vec<Fixed>,
    window: Vec<Fixed>,
    permute: Vec<u32>,
}

impl FftContext {
    pub fn new(exponent: u32, magnitude_shift: u32, log_scale: bool) -> Self {
        let exponent = exponent.clamp(MIN_EXPONENT, MAX_EXPONENT);
        let n = 1usize << exponent;
        let mut cos = Vec::with_capacity(n / 2);
        let mut sin = Vec::with_capacity(n / 2);
        for k in 0..n / 2 {
            let angle = 2.0 * PI * k as f64 / n as f64;
            cos.push(Fixed::from_f64(angle.cos()));
            sin.push(Fixed::from_f64(angle.sin()));
        }
        // Hanning window, 1 - cos(2*pi*i/n).
        let window = (0..n)
            .map(|i| Fixed::from_f64(1.0 - (2.0 * PI * i as f64 / n as f64).cos()))
            .collect();
        let permute = (0..n as u32)
            .map(|i| i.reverse_bits() >> (32 - exponent))
            .collect();
        Self {
            exponent,
            first_bin: 1,
            last_bin: n / 2 - 1,
            magnitude_shift: magnitude_shift.min(11),
            log_scale,
            cos,
            sin,
            window,
            permute,
        }
    }

    /// Context sized for a capture window: the largest power of two not
    /// exceeding `window_len`, clamped to the legal exponent range.
    pub fn for_window(window_len: u32, magnitude_shift: u32, log_scale: bool) -> Self {
        let exponent = 31 - window_len.max(1).leading_zeros();
        Self::new(exponent, magnitude_shift, log_scale)
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    pub fn size(&self) -> usize {
        1 << self.exponent
    }

    pub fn log_scale(&self) -> bool {
        self.log_scale
    }

    pub fn set_log_scale(&mut self, log_scale: bool) {
        self.log_scale = log_scale;
    }

    pub fn first_bin(&self) -> usize {
        self.first_bin
    }

    pub fn last_bin(&self) -> usize {
        self.last_bin
    }

    pub fn set_bin_range(&mut self, first: usize, last: usize) {
        let top = self.size() / 2 - 1;
        self.first_bin = first.min(top);
        self.last_bin = last.clamp(self.first_bin, top);
    }

    /// Transform one window of samples. Short input is zero-padded, extra
    /// samples are ignored.
    pub fn transform(&self, samples: &[i32]) -> Spectrum {
        let n = self.size();
        let mut re = vec![0i64; n];
        let mut im = vec![0i64; n];

        // Window in natural order, then permute into bit-reversed order so
        // the iterative stages leave results in natural order.
        for i in 0..n {
            let s = samples.get(i).copied().unwrap_or(0) as i64;
            re[i] = self.window[i].scale_i64(s);
        }
        for i in 0..n {
            let j = self.permute[i] as usize;
            if i < j {
                re.swap(i, j);
            }
        }

        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let step = n / len;
            for base in (0..n).step_by(len) {
                for k in 0..half {
                    let c = self.cos[k * step];
                    let s = self.sin[k * step];
                    let i = base + k;
                    let j = i + half;
                    // Rotate the odd half by e^(-j*angle), dividing by the
                    // scale after the complex multiply.
                    let tr = c.scale_i64(re[j]) + s.scale_i64(im[j]);
                    let ti = c.scale_i64(im[j]) - s.scale_i64(re[j]);
                    re[j] = re[i] - tr;
                    im[j] = im[i] - ti;
                    re[i] += tr;
                    im[i] += ti;
                }
            }
            len <<= 1;
        }

        let divisor = ((1i64 << self.exponent) >> self.magnitude_shift).max(1);
        let mut power = Vec::with_capacity(n / 2);
        let mut phase = Vec::with_capacity(n / 2);
        for b in 0..n / 2 {
            let mag = isqrt(re[b] as i128 * re[b] as i128 + im[b] as i128 * im[b] as i128);
            power.push((mag / divisor).min(i32::MAX as i64) as i32);
            phase.push(phase_turns(re[b], im[b]));
        }
        Spectrum { power, phase }
    }
}

/// Integer square root over the widened sum of squares.
fn isqrt(v: i128) -> i64 {
    if v <= 0 {
        return 0;
    }
    let mut x = (v as f64).sqrt() as i128;
    while x * x > v {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= v {
        x += 1;
    }
    x as i64
}

/// Bin angle in turn units: atan2 mapped onto [0, 2^32).
fn phase_turns(re: i64, im: i64) -> u32 {
    if re == 0 && im == 0 {
        return 0;
    }
    let turns = (im as f64).atan2(re as f64) / (2.0 * PI);
    (turns.rem_euclid(1.0) * 4_294_967_296.0) as u64 as u32
}
