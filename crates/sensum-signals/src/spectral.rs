//! Radix-2 FFT over split real/imaginary buffers.
//!
//! Blocks arriving from the ingestion window are rarely power-of-two
//! sized, so callers truncate with [`largest_pow2`] before transforming.

use std::f64::consts::TAU;

/// Largest power of two not exceeding `n`, or 0 for `n == 0`.
pub fn largest_pow2(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - n.leading_zeros())
    }
}

/// In-place iterative Cooley-Tukey transform.
///
/// `re.len()` must equal `im.len()` and be a power of two. The inverse
/// transform applies 1/n scaling so a forward/inverse pair reproduces
/// the input.
pub fn fft_in_place(re: &mut [f64], im: &mut [f64], inverse: bool) {
    let n = re.len();
    debug_assert_eq!(n, im.len());
    debug_assert!(n.is_power_of_two());
    if n < 2 {
        return;
    }

    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            re.swap(i, j);
            im.swap(i, j);
        }
    }

    let sign = if inverse { 1.0 } else { -1.0 };
    let mut len = 2;
    while len <= n {
        let ang = sign * TAU / len as f64;
        let (step_im, step_re) = ang.sin_cos();
        for start in (0..n).step_by(len) {
            let mut w_re = 1.0f64;
            let mut w_im = 0.0f64;
            for k in 0..len / 2 {
                let a = start + k;
                let b = a + len / 2;
                let t_re = re[b] * w_re - im[b] * w_im;
                let t_im = re[b] * w_im + im[b] * w_re;
                re[b] = re[a] - t_re;
                im[b] = im[a] - t_im;
                re[a] += t_re;
                im[a] += t_im;
                let next_re = w_re * step_re - w_im * step_im;
                w_im = w_re * step_im + w_im * step_re;
                w_re = next_re;
            }
        }
        len <<= 1;
    }

    if inverse {
        let scale = 1.0 / n as f64;
        for v in re.iter_mut() {
            *v *= scale;
        }
        for v in im.iter_mut() {
            *v *= scale;
        }
    }
}

/// Power of spectrum bin `k`.
#[inline]
pub fn bin_power(re: &[f64], im: &[f64], k: usize) -> f64 {
    re[k] * re[k] + im[k] * im[k]
}

/// Strongest bin in `lo..=hi`, ties resolved toward the lower bin.
///
/// Returns `None` when the range is empty, out of bounds, or carries no
/// energy at all.
pub fn peak_bin(re: &[f64], im: &[f64], lo: usize, hi: usize) -> Option<usize> {
    if lo > hi || hi >= re.len() {
        return None;
    }
    let mut best = lo;
    let mut best_power = bin_power(re, im, lo);
    for k in lo + 1..=hi {
        let p = bin_power(re, im, k);
        if p > best_power {
            best = k;
            best_power = p;
        }
    }
    if best_power > 0.0 {
        Some(best)
    } else {
        None
    }
}
