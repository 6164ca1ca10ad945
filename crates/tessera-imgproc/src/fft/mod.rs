//! Frequency-domain processing: 2-D Fourier transforms and FFT-based
//! convolution.

mod convolution;
mod transform;

pub use convolution::FftConvolution;
pub use transform::FourierTransform;

use std::sync::Arc;

use num_complex::Complex;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

/// Smallest 5-smooth integer (no prime factor above 5) not less than `n`.
/// Mixed-radix FFTs of these lengths decompose into fast radix-2/3/5 steps.
pub(crate) fn optimized_length(n: usize) -> usize {
    let mut m = n.max(1);
    loop {
        let mut r = m;
        for p in [2, 3, 5] {
            while r % p == 0 {
                r /= p;
            }
        }
        if r == 1 {
            return m;
        }
        m += 1;
    }
}

/// In-place 2-D FFT of a row-major `width x height` complex plane: rows
/// first, then columns through a transposed scratch plane. The inverse
/// transform is unnormalized; callers fold the `1/(width*height)` factor
/// into their own scaling.
pub(crate) fn fft2d(
    planner: &mut FftPlanner<f64>,
    data: &mut [Complex<f64>],
    width: usize,
    height: usize,
    forward: bool,
    pool: &rayon::ThreadPool,
) {
    let (row_fft, col_fft): (Arc<dyn Fft<f64>>, Arc<dyn Fft<f64>>) = if forward {
        (planner.plan_fft_forward(width), planner.plan_fft_forward(height))
    } else {
        (planner.plan_fft_inverse(width), planner.plan_fft_inverse(height))
    };

    pool.install(|| {
        data.par_chunks_mut(width)
            .for_each(|row| row_fft.process(row));
    });

    let mut scratch = vec![Complex::default(); data.len()];
    transpose(data, &mut scratch, width, height);
    pool.install(|| {
        scratch
            .par_chunks_mut(height)
            .for_each(|col| col_fft.process(col));
    });
    transpose(&scratch, data, height, width);
}

/// `dst[x * height + y] = src[y * width + x]`.
pub(crate) fn transpose(src: &[Complex<f64>], dst: &mut [Complex<f64>], width: usize, height: usize) {
    for y in 0..height {
        for x in 0..width {
            dst[x * height + y] = src[y * width + x];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimized_length() {
        assert_eq!(optimized_length(1), 1);
        assert_eq!(optimized_length(16), 16);
        assert_eq!(optimized_length(17), 18);
        assert_eq!(optimized_length(31), 32);
        assert_eq!(optimized_length(121), 125);
        assert_eq!(optimized_length(243), 243);
    }

    #[test]
    fn test_transpose() {
        let src: Vec<Complex<f64>> = (0..6).map(|i| Complex::new(i as f64, 0.0)).collect();
        let mut dst = vec![Complex::default(); 6];
        transpose(&src, &mut dst, 3, 2);
        let re: Vec<f64> = dst.iter().map(|c| c.re).collect();
        assert_eq!(re, vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn test_fft2d_of_delta_is_flat() {
        let (w, h) = (8, 4);
        let mut data = vec![Complex::default(); w * h];
        data[0] = Complex::new(1.0, 0.0);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let mut planner = FftPlanner::new();
        fft2d(&mut planner, &mut data, w, h, true, &pool);
        for c in &data {
            approx::assert_relative_eq!(c.re, 1.0, epsilon = 1e-12);
            approx::assert_relative_eq!(c.im, 0.0, epsilon = 1e-12);
        }
    }
}
