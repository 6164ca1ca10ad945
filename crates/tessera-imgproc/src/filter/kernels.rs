//! Builders for the standard kernel families.

use crate::error::FilterError;
use crate::kernel::{MaskKernel, SeparableKernel};

/// Create a 1-D box (mean) kernel of odd `size`, normalized to unit sum.
///
/// # Errors
///
/// Returns an error if `size` is zero or even.
pub fn box_kernel_1d(size: usize) -> Result<Vec<f64>, FilterError> {
    if size == 0 || size % 2 == 0 {
        return Err(FilterError::InvalidKernelSize(size));
    }
    Ok(vec![1.0 / size as f64; size])
}

/// Create a 1-D gaussian kernel of odd `size` and standard deviation
/// `sigma`, normalized to unit sum.
///
/// # Errors
///
/// Returns an error if `size` is zero or even, or `sigma` is not positive.
pub fn gaussian_kernel_1d(size: usize, sigma: f64) -> Result<Vec<f64>, FilterError> {
    if size == 0 || size % 2 == 0 {
        return Err(FilterError::InvalidKernelSize(size));
    }
    if !(sigma > 0.0) {
        return Err(FilterError::InvalidSigma(sigma));
    }

    let half = (size / 2) as f64;
    let mut kernel: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 - half;
            (-0.5 * (x / sigma).powi(2)).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= sum;
    }
    Ok(kernel)
}

/// Create a symmetric separable gaussian kernel of odd `size` and standard
/// deviation `sigma`.
pub fn gaussian_kernel(size: usize, sigma: f64) -> Result<SeparableKernel, FilterError> {
    SeparableKernel::symmetric(gaussian_kernel_1d(size, sigma)?)
}

/// Create a 2-D gaussian response function of odd `size` and standard
/// deviation `sigma` for frequency-domain convolution, normalized to unit
/// sum.
///
/// # Errors
///
/// Returns an error if `size` is zero or even, or `sigma` is not positive.
pub fn gaussian_kernel_2d(size: usize, sigma: f64) -> Result<MaskKernel, FilterError> {
    let g = gaussian_kernel_1d(size, sigma)?;
    let data = g
        .iter()
        .flat_map(|&gy| g.iter().map(move |&gx| gy * gx))
        .collect();
    MaskKernel::new(size, data)
}

/// Create the 3x3 four-neighbor laplacian response function. The
/// coefficients sum to zero, so the kernel is high-pass.
pub fn laplacian_kernel_2d() -> MaskKernel {
    let data = vec![0.0, -1.0, 0.0, -1.0, 4.0, -1.0, 0.0, -1.0, 0.0];
    // 3x3 with the right length, construction cannot fail
    MaskKernel::new(3, data).unwrap_or_else(|_| unreachable!())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_kernel() {
        let k = box_kernel_1d(5).unwrap();
        assert_eq!(k, vec![0.2; 5]);
        assert_eq!(box_kernel_1d(4), Err(FilterError::InvalidKernelSize(4)));
    }

    #[test]
    fn test_gaussian_kernel_normalized_and_symmetric() {
        let k = gaussian_kernel_1d(7, 1.5).unwrap();
        let sum: f64 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        for i in 0..3 {
            assert_eq!(k[i], k[6 - i]);
        }
        // the center coefficient dominates
        assert!(k[3] > k[2]);
    }

    #[test]
    fn test_gaussian_rejects_bad_sigma() {
        assert_eq!(
            gaussian_kernel_1d(5, 0.0),
            Err(FilterError::InvalidSigma(0.0))
        );
        assert_eq!(
            gaussian_kernel_1d(5, -1.0),
            Err(FilterError::InvalidSigma(-1.0))
        );
    }

    #[test]
    fn test_gaussian_2d_is_outer_product() {
        let g1 = gaussian_kernel_1d(5, 1.0).unwrap();
        let g2 = gaussian_kernel_2d(5, 1.0).unwrap();
        assert!((g2.weight() - 1.0).abs() < 1e-12);
        assert!((g2.value(1, 3) - g1[1] * g1[3]).abs() < 1e-15);
    }

    #[test]
    fn test_laplacian_is_high_pass() {
        let k = laplacian_kernel_2d();
        assert!(k.is_high_pass());
        assert_eq!(k.weight(), 0.0);
        assert_eq!(k.value(1, 1), 4.0);
    }
}
