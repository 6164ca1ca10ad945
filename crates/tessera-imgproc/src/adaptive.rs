//! Adaptive local statistics filtering.

use tessera_image::{PixelBuffer, Sample, Status};

use crate::error::FilterError;
use crate::filter::select_rank;
use crate::window::{self, WindowReducer, WindowSpec};

/// Scale factor relating the median absolute deviation of a normal sample
/// to its standard deviation.
const MAD_TO_SIGMA: f64 = 1.4826;

/// An adaptive Lee-type noise reduction filter.
///
/// For every pixel the filter estimates the local mean and variance over a
/// square window and moves the pixel towards the local mean in proportion
/// to the ratio of the expected noise variance to the local variance:
///
/// `out = center - min(1, noiseVar/localVar) * (center - localMean)`
///
/// Flat regions, where the local variance is dominated by noise, converge
/// to the local mean; edges and structures, with local variance well above
/// the noise floor, are left nearly untouched. The robust variant replaces
/// mean/variance with median/MAD estimates, which ignore outliers.
///
/// The noise variance is expressed in the normalized `[0, 1]` sample range;
/// integer samples are normalized before the statistics are computed.
#[derive(Clone, Debug)]
pub struct AdaptiveLocalFilter {
    size: usize,
    noise_variance: f64,
    use_mad: bool,
    parallel: bool,
    max_processors: usize,
}

impl AdaptiveLocalFilter {
    /// Create a filter with a window of odd `size` samples per axis and the
    /// given expected noise variance.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero or even.
    pub fn new(size: usize, noise_variance: f64) -> Result<Self, FilterError> {
        if size == 0 || size % 2 == 0 {
            return Err(FilterError::InvalidKernelSize(size));
        }
        Ok(Self {
            size,
            noise_variance: noise_variance.max(0.0),
            use_mad: false,
            parallel: true,
            max_processors: rayon::current_num_threads().max(1),
        })
    }

    /// Use robust median/MAD local statistics instead of mean/variance.
    pub fn with_mad(mut self, use_mad: bool) -> Self {
        self.use_mad = use_mad;
        self
    }

    /// Enable or disable parallel processing and bound the worker count.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_processors` is zero.
    pub fn with_parallelism(
        mut self,
        parallel: bool,
        max_processors: usize,
    ) -> Result<Self, FilterError> {
        if max_processors == 0 {
            return Err(FilterError::InvalidMaxProcessors);
        }
        self.parallel = parallel;
        self.max_processors = max_processors;
        Ok(self)
    }

    /// Window size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Expected noise variance in the normalized sample range.
    pub fn noise_variance(&self) -> f64 {
        self.noise_variance
    }

    /// Filter the selected region of `image` in place.
    ///
    /// If the window exceeds either selection dimension the selection is
    /// zeroed.
    ///
    /// # Errors
    ///
    /// Returns an error if an abort is requested while processing, or if a
    /// worker fails.
    pub fn apply<T: Sample>(
        &self,
        image: &mut PixelBuffer<T>,
        status: &Status,
    ) -> Result<(), FilterError> {
        if image.is_empty_selection() {
            return Ok(());
        }
        let spec = WindowSpec {
            size: self.size,
            interlace: 1,
        };
        let n = self.size * self.size;
        window::apply_windowed(
            image,
            spec,
            self.parallel,
            self.max_processors,
            status,
            || LeeReducer {
                noise_variance: self.noise_variance,
                use_mad: self.use_mad,
                values: Vec::with_capacity(n),
                deviations: Vec::with_capacity(n),
            },
        )?;
        Ok(())
    }
}

struct LeeReducer {
    noise_variance: f64,
    use_mad: bool,
    values: Vec<f64>,
    deviations: Vec<f64>,
}

impl<T: Sample> WindowReducer<T> for LeeReducer {
    fn reduce(&mut self, window: &mut Vec<T>, center: T) -> T {
        self.values.clear();
        self.values.extend(window.iter().map(|&v| v.to_normalized()));
        let n = self.values.len();

        let (location, variance) = if self.use_mad {
            let median = select_rank(&mut self.values, n / 2);
            self.deviations.clear();
            self.deviations
                .extend(self.values.iter().map(|&v| (v - median).abs()));
            let mad = select_rank(&mut self.deviations, n / 2);
            (median, (MAD_TO_SIGMA * mad).powi(2))
        } else {
            let mean = self.values.iter().sum::<f64>() / n as f64;
            let variance = self
                .values
                .iter()
                .map(|&v| (v - mean).powi(2))
                .sum::<f64>()
                / (n - 1) as f64;
            (mean, variance)
        };

        // a window flat to machine precision carries no usable statistic
        if 1.0 + variance == 1.0 {
            return center;
        }
        let k = (self.noise_variance / variance).min(1.0);
        let f = center.to_normalized();
        T::from_normalized(f - k * (f - location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_image_unchanged() {
        let mut image = PixelBuffer::from_val(10, 10, 1, 0.5f32).unwrap();
        AdaptiveLocalFilter::new(3, 1.0)
            .unwrap()
            .apply(&mut image, &Status::new())
            .unwrap();
        assert!(image.as_slice().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_zero_noise_variance_is_identity() {
        let data: Vec<f32> = (0..12 * 10).map(|i| (i % 7) as f32 / 7.0).collect();
        let mut image = PixelBuffer::new(12, 10, 1, data.clone()).unwrap();
        AdaptiveLocalFilter::new(3, 0.0)
            .unwrap()
            .apply(&mut image, &Status::new())
            .unwrap();
        assert_eq!(image.as_slice(), data.as_slice());
    }

    #[test]
    fn test_large_noise_variance_converges_to_local_mean() {
        // with noiseVar >> localVar the gain saturates at 1 and every pixel
        // becomes its local window mean
        let mut image = PixelBuffer::from_val(9, 9, 1, 0.0f64).unwrap();
        image.set_pixel(4, 4, 0, 0.9);
        AdaptiveLocalFilter::new(3, 1e6)
            .unwrap()
            .apply(&mut image, &Status::new())
            .unwrap();
        approx::assert_relative_eq!(image.pixel(3, 3, 0), 0.1, epsilon = 1e-12);
        approx::assert_relative_eq!(image.pixel(4, 4, 0), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_mad_statistics_ignore_outlier() {
        // the robust location/scale estimates see a flat window with one
        // outlier as flat, so the impulse survives while the plain variance
        // path smears it
        let mut robust = PixelBuffer::from_val(9, 9, 1, 0.0f32).unwrap();
        robust.set_pixel(4, 4, 0, 1.0);
        let mut smeared = robust.clone();

        AdaptiveLocalFilter::new(3, 1e6)
            .unwrap()
            .with_mad(true)
            .apply(&mut robust, &Status::new())
            .unwrap();
        assert_eq!(robust.pixel(4, 4, 0), 1.0);
        assert_eq!(robust.pixel(3, 4, 0), 0.0);

        AdaptiveLocalFilter::new(3, 1e6)
            .unwrap()
            .apply(&mut smeared, &Status::new())
            .unwrap();
        assert!(smeared.pixel(3, 4, 0) > 0.0);
    }

    #[test]
    fn test_result_independent_of_thread_count() {
        let data: Vec<u8> = (0..16 * 64).map(|i| ((i * 37) % 251) as u8).collect();

        let mut serial = PixelBuffer::new(16, 64, 1, data.clone()).unwrap();
        AdaptiveLocalFilter::new(5, 1e-3)
            .unwrap()
            .with_parallelism(false, 1)
            .unwrap()
            .apply(&mut serial, &Status::new())
            .unwrap();

        let mut banded = PixelBuffer::new(16, 64, 1, data).unwrap();
        AdaptiveLocalFilter::new(5, 1e-3)
            .unwrap()
            .with_parallelism(true, 8)
            .unwrap()
            .apply(&mut banded, &Status::new())
            .unwrap();

        assert_eq!(serial.as_slice(), banded.as_slice());
    }

    #[test]
    fn test_even_window_size_rejected() {
        assert_eq!(
            AdaptiveLocalFilter::new(4, 0.1).err(),
            Some(FilterError::InvalidKernelSize(4))
        );
    }
}
