//! Forward and inverse 2-D Fourier transforms of pixel buffers.

use num_complex::Complex;
use rustfft::FftPlanner;

use tessera_image::{PixelBuffer, Sample};

use crate::error::FilterError;
use crate::fft::fft2d;
use crate::parallel;

/// A 2-D discrete Fourier transform of whole pixel buffers, channel by
/// channel.
///
/// With a centered spectrum the zero frequency lands in the middle of each
/// plane instead of the origin, obtained by modulating samples with
/// `(-1)^(x+y)` around the transform.
#[derive(Clone, Copy, Debug)]
pub struct FourierTransform {
    centered: bool,
    parallel: bool,
    max_processors: usize,
}

impl Default for FourierTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl FourierTransform {
    /// Create a transform with the zero frequency at the plane origin.
    pub fn new() -> Self {
        Self {
            centered: false,
            parallel: true,
            max_processors: rayon::current_num_threads().max(1),
        }
    }

    /// Move the zero frequency to the center of the spectrum planes.
    pub fn centered(mut self, centered: bool) -> Self {
        self.centered = centered;
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

    /// Transform every channel of `image` into its complex spectrum.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be built.
    pub fn forward<T: Sample>(
        &self,
        image: &PixelBuffer<T>,
    ) -> Result<PixelBuffer<Complex<f64>>, FilterError> {
        let (w, h) = (image.width(), image.height());
        let pool = self.pool()?;
        let mut planner = FftPlanner::new();

        let mut data: Vec<Complex<f64>> = image
            .as_slice()
            .iter()
            .map(|&v| Complex::new(v.to_f64(), 0.0))
            .collect();
        for plane in data.chunks_mut(w * h) {
            if self.centered {
                modulate(plane, w);
            }
            fft2d(&mut planner, plane, w, h, true, &pool);
        }
        Ok(PixelBuffer::new(w, h, image.num_channels(), data)?)
    }

    /// Transform a complex spectrum back to the real domain. The inverse
    /// transform carries the `1/(width*height)` normalization, so
    /// `inverse(forward(x))` reproduces `x` up to rounding.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be built.
    pub fn inverse(
        &self,
        spectrum: &PixelBuffer<Complex<f64>>,
    ) -> Result<PixelBuffer<f64>, FilterError> {
        let (w, h) = (spectrum.width(), spectrum.height());
        let pool = self.pool()?;
        let mut planner = FftPlanner::new();
        let scale = 1.0 / (w as f64 * h as f64);

        let mut data = spectrum.as_slice().to_vec();
        let mut out = Vec::with_capacity(data.len());
        for plane in data.chunks_mut(w * h) {
            fft2d(&mut planner, plane, w, h, false, &pool);
            if self.centered {
                modulate(plane, w);
            }
            out.extend(plane.iter().map(|c| c.re * scale));
        }
        Ok(PixelBuffer::new(w, h, spectrum.num_channels(), out)?)
    }

    fn pool(&self) -> Result<rayon::ThreadPool, FilterError> {
        let num_threads = if self.parallel {
            self.max_processors.min(rayon::current_num_threads().max(1))
        } else {
            1
        };
        parallel::build_pool(num_threads)
    }
}

/// Multiply each sample by `(-1)^(x+y)`, which shifts the spectrum by half
/// a period along both axes.
fn modulate(plane: &mut [Complex<f64>], width: usize) {
    for (y, row) in plane.chunks_mut(width).enumerate() {
        for (x, v) in row.iter_mut().enumerate() {
            if (x + y) % 2 == 1 {
                *v = -*v;
            }
        }
    }
}
