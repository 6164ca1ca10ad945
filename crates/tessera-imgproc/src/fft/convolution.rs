//! FFT-based 2-D convolution with a cached response function transform.

use std::sync::{Arc, Mutex, PoisonError};

use num_complex::Complex;
use rustfft::FftPlanner;

use tessera_image::{PixelBuffer, Sample, Status};

use crate::error::FilterError;
use crate::fft::{fft2d, optimized_length};
use crate::filter::{apply_high_pass_policy_in, HighPassPolicy};
use crate::kernel::MaskKernel;
use crate::parallel;

/// The discrete transform of the normalized response function, valid for
/// one padded plane geometry.
struct ResponseDft {
    width: usize,
    height: usize,
    data: Vec<Complex<f64>>,
}

/// A frequency-domain convolution engine for non-separable response
/// functions.
///
/// The selected region is copied into a zero-padded complex plane with
/// mirrored margins, transformed, multiplied by the transform of the
/// response function and transformed back. The response is normalized to
/// unit weight up front, so the operation is a drop-in replacement for
/// spatial convolution with a normalized kernel; high-pass responses with
/// vanishing weight are applied unnormalized, and high-pass results go
/// through the same truncate/rescale/raw out-of-range policy as the
/// separable engine.
///
/// The response transform depends only on the padded plane geometry and is
/// cached across calls behind a one-time lock; concurrent calls share the
/// read-only transform, so convolving many equally sized targets with the
/// same engine pays it once.
#[derive(Debug)]
pub struct FftConvolution {
    kernel: MaskKernel,
    high_pass: HighPassPolicy,
    parallel: bool,
    max_processors: usize,
    response: Mutex<Option<Arc<ResponseDft>>>,
}

impl std::fmt::Debug for ResponseDft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseDft")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl FftConvolution {
    /// Create an engine with default parallelism and the truncating
    /// out-of-range policy.
    pub fn new(kernel: MaskKernel) -> Self {
        Self {
            kernel,
            high_pass: HighPassPolicy::default(),
            parallel: true,
            max_processors: rayon::current_num_threads().max(1),
            response: Mutex::new(None),
        }
    }

    /// Set the out-of-range policy applied after convolving with a
    /// high-pass response. Ignored for low-pass responses.
    pub fn with_high_pass(mut self, policy: HighPassPolicy) -> Self {
        self.high_pass = policy;
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

    /// The response function of the engine.
    pub fn kernel(&self) -> &MaskKernel {
        &self.kernel
    }

    /// Convolve the selected region of `image` in place.
    ///
    /// If the response function exceeds either selection dimension the
    /// selection is zeroed. The target is committed only after every
    /// channel has been transformed, so an abort leaves it untouched.
    ///
    /// # Errors
    ///
    /// Returns an error on a raw high-pass request for an integer target,
    /// if an abort is requested while processing, or if the worker pool
    /// cannot be built.
    pub fn apply<T: Sample>(
        &self,
        image: &mut PixelBuffer<T>,
        status: &Status,
    ) -> Result<(), FilterError> {
        if image.is_empty_selection() {
            return Ok(());
        }
        if self.high_pass == HighPassPolicy::Raw && self.kernel.is_high_pass() && !T::IS_FLOAT {
            return Err(FilterError::RawHighPassRequiresFloat);
        }
        let sel = image.selection();
        let (sel_w, sel_h) = (sel.rect.width(), sel.rect.height());
        let n = self.kernel.size();
        if n > sel_w || n > sel_h {
            image.fill_selection(T::MIN_SAMPLE);
            return Ok(());
        }

        let w = optimized_length(sel_w + n);
        let h = optimized_length(sel_h + n);
        let (dw, dh) = ((w - sel_w) / 2, (h - sel_h) / 2);

        let num_threads = if self.parallel {
            self.max_processors.min(rayon::current_num_threads().max(1))
        } else {
            1
        };
        let pool = parallel::build_pool(num_threads)?;
        let mut planner = FftPlanner::new();

        // one-time initialization under the lock; the transforms below run
        // on a shared read-only handle so concurrent calls do not serialize
        let response = {
            let mut guard = self
                .response
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match &*guard {
                Some(r) if r.width == w && r.height == h => Arc::clone(r),
                _ => {
                    log::debug!("computing response transform for {w}x{h} padded plane");
                    let r = Arc::new(build_response(&self.kernel, w, h, &mut planner, &pool));
                    *guard = Some(Arc::clone(&r));
                    r
                }
            }
        };

        let width = image.width();
        let num_channels = sel.ch_last - sel.ch_first + 1;
        let scale = 1.0 / (w as f64 * h as f64);
        let mut plane_c: Vec<Complex<f64>> = vec![Complex::default(); w * h];
        let mut results: Vec<f64> = Vec::with_capacity(num_channels * sel_w * sel_h);

        for c in sel.ch_first..=sel.ch_last {
            if status.is_abort_requested() {
                return Err(FilterError::Cancelled);
            }

            // mirror-padded copy of the selection
            let plane = image.plane(c)?;
            for j in 0..h {
                let sy = pad_coord(j, dh, sel_h);
                let src = &plane[(sel.rect.y0 + sy) * width + sel.rect.x0..];
                for (i, out) in plane_c[j * w..(j + 1) * w].iter_mut().enumerate() {
                    let sx = pad_coord(i, dw, sel_w);
                    *out = Complex::new(src[sx].to_f64(), 0.0);
                }
            }

            fft2d(&mut planner, &mut plane_c, w, h, true, &pool);
            if status.is_abort_requested() {
                return Err(FilterError::Cancelled);
            }

            for (v, &r) in plane_c.iter_mut().zip(&response.data) {
                *v *= scale * r;
            }

            fft2d(&mut planner, &mut plane_c, w, h, false, &pool);
            if status.is_abort_requested() {
                return Err(FilterError::Cancelled);
            }

            for y in 0..sel_h {
                let src = &plane_c[(dh + y) * w + dw..];
                results.extend(src[..sel_w].iter().map(|v| v.re));
            }
            status.advance((sel_w * sel_h) as u64);
        }

        // the out-of-range policy runs in the f64 domain against the
        // native range of the target, before narrowing
        let mut result = PixelBuffer::new(sel_w, sel_h, num_channels, results)?;
        if self.kernel.is_high_pass() {
            apply_high_pass_policy_in(
                &mut result,
                self.high_pass,
                T::MIN_SAMPLE.to_f64(),
                T::MAX_SAMPLE.to_f64(),
            )?;
        }

        // single commit once every channel has been transformed
        for (k, c) in (sel.ch_first..=sel.ch_last).enumerate() {
            let src = result.plane(k)?;
            let dst = image.plane_mut(c)?;
            for y in 0..sel_h {
                for x in 0..sel_w {
                    dst[(sel.rect.y0 + y) * width + sel.rect.x0 + x] =
                        T::from_f64(src[y * sel_w + x]);
                }
            }
        }
        Ok(())
    }
}

/// Map a padded coordinate to a source coordinate within `[0, extent)`:
/// identity inside the target, mirror without edge repeat on the low side,
/// mirror with edge repeat on the high side.
fn pad_coord(p: usize, offset: usize, extent: usize) -> usize {
    if p < offset {
        (offset - p).min(extent - 1)
    } else if p < offset + extent {
        p - offset
    } else {
        let k = p - (offset + extent);
        extent - 1 - k.min(extent - 1)
    }
}

/// Build the transform of the response function: normalized to unit weight,
/// stored in wrap-around order on the padded plane, then transformed.
fn build_response(
    kernel: &MaskKernel,
    w: usize,
    h: usize,
    planner: &mut FftPlanner<f64>,
    pool: &rayon::ThreadPool,
) -> ResponseDft {
    let mut data = vec![Complex::default(); w * h];

    let weight = kernel.weight();
    let k = if 1.0 + weight == 1.0 {
        // vanishing weight: apply the response unnormalized
        1.0
    } else {
        let k = 1.0 / weight;
        if !k.is_finite() || 1.0 + k == 1.0 {
            // normalization underflows, the response degenerates to zero
            return ResponseDft {
                width: w,
                height: h,
                data,
            };
        }
        k
    };

    // wrap-around order: the kernel center lands on the plane origin and
    // the quadrants wrap to the opposite corners
    let n = kernel.size();
    let n2 = n / 2;
    for sy in 0..n {
        let ty = if sy < n2 { h - n2 + sy } else { sy - n2 };
        for sx in 0..n {
            let tx = if sx < n2 { w - n2 + sx } else { sx - n2 };
            data[ty * w + tx] = Complex::new(k * kernel.value(sx, sy), 0.0);
        }
    }

    fft2d(planner, &mut data, w, h, true, pool);
    ResponseDft {
        width: w,
        height: h,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{gaussian_kernel_2d, SeparableConvolution};
    use crate::kernel::SeparableKernel;

    fn gradient_image(width: usize, height: usize) -> PixelBuffer<f64> {
        let data = (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                (x as f64 * 0.31 + y as f64 * 0.17).sin() * 0.5 + 0.5
            })
            .collect();
        PixelBuffer::new(width, height, 1, data).unwrap()
    }

    fn delta_kernel(size: usize) -> MaskKernel {
        let mut data = vec![0.0; size * size];
        data[size * size / 2] = 1.0;
        MaskKernel::new(size, data).unwrap()
    }

    fn sharpen_kernel() -> MaskKernel {
        // negative cross, weight 2
        MaskKernel::new(3, vec![0.0, -1.0, 0.0, -1.0, 6.0, -1.0, 0.0, -1.0, 0.0]).unwrap()
    }

    #[test]
    fn test_delta_response_is_identity() {
        let original = gradient_image(17, 13);
        let mut image = original.clone();
        FftConvolution::new(delta_kernel(3))
            .apply(&mut image, &Status::new())
            .unwrap();
        for (&out, &orig) in image.as_slice().iter().zip(original.as_slice()) {
            approx::assert_relative_eq!(out, orig, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_matches_spatial_box_convolution() {
        let original = gradient_image(16, 12);

        let mut spectral = original.clone();
        FftConvolution::new(MaskKernel::new(3, vec![1.0; 9]).unwrap())
            .apply(&mut spectral, &Status::new())
            .unwrap();

        let mut spatial = original.clone();
        SeparableConvolution::new(
            SeparableKernel::symmetric(vec![1.0 / 3.0; 3]).unwrap(),
        )
        .apply(&mut spatial, &Status::new())
        .unwrap();

        // interior pixels see identical windows under both border schemes
        for y in 2..10 {
            for x in 2..14 {
                approx::assert_relative_eq!(
                    spectral.pixel(x, y, 0),
                    spatial.pixel(x, y, 0),
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_unnormalized_response_preserves_constant() {
        // weight 9, normalized internally to a mean filter
        let mut image = PixelBuffer::from_val(14, 11, 1, 0.625f64).unwrap();
        FftConvolution::new(MaskKernel::new(3, vec![1.0; 9]).unwrap())
            .apply(&mut image, &Status::new())
            .unwrap();
        for &v in image.as_slice() {
            approx::assert_relative_eq!(v, 0.625, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_gaussian_response_preserves_constant() {
        let mut image = PixelBuffer::from_val(20, 16, 1, 0.3f32).unwrap();
        FftConvolution::new(gaussian_kernel_2d(5, 1.0).unwrap())
            .apply(&mut image, &Status::new())
            .unwrap();
        for &v in image.as_slice() {
            approx::assert_relative_eq!(v, 0.3f32, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_zero_weight_high_pass_flattens_constant() {
        // the laplacian has zero weight and is applied unnormalized; on a
        // constant image its response vanishes
        let mut image = PixelBuffer::from_val(12, 12, 1, 0.7f64).unwrap();
        FftConvolution::new(crate::filter::laplacian_kernel_2d())
            .apply(&mut image, &Status::new())
            .unwrap();
        for &v in image.as_slice() {
            approx::assert_relative_eq!(v, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_high_pass_policies_are_distinct() {
        let mut base = PixelBuffer::from_val(9, 9, 1, 0.0f32).unwrap();
        base.set_pixel(4, 4, 0, 1.0);
        assert!(sharpen_kernel().is_high_pass());

        let status = Status::new();
        let mut outputs = Vec::new();
        for policy in [
            HighPassPolicy::Raw,
            HighPassPolicy::Truncate,
            HighPassPolicy::Rescale,
        ] {
            let mut image = base.clone();
            FftConvolution::new(sharpen_kernel())
                .with_high_pass(policy)
                .apply(&mut image, &status)
                .unwrap();
            outputs.push(image);
        }

        let raw = outputs[0].as_slice();
        let truncated = outputs[1].as_slice();
        let rescaled = outputs[2].as_slice();

        assert!(raw.iter().any(|&v| v < 0.0));
        assert!(raw.iter().any(|&v| v > 1.0));
        assert!(truncated.iter().all(|&v| (0.0..=1.0).contains(&v)));
        let max = rescaled.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min = rescaled.iter().cloned().fold(f32::INFINITY, f32::min);
        approx::assert_relative_eq!(min, 0.0f32);
        approx::assert_relative_eq!(max, 1.0f32);
        assert_ne!(truncated, rescaled);
    }

    #[test]
    fn test_raw_high_pass_rejects_integer_target() {
        let mut image = PixelBuffer::from_val(8, 8, 1, 10u8).unwrap();
        let res = FftConvolution::new(sharpen_kernel())
            .with_high_pass(HighPassPolicy::Raw)
            .apply(&mut image, &Status::new());
        assert_eq!(res, Err(FilterError::RawHighPassRequiresFloat));
    }

    #[test]
    fn test_cached_response_is_reused_and_rebuilt() {
        let engine = FftConvolution::new(delta_kernel(3));
        let original = gradient_image(17, 13);

        let mut first = original.clone();
        engine.apply(&mut first, &Status::new()).unwrap();
        let mut second = original.clone();
        engine.apply(&mut second, &Status::new()).unwrap();
        assert_eq!(first.as_slice(), second.as_slice());

        // a different target geometry invalidates the cache
        let mut other = gradient_image(11, 9);
        let reference = other.clone();
        engine.apply(&mut other, &Status::new()).unwrap();
        for (&out, &orig) in other.as_slice().iter().zip(reference.as_slice()) {
            approx::assert_relative_eq!(out, orig, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_concurrent_applies_share_the_engine() {
        let engine = FftConvolution::new(delta_kernel(3));
        let original = gradient_image(17, 13);
        let mut first = original.clone();
        let mut second = original.clone();
        std::thread::scope(|s| {
            s.spawn(|| engine.apply(&mut first, &Status::new()).unwrap());
            s.spawn(|| engine.apply(&mut second, &Status::new()).unwrap());
        });
        assert_eq!(first.as_slice(), second.as_slice());
    }

    #[test]
    fn test_too_small_target_is_zeroed() {
        let mut image = PixelBuffer::from_val(3, 3, 1, 1.0f64).unwrap();
        FftConvolution::new(delta_kernel(5))
            .apply(&mut image, &Status::new())
            .unwrap();
        assert!(image.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_pending_abort_cancels_and_leaves_target_untouched() {
        let original = gradient_image(16, 12);
        let mut image = original.clone();
        let status = Status::new();
        status.request_abort();
        let res = FftConvolution::new(delta_kernel(3)).apply(&mut image, &status);
        assert_eq!(res, Err(FilterError::Cancelled));
        assert_eq!(image.as_slice(), original.as_slice());
    }
}
