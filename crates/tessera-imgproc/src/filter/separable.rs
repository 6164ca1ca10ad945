//! Two-pass separable engines: weighted convolution and order-statistic
//! filtering applied as a horizontal line pass followed by a vertical one.

use tessera_image::{PixelBuffer, Sample, Status};

use crate::error::FilterError;
use crate::filter::line;
use crate::kernel::{RankSelector, SeparableKernel};
use crate::parallel::{self, Band, Monitor};

/// What to do with out-of-range samples after a high-pass convolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HighPassPolicy {
    /// Clamp out-of-range samples to the native range.
    #[default]
    Truncate,
    /// Rescale the whole selection linearly to the native range, but only
    /// when some sample actually falls outside of it.
    Rescale,
    /// Keep the raw convolution values. Only valid for floating point
    /// targets, which can represent out-of-range samples.
    Raw,
}

/// Execution parameters shared by the separable engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvolutionConfig {
    /// Distance in samples between two consecutive window taps. A distance
    /// of 1 samples contiguously; larger distances implement the à trous
    /// (with holes) scheme.
    pub interlacing_distance: usize,
    /// Whether to process bands in parallel.
    pub parallel: bool,
    /// Upper bound on the number of worker threads.
    pub max_processors: usize,
    /// Out-of-range handling after a high-pass convolution. Ignored by the
    /// order-statistic engines, which cannot produce out-of-range samples.
    pub high_pass: HighPassPolicy,
    /// Whether to run the horizontal pass.
    pub process_rows: bool,
    /// Whether to run the vertical pass.
    pub process_cols: bool,
}

impl Default for ConvolutionConfig {
    fn default() -> Self {
        Self {
            interlacing_distance: 1,
            parallel: true,
            max_processors: rayon::current_num_threads().max(1),
            high_pass: HighPassPolicy::default(),
            process_rows: true,
            process_cols: true,
        }
    }
}

impl ConvolutionConfig {
    fn validate(&self) -> Result<(), FilterError> {
        if self.interlacing_distance == 0 {
            return Err(FilterError::InvalidInterlacingDistance);
        }
        if self.max_processors == 0 {
            return Err(FilterError::InvalidMaxProcessors);
        }
        Ok(())
    }
}

/// One 1-D pass over a set of lines.
#[derive(Clone, Copy)]
enum LinePass<'a> {
    Weighted(&'a [f64]),
    Rank { size: usize, rank: usize },
}

impl LinePass<'_> {
    fn run<T: Sample>(
        &self,
        line: &mut [T],
        scratch: &mut Vec<T>,
        window: &mut Vec<T>,
        interlace: usize,
    ) {
        match *self {
            LinePass::Weighted(h) => line::convolve_line(line, scratch, h, interlace),
            LinePass::Rank { size, rank } => {
                line::rank_line(line, scratch, window, size, rank, interlace)
            }
        }
    }
}

/// A separable convolution engine.
///
/// The kernel is applied as two interlaced 1-D passes, rows first. After
/// both passes the result is divided by the kernel weight, and high-pass
/// kernels go through the configured out-of-range policy. All targets are
/// processed through a private normalized working buffer committed only
/// after every pass has joined cleanly, so intermediate pass results never
/// clip and an abort never leaves partial results in the target.
#[derive(Clone, Debug)]
pub struct SeparableConvolution {
    kernel: SeparableKernel,
    config: ConvolutionConfig,
}

impl SeparableConvolution {
    /// Create an engine with the default configuration.
    pub fn new(kernel: SeparableKernel) -> Self {
        Self {
            kernel,
            config: ConvolutionConfig::default(),
        }
    }

    /// Create an engine with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the interlacing distance or the processor limit
    /// is zero.
    pub fn with_config(
        kernel: SeparableKernel,
        config: ConvolutionConfig,
    ) -> Result<Self, FilterError> {
        config.validate()?;
        Ok(Self { kernel, config })
    }

    /// The kernel of the engine.
    pub fn kernel(&self) -> &SeparableKernel {
        &self.kernel
    }

    /// The configuration of the engine.
    pub fn config(&self) -> &ConvolutionConfig {
        &self.config
    }

    /// Convolve the selected region of `image` in place.
    ///
    /// If the full window span exceeds either selection dimension the
    /// selection is zeroed, mirroring the degenerate behavior of a filter
    /// larger than its target.
    ///
    /// # Errors
    ///
    /// Returns an error on a raw high-pass request for an integer target,
    /// if an abort is requested while processing, or if a worker fails.
    pub fn apply<T: Sample>(
        &self,
        image: &mut PixelBuffer<T>,
        status: &Status,
    ) -> Result<(), FilterError> {
        if image.is_empty_selection() {
            return Ok(());
        }
        if self.config.high_pass == HighPassPolicy::Raw
            && self.kernel.is_high_pass()
            && !T::IS_FLOAT
        {
            return Err(FilterError::RawHighPassRequiresFloat);
        }
        let mut working = to_normalized_working(image)?;
        self.apply_real(&mut working, status)?;
        store_normalized_working(image, &working)
    }

    fn apply_real<T: Sample>(
        &self,
        image: &mut PixelBuffer<T>,
        status: &Status,
    ) -> Result<(), FilterError> {
        let rows = self
            .config
            .process_rows
            .then(|| LinePass::Weighted(self.kernel.row()));
        let cols = self
            .config
            .process_cols
            .then(|| LinePass::Weighted(self.kernel.col()));
        let degenerate =
            apply_separable(image, rows, cols, self.kernel.size(), &self.config, status)?;

        if !degenerate && self.config.process_rows && self.config.process_cols {
            if self.kernel.weight() != 1.0 {
                divide_by_weight(image, self.kernel.weight())?;
            }
            if self.kernel.is_high_pass() {
                apply_high_pass_policy(image, self.config.high_pass)?;
            }
        }
        Ok(())
    }
}

/// A separable order-statistic engine: each pass replaces every sample by
/// the selected rank of its 1-D window. With the median selector this is
/// the classic separable approximation of the 2-D median filter.
///
/// Rank selection never produces out-of-range samples, so the high-pass
/// policy of the configuration is ignored. Like the convolution engine,
/// the passes run on a private working buffer committed only after a clean
/// join.
#[derive(Clone, Copy, Debug)]
pub struct SeparableMedianFilter {
    selector: RankSelector,
    config: ConvolutionConfig,
}

impl SeparableMedianFilter {
    /// Create a median engine for a window of odd `size` samples.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero or even.
    pub fn new(size: usize) -> Result<Self, FilterError> {
        Ok(Self {
            selector: RankSelector::median(size)?,
            config: ConvolutionConfig::default(),
        })
    }

    /// Create an engine for an arbitrary rank selector and configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the interlacing distance or the processor limit
    /// is zero.
    pub fn with_config(
        selector: RankSelector,
        config: ConvolutionConfig,
    ) -> Result<Self, FilterError> {
        config.validate()?;
        Ok(Self { selector, config })
    }

    /// The rank selector of the engine.
    pub fn selector(&self) -> RankSelector {
        self.selector
    }

    /// Filter the selected region of `image` in place.
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
        let pass = LinePass::Rank {
            size: self.selector.size(),
            rank: self.selector.rank(),
        };
        let rows = self.config.process_rows.then_some(pass);
        let cols = self.config.process_cols.then_some(pass);
        let mut working = to_normalized_working(image)?;
        apply_separable(&mut working, rows, cols, self.selector.size(), &self.config, status)?;
        store_normalized_working(image, &working)
    }
}

/// Run the horizontal and/or vertical pass over the image selection.
///
/// Returns `true` when the window span does not fit the selection and the
/// selection was zeroed instead of processed.
fn apply_separable<T: Sample>(
    image: &mut PixelBuffer<T>,
    rows: Option<LinePass<'_>>,
    cols: Option<LinePass<'_>>,
    size: usize,
    config: &ConvolutionConfig,
    status: &Status,
) -> Result<bool, FilterError> {
    let sel = image.selection();
    let span = parallel::overlapping_distance(size, config.interlacing_distance);
    if span > sel.rect.width() || span > sel.rect.height() {
        image.fill_selection(T::MIN_SAMPLE);
        return Ok(true);
    }
    if let Some(pass) = rows {
        run_pass(image, pass, config, status, false)?;
    }
    if let Some(pass) = cols {
        run_pass(image, pass, config, status, true)?;
    }
    Ok(false)
}

// Line passes carry no halo between lines, so each band owns a disjoint set
// of complete lines and no overlap reconciliation is needed.
const LINE_PASS_OVERHEAD_LIMIT: usize = 4;

fn run_pass<T: Sample>(
    image: &mut PixelBuffer<T>,
    pass: LinePass<'_>,
    config: &ConvolutionConfig,
    status: &Status,
    vertical: bool,
) -> Result<(), FilterError> {
    let sel = image.selection();
    let extent = if vertical {
        sel.rect.width()
    } else {
        sel.rect.height()
    };
    let num_threads = parallel::thread_count(
        extent,
        LINE_PASS_OVERHEAD_LIMIT,
        config.parallel,
        config.max_processors,
    );
    let pool = parallel::build_pool(num_threads)?;
    let bands = parallel::partition(extent, num_threads);
    if vertical {
        process_cols(image, pass, config.interlacing_distance, &pool, &bands, status)
    } else {
        process_rows(image, pass, config.interlacing_distance, &pool, &bands, status)
    }
}

fn process_rows<T: Sample>(
    image: &mut PixelBuffer<T>,
    pass: LinePass<'_>,
    interlace: usize,
    pool: &rayon::ThreadPool,
    bands: &[Band],
    status: &Status,
) -> Result<(), FilterError> {
    let sel = image.selection();
    let width = image.width();
    let (x0, x1) = (sel.rect.x0, sel.rect.x1);

    for c in sel.ch_first..=sel.ch_last {
        let plane = image.plane_mut(c)?;
        let mut rows = plane[sel.rect.y0 * width..sel.rect.y1 * width]
            .chunks_mut(width)
            .map(|row| &mut row[x0..x1]);

        let mut inputs: Vec<Vec<&mut [T]>> = Vec::with_capacity(bands.len());
        for band in bands {
            inputs.push(rows.by_ref().take(band.len()).collect());
        }

        parallel::run_bands(pool, inputs, status, |band_rows| {
            run_line_worker(band_rows, pass, interlace, status)
        })?;
    }
    Ok(())
}

// The vertical pass works on a transposed copy of the selection, so it can
// reuse the contiguous line processor and touch memory sequentially.
fn process_cols<T: Sample>(
    image: &mut PixelBuffer<T>,
    pass: LinePass<'_>,
    interlace: usize,
    pool: &rayon::ThreadPool,
    bands: &[Band],
    status: &Status,
) -> Result<(), FilterError> {
    let sel = image.selection();
    let width = image.width();
    let (w_sel, h_sel) = (sel.rect.width(), sel.rect.height());
    let mut transposed: Vec<T> = Vec::with_capacity(w_sel * h_sel);

    for c in sel.ch_first..=sel.ch_last {
        let plane = image.plane_mut(c)?;
        transposed.clear();
        for x in 0..w_sel {
            for y in 0..h_sel {
                transposed.push(plane[(sel.rect.y0 + y) * width + sel.rect.x0 + x]);
            }
        }

        {
            let mut cols = transposed.chunks_mut(h_sel);
            let mut inputs: Vec<Vec<&mut [T]>> = Vec::with_capacity(bands.len());
            for band in bands {
                inputs.push(cols.by_ref().take(band.len()).collect());
            }
            parallel::run_bands(pool, inputs, status, |band_cols| {
                run_line_worker(band_cols, pass, interlace, status)
            })?;
        }

        for x in 0..w_sel {
            for y in 0..h_sel {
                plane[(sel.rect.y0 + y) * width + sel.rect.x0 + x] = transposed[x * h_sel + y];
            }
        }
    }
    Ok(())
}

fn run_line_worker<T: Sample>(
    lines: Vec<&mut [T]>,
    pass: LinePass<'_>,
    interlace: usize,
    status: &Status,
) -> Result<(), FilterError> {
    let mut scratch = Vec::new();
    let mut window = Vec::new();
    let mut monitor = Monitor::new(status);
    for line in lines {
        let n = line.len() as u64;
        pass.run(line, &mut scratch, &mut window, interlace);
        monitor.advance(n)?;
    }
    monitor.finish();
    Ok(())
}

/// Copy the image into a normalized `f64` working buffer with the same
/// selection.
pub(crate) fn to_normalized_working<T: Sample>(
    image: &PixelBuffer<T>,
) -> Result<PixelBuffer<f64>, FilterError> {
    let data = image.as_slice().iter().map(|&v| v.to_normalized()).collect();
    let mut working = PixelBuffer::new(image.width(), image.height(), image.num_channels(), data)?;
    let sel = image.selection();
    working.select_rect(sel.rect)?;
    working.select_channels(sel.ch_first, sel.ch_last)?;
    Ok(working)
}

/// Store the selected region of a normalized working buffer back into the
/// original image, narrowing with the native rounding and clamping
/// semantics. Samples outside the selection are untouched.
pub(crate) fn store_normalized_working<T: Sample>(
    image: &mut PixelBuffer<T>,
    working: &PixelBuffer<f64>,
) -> Result<(), FilterError> {
    let sel = image.selection();
    let width = image.width();
    for c in sel.ch_first..=sel.ch_last {
        let src = working.plane(c)?;
        let dst = image.plane_mut(c)?;
        for y in sel.rect.y0..sel.rect.y1 {
            for x in sel.rect.x0..sel.rect.x1 {
                dst[y * width + x] = T::from_normalized(src[y * width + x]);
            }
        }
    }
    Ok(())
}

/// Apply `f` to every selected sample, accumulating in `f64`.
pub(crate) fn map_selection<T: Sample>(
    image: &mut PixelBuffer<T>,
    mut f: impl FnMut(f64) -> f64,
) -> Result<(), FilterError> {
    let sel = image.selection();
    let width = image.width();
    for c in sel.ch_first..=sel.ch_last {
        let plane = image.plane_mut(c)?;
        for y in sel.rect.y0..sel.rect.y1 {
            for v in &mut plane[y * width + sel.rect.x0..y * width + sel.rect.x1] {
                *v = T::from_f64(f(v.to_f64()));
            }
        }
    }
    Ok(())
}

/// Divide every selected sample by the filter weight.
pub(crate) fn divide_by_weight<T: Sample>(
    image: &mut PixelBuffer<T>,
    weight: f64,
) -> Result<(), FilterError> {
    map_selection(image, |v| v / weight)
}

/// Apply the configured out-of-range policy to the selection after a
/// high-pass convolution, against the native range of the sample type.
pub(crate) fn apply_high_pass_policy<T: Sample>(
    image: &mut PixelBuffer<T>,
    policy: HighPassPolicy,
) -> Result<(), FilterError> {
    apply_high_pass_policy_in(image, policy, T::MIN_SAMPLE.to_f64(), T::MAX_SAMPLE.to_f64())
}

/// Apply an out-of-range policy against an explicit `[lo, hi]` range. The
/// frequency-domain engine calls this on its `f64` result plane with the
/// range of the target sample type, before narrowing.
pub(crate) fn apply_high_pass_policy_in<T: Sample>(
    image: &mut PixelBuffer<T>,
    policy: HighPassPolicy,
    lo: f64,
    hi: f64,
) -> Result<(), FilterError> {
    match policy {
        HighPassPolicy::Truncate => map_selection(image, |v| v.clamp(lo, hi)),
        HighPassPolicy::Rescale => {
            let (min, max) = selection_range(image)?;
            if min < lo || max > hi {
                let range = max - min;
                if 1.0 + range == 1.0 {
                    map_selection(image, |_| lo)
                } else {
                    let scale = (hi - lo) / range;
                    map_selection(image, |v| lo + (v - min) * scale)
                }
            } else {
                Ok(())
            }
        }
        HighPassPolicy::Raw => Ok(()),
    }
}

fn selection_range<T: Sample>(image: &PixelBuffer<T>) -> Result<(f64, f64), FilterError> {
    let sel = image.selection();
    let width = image.width();
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for c in sel.ch_first..=sel.ch_last {
        let plane = image.plane(c)?;
        for y in sel.rect.y0..sel.rect.y1 {
            for v in &plane[y * width + sel.rect.x0..y * width + sel.rect.x1] {
                let v = v.to_f64();
                if v < min {
                    min = v;
                }
                if v > max {
                    max = v;
                }
            }
        }
    }
    Ok((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::kernels::gaussian_kernel;
    use tessera_image::Rect;

    fn box3() -> SeparableKernel {
        SeparableKernel::symmetric(vec![1.0, 1.0, 1.0]).unwrap()
    }

    #[test]
    fn test_box_blur_of_zeros_is_zeros() {
        let mut image = PixelBuffer::from_val(5, 5, 1, 0.0f32).unwrap();
        SeparableConvolution::new(box3())
            .apply(&mut image, &Status::new())
            .unwrap();
        assert!(image.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_constant_buffer_invariance_u8() {
        // an unnormalized box kernel has weight 9; the intermediate pass
        // results exceed u8 range but must not clip
        let mut image = PixelBuffer::from_val(7, 6, 2, 100u8).unwrap();
        SeparableConvolution::new(box3())
            .apply(&mut image, &Status::new())
            .unwrap();
        assert!(image.as_slice().iter().all(|&v| v == 100));
    }

    #[test]
    fn test_gaussian_preserves_constant() {
        let mut image = PixelBuffer::from_val(16, 16, 1, 0.25f32).unwrap();
        SeparableConvolution::new(gaussian_kernel(5, 1.2).unwrap())
            .apply(&mut image, &Status::new())
            .unwrap();
        for &v in image.as_slice() {
            approx::assert_relative_eq!(v, 0.25f32, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_result_independent_of_thread_count() {
        let data: Vec<u16> = (0..32 * 17).map(|i| ((i * 7919) % 65521) as u16).collect();
        let kernel = gaussian_kernel(5, 1.0).unwrap();

        let mut serial = PixelBuffer::new(32, 17, 1, data.clone()).unwrap();
        let config = ConvolutionConfig {
            parallel: false,
            ..Default::default()
        };
        SeparableConvolution::with_config(kernel.clone(), config)
            .unwrap()
            .apply(&mut serial, &Status::new())
            .unwrap();

        for max_processors in [2, 4, 8] {
            let mut banded = PixelBuffer::new(32, 17, 1, data.clone()).unwrap();
            let config = ConvolutionConfig {
                max_processors,
                ..Default::default()
            };
            SeparableConvolution::with_config(kernel.clone(), config)
                .unwrap()
                .apply(&mut banded, &Status::new())
                .unwrap();
            assert_eq!(serial.as_slice(), banded.as_slice());
        }
    }

    #[test]
    fn test_too_small_target_is_zeroed() {
        let mut image = PixelBuffer::from_val(3, 3, 1, 1.0f32).unwrap();
        let kernel = SeparableKernel::symmetric(vec![0.2; 5]).unwrap();
        SeparableConvolution::new(kernel)
            .apply(&mut image, &Status::new())
            .unwrap();
        assert!(image.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_high_pass_policies_are_distinct() {
        let mut base = PixelBuffer::from_val(9, 9, 1, 0.0f32).unwrap();
        base.set_pixel(4, 4, 0, 1.0);
        let kernel = SeparableKernel::symmetric(vec![-1.0, 3.0, -1.0]).unwrap();
        assert!(kernel.is_high_pass());

        let status = Status::new();
        let mut outputs = Vec::new();
        for policy in [
            HighPassPolicy::Raw,
            HighPassPolicy::Truncate,
            HighPassPolicy::Rescale,
        ] {
            let mut image = base.clone();
            let config = ConvolutionConfig {
                high_pass: policy,
                ..Default::default()
            };
            SeparableConvolution::with_config(kernel.clone(), config)
                .unwrap()
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
        let kernel = SeparableKernel::symmetric(vec![-1.0, 3.0, -1.0]).unwrap();
        let config = ConvolutionConfig {
            high_pass: HighPassPolicy::Raw,
            ..Default::default()
        };
        let res = SeparableConvolution::with_config(kernel, config)
            .unwrap()
            .apply(&mut image, &Status::new());
        assert_eq!(res, Err(FilterError::RawHighPassRequiresFloat));
    }

    #[test]
    fn test_selection_restricts_processing() {
        let mut image = PixelBuffer::from_val(8, 8, 1, 50u8).unwrap();
        image.select_rect(Rect::new(2, 2, 6, 6)).unwrap();
        image.fill_selection(0);
        SeparableConvolution::new(box3())
            .apply(&mut image, &Status::new())
            .unwrap();
        // border samples are outside the selection and stay untouched
        assert_eq!(image.pixel(0, 0, 0), 50);
        assert_eq!(image.pixel(7, 7, 0), 50);
        assert_eq!(image.pixel(3, 3, 0), 0);
    }

    #[test]
    fn test_row_only_pass_leaves_constant_rows_unchanged() {
        let data: Vec<f64> = (0..6).flat_map(|y| vec![y as f64; 8]).collect();
        let mut image = PixelBuffer::new(8, 6, 1, data.clone()).unwrap();
        let config = ConvolutionConfig {
            process_cols: false,
            ..Default::default()
        };
        let kernel = SeparableKernel::symmetric(vec![1.0 / 3.0; 3]).unwrap();
        SeparableConvolution::with_config(kernel, config)
            .unwrap()
            .apply(&mut image, &Status::new())
            .unwrap();
        for (&out, &orig) in image.as_slice().iter().zip(&data) {
            approx::assert_relative_eq!(out, orig, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_separable_median_removes_impulse() {
        let mut image = PixelBuffer::from_val(9, 9, 1, 0.0f32).unwrap();
        image.set_pixel(4, 4, 0, 10.0);
        SeparableMedianFilter::new(3)
            .unwrap()
            .apply(&mut image, &Status::new())
            .unwrap();
        assert!(image.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_pending_abort_cancels() {
        let mut image = PixelBuffer::from_val(300, 300, 1, 0.5f32).unwrap();
        let status = Status::new();
        status.request_abort();
        let res = SeparableConvolution::new(box3()).apply(&mut image, &status);
        assert_eq!(res, Err(FilterError::Cancelled));
    }

    #[test]
    fn test_abort_leaves_float_target_untouched() {
        // a weight-4 kernel transforms every non-uniform sample, so any
        // committed band would show up as a difference
        let data: Vec<f32> = (0..300 * 300).map(|i| (i % 31) as f32 / 31.0).collect();
        let mut image = PixelBuffer::new(300, 300, 1, data.clone()).unwrap();
        let kernel = SeparableKernel::symmetric(vec![1.0, 2.0, 1.0]).unwrap();
        let status = Status::new();
        status.request_abort();
        let res = SeparableConvolution::new(kernel).apply(&mut image, &status);
        assert_eq!(res, Err(FilterError::Cancelled));
        assert_eq!(image.as_slice(), data.as_slice());
    }

    #[test]
    fn test_interlaced_kernel_requires_larger_span() {
        // size 3 at distance 3 spans 7 samples, more than the 5-pixel target
        let mut image = PixelBuffer::from_val(5, 5, 1, 1.0f64).unwrap();
        let config = ConvolutionConfig {
            interlacing_distance: 3,
            ..Default::default()
        };
        SeparableConvolution::with_config(box3(), config)
            .unwrap()
            .apply(&mut image, &Status::new())
            .unwrap();
        assert!(image.as_slice().iter().all(|&v| v == 0.0));
    }
}
