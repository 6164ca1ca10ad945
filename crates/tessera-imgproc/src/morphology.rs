//! Morphological transformations over arbitrary structuring elements.

use tessera_image::{PixelBuffer, Sample, Status};

use crate::error::FilterError;
use crate::filter::select_rank;
use crate::kernel::StructuringElement;
use crate::window::{self, WindowReducer, WindowSpec};

/// The reduction applied to each structured window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MorphologicalOperator {
    /// Minimum of the window samples.
    Erosion,
    /// Maximum of the window samples. Applied through the reflected
    /// structuring element.
    Dilation,
    /// Median of the window samples. An even sample count yields the mean
    /// of the two middle samples.
    Median,
    /// Mean of the window minimum and maximum.
    Midpoint,
    /// The `round(k * (n - 1))`-th smallest of `n` window samples, for a
    /// selection point `k` in `[0, 1]`. A selection point of 0 is erosion,
    /// 1 is dilation and 0.5 approximates the median.
    Selection(f64),
}

/// A thresholded morphological transformation engine.
///
/// The operator reduces an interlaced window shaped by the structuring
/// element around every selected pixel. Nonzero thresholds blend the
/// reduction with the original pixel in proportion to their difference,
/// which turns hard morphological operators into gradual ones. Thresholds
/// are expressed in the normalized `[0, 1]` range and scaled to the native
/// sample range on application.
#[derive(Clone, Debug)]
pub struct MorphologicalTransformation {
    operator: MorphologicalOperator,
    structure: StructuringElement,
    low_threshold: f64,
    high_threshold: f64,
    interlacing_distance: usize,
    parallel: bool,
    max_processors: usize,
}

impl MorphologicalTransformation {
    /// Create a transformation with zero thresholds, contiguous sampling
    /// and default parallelism.
    pub fn new(operator: MorphologicalOperator, structure: StructuringElement) -> Self {
        Self {
            operator,
            structure,
            low_threshold: 0.0,
            high_threshold: 0.0,
            interlacing_distance: 1,
            parallel: true,
            max_processors: rayon::current_num_threads().max(1),
        }
    }

    /// Set the low (darkening) and high (brightening) blending thresholds,
    /// clamped to `[0, 1]`.
    pub fn with_thresholds(mut self, low: f64, high: f64) -> Self {
        self.low_threshold = low.clamp(0.0, 1.0);
        self.high_threshold = high.clamp(0.0, 1.0);
        self
    }

    /// Set the distance between consecutive window taps.
    ///
    /// # Errors
    ///
    /// Returns an error if `distance` is zero.
    pub fn with_interlacing(mut self, distance: usize) -> Result<Self, FilterError> {
        if distance == 0 {
            return Err(FilterError::InvalidInterlacingDistance);
        }
        self.interlacing_distance = distance;
        Ok(self)
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

    /// The operator of the transformation.
    pub fn operator(&self) -> MorphologicalOperator {
        self.operator
    }

    /// The structuring element of the transformation.
    pub fn structure(&self) -> &StructuringElement {
        &self.structure
    }

    /// Transform the selected region of `image` in place.
    ///
    /// If the full window span exceeds either selection dimension the
    /// selection is zeroed.
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

        // dilation reduces the window through the reflected element
        let structure = if self.operator == MorphologicalOperator::Dilation {
            self.structure.reflected()
        } else {
            self.structure.clone()
        };

        let max = T::MAX_SAMPLE.to_f64();
        let th0 = self.low_threshold * max;
        let th1 = self.high_threshold * max;

        let spec = WindowSpec {
            size: structure.size(),
            interlace: self.interlacing_distance,
        };
        window::apply_windowed(
            image,
            spec,
            self.parallel,
            self.max_processors,
            status,
            || MorphReducer {
                operator: self.operator,
                structure: &structure,
                masked: Vec::with_capacity(structure.element_count()),
                th0,
                th1,
            },
        )?;
        Ok(())
    }
}

struct MorphReducer<'a, T> {
    operator: MorphologicalOperator,
    structure: &'a StructuringElement,
    masked: Vec<T>,
    th0: f64,
    th1: f64,
}

impl<T: Sample> WindowReducer<T> for MorphReducer<'_, T> {
    fn reduce(&mut self, window: &mut Vec<T>, center: T) -> T {
        let samples: &mut [T] = if self.structure.is_box() {
            window
        } else {
            let size = self.structure.size();
            self.masked.clear();
            self.masked.extend(
                window
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| self.structure.contains(i % size, i / size))
                    .map(|(_, &v)| v),
            );
            &mut self.masked
        };

        let mut r = reduce_samples(samples, self.operator);

        // blend towards the original sample when the reduction moved it by
        // less than the corresponding threshold
        let f = center.to_f64();
        if r < f {
            if 1.0 + self.th0 != 1.0 {
                let k = f - r;
                if k < self.th0 {
                    let k = k / self.th0;
                    r = k * r + (1.0 - k) * f;
                }
            }
        } else if 1.0 + self.th1 != 1.0 {
            let k = r - f;
            if k < self.th1 {
                let k = k / self.th1;
                r = k * r + (1.0 - k) * f;
            }
        }
        T::from_f64(r)
    }
}

fn reduce_samples<T: Sample>(samples: &mut [T], operator: MorphologicalOperator) -> f64 {
    let n = samples.len();
    match operator {
        MorphologicalOperator::Erosion => fold_min(samples).to_f64(),
        MorphologicalOperator::Dilation => fold_max(samples).to_f64(),
        MorphologicalOperator::Median => median_value(samples),
        MorphologicalOperator::Midpoint => {
            (fold_min(samples).to_f64() + fold_max(samples).to_f64()) / 2.0
        }
        MorphologicalOperator::Selection(k) => {
            let rank = (k.clamp(0.0, 1.0) * (n - 1) as f64).round() as usize;
            select_rank(samples, rank).to_f64()
        }
    }
}

fn median_value<T: Sample>(samples: &mut [T]) -> f64 {
    let n = samples.len();
    if n % 2 == 1 {
        select_rank(samples, n / 2).to_f64()
    } else {
        let hi = select_rank(samples, n / 2).to_f64();
        let lo = fold_max(&samples[..n / 2]).to_f64();
        (lo + hi) / 2.0
    }
}

fn fold_min<T: Sample>(samples: &[T]) -> T {
    let mut m = samples[0];
    for &v in &samples[1..] {
        if v < m {
            m = v;
        }
    }
    m
}

fn fold_max<T: Sample>(samples: &[T]) -> T {
    let mut m = samples[0];
    for &v in &samples[1..] {
        if m < v {
            m = v;
        }
    }
    m
}

/// Erode the selected region of `image` in place with the given
/// structuring element.
pub fn erode<T: Sample>(
    image: &mut PixelBuffer<T>,
    structure: StructuringElement,
    status: &Status,
) -> Result<(), FilterError> {
    MorphologicalTransformation::new(MorphologicalOperator::Erosion, structure)
        .apply(image, status)
}

/// Dilate the selected region of `image` in place with the given
/// structuring element.
pub fn dilate<T: Sample>(
    image: &mut PixelBuffer<T>,
    structure: StructuringElement,
    status: &Status,
) -> Result<(), FilterError> {
    MorphologicalTransformation::new(MorphologicalOperator::Dilation, structure)
        .apply(image, status)
}

/// Morphological opening: erosion followed by dilation.
pub fn open<T: Sample>(
    image: &mut PixelBuffer<T>,
    structure: StructuringElement,
    status: &Status,
) -> Result<(), FilterError> {
    erode(image, structure.clone(), status)?;
    dilate(image, structure, status)
}

/// Morphological closing: dilation followed by erosion.
pub fn close<T: Sample>(
    image: &mut PixelBuffer<T>,
    structure: StructuringElement,
    status: &Status,
) -> Result<(), FilterError> {
    dilate(image, structure.clone(), status)?;
    erode(image, structure, status)
}

/// 2-D median filter over a full box window of odd `size`.
pub fn median_filter<T: Sample>(
    image: &mut PixelBuffer<T>,
    size: usize,
    status: &Status,
) -> Result<(), FilterError> {
    MorphologicalTransformation::new(
        MorphologicalOperator::Median,
        StructuringElement::boxed(size)?,
    )
    .apply(image, status)
}
