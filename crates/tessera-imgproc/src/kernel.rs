use crate::error::FilterError;

/// Filter weights below this magnitude are treated as zero and replaced by 1,
/// so that high-pass kernels with a vanishing coefficient sum are not
/// normalized into oblivion.
pub(crate) const TINY_WEIGHT: f64 = 1.0e-8;

/// A separable filter: one 1-D coefficient vector per convolution axis.
///
/// Scalar filter properties (weight, high-pass nature) are computed once at
/// construction and cached, so they are recomputed exactly when the kernel
/// changes and can never go stale.
#[derive(Clone, Debug, PartialEq)]
pub struct SeparableKernel {
    row: Vec<f64>,
    col: Vec<f64>,
    weight: f64,
    high_pass: bool,
}

impl SeparableKernel {
    /// Create a separable kernel from row and column coefficient vectors.
    ///
    /// Both vectors must have the same odd, non-zero length.
    ///
    /// # Errors
    ///
    /// Returns an error if either vector is empty, the lengths differ, or
    /// the length is even.
    pub fn new(row: Vec<f64>, col: Vec<f64>) -> Result<Self, FilterError> {
        if row.is_empty() || col.is_empty() {
            return Err(FilterError::EmptyKernel);
        }
        if row.len() != col.len() {
            return Err(FilterError::KernelLengthMismatch(row.len(), col.len()));
        }
        if row.len() % 2 == 0 {
            return Err(FilterError::InvalidKernelSize(row.len()));
        }

        // The weight is the product of the sums of both vectors. A vanishing
        // weight (typical of high-pass kernels) is replaced by 1 so the
        // normalization post-pass becomes a no-op.
        let mut weight = row.iter().sum::<f64>() * col.iter().sum::<f64>();
        if weight.abs() < TINY_WEIGHT {
            weight = 1.0;
        }
        let high_pass = row.iter().chain(col.iter()).any(|&h| h < 0.0);

        Ok(Self {
            row,
            col,
            weight,
            high_pass,
        })
    }

    /// Create a symmetric kernel using the same vector for both axes.
    pub fn symmetric(coefficients: Vec<f64>) -> Result<Self, FilterError> {
        Self::new(coefficients.clone(), coefficients)
    }

    /// The row (horizontal) coefficient vector.
    pub fn row(&self) -> &[f64] {
        &self.row
    }

    /// The column (vertical) coefficient vector.
    pub fn col(&self) -> &[f64] {
        &self.col
    }

    /// Linear size of the kernel (length of each coefficient vector).
    pub fn size(&self) -> usize {
        self.row.len()
    }

    /// Half the kernel size, rounded down.
    pub fn radius(&self) -> usize {
        self.row.len() / 2
    }

    /// The cached filter weight: the product of the coefficient sums of both
    /// vectors, or 1 when that product vanishes.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Whether any coefficient is negative. High-pass kernels can produce
    /// out-of-range samples and are subject to the truncate/rescale/raw
    /// policies after convolution.
    pub fn is_high_pass(&self) -> bool {
        self.high_pass
    }
}

/// A 2-D morphological structuring element: an odd n x n boolean mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuringElement {
    size: usize,
    mask: Vec<bool>,
    count: usize,
}

impl StructuringElement {
    /// Create a structuring element from an explicit mask.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero or even, the mask length is not
    /// `size * size`, or the mask has no set elements.
    pub fn new(size: usize, mask: Vec<bool>) -> Result<Self, FilterError> {
        if size == 0 || size % 2 == 0 {
            return Err(FilterError::InvalidKernelSize(size));
        }
        if mask.len() != size * size {
            return Err(FilterError::KernelLengthMismatch(mask.len(), size * size));
        }
        let count = mask.iter().filter(|&&m| m).count();
        if count == 0 {
            return Err(FilterError::EmptyKernel);
        }
        Ok(Self { size, mask, count })
    }

    /// A full n x n box element.
    pub fn boxed(size: usize) -> Result<Self, FilterError> {
        Self::new(size, vec![true; size * size])
    }

    /// A cross (plus sign) element: the center row and center column.
    pub fn cross(size: usize) -> Result<Self, FilterError> {
        if size == 0 || size % 2 == 0 {
            return Err(FilterError::InvalidKernelSize(size));
        }
        let half = size / 2;
        let mask = (0..size * size)
            .map(|i| i / size == half || i % size == half)
            .collect();
        Self::new(size, mask)
    }

    /// A circular element inscribed in the n x n box.
    pub fn circular(size: usize) -> Result<Self, FilterError> {
        if size == 0 || size % 2 == 0 {
            return Err(FilterError::InvalidKernelSize(size));
        }
        let half = size as isize / 2;
        let r2 = half * half;
        let mask = (0..size * size)
            .map(|i| {
                let dy = i as isize / size as isize - half;
                let dx = i as isize % size as isize - half;
                dx * dx + dy * dy <= r2
            })
            .collect();
        Self::new(size, mask)
    }

    /// Linear size of the element.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of set mask elements.
    pub fn element_count(&self) -> usize {
        self.count
    }

    /// Whether every mask element is set.
    pub fn is_box(&self) -> bool {
        self.count == self.size * self.size
    }

    /// Whether the mask element at `(x, y)` is set.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.mask[y * self.size + x]
    }

    /// The element rotated by 180 degrees. Dilation reduces the window
    /// through the reflected element.
    pub fn reflected(&self) -> Self {
        let mut mask = self.mask.clone();
        mask.reverse();
        Self {
            size: self.size,
            mask,
            count: self.count,
        }
    }
}

/// A non-separable response function for frequency-domain convolution:
/// an odd n x n matrix of real coefficients with cached weight and
/// high-pass properties.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskKernel {
    size: usize,
    data: Vec<f64>,
    weight: f64,
    high_pass: bool,
}

impl MaskKernel {
    /// Create a response function from an explicit coefficient matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero or even, or the data length is not
    /// `size * size`.
    pub fn new(size: usize, data: Vec<f64>) -> Result<Self, FilterError> {
        if size == 0 || size % 2 == 0 {
            return Err(FilterError::InvalidKernelSize(size));
        }
        if data.len() != size * size {
            return Err(FilterError::KernelLengthMismatch(data.len(), size * size));
        }
        let weight = data.iter().sum();
        let high_pass = data.iter().any(|&h| h < 0.0);
        Ok(Self {
            size,
            data,
            weight,
            high_pass,
        })
    }

    /// Linear size of the kernel.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The coefficient matrix, row-major.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// The coefficient at `(x, y)`.
    pub fn value(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.size + x]
    }

    /// The cached sum of all coefficients.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Whether any coefficient is negative.
    pub fn is_high_pass(&self) -> bool {
        self.high_pass
    }
}

/// An order-statistic selector for the separable median filter family:
/// picks the `rank`-th smallest sample of each window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankSelector {
    size: usize,
    rank: usize,
}

impl RankSelector {
    /// Create a selector for the `rank`-th smallest of `size` window samples.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero or even, or `rank >= size`.
    pub fn new(size: usize, rank: usize) -> Result<Self, FilterError> {
        if size == 0 || size % 2 == 0 {
            return Err(FilterError::InvalidKernelSize(size));
        }
        if rank >= size {
            return Err(FilterError::InvalidRank(rank, size));
        }
        Ok(Self { size, rank })
    }

    /// The median selector for a window of `size` samples.
    pub fn median(size: usize) -> Result<Self, FilterError> {
        Self::new(size, size / 2)
    }

    /// Window size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Selected rank.
    pub fn rank(&self) -> usize {
        self.rank
    }
}
