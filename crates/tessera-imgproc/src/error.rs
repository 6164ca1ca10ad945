use tessera_image::BufferError;

/// An error type for the processing engines.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    /// Error when an operation is attempted with an empty kernel.
    #[error("Attempt to apply an empty kernel")]
    EmptyKernel,

    /// Error when a kernel or structuring element size is zero or even.
    #[error("Kernel size must be odd and non-zero, got {0}")]
    InvalidKernelSize(usize),

    /// Error when separable kernel vectors have mismatched lengths.
    #[error("Separable kernel vectors must have equal lengths, got {0} and {1}")]
    KernelLengthMismatch(usize, usize),

    /// Error when a gaussian sigma is not positive.
    #[error("Gaussian sigma must be > 0, got {0}")]
    InvalidSigma(f64),

    /// Error when the interlacing distance is zero.
    #[error("Interlacing distance must be >= 1")]
    InvalidInterlacingDistance,

    /// Error when the maximum processor count is zero.
    #[error("Maximum processor count must be > 0")]
    InvalidMaxProcessors,

    /// Error when raw high-pass output is requested for an integer target.
    #[error("Raw high-pass output requires a floating point target")]
    RawHighPassRequiresFloat,

    /// Error when a rank selector is out of range for its window.
    #[error("Selection rank {0} is out of range for a window of {1} samples")]
    InvalidRank(usize, usize),

    /// The operation observed an abort request and unwound cleanly.
    #[error("The operation was cancelled")]
    Cancelled,

    /// The worker thread pool could not be built.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),

    /// A pixel buffer error.
    #[error(transparent)]
    Buffer(#[from] BufferError),
}
