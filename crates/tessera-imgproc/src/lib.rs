#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// adaptive local statistics filter module.
pub mod adaptive;

/// error types for the processing engines.
pub mod error;

/// frequency-domain convolution and transform module.
pub mod fft;

/// separable filtering module.
pub mod filter;

/// kernel and structuring element descriptors.
pub mod kernel;

/// morphological transformation module.
pub mod morphology;

/// thread partitioning and overlap reconciliation module.
pub mod parallel;

pub(crate) mod window;

pub use error::FilterError;
