#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// pixel buffer module.
pub mod buffer;

/// error types for the buffer module.
pub mod error;

/// sample type conversions module.
pub mod sample;

/// progress monitoring and cooperative cancellation module.
pub mod status;

pub use buffer::{PixelBuffer, Rect, Selection};
pub use error::BufferError;
pub use sample::Sample;
pub use status::Status;
