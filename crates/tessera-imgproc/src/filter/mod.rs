//! Separable spatial filtering: 1-D kernel builders, the windowed line
//! processor and the two-pass separable engines built on top of it.

mod kernels;
mod line;
mod separable;

pub use kernels::{
    box_kernel_1d, gaussian_kernel, gaussian_kernel_1d, gaussian_kernel_2d, laplacian_kernel_2d,
};
pub use separable::{
    ConvolutionConfig, HighPassPolicy, SeparableConvolution, SeparableMedianFilter,
};

pub(crate) use line::select_rank;
pub(crate) use separable::apply_high_pass_policy_in;
