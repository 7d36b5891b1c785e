mod kernels;
pub use kernels::{gaussian_kernel_1d, pyramid_kernel_1d};

mod separable_filter;
pub use separable_filter::{gaussian_blur, separable_filter};
