mod log_gamma;
mod naive_det;

pub use log_gamma::*;
pub use naive_det::*;
