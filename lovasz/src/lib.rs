mod abst;

pub use abst::*;

pub mod algo;
pub mod util;
