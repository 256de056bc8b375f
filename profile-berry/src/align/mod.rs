//! 群体对齐: 代表 profile 查找与标志点传递.

mod median;
mod offset;

pub use median::{MedianError, MedianOptions, MedianResult, RepresentativeMedianFinder};
pub use offset::{OffsetError, OffsetOptions, OffsetResult, ProfileOffsetter};
