//! profile 数据模型: 环形 profile, 分段, 带分段的 profile 与群体聚合.

mod aggregate;
mod collection;
mod error;
mod landmark;
mod mask;
mod profile;
mod segment;
mod segmented;

pub use aggregate::{ProfileAggregate, Statistic};
pub use collection::ProfileCollection;
pub use error::{
    CollectionError, CollectionResult, ProfileError, ProfileResult, SegmentError, SegmentResult,
};
pub use landmark::{Landmark, ProfileType};
pub use mask::BooleanMask;
pub use profile::Profile;
pub use segment::{Segment, SegmentId};
pub use segmented::SegmentedProfile;

pub(crate) use segmented::scale_segments;

/// 环形弧 `[start, end)` 在长度为 `total` 的圆上的长度. `start == end` 视为整圈.
#[inline]
pub(crate) fn arc_length(start: usize, end: usize, total: usize) -> usize {
    let (s, e) = (start % total, end % total);
    if e > s {
        e - s
    } else {
        total - s + e
    }
}

/// 下标 `i` 是否落在环形弧 `[start, end)` 内.
#[inline]
pub(crate) fn arc_contains(start: usize, end: usize, total: usize, i: usize) -> bool {
    (i % total + total - start % total) % total < arc_length(start, end, total)
}

/// 有符号下标对 `n` 取模.
#[inline]
pub(crate) fn wrap_signed(i: isize, n: usize) -> usize {
    i.rem_euclid(n as isize) as usize
}
