//! 数据模型层的错误.

use crate::data::{Landmark, ProfileType, SegmentId};
use std::fmt;

/// `Profile` 构造或运算错误.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProfileError {
    /// 试图构造空 profile.
    Empty,

    /// 两个 profile 长度不一致, 无法逐元素运算.
    DimensionMismatch {
        /// 左操作数长度.
        expected: usize,
        /// 右操作数长度.
        found: usize,
    },

    /// 非法的目标长度 (例如插值到 0 个点).
    InvalidLength(usize),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "profile must contain at least one value"),
            Self::DimensionMismatch { expected, found } => {
                write!(f, "profile length mismatch: {expected} vs {found}")
            }
            Self::InvalidLength(n) => write!(f, "invalid profile length {n}"),
        }
    }
}

impl std::error::Error for ProfileError {}

/// `Profile` 相关运算的结果.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// 非法分段集合. 构造 `SegmentedProfile` 或改变其结构时产生.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentError {
    /// 分段集合为空.
    NoSegments,

    /// 分段记录的总长与 profile 长度不同.
    LengthMismatch {
        /// 分段 id.
        id: SegmentId,
        /// 分段记录的总长.
        total: usize,
        /// profile 长度.
        profile: usize,
    },

    /// 分段起止下标越界.
    OutOfRange(SegmentId),

    /// 分段短于最短长度.
    TooShort {
        /// 分段 id.
        id: SegmentId,
        /// 实际长度.
        length: usize,
        /// 最短长度.
        min: usize,
    },

    /// 相邻分段之间有空隙或重叠, 即分段没有恰好覆盖整个圆.
    NotContiguous(SegmentId),

    /// 同一 id 出现多次.
    DuplicateId(SegmentId),

    /// 找不到给定 id 的分段.
    UnknownSegment(SegmentId),

    /// 全圆分段 (`start == end`) 只能单独存在.
    FullCircleNotAlone(SegmentId),

    /// 两个分段不相邻, 无法合并.
    CannotMerge(SegmentId, SegmentId),

    /// 分割点不在分段内部, 或分割后的任一部分过短.
    CannotSplit(SegmentId),

    /// id 集合相同, 但环形顺序与模板不同.
    OrderMismatch(SegmentId),

    /// 两组分段的个数不同.
    CountMismatch {
        /// 期望的分段个数.
        expected: usize,
        /// 实际的分段个数.
        found: usize,
    },

    /// 目标长度不足以容纳所有分段的最短长度.
    NotEnoughRoom {
        /// 目标长度.
        length: usize,
        /// 至少需要的长度.
        required: usize,
    },
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSegments => write!(f, "no segments given"),
            Self::LengthMismatch { id, total, profile } => write!(
                f,
                "segment {id} spans a circle of {total} but the profile has {profile} points"
            ),
            Self::OutOfRange(id) => write!(f, "segment {id} has out of range indexes"),
            Self::TooShort { id, length, min } => {
                write!(f, "segment {id} has length {length}, minimum is {min}")
            }
            Self::NotContiguous(id) => {
                write!(f, "segment {id} does not start where its predecessor ends")
            }
            Self::DuplicateId(id) => write!(f, "segment id {id} is used more than once"),
            Self::UnknownSegment(id) => write!(f, "no segment with id {id}"),
            Self::FullCircleNotAlone(id) => {
                write!(f, "full circle segment {id} is not the only segment")
            }
            Self::CannotMerge(a, b) => write!(f, "segments {a} and {b} are not adjacent"),
            Self::CannotSplit(id) => write!(f, "segment {id} cannot be split there"),
            Self::OrderMismatch(id) => {
                write!(f, "segment {id} is not in the template's circular order")
            }
            Self::CountMismatch { expected, found } => {
                write!(f, "expected {expected} segments, found {found}")
            }
            Self::NotEnoughRoom { length, required } => write!(
                f,
                "a profile of {length} points cannot hold segments needing {required} points"
            ),
        }
    }
}

impl std::error::Error for SegmentError {}

/// 分段相关运算的结果.
pub type SegmentResult<T> = Result<T, SegmentError>;

/// 群体聚合查询错误.
#[derive(Clone, Debug, PartialEq)]
pub enum CollectionError {
    /// 尚未为该 profile 种类建立聚合.
    NoAggregate(ProfileType),

    /// 聚合中没有该标志点的偏移.
    MissingLandmark(Landmark),

    /// 分段模式非法.
    Segment(SegmentError),
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAggregate(t) => write!(f, "no {t} aggregate has been built"),
            Self::MissingLandmark(l) => write!(f, "the collection has no {l}"),
            Self::Segment(e) => write!(f, "invalid segment pattern: {e}"),
        }
    }
}

impl std::error::Error for CollectionError {}

impl From<SegmentError> for CollectionError {
    fn from(e: SegmentError) -> Self {
        Self::Segment(e)
    }
}

/// 群体聚合查询的结果.
pub type CollectionResult<T> = Result<T, CollectionError>;
