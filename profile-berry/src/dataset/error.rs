//! 数据集层的错误.

use crate::align::{MedianError, OffsetError};
use crate::data::{CollectionError, Landmark, ProfileError, ProfileType, SegmentError};
use crate::fitting::FitError;
use crate::rules::RuleError;
use std::fmt;

/// 单个细胞核上的失败. 只影响该细胞核, 不中断整个数据集的处理.
#[derive(Clone, Debug, PartialEq)]
pub enum CellError {
    /// 尚未计算该种 profile.
    MissingProfile(ProfileType),

    /// 尚未确定该标志点.
    MissingLandmark(Landmark),

    /// 尚未分段.
    NotSegmented,

    /// 轮廓点过少, 无法计算 profile.
    TooFewBorderPoints {
        /// 实际点数.
        found: usize,
        /// 至少需要的点数.
        required: usize,
    },

    /// profile 长度与轮廓点数不一致.
    LengthMismatch {
        /// 轮廓点数.
        expected: usize,
        /// 传入的 profile 长度.
        found: usize,
    },

    /// 标志点规则无法解析.
    Rule(RuleError),

    /// 分段错误.
    Segment(SegmentError),

    /// 拟合错误.
    Fit(FitError),

    /// 标志点对齐错误.
    Offset(OffsetError),

    /// profile 运算错误.
    Profile(ProfileError),
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProfile(t) => write!(f, "no {t} profile"),
            Self::MissingLandmark(l) => write!(f, "landmark {l} is not set"),
            Self::NotSegmented => write!(f, "nucleus is not segmented"),
            Self::TooFewBorderPoints { found, required } => write!(
                f,
                "border has {found} points but at least {required} are needed"
            ),
            Self::LengthMismatch { expected, found } => write!(
                f,
                "profile of length {found} does not match border of {expected} points"
            ),
            Self::Rule(e) => write!(f, "{e}"),
            Self::Segment(e) => write!(f, "{e}"),
            Self::Fit(e) => write!(f, "{e}"),
            Self::Offset(e) => write!(f, "{e}"),
            Self::Profile(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CellError {}

macro_rules! impl_from_for_cell_error {
    ($($source: ty => $variant: ident),+ $(,)?) => {
        $(
            impl From<$source> for CellError {
                fn from(e: $source) -> Self {
                    Self::$variant(e)
                }
            }
        )+
    };
}

impl_from_for_cell_error! {
    RuleError => Rule,
    SegmentError => Segment,
    FitError => Fit,
    OffsetError => Offset,
    ProfileError => Profile,
}

/// 细胞核操作结果.
pub type CellResult<T> = Result<T, CellError>;

/// 整个数据集无法继续处理.
#[derive(Clone, Debug, PartialEq)]
pub enum DatasetError {
    /// 数据集中没有细胞核.
    EmptyDataset,

    /// 数据集尚未计算 profile (或没有任何细胞核成功计算).
    NotProfiled,

    /// 细化模式下既没有模板, 也无法从群体聚合构造模板.
    NoTemplate,

    /// 群体聚合错误.
    Collection(CollectionError),

    /// 代表 profile 查找错误.
    Median(MedianError),

    /// profile 运算错误.
    Profile(ProfileError),

    /// 模板分段错误.
    Segment(SegmentError),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDataset => write!(f, "dataset contains no nuclei"),
            Self::NotProfiled => write!(f, "dataset has not been profiled"),
            Self::NoTemplate => write!(f, "no segmentation template available"),
            Self::Collection(e) => write!(f, "{e}"),
            Self::Median(e) => write!(f, "{e}"),
            Self::Profile(e) => write!(f, "{e}"),
            Self::Segment(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DatasetError {}

impl From<CollectionError> for DatasetError {
    fn from(e: CollectionError) -> Self {
        Self::Collection(e)
    }
}

impl From<MedianError> for DatasetError {
    fn from(e: MedianError) -> Self {
        Self::Median(e)
    }
}

impl From<ProfileError> for DatasetError {
    fn from(e: ProfileError) -> Self {
        Self::Profile(e)
    }
}

impl From<SegmentError> for DatasetError {
    fn from(e: SegmentError) -> Self {
        Self::Segment(e)
    }
}

/// 数据集操作结果.
pub type DatasetResult<T> = Result<T, DatasetError>;
