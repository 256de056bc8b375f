//! 分段的生成与拟合.
//!
//! `ProfileSegmenter` 在群体代表 profile 上生成模板分段;
//! 拟合器把模板分段映射到任意实例 profile 上, 保持分段 id 与顺序不变.

mod iterative;
mod segmenter;

pub use iterative::IterativeSegmentFitter;
pub use segmenter::{Breakpoint, ProfileSegmenter, SegmenterOptions};

use crate::consts::{fitter as defaults, MINIMUM_SEGMENT_LENGTH};
use crate::data::{scale_segments, Profile, ProfileError, SegmentError, SegmentedProfile};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 拟合错误.
#[derive(Clone, Debug, PartialEq)]
pub enum FitError {
    /// 目标 profile 太短, 无法容纳所有分段的最短长度.
    TargetTooShort {
        /// 目标长度.
        length: usize,
        /// 至少需要的长度.
        required: usize,
    },

    /// 拟合结果无法构成合法分段 (内部不变量被破坏).
    Segment(SegmentError),

    /// profile 运算错误.
    Profile(ProfileError),
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetTooShort { length, required } => write!(
                f,
                "target profile of {length} points is shorter than the {required} points needed"
            ),
            Self::Segment(e) => write!(f, "fitted segments are invalid: {e}"),
            Self::Profile(e) => write!(f, "profile error while fitting: {e}"),
        }
    }
}

impl std::error::Error for FitError {}

impl From<SegmentError> for FitError {
    fn from(e: SegmentError) -> Self {
        Self::Segment(e)
    }
}

impl From<ProfileError> for FitError {
    fn from(e: ProfileError) -> Self {
        Self::Profile(e)
    }
}

/// 拟合结果.
pub type FitResult<T> = Result<T, FitError>;

/// 拟合器参数.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitterOptions {
    /// 最短分段长度.
    min_segment_length: usize,

    /// 每轮迭代中单个断点的搜索半径.
    search_window: usize,

    /// 迭代上限.
    max_iterations: usize,
}

impl FitterOptions {
    /// 构造参数. `min_segment_length` 或 `max_iterations` 为 0 时 panic.
    pub fn new(min_segment_length: usize, search_window: usize, max_iterations: usize) -> Self {
        assert!(min_segment_length > 0, "最短分段长度必须为正");
        assert!(max_iterations > 0, "迭代上限必须为正");
        Self {
            min_segment_length,
            search_window,
            max_iterations,
        }
    }

    /// 最短分段长度.
    #[inline]
    pub fn min_segment_length(&self) -> usize {
        self.min_segment_length
    }

    /// 搜索半径.
    #[inline]
    pub fn search_window(&self) -> usize {
        self.search_window
    }

    /// 迭代上限.
    #[inline]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl Default for FitterOptions {
    fn default() -> Self {
        Self::new(
            MINIMUM_SEGMENT_LENGTH,
            defaults::SEARCH_WINDOW,
            defaults::MAX_ITERATIONS,
        )
    }
}

/// 把模板分段映射到目标 profile 上.
///
/// 结果保持模板的分段 id 集合与顺序, 分段首尾相接覆盖整圈, 且每个分段不短于最短长度.
pub trait SegmentFitter {
    /// 模板.
    fn template(&self) -> &SegmentedProfile;

    /// 拟合 `target`.
    fn fit(&self, target: &Profile) -> FitResult<SegmentedProfile>;
}

/// 单分段模板的快速路径: 目标整体作为唯一分段.
fn fit_single(template: &SegmentedProfile, target: &Profile) -> SegmentedProfile {
    let t = &template.ordered_segments()[0];
    SegmentedProfile::single(target.clone(), t.id(), t.name())
}

/// 把模板断点按长度比例缩放到目标上, 并修复过短的分段.
fn scale_template(
    template: &SegmentedProfile,
    target: &Profile,
    min_length: usize,
) -> FitResult<SegmentedProfile> {
    let n = target.len();
    let required = template.segment_count() * min_length;
    if n < required {
        return Err(FitError::TargetTooShort {
            length: n,
            required,
        });
    }
    let segments = scale_segments(template.ordered_segments(), template.len(), n, min_length)?;
    Ok(SegmentedProfile::with_min_length(
        target.clone(),
        segments,
        min_length,
    )?)
}

/// 按比例缩放模板断点的拟合器. 不查看目标 profile 的形状.
#[derive(Clone, Debug)]
pub struct ProportionalFitter {
    template: SegmentedProfile,
    options: FitterOptions,
}

impl ProportionalFitter {
    /// 以 `template` 为模板构造.
    #[inline]
    pub fn new(template: SegmentedProfile, options: FitterOptions) -> Self {
        Self { template, options }
    }
}

impl SegmentFitter for ProportionalFitter {
    #[inline]
    fn template(&self) -> &SegmentedProfile {
        &self.template
    }

    fn fit(&self, target: &Profile) -> FitResult<SegmentedProfile> {
        if self.template.is_single_segment() {
            return Ok(fit_single(&self.template, target));
        }
        scale_template(&self.template, target, self.options.min_segment_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Segment, SegmentId};

    fn ramp(n: usize) -> Profile {
        Profile::new((0..n).map(|i| i as f64).collect()).unwrap()
    }

    fn template() -> SegmentedProfile {
        let n = 100;
        SegmentedProfile::new(
            ramp(n),
            vec![
                Segment::new(SegmentId::nth(0), 0, 20, n).unwrap(),
                Segment::new(SegmentId::nth(1), 20, 60, n).unwrap(),
                Segment::new(SegmentId::nth(2), 60, 0, n).unwrap(),
            ],
        )
        .unwrap()
    }

    /// 比例拟合保持 id 顺序与长度比例.
    #[test]
    fn test_proportional_fit() {
        let f = ProportionalFitter::new(template(), FitterOptions::default());
        let out = f.fit(&ramp(50)).unwrap();
        assert_eq!(out.segment_ids(), template().segment_ids());
        let bounds: Vec<(usize, usize)> = out
            .ordered_segments()
            .iter()
            .map(|s| (s.start(), s.end()))
            .collect();
        assert_eq!(bounds, vec![(0, 10), (10, 30), (30, 0)]);
    }

    /// 目标过短时报错.
    #[test]
    fn test_proportional_fit_too_short() {
        let f = ProportionalFitter::new(template(), FitterOptions::default());
        assert_eq!(
            f.fit(&ramp(25)),
            Err(FitError::TargetTooShort {
                length: 25,
                required: 30
            })
        );
    }

    /// 单分段模板得到唯一整圈分段.
    #[test]
    fn test_single_segment_template() {
        let t = SegmentedProfile::unsegmented(ramp(40));
        let f = ProportionalFitter::new(t, FitterOptions::default());
        let out = f.fit(&ramp(7)).unwrap();
        assert!(out.is_single_segment());
        assert!(out.ordered_segments()[0].is_full_circle());
        assert_eq!(out.ordered_segments()[0].length(), 7);
        assert_eq!(out.profile(), &ramp(7));
    }
}
