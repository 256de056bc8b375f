//! 数据集分析参数.

use crate::align::{MedianOptions, OffsetOptions};
use crate::consts::{profiling as defaults, MINIMUM_PROFILE_LENGTH};
use crate::fitting::{FitterOptions, SegmenterOptions};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// profile 计算参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfilingOptions {
    angle_window_fraction: f64,
    min_border_points: usize,
}

impl ProfilingOptions {
    /// 构造参数.
    ///
    /// `angle_window_fraction` 必须位于 `(0, 0.5)`, `min_border_points` 不小于 3.
    pub fn new(angle_window_fraction: f64, min_border_points: usize) -> Self {
        assert!(
            angle_window_fraction > 0.0 && angle_window_fraction < 0.5,
            "角度窗口比例必须位于 (0, 0.5)"
        );
        assert!(
            min_border_points >= MINIMUM_PROFILE_LENGTH,
            "轮廓点数下限不能小于 {MINIMUM_PROFILE_LENGTH}"
        );
        Self {
            angle_window_fraction,
            min_border_points,
        }
    }

    /// 角度 profile 邻域半径占轮廓点数的比例.
    #[inline]
    pub fn angle_window_fraction(&self) -> f64 {
        self.angle_window_fraction
    }

    /// 计算 profile 所需的最少轮廓点数.
    #[inline]
    pub fn min_border_points(&self) -> usize {
        self.min_border_points
    }

    /// 点数为 `n` 的轮廓上角度 profile 的邻域半径, 至少为 1.
    #[inline]
    pub fn angle_window(&self, n: usize) -> usize {
        ((n as f64 * self.angle_window_fraction).round() as usize).max(1)
    }
}

impl Default for ProfilingOptions {
    fn default() -> Self {
        Self::new(defaults::ANGLE_WINDOW_FRACTION, MINIMUM_PROFILE_LENGTH)
    }
}

/// 一次数据集分析用到的全部参数.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisOptions {
    /// profile 计算.
    pub profiling: ProfilingOptions,

    /// 模板分段.
    pub segmenter: SegmenterOptions,

    /// 逐实例拟合.
    pub fitter: FitterOptions,

    /// 代表 profile 查找.
    pub median: MedianOptions,

    /// 标志点对齐.
    pub offset: OffsetOptions,
}

impl AnalysisOptions {
    /// 以统一的最短分段长度构造, 其余取默认值.
    pub fn with_min_segment_length(min_segment_length: usize) -> Self {
        let segmenter = SegmenterOptions::default();
        let fitter = FitterOptions::default();
        Self {
            segmenter: SegmenterOptions::new(min_segment_length, segmenter.max_segments()),
            fitter: FitterOptions::new(
                min_segment_length,
                fitter.search_window(),
                fitter.max_iterations(),
            ),
            ..Self::default()
        }
    }

    /// 模板与拟合共用的最短分段长度.
    #[inline]
    pub fn min_segment_length(&self) -> usize {
        self.fitter.min_segment_length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 角度窗口随轮廓点数缩放, 至少为 1.
    #[test]
    fn test_angle_window() {
        let o = ProfilingOptions::default();
        assert_eq!(o.angle_window(200), 10);
        assert_eq!(o.angle_window(10), 1);
        assert_eq!(o.angle_window(3), 1);
    }

    /// 统一设置最短分段长度.
    #[test]
    fn test_analysis_min_length() {
        let o = AnalysisOptions::with_min_segment_length(6);
        assert_eq!(o.segmenter.min_segment_length(), 6);
        assert_eq!(o.min_segment_length(), 6);
        assert_eq!(AnalysisOptions::default().min_segment_length(), 10);
    }

    #[test]
    #[should_panic]
    fn test_profiling_options_bad_fraction() {
        ProfilingOptions::new(0.7, 3);
    }
}
