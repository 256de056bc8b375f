//! 从代表性 profile 导出初始分段.

use crate::consts::{segmenter as defaults, MINIMUM_SEGMENT_LENGTH};
use crate::data::{Profile, Segment, SegmentId, SegmentResult, SegmentedProfile};
use binary_heap_plus::BinaryHeap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 分段器参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmenterOptions {
    /// 最短分段长度.
    min_segment_length: usize,

    /// 最多分段个数.
    max_segments: usize,

    /// 平滑窗口半径.
    smooth_window: usize,

    /// 局部极值窗口半径.
    extrema_window: usize,

    /// 差分窗口半径.
    delta_window: usize,

    /// 候选断点的二阶差分强度阈值, 以二阶差分值域的比例计.
    min_rate_of_change: f64,
}

impl SegmenterOptions {
    /// 以最短分段长度 `min_segment_length` 和最多分段个数 `max_segments` 构造,
    /// 其余参数取默认值.
    ///
    /// `min_segment_length == 0` 或 `max_segments == 0` 时 panic.
    pub fn new(min_segment_length: usize, max_segments: usize) -> Self {
        assert!(min_segment_length > 0, "最短分段长度必须为正");
        assert!(max_segments > 0, "最多分段个数必须为正");
        Self {
            min_segment_length,
            max_segments,
            smooth_window: defaults::SMOOTH_WINDOW,
            extrema_window: defaults::EXTREMA_WINDOW,
            delta_window: defaults::DELTA_WINDOW,
            min_rate_of_change: defaults::MIN_RATE_OF_CHANGE,
        }
    }

    /// 设置平滑, 极值和差分窗口半径. 极值与差分窗口必须为正.
    pub fn with_windows(mut self, smooth: usize, extrema: usize, delta: usize) -> Self {
        assert!(extrema > 0 && delta > 0, "极值与差分窗口必须为正");
        self.smooth_window = smooth;
        self.extrema_window = extrema;
        self.delta_window = delta;
        self
    }

    /// 设置二阶差分强度阈值比例, 必须位于 `[0, 1)`.
    pub fn with_min_rate_of_change(mut self, rate: f64) -> Self {
        assert!((0.0..1.0).contains(&rate), "阈值比例必须位于 [0, 1)");
        self.min_rate_of_change = rate;
        self
    }

    /// 最短分段长度.
    #[inline]
    pub fn min_segment_length(&self) -> usize {
        self.min_segment_length
    }

    /// 最多分段个数.
    #[inline]
    pub fn max_segments(&self) -> usize {
        self.max_segments
    }
}

impl Default for SegmenterOptions {
    fn default() -> Self {
        Self::new(MINIMUM_SEGMENT_LENGTH, defaults::MAX_SEGMENTS)
    }
}

/// 候选断点.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Breakpoint {
    /// 下标.
    pub index: usize,

    /// 强度 (二阶差分绝对值).
    pub strength: f64,
}

/// 在代表性 profile 上寻找断点并生成分段. 结果只由输入与参数决定.
#[derive(Clone, Debug, Default)]
pub struct ProfileSegmenter {
    options: SegmenterOptions,
}

impl ProfileSegmenter {
    /// 构造分段器.
    #[inline]
    pub fn new(options: SegmenterOptions) -> Self {
        Self { options }
    }

    /// 参数.
    #[inline]
    pub fn options(&self) -> &SegmenterOptions {
        &self.options
    }

    /// 所有候选断点: 平滑后 profile 的局部极值中, 二阶差分强度超过阈值,
    /// 且与下标 0 (两侧) 的距离都不小于最短分段长度者. 按下标升序.
    pub fn candidates(&self, profile: &Profile) -> Vec<Breakpoint> {
        let o = &self.options;
        let n = profile.len();
        let min = o.min_segment_length;
        let smoothed = profile.smooth(o.smooth_window);
        let extrema = smoothed
            .local_minima(o.extrema_window)
            .or(&smoothed.local_maxima(o.extrema_window));
        let second = smoothed
            .deltas(o.delta_window)
            .smooth(o.smooth_window)
            .deltas(o.delta_window);
        let threshold = second.range() * o.min_rate_of_change;

        extrema
            .true_indexes()
            .into_iter()
            .filter(|i| *i >= min && n - i >= min)
            .map(|index| Breakpoint {
                index,
                strength: second.get(index).abs(),
            })
            .filter(|b| b.strength > threshold)
            .collect()
    }

    /// 生成分段 (以下标 0 为第一个断点).
    ///
    /// 1. 过近的候选断点合并: 按强度从高到低接受, 与已接受断点距离不足最短分段长度者丢弃;
    /// 2. 分段数超过上限时, 依次丢弃最弱的断点;
    /// 3. 分段数少于 2 时, 返回唯一的全圆默认分段.
    pub fn segment(&self, profile: &Profile) -> Vec<Segment> {
        let n = profile.len();
        let min = self.options.min_segment_length;
        if n < 2 * min {
            return vec![Segment::full_circle(SegmentId::DEFAULT, n)];
        }

        // 堆顶为最强候选, 强度相同时下标小者优先.
        let mut heap = BinaryHeap::new_by(|a: &Breakpoint, b: &Breakpoint| {
            a.strength
                .total_cmp(&b.strength)
                .then_with(|| b.index.cmp(&a.index))
        });
        heap.extend(self.candidates(profile));

        let mut accepted: Vec<usize> = Vec::with_capacity(self.options.max_segments);
        while let Some(b) = heap.pop() {
            if accepted.len() + 1 >= self.options.max_segments {
                break;
            }
            let far_enough = accepted.iter().all(|a| {
                let d = a.abs_diff(b.index);
                d.min(n - d) >= min
            });
            if far_enough {
                accepted.push(b.index);
            }
        }
        if accepted.is_empty() {
            return vec![Segment::full_circle(SegmentId::DEFAULT, n)];
        }

        accepted.sort_unstable();
        let mut bounds = Vec::with_capacity(accepted.len() + 2);
        bounds.push(0);
        bounds.extend(accepted);
        bounds.push(n);
        let segments = bounds
            .windows(2)
            .enumerate()
            .filter_map(|(i, w)| Segment::new(SegmentId::nth(i), w[0], w[1] % n, n).ok())
            .collect::<Vec<_>>();
        log::debug!(
            "Segmented a profile of {n} points into {} segments",
            segments.len()
        );
        segments
    }

    /// 生成分段并组装成 `SegmentedProfile`.
    pub fn segment_profile(&self, profile: &Profile) -> SegmentResult<SegmentedProfile> {
        let segments = self.segment(profile);
        SegmentedProfile::with_min_length(
            profile.clone(),
            segments,
            self.options.min_segment_length,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// 三个 "尖角" 的环形信号.
    fn bumpy(n: usize) -> Profile {
        Profile::new(
            (0..n)
                .map(|i| {
                    let t = 2.0 * PI * i as f64 / n as f64;
                    180.0 - 40.0 * (3.0 * t + 0.4).cos().max(0.0).powi(4) - 10.0 * t.sin()
                })
                .collect(),
        )
        .unwrap()
    }

    /// 常数 profile 只有一个默认分段.
    #[test]
    fn test_segment_flat() {
        let seg = ProfileSegmenter::default();
        let s = seg.segment(&Profile::filled(100, 180.0).unwrap());
        assert_eq!(s.len(), 1);
        assert!(s[0].is_full_circle());
        assert_eq!(s[0].id(), SegmentId::DEFAULT);
    }

    /// 过短的 profile 只有一个默认分段.
    #[test]
    fn test_segment_short() {
        let seg = ProfileSegmenter::default();
        let s = seg.segment(&bumpy(15));
        assert_eq!(s.len(), 1);
    }

    /// 有明显结构的 profile 产生多个合法分段, 且结果确定.
    #[test]
    fn test_segment_structured_deterministic() {
        let seg = ProfileSegmenter::default();
        let p = bumpy(200);
        let a = seg.segment(&p);
        let b = seg.segment(&p);
        assert_eq!(a, b);
        assert!(a.len() >= 2, "{a:?}");
        assert!(a.len() <= SegmenterOptions::default().max_segments());
        assert_eq!(a[0].start(), 0);
        assert!(a.iter().all(|s| s.length() >= MINIMUM_SEGMENT_LENGTH));
        let sp = seg.segment_profile(&p).unwrap();
        assert_eq!(sp.segment_count(), a.len());
    }

    /// 分段上限生效.
    #[test]
    fn test_segment_max_segments() {
        let seg = ProfileSegmenter::new(SegmenterOptions::new(10, 2));
        let s = seg.segment(&bumpy(200));
        assert_eq!(s.len(), 2);
        let ids: Vec<SegmentId> = s.iter().map(Segment::id).collect();
        assert_eq!(ids, vec![SegmentId::nth(0), SegmentId::nth(1)]);
    }
}
