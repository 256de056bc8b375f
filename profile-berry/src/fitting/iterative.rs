//! 局部搜索分段拟合.

use super::{fit_single, scale_template, FitResult, FitterOptions, SegmentFitter};
use crate::consts::EPSILON;
use crate::data::{arc_length, Profile, SegmentedProfile};

/// 迭代局部搜索拟合器.
///
/// 1. 以模板断点按长度比例缩放到目标上作为初值;
/// 2. 每轮依次考察每个断点, 在 `[-search_window, search_window]` 的位移内寻找使两侧相邻分段
///    代价之和最小的位置. 分段代价是模板分段与目标弧 (插值到模板分段长度后) 的均方差;
/// 3. 只有严格改进才移动断点; 某轮没有任何断点移动, 或达到迭代上限时停止.
///
/// 得到的是局部最优解. 位于参考点 (模板下标 0) 的断点, 以及锁定分段两端的断点不会移动.
#[derive(Clone, Debug)]
pub struct IterativeSegmentFitter {
    template: SegmentedProfile,
    options: FitterOptions,

    /// 模板各分段 (按规范顺序) 的取值.
    pieces: Vec<Vec<f64>>,

    /// 各断点是否固定.
    anchored: Vec<bool>,
}

impl IterativeSegmentFitter {
    /// 以 `template` 为模板构造.
    pub fn new(template: SegmentedProfile, options: FitterOptions) -> Self {
        let segments = template.ordered_segments();
        let k = segments.len();
        let pieces = segments
            .iter()
            .map(|s| template.profile().sample_arc(s.start(), s.length(), s.length()))
            .collect();
        let anchored = (0..k)
            .map(|j| {
                let s = &segments[j];
                s.start() == 0 || s.is_locked() || segments[(j + k - 1) % k].is_locked()
            })
            .collect();
        Self {
            template,
            options,
            pieces,
            anchored,
        }
    }

    /// 目标弧 `[start, start + length)` 与模板第 `j` 个分段的均方差.
    fn segment_cost(&self, target: &Profile, j: usize, start: usize, length: usize) -> f64 {
        let piece = &self.pieces[j];
        let sampled = target.sample_arc(start, length, piece.len());
        let sum: f64 = piece
            .iter()
            .zip(sampled.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum();
        sum / piece.len() as f64
    }

    /// 断点 `j` 位于 `at` 时, 两侧相邻分段的代价之和.
    fn local_cost(&self, target: &Profile, starts: &[usize], j: usize, at: usize) -> f64 {
        let n = target.len();
        let k = starts.len();
        let prev = (j + k - 1) % k;
        let next = (j + 1) % k;
        let left = arc_length(starts[prev], at, n);
        let right = arc_length(at, starts[next], n);
        self.segment_cost(target, prev, starts[prev], left) + self.segment_cost(target, j, at, right)
    }

    /// 在允许的位移内为断点 `j` 寻找最优位置. 返回新位置 (可能不变).
    fn best_position(&self, target: &Profile, starts: &[usize], j: usize) -> usize {
        let n = target.len();
        let k = starts.len();
        let min = self.options.min_segment_length();
        let lo = starts[(j + k - 1) % k];
        // 前后两个断点之间的跨度; 只有两个分段时跨度为整圈.
        let span = arc_length(lo, starts[(j + 1) % k], n);
        let current = arc_length(lo, starts[j], n) % n;
        let w = self.options.search_window() as isize;

        let mut best = starts[j];
        let mut best_cost = self.local_cost(target, starts, j, best);
        for d in (1..=w).flat_map(|d| [-d, d]) {
            let offset = current as isize + d;
            if offset < min as isize || offset > (span - min) as isize {
                continue;
            }
            let at = (lo + offset as usize) % n;
            let cost = self.local_cost(target, starts, j, at);
            if cost < best_cost - EPSILON {
                best = at;
                best_cost = cost;
            }
        }
        best
    }
}

impl SegmentFitter for IterativeSegmentFitter {
    #[inline]
    fn template(&self) -> &SegmentedProfile {
        &self.template
    }

    fn fit(&self, target: &Profile) -> FitResult<SegmentedProfile> {
        if self.template.is_single_segment() {
            return Ok(fit_single(&self.template, target));
        }
        let min = self.options.min_segment_length();
        let init = scale_template(&self.template, target, min)?;
        let segments = self.template.ordered_segments();
        let k = segments.len();
        let n = target.len();
        let mut starts = segments
            .iter()
            .map(|t| init.segment(t.id()).map(|s| s.start()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut iterations = 0;
        for _ in 0..self.options.max_iterations() {
            iterations += 1;
            let mut moved = false;
            for j in (0..k).filter(|j| !self.anchored[*j]) {
                let at = self.best_position(target, &starts, j);
                if at != starts[j] {
                    starts[j] = at;
                    moved = true;
                }
            }
            if !moved {
                break;
            }
        }
        log::debug!("Fitted {k} segments onto {n} points in {iterations} iterations");

        let fitted = segments
            .iter()
            .enumerate()
            .map(|(j, t)| t.rebase(starts[j], starts[(j + 1) % k], n))
            .collect();
        Ok(SegmentedProfile::with_min_length(
            target.clone(),
            fitted,
            min,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Segment, SegmentId};
    use crate::fitting::{FitError, ProfileSegmenter};
    use std::f64::consts::PI;

    /// 在下标 `a`, `b` 处有两个尖锐凹陷的信号.
    fn dips(n: usize, a: f64, b: f64) -> Profile {
        Profile::new(
            (0..n)
                .map(|i| {
                    let x = i as f64 / n as f64;
                    let g = |c: f64| (-((x - c) * 40.0).powi(2)).exp();
                    100.0 - 60.0 * g(a) - 60.0 * g(b) + 5.0 * (2.0 * PI * x).sin()
                })
                .collect(),
        )
        .unwrap()
    }

    fn template() -> SegmentedProfile {
        let n = 200;
        let p = dips(n, 0.3, 0.7);
        SegmentedProfile::new(
            p,
            vec![
                Segment::new(SegmentId::nth(0), 0, 60, n).unwrap(),
                Segment::new(SegmentId::nth(1), 60, 140, n).unwrap(),
                Segment::new(SegmentId::nth(2), 140, 0, n).unwrap(),
            ],
        )
        .unwrap()
    }

    /// 目标与模板一致时, 断点保持不变.
    #[test]
    fn test_iterative_idempotent() {
        let t = template();
        let f = IterativeSegmentFitter::new(t.clone(), FitterOptions::default());
        let out = f.fit(t.profile()).unwrap();
        assert_eq!(out.ordered_segments(), t.ordered_segments());
        let again = f.fit(out.profile()).unwrap();
        assert_eq!(again, out);
    }

    /// 结构平移后, 断点跟随结构移动.
    #[test]
    fn test_iterative_follows_shape() {
        let t = template();
        let f = IterativeSegmentFitter::new(t.clone(), FitterOptions::default());
        let target = dips(200, 0.33, 0.73);
        let out = f.fit(&target).unwrap();
        assert_eq!(out.segment_ids(), t.segment_ids());
        let b1 = out.segment(SegmentId::nth(1)).unwrap().start();
        let b2 = out.segment(SegmentId::nth(2)).unwrap().start();
        assert!((64..=68).contains(&b1), "b1 = {b1}");
        assert!((144..=148).contains(&b2), "b2 = {b2}");
        // 参考点处的断点固定.
        assert_eq!(out.ordered_segments()[0].start(), 0);
    }

    /// 不同长度的目标: 保持 id 顺序, 满足最短长度, 整圈覆盖.
    #[test]
    fn test_iterative_rescaled_target() {
        let t = template();
        let f = IterativeSegmentFitter::new(t.clone(), FitterOptions::default());
        let out = f.fit(&dips(137, 0.31, 0.69)).unwrap();
        assert_eq!(out.len(), 137);
        assert_eq!(out.segment_ids(), t.segment_ids());
        assert!(out.ordered_segments().iter().all(|s| s.length() >= 10));
        let total: usize = out.ordered_segments().iter().map(Segment::length).sum();
        assert_eq!(total, 137);
    }

    /// 单分段模板对任意目标给出唯一整圈分段.
    #[test]
    fn test_iterative_single_segment() {
        let t = SegmentedProfile::unsegmented(dips(100, 0.3, 0.7));
        let f = IterativeSegmentFitter::new(t, FitterOptions::default());
        for n in [5, 50, 333] {
            let target = dips(n, 0.5, 0.9);
            let out = f.fit(&target).unwrap();
            assert!(out.is_single_segment());
            assert!(out.ordered_segments()[0].is_full_circle());
            assert_eq!(out.profile(), &target);
        }
    }

    /// 目标过短时报错.
    #[test]
    fn test_iterative_too_short() {
        let f = IterativeSegmentFitter::new(template(), FitterOptions::default());
        assert!(matches!(
            f.fit(&dips(20, 0.3, 0.7)),
            Err(FitError::TargetTooShort { .. })
        ));
    }

    /// 与分段器配合: 在分段器生成的模板上拟合其自身.
    #[test]
    fn test_iterative_with_segmenter_template() {
        let p = dips(240, 0.3, 0.7);
        let t = ProfileSegmenter::default().segment_profile(&p).unwrap();
        let f = IterativeSegmentFitter::new(t.clone(), FitterOptions::default());
        assert_eq!(f.fit(&p).unwrap(), t);
    }
}
