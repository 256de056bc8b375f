//! 群体代表 profile (medoid) 查找.

use crate::data::{Profile, ProfileAggregate, ProfileError};
use ordered_float::OrderedFloat;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;
    }
}

/// 代表 profile 查找错误.
#[derive(Clone, Debug, PartialEq)]
pub enum MedianError {
    /// 群体为空.
    EmptyPopulation,

    /// profile 运算错误.
    Profile(ProfileError),
}

impl fmt::Display for MedianError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPopulation => write!(f, "cannot find the median of an empty population"),
            Self::Profile(e) => write!(f, "profile error while finding median: {e}"),
        }
    }
}

impl std::error::Error for MedianError {}

impl From<ProfileError> for MedianError {
    fn from(e: ProfileError) -> Self {
        Self::Profile(e)
    }
}

/// 代表 profile 查找结果.
pub type MedianResult<T> = Result<T, MedianError>;

/// 代表 profile 查找参数.
///
/// 默认对全部实例打分, 结果是精确的 medoid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MedianOptions {
    candidate_limit: Option<usize>,
}

impl MedianOptions {
    /// 对全部实例打分.
    #[inline]
    pub fn exact() -> Self {
        Self::default()
    }

    /// 只对离逐点中位数最近的 `limit` 个候选打分. 结果不再保证是精确的 medoid.
    /// `limit` 必须为正数.
    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        assert!(limit > 0, "候选个数必须为正数");
        self.candidate_limit = Some(limit);
        self
    }

    /// 候选个数上限. `None` 表示不设上限.
    #[inline]
    pub fn candidate_limit(&self) -> Option<usize> {
        self.candidate_limit
    }
}

/// 在一组长度各异的 profile 中选出真实存在的代表实例.
///
/// 逐点中位数不是任何实例的真实形状, 而分段需要真实形状. 因此选取与群体
/// 总平方偏差最小的实例 (medoid):
///
/// 1. 所有实例插值到原生长度的中位数 (只用于比较);
/// 2. 默认每个实例都是候选; 设置了 `candidate_limit` 且实例更多时,
///    只保留离逐点中位数最近的候选;
/// 3. 每个候选与全部实例的平方差之和作为得分, 取得分最小者 (并列取下标最小者);
/// 4. 返回该实例的原生长度 profile.
#[derive(Clone, Debug)]
pub struct RepresentativeMedianFinder<'a> {
    profiles: &'a [Profile],
    options: MedianOptions,
}

impl<'a> RepresentativeMedianFinder<'a> {
    /// 构造查找器.
    #[inline]
    pub fn new(profiles: &'a [Profile], options: MedianOptions) -> Self {
        Self { profiles, options }
    }

    /// 比较时使用的公共长度: 原生长度的 (下) 中位数.
    fn common_length(&self) -> usize {
        let mut lengths: Vec<usize> = self.profiles.iter().map(Profile::len).collect();
        lengths.sort_unstable();
        lengths[(lengths.len() - 1) / 2]
    }

    /// 代表实例在输入中的下标.
    pub fn find_median_index(&self) -> MedianResult<usize> {
        match self.profiles.len() {
            0 => return Err(MedianError::EmptyPopulation),
            1 => return Ok(0),
            _ => {}
        }
        let length = self.common_length();
        let normalized: Vec<Profile> = self
            .profiles
            .iter()
            .map(|p| p.interpolate(length))
            .collect::<Result<_, _>>()?;

        let candidates = self.candidates(&normalized, length)?;
        let scores = score_candidates(&normalized, &candidates);
        let best = candidates
            .iter()
            .zip(scores)
            .min_by_key(|(_, s)| OrderedFloat(*s))
            .map(|(i, _)| *i)
            .ok_or(MedianError::EmptyPopulation)?;
        log::debug!(
            "Representative median is instance {best} of {} (compared at length {length})",
            self.profiles.len()
        );
        Ok(best)
    }

    /// 代表实例, 原生长度.
    pub fn find_median(&self) -> MedianResult<Profile> {
        let i = self.find_median_index()?;
        Ok(self.profiles[i].clone())
    }

    /// 参与打分的候选下标, 升序.
    fn candidates(&self, normalized: &[Profile], length: usize) -> MedianResult<Vec<usize>> {
        let limit = match self.options.candidate_limit() {
            Some(limit) if limit < normalized.len() => limit,
            _ => return Ok((0..normalized.len()).collect()),
        };
        let median = ProfileAggregate::new(normalized, length)?.median();
        let mut ranked: Vec<(usize, f64)> = normalized
            .iter()
            .enumerate()
            .map(|(i, p)| (i, same_length_distance(p, &median)))
            .collect();
        // 稳定排序: 距离相同时保留输入顺序.
        ranked.sort_by_key(|(_, d)| OrderedFloat(*d));
        let mut out: Vec<usize> = ranked.into_iter().take(limit).map(|(i, _)| i).collect();
        out.sort_unstable();
        Ok(out)
    }
}

/// 等长 profile 的平方差之和.
#[inline]
fn same_length_distance(a: &Profile, b: &Profile) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// 每个候选与所有实例的平方差之和.
fn score_candidates(normalized: &[Profile], candidates: &[usize]) -> Vec<f64> {
    let score = |c: &usize| -> f64 {
        normalized
            .iter()
            .map(|p| same_length_distance(&normalized[*c], p))
            .sum()
    };
    #[cfg(feature = "rayon")]
    let scores: Vec<f64> = candidates.par_iter().map(score).collect();
    #[cfg(not(feature = "rayon"))]
    let scores: Vec<f64> = candidates.iter().map(score).collect();
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn wave(n: usize, amplitude: f64) -> Profile {
        Profile::new(
            (0..n)
                .map(|i| 100.0 + amplitude * (2.0 * PI * i as f64 / n as f64).sin())
                .collect(),
        )
        .unwrap()
    }

    /// 空群体报错, 单实例原样返回.
    #[test]
    fn test_median_trivial_populations() {
        let finder = RepresentativeMedianFinder::new(&[], MedianOptions::default());
        assert_eq!(finder.find_median(), Err(MedianError::EmptyPopulation));

        let one = [wave(37, 5.0)];
        let finder = RepresentativeMedianFinder::new(&one, MedianOptions::default());
        assert_eq!(finder.find_median().unwrap(), one[0]);
    }

    /// 中间幅度的实例是代表, 并以原生长度返回.
    #[test]
    fn test_median_picks_central_instance() {
        let population = [
            wave(100, 1.0),
            wave(90, 10.0),
            wave(120, 5.0),
            wave(110, 4.0),
            wave(95, 6.0),
        ];
        let finder = RepresentativeMedianFinder::new(&population, MedianOptions::default());
        assert_eq!(finder.find_median_index(), Ok(2));
        assert_eq!(finder.find_median().unwrap().len(), 120);
    }

    /// 完全相同的实例并列时取第一个.
    #[test]
    fn test_median_ties_take_first() {
        let population = [wave(50, 3.0), wave(50, 3.0), wave(50, 3.0)];
        let finder = RepresentativeMedianFinder::new(&population, MedianOptions::default());
        assert_eq!(finder.find_median_index(), Ok(0));
    }

    /// 候选数受限时仍能选出离中位数最近的实例.
    #[test]
    fn test_median_candidate_limit() {
        let population: Vec<Profile> = (0..9).map(|i| wave(80, i as f64)).collect();
        let all = RepresentativeMedianFinder::new(&population, MedianOptions::default());
        let few = RepresentativeMedianFinder::new(
            &population,
            MedianOptions::exact().with_candidate_limit(2),
        );
        assert_eq!(all.find_median_index(), Ok(4));
        assert_eq!(few.find_median_index(), Ok(4));
    }

    /// 大群体默认对全部实例打分, 离逐点中位数较远的真实 medoid 也不会被漏掉.
    #[test]
    fn test_median_exact_on_large_population() {
        let mut population: Vec<Profile> = Vec::new();
        let mut push = |n: usize, v: [f64; 2]| {
            (0..n).for_each(|_| population.push(Profile::new(v.to_vec()).unwrap()))
        };
        push(30, [0.0, 0.0]);
        push(17, [3.0, 0.0]);
        push(17, [-3.0, 0.0]);
        push(5, [0.0, 40.0]);
        push(1, [0.0, 4.0]);
        assert_eq!(population.len(), 70);

        let finder = RepresentativeMedianFinder::new(&population, MedianOptions::default());
        assert_eq!(finder.find_median_index(), Ok(69));

        // 暴力验证: 返回值的总偏差不大于任何实例.
        let total = |i: usize| -> f64 {
            population
                .iter()
                .map(|p| same_length_distance(&population[i], p))
                .sum()
        };
        assert!((0..70).all(|i| total(69) <= total(i)));
    }

    /// 候选上限为 0 是参数错误.
    #[test]
    #[should_panic]
    fn test_median_options_zero() {
        MedianOptions::exact().with_candidate_limit(0);
    }
}
