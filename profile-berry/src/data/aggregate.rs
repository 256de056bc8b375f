//! 群体逐点统计.

use super::error::{ProfileError, ProfileResult};
use super::Profile;
use ndarray::{Array2, Axis};
use ordered_float::OrderedFloat;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 逐点统计量.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Statistic {
    /// 中位数.
    Median,

    /// 下四分位数.
    LowerQuartile,

    /// 上四分位数.
    UpperQuartile,
}

impl Statistic {
    /// 对应的分位点.
    #[inline]
    pub fn quantile(&self) -> f64 {
        match self {
            Self::Median => 0.5,
            Self::LowerQuartile => 0.25,
            Self::UpperQuartile => 0.75,
        }
    }
}

/// 同一 profile 种类在整个群体上的逐点数据.
///
/// 每个实例先插值到共同长度, 仅用于聚合; 实例自身的原生长度不受影响.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileAggregate {
    /// 行是实例, 列是下标.
    values: Array2<f64>,
}

impl ProfileAggregate {
    /// 将 `profiles` 全部插值到 `length` 个点后聚合.
    ///
    /// `profiles` 为空时返回 `ProfileError::Empty`, `length == 0` 时返回
    /// `ProfileError::InvalidLength`.
    pub fn new(profiles: &[Profile], length: usize) -> ProfileResult<Self> {
        if profiles.is_empty() {
            return Err(ProfileError::Empty);
        }
        if length == 0 {
            return Err(ProfileError::InvalidLength(length));
        }
        let mut values = Array2::zeros((profiles.len(), length));
        for (mut row, p) in values.axis_iter_mut(Axis(0)).zip(profiles) {
            row.assign(&p.resampled(length).values());
        }
        Ok(Self { values })
    }

    /// 聚合长度.
    #[inline]
    pub fn length(&self) -> usize {
        self.values.ncols()
    }

    /// 参与聚合的实例个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.values.nrows()
    }

    /// 逐点 `q` 分位数, `0 <= q <= 1`, 相邻次序统计量之间线性插值.
    pub fn quantile(&self, q: f64) -> Profile {
        assert!((0.0..=1.0).contains(&q), "分位点必须位于 [0, 1] 中");
        let data = self
            .values
            .axis_iter(Axis(1))
            .map(|col| {
                let mut v = col.to_vec();
                v.sort_unstable_by_key(|x| OrderedFloat(*x));
                let pos = q * (v.len() - 1) as f64;
                let lo = pos.floor() as usize;
                let hi = pos.ceil() as usize;
                v[lo] + (v[hi] - v[lo]) * (pos - lo as f64)
            })
            .collect::<Vec<_>>();
        // 列数等于聚合长度, 至少为 1.
        Profile::from_raw_vec(data)
    }

    /// 给定统计量的 profile.
    #[inline]
    pub fn profile(&self, stat: Statistic) -> Profile {
        self.quantile(stat.quantile())
    }

    /// 中位 profile.
    #[inline]
    pub fn median(&self) -> Profile {
        self.profile(Statistic::Median)
    }
}
