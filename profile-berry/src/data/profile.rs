//! 环形数值序列.

use super::error::{ProfileError, ProfileResult};
use super::mask::BooleanMask;
use super::{arc_length, wrap_signed};
use itertools::Itertools;
use ndarray::{Array1, ArrayView1};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 从细胞核边缘导出的环形数值信号.
///
/// 长度 `N >= 1`, 所有下标运算都对 `N` 取模. 该类型是值类型:
/// 所有变换都返回新的 profile, 不会修改自身.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawProfile"))]
pub struct Profile {
    data: Array1<f64>,
}

/// 反序列化的中间形式, 经 `Profile::from_array` 校验.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawProfile {
    data: Array1<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawProfile> for Profile {
    type Error = ProfileError;

    fn try_from(raw: RawProfile) -> ProfileResult<Self> {
        Self::from_array(raw.data)
    }
}

macro_rules! impl_elementwise {
    ($($(#[$doc:meta])* $name:ident => $op:tt;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self, other: &Profile) -> ProfileResult<Profile> {
                self.check_same_len(other)?;
                Ok(Self {
                    data: &self.data $op &other.data,
                })
            }
        )*
    };
}

#[allow(clippy::len_without_is_empty)]
impl Profile {
    /// 由 `values` 构造 profile. `values` 为空时返回 `Err(ProfileError::Empty)`.
    pub fn new(values: Vec<f64>) -> ProfileResult<Self> {
        if values.is_empty() {
            return Err(ProfileError::Empty);
        }
        Ok(Self {
            data: Array1::from_vec(values),
        })
    }

    /// 由 ndarray 一维数组构造 profile.
    pub fn from_array(data: Array1<f64>) -> ProfileResult<Self> {
        if data.is_empty() {
            return Err(ProfileError::Empty);
        }
        Ok(Self { data })
    }

    /// 构造长度为 `len`, 所有值均为 `value` 的 profile.
    pub fn filled(len: usize, value: f64) -> ProfileResult<Self> {
        if len == 0 {
            return Err(ProfileError::InvalidLength(len));
        }
        Ok(Self {
            data: Array1::from_elem(len, value),
        })
    }

    /// 内部构造. 调用者保证 `data` 非空.
    #[inline]
    fn from_raw(data: Array1<f64>) -> Self {
        debug_assert!(!data.is_empty());
        Self { data }
    }

    /// 内部构造. 调用者保证 `data` 非空.
    #[inline]
    pub(crate) fn from_raw_vec(data: Vec<f64>) -> Self {
        Self::from_raw(Array1::from_vec(data))
    }

    /// profile 长度.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 获取下标 `i` (对长度取模) 处的值.
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        self.data[i % self.len()]
    }

    /// 获取有符号下标 `i` (对长度取模) 处的值.
    #[inline]
    pub fn get_signed(&self, i: isize) -> f64 {
        self.data[wrap_signed(i, self.len())]
    }

    /// 底层数据视图.
    #[inline]
    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.data.view()
    }

    /// 按下标顺序遍历.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.data.iter()
    }

    /// 复制为 `Vec`.
    #[inline]
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.to_vec()
    }

    /// 取出半开弧 `[start, end)` 上的子 profile (对长度取模).
    ///
    /// `start == end` 时返回从 `start` 开始的整圈.
    pub fn sub_region(&self, start: usize, end: usize) -> Profile {
        let len = arc_length(start, end, self.len());
        Self::from_raw((0..len).map(|i| self.get(start + i)).collect())
    }

    /// 线性插值重采样到 `n` 个点. 第 `i` 个新点位于旧下标 `i * N / n` 处,
    /// 最后一个点与第一个点之间按环形插值.
    ///
    /// `n == 0` 时返回 `Err(ProfileError::InvalidLength(0))`.
    pub fn interpolate(&self, n: usize) -> ProfileResult<Profile> {
        if n == 0 {
            return Err(ProfileError::InvalidLength(n));
        }
        Ok(self.resampled(n))
    }

    /// `interpolate` 的内部实现. 调用者保证 `n > 0`.
    pub(crate) fn resampled(&self, n: usize) -> Profile {
        debug_assert!(n > 0);
        if n == self.len() {
            return self.clone();
        }
        Self::from_raw(self.sample_arc(0, self.len(), n).into())
    }

    /// 在弧 `[start, start + length)` 上等距取 `n` 个插值点.
    /// 第 `i` 个点位于 `start + i * length / n`. 弧末端与弧后一个下标之间线性插值,
    /// 因此相邻弧的采样结果首尾相接.
    pub(crate) fn sample_arc(&self, start: usize, length: usize, n: usize) -> Vec<f64> {
        let step = length as f64 / n as f64;
        (0..n)
            .map(|i| {
                let pos = i as f64 * step;
                let j = pos.floor() as usize;
                let frac = pos - j as f64;
                let a = self.get(start + j);
                let b = self.get(start + j + 1);
                a + (b - a) * frac
            })
            .collect()
    }

    /// 环形偏移. 新 profile 的下标 0 对应当前 profile 的下标 `k`.
    pub fn offset(&self, k: usize) -> Profile {
        let n = self.len();
        Self::from_raw((0..n).map(|i| self.get(i + k)).collect())
    }

    /// 有符号版本的 `offset`.
    #[inline]
    pub fn offset_signed(&self, k: isize) -> Profile {
        self.offset(wrap_signed(k, self.len()))
    }

    /// 逆序.
    pub fn reverse(&self) -> Profile {
        Self::from_raw(self.data.iter().rev().copied().collect())
    }

    #[inline]
    fn check_same_len(&self, other: &Profile) -> ProfileResult<()> {
        if self.len() == other.len() {
            Ok(())
        } else {
            Err(ProfileError::DimensionMismatch {
                expected: self.len(),
                found: other.len(),
            })
        }
    }

    impl_elementwise! {
        /// 逐元素相加. 长度不同时返回 `DimensionMismatch`.
        add => +;
        /// 逐元素相减. 长度不同时返回 `DimensionMismatch`.
        subtract => -;
        /// 逐元素相乘. 长度不同时返回 `DimensionMismatch`.
        multiply => *;
        /// 逐元素相除. 长度不同时返回 `DimensionMismatch`. 除零遵循 IEEE 754.
        divide => /;
    }

    /// 每个元素加上 `value`.
    pub fn add_scalar(&self, value: f64) -> Profile {
        Self::from_raw(&self.data + value)
    }

    /// 每个元素乘以 `value`.
    pub fn multiply_scalar(&self, value: f64) -> Profile {
        Self::from_raw(&self.data * value)
    }

    /// 寻找第一段至少 `min_points` 个连续下标、其值均满足 `|v - value| < tolerance`
    /// 的极大区间, 返回闭区间 `(start, end)`. 不存在时返回 `None`.
    ///
    /// 该搜索不跨越 `N - 1 -> 0` 的接缝.
    pub fn consistent_region_bounds(
        &self,
        value: f64,
        tolerance: f64,
        min_points: usize,
    ) -> Option<(usize, usize)> {
        let min_points = min_points.max(1);
        let mut start = None;
        for (i, v) in self.data.iter().enumerate() {
            if (v - value).abs() < tolerance {
                start.get_or_insert(i);
            } else if let Some(s) = start.take() {
                if i - s >= min_points {
                    return Some((s, i - 1));
                }
            }
        }
        let n = self.len();
        start.filter(|s| n - s >= min_points).map(|s| (s, n - 1))
    }

    /// 环形滑动平均. 每个点取 `[i - window, i + window]` 的均值.
    pub fn smooth(&self, window: usize) -> Profile {
        if window == 0 {
            return self.clone();
        }
        let w = window as isize;
        let count = (2 * window + 1) as f64;
        Self::from_raw(
            (0..self.len() as isize)
                .map(|i| (-w..=w).map(|d| self.get_signed(i + d)).sum::<f64>() / count)
                .collect(),
        )
    }

    /// 环形中心差分: `v[i + window] - v[i - window]`.
    pub fn deltas(&self, window: usize) -> Profile {
        let w = window.max(1) as isize;
        Self::from_raw(
            (0..self.len() as isize)
                .map(|i| self.get_signed(i + w) - self.get_signed(i - w))
                .collect(),
        )
    }

    /// 判断 `i` 是否是窗口 `[i - window, i + window]` 内的极值.
    ///
    /// `better(a, b)` 为真表示 `a` 比 `b` 更 "极端". 窗口内位于 `i` 之前的点必须严格劣于 `i`,
    /// 之后的点不得优于 `i`, 因此平台区域只取其第一个点, 全常数区域不产生极值.
    fn is_window_extremum<F: Fn(f64, f64) -> bool>(&self, i: usize, window: usize, better: F) -> bool {
        let v = self.get(i);
        let i = i as isize;
        let w = window.max(1) as isize;
        (1..=w).all(|d| better(v, self.get_signed(i - d)))
            && (1..=w).all(|d| !better(self.get_signed(i + d), v))
    }

    /// 局部极小值掩码.
    pub fn local_minima(&self, window: usize) -> BooleanMask {
        (0..self.len())
            .map(|i| self.is_window_extremum(i, window, |a, b| a < b))
            .collect()
    }

    /// 局部极大值掩码.
    pub fn local_maxima(&self, window: usize) -> BooleanMask {
        (0..self.len())
            .map(|i| self.is_window_extremum(i, window, |a, b| a > b))
            .collect()
    }

    /// 值小于 `threshold` 的局部极小值掩码.
    pub fn local_minima_below(&self, window: usize, threshold: f64) -> BooleanMask {
        let below: BooleanMask = self.iter().map(|v| *v < threshold).collect();
        self.local_minima(window).and(&below)
    }

    /// 值大于 `threshold` 的局部极大值掩码.
    pub fn local_maxima_above(&self, window: usize, threshold: f64) -> BooleanMask {
        let above: BooleanMask = self.iter().map(|v| *v > threshold).collect();
        self.local_maxima(window).and(&above)
    }

    /// 在 `limits` 为真的下标中寻找第一个最小值的下标. `limits` 全假时返回 `None`.
    pub fn index_of_min(&self, limits: Option<&BooleanMask>) -> Option<usize> {
        self.limited(limits)
            .min_by_key(|(_, v)| OrderedFloat(*v))
            .map(|(i, _)| i)
    }

    /// 在 `limits` 为真的下标中寻找第一个最大值的下标. `limits` 全假时返回 `None`.
    pub fn index_of_max(&self, limits: Option<&BooleanMask>) -> Option<usize> {
        self.limited(limits)
            .min_by_key(|(_, v)| Reverse(OrderedFloat(*v)))
            .map(|(i, _)| i)
    }

    fn limited<'a>(
        &'a self,
        limits: Option<&'a BooleanMask>,
    ) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.data
            .iter()
            .copied()
            .enumerate()
            .filter(move |(i, _)| limits.map_or(true, |m| m.get(*i)))
    }

    /// 最小值.
    #[inline]
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// 最大值.
    #[inline]
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// 值域跨度 `max - min`.
    #[inline]
    pub fn range(&self) -> f64 {
        self.max() - self.min()
    }

    /// 平均值.
    #[inline]
    pub fn mean(&self) -> f64 {
        self.data.sum() / self.len() as f64
    }

    /// 与 `other` 的差的平方和. 长度不同时, 较短者先插值到较长者的长度.
    pub fn square_difference(&self, other: &Profile) -> f64 {
        let n = self.len().max(other.len());
        let a = self.resampled(n);
        let b = other.resampled(n);
        a.data
            .iter()
            .zip(b.data.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum()
    }

    /// 寻找偏移 `k`, 使 `other.offset(k)` 与当前 profile 的平方差最小.
    ///
    /// `other` 先插值到当前长度. `window` 为 `Some(w)` 时只搜索 `[-w, w]` 内的偏移.
    /// 返回值落在 `[0, N)` 中. 多个偏移并列最优时, 取绝对值最小者 (正偏移优先).
    pub fn best_fit_offset(&self, other: &Profile, window: Option<usize>) -> usize {
        let n = self.len();
        let other = other.resampled(n);
        let w = window.unwrap_or(n / 2).min(n / 2) as isize;
        std::iter::once(0)
            .chain((1..=w).flat_map(|d| [d, -d]))
            .map(|k| wrap_signed(k, n))
            .unique()
            .map(|k| {
                let score: f64 = (0..n).map(|i| (self.get(i) - other.get(i + k)).powi(2)).sum();
                (k, score)
            })
            .min_by_key(|(_, score)| OrderedFloat(*score))
            .map_or(0, |(k, _)| k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    fn p(values: &[f64]) -> Profile {
        Profile::new(values.to_vec()).unwrap()
    }

    /// 空 profile 无法构造.
    #[test]
    fn test_profile_new_empty() {
        assert_eq!(Profile::new(vec![]), Err(ProfileError::Empty));
        assert_eq!(Profile::filled(0, 1.0), Err(ProfileError::InvalidLength(0)));
    }

    /// 环形下标与跨接缝子区域.
    #[test]
    fn test_profile_wrap_and_sub_region() {
        let a = p(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(a.get(7), 2.0);
        assert_eq!(a.get_signed(-1), 4.0);
        assert_eq!(a.sub_region(1, 3).to_vec(), vec![1.0, 2.0]);
        assert_eq!(a.sub_region(3, 1).to_vec(), vec![3.0, 4.0, 0.0]);
        assert_eq!(a.sub_region(2, 2).to_vec(), vec![2.0, 3.0, 4.0, 0.0, 1.0]);
    }

    /// 插值保持长度语义, 同长度插值不变.
    #[test]
    fn test_profile_interpolate() {
        let a = p(&[0.0, 2.0, 4.0, 2.0]);
        assert_eq!(a.interpolate(4).unwrap(), a);
        let b = a.interpolate(8).unwrap();
        assert_eq!(b.len(), 8);
        let expected = [0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0];
        assert!(b.iter().zip(expected).all(|(x, y)| f64_eq(*x, y)));
        assert!(a.interpolate(0).is_err());

        let single = p(&[3.0]);
        assert_eq!(single.interpolate(3).unwrap().to_vec(), vec![3.0; 3]);
    }

    /// 偏移与逆序.
    #[test]
    fn test_profile_offset_reverse() {
        let a = p(&[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(a.offset(1).to_vec(), vec![1.0, 2.0, 3.0, 0.0]);
        assert_eq!(a.offset_signed(-1).to_vec(), vec![3.0, 0.0, 1.0, 2.0]);
        assert_eq!(a.offset(4), a);
        assert_eq!(a.reverse().to_vec(), vec![3.0, 2.0, 1.0, 0.0]);
    }

    /// 逐元素运算在长度不同时失败.
    #[test]
    fn test_profile_arithmetic() {
        let a = p(&[1.0, 2.0, 3.0]);
        let b = p(&[2.0, 2.0, 2.0]);
        assert_eq!(a.add(&b).unwrap().to_vec(), vec![3.0, 4.0, 5.0]);
        assert_eq!(a.subtract(&b).unwrap().to_vec(), vec![-1.0, 0.0, 1.0]);
        assert_eq!(a.multiply(&b).unwrap().to_vec(), vec![2.0, 4.0, 6.0]);
        assert_eq!(a.divide(&b).unwrap().to_vec(), vec![0.5, 1.0, 1.5]);
        let c = p(&[1.0, 2.0]);
        assert_eq!(
            a.add(&c),
            Err(ProfileError::DimensionMismatch {
                expected: 3,
                found: 2
            })
        );
    }

    /// 一致区间检测.
    #[test]
    fn test_consistent_region_bounds() {
        let a = p(&[1., 2., 3., 4., 5., 5., 5., 5., 5., 6., 7., 8., 9.]);
        assert_eq!(a.consistent_region_bounds(5.0, 0.1, 5), Some((4, 8)));

        let b = p(&[1., 2., 3., 4., 5., 5., 5., 5., 6., 7., 8., 9.]);
        assert_eq!(b.consistent_region_bounds(5.0, 0.1, 5), None);
        // 容差带同时容纳 5 与 6 时, 区间延伸到下标 8.
        assert_eq!(b.consistent_region_bounds(5.5, 0.6, 5), Some((4, 8)));

        // 延伸到末尾的区间同样计入.
        let c = p(&[0., 1., 1., 1.]);
        assert_eq!(c.consistent_region_bounds(1.0, 0.1, 3), Some((1, 3)));
    }

    /// 常数 profile 没有局部极值, 平台只计第一个点.
    #[test]
    fn test_local_extrema() {
        let flat = p(&[1.0; 12]);
        assert_eq!(flat.local_minima(3).count(), 0);
        assert_eq!(flat.local_maxima(3).count(), 0);

        let a = p(&[5., 4., 3., 2., 1., 1., 2., 3., 4., 5., 6., 5.]);
        let minima = a.local_minima(2);
        assert_eq!(minima.true_indexes(), vec![4]);
        let maxima = a.local_maxima(2);
        assert_eq!(maxima.true_indexes(), vec![10]);
        assert_eq!(a.local_maxima_above(2, 10.0).count(), 0);
    }

    /// 最值下标取第一个出现者, 并受限于掩码.
    #[test]
    fn test_index_of_min_max() {
        let a = p(&[3.0, 1.0, 5.0, 1.0, 5.0]);
        assert_eq!(a.index_of_min(None), Some(1));
        assert_eq!(a.index_of_max(None), Some(2));
        let limits: BooleanMask = [false, false, true, true, true].into_iter().collect();
        assert_eq!(a.index_of_min(Some(&limits)), Some(3));
        let none = BooleanMask::new(5, false);
        assert_eq!(a.index_of_max(Some(&none)), None);
    }

    /// 平滑与差分.
    #[test]
    fn test_smooth_deltas() {
        let a = p(&[0.0, 3.0, 0.0, 3.0]);
        let s = a.smooth(1);
        assert!(s.iter().zip([2.0, 1.0, 2.0, 1.0]).all(|(x, y)| f64_eq(*x, y)));
        let d = p(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).deltas(1);
        assert_eq!(d.get(2), 2.0);
        assert_eq!(d.get(0), 1.0 - 5.0);
    }

    /// 最优偏移能恢复旋转量.
    #[test]
    fn test_best_fit_offset() {
        let a = p(&[0., 1., 4., 9., 4., 1., 0., 0.]);
        let rotated = a.offset(3);
        // rotated.offset(k) == a  =>  k == 8 - 3
        assert_eq!(a.best_fit_offset(&rotated, None), 5);
        assert_eq!(a.best_fit_offset(&a, None), 0);
        assert!(f64_eq(a.square_difference(&rotated.offset(5)), 0.0));
    }

    /// 反序列化经过构造校验, 空 profile 被拒绝.
    #[cfg(feature = "serde")]
    #[test]
    fn test_profile_deserialize_checked() {
        let a = p(&[1.0, 2.0, 3.0]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(serde_json::from_str::<Profile>(&json).unwrap(), a);

        let empty = r#"{"data":{"v":1,"dim":[0],"data":[]}}"#;
        assert!(serde_json::from_str::<Profile>(empty).is_err());
    }
}
