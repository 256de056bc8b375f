//! 规则与规则集.

use crate::data::{BooleanMask, Landmark, Profile, ProfileType};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 作用于 profile 的单条谓词.
///
/// 规则在规则集中依次执行, 每条规则收到此前所有规则留下的掩码 (`limits`).
/// 最值与决胜规则只在 `limits` 允许的下标中挑选, 其余规则的结果再与 `limits` 求与.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rule {
    /// 下标 0.
    IsZeroIndex,

    /// `limits` 内的第一个全局最小值.
    IsMinimum,

    /// `limits` 内的第一个全局最大值.
    IsMaximum,

    /// 窗口半径 `window` 内的局部最小值.
    IsLocalMinimum {
        /// 窗口半径.
        window: usize,
    },

    /// 窗口半径 `window` 内的局部最大值.
    IsLocalMaximum {
        /// 窗口半径.
        window: usize,
    },

    /// 值小于给定值.
    ValueLessThan(f64),

    /// 值大于给定值.
    ValueMoreThan(f64),

    /// 下标小于 `ceil(N * fraction)`.
    IndexLessThan(f64),

    /// 下标大于 `floor(N * fraction)`.
    IndexMoreThan(f64),

    /// 位于第一段一致区间内, 见 `Profile::consistent_region_bounds`.
    IsConstantRegion {
        /// 中心值.
        value: f64,
        /// 容差.
        tolerance: f64,
        /// 最少连续点数.
        min_points: usize,
    },

    /// 决胜规则: 只保留 `limits` 中的第一个下标.
    FirstTrue,

    /// 决胜规则: 只保留 `limits` 中的最后一个下标.
    LastTrue,

    /// 与下标 0 的环形距离不超过 `N * fraction`.
    IndexWithinFractionOf(f64),

    /// 与下标 0 的环形距离超过 `N * fraction`.
    IndexOutsideFractionOf(f64),

    /// 取反 `limits`. 结果不与 `limits` 求与.
    Invert,
}

impl Rule {
    /// 在 `limits` 的约束下对 `profile` 求值, 返回新的掩码.
    ///
    /// `limits` 的长度必须与 `profile` 相同.
    pub fn apply(&self, profile: &Profile, limits: &BooleanMask) -> BooleanMask {
        let n = profile.len();
        debug_assert_eq!(n, limits.len());
        let by_index = |f: &dyn Fn(usize) -> bool| -> BooleanMask { (0..n).map(f).collect() };
        let by_value = |f: &dyn Fn(f64) -> bool| -> BooleanMask { profile.iter().map(|v| f(*v)).collect() };
        let mask = match self {
            Self::IsZeroIndex => by_index(&|i| i == 0),
            Self::IsMinimum => return limits.only(profile.index_of_min(Some(limits))),
            Self::IsMaximum => return limits.only(profile.index_of_max(Some(limits))),
            Self::IsLocalMinimum { window } => profile.local_minima(*window),
            Self::IsLocalMaximum { window } => profile.local_maxima(*window),
            Self::ValueLessThan(v) => by_value(&|x| x < *v),
            Self::ValueMoreThan(v) => by_value(&|x| x > *v),
            Self::IndexLessThan(f) => {
                let bound = (n as f64 * f).ceil();
                by_index(&|i| (i as f64) < bound)
            }
            Self::IndexMoreThan(f) => {
                let bound = (n as f64 * f).floor();
                by_index(&|i| (i as f64) > bound)
            }
            Self::IsConstantRegion {
                value,
                tolerance,
                min_points,
            } => match profile.consistent_region_bounds(*value, *tolerance, *min_points) {
                Some((s, e)) => by_index(&|i| (s..=e).contains(&i)),
                None => BooleanMask::new(n, false),
            },
            Self::FirstTrue => return limits.only(limits.first_true()),
            Self::LastTrue => return limits.only(limits.last_true()),
            Self::IndexWithinFractionOf(f) => {
                let bound = n as f64 * f;
                by_index(&|i| (i.min(n - i) as f64) <= bound)
            }
            Self::IndexOutsideFractionOf(f) => {
                let bound = n as f64 * f;
                by_index(&|i| (i.min(n - i) as f64) > bound)
            }
            Self::Invert => return limits.invert(),
        };
        mask.and(limits)
    }

    /// 是否是决胜规则 (结果至多一个下标).
    #[inline]
    pub fn is_tie_break(&self) -> bool {
        matches!(
            self,
            Self::FirstTrue | Self::LastTrue | Self::IsMinimum | Self::IsMaximum
        )
    }
}

/// 作用于某一 profile 种类的一组规则, 其掩码是各条规则的逻辑与.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleSet {
    profile_type: ProfileType,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// 构造空规则集. 空规则集接受所有下标.
    #[inline]
    pub fn new(profile_type: ProfileType) -> Self {
        Self {
            profile_type,
            rules: Vec::new(),
        }
    }

    /// 追加一条规则.
    #[inline]
    pub fn with(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// 规则作用的 profile 种类.
    #[inline]
    pub fn profile_type(&self) -> ProfileType {
        self.profile_type
    }

    /// 规则列表.
    #[inline]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// 标志点到规则集列表的映射. 同一标志点的多个规则集结果求与.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleSetCollection {
    rules: BTreeMap<Landmark, Vec<RuleSet>>,
}

/// 圆形细胞核的默认规则.
///
/// 参考点取角度 profile 的全局最小值 (最尖锐处);
/// 朝向点取参考点对侧半圈内的角度最小值.
static ROUND_RULES: Lazy<RuleSetCollection> = Lazy::new(|| {
    let mut c = RuleSetCollection::new();
    c.insert(
        Landmark::ReferencePoint,
        vec![RuleSet::new(ProfileType::Angle).with(Rule::IsMinimum)],
    );
    c.insert(
        Landmark::OrientationPoint,
        vec![RuleSet::new(ProfileType::Angle)
            .with(Rule::IndexMoreThan(0.25))
            .with(Rule::IndexLessThan(0.75))
            .with(Rule::IsMinimum)],
    );
    c
});

impl RuleSetCollection {
    /// 空集合.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 圆形细胞核的默认规则集合.
    #[inline]
    pub fn round() -> Self {
        ROUND_RULES.clone()
    }

    /// 设置 `landmark` 的规则集, 覆盖已有定义.
    #[inline]
    pub fn insert(&mut self, landmark: Landmark, rule_sets: Vec<RuleSet>) {
        self.rules.insert(landmark, rule_sets);
    }

    /// 移除 `landmark` 的规则集.
    #[inline]
    pub fn remove(&mut self, landmark: &Landmark) -> Option<Vec<RuleSet>> {
        self.rules.remove(landmark)
    }

    /// 获取 `landmark` 的规则集.
    #[inline]
    pub fn get(&self, landmark: &Landmark) -> Option<&[RuleSet]> {
        self.rules.get(landmark).map(Vec::as_slice)
    }

    /// 所有定义了规则的标志点, 参考点 (若有) 排在最前.
    pub fn landmarks(&self) -> impl Iterator<Item = &Landmark> + '_ {
        self.rules.keys()
    }

    /// 是否没有任何规则.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(values: &[f64]) -> Profile {
        Profile::new(values.to_vec()).unwrap()
    }

    fn all(n: usize) -> BooleanMask {
        BooleanMask::new(n, true)
    }

    /// 下标规则按长度比例求值.
    #[test]
    fn test_rule_index_fraction() {
        let a = p(&[0.0; 10]);
        let less = Rule::IndexLessThan(0.25).apply(&a, &all(10));
        assert_eq!(less.true_indexes(), vec![0, 1, 2]);
        let more = Rule::IndexMoreThan(0.75).apply(&a, &all(10));
        assert_eq!(more.true_indexes(), vec![8, 9]);
        let within = Rule::IndexWithinFractionOf(0.2).apply(&a, &all(10));
        assert_eq!(within.true_indexes(), vec![0, 1, 2, 8, 9]);
        let outside = Rule::IndexOutsideFractionOf(0.2).apply(&a, &all(10));
        assert_eq!(outside.true_indexes(), vec![3, 4, 5, 6, 7]);
    }

    /// 最值规则只在 limits 中挑选.
    #[test]
    fn test_rule_extremum_within_limits() {
        let a = p(&[0.0, 5.0, 1.0, 9.0, 2.0]);
        let limits = BooleanMask::from_vec(vec![false, true, true, false, true]);
        assert_eq!(Rule::IsMinimum.apply(&a, &limits).true_indexes(), vec![2]);
        assert_eq!(Rule::IsMaximum.apply(&a, &limits).true_indexes(), vec![1]);
        let none = BooleanMask::new(5, false);
        assert_eq!(Rule::IsMinimum.apply(&a, &none).count(), 0);
    }

    /// 值规则, 一致区间, 决胜与取反.
    #[test]
    fn test_rule_value_and_tie_break() {
        let a = p(&[1., 2., 3., 4., 5., 5., 5., 5., 5., 6., 7., 8., 9.]);
        let n = a.len();
        let lt = Rule::ValueLessThan(3.0).apply(&a, &all(n));
        assert_eq!(lt.true_indexes(), vec![0, 1]);
        let flat = Rule::IsConstantRegion {
            value: 5.0,
            tolerance: 0.1,
            min_points: 5,
        }
        .apply(&a, &all(n));
        assert_eq!(flat.true_indexes(), vec![4, 5, 6, 7, 8]);
        assert_eq!(Rule::FirstTrue.apply(&a, &flat).true_indexes(), vec![4]);
        assert_eq!(Rule::LastTrue.apply(&a, &flat).true_indexes(), vec![8]);
        assert_eq!(Rule::Invert.apply(&a, &flat).count(), n - 5);
        assert_eq!(Rule::IsZeroIndex.apply(&a, &flat).count(), 0);
    }

    /// 默认规则集合至少定义了参考点.
    #[test]
    fn test_round_rules() {
        let c = RuleSetCollection::round();
        assert!(c.get(&Landmark::ReferencePoint).is_some());
        assert_eq!(c.landmarks().next(), Some(&Landmark::ReferencePoint));
    }
}
