//! 用规则集在 profile 上定位标志点下标.

use super::error::{RuleError, RuleResult};
use super::rule::{Rule, RuleSet};
use crate::data::{BooleanMask, Profile, ProfileType};

/// 标志点下标查找器. 无状态, 所有操作都是关联函数.
pub struct ProfileIndexFinder;

impl ProfileIndexFinder {
    /// 单条规则在整个 profile 上的匹配掩码.
    #[inline]
    pub fn matching_indexes(profile: &Profile, rule: &Rule) -> BooleanMask {
        rule.apply(profile, &BooleanMask::new(profile.len(), true))
    }

    /// 规则集的匹配掩码: 依次执行每条规则, 每条规则只在前面规则留下的下标中求值.
    pub fn matching_indexes_for_set(profile: &Profile, rule_set: &RuleSet) -> BooleanMask {
        rule_set
            .rules()
            .iter()
            .fold(BooleanMask::new(profile.len(), true), |limits, rule| {
                rule.apply(profile, &limits)
            })
    }

    /// 把所有规则集都作用在同一个 `profile` 上 (忽略规则集声明的 profile 种类),
    /// 对结果求与并解析出唯一下标.
    ///
    /// # 错误
    ///
    /// - `rule_sets` 为空: `RuleError::EmptyRuleSets`;
    /// - 没有下标满足: `RuleError::NoMatch`;
    /// - 多于一个下标满足: `RuleError::AmbiguousMatch`.
    pub fn identify_index(profile: &Profile, rule_sets: &[RuleSet]) -> RuleResult<usize> {
        Self::identify_index_in(|_| Some(profile), rule_sets)
    }

    /// 每个规则集作用在 `lookup` 给出的对应种类的 profile 上, 对结果求与并解析出唯一下标.
    ///
    /// 同一实例的各种 profile 长度相同.
    pub fn identify_index_in<'a, F>(lookup: F, rule_sets: &[RuleSet]) -> RuleResult<usize>
    where
        F: Fn(ProfileType) -> Option<&'a Profile>,
    {
        let mut combined: Option<BooleanMask> = None;
        for rs in rule_sets {
            let profile = lookup(rs.profile_type()).ok_or(RuleError::MissingProfile(rs.profile_type()))?;
            let mask = Self::matching_indexes_for_set(profile, rs);
            combined = Some(match combined {
                Some(acc) if acc.len() == mask.len() => acc.and(&mask),
                Some(_) => return Err(RuleError::NoMatch),
                None => mask,
            });
        }
        let mask = combined.ok_or(RuleError::EmptyRuleSets)?;
        match (mask.count(), mask.first_true()) {
            (1, Some(i)) => Ok(i),
            (0, _) | (_, None) => Err(RuleError::NoMatch),
            (count, Some(first)) => Err(RuleError::AmbiguousMatch { count, first }),
        }
    }
}
