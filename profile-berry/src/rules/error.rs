//! 标志点规则解析错误.

use crate::data::ProfileType;
use std::fmt;

/// 规则集无法解析出唯一下标.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RuleError {
    /// 没有任何下标满足全部规则.
    NoMatch,

    /// 多于一个下标满足全部规则, 且规则中没有决胜规则.
    AmbiguousMatch {
        /// 满足规则的下标个数.
        count: usize,
        /// 第一个满足规则的下标.
        first: usize,
    },

    /// 没有提供任何规则集.
    EmptyRuleSets,

    /// 规则集要求的 profile 种类不存在.
    MissingProfile(ProfileType),
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => write!(f, "no index satisfies the rule sets"),
            Self::AmbiguousMatch { count, first } => write!(
                f,
                "{count} indexes satisfy the rule sets (first at {first})"
            ),
            Self::EmptyRuleSets => write!(f, "no rule sets given"),
            Self::MissingProfile(t) => write!(f, "no {t} profile to apply rules to"),
        }
    }
}

impl std::error::Error for RuleError {}

/// 规则解析结果.
pub type RuleResult<T> = Result<T, RuleError>;
