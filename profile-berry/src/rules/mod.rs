//! 声明式标志点规则.
//!
//! 规则描述 "如何在任意 profile 上算出某个标志点的下标", 而不是存储一个固定下标.
//! 同一份定义因此可以作用于长度与形状各异的实例.

mod error;
mod finder;
mod rule;

pub use error::{RuleError, RuleResult};
pub use finder::ProfileIndexFinder;
pub use rule::{Rule, RuleSet, RuleSetCollection};
