//! 分段: profile 环形下标空间上的具名连续弧.

use super::error::{SegmentError, SegmentResult};
use super::{arc_contains, arc_length};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 分段的稳定标识.
///
/// 标识在模板 profile 上创建一次, 之后通过拟合原样传递给每个实例, 从不按实例重新生成.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentId(u32);

impl SegmentId {
    /// 唯一全圆默认分段的标识.
    pub const DEFAULT: SegmentId = SegmentId(0);

    /// 由原始值构造.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// 原始值.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// 模板上第 `i` 个 (从 0 开始) 分段的标识. 与 `DEFAULT` 不冲突.
    #[inline]
    pub const fn nth(i: usize) -> Self {
        Self(i as u32 + 1)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 半开弧 `[start, end)` (对 `total` 取模) 上的分段.
///
/// `start == end` 表示整圈, 仅当它是唯一分段时合法.
/// 分段只由一个 `SegmentedProfile` 独占, 克隆时整体复制.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawSegment"))]
pub struct Segment {
    id: SegmentId,
    start: usize,
    end: usize,
    total: usize,
    name: String,
    locked: bool,
}

/// 反序列化的中间形式, 经 `Segment::new` 校验.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawSegment {
    id: SegmentId,
    start: usize,
    end: usize,
    total: usize,
    name: String,
    locked: bool,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSegment> for Segment {
    type Error = SegmentError;

    fn try_from(raw: RawSegment) -> SegmentResult<Self> {
        let mut s = Self::new(raw.id, raw.start, raw.end, raw.total)?.with_name(raw.name);
        s.locked = raw.locked;
        Ok(s)
    }
}

impl Segment {
    /// 构造分段. `start` 或 `end` 不小于 `total` 时返回 `Err(SegmentError::OutOfRange)`.
    pub fn new(id: SegmentId, start: usize, end: usize, total: usize) -> SegmentResult<Self> {
        if start >= total || end >= total {
            return Err(SegmentError::OutOfRange(id));
        }
        Ok(Self {
            id,
            start,
            end,
            total,
            name: format!("Seg_{}", id.raw()),
            locked: false,
        })
    }

    /// 构造覆盖整个长度为 `total` 的圆的默认分段, 起止于 `0`.
    #[inline]
    pub fn full_circle(id: SegmentId, total: usize) -> Self {
        Self {
            id,
            start: 0,
            end: 0,
            total,
            name: format!("Seg_{}", id.raw()),
            locked: false,
        }
    }

    /// 设置名字.
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// 分段标识.
    #[inline]
    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// 起始下标 (含).
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// 终止下标 (不含).
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// 所在圆的总长.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// 名字.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 是否被锁定. 锁定的分段不会被 `update` 或拟合移动.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[inline]
    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// 弧长 (对 `total` 取模). 整圈分段的长度为 `total`.
    #[inline]
    pub fn length(&self) -> usize {
        arc_length(self.start, self.end, self.total)
    }

    /// 是否是整圈分段.
    #[inline]
    pub fn is_full_circle(&self) -> bool {
        self.start == self.end
    }

    /// 是否跨越 `total - 1 -> 0` 的接缝.
    #[inline]
    pub fn wraps(&self) -> bool {
        self.end <= self.start
    }

    /// 下标 `i` 是否落在弧内.
    #[inline]
    pub fn contains(&self, i: usize) -> bool {
        arc_contains(self.start, self.end, self.total, i)
    }

    /// 弧中点.
    #[inline]
    pub fn midpoint(&self) -> usize {
        (self.start + self.length() / 2) % self.total
    }

    /// 分段长度占整圈的比例.
    #[inline]
    pub fn proportion(&self) -> f64 {
        self.length() as f64 / self.total as f64
    }

    /// 移动起止点. 调用者负责之后的整体校验.
    #[inline]
    pub(crate) fn set_bounds(&mut self, start: usize, end: usize) {
        self.start = start % self.total;
        self.end = end % self.total;
    }

    /// 将所在圆换成长度为 `total` 的圆并设置起止点.
    #[inline]
    pub(crate) fn rebase(&self, start: usize, end: usize, total: usize) -> Self {
        Self {
            start: start % total,
            end: end % total,
            total,
            ..self.clone()
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}, {}) of {}",
            self.name, self.id, self.start, self.end, self.total
        )
    }
}

/// 在保持锚点 `offsets[0]` 不动的前提下, 调整升序的环形偏移量使相邻间隔均不小于 `min`.
///
/// `offsets` 是相对第一个断点的偏移, 严格升序且都小于 `total`.
/// 当 `total < offsets.len() * min` 时无解, 返回 `false` 且不修改.
pub(crate) fn enforce_min_gaps(offsets: &mut [usize], total: usize, min: usize) -> bool {
    let k = offsets.len();
    if k == 0 || total < k * min {
        return false;
    }
    for i in 1..k {
        offsets[i] = offsets[i].max(offsets[i - 1] + min);
    }
    if k > 1 {
        offsets[k - 1] = offsets[k - 1].min(total - min);
        for i in (1..k - 1).rev() {
            offsets[i] = offsets[i].min(offsets[i + 1] - min);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 长度与包含关系, 包括跨接缝弧.
    #[test]
    fn test_segment_arc() {
        let s = Segment::new(SegmentId::nth(0), 8, 2, 10).unwrap();
        assert_eq!(s.length(), 4);
        assert!(s.wraps());
        assert!(s.contains(9) && s.contains(0) && s.contains(1));
        assert!(!s.contains(2) && !s.contains(7));
        assert_eq!(s.midpoint(), 0);

        let full = Segment::full_circle(SegmentId::DEFAULT, 10);
        assert!(full.is_full_circle());
        assert_eq!(full.length(), 10);
        assert!((0..10).all(|i| full.contains(i)));

        assert_eq!(
            Segment::new(SegmentId::nth(1), 10, 2, 10),
            Err(SegmentError::OutOfRange(SegmentId::nth(1)))
        );
    }

    /// 间隔修复保持锚点并满足最短间隔.
    #[test]
    fn test_enforce_min_gaps() {
        let mut o = [0, 3, 4, 95];
        assert!(enforce_min_gaps(&mut o, 100, 10));
        assert_eq!(o[0], 0);
        let gaps: Vec<usize> = o
            .windows(2)
            .map(|w| w[1] - w[0])
            .chain(std::iter::once(100 - o[3]))
            .collect();
        assert!(gaps.iter().all(|g| *g >= 10), "{gaps:?}");

        let mut tight = [0, 1, 2];
        assert!(!enforce_min_gaps(&mut tight, 20, 10));
        assert_eq!(tight, [0, 1, 2]);
    }

    /// 反序列化经过构造校验, 越界分段被拒绝.
    #[cfg(feature = "serde")]
    #[test]
    fn test_segment_deserialize_checked() {
        let s = Segment::new(SegmentId::nth(0), 8, 2, 10)
            .unwrap()
            .with_name("tail");
        let mut value = serde_json::to_value(&s).unwrap();
        assert_eq!(serde_json::from_value::<Segment>(value.clone()).unwrap(), s);

        value["start"] = serde_json::json!(12);
        assert!(serde_json::from_value::<Segment>(value).is_err());
    }
}
