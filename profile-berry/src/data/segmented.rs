//! 带分段的 profile.

use super::error::{SegmentError, SegmentResult};
use super::segment::{enforce_min_gaps, Segment, SegmentId};
use super::{arc_length, Profile};
use crate::consts::MINIMUM_SEGMENT_LENGTH;
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// profile 加上一组有序分段.
///
/// # 不变量
///
/// 1. 分段恰好且唯一地覆盖整个圆: 首尾相接, 无空隙, 无重叠;
/// 2. 分段按规范顺序存放: 第一个分段包含下标 0, 之后依次首尾相接;
/// 3. 分段 id 互不相同;
/// 4. 分段数多于 1 时, 每个分段长度不小于 `min_length`.
///
/// 所有修改操作要么完整成功, 要么不改变任何状态.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawSegmentedProfile"))]
pub struct SegmentedProfile {
    profile: Profile,
    segments: Vec<Segment>,
    min_length: usize,
    #[cfg_attr(feature = "serde", serde(skip))]
    last_fail_reason: Option<String>,
}

/// 反序列化的中间形式, 经 `SegmentedProfile::with_min_length` 校验.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawSegmentedProfile {
    profile: Profile,
    segments: Vec<Segment>,
    min_length: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSegmentedProfile> for SegmentedProfile {
    type Error = SegmentError;

    fn try_from(raw: RawSegmentedProfile) -> SegmentResult<Self> {
        Self::with_min_length(raw.profile, raw.segments, raw.min_length)
    }
}

impl PartialEq for SegmentedProfile {
    fn eq(&self, other: &Self) -> bool {
        self.profile == other.profile && self.segments == other.segments
    }
}

/// 校验并按规范顺序重排分段.
pub(crate) fn canonicalize(
    mut segments: Vec<Segment>,
    total: usize,
    min_length: usize,
) -> SegmentResult<Vec<Segment>> {
    if segments.is_empty() {
        return Err(SegmentError::NoSegments);
    }
    let mut seen = HashSet::with_capacity(segments.len());
    for s in segments.iter() {
        if s.total() != total {
            return Err(SegmentError::LengthMismatch {
                id: s.id(),
                total: s.total(),
                profile: total,
            });
        }
        if s.start() >= total || s.end() >= total {
            return Err(SegmentError::OutOfRange(s.id()));
        }
        if !seen.insert(s.id()) {
            return Err(SegmentError::DuplicateId(s.id()));
        }
    }

    if let [single] = segments.as_slice() {
        return if single.is_full_circle() {
            Ok(segments)
        } else {
            Err(SegmentError::NotContiguous(single.id()))
        };
    }
    if let Some(full) = segments.iter().find(|s| s.is_full_circle()) {
        return Err(SegmentError::FullCircleNotAlone(full.id()));
    }

    segments.sort_by_key(|s| s.start());
    let k = segments.len();
    for i in 0..k {
        let next = &segments[(i + 1) % k];
        if segments[i].end() != next.start() {
            return Err(SegmentError::NotContiguous(next.id()));
        }
    }
    // 首尾相接但绕了不止一圈.
    if segments.iter().map(Segment::length).sum::<usize>() != total {
        return Err(SegmentError::NotContiguous(segments[0].id()));
    }
    if let Some(s) = segments.iter().find(|s| s.length() < min_length) {
        return Err(SegmentError::TooShort {
            id: s.id(),
            length: s.length(),
            min: min_length,
        });
    }
    // 按起点升序后, 包含下标 0 的分段要么是第一个, 要么是跨接缝的最后一个.
    if segments[0].start() != 0 {
        segments.rotate_right(1);
    }
    Ok(segments)
}

impl SegmentedProfile {
    /// 以默认最短分段长度构造. 分段集合非法时返回 `SegmentError`.
    pub fn new(profile: Profile, segments: Vec<Segment>) -> SegmentResult<Self> {
        Self::with_min_length(profile, segments, MINIMUM_SEGMENT_LENGTH)
    }

    /// 以指定最短分段长度构造.
    pub fn with_min_length(
        profile: Profile,
        segments: Vec<Segment>,
        min_length: usize,
    ) -> SegmentResult<Self> {
        let segments = canonicalize(segments, profile.len(), min_length)?;
        Ok(Self {
            profile,
            segments,
            min_length,
            last_fail_reason: None,
        })
    }

    /// 构造只有一个全圆默认分段的 profile.
    pub fn unsegmented(profile: Profile) -> Self {
        let total = profile.len();
        Self {
            profile,
            segments: vec![Segment::full_circle(SegmentId::DEFAULT, total)],
            min_length: MINIMUM_SEGMENT_LENGTH,
            last_fail_reason: None,
        }
    }

    /// 构造只有一个全圆分段 `id` 的 profile, 分段名为 `name`.
    pub fn single(profile: Profile, id: SegmentId, name: &str) -> Self {
        let total = profile.len();
        Self {
            profile,
            segments: vec![Segment::full_circle(id, total).with_name(name)],
            min_length: MINIMUM_SEGMENT_LENGTH,
            last_fail_reason: None,
        }
    }

    /// 底层 profile.
    #[inline]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// 取出底层 profile.
    #[inline]
    pub fn into_profile(self) -> Profile {
        self.profile
    }

    /// profile 长度.
    #[inline]
    pub fn len(&self) -> usize {
        self.profile.len()
    }

    /// 总是 `false`: profile 至少有一个点.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// 最短分段长度.
    #[inline]
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// 按规范顺序排列的分段 (第一个包含下标 0).
    #[inline]
    pub fn ordered_segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 分段个数.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// 按规范顺序排列的分段 id.
    pub fn segment_ids(&self) -> Vec<SegmentId> {
        self.segments.iter().map(Segment::id).collect()
    }

    /// 是否只有一个分段.
    #[inline]
    pub fn is_single_segment(&self) -> bool {
        self.segments.len() == 1
    }

    /// 按 id 查找分段.
    pub fn segment(&self, id: SegmentId) -> SegmentResult<&Segment> {
        self.position(id).map(|i| &self.segments[i])
    }

    fn position(&self, id: SegmentId) -> SegmentResult<usize> {
        self.segments
            .iter()
            .position(|s| s.id() == id)
            .ok_or(SegmentError::UnknownSegment(id))
    }

    /// 包含下标 `i` (对长度取模) 的分段.
    pub fn segment_containing(&self, i: usize) -> &Segment {
        self.segments
            .iter()
            .find(|s| s.contains(i))
            .unwrap_or(&self.segments[0])
    }

    /// 最近一次 `update` 失败的原因. 成功的 `update` 会清空它.
    #[inline]
    pub fn last_fail_reason(&self) -> Option<&str> {
        self.last_fail_reason.as_deref()
    }

    /// 用新的分段集合替换, 失败时不改变状态.
    fn replace_segments(&mut self, segments: Vec<Segment>) -> SegmentResult<()> {
        self.segments = canonicalize(segments, self.len(), self.min_length)?;
        Ok(())
    }

    /// 将分段 `id` 的边界移动到 `[new_start, new_end)`, 并相应移动前后相邻分段的边界.
    ///
    /// 仅当相邻分段仍满足最短长度、整圈仍被完整覆盖且不越过其他分段时成功.
    /// 失败时状态不变, 返回 `false`, 原因可通过 `last_fail_reason` 获取.
    pub fn update(&mut self, id: SegmentId, new_start: usize, new_end: usize) -> bool {
        match self.try_update(id, new_start, new_end) {
            Ok(()) => {
                self.last_fail_reason = None;
                true
            }
            Err(reason) => {
                log::debug!("Rejected update of segment {id}: {reason}");
                self.last_fail_reason = Some(reason);
                false
            }
        }
    }

    fn try_update(&mut self, id: SegmentId, new_start: usize, new_end: usize) -> Result<(), String> {
        let n = self.len();
        if new_start >= n || new_end >= n {
            return Err(format!(
                "bounds [{new_start}, {new_end}) are outside a profile of {n} points"
            ));
        }
        let idx = self.position(id).map_err(|e| e.to_string())?;
        let k = self.segments.len();
        let seg = &self.segments[idx];
        if seg.start() == new_start && seg.end() == new_end {
            return Ok(());
        }
        if seg.is_locked() {
            return Err(format!("segment {id} is locked"));
        }
        if k == 1 {
            return Err(format!("segment {id} is the only segment and spans the whole circle"));
        }
        let prev = (idx + k - 1) % k;
        let next = (idx + 1) % k;
        if seg.start() != new_start && self.segments[prev].is_locked() {
            return Err(format!("segment {} is locked", self.segments[prev].id()));
        }
        if seg.end() != new_end && self.segments[next].is_locked() {
            return Err(format!("segment {} is locked", self.segments[next].id()));
        }

        let mut candidate = self.segments.clone();
        candidate[idx].set_bounds(new_start, new_end);
        let (ps, ns_end) = (candidate[prev].start(), candidate[next].end());
        if prev == next {
            candidate[next].set_bounds(new_end, new_start);
        } else {
            candidate[prev].set_bounds(ps, new_start);
            candidate[next].set_bounds(new_end, ns_end);
        }
        self.replace_segments(candidate).map_err(|e| e.to_string())
    }

    /// 锁定或解锁分段 `id`.
    pub fn lock_segment(&mut self, id: SegmentId, locked: bool) -> SegmentResult<()> {
        let idx = self.position(id)?;
        self.segments[idx].set_locked(locked);
        Ok(())
    }

    /// 环形偏移, profile 与分段一同旋转. 新下标 0 对应当前下标 `k`.
    pub fn offset(&self, k: usize) -> SegmentedProfile {
        let n = self.len();
        let k = k % n;
        let segments = self
            .segments
            .iter()
            .map(|s| s.rebase(s.start() + n - k, s.end() + n - k, n))
            .collect();
        Self {
            profile: self.profile.offset(k),
            segments: rotate_to_zero(segments),
            min_length: self.min_length,
            last_fail_reason: None,
        }
    }

    /// 重采样到 `n` 个点, 按比例缩放分段边界, 并保证每个分段不短于最短长度.
    ///
    /// `n` 容纳不下所有分段时返回 `SegmentError::NotEnoughRoom`.
    pub fn interpolate(&self, n: usize) -> SegmentResult<SegmentedProfile> {
        let k = self.segments.len();
        let required = if k == 1 { 1 } else { k * self.min_length };
        if n < required {
            return Err(SegmentError::NotEnoughRoom {
                length: n,
                required,
            });
        }
        let segments = scale_segments(&self.segments, self.len(), n, self.min_length)?;
        Self::with_min_length(self.profile.resampled(n), segments, self.min_length)
    }

    /// 合并相邻分段 `first` 与 `second` (`first` 在前), 新分段使用 `new_id`.
    pub fn merge_segments(
        &mut self,
        first: SegmentId,
        second: SegmentId,
        new_id: SegmentId,
    ) -> SegmentResult<()> {
        let a = self.segment(first)?.clone();
        let b = self.segment(second)?.clone();
        if a.end() != b.start() || first == second {
            return Err(SegmentError::CannotMerge(first, second));
        }
        if new_id != first && new_id != second && self.position(new_id).is_ok() {
            return Err(SegmentError::DuplicateId(new_id));
        }
        let merged = Segment::new(new_id, a.start(), b.end(), self.len())?;
        let segments = self
            .segments
            .iter()
            .filter(|s| s.id() != first && s.id() != second)
            .cloned()
            .chain(std::iter::once(merged))
            .collect();
        self.replace_segments(segments)
    }

    /// 在下标 `at` 处把分段 `id` 分割成 `[start, at)` (`first`) 与 `[at, end)` (`second`).
    pub fn split_segment(
        &mut self,
        id: SegmentId,
        at: usize,
        first: SegmentId,
        second: SegmentId,
    ) -> SegmentResult<()> {
        let seg = self.segment(id)?.clone();
        let n = self.len();
        let at = at % n;
        let left = arc_length(seg.start(), at, n);
        if at == seg.start() || !seg.contains(at) || left < self.min_length {
            return Err(SegmentError::CannotSplit(id));
        }
        if seg.length() - left < self.min_length {
            return Err(SegmentError::CannotSplit(id));
        }
        for new_id in [first, second] {
            if new_id != id && self.position(new_id).is_ok() {
                return Err(SegmentError::DuplicateId(new_id));
            }
        }
        let a = Segment::new(first, seg.start(), at, n)?;
        let b = Segment::new(second, at, seg.end(), n)?;
        let segments = self
            .segments
            .iter()
            .filter(|s| s.id() != id)
            .cloned()
            .chain([a, b])
            .collect();
        self.replace_segments(segments)
    }

    /// 检查两者的分段 id 是否按相同环形顺序一一对应 (允许整体旋转).
    ///
    /// 个数不同返回 `CountMismatch`, 缺少模板中的 id 返回 `UnknownSegment`,
    /// id 集合相同但环形顺序不同返回 `OrderMismatch`.
    pub fn check_same_ids(&self, template: &SegmentedProfile) -> SegmentResult<()> {
        if self.segment_count() != template.segment_count() {
            return Err(SegmentError::CountMismatch {
                expected: template.segment_count(),
                found: self.segment_count(),
            });
        }
        for t in template.segments.iter() {
            self.segment(t.id())?;
        }
        let first = template.segments[0].id();
        let shift = self
            .segments
            .iter()
            .position(|s| s.id() == first)
            .ok_or(SegmentError::UnknownSegment(first))?;
        let k = self.segments.len();
        for (j, t) in template.segments.iter().enumerate() {
            if self.segments[(shift + j) % k].id() != t.id() {
                return Err(SegmentError::OrderMismatch(t.id()));
            }
        }
        Ok(())
    }

    /// 构造 franken-profile: 把本 profile 的每个分段插值到模板对应分段的长度,
    /// 放在模板对应分段的位置上. 结果长度等于模板长度, 模板下标与本实例的弧一一对应.
    pub fn franken_normalise(&self, template: &SegmentedProfile) -> SegmentResult<Profile> {
        self.check_same_ids(template)?;
        let n_t = template.len();
        let mut out = vec![0.0; n_t];
        for t in template.segments.iter() {
            let own = self.segment(t.id())?;
            let values = self.profile.sample_arc(own.start(), own.length(), t.length());
            for (i, v) in values.into_iter().enumerate() {
                out[(t.start() + i) % n_t] = v;
            }
        }
        Profile::new(out).map_err(|_| SegmentError::NoSegments)
    }

    /// 把模板下标 `index` 经由分段对应关系映射到本 profile 的下标.
    ///
    /// 落在模板分段 `t` 的比例位置 `p` 处的下标, 映射到本实例同 id 分段的同一比例位置.
    pub fn project_from_template(
        &self,
        template: &SegmentedProfile,
        index: usize,
    ) -> SegmentResult<usize> {
        let index = index % template.len();
        let t = template.segment_containing(index);
        let own = self.segment(t.id())?;
        let fraction = arc_length(t.start(), index, t.total()) as f64 / t.length() as f64;
        let delta = if t.start() == index {
            0
        } else {
            (fraction * own.length() as f64).round() as usize
        };
        Ok((own.start() + delta) % self.len())
    }
}

/// 把整圈分段重新排成以包含下标 0 者开头.
fn rotate_to_zero(mut segments: Vec<Segment>) -> Vec<Segment> {
    if let Some(p) = segments.iter().position(|s| s.contains(0)) {
        segments.rotate_left(p);
    }
    segments
}

/// 把规范顺序的分段从长度 `from` 的圆按比例缩放到长度 `to` 的圆.
///
/// 第一个分段的起点按比例缩放后作为锚点, 其余断点在锚点之后按最短长度修复.
pub(crate) fn scale_segments(
    segments: &[Segment],
    from: usize,
    to: usize,
    min_length: usize,
) -> SegmentResult<Vec<Segment>> {
    if let [single] = segments {
        return Ok(vec![single.rebase(0, 0, to)]);
    }
    let scale = |i: usize| ((i as f64 * to as f64 / from as f64).round() as usize) % to;
    let anchor = scale(segments[0].start());
    let anchor_from = segments[0].start();
    // 相对第一个断点的偏移, 在原圆上严格升序.
    let mut offsets: Vec<usize> = segments
        .iter()
        .map(|s| {
            let o = arc_length(anchor_from, s.start(), from);
            if s.start() == anchor_from {
                0
            } else {
                ((o as f64 * to as f64 / from as f64).round() as usize).min(to - 1)
            }
        })
        .collect();
    for i in 1..offsets.len() {
        offsets[i] = offsets[i].max(offsets[i - 1] + 1);
    }
    if !enforce_min_gaps(&mut offsets, to, min_length) {
        return Err(SegmentError::NotEnoughRoom {
            length: to,
            required: segments.len() * min_length,
        });
    }
    let k = segments.len();
    Ok(segments
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let start = anchor + offsets[i];
            let end = anchor + if i + 1 < k { offsets[i + 1] } else { to };
            s.rebase(start, end, to)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Profile {
        Profile::new((0..n).map(|i| i as f64).collect()).unwrap()
    }

    fn seg(i: usize, start: usize, end: usize, total: usize) -> Segment {
        Segment::new(SegmentId::nth(i), start, end, total).unwrap()
    }

    fn three(n: usize) -> SegmentedProfile {
        SegmentedProfile::new(
            ramp(n),
            vec![seg(1, 30, 70, n), seg(0, 0, 30, n), seg(2, 70, 0, n)],
        )
        .unwrap()
    }

    /// 构造时按规范顺序重排.
    #[test]
    fn test_segmented_canonical_order() {
        let sp = three(100);
        assert_eq!(
            sp.segment_ids(),
            vec![SegmentId::nth(0), SegmentId::nth(1), SegmentId::nth(2)]
        );
        // 第一个分段跨接缝.
        let sp = SegmentedProfile::new(
            ramp(100),
            vec![seg(0, 90, 40, 100), seg(1, 40, 90, 100)],
        )
        .unwrap();
        assert_eq!(sp.ordered_segments()[0].id(), SegmentId::nth(0));
        assert_eq!(sp.segment_containing(95).id(), SegmentId::nth(0));
        assert_eq!(sp.segment_containing(50).id(), SegmentId::nth(1));
    }

    /// 非法分段集合被拒绝.
    #[test]
    fn test_segmented_invalid() {
        let n = 100;
        // 空隙
        let r = SegmentedProfile::new(ramp(n), vec![seg(0, 0, 30, n), seg(1, 40, 0, n)]);
        assert!(matches!(r, Err(SegmentError::NotContiguous(_))));
        // 过短
        let r = SegmentedProfile::new(ramp(n), vec![seg(0, 0, 5, n), seg(1, 5, 0, n)]);
        assert!(matches!(r, Err(SegmentError::TooShort { length: 5, .. })));
        // 重复 id
        let r = SegmentedProfile::new(ramp(n), vec![seg(0, 0, 50, n), seg(0, 50, 0, n)]);
        assert!(matches!(r, Err(SegmentError::DuplicateId(_))));
        // 总长不符
        let r = SegmentedProfile::new(ramp(n), vec![seg(0, 0, 50, 80), seg(1, 50, 0, 80)]);
        assert!(matches!(r, Err(SegmentError::LengthMismatch { .. })));
        // 全圆分段不能与其他分段共存
        let r = SegmentedProfile::new(
            ramp(n),
            vec![Segment::full_circle(SegmentId::DEFAULT, n), seg(1, 50, 0, n)],
        );
        assert!(matches!(r, Err(SegmentError::FullCircleNotAlone(_))));
        assert_eq!(
            SegmentedProfile::new(ramp(n), vec![]),
            Err(SegmentError::NoSegments)
        );
    }

    /// 短 profile 上的唯一默认分段合法.
    #[test]
    fn test_segmented_short_default() {
        let sp = SegmentedProfile::unsegmented(ramp(4));
        assert!(sp.is_single_segment());
        assert_eq!(sp.ordered_segments()[0].length(), 4);
    }

    /// 合法更新会同步移动相邻分段.
    #[test]
    fn test_segmented_update_ok() {
        let mut sp = three(100);
        assert!(sp.update(SegmentId::nth(1), 25, 75));
        assert_eq!(sp.segment(SegmentId::nth(0)).unwrap().end(), 25);
        assert_eq!(sp.segment(SegmentId::nth(2)).unwrap().start(), 75);
        assert!(sp.last_fail_reason().is_none());
    }

    /// 非法更新原子失败并记录原因.
    #[test]
    fn test_segmented_update_rejected() {
        let mut sp = three(100);
        let before = sp.clone();
        // 使前一个分段短于最短长度.
        assert!(!sp.update(SegmentId::nth(1), 5, 70));
        assert_eq!(sp, before);
        assert!(sp.last_fail_reason().is_some());
        // 越过后一个分段.
        assert!(!sp.update(SegmentId::nth(1), 30, 5));
        assert_eq!(sp, before);
        // 越界.
        assert!(!sp.update(SegmentId::nth(1), 30, 100));
        // 锁定.
        sp.lock_segment(SegmentId::nth(2), true).unwrap();
        let locked = sp.clone();
        assert!(!sp.update(SegmentId::nth(1), 30, 75));
        assert_eq!(sp, locked);
        // 成功后清空原因.
        assert!(sp.update(SegmentId::nth(1), 35, 70));
        assert!(sp.last_fail_reason().is_none());
    }

    /// 偏移同时旋转分段.
    #[test]
    fn test_segmented_offset() {
        let sp = three(100);
        let moved = sp.offset(30);
        assert_eq!(moved.profile().get(0), 30.0);
        let first = &moved.ordered_segments()[0];
        assert_eq!(first.id(), SegmentId::nth(1));
        assert_eq!((first.start(), first.end()), (0, 40));
        assert_eq!(moved.offset(70), sp);
    }

    /// 插值按比例缩放分段.
    #[test]
    fn test_segmented_interpolate() {
        let sp = three(100);
        let big = sp.interpolate(200).unwrap();
        let bounds: Vec<(usize, usize)> = big
            .ordered_segments()
            .iter()
            .map(|s| (s.start(), s.end()))
            .collect();
        assert_eq!(bounds, vec![(0, 60), (60, 140), (140, 0)]);
        assert!(matches!(
            sp.interpolate(20),
            Err(SegmentError::NotEnoughRoom { .. })
        ));
    }

    /// 合并与分割.
    #[test]
    fn test_segmented_merge_split() {
        let mut sp = three(100);
        sp.merge_segments(SegmentId::nth(0), SegmentId::nth(1), SegmentId::new(9))
            .unwrap();
        assert_eq!(sp.segment_count(), 2);
        assert_eq!(sp.segment(SegmentId::new(9)).unwrap().length(), 70);
        assert!(sp
            .merge_segments(SegmentId::nth(2), SegmentId::nth(2), SegmentId::new(8))
            .is_err());

        sp.split_segment(SegmentId::new(9), 40, SegmentId::nth(0), SegmentId::nth(1))
            .unwrap();
        assert_eq!(sp.segment(SegmentId::nth(1)).unwrap().start(), 40);
        assert_eq!(
            sp.split_segment(SegmentId::nth(1), 42, SegmentId::new(5), SegmentId::new(6)),
            Err(SegmentError::CannotSplit(SegmentId::nth(1)))
        );
    }

    /// 与自身对应的 franken-profile 即原 profile, 映射为恒等.
    #[test]
    fn test_franken_identity() {
        let sp = three(100);
        let fp = sp.franken_normalise(&sp).unwrap();
        assert_eq!(&fp, sp.profile());
        for i in [0, 17, 30, 99] {
            assert_eq!(sp.project_from_template(&sp, i).unwrap(), i);
        }
    }

    /// 长度不同的实例映射到模板长度.
    #[test]
    fn test_franken_rescale() {
        let template = three(100);
        let inst = SegmentedProfile::new(
            ramp(50),
            vec![seg(0, 0, 10, 50), seg(1, 10, 40, 50), seg(2, 40, 0, 50)],
        )
        .unwrap();
        let fp = inst.franken_normalise(&template).unwrap();
        assert_eq!(fp.len(), 100);
        // 模板分段 1 起点 30 对应实例分段 1 起点 10.
        assert_eq!(fp.get(30), 10.0);
        assert_eq!(inst.project_from_template(&template, 30).unwrap(), 10);
        assert_eq!(inst.project_from_template(&template, 50).unwrap(), 25);

        let two = SegmentedProfile::new(ramp(50), vec![seg(0, 0, 25, 50), seg(1, 25, 0, 50)])
            .unwrap();
        assert!(matches!(
            two.franken_normalise(&template),
            Err(SegmentError::CountMismatch { .. })
        ));
    }

    /// id 顺序只允许整体旋转, 交换顺序会被拒绝.
    #[test]
    fn test_check_same_ids_order() {
        let template = three(100);
        let rotated = SegmentedProfile::new(
            ramp(90),
            vec![seg(1, 0, 30, 90), seg(2, 30, 60, 90), seg(0, 60, 0, 90)],
        )
        .unwrap();
        assert_eq!(rotated.check_same_ids(&template), Ok(()));

        let swapped = SegmentedProfile::new(
            ramp(90),
            vec![seg(0, 0, 30, 90), seg(2, 30, 60, 90), seg(1, 60, 0, 90)],
        )
        .unwrap();
        assert_eq!(
            swapped.check_same_ids(&template),
            Err(SegmentError::OrderMismatch(SegmentId::nth(1)))
        );
        assert!(swapped.franken_normalise(&template).is_err());
    }

    /// 反序列化经过构造校验, 不连续的分段集合被拒绝.
    #[cfg(feature = "serde")]
    #[test]
    fn test_segmented_deserialize_checked() {
        let sp = three(100);
        let mut value = serde_json::to_value(&sp).unwrap();
        assert_eq!(serde_json::from_value::<SegmentedProfile>(value.clone()).unwrap(), sp);

        value["segments"][1]["end"] = serde_json::json!(60);
        assert!(serde_json::from_value::<SegmentedProfile>(value).is_err());
    }
}
