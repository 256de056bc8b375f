//! 群体 profile 聚合.

use super::aggregate::{ProfileAggregate, Statistic};
use super::error::{CollectionError, CollectionResult, ProfileResult};
use super::segmented::{canonicalize, scale_segments};
use super::{Landmark, Profile, ProfileType, Segment, SegmentId, SegmentedProfile};
use crate::consts::MINIMUM_SEGMENT_LENGTH;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一个数据集在群体层面的 profile 信息.
///
/// 1. 每种 profile 的逐点统计, 以参考点为下标 0 对齐;
/// 2. 各标志点在聚合 profile 上的下标偏移 (参考点恒为 0);
/// 3. 聚合长度下的分段模式;
/// 4. 群体模板 `SegmentedProfile`, 逐实例拟合时作为模式使用.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileCollection {
    aggregates: BTreeMap<ProfileType, ProfileAggregate>,
    landmarks: BTreeMap<Landmark, usize>,
    segments: Vec<Segment>,
    template: Option<SegmentedProfile>,
    min_length: usize,
}

impl ProfileCollection {
    /// 空集合. `min_length` 为分段模式的最短分段长度.
    pub fn new(min_length: usize) -> Self {
        let mut landmarks = BTreeMap::new();
        landmarks.insert(Landmark::ReferencePoint, 0);
        Self {
            aggregates: BTreeMap::new(),
            landmarks,
            segments: Vec::new(),
            template: None,
            min_length,
        }
    }

    /// 用参考点对齐后的实例 profile 重建 `profile_type` 的聚合.
    ///
    /// 若聚合长度改变, 已有的分段模式会按比例缩放到新长度.
    pub fn rebuild(
        &mut self,
        profile_type: ProfileType,
        profiles: &[Profile],
        length: usize,
    ) -> ProfileResult<()> {
        let aggregate = ProfileAggregate::new(profiles, length)?;
        let old = self.length();
        self.aggregates.insert(profile_type, aggregate);
        if old != 0 && old != length && !self.segments.is_empty() {
            match scale_segments(&self.segments, old, length, self.min_length) {
                Ok(s) => self.segments = s,
                Err(e) => {
                    log::warn!("Dropping collection segments after length change: {e}");
                    self.segments.clear();
                }
            }
        }
        Ok(())
    }

    /// 聚合长度. 尚无聚合时为 0.
    #[inline]
    pub fn length(&self) -> usize {
        self.aggregates.values().next().map_or(0, |a| a.length())
    }

    /// 是否尚无任何聚合.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// 参与聚合的实例个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.aggregates.values().next().map_or(0, |a| a.count())
    }

    /// `profile_type` 的聚合.
    pub fn aggregate(&self, profile_type: ProfileType) -> CollectionResult<&ProfileAggregate> {
        self.aggregates
            .get(&profile_type)
            .ok_or(CollectionError::NoAggregate(profile_type))
    }

    /// 标志点在聚合 profile 上的下标 (相对参考点).
    #[inline]
    pub fn landmark_index(&self, landmark: &Landmark) -> Option<usize> {
        self.landmarks.get(landmark).copied()
    }

    /// 设置标志点下标.
    pub fn set_landmark_index(&mut self, landmark: Landmark, index: usize) {
        if landmark.is_reference() {
            return;
        }
        self.landmarks.insert(landmark, index);
    }

    /// 所有已知标志点及其下标.
    pub fn landmarks(&self) -> impl Iterator<Item = (&Landmark, usize)> + '_ {
        self.landmarks.iter().map(|(l, i)| (l, *i))
    }

    fn require_landmark(&self, landmark: &Landmark) -> CollectionResult<usize> {
        self.landmark_index(landmark)
            .ok_or_else(|| CollectionError::MissingLandmark(landmark.clone()))
    }

    /// 从 `landmark` 开始的 `stat` 统计 profile.
    pub fn profile(
        &self,
        profile_type: ProfileType,
        landmark: &Landmark,
        stat: Statistic,
    ) -> CollectionResult<Profile> {
        let offset = self.require_landmark(landmark)?;
        Ok(self.aggregate(profile_type)?.profile(stat).offset(offset))
    }

    /// 从 `landmark` 开始的 `stat` 统计 profile, 带上分段模式.
    pub fn segmented_profile(
        &self,
        profile_type: ProfileType,
        landmark: &Landmark,
        stat: Statistic,
    ) -> CollectionResult<SegmentedProfile> {
        let offset = self.require_landmark(landmark)?;
        let profile = self.aggregate(profile_type)?.profile(stat);
        let sp = if self.segments.is_empty() {
            SegmentedProfile::unsegmented(profile)
        } else {
            SegmentedProfile::with_min_length(profile, self.segments.clone(), self.min_length)?
        };
        Ok(sp.offset(offset))
    }

    /// 设置分段模式 (以参考点为下标 0). 分段的总长与聚合长度不同时按比例缩放.
    pub fn add_segments(&mut self, segments: Vec<Segment>) -> CollectionResult<()> {
        let length = self.length();
        if length == 0 {
            return Err(CollectionError::NoAggregate(ProfileType::Angle));
        }
        let from = segments.first().map_or(length, Segment::total);
        let segments = if from == length {
            segments
        } else {
            let ordered = canonicalize(segments, from, self.min_length)?;
            scale_segments(&ordered, from, length, self.min_length)?
        };
        self.segments = canonicalize(segments, length, self.min_length)?;
        Ok(())
    }

    /// 从 `landmark` 开始的分段模式.
    pub fn segments(&self, landmark: &Landmark) -> CollectionResult<Vec<Segment>> {
        let offset = self.require_landmark(landmark)?;
        let n = self.length();
        let mut out: Vec<Segment> = self
            .segments
            .iter()
            .map(|s| s.rebase(s.start() + n - offset, s.end() + n - offset, n))
            .collect();
        if let Some(p) = out.iter().position(|s| s.contains(0)) {
            out.rotate_left(p);
        }
        Ok(out)
    }

    /// 分段模式中的 id, 按规范顺序.
    pub fn segment_ids(&self) -> Vec<SegmentId> {
        match &self.template {
            Some(t) => t.segment_ids(),
            None => self.segments.iter().map(Segment::id).collect(),
        }
    }

    /// 是否已有分段模式或模板.
    #[inline]
    pub fn has_segments(&self) -> bool {
        self.template.is_some() || !self.segments.is_empty()
    }

    /// 群体模板.
    #[inline]
    pub fn template(&self) -> Option<&SegmentedProfile> {
        self.template.as_ref()
    }

    /// 设置群体模板.
    #[inline]
    pub fn set_template(&mut self, template: SegmentedProfile) {
        self.template = Some(template);
    }

    /// 清除模板与分段模式.
    pub fn clear_segments(&mut self) {
        self.template = None;
        self.segments.clear();
    }

    /// 分段模式的最短分段长度.
    #[inline]
    pub fn min_length(&self) -> usize {
        self.min_length
    }
}

impl Default for ProfileCollection {
    fn default() -> Self {
        Self::new(MINIMUM_SEGMENT_LENGTH)
    }
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

    /// 标志点偏移作用于聚合 profile 与分段模式.
    #[test]
    fn test_collection_landmark_offset() {
        let mut c = ProfileCollection::new(10);
        c.rebuild(ProfileType::Angle, &[ramp(100), ramp(100)], 100)
            .unwrap();
        assert_eq!(c.length(), 100);
        assert_eq!(c.count(), 2);
        c.set_landmark_index(Landmark::OrientationPoint, 40);
        let p = c
            .profile(ProfileType::Angle, &Landmark::OrientationPoint, Statistic::Median)
            .unwrap();
        assert_eq!(p.get(0), 40.0);

        c.add_segments(vec![seg(0, 0, 30, 100), seg(1, 30, 0, 100)])
            .unwrap();
        let s = c.segments(&Landmark::OrientationPoint).unwrap();
        assert_eq!(s[0].id(), SegmentId::nth(1));
        assert_eq!((s[0].start(), s[0].end()), (90, 60));
        assert_eq!(
            c.segment_ids(),
            vec![SegmentId::nth(0), SegmentId::nth(1)]
        );
        assert!(matches!(
            c.profile(ProfileType::Radius, &Landmark::ReferencePoint, Statistic::Median),
            Err(CollectionError::NoAggregate(ProfileType::Radius))
        ));
        assert!(matches!(
            c.segments(&Landmark::TopVertical),
            Err(CollectionError::MissingLandmark(_))
        ));
    }

    /// 分段模式按聚合长度缩放.
    #[test]
    fn test_collection_add_segments_rescaled() {
        let mut c = ProfileCollection::new(10);
        c.rebuild(ProfileType::Angle, &[ramp(100)], 100).unwrap();
        c.add_segments(vec![seg(0, 0, 20, 50), seg(1, 20, 0, 50)])
            .unwrap();
        let s = c.segments(&Landmark::ReferencePoint).unwrap();
        assert_eq!((s[0].start(), s[0].end()), (0, 40));
        assert_eq!(s[0].total(), 100);

        c.rebuild(ProfileType::Angle, &[ramp(100)], 50).unwrap();
        let s = c.segments(&Landmark::ReferencePoint).unwrap();
        assert_eq!((s[0].start(), s[0].end()), (0, 20));
    }
}
