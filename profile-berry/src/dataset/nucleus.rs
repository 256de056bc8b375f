//! 单个细胞核: 轮廓, profile, 标志点与分段.

use super::error::{CellError, CellResult};
use crate::data::{Landmark, Profile, ProfileType, Segment, SegmentedProfile};
use crate::Point2d;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一个细胞核.
///
/// 1. 原始 profile 以轮廓点 0 为下标原点;
/// 2. 标志点记录为轮廓点下标;
/// 3. 分段记录在参考点坐标系中 (参考点为下标 0), 所有 profile 种类共享.
///
/// 参考点移动时分段随之换算, 分段边界在轮廓上的位置保持不变.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Nucleus {
    id: u32,
    border: Vec<Point2d>,
    profiles: BTreeMap<ProfileType, Profile>,
    landmarks: BTreeMap<Landmark, usize>,
    segments: Option<Vec<Segment>>,
    segment_min_length: usize,
    locked: bool,
    stale: bool,
}

impl Nucleus {
    /// 用有序轮廓点构造. 新细胞核没有 profile, 标志点和分段.
    pub fn new(id: u32, border: Vec<Point2d>) -> Self {
        Self {
            id,
            border,
            profiles: BTreeMap::new(),
            landmarks: BTreeMap::new(),
            segments: None,
            segment_min_length: 1,
            locked: false,
            stale: true,
        }
    }

    /// 细胞核编号.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// 有序轮廓点.
    #[inline]
    pub fn border(&self) -> &[Point2d] {
        &self.border
    }

    /// 轮廓点个数, 也是各 profile 的长度.
    #[inline]
    pub fn border_len(&self) -> usize {
        self.border.len()
    }

    /// 是否被用户锁定. 锁定的细胞核不参与重新拟合.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// 锁定或解锁.
    #[inline]
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// 分段是否需要重新拟合.
    #[inline]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// 标记为需要重新拟合.
    #[inline]
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// 以轮廓点 0 为原点的原始 profile.
    #[inline]
    pub fn raw_profile(&self, profile_type: ProfileType) -> Option<&Profile> {
        self.profiles.get(&profile_type)
    }

    /// 设置原始 profile, 长度必须等于轮廓点数.
    pub fn set_raw_profile(&mut self, profile_type: ProfileType, profile: Profile) -> CellResult<()> {
        if profile.len() != self.border_len() {
            return Err(CellError::LengthMismatch {
                expected: self.border_len(),
                found: profile.len(),
            });
        }
        self.profiles.insert(profile_type, profile);
        Ok(())
    }

    /// 是否已有全部种类的 profile.
    pub fn has_profiles(&self) -> bool {
        ProfileType::ALL
            .iter()
            .all(|t| self.profiles.contains_key(t))
    }

    /// 标志点的轮廓下标.
    pub fn border_index(&self, landmark: &Landmark) -> CellResult<usize> {
        self.landmarks
            .get(landmark)
            .copied()
            .ok_or_else(|| CellError::MissingLandmark(landmark.clone()))
    }

    /// 是否已有参考点.
    #[inline]
    pub fn has_reference_point(&self) -> bool {
        self.landmarks.contains_key(&Landmark::ReferencePoint)
    }

    /// 所有已知标志点及其轮廓下标.
    pub fn landmarks(&self) -> impl Iterator<Item = (&Landmark, usize)> + '_ {
        self.landmarks.iter().map(|(l, i)| (l, *i))
    }

    /// 把标志点设在轮廓下标 `index` (对轮廓点数取模).
    ///
    /// 移动参考点时, 参考点坐标系中的分段同步换算, 使分段边界在轮廓上的位置不变.
    pub fn set_landmark(&mut self, landmark: Landmark, index: usize) {
        let n = self.border_len();
        if n == 0 {
            return;
        }
        let index = index % n;
        if landmark.is_reference() {
            if let (Some(old), Some(segments)) = (
                self.landmarks.get(&Landmark::ReferencePoint).copied(),
                self.segments.as_mut(),
            ) {
                // 旧坐标 x 对应轮廓 old + x, 新坐标为 old + x - index.
                let shift = (old + n - index) % n;
                for s in segments.iter_mut() {
                    *s = s.rebase(s.start() + shift, s.end() + shift, n);
                }
                if let Some(p) = segments.iter().position(|s| s.contains(0)) {
                    segments.rotate_left(p);
                }
            }
        }
        self.landmarks.insert(landmark, index);
    }

    /// 从 `landmark` 开始的 profile.
    pub fn profile(&self, profile_type: ProfileType, landmark: &Landmark) -> CellResult<Profile> {
        let raw = self
            .raw_profile(profile_type)
            .ok_or(CellError::MissingProfile(profile_type))?;
        Ok(raw.offset(self.border_index(landmark)?))
    }

    /// 参考点坐标系中的分段.
    #[inline]
    pub fn segments(&self) -> Option<&[Segment]> {
        self.segments.as_deref()
    }

    /// 是否已分段.
    #[inline]
    pub fn is_segmented(&self) -> bool {
        self.segments.is_some()
    }

    /// 清除分段.
    pub fn clear_segments(&mut self) {
        self.segments = None;
        self.stale = true;
    }

    /// 从 `landmark` 开始的带分段 profile.
    pub fn segmented_profile(
        &self,
        profile_type: ProfileType,
        landmark: &Landmark,
    ) -> CellResult<SegmentedProfile> {
        let segments = self.segments.clone().ok_or(CellError::NotSegmented)?;
        let rp = self.border_index(&Landmark::ReferencePoint)?;
        let n = self.border_len();
        let in_rp = SegmentedProfile::with_min_length(
            self.profile(profile_type, &Landmark::ReferencePoint)?,
            segments,
            self.segment_min_length,
        )?;
        let at = self.border_index(landmark)?;
        Ok(in_rp.offset((at + n - rp) % n))
    }

    /// 写入从 `landmark` 开始的带分段 profile.
    ///
    /// 分段换算到参考点坐标系后保存, profile 取值写回该种类的原始 profile.
    /// 写入后细胞核不再是过期状态.
    pub fn set_segmented_profile(
        &mut self,
        profile_type: ProfileType,
        landmark: &Landmark,
        segmented: &SegmentedProfile,
    ) -> CellResult<()> {
        let n = self.border_len();
        if segmented.len() != n {
            return Err(CellError::LengthMismatch {
                expected: n,
                found: segmented.len(),
            });
        }
        let rp = self.border_index(&Landmark::ReferencePoint)?;
        let at = self.border_index(landmark)?;
        let in_rp = segmented.offset((rp + n - at) % n);
        self.profiles
            .insert(profile_type, in_rp.profile().offset((n - rp) % n));
        self.segments = Some(in_rp.ordered_segments().to_vec());
        self.segment_min_length = in_rp.min_length();
        self.stale = false;
        Ok(())
    }
}
