//! 经由 franken-profile 把群体标志点传递到每个细胞核.

use crate::data::{Landmark, Profile, ProfileError, ProfileType, SegmentError, SegmentedProfile};
use crate::dataset::{CellError, Dataset, Nucleus};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;
    }
}

/// 标志点对齐错误.
#[derive(Clone, Debug, PartialEq)]
pub enum OffsetError {
    /// 细胞核尚未分段.
    NotSegmented,

    /// 细胞核的分段与模板不对应.
    SegmentMismatch(SegmentError),

    /// 群体没有模板.
    NoTemplate,

    /// 群体或细胞核上缺少标志点.
    MissingLandmark(Landmark),

    /// profile 运算错误.
    Profile(ProfileError),
}

impl fmt::Display for OffsetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSegmented => write!(f, "nucleus is not segmented"),
            Self::SegmentMismatch(e) => write!(f, "segments do not match the template: {e}"),
            Self::NoTemplate => write!(f, "collection has no template"),
            Self::MissingLandmark(l) => write!(f, "landmark {l} is not set"),
            Self::Profile(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for OffsetError {}

impl From<SegmentError> for OffsetError {
    fn from(e: SegmentError) -> Self {
        Self::SegmentMismatch(e)
    }
}

impl From<CellError> for OffsetError {
    fn from(e: CellError) -> Self {
        match e {
            CellError::MissingLandmark(l) => Self::MissingLandmark(l),
            CellError::Segment(e) => Self::SegmentMismatch(e),
            CellError::Profile(e) => Self::Profile(e),
            CellError::Offset(e) => e,
            _ => Self::NotSegmented,
        }
    }
}

/// 标志点对齐结果.
pub type OffsetResult<T> = Result<T, OffsetError>;

/// 标志点对齐参数.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OffsetOptions {
    search_window: Option<usize>,
}

impl OffsetOptions {
    /// 只在 `[-window, window]` 内搜索偏移. `None` 表示搜索整圈.
    #[inline]
    pub fn new(search_window: Option<usize>) -> Self {
        Self { search_window }
    }

    /// 搜索半径.
    #[inline]
    pub fn search_window(&self) -> Option<usize> {
        self.search_window
    }
}

/// 标志点对齐器.
///
/// 群体模板上的标志点位置已知. 对每个细胞核:
///
/// 1. 把细胞核 (参考点坐标系) 的带分段 profile 按分段对应关系规整为 franken-profile,
///    其长度与下标都与模板一致;
/// 2. 模板与 franken-profile 都旋转到模板标志点处, 在搜索范围内寻找最佳偏移;
/// 3. 最佳位置经由分段对应关系映射回细胞核自身的下标, 再换算为轮廓下标写回.
#[derive(Copy, Clone, Debug, Default)]
pub struct ProfileOffsetter {
    options: OffsetOptions,
}

impl ProfileOffsetter {
    /// 构造对齐器.
    #[inline]
    pub fn new(options: OffsetOptions) -> Self {
        Self { options }
    }

    /// 使 `instance.offset(k)` 与 `reference` 最接近的偏移 `k`.
    #[inline]
    pub fn best_offset(&self, reference: &Profile, instance: &Profile) -> usize {
        reference.best_fit_offset(instance, self.options.search_window())
    }

    /// 把群体标志点 `landmark` 传递到每个细胞核.
    ///
    /// 群体没有模板或没有该标志点时整体失败; 单个细胞核的失败只记录在返回值中
    /// (细胞核下标, 错误), 不影响其它细胞核. 参考点不需要传递, 直接返回空列表.
    pub fn assign_landmark_via_franken_profile(
        &self,
        dataset: &mut Dataset,
        landmark: &Landmark,
    ) -> OffsetResult<Vec<(usize, OffsetError)>> {
        if landmark.is_reference() {
            return Ok(Vec::new());
        }
        let (nuclei, collection, _, _) = dataset.parts_mut();
        let collection = &*collection;
        let template = collection.template().ok_or(OffsetError::NoTemplate)?;
        let index = collection
            .landmark_index(landmark)
            .ok_or_else(|| OffsetError::MissingLandmark(landmark.clone()))?;
        // 群体下标以聚合长度计, 模板长度可能不同.
        let length = collection.length().max(1);
        let at = ((index as f64 * template.len() as f64 / length as f64).round() as usize)
            % template.len();
        let reference = template.profile().offset(at);

        let assign = |(i, nucleus): (usize, &mut Nucleus)| {
            self.assign_one(nucleus, template, &reference, at, landmark)
                .err()
                .map(|e| (i, e))
        };
        #[cfg(feature = "rayon")]
        let errors: Vec<(usize, OffsetError)> =
            nuclei.par_iter_mut().enumerate().filter_map(assign).collect();
        #[cfg(not(feature = "rayon"))]
        let errors: Vec<(usize, OffsetError)> =
            nuclei.iter_mut().enumerate().filter_map(assign).collect();
        for (i, e) in errors.iter() {
            log::warn!("Cannot assign {landmark} to nucleus {i}: {e}");
        }
        Ok(errors)
    }

    /// 对单个细胞核传递标志点, 返回新的轮廓下标.
    fn assign_one(
        &self,
        nucleus: &mut Nucleus,
        template: &SegmentedProfile,
        reference: &Profile,
        at: usize,
        landmark: &Landmark,
    ) -> OffsetResult<usize> {
        if !nucleus.is_segmented() {
            return Err(OffsetError::NotSegmented);
        }
        let segmented = nucleus.segmented_profile(ProfileType::Angle, &Landmark::ReferencePoint)?;
        let franken = segmented.franken_normalise(template)?;
        let d = self.best_offset(reference, &franken.offset(at));
        let native = segmented.project_from_template(template, at + d)?;
        let rp = nucleus.border_index(&Landmark::ReferencePoint)?;
        let border = (rp + native) % nucleus.border_len();
        nucleus.set_landmark(landmark.clone(), border);
        Ok(border)
    }

    /// 重新传递群体上除参考点以外的所有标志点.
    pub fn recalculate_verticals(
        &self,
        dataset: &mut Dataset,
    ) -> OffsetResult<Vec<(usize, OffsetError)>> {
        if dataset.collection().template().is_none() {
            return Err(OffsetError::NoTemplate);
        }
        let landmarks: Vec<Landmark> = dataset
            .collection()
            .landmarks()
            .map(|(l, _)| l.clone())
            .filter(|l| !l.is_reference())
            .collect();
        let mut errors = Vec::new();
        for l in landmarks.iter() {
            errors.extend(self.assign_landmark_via_franken_profile(dataset, l)?);
        }
        Ok(errors)
    }
}
