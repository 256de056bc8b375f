//! 数据集分段: 生成或复用模板, 并拟合到每个细胞核.

use super::error::{CellError, CellResult, DatasetError, DatasetResult};
use super::validator::DatasetValidator;
use super::{Dataset, Nucleus};
use crate::align::{ProfileOffsetter, RepresentativeMedianFinder};
use crate::data::{
    Landmark, Profile, ProfileCollection, ProfileType, SegmentedProfile, Statistic,
};
use crate::fitting::{IterativeSegmentFitter, ProfileSegmenter, SegmentFitter};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;
    }
}

/// 单个细胞核的拟合结果. `None` 表示处理前已被取消.
type FitOutcome = Option<CellResult<SegmentedProfile>>;

/// 进度回调, 参数为刚处理完的细胞核下标. 可能在工作线程中调用.
type ProgressFn = Arc<dyn Fn(usize) + Send + Sync>;

/// 分段模式.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SegmentationMode {
    /// 由群体代表 profile 生成新模板, 重新拟合所有细胞核. 锁定状态保持不变.
    New,

    /// 复用已有模板, 只重新拟合未锁定且过期或分段与模板不一致的细胞核.
    Refine,

    /// 复制另一个群体的模板, 分段模式与标志点, 再拟合所有细胞核.
    /// 见 `DatasetSegmentationMethod::copy_from`.
    CopyFrom,
}

impl fmt::Display for SegmentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Refine => write!(f, "refine"),
            Self::CopyFrom => write!(f, "copy"),
        }
    }
}

/// 分段结果统计. 校验失败的结果同样返回, 由调用者决定如何处理.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationReport {
    /// 本次运行的模式.
    pub mode: SegmentationMode,

    /// 成功拟合并写回的细胞核个数.
    pub fitted: usize,

    /// 未参与拟合的细胞核个数 (无 profile, 或细化模式下锁定及无需重拟合).
    pub skipped: usize,

    /// 是否被取消. 取消前已拟合的细胞核保留新分段, 其余保留原分段.
    pub cancelled: bool,

    /// 细胞核上的失败 (细胞核下标, 错误), 包括拟合与标志点传递.
    pub errors: Vec<(usize, CellError)>,

    /// 校验器给出的错误描述.
    pub validation_errors: Vec<String>,

    /// 校验失败的细胞核下标.
    pub error_cells: Vec<usize>,

    /// 数据集分段是否一致.
    pub valid: bool,
}

/// 数据集分段流程.
///
/// 拟合在细胞核之间并行, 每个任务只读取自己的细胞核并返回拟合结果,
/// 全部任务结束后统一写回. 取消标志在开始处理每个细胞核之前检查.
#[derive(Clone)]
pub struct DatasetSegmentationMethod {
    mode: SegmentationMode,
    cancel: Arc<AtomicBool>,
    source: Option<ProfileCollection>,
    progress: Option<ProgressFn>,
}

impl fmt::Debug for DatasetSegmentationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetSegmentationMethod")
            .field("mode", &self.mode)
            .field("cancel", &self.cancel)
            .field("source", &self.source.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl DatasetSegmentationMethod {
    /// 构造.
    ///
    /// # 注意
    ///
    /// `SegmentationMode::CopyFrom` 需要源群体, 应使用 `copy_from` 构造;
    /// 否则运行时返回 `DatasetError::NoTemplate`.
    pub fn new(mode: SegmentationMode) -> Self {
        Self {
            mode,
            cancel: Arc::new(AtomicBool::new(false)),
            source: None,
            progress: None,
        }
    }

    /// 以 `source` 的模板, 分段模式与标志点为准分段 (`SegmentationMode::CopyFrom`).
    pub fn copy_from(source: &ProfileCollection) -> Self {
        Self {
            source: Some(source.clone()),
            ..Self::new(SegmentationMode::CopyFrom)
        }
    }

    /// 每处理完一个细胞核 (拟合成功或失败) 调用一次 `progress`, 参数为细胞核下标.
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// 使用外部共享的取消标志.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// 模式.
    #[inline]
    pub fn mode(&self) -> SegmentationMode {
        self.mode
    }

    /// 取消标志, 可交给其它线程.
    #[inline]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// 请求取消.
    #[inline]
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// 是否已请求取消.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// 对整个数据集运行.
    ///
    /// 数据集为空, 尚未计算 profile, 或 (细化模式下) 没有可用模板时返回错误.
    pub fn run(&self, dataset: &mut Dataset) -> DatasetResult<SegmentationReport> {
        if dataset.is_empty() {
            return Err(DatasetError::EmptyDataset);
        }
        if dataset.collection().is_empty() {
            return Err(DatasetError::NotProfiled);
        }
        let template = match self.mode {
            SegmentationMode::New => new_template(dataset)?,
            SegmentationMode::Refine => refine_template(dataset)?,
            SegmentationMode::CopyFrom => match &self.source {
                Some(source) => copy_template(dataset, source)?,
                None => return Err(DatasetError::NoTemplate),
            },
        };
        log::info!(
            "Segmenting {} with a {}-segment template ({} mode)",
            dataset.name(),
            template.segment_count(),
            self.mode
        );

        let fitter = IterativeSegmentFitter::new(template.clone(), dataset.options().fitter);
        let selected: Vec<bool> = dataset
            .nuclei()
            .iter()
            .map(|c| self.needs_fit(c, &template))
            .collect();
        let skipped = selected.iter().filter(|s| !**s).count();

        let fit_one = |(i, nucleus): (usize, &Nucleus)| -> Option<(usize, FitOutcome)> {
            if !selected[i] {
                return None;
            }
            if self.is_cancelled() {
                return Some((i, None));
            }
            let result = nucleus
                .profile(ProfileType::Angle, &Landmark::ReferencePoint)
                .and_then(|p| fitter.fit(&p).map_err(CellError::from));
            if let Some(progress) = &self.progress {
                progress(i);
            }
            Some((i, Some(result)))
        };
        #[cfg(feature = "rayon")]
        let results: Vec<_> = dataset
            .nuclei()
            .par_iter()
            .enumerate()
            .filter_map(fit_one)
            .collect();
        #[cfg(not(feature = "rayon"))]
        let results: Vec<_> = dataset
            .nuclei()
            .iter()
            .enumerate()
            .filter_map(fit_one)
            .collect();

        let mut fitted = 0;
        let mut cancelled = 0;
        let mut errors = Vec::new();
        for (i, result) in results {
            let nucleus = &mut dataset.nuclei_mut()[i];
            match result.map(|r| {
                r.and_then(|sp| {
                    nucleus.set_segmented_profile(ProfileType::Angle, &Landmark::ReferencePoint, &sp)
                })
            }) {
                None => cancelled += 1,
                Some(Ok(())) => fitted += 1,
                Some(Err(e)) => {
                    log::warn!("Cannot fit nucleus {i}: {e}");
                    errors.push((i, e));
                }
            }
        }
        if cancelled > 0 {
            log::info!("Segmentation cancelled, {cancelled} nuclei keep their previous segments");
        }

        match ProfileOffsetter::new(dataset.options().offset).recalculate_verticals(dataset) {
            Ok(e) => errors.extend(e.into_iter().map(|(i, e)| (i, CellError::Offset(e)))),
            Err(e) => log::warn!("Cannot recalculate landmarks: {e}"),
        }

        let mut validator = DatasetValidator::new();
        let valid = validator.validate(dataset);
        log::info!("{}", validator.summary());
        Ok(SegmentationReport {
            mode: self.mode,
            fitted,
            skipped,
            cancelled: cancelled > 0 || self.is_cancelled(),
            errors,
            validation_errors: validator.errors().to_vec(),
            error_cells: validator.error_cells().to_vec(),
            valid,
        })
    }

    /// 细胞核是否需要在本次运行中拟合.
    ///
    /// 新模板下旧分段全部失效, 因此 NEW 与 COPY 模式忽略锁定; 锁定只在细化时生效.
    fn needs_fit(&self, nucleus: &Nucleus, template: &SegmentedProfile) -> bool {
        if !nucleus.has_profiles() {
            return false;
        }
        match self.mode {
            SegmentationMode::New | SegmentationMode::CopyFrom => true,
            SegmentationMode::Refine => {
                !nucleus.is_locked()
                    && (nucleus.is_stale()
                        || nucleus.segments().map_or(true, |s| {
                            !s.iter().map(|s| s.id()).eq(template.segment_ids())
                        }))
            }
        }
    }
}

/// 由群体代表 profile 生成新模板, 写入群体聚合.
fn new_template(dataset: &mut Dataset) -> DatasetResult<SegmentedProfile> {
    let profiles: Vec<Profile> = dataset
        .nuclei()
        .iter()
        .filter(|c| c.has_profiles())
        .filter_map(|c| c.profile(ProfileType::Angle, &Landmark::ReferencePoint).ok())
        .collect();
    let options = *dataset.options();
    let medoid = RepresentativeMedianFinder::new(&profiles, options.median).find_median()?;
    let template = ProfileSegmenter::new(options.segmenter).segment_profile(&medoid)?;

    let collection = dataset.collection_mut();
    collection.clear_segments();
    collection.add_segments(template.ordered_segments().to_vec())?;
    collection.set_template(template.clone());
    Ok(template)
}

/// 复用已有模板; 没有模板时由群体中位 profile 与分段模式构造.
fn refine_template(dataset: &mut Dataset) -> DatasetResult<SegmentedProfile> {
    if let Some(t) = dataset.collection().template() {
        return Ok(t.clone());
    }
    let collection = dataset.collection_mut();
    if !collection.has_segments() {
        return Err(DatasetError::NoTemplate);
    }
    let template =
        collection.segmented_profile(ProfileType::Angle, &Landmark::ReferencePoint, Statistic::Median)?;
    collection.set_template(template.clone());
    Ok(template)
}

/// 把 `source` 的模板, 分段模式与非参考点标志点复制到数据集的群体聚合.
///
/// 标志点下标按两者的聚合长度比例换算.
fn copy_template(
    dataset: &mut Dataset,
    source: &ProfileCollection,
) -> DatasetResult<SegmentedProfile> {
    let template = match source.template() {
        Some(t) => t.clone(),
        None if source.has_segments() => source.segmented_profile(
            ProfileType::Angle,
            &Landmark::ReferencePoint,
            Statistic::Median,
        )?,
        None => return Err(DatasetError::NoTemplate),
    };

    let collection = dataset.collection_mut();
    let (from, to) = (source.length(), collection.length());
    collection.clear_segments();
    collection.add_segments(template.ordered_segments().to_vec())?;
    if from > 0 {
        for (landmark, index) in source.landmarks() {
            if !landmark.is_reference() {
                let scaled = (index as f64 * to as f64 / from as f64).round() as usize % to;
                collection.set_landmark_index(landmark.clone(), scaled);
            }
        }
    }
    collection.set_template(template.clone());
    log::info!(
        "Copied a {}-segment template into {}",
        template.segment_count(),
        dataset.name()
    );
    Ok(template)
}
