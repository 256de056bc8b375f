//! 数据集: 一组细胞核, 群体聚合与标志点规则, 以及作用于整个数据集的处理流程.
//!
//! 典型流程:
//!
//! 1. `DatasetProfilingMethod` 计算 profile, 解析标志点并构造群体聚合;
//! 2. `DatasetSegmentationMethod` 生成 (或复用) 模板并拟合到每个细胞核;
//! 3. `DatasetValidator` 检查分段在整个数据集上是否一致.

pub mod border;
mod error;
mod nucleus;
mod options;
mod profiling;
mod segmentation;
mod validator;

pub use error::{CellError, CellResult, DatasetError, DatasetResult};
pub use nucleus::Nucleus;
pub use options::{AnalysisOptions, ProfilingOptions};
pub use profiling::{DatasetProfilingMethod, ProfilingReport};
pub use segmentation::{DatasetSegmentationMethod, SegmentationMode, SegmentationReport};
pub use validator::DatasetValidator;

use crate::data::ProfileCollection;
use crate::rules::RuleSetCollection;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一组同类细胞核.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dataset {
    name: String,
    nuclei: Vec<Nucleus>,
    collection: ProfileCollection,
    rules: RuleSetCollection,
    options: AnalysisOptions,
}

impl Dataset {
    /// 使用圆形细胞核默认规则与默认参数构造.
    pub fn new<S: Into<String>>(name: S, nuclei: Vec<Nucleus>) -> Self {
        Self::with_rules(name, nuclei, RuleSetCollection::round(), AnalysisOptions::default())
    }

    /// 使用给定规则与参数构造.
    pub fn with_rules<S: Into<String>>(
        name: S,
        nuclei: Vec<Nucleus>,
        rules: RuleSetCollection,
        options: AnalysisOptions,
    ) -> Self {
        Self {
            name: name.into(),
            nuclei,
            collection: ProfileCollection::new(options.min_segment_length()),
            rules,
            options,
        }
    }

    /// 数据集名称.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 细胞核个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.nuclei.len()
    }

    /// 是否没有细胞核.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nuclei.is_empty()
    }

    /// 所有细胞核.
    #[inline]
    pub fn nuclei(&self) -> &[Nucleus] {
        &self.nuclei
    }

    /// 所有细胞核 (可变).
    #[inline]
    pub fn nuclei_mut(&mut self) -> &mut [Nucleus] {
        &mut self.nuclei
    }

    /// 追加细胞核. 新细胞核需要重新计算 profile.
    pub fn push(&mut self, nucleus: Nucleus) {
        self.nuclei.push(nucleus);
    }

    /// 群体聚合.
    #[inline]
    pub fn collection(&self) -> &ProfileCollection {
        &self.collection
    }

    /// 群体聚合 (可变).
    #[inline]
    pub fn collection_mut(&mut self) -> &mut ProfileCollection {
        &mut self.collection
    }

    /// 标志点规则.
    #[inline]
    pub fn rules(&self) -> &RuleSetCollection {
        &self.rules
    }

    /// 分析参数.
    #[inline]
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// 同时借出各组成部分, 细胞核与群体聚合可变.
    pub(crate) fn parts_mut(
        &mut self,
    ) -> (
        &mut [Nucleus],
        &mut ProfileCollection,
        &RuleSetCollection,
        &AnalysisOptions,
    ) {
        (
            &mut self.nuclei,
            &mut self.collection,
            &self.rules,
            &self.options,
        )
    }
}
