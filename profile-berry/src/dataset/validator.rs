//! 数据集分段一致性校验.

use super::{Dataset, Nucleus};
use crate::data::{Landmark, SegmentId, SegmentedProfile};

/// 检查数据集中每个细胞核的分段是否与群体模板一致.
///
/// 对每个细胞核:
///
/// 1. 参考点与全部种类的 profile 已就绪;
/// 2. 群体有模板时, 细胞核已分段, 分段个数与有序 id 列表同模板一致;
/// 3. 分段首尾相接, 恰好覆盖整个轮廓;
/// 4. 多于一个分段时, 没有分段短于最短长度, 且有分段边界落在参考点上.
///
/// 校验本身不会失败, 所有问题都记录为错误描述.
#[derive(Clone, Debug, Default)]
pub struct DatasetValidator {
    errors: Vec<String>,
    error_cells: Vec<usize>,
    checked: usize,
}

impl DatasetValidator {
    /// 构造.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 校验 `dataset`, 全部通过时返回 `true`. 之前的结果会被清空.
    pub fn validate(&mut self, dataset: &Dataset) -> bool {
        self.errors.clear();
        self.error_cells.clear();
        self.checked = dataset.len();

        let collection = dataset.collection();
        let template = collection.template();
        let min = collection.min_length();
        for (i, nucleus) in dataset.nuclei().iter().enumerate() {
            let before = self.errors.len();
            self.check_nucleus(nucleus, template, min);
            if self.errors.len() > before {
                self.error_cells.push(i);
            }
        }
        self.errors.is_empty()
    }

    fn check_nucleus(&mut self, nucleus: &Nucleus, template: Option<&SegmentedProfile>, min: usize) {
        let id = nucleus.id();
        if !nucleus.has_reference_point() {
            self.errors
                .push(format!("Nucleus {id}: no {}", Landmark::ReferencePoint));
        }
        if !nucleus.has_profiles() {
            self.errors.push(format!("Nucleus {id}: profiles missing"));
        }
        let Some(template) = template else {
            return;
        };
        let Some(segments) = nucleus.segments() else {
            self.errors.push(format!("Nucleus {id}: not segmented"));
            return;
        };

        if segments.len() != template.segment_count() {
            self.errors.push(format!(
                "Nucleus {id}: has {} segments, template has {}",
                segments.len(),
                template.segment_count()
            ));
        } else {
            let own: Vec<SegmentId> = segments.iter().map(|s| s.id()).collect();
            if own != template.segment_ids() {
                self.errors
                    .push(format!("Nucleus {id}: segment ids differ from the template"));
            }
        }

        let n = nucleus.border_len();
        let k = segments.len();
        let covered: usize = segments.iter().map(|s| s.length()).sum();
        let contiguous = (0..k).all(|j| segments[j].end() == segments[(j + 1) % k].start());
        if segments.iter().any(|s| s.total() != n) || !contiguous || covered != n {
            self.errors.push(format!(
                "Nucleus {id}: segments do not cover the border exactly"
            ));
        }
        if k > 1 {
            for s in segments.iter().filter(|s| s.length() < min) {
                self.errors.push(format!(
                    "Nucleus {id}: segment {} is shorter than {min}",
                    s.id()
                ));
            }
            if segments.iter().all(|s| s.start() != 0) {
                self.errors.push(format!(
                    "Nucleus {id}: no segment boundary at the {}",
                    Landmark::ReferencePoint
                ));
            }
        }
    }

    /// 上次校验的错误描述.
    #[inline]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// 上次校验失败的细胞核下标.
    #[inline]
    pub fn error_cells(&self) -> &[usize] {
        &self.error_cells
    }

    /// 上次校验的一行总结.
    pub fn summary(&self) -> String {
        if self.error_cells.is_empty() {
            format!("All {} nuclei passed validation", self.checked)
        } else {
            format!(
                "{} of {} nuclei failed validation with {} errors",
                self.error_cells.len(),
                self.checked,
                self.errors.len()
            )
        }
    }
}
