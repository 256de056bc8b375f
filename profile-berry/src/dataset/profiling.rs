//! 数据集 profile 计算.

use super::border::derive_profile;
use super::error::{CellError, DatasetError, DatasetResult};
use super::options::ProfilingOptions;
use super::{Dataset, Nucleus};
use crate::consts::MAX_COERCION_ATTEMPTS;
use crate::data::{Landmark, Profile, ProfileCollection, ProfileType, Statistic};
use crate::rules::{ProfileIndexFinder, RuleSetCollection};
use std::collections::BTreeMap;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;
    }
}

/// profile 计算结果统计.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfilingReport {
    /// 成功计算 profile 的细胞核个数.
    pub profiled: usize,

    /// 细胞核上的失败 (细胞核下标, 错误). 参考点无法解析的细胞核仍然计入 `profiled`.
    pub errors: Vec<(usize, CellError)>,

    /// 群体聚合长度.
    pub length: usize,

    /// 参考点强制对齐实际进行的轮数.
    pub coercion_rounds: usize,
}

/// 数据集 profile 计算流程.
///
/// 1. 每个细胞核 (并行): 由轮廓计算全部种类的 profile, 用规则解析参考点与其它标志点;
///    参考点无法解析时记录错误并退回轮廓下标 0;
/// 2. 用参考点对齐的 profile 构造群体聚合, 长度取原生长度的中位数;
/// 3. 参考点强制对齐: 每个细胞核的参考点移到与中位 profile 最吻合的位置,
///    重复到不再移动或达到轮数上限;
/// 4. 在中位 profile 上解析群体标志点; 所有细胞核标记为需要重新拟合.
#[derive(Copy, Clone, Debug, Default)]
pub struct DatasetProfilingMethod;

impl DatasetProfilingMethod {
    /// 构造.
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// 对整个数据集运行.
    ///
    /// 数据集为空, 或没有任何细胞核成功计算 profile 时返回错误.
    pub fn run(&self, dataset: &mut Dataset) -> DatasetResult<ProfilingReport> {
        if dataset.is_empty() {
            return Err(DatasetError::EmptyDataset);
        }
        let (nuclei, collection, rules, options) = dataset.parts_mut();
        let profiling = options.profiling;

        let per_cell = |(i, nucleus): (usize, &mut Nucleus)| {
            profile_nucleus(nucleus, rules, &profiling)
                .into_iter()
                .map(move |e| (i, e))
                .collect::<Vec<_>>()
        };
        #[cfg(feature = "rayon")]
        let errors: Vec<(usize, CellError)> = nuclei
            .par_iter_mut()
            .enumerate()
            .flat_map_iter(per_cell)
            .collect();
        #[cfg(not(feature = "rayon"))]
        let errors: Vec<(usize, CellError)> =
            nuclei.iter_mut().enumerate().flat_map(per_cell).collect();
        for (i, e) in errors.iter() {
            log::warn!("Nucleus {i}: {e}");
        }

        let profiled = nuclei.iter().filter(|c| c.has_profiles()).count();
        if profiled == 0 {
            return Err(DatasetError::NotProfiled);
        }
        let length = median_length(nuclei);
        rebuild_aggregates(nuclei, collection, length)?;

        let mut coercion_rounds = 0;
        while coercion_rounds < MAX_COERCION_ATTEMPTS {
            let median = collection.profile(
                ProfileType::Angle,
                &Landmark::ReferencePoint,
                Statistic::Median,
            )?;
            let moved = coerce_reference_points(nuclei, &median);
            if moved == 0 {
                break;
            }
            coercion_rounds += 1;
            log::debug!("Coercion round {coercion_rounds} moved {moved} reference points");
            rebuild_aggregates(nuclei, collection, length)?;
        }

        assign_collection_landmarks(collection, rules)?;
        nuclei.iter_mut().for_each(Nucleus::mark_stale);

        log::info!(
            "Profiled {profiled} of {} nuclei at length {length} ({} errors, {coercion_rounds} coercion rounds)",
            nuclei.len(),
            errors.len()
        );
        Ok(ProfilingReport {
            profiled,
            errors,
            length,
            coercion_rounds,
        })
    }
}

/// 计算单个细胞核的 profile 与标志点, 返回其上的全部错误.
fn profile_nucleus(
    nucleus: &mut Nucleus,
    rules: &RuleSetCollection,
    options: &ProfilingOptions,
) -> Vec<CellError> {
    let n = nucleus.border_len();
    if n < options.min_border_points() {
        return vec![CellError::TooFewBorderPoints {
            found: n,
            required: options.min_border_points(),
        }];
    }
    let window = options.angle_window(n);
    for t in ProfileType::ALL {
        let derived = derive_profile(nucleus.border(), t, window)
            .ok_or(CellError::MissingProfile(t))
            .and_then(|p| nucleus.set_raw_profile(t, p));
        if let Err(e) = derived {
            return vec![e];
        }
    }

    let mut errors = Vec::new();
    let rp = match rules.get(&Landmark::ReferencePoint) {
        Some(sets) => ProfileIndexFinder::identify_index_in(|t| nucleus.raw_profile(t), sets),
        None => Ok(0),
    };
    let rp = rp.unwrap_or_else(|e| {
        errors.push(CellError::Rule(e));
        0
    });
    nucleus.set_landmark(Landmark::ReferencePoint, rp);

    let indexed: BTreeMap<ProfileType, Profile> = ProfileType::ALL
        .into_iter()
        .filter_map(|t| {
            nucleus
                .profile(t, &Landmark::ReferencePoint)
                .ok()
                .map(|p| (t, p))
        })
        .collect();
    for landmark in rules.landmarks().filter(|l| !l.is_reference()) {
        let Some(sets) = rules.get(landmark) else {
            continue;
        };
        match ProfileIndexFinder::identify_index_in(|t| indexed.get(&t), sets) {
            Ok(i) => nucleus.set_landmark(landmark.clone(), rp + i),
            Err(e) => errors.push(CellError::Rule(e)),
        }
    }
    errors
}

/// 已计算 profile 的细胞核的原生长度 (下) 中位数.
fn median_length(nuclei: &[Nucleus]) -> usize {
    let mut lengths: Vec<usize> = nuclei
        .iter()
        .filter(|c| c.has_profiles())
        .map(Nucleus::border_len)
        .collect();
    lengths.sort_unstable();
    lengths.get((lengths.len().max(1) - 1) / 2).copied().unwrap_or(0)
}

/// 用参考点对齐的 profile 重建全部种类的群体聚合.
fn rebuild_aggregates(
    nuclei: &[Nucleus],
    collection: &mut ProfileCollection,
    length: usize,
) -> DatasetResult<()> {
    for t in ProfileType::ALL {
        let profiles: Vec<Profile> = nuclei
            .iter()
            .filter(|c| c.has_profiles())
            .filter_map(|c| c.profile(t, &Landmark::ReferencePoint).ok())
            .collect();
        collection.rebuild(t, &profiles, length)?;
    }
    Ok(())
}

/// 把每个细胞核的参考点移到与 `median` 最吻合的位置, 返回移动的个数.
fn coerce_reference_points(nuclei: &mut [Nucleus], median: &Profile) -> usize {
    let coerce = |nucleus: &mut Nucleus| -> usize {
        let (Ok(profile), Ok(rp)) = (
            nucleus.profile(ProfileType::Angle, &Landmark::ReferencePoint),
            nucleus.border_index(&Landmark::ReferencePoint),
        ) else {
            return 0;
        };
        let n = profile.len();
        let k = median.best_fit_offset(&profile, None);
        let native = (k as f64 * n as f64 / median.len() as f64).round() as usize % n;
        if native == 0 {
            return 0;
        }
        nucleus.set_landmark(Landmark::ReferencePoint, rp + native);
        1
    };
    #[cfg(feature = "rayon")]
    let moved = nuclei.par_iter_mut().map(coerce).sum();
    #[cfg(not(feature = "rayon"))]
    let moved = nuclei.iter_mut().map(coerce).sum();
    moved
}

/// 在群体中位 profile 上解析参考点以外的标志点.
fn assign_collection_landmarks(
    collection: &mut ProfileCollection,
    rules: &RuleSetCollection,
) -> DatasetResult<()> {
    let medians: BTreeMap<ProfileType, Profile> = ProfileType::ALL
        .into_iter()
        .map(|t| {
            collection
                .profile(t, &Landmark::ReferencePoint, Statistic::Median)
                .map(|p| (t, p))
        })
        .collect::<Result<_, _>>()?;
    for landmark in rules.landmarks().filter(|l| !l.is_reference()) {
        let Some(sets) = rules.get(landmark) else {
            continue;
        };
        match ProfileIndexFinder::identify_index_in(|t| medians.get(&t), sets) {
            Ok(i) => collection.set_landmark_index(landmark.clone(), i),
            Err(e) => log::warn!("Cannot place {landmark} on the median profile: {e}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point2d;
    use std::f64::consts::PI;

    /// 泪滴形, 尖角位于参数 0 处, 点序逆时针.
    fn teardrop(n: usize, scale: f64, center: Point2d, phase: usize) -> Vec<Point2d> {
        (0..n)
            .map(|i| {
                let t = 2.0 * PI * ((i + phase) % n) as f64 / n as f64;
                let (x, y) = (t.cos(), t.sin() * (t / 2.0).sin());
                (center.0 + scale * x, center.1 + scale * y)
            })
            .collect()
    }

    /// 空数据集与全部失败的数据集.
    #[test]
    fn test_profiling_errors() {
        let mut empty = Dataset::new("empty", vec![]);
        assert_eq!(
            DatasetProfilingMethod::new().run(&mut empty),
            Err(DatasetError::EmptyDataset)
        );
        let mut tiny = Dataset::new("tiny", vec![Nucleus::new(0, vec![(0.0, 0.0), (1.0, 1.0)])]);
        assert_eq!(
            DatasetProfilingMethod::new().run(&mut tiny),
            Err(DatasetError::NotProfiled)
        );
    }

    /// 相同形状的细胞核解析到相同的参考点, 中位 profile 等于任一实例.
    #[test]
    fn test_profiling_identical_shapes() {
        let nuclei = (0..5)
            .map(|i| Nucleus::new(i, teardrop(120, 20.0, (i as f64 * 50.0, 3.0), 7 * i as usize)))
            .collect();
        let mut ds = Dataset::new("same", nuclei);
        let report = DatasetProfilingMethod::new().run(&mut ds).unwrap();
        assert_eq!(report.profiled, 5);
        assert_eq!(report.length, 120);
        assert_eq!(report.coercion_rounds, 0);
        assert!(report.errors.is_empty(), "{:?}", report.errors);

        let median = ds
            .collection()
            .profile(ProfileType::Angle, &Landmark::ReferencePoint, Statistic::Median)
            .unwrap();
        for c in ds.nuclei() {
            assert!(c.is_stale());
            let p = c.profile(ProfileType::Angle, &Landmark::ReferencePoint).unwrap();
            assert!(p.iter().zip(median.iter()).all(|(a, b)| (a - b).abs() < 1e-4));
        }
        assert!(ds
            .collection()
            .landmark_index(&Landmark::OrientationPoint)
            .is_some());
    }

    /// 轮廓点过少的细胞核被跳过, 其余照常.
    #[test]
    fn test_profiling_skips_small_nuclei() {
        let nuclei = vec![
            Nucleus::new(0, teardrop(80, 10.0, (0.0, 0.0), 0)),
            Nucleus::new(1, vec![(0.0, 0.0), (1.0, 0.0)]),
        ];
        let mut ds = Dataset::new("mixed", nuclei);
        let report = DatasetProfilingMethod::new().run(&mut ds).unwrap();
        assert_eq!(report.profiled, 1);
        assert_eq!(
            report.errors,
            vec![(
                1,
                CellError::TooFewBorderPoints {
                    found: 2,
                    required: 3
                }
            )]
        );
        assert_eq!(ds.collection().count(), 1);
    }
}
