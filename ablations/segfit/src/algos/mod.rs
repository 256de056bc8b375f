mod stats;

use profile_berry::prelude::*;

pub use stats::Stats;

/// 用 `fitter` 拟合 `dataset` 中的每个细胞核, 统计一致性, 拟合质量与耗时.
///
/// 拟合质量为 franken-profile 与模板 profile 的均方差, 越小越好.
fn run_fitter<F: SegmentFitter>(name: &str, fitter: &F, dataset: &Dataset) -> Stats {
    let mut stats = Stats::new();
    let template = fitter.template();
    let ids = template.segment_ids();
    for (i, nucleus) in dataset.nuclei().iter().enumerate() {
        let Ok(target) = nucleus.profile(ProfileType::Angle, &Landmark::ReferencePoint) else {
            log::debug!("{name}: nucleus {i} has no profile");
            continue;
        };

        stats.fit_start();
        let fitted = fitter.fit(&target);
        stats.fit_elapsed();

        match fitted {
            Ok(sp) => {
                let consistent = sp.segment_ids() == ids;
                let mismatch = sp
                    .franken_normalise(template)
                    .map(|p| p.square_difference(template.profile()) / template.len() as f64)
                    .unwrap_or(f64::NAN);
                stats.count_fitted(mismatch, consistent);
            }
            Err(e) => {
                log::warn!("{name}: nucleus {i}: {e}");
                stats.count_failed();
            }
        }
    }
    log::info!("{name}: done");
    stats.finish()
}

pub fn proportional(dataset: &Dataset, template: &SegmentedProfile) -> Stats {
    let fitter = ProportionalFitter::new(template.clone(), dataset.options().fitter);
    run_fitter("Proportional", &fitter, dataset)
}

pub fn iterative(dataset: &Dataset, template: &SegmentedProfile) -> Stats {
    let fitter = IterativeSegmentFitter::new(template.clone(), dataset.options().fitter);
    run_fitter("Iterative", &fitter, dataset)
}
