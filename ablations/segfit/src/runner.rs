//! 程序运行函数.

use crate::result::AblationResult;
use profile_berry::prelude::*;
use std::thread;
use utils::synthetic::SyntheticConfig;

/// 实际运行.
pub fn run() -> AblationResult {
    let config = SyntheticConfig::from_env_or_default();
    log::info!("Synthetic population: {config:?}, {} cpus", utils::cpus());

    let mut dataset = config.dataset("segfit");
    let profiling = DatasetProfilingMethod::new()
        .run(&mut dataset)
        .expect("Profiling error");
    log::info!(
        "Profiled {} nuclei ({} errors), median length {}",
        profiling.profiled,
        profiling.errors.len(),
        profiling.length
    );

    let report = DatasetSegmentationMethod::new(SegmentationMode::New)
        .run(&mut dataset)
        .expect("Segmentation error");
    assert!(report.valid, "{:?}", report.validation_errors);
    let template = dataset
        .collection()
        .template()
        .expect("No template after segmentation")
        .clone();

    println!("Running ablation studies...");
    let (ds, t) = (&dataset, &template);
    thread::scope(|s| {
        use super::algos::*;

        let handles = [proportional, iterative].map(|f| s.spawn(move || f(ds, t)));

        AblationResult::from_iter(
            ["proportional", "iterative"].into_iter().zip(
                handles
                    .into_iter()
                    .map(|th| th.join().expect("Thread joining error")),
            ),
        )
    })
}
