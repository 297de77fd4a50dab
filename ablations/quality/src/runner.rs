//! 程序运行函数.

use crate::result::{AblationResult, Profile};
use gt_berry::consensus::{GaussianMixtureParams, KMeansParams};
use gt_berry::prelude::*;
use std::thread;
use std::time::Instant;
use utils::loader;

/// 以 `algorithm` 生成真值并评估所有标注者.
fn profile(algorithm: &dyn ConsensusAlgorithm, elements: &[LabelElement]) -> Profile {
    let start = Instant::now();
    let ground_truth = DatasetGenerator::new(algorithm)
        .generate(elements)
        .unwrap_or_else(|e| panic!("`{}` generation error: {e}", algorithm.name()));
    let generation = start.elapsed();

    let start = Instant::now();
    let users = users_of(elements);
    let report =
        compute_specificity_and_sensitivity_for_users(algorithm, &users, elements, &ground_truth)
            .unwrap_or_else(|e| panic!("`{}` evaluation error: {e}", algorithm.name()));
    let evaluation = start.elapsed();

    Profile {
        slices: ground_truth.len(),
        with_consensus: ground_truth.with_consensus(),
        generation,
        evaluation,
        time_vs_score: labeling_time_vs_score(elements, &report),
        report,
    }
}

/// 实际运行.
pub fn run() -> AblationResult {
    let (source, elements) = loader::elements_from_env_or_synthetic();
    assert!(!elements.is_empty(), "No label elements from {source:?}");
    log::info!("loaded {} elements from {source:?}", elements.len());

    let seed = loader::seed_from_env();
    let majority = MajorityVoting;
    let dbscan = Dbscan::default();
    let kmeans = KMeans::new(KMeansParams {
        seed,
        ..Default::default()
    });
    let gmm = GaussianMixture::new(GaussianMixtureParams {
        seed,
        ..Default::default()
    });
    let algorithms: [&dyn ConsensusAlgorithm; 4] = [&majority, &dbscan, &kmeans, &gmm];

    println!(
        "Running ablation studies on {} cores...",
        utils::cpus()
    );
    let elements = elements.as_slice();
    thread::scope(|s| {
        let handles = algorithms.map(|a| s.spawn(move || profile(a, elements)));

        AblationResult::from_iter(
            algorithms.map(|a| a.name()).into_iter().zip(
                handles
                    .into_iter()
                    .map(|th| th.join().expect("Thread joining error")),
            ),
        )
    })
}
