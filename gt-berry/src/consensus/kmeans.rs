//! K-Means 聚类, 以肘部法则自动选择簇数.

use super::{check_samples, mean_variance, most_common, squared_distance, ConsensusAlgorithm};
use crate::consts::{DEFAULT_SEED, MAX_NUMBER_OF_CLUSTERS};
use crate::GtResult;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// K-Means 参数.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KMeansParams {
    /// 肘部法则搜索的最大簇数. 实际上限为 `min(max_clusters, n)`.
    pub max_clusters: usize,

    /// 以不同初始中心重复运行的次数, 取惯性最小者.
    pub n_init: usize,

    /// 单次运行的最大迭代次数.
    pub max_iter: usize,

    /// 相对容差: 中心移动量 (平方和) 不超过 `tol * 逐列方差均值` 时视为收敛.
    pub tol: f64,

    /// 随机种子. 同一种子下结果可复现.
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            max_clusters: MAX_NUMBER_OF_CLUSTERS,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: DEFAULT_SEED,
        }
    }
}

/// 一次 K-Means 拟合的结果.
#[derive(Clone, Debug)]
pub struct KMeansFit {
    /// `k * d` 的簇中心.
    pub centroids: Array2<f64>,

    /// 每行所属的簇.
    pub labels: Vec<usize>,

    /// 惯性: 各点到其最近中心的距离平方和.
    pub inertia: f64,
}

/// K-Means 共识: 以肘部法则选出 `k`, 取成员最多的簇的中心.
#[derive(Copy, Clone, Debug, Default)]
pub struct KMeans {
    params: KMeansParams,
}

impl KMeans {
    /// 以给定参数初始化.
    #[inline]
    pub fn new(params: KMeansParams) -> Self {
        Self { params }
    }

    /// 以 `k` 个簇拟合 `data`. `1 <= k <= n`, 否则程序 panic.
    ///
    /// 每次调用都从 `seed` 重新开始, 因此相同输入得到相同结果.
    pub fn fit(&self, data: ArrayView2<f64>, k: usize) -> KMeansFit {
        assert!(1 <= k && k <= data.nrows(), "簇数 {k} 越界");

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let tol = self.params.tol * mean_variance(data);

        let mut best: Option<KMeansFit> = None;
        for _ in 0..self.params.n_init.max(1) {
            let init = plus_plus_init(data, k, &mut rng);
            let fit = self.lloyd(data, init, tol);
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }
        best.unwrap_or_else(|| unreachable!("n_init >= 1"))
    }

    /// Lloyd 迭代. 空簇保留原中心.
    fn lloyd(&self, data: ArrayView2<f64>, mut centroids: Array2<f64>, tol: f64) -> KMeansFit {
        let (n, d) = data.dim();
        let k = centroids.nrows();
        let mut labels = vec![0; n];

        let mut converged = false;
        for _ in 0..self.params.max_iter {
            assign(data, centroids.view(), &mut labels);

            let mut sums = Array2::<f64>::zeros((k, d));
            let mut counts = vec![0usize; k];
            for (i, &l) in labels.iter().enumerate() {
                let mut row = sums.row_mut(l);
                row += &data.row(i);
                counts[l] += 1;
            }

            let mut shift = 0.0;
            for c in 0..k {
                if counts[c] == 0 {
                    continue;
                }
                let new = &sums.row(c) / counts[c] as f64;
                shift += squared_distance(new.view(), centroids.row(c));
                centroids.row_mut(c).assign(&new);
            }

            if shift <= tol {
                converged = true;
                break;
            }
        }
        if !converged {
            log::warn!(
                "k-means (k = {k}) did not converge in {} iterations",
                self.params.max_iter
            );
        }

        let inertia = assign(data, centroids.view(), &mut labels);
        KMeansFit {
            centroids,
            labels,
            inertia,
        }
    }

    /// 对 `k = 1..=min(max_clusters, n)` 逐一拟合并记录惯性, 以肘部法则选出 `k`.
    pub fn choose_k(&self, data: ArrayView2<f64>) -> usize {
        let max_k = self.params.max_clusters.min(data.nrows()).max(1);
        let inertias: Vec<f64> = (1..=max_k).map(|k| self.fit(data, k).inertia).collect();
        elbow(&inertias)
    }
}

/// 把每行分配给最近的中心 (并列时取编号最小者), 返回惯性.
fn assign(data: ArrayView2<f64>, centroids: ArrayView2<f64>, labels: &mut [usize]) -> f64 {
    let mut inertia = 0.0;
    for (i, label) in labels.iter_mut().enumerate() {
        let (c, dist) = nearest(data.row(i), centroids);
        *label = c;
        inertia += dist;
    }
    inertia
}

/// 最近中心的编号及距离平方.
fn nearest(x: ArrayView1<f64>, centroids: ArrayView2<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centre) in centroids.rows().into_iter().enumerate() {
        let dist = squared_distance(x, centre);
        if dist < best.1 {
            best = (c, dist);
        }
    }
    best
}

/// k-means++ 初始化: 第一个中心均匀抽取, 之后按到已有中心的距离平方加权抽取.
///
/// 所有点都与已有中心重合时 (不同点不足 `k` 个), 退化为均匀抽取.
fn plus_plus_init(data: ArrayView2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let (n, d) = data.dim();
    let mut centroids = Array2::<f64>::zeros((k, d));
    centroids.row_mut(0).assign(&data.row(rng.gen_range(0..n)));

    let mut closest: Vec<f64> = (0..n)
        .map(|i| squared_distance(data.row(i), centroids.row(0)))
        .collect();
    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut pick = n - 1;
            for (i, &w) in closest.iter().enumerate() {
                if target < w {
                    pick = i;
                    break;
                }
                target -= w;
            }
            pick
        } else {
            rng.gen_range(0..n)
        };
        centroids.row_mut(c).assign(&data.row(pick));
        for (i, dist) in closest.iter_mut().enumerate() {
            *dist = dist.min(squared_distance(data.row(i), centroids.row(c)));
        }
    }
    centroids
}

/// 肘部法则. `inertias[i]` 为 `k = i + 1` 时的惯性.
///
/// 记边际改进 `gain(k) = inertia(k - 1) - inertia(k)`. 返回第一个满足
/// `gain(k) > gain(k - 1)` 的 `k`; 不存在时返回最大的 `k`.
pub(crate) fn elbow(inertias: &[f64]) -> usize {
    let max_k = inertias.len();
    // 浮点噪声下的 "相等" 不算增加.
    let noise = inertias.first().copied().unwrap_or(0.0).abs() * 1e-12;

    let mut prev_gain: Option<f64> = None;
    for k in 2..=max_k {
        let gain = inertias[k - 2] - inertias[k - 1];
        if let Some(prev) = prev_gain {
            if gain > prev + noise {
                return k;
            }
        }
        prev_gain = Some(gain);
    }
    max_k
}

impl ConsensusAlgorithm for KMeans {
    fn name(&self) -> &'static str {
        "k-means"
    }

    fn requires_fixed_dimensionality(&self) -> bool {
        true
    }

    fn ground_truth(&self, data: ArrayView2<f64>) -> GtResult<Array1<f64>> {
        check_samples(data)?;
        let k = self.choose_k(data);
        let fit = self.fit(data, k);
        log::debug!("k-means: chose k = {k}, inertia = {:.6}", fit.inertia);

        let Some(best) = most_common(fit.labels.iter().copied()) else {
            unreachable!("n >= 2 samples always have labels")
        };
        Ok(fit.centroids.row(best).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::tests::{assert_vec_eq, majority_sample};
    use ndarray::arr2;

    #[test]
    fn test_kmeans_majority_cluster() {
        let gt = KMeans::default()
            .ground_truth(majority_sample().view())
            .unwrap();
        assert_vec_eq(&gt, &[1.0, 1.0, 0.0, 0.0], 1e-5);
    }

    #[test]
    fn test_kmeans_two_blobs() {
        let data = arr2(&[
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [10.0, 10.0],
            [10.1, 10.0],
        ]);
        let fit = KMeans::default().fit(data.view(), 2);
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[1], fit.labels[2]);
        assert_eq!(fit.labels[3], fit.labels[4]);
        assert_ne!(fit.labels[0], fit.labels[3]);

        let big = fit.centroids.row(fit.labels[0]).to_owned();
        assert_vec_eq(&big, &[0.1 / 3.0, 0.1 / 3.0], 1e-9);
    }

    #[test]
    fn test_kmeans_seeded_is_reproducible() {
        let data = arr2(&[[0.0, 1.0], [0.3, 0.2], [0.9, 0.4], [0.5, 0.5], [0.1, 0.8]]);
        let km = KMeans::new(KMeansParams {
            seed: 7,
            ..Default::default()
        });
        assert_eq!(
            km.ground_truth(data.view()).unwrap(),
            km.ground_truth(data.view()).unwrap()
        );
        assert!(km.requires_fixed_dimensionality());
    }

    #[test]
    fn test_kmeans_k_bounded_by_samples() {
        let data = arr2(&[[0.0], [1.0]]);
        let k = KMeans::default().choose_k(data.view());
        assert!((1..=2).contains(&k));
    }

    #[test]
    fn test_elbow() {
        // gain: 6, 2, 1 -> 从不增加, 取最大 k.
        assert_eq!(elbow(&[10.0, 4.0, 2.0, 1.0]), 4);
        // gain: 2, 5 -> k = 3 处开始增加.
        assert_eq!(elbow(&[10.0, 8.0, 3.0, 2.0]), 3);
        // 惯性在 k = 2 处已降为 0, 之后无改进.
        assert_eq!(elbow(&[4.8, 0.0, 0.0, 0.0, 0.0]), 5);
        assert_eq!(elbow(&[1.0]), 1);
    }
}
