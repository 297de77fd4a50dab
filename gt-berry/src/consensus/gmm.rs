//! 球形协方差高斯混合模型, 以 BIC 自动选择分量数.

use super::kmeans::{KMeans, KMeansParams};
use super::{check_samples, squared_distance, ConsensusAlgorithm};
use crate::consts::DEFAULT_SEED;
use crate::GtResult;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use std::f64::consts::PI;

/// 高斯混合模型参数.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GaussianMixtureParams {
    /// EM 的最大迭代次数.
    pub max_iter: usize,

    /// 平均对数似然的变化小于该值时视为收敛.
    pub tol: f64,

    /// 加到每个方差上的正则项, 保证方差为正.
    pub reg_covar: f64,

    /// 初始化所用 K-Means 的随机种子.
    pub seed: u64,
}

impl Default for GaussianMixtureParams {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tol: 1e-3,
            reg_covar: 1e-6,
            seed: DEFAULT_SEED,
        }
    }
}

/// 一次拟合得到的混合模型.
#[derive(Clone, Debug)]
pub struct MixtureFit {
    /// 各分量权重, 和为 1.
    pub weights: Array1<f64>,

    /// `k * d` 的分量均值.
    pub means: Array2<f64>,

    /// 各分量的 (球形) 方差.
    pub variances: Array1<f64>,

    /// 训练数据的总对数似然.
    pub log_likelihood: f64,

    /// 样本个数.
    n: usize,
}

impl MixtureFit {
    /// 分量个数.
    #[inline]
    pub fn components(&self) -> usize {
        self.weights.len()
    }

    /// 自由参数个数: 均值 `k * d`, 方差 `k`, 权重 `k - 1`.
    pub fn free_parameters(&self) -> usize {
        let k = self.components();
        k * self.means.ncols() + k + (k - 1)
    }

    /// 贝叶斯信息准则 `-2 * log L + p * ln(n)`. 越小越好.
    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood + self.free_parameters() as f64 * (self.n as f64).ln()
    }

    /// 权重最大的分量 (并列时取编号最小者).
    pub fn heaviest(&self) -> usize {
        let mut best = 0;
        for (c, &w) in self.weights.iter().enumerate() {
            if w > self.weights[best] {
                best = c;
            }
        }
        best
    }
}

/// 高斯混合共识: 以 BIC 选出分量数, 取权重最大分量的均值.
#[derive(Copy, Clone, Debug, Default)]
pub struct GaussianMixture {
    params: GaussianMixtureParams,
}

impl GaussianMixture {
    /// 以给定参数初始化.
    #[inline]
    pub fn new(params: GaussianMixtureParams) -> Self {
        Self { params }
    }

    /// 以 `k` 个球形分量拟合 `data`. `1 <= k <= n`, 否则程序 panic.
    ///
    /// 初始责任度来自同一种子下的 K-Means 划分.
    pub fn fit(&self, data: ArrayView2<f64>, k: usize) -> MixtureFit {
        let n = data.nrows();
        let kmeans = KMeans::new(KMeansParams {
            seed: self.params.seed,
            n_init: 1,
            ..Default::default()
        });
        let init = kmeans.fit(data, k);
        let mut resp = Array2::<f64>::zeros((n, k));
        for (i, &l) in init.labels.iter().enumerate() {
            resp[(i, l)] = 1.0;
        }

        let mut fit = self.m_step(data, resp.view());
        let mut lower_bound = f64::NEG_INFINITY;
        let mut converged = false;
        for _ in 0..self.params.max_iter {
            let (log_norm, new_resp) = e_step(data, &fit);
            let mean_ll = log_norm / n as f64;
            fit = self.m_step(data, new_resp.view());
            if (mean_ll - lower_bound).abs() < self.params.tol {
                converged = true;
                break;
            }
            lower_bound = mean_ll;
        }
        if !converged {
            log::warn!(
                "gaussian mixture (k = {k}) did not converge in {} iterations",
                self.params.max_iter
            );
        }

        fit.log_likelihood = e_step(data, &fit).0;
        fit
    }

    /// 由责任度 `resp` 估计权重、均值与方差.
    fn m_step(&self, data: ArrayView2<f64>, resp: ArrayView2<f64>) -> MixtureFit {
        let (n, d) = data.dim();
        let nk = resp.sum_axis(Axis(0)) + 10.0 * f64::EPSILON;
        let means = &resp.t().dot(&data) / &nk.view().insert_axis(Axis(1));

        let variances = Array1::from_shape_fn(nk.len(), |c| {
            let spread: f64 = (0..n)
                .map(|i| resp[(i, c)] * squared_distance(data.row(i), means.row(c)))
                .sum();
            spread / (nk[c] * d as f64) + self.params.reg_covar
        });
        let weights = &nk / n as f64;

        MixtureFit {
            weights,
            means,
            variances,
            log_likelihood: f64::NEG_INFINITY,
            n,
        }
    }

    /// 对 `components = 1..=n` 依次拟合, BIC 第一次上升时取上一个分量数;
    /// 从不上升时取 `n`.
    pub fn choose_components(&self, data: ArrayView2<f64>) -> usize {
        let n = data.nrows();
        let mut prev_bic = f64::INFINITY;
        for components in 1..=n {
            let bic = self.fit(data, components).bic();
            if bic > prev_bic {
                return components - 1;
            }
            prev_bic = bic;
        }
        n
    }
}

/// E 步. 返回总对数似然与新的责任度.
fn e_step(data: ArrayView2<f64>, fit: &MixtureFit) -> (f64, Array2<f64>) {
    let (n, d) = data.dim();
    let k = fit.components();
    let mut log_prob = Array2::<f64>::zeros((n, k));
    for c in 0..k {
        let var = fit.variances[c];
        let log_weight = fit.weights[c].ln();
        let log_det = d as f64 * (2.0 * PI * var).ln();
        for i in 0..n {
            let dist = squared_distance(data.row(i), fit.means.row(c));
            log_prob[(i, c)] = -0.5 * (log_det + dist / var) + log_weight;
        }
    }

    let mut total = 0.0;
    for mut row in log_prob.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        let log_norm = max + row.iter().map(|v| (v - max).exp()).sum::<f64>().ln();
        total += log_norm;
        row.mapv_inplace(|v| (v - log_norm).exp());
    }
    (total, log_prob)
}

impl ConsensusAlgorithm for GaussianMixture {
    fn name(&self) -> &'static str {
        "gaussian-mixture"
    }

    fn requires_fixed_dimensionality(&self) -> bool {
        true
    }

    fn ground_truth(&self, data: ArrayView2<f64>) -> GtResult<Array1<f64>> {
        check_samples(data)?;
        let components = self.choose_components(data);
        let fit = self.fit(data, components);
        log::debug!(
            "gaussian mixture: chose {components} components, bic = {:.6}",
            fit.bic()
        );
        Ok(fit.means.row(fit.heaviest()).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::tests::{assert_vec_eq, f64_eq, majority_sample};
    use ndarray::arr2;

    #[test]
    fn test_gmm_majority_cluster() {
        let gmm = GaussianMixture::default();
        let data = majority_sample();
        assert_eq!(gmm.choose_components(data.view()), 2);
        let gt = gmm.ground_truth(data.view()).unwrap();
        assert_vec_eq(&gt, &[1.0, 1.0, 0.0, 0.0], 1e-5);
    }

    #[test]
    fn test_gmm_single_component_is_mean() {
        let data = majority_sample();
        let fit = GaussianMixture::default().fit(data.view(), 1);
        assert!(f64_eq(fit.weights[0], 1.0, 1e-9));
        assert_vec_eq(&fit.means.row(0).to_owned(), &[0.6, 0.6, 0.4, 0.4], 1e-9);
        // 4.8 / (5 * 4) + reg_covar
        assert!(f64_eq(fit.variances[0], 0.24 + 1e-6, 1e-9));
        assert_eq!(fit.free_parameters(), 5);
    }

    #[test]
    fn test_gmm_weights_sum_to_one() {
        let data = arr2(&[
            [0.0, 0.0],
            [0.2, 0.1],
            [0.1, 0.3],
            [5.0, 5.0],
            [5.2, 5.1],
            [9.0, 0.0],
        ]);
        let fit = GaussianMixture::default().fit(data.view(), 3);
        assert!(f64_eq(fit.weights.sum(), 1.0, 1e-9));
        assert!(fit.variances.iter().all(|&v| v > 0.0));
        assert!(fit.log_likelihood.is_finite());
    }

    #[test]
    fn test_gmm_seeded_is_reproducible() {
        let data = arr2(&[[0.0, 1.0], [0.3, 0.2], [0.9, 0.4], [0.5, 0.5], [0.1, 0.8]]);
        let gmm = GaussianMixture::new(GaussianMixtureParams {
            seed: 11,
            ..Default::default()
        });
        assert_eq!(
            gmm.ground_truth(data.view()).unwrap(),
            gmm.ground_truth(data.view()).unwrap()
        );
    }
}
