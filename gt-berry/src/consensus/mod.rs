//! 共识算法.
//!
//! 给定同一切片上所有标注的数值表示 (`n * d`, `n >= 2`), 求出一个代表性的
//! `d` 维向量作为该切片的真值. 算法由调用方以 trait 对象的形式提供.

mod dbscan;
mod gmm;
mod kmeans;
mod majority;

pub use dbscan::{Dbscan, DbscanParams};
pub use gmm::{GaussianMixture, GaussianMixtureParams};
pub use kmeans::{KMeans, KMeansParams};
pub use majority::MajorityVoting;

use crate::consts::MIN_ANNOTATIONS;
use crate::{GtError, GtResult};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

/// 共识算法.
pub trait ConsensusAlgorithm: Send + Sync {
    /// 算法名称, 用于日志与报告.
    fn name(&self) -> &'static str;

    /// 是否要求所有样本具有与切片大小无关的固定维度.
    ///
    /// 为 `true` 时, 上游解析器必须以 `resize = true` 转换链标注.
    fn requires_fixed_dimensionality(&self) -> bool {
        false
    }

    /// 从 `data` 的 `n` 行中求出共识向量.
    ///
    /// # 返回值
    ///
    /// - `n < 2` 时返回 `Err(GtError::NotEnoughSamples)`;
    /// - `d == 0` 时返回 `Err(GtError::EmptyFeatures)`;
    /// - 其他情况返回长度为 `d` 的向量.
    fn ground_truth(&self, data: ArrayView2<f64>) -> GtResult<Array1<f64>>;
}

/// 检查输入至少有 [`MIN_ANNOTATIONS`] 行且列数非零.
pub(crate) fn check_samples(data: ArrayView2<f64>) -> GtResult<()> {
    let (n, d) = data.dim();
    if n < MIN_ANNOTATIONS {
        return Err(GtError::NotEnoughSamples(n, MIN_ANNOTATIONS));
    }
    if d == 0 {
        return Err(GtError::EmptyFeatures);
    }
    Ok(())
}

/// 两个向量的欧氏距离平方.
#[inline]
pub(crate) fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(p, q)| (p - q) * (p - q)).sum()
}

/// 取 `rows` 所指各行的逐列平均. `rows` 不能为空.
pub(crate) fn mean_of_rows(data: ArrayView2<f64>, rows: &[usize]) -> Array1<f64> {
    debug_assert!(!rows.is_empty());
    let mut acc = Array1::<f64>::zeros(data.ncols());
    for &r in rows {
        acc += &data.row(r);
    }
    acc / rows.len() as f64
}

/// 在 `labels` 中出现次数最多的标签; 并列时取最先出现者.
pub(crate) fn most_common<I: IntoIterator<Item = usize>>(labels: I) -> Option<usize> {
    // (标签, 次数), 按首次出现的顺序.
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for l in labels {
        match counts.iter_mut().find(|(k, _)| *k == l) {
            Some((_, c)) => *c += 1,
            None => counts.push((l, 1)),
        }
    }
    let mut best: Option<(usize, usize)> = None;
    for (l, c) in counts {
        if best.map_or(true, |(_, bc)| c > bc) {
            best = Some((l, c));
        }
    }
    best.map(|(l, _)| l)
}

/// 逐列方差的均值, 用于把相对容差换算为绝对容差.
pub(crate) fn mean_variance(data: ArrayView2<f64>) -> f64 {
    data.var_axis(Axis(0), 0.0).mean().unwrap_or(0.0)
}
