//! 基于密度的聚类 (DBSCAN).

use super::{check_samples, mean_of_rows, most_common, squared_distance, ConsensusAlgorithm};
use crate::consts::{DBSCAN_EPS, DBSCAN_MIN_SAMPLES};
use crate::GtResult;
use ndarray::{Array1, ArrayView2};

/// DBSCAN 参数.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DbscanParams {
    /// 邻域半径 (欧氏距离, 包含边界).
    pub eps: f64,

    /// 成为核心点所需的邻居个数 (包括自身).
    pub min_samples: usize,
}

impl Default for DbscanParams {
    fn default() -> Self {
        Self {
            eps: DBSCAN_EPS,
            min_samples: DBSCAN_MIN_SAMPLES,
        }
    }
}

/// DBSCAN 共识: 取成员最多的簇的均值.
///
/// 所有点都是噪声时, 退化为只含第 0 行的 "簇".
#[derive(Copy, Clone, Debug, Default)]
pub struct Dbscan {
    params: DbscanParams,
}

impl Dbscan {
    /// 以给定参数初始化.
    #[inline]
    pub fn new(params: DbscanParams) -> Self {
        Self { params }
    }

    /// 聚类. 返回每行的簇号, 噪声为 `None`. 簇号按首个核心点的行顺序分配.
    pub fn fit(&self, data: ArrayView2<f64>) -> Vec<Option<usize>> {
        let n = data.nrows();
        let eps2 = self.params.eps * self.params.eps;

        let neighbours: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&j| squared_distance(data.row(i), data.row(j)) <= eps2)
                    .collect()
            })
            .collect();
        let is_core: Vec<bool> = neighbours
            .iter()
            .map(|v| v.len() >= self.params.min_samples)
            .collect();

        let mut labels = vec![None; n];
        let mut cluster = 0;
        let mut stack = Vec::with_capacity(n);
        for seed in 0..n {
            if labels[seed].is_some() || !is_core[seed] {
                continue;
            }
            stack.push(seed);
            while let Some(p) = stack.pop() {
                if labels[p].is_some() {
                    continue;
                }
                labels[p] = Some(cluster);
                if is_core[p] {
                    stack.extend(neighbours[p].iter().filter(|&&q| labels[q].is_none()));
                }
            }
            cluster += 1;
        }
        labels
    }
}

impl ConsensusAlgorithm for Dbscan {
    fn name(&self) -> &'static str {
        "dbscan"
    }

    fn ground_truth(&self, data: ArrayView2<f64>) -> GtResult<Array1<f64>> {
        check_samples(data)?;
        let labels = self.fit(data);

        let members: Vec<usize> = match most_common(labels.iter().flatten().copied()) {
            Some(best) => labels
                .iter()
                .enumerate()
                .filter_map(|(i, l)| (*l == Some(best)).then_some(i))
                .collect(),
            None => {
                log::debug!("dbscan: every sample is noise, falling back to row 0");
                vec![0]
            }
        };
        Ok(mean_of_rows(data, &members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::tests::{assert_vec_eq, majority_sample};
    use ndarray::arr2;

    #[test]
    fn test_dbscan_majority_cluster() {
        let gt = Dbscan::default()
            .ground_truth(majority_sample().view())
            .unwrap();
        assert_vec_eq(&gt, &[1.0, 1.0, 0.0, 0.0], 1e-5);
    }

    #[test]
    fn test_dbscan_labels() {
        let labels = Dbscan::default().fit(majority_sample().view());
        assert_eq!(
            labels,
            vec![Some(0), Some(0), Some(1), Some(1), Some(1)]
        );
    }

    #[test]
    fn test_dbscan_all_noise_falls_back_to_first_row() {
        let data = arr2(&[[0.0, 0.0], [5.0, 5.0], [10.0, 10.0]]);
        let dbscan = Dbscan::default();
        assert!(dbscan.fit(data.view()).iter().all(Option::is_none));
        assert_vec_eq(&dbscan.ground_truth(data.view()).unwrap(), &[0.0, 0.0], 1e-12);
    }

    #[test]
    fn test_dbscan_tie_takes_first_cluster() {
        let data = arr2(&[[3.0, 3.0], [3.1, 3.0], [0.0, 0.0], [0.0, 0.1]]);
        assert_vec_eq(
            &Dbscan::default().ground_truth(data.view()).unwrap(),
            &[3.05, 3.0],
            1e-9,
        );
    }

    #[test]
    fn test_dbscan_chain_of_border_points() {
        // 0.4 间隔的点链被密度连接成一个簇.
        let data = arr2(&[[0.0], [0.4], [0.8], [1.2], [9.0]]);
        let labels = Dbscan::default().fit(data.view());
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), Some(0), None]);
        assert_vec_eq(
            &Dbscan::default().ground_truth(data.view()).unwrap(),
            &[0.6],
            1e-9,
        );
    }
}
