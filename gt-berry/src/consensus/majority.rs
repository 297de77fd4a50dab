//! 多数投票.

use super::{check_samples, ConsensusAlgorithm};
use crate::GtResult;
use ndarray::{Array1, ArrayView2, Axis};

/// 多数投票: 所有行的逐列算术平均. 确定性, 无参数.
#[derive(Copy, Clone, Debug, Default)]
pub struct MajorityVoting;

impl ConsensusAlgorithm for MajorityVoting {
    fn name(&self) -> &'static str {
        "majority-voting"
    }

    fn ground_truth(&self, data: ArrayView2<f64>) -> GtResult<Array1<f64>> {
        check_samples(data)?;
        let Some(mean) = data.mean_axis(Axis(0)) else {
            unreachable!("checked non-empty above")
        };
        Ok(mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::tests::{assert_vec_eq, majority_sample};

    #[test]
    fn test_majority_voting() {
        let gt = MajorityVoting
            .ground_truth(majority_sample().view())
            .unwrap();
        assert_vec_eq(&gt, &[0.6, 0.6, 0.4, 0.4], 1e-12);
    }

    #[test]
    fn test_majority_voting_is_bit_identical() {
        let data = majority_sample();
        let a = MajorityVoting.ground_truth(data.view()).unwrap();
        let b = MajorityVoting.ground_truth(data.view()).unwrap();
        assert_eq!(a, b);
        assert!(!MajorityVoting.requires_fixed_dimensionality());
    }
}
