//! 标注者质量评估.
//!
//! 对范围内的每张切片:
//!
//! - 标注少于两个 (没有共识) 的切片是 **阴性** 样本. 标注者在其上没有标注
//!   即为真阴性 (TN);
//! - 其余切片是 **阳性** 样本. 标注者在其上的标注与共识的 IoU 大于
//!   [`IOU_THRESHOLD`] 即为真阳性 (TP).
//!
//! 于是灵敏度 = TP / 阳性, 特异度 = TN / 阴性, 得分 = `(灵敏度 + 特异度 - 1)^2`.
//! 得分在 "随机" 标注者处接近 0, 在完全一致的标注者处为 1.

use crate::consensus::ConsensusAlgorithm;
use crate::consts::{IOU_THRESHOLD, MIN_ANNOTATIONS};
use crate::dataset::{group_by_slice, GroundTruth};
use crate::parser::convert_one;
use crate::{GtError, GtResult, LabelElement, LabelId, UserId};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一位标注者在一次评估中的计数与指标.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UserQuality {
    /// 标注者.
    pub user: UserId,
    /// 有共识的切片数.
    pub positive: u32,
    /// 命中共识的切片数.
    pub true_positive: u32,
    /// 没有共识的切片数.
    pub negative: u32,
    /// 在没有共识的切片上正确放弃的次数.
    pub true_negative: u32,
}

impl UserQuality {
    #[inline]
    fn new(user: UserId) -> Self {
        Self {
            user,
            positive: 0,
            true_positive: 0,
            negative: 0,
            true_negative: 0,
        }
    }

    /// 灵敏度 `TP / 阳性`. 没有阳性切片时为 `0.0`.
    #[inline]
    pub fn sensitivity(&self) -> f64 {
        ratio(self.true_positive, self.positive)
    }

    /// 特异度 `TN / 阴性`. 没有阴性切片时为 `0.0`.
    #[inline]
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negative, self.negative)
    }

    /// 得分 `(灵敏度 + 特异度 - 1)^2`.
    #[inline]
    pub fn score(&self) -> f64 {
        (self.sensitivity() + self.specificity() - 1.0).powi(2)
    }
}

#[inline]
fn ratio(num: u32, den: u32) -> f64 {
    match den {
        0 => 0.0,
        den => num as f64 / den as f64,
    }
}

/// 一次评估的结果. 三个映射的键集合相同.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QualityReport {
    /// 特异度.
    pub specificity: HashMap<UserId, f64>,
    /// 灵敏度.
    pub sensitivity: HashMap<UserId, f64>,
    /// 得分.
    pub scores: HashMap<UserId, f64>,
    /// 原始计数, 按标注者排序.
    records: Vec<UserQuality>,
}

impl QualityReport {
    fn from_records(mut records: Vec<UserQuality>) -> Self {
        records.sort_by_key(|r| r.user);
        let mut report = Self::default();
        for r in records.iter() {
            report.specificity.insert(r.user, r.specificity());
            report.sensitivity.insert(r.user, r.sensitivity());
            report.scores.insert(r.user, r.score());
        }
        report.records = records;
        report
    }

    /// 按标注者排序的原始计数.
    #[inline]
    pub fn records(&self) -> &[UserQuality] {
        &self.records
    }

    /// 按得分从高到低排列的原始计数. 得分相同时按标注者排序.
    pub fn ranking(&self) -> Vec<&UserQuality> {
        self.records
            .iter()
            .sorted_by_key(|r| (Reverse(OrderedFloat(r.score())), r.user))
            .collect()
    }

    /// 某位标注者的原始计数.
    pub fn record(&self, user: UserId) -> Option<&UserQuality> {
        self.records
            .binary_search_by_key(&user, |r| r.user)
            .ok()
            .map(|i| &self.records[i])
    }
}

/// 计算 `users` 中每位标注者的特异度、灵敏度与得分.
///
/// `ground_truth` 应当由同一 `algorithm` 在同一 `elements` 上生成;
/// 其键集合决定参与评估的切片. 标注者在一张切片上有多个元素时, 只评估输入顺序中的第一个.
///
/// # 返回值
///
/// 1. 元素的切片索引越界, 或待评估的形状没有注册解析器时, 返回相应错误;
/// 2. 标注者的数值表示与共识维度不一致时, 返回 `Err(GtError::DimensionMismatch)`;
/// 3. 其他情况下返回 [`QualityReport`].
pub fn compute_specificity_and_sensitivity_for_users(
    algorithm: &dyn ConsensusAlgorithm,
    users: &[UserId],
    elements: &[LabelElement],
    ground_truth: &GroundTruth,
) -> GtResult<QualityReport> {
    let groups = group_by_slice(elements)?;
    let resize = algorithm.requires_fixed_dimensionality();
    let eval = |user: UserId| evaluate_user(user, &groups, ground_truth, resize);

    let records = run(users, eval)?;
    log::info!(
        "{}: evaluated {} users over {} slices",
        algorithm.name(),
        records.len(),
        ground_truth.len()
    );
    Ok(QualityReport::from_records(records))
}

type Groups<'e> = BTreeMap<crate::SliceId, Vec<&'e LabelElement>>;

/// 评估一位标注者.
fn evaluate_user(
    user: UserId,
    groups: &Groups,
    ground_truth: &GroundTruth,
    resize: bool,
) -> GtResult<UserQuality> {
    let mut q = UserQuality::new(user);
    for slice in ground_truth.slice_ids() {
        let on_slice = groups.get(slice).map_or(&[][..], Vec::as_slice);
        let mine = on_slice.iter().find(|e| e.owner() == user);

        if on_slice.len() < MIN_ANNOTATIONS {
            q.negative += 1;
            if mine.is_none() {
                q.true_negative += 1;
            }
            continue;
        }

        q.positive += 1;
        let (Some(mine), Some(consensus)) = (mine, ground_truth.get(slice)) else {
            continue;
        };
        let parser = mine.kind().parser()?;
        let row = convert_one(mine, resize)?;
        if row.len() != consensus.len() {
            return Err(GtError::DimensionMismatch {
                expected: consensus.len(),
                found: row.len(),
            });
        }
        let iou = parser.intersection_over_union(row.view(), consensus.view());
        log::trace!("{user} on {slice}: iou = {iou:.4}");
        if iou > IOU_THRESHOLD {
            q.true_positive += 1;
        }
    }
    Ok(q)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        /// 借助 `rayon`, 并行地评估各标注者.
        fn run<F>(users: &[UserId], eval: F) -> GtResult<Vec<UserQuality>>
        where
            F: Fn(UserId) -> GtResult<UserQuality> + Sync + Send,
        {
            users.par_iter().map(|&u| eval(u)).collect()
        }
    } else {
        fn run<F>(users: &[UserId], eval: F) -> GtResult<Vec<UserQuality>>
        where
            F: Fn(UserId) -> GtResult<UserQuality>,
        {
            users.iter().map(|&u| eval(u)).collect()
        }
    }
}

/// 所有出现在 `elements` 中的标注者, 升序.
pub fn users_of(elements: &[LabelElement]) -> Vec<UserId> {
    elements
        .iter()
        .map(LabelElement::owner)
        .sorted_unstable()
        .dedup()
        .collect()
}

/// 标注耗时与得分的对照: `(标注者, 平均每个标签耗时 (秒), 得分)`.
///
/// 每个标签只计一次; 没有耗时记录或不在报告中的标注者被略过. 结果按标注者排序.
pub fn labeling_time_vs_score(
    elements: &[LabelElement],
    report: &QualityReport,
) -> Vec<(UserId, f64, f64)> {
    let mut seen: HashSet<LabelId> = HashSet::new();
    let mut times: BTreeMap<UserId, (f64, u32)> = BTreeMap::new();
    for e in elements {
        let Some(t) = e.label.labeling_time else {
            continue;
        };
        if seen.insert(e.label.id) {
            let acc = times.entry(e.owner()).or_insert((0.0, 0));
            acc.0 += t;
            acc.1 += 1;
        }
    }

    times
        .into_iter()
        .filter_map(|(user, (total, count))| {
            let score = *report.scores.get(&user)?;
            Some((user, total / count as f64, score))
        })
        .collect()
}
