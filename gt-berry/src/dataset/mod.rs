//! 数据集生成: 对一批标注元素逐切片求共识.
//!
//! 输出覆盖所有被引用扫描的 **全部** 切片, 而不仅是被标注过的切片.
//! 标注少于 [`MIN_ANNOTATIONS`] 个的切片映射为 `None`.

use crate::consensus::ConsensusAlgorithm;
use crate::consts::MIN_ANNOTATIONS;
use crate::{GtError, GtResult, LabelElement, ShapeKind, SliceId};
use ndarray::Array1;
use std::collections::btree_map;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 切片 -> 共识的映射. 按 [`SliceId`] 有序.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroundTruth {
    entries: BTreeMap<SliceId, Option<Array1<f64>>>,
}

impl GroundTruth {
    /// 切片的共识. 切片不在范围内或没有共识时返回 `None`.
    #[inline]
    pub fn get(&self, slice: &SliceId) -> Option<&Array1<f64>> {
        self.entries.get(slice).and_then(Option::as_ref)
    }

    /// 切片是否在范围内 (不论有无共识).
    #[inline]
    pub fn contains(&self, slice: &SliceId) -> bool {
        self.entries.contains_key(slice)
    }

    /// 范围内的切片个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 范围是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 有共识的切片个数.
    pub fn with_consensus(&self) -> usize {
        self.entries.values().filter(|v| v.is_some()).count()
    }

    /// 范围内的所有切片.
    #[inline]
    pub fn slice_ids(&self) -> impl Iterator<Item = &SliceId> {
        self.entries.keys()
    }

    /// 以切片顺序迭代 `(切片, 共识)`.
    #[inline]
    pub fn iter(&self) -> btree_map::Iter<'_, SliceId, Option<Array1<f64>>> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a GroundTruth {
    type Item = (&'a SliceId, &'a Option<Array1<f64>>);
    type IntoIter = btree_map::Iter<'a, SliceId, Option<Array1<f64>>>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(SliceId, Option<Array1<f64>>)> for GroundTruth {
    fn from_iter<I: IntoIterator<Item = (SliceId, Option<Array1<f64>>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// 按切片分组. 组内保持输入顺序.
pub fn group_by_slice(
    elements: &[LabelElement],
) -> GtResult<BTreeMap<SliceId, Vec<&LabelElement>>> {
    let mut groups: BTreeMap<SliceId, Vec<&LabelElement>> = BTreeMap::new();
    for e in elements {
        groups.entry(e.slice_id()?).or_default().push(e);
    }
    Ok(groups)
}

/// 所有被引用扫描的全部切片.
pub fn slices_in_scope(elements: &[LabelElement]) -> Vec<SliceId> {
    let mut scans = BTreeMap::new();
    for e in elements {
        scans.entry(e.scan().id).or_insert_with(|| e.label.scan.clone());
    }
    scans.values().flat_map(|s| s.slice_ids()).collect()
}

/// 同一切片上所有元素的形状种类. 混合形状返回 `Err(GtError::MixedShapes)`.
pub(crate) fn homogeneous_kind(slice: SliceId, elements: &[&LabelElement]) -> GtResult<ShapeKind> {
    let first = elements[0].kind();
    match elements.iter().map(|e| e.kind()).find(|k| *k != first) {
        None => Ok(first),
        Some(other) => Err(GtError::MixedShapes(slice, first, other)),
    }
}

/// 数据集生成器. 绑定一个共识算法.
pub struct DatasetGenerator<'a> {
    algorithm: &'a dyn ConsensusAlgorithm,
}

impl<'a> DatasetGenerator<'a> {
    /// 初始化.
    #[inline]
    pub fn new(algorithm: &'a dyn ConsensusAlgorithm) -> Self {
        Self { algorithm }
    }

    /// 绑定的算法.
    #[inline]
    pub fn algorithm(&self) -> &'a dyn ConsensusAlgorithm {
        self.algorithm
    }

    /// 对 `elements` 涉及的所有切片求共识.
    ///
    /// # 返回值
    ///
    /// 1. 元素的切片索引越界时, 返回 `Err(GtError::SliceOutOfRange)`;
    /// 2. 某切片混合了不同形状时, 返回 `Err(GtError::MixedShapes)`;
    /// 3. 形状没有注册解析器时, 返回 `Err(GtError::UnsupportedShape)`;
    /// 4. 其他情况下返回覆盖全部范围内切片的 [`GroundTruth`].
    pub fn generate(&self, elements: &[LabelElement]) -> GtResult<GroundTruth> {
        let groups = group_by_slice(elements)?;
        let scope = slices_in_scope(elements);

        let eligible: Vec<(SliceId, &Vec<&LabelElement>)> = groups
            .iter()
            .filter(|(_, v)| v.len() >= MIN_ANNOTATIONS)
            .map(|(k, v)| (*k, v))
            .collect();

        let computed = self.run(&eligible)?;
        let mut entries: BTreeMap<SliceId, Option<Array1<f64>>> =
            scope.into_iter().map(|s| (s, None)).collect();
        for (slice, gt) in computed {
            entries.insert(slice, Some(gt));
        }

        log::info!(
            "{}: {} slices in scope, {} with consensus",
            self.algorithm.name(),
            entries.len(),
            eligible.len()
        );
        Ok(GroundTruth { entries })
    }

    /// 对单个切片求共识. 调用方保证 `elements.len() >= 2`.
    fn consensus_for_slice(
        &self,
        slice: SliceId,
        elements: &[&LabelElement],
    ) -> GtResult<Array1<f64>> {
        let kind = homogeneous_kind(slice, elements)?;
        let parser = kind.parser()?;
        let data =
            parser.convert_to_array(elements, self.algorithm.requires_fixed_dimensionality())?;
        log::debug!(
            "{}: {slice} with {} `{kind}` annotations of dimension {}",
            self.algorithm.name(),
            data.nrows(),
            data.ncols()
        );
        self.algorithm.ground_truth(data.view())
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        impl DatasetGenerator<'_> {
            /// 借助 `rayon`, 并行地对各切片求共识.
            fn run(
                &self,
                eligible: &[(SliceId, &Vec<&LabelElement>)],
            ) -> GtResult<Vec<(SliceId, Array1<f64>)>> {
                eligible
                    .par_iter()
                    .map(|(slice, v)| Ok((*slice, self.consensus_for_slice(*slice, v)?)))
                    .collect()
            }
        }
    } else {
        impl DatasetGenerator<'_> {
            fn run(
                &self,
                eligible: &[(SliceId, &Vec<&LabelElement>)],
            ) -> GtResult<Vec<(SliceId, Array1<f64>)>> {
                eligible
                    .iter()
                    .map(|(slice, v)| Ok((*slice, self.consensus_for_slice(*slice, v)?)))
                    .collect()
            }
        }
    }
}
