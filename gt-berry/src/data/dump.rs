//! 扁平的标注导出格式.
//!
//! 持久化层导出的是彼此以标识引用的行记录; 这里把它们重新链接成
//! 带反向引用的 [`LabelElement`], 反之亦然.

use super::*;
use std::collections::{BTreeMap, HashMap};

/// 一行标签记录.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    /// 标签标识.
    pub id: LabelId,
    /// 标注者.
    pub owner: UserId,
    /// 被标注的扫描.
    pub scan: ScanId,
    /// 标注耗时 (秒).
    pub labeling_time: Option<f64>,
}

/// 一行标注元素记录.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    /// 元素标识.
    pub id: ElementId,
    /// 所属标签.
    pub label: LabelId,
    /// 切片索引.
    pub slice_index: usize,
    /// 形状.
    pub shape: Shape,
}

/// 一次导出的全部记录.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelDump {
    /// 扫描.
    pub scans: Vec<Scan>,
    /// 标签.
    pub labels: Vec<LabelRecord>,
    /// 标注元素.
    pub elements: Vec<ElementRecord>,
}

impl LabelDump {
    /// 从已链接的元素构建导出. 扫描和标签按标识去重并排序.
    pub fn from_elements(elements: &[LabelElement]) -> Self {
        let mut scans = BTreeMap::new();
        let mut labels = BTreeMap::new();
        for e in elements {
            scans
                .entry(e.label.scan.id)
                .or_insert_with(|| Scan::clone(&e.label.scan));
            labels.entry(e.label.id).or_insert_with(|| LabelRecord {
                id: e.label.id,
                owner: e.label.owner,
                scan: e.label.scan.id,
                labeling_time: e.label.labeling_time,
            });
        }
        let elements = elements
            .iter()
            .map(|e| ElementRecord {
                id: e.id,
                label: e.label.id,
                slice_index: e.slice_index,
                shape: e.shape.clone(),
            })
            .collect();

        Self {
            scans: scans.into_values().collect(),
            labels: labels.into_values().collect(),
            elements,
        }
    }

    /// 重新链接为 [`LabelElement`], 保持元素的导出顺序.
    ///
    /// 若某条记录引用了不存在的扫描或标签, 返回 `Err(GtError::DanglingReference)`.
    pub fn into_elements(self) -> GtResult<Vec<LabelElement>> {
        let scans: HashMap<ScanId, Arc<Scan>> = self
            .scans
            .into_iter()
            .map(|s| (s.id, Arc::new(s)))
            .collect();

        let mut labels = HashMap::with_capacity(self.labels.len());
        for r in self.labels {
            let scan = scans
                .get(&r.scan)
                .ok_or_else(|| GtError::DanglingReference(r.scan.to_string()))?
                .clone();
            let label = Label {
                id: r.id,
                owner: r.owner,
                scan,
                labeling_time: r.labeling_time,
            };
            labels.insert(r.id, Arc::new(label));
        }

        self.elements
            .into_iter()
            .map(|r| {
                let label = labels
                    .get(&r.label)
                    .ok_or_else(|| GtError::DanglingReference(r.label.to_string()))?
                    .clone();
                Ok(LabelElement::new(r.id, label, r.slice_index, r.shape))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixture::Crowd;
    use super::*;

    #[test]
    fn test_dump_relink_through_bincode() {
        let mut crowd = Crowd::new(ScanId(7), 3, 16, 16);
        let elements = vec![
            crowd.rect(UserId(1), 0, 0.1, 0.1, 0.3, 0.3),
            crowd.chain(UserId(2), 1, &[(0.1, 0.1), (0.5, 0.1), (0.5, 0.5)]),
            crowd.rect(UserId(1), 2, 0.2, 0.2, 0.3, 0.3),
        ];

        let dump = LabelDump::from_elements(&elements);
        assert_eq!(dump.scans.len(), 1);
        assert_eq!(dump.labels.len(), 2);

        let bytes = bincode::serialize(&dump).unwrap();
        let back: LabelDump = bincode::deserialize(&bytes).unwrap();
        let relinked = back.into_elements().unwrap();

        assert_eq!(relinked.len(), 3);
        for (a, b) in elements.iter().zip(relinked.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.owner(), b.owner());
            assert_eq!(a.shape, b.shape);
            assert_eq!(a.slice_id().unwrap(), b.slice_id().unwrap());
        }
        // 同一标签的元素共享同一个 `Arc<Label>`.
        assert!(Arc::ptr_eq(&relinked[0].label, &relinked[2].label));
    }

    #[test]
    fn test_dump_dangling_label() {
        let dump = LabelDump {
            scans: vec![],
            labels: vec![],
            elements: vec![ElementRecord {
                id: ElementId(1),
                label: LabelId(9),
                slice_index: 0,
                shape: Shape::Point(Point { x: 0.5, y: 0.5 }),
            }],
        };
        assert_eq!(
            dump.into_elements().unwrap_err(),
            GtError::DanglingReference("label#9".to_string())
        );
    }
}
