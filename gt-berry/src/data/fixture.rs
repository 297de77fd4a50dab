//! 测试用的标注构造器.

use super::*;
use std::collections::HashMap;

/// 在一次扫描上模拟多位标注者. 每位标注者只有一个 `Label`.
pub(crate) struct Crowd {
    scan: Arc<Scan>,
    labels: HashMap<UserId, Arc<Label>>,
    next_element: u64,
}

impl Crowd {
    pub fn new(scan: ScanId, len: usize, width: u32, height: u32) -> Self {
        Self::from_scan(Arc::new(Scan::new(scan, len, width, height)))
    }

    pub fn from_scan(scan: Arc<Scan>) -> Self {
        Self {
            scan,
            labels: HashMap::new(),
            next_element: 0,
        }
    }

    pub fn slice_id(&self, index: usize) -> SliceId {
        SliceId {
            scan: self.scan.id,
            index,
        }
    }

    fn label(&mut self, user: UserId) -> Arc<Label> {
        let scan = self.scan.clone();
        let id = LabelId(scan.id.0 * 1000 + user.0);
        self.labels
            .entry(user)
            .or_insert_with(|| Arc::new(Label::new(id, user, scan)))
            .clone()
    }

    pub fn element(&mut self, user: UserId, slice_index: usize, shape: Shape) -> LabelElement {
        let label = self.label(user);
        self.next_element += 1;
        LabelElement::new(ElementId(self.next_element), label, slice_index, shape)
    }

    pub fn rect(
        &mut self,
        user: UserId,
        slice_index: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> LabelElement {
        let r = Rectangle::new(x, y, width, height);
        self.element(user, slice_index, Shape::Rectangle(r))
    }

    pub fn chain(&mut self, user: UserId, slice_index: usize, points: &[(f64, f64)]) -> LabelElement {
        let c = Chain::new(points.to_vec(), true);
        self.element(user, slice_index, Shape::Chain(c))
    }
}
