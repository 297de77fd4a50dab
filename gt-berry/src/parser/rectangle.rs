//! 矩形解析器.

use super::ShapeParser;
use crate::consts::RECTANGLE_LEN;
use crate::{GtResult, LabelElement, Shape, ShapeKind};
use ndarray::{Array2, ArrayView1};

/// 矩形解析器. 每行为对角表示 `[x, y, x + width, y + height]`, 不再做归一化.
#[derive(Copy, Clone, Debug, Default)]
pub struct RectangleParser;

impl ShapeParser for RectangleParser {
    #[inline]
    fn kind(&self) -> ShapeKind {
        ShapeKind::Rectangle
    }

    /// 矩形与切片大小无关, `resize` 不起作用.
    fn convert_to_array(&self, elements: &[&LabelElement], _resize: bool) -> GtResult<Array2<f64>> {
        self.check_kind(elements)?;
        let mut arr = Array2::<f64>::zeros((elements.len(), RECTANGLE_LEN));
        for (mut row, e) in arr.rows_mut().into_iter().zip(elements) {
            let Shape::Rectangle(r) = &e.shape else {
                unreachable!()
            };
            for (dst, src) in row.iter_mut().zip(r.corners()) {
                *dst = src;
            }
        }
        Ok(arr)
    }

    /// 轴对齐矩形的 IoU. 不相交时返回 `0.0`, 退化 (零面积) 矩形同样返回 `0.0`.
    fn intersection_over_union(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        assert_eq!(a.len(), RECTANGLE_LEN, "矩形表示的长度必须为 4");
        assert_eq!(b.len(), RECTANGLE_LEN, "矩形表示的长度必须为 4");

        let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
        let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
        let inter = inter_w * inter_h;

        let area = |r: ArrayView1<f64>| (r[2] - r[0]).max(0.0) * (r[3] - r[1]).max(0.0);
        let union = area(a) + area(b) - inter;

        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixture::Crowd;
    use crate::{ScanId, UserId};
    use ndarray::{arr1, Array2};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    fn iou(a: [f64; 4], b: [f64; 4]) -> f64 {
        RectangleParser.intersection_over_union(arr1(&a).view(), arr1(&b).view())
    }

    #[test]
    fn test_rectangle_iou() {
        assert!(f64_eq(iou([0.0, 0.0, 1.0, 1.0], [0.0, 0.0, 1.0, 1.0]), 1.0));
        assert!(f64_eq(iou([0.0, 0.0, 1.0, 1.0], [2.0, 2.0, 3.0, 3.0]), 0.0));
        assert!(f64_eq(iou([0.0, 0.0, 0.5, 0.5], [0.0, 0.0, 0.5, 1.0]), 0.5));
    }

    #[test]
    fn test_rectangle_iou_degenerate() {
        // 只有一侧重叠时, 交集宽高中的负值必须被截断.
        assert_eq!(iou([0.0, 0.0, 1.0, 1.0], [0.5, 2.0, 1.5, 3.0]), 0.0);
        // 两个零面积矩形.
        assert_eq!(iou([0.5, 0.5, 0.5, 0.5], [0.5, 0.5, 0.5, 0.5]), 0.0);
    }

    #[test]
    fn test_rectangle_convert() {
        let mut crowd = Crowd::new(ScanId(1), 1, 64, 64);
        let a = crowd.rect(UserId(1), 0, 0.1, 0.2, 0.3, 0.4);
        let b = crowd.rect(UserId(2), 0, 0.0, 0.0, 1.0, 1.0);

        let arr = RectangleParser.convert_to_array(&[&a, &b], true).unwrap();
        assert_eq!(arr.shape(), &[2, 4]);
        let expected = [0.1, 0.2, 0.4, 0.6000000000000001];
        for (v, e) in arr.row(0).iter().zip(expected) {
            assert!(f64_eq(*v, e));
        }
        assert_eq!(arr.row(1).to_vec(), vec![0.0, 0.0, 1.0, 1.0]);

        let empty = RectangleParser.convert_to_array(&[], false).unwrap();
        assert_eq!(empty, Array2::<f64>::zeros((0, 4)));
    }
}
