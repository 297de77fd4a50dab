//! 链 (多边形) 解析器.

use super::raster::{fill_polygon, resize_mask};
use super::ShapeParser;
use crate::consts::{RESIZED_LEN, RESIZED_SHAPE};
use crate::{GtError, GtResult, LabelElement, Shape, ShapeKind};
use ndarray::{Array2, ArrayView1, Zip};

/// 链解析器. 每行为一个展平的二值掩码.
///
/// 不缩放时, 掩码大小就是所属切片的像素大小 `height * width`;
/// 缩放时, 掩码先被缩放到 [`RESIZED_SHAPE`], 长度固定为 [`RESIZED_LEN`].
#[derive(Copy, Clone, Debug, Default)]
pub struct ChainParser;

impl ChainParser {
    /// 把一个链元素光栅化为其切片大小的掩码.
    ///
    /// 填充需要闭合边界, 因此开链 (`is_loop == false`) 同样按首尾相连处理.
    fn rasterize(element: &LabelElement) -> GtResult<Array2<u8>> {
        let Shape::Chain(chain) = &element.shape else {
            return Err(GtError::ShapeMismatch {
                expected: ShapeKind::Chain,
                found: element.kind(),
            });
        };
        let slice = element.slice()?;
        let (w, h) = (slice.width as f64, slice.height as f64);
        let pixels: Vec<_> = chain.points.iter().map(|&(x, y)| (x * w, y * h)).collect();
        Ok(fill_polygon(&pixels, slice.shape()))
    }
}

impl ShapeParser for ChainParser {
    #[inline]
    fn kind(&self) -> ShapeKind {
        ShapeKind::Chain
    }

    /// 所有掩码必须等长; 不缩放且切片大小不一时返回 `Err(GtError::DimensionMismatch)`.
    fn convert_to_array(&self, elements: &[&LabelElement], resize: bool) -> GtResult<Array2<f64>> {
        self.check_kind(elements)?;

        let mut masks = Vec::with_capacity(elements.len());
        for e in elements {
            let mask = Self::rasterize(e)?;
            masks.push(if resize {
                resize_mask(&mask, RESIZED_SHAPE)
            } else {
                mask
            });
        }

        let d = match masks.first() {
            Some(m) => m.len(),
            None if resize => RESIZED_LEN,
            None => 0,
        };
        let mut arr = Array2::<f64>::zeros((masks.len(), d));
        for (mut row, mask) in arr.rows_mut().into_iter().zip(masks.iter()) {
            if mask.len() != d {
                return Err(GtError::DimensionMismatch {
                    expected: d,
                    found: mask.len(),
                });
            }
            for (dst, &src) in row.iter_mut().zip(mask.iter()) {
                *dst = src as f64;
            }
        }
        Ok(arr)
    }

    /// 掩码的 IoU: `sum(a * b) / sum(clamp(a + b, 0, 1))`.
    ///
    /// 两个掩码都为空 (并集为 0) 时返回 `0.0`.
    fn intersection_over_union(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        assert_eq!(a.len(), b.len(), "掩码长度不符");

        let (mut inter, mut union) = (0.0, 0.0);
        Zip::from(&a).and(&b).for_each(|&p, &q| {
            inter += p * q;
            union += (p + q).clamp(0.0, 1.0);
        });

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
    use crate::{Chain, Scan, ScanId, Shape, UserId};
    use ndarray::arr1;
    use std::sync::Arc;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    fn iou(a: &[f64], b: &[f64]) -> f64 {
        ChainParser.intersection_over_union(arr1(a).view(), arr1(b).view())
    }

    #[test]
    fn test_chain_iou() {
        let a = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        assert!(f64_eq(iou(&a, &a), 1.0));

        let b = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        assert!(f64_eq(iou(&a, &b), 0.0));

        let a = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let b = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        assert!(f64_eq(iou(&a, &b), 0.4));
    }

    #[test]
    fn test_chain_iou_empty_masks() {
        let z = [0.0; 10];
        assert_eq!(iou(&z, &z), 0.0);
    }

    #[test]
    fn test_chain_convert_unresized() {
        let mut crowd = Crowd::new(ScanId(1), 2, 10, 10);
        let a = crowd.chain(UserId(1), 0, &[(0.2, 0.2), (0.6, 0.2), (0.6, 0.6), (0.2, 0.6)]);
        let b = crowd.chain(UserId(2), 0, &[(0.2, 0.2), (0.6, 0.2), (0.6, 0.6), (0.2, 0.6)]);

        let arr = ChainParser.convert_to_array(&[&a, &b], false).unwrap();
        assert_eq!(arr.shape(), &[2, 100]);
        assert_eq!(arr.row(0).sum(), 25.0);
        assert!(f64_eq(
            ChainParser.intersection_over_union(arr.row(0), arr.row(1)),
            1.0
        ));
    }

    #[test]
    fn test_open_chain_is_closed_for_fill() {
        let mut crowd = Crowd::new(ScanId(1), 1, 10, 10);
        let square = vec![(0.2, 0.2), (0.6, 0.2), (0.6, 0.6), (0.2, 0.6)];
        let open = crowd.element(UserId(1), 0, Shape::Chain(Chain::new(square.clone(), false)));
        let closed = crowd.element(UserId(2), 0, Shape::Chain(Chain::new(square, true)));

        let arr = ChainParser.convert_to_array(&[&open, &closed], false).unwrap();
        assert_eq!(arr.row(0).sum(), 25.0);
        assert_eq!(arr.row(0), arr.row(1));
    }

    #[test]
    fn test_chain_convert_resized() {
        let scan = Arc::new(Scan::from_sizes(ScanId(2), [(10, 10), (40, 20)]));
        let mut crowd = Crowd::from_scan(scan);
        let whole = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let a = crowd.chain(UserId(1), 0, &whole);
        let b = crowd.chain(UserId(2), 1, &whole);

        // 切片大小不同, 不缩放时无法对齐.
        assert_eq!(
            ChainParser.convert_to_array(&[&a, &b], false).unwrap_err(),
            GtError::DimensionMismatch {
                expected: 100,
                found: 800
            }
        );

        let arr = ChainParser.convert_to_array(&[&a, &b], true).unwrap();
        assert_eq!(arr.shape(), &[2, RESIZED_LEN]);
        assert_eq!(arr.row(0).sum(), RESIZED_LEN as f64);
        assert_eq!(arr.row(1).sum(), RESIZED_LEN as f64);

        let empty = ChainParser.convert_to_array(&[], true).unwrap();
        assert_eq!(empty.shape(), &[0, RESIZED_LEN]);
    }
}
