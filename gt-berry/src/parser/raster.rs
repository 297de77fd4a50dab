//! 多边形光栅化与掩码缩放.
//!
//! 掩码以行优先的 `(h, w)` 二维数组存储, 像素值只有 0 和 1.
//! 像素 `(h, w)` 的中心位于像素坐标系的 `(x, y) = (w + 0.5, h + 0.5)`.

use crate::{Idx2d, Point2dF};
use image::imageops::{self, FilterType};
use image::GrayImage;
use ndarray::Array2;

/// 以奇偶规则填充像素坐标系下的多边形 `points`, 并描出其边界.
///
/// 末点总是与首点相连 (填充需要闭合边界). 零面积或自相交的多边形
/// 按原样处理, 不做校验.
pub(crate) fn fill_polygon(points: &[Point2dF], (h, w): Idx2d) -> Array2<u8> {
    let mut mask = Array2::<u8>::zeros((h, w));
    if points.is_empty() || h == 0 || w == 0 {
        return mask;
    }

    let edges = || {
        points
            .iter()
            .copied()
            .zip(points.iter().copied().cycle().skip(1))
    };

    // 扫描线: 每行以像素中心高度求交.
    let mut xs: Vec<f64> = Vec::with_capacity(points.len());
    for row in 0..h {
        let yc = row as f64 + 0.5;
        xs.clear();
        for ((x0, y0), (x1, y1)) in edges() {
            // 半开区间, 避免顶点被重复计数.
            if (y0 <= yc && yc < y1) || (y1 <= yc && yc < y0) {
                xs.push(x0 + (yc - y0) * (x1 - x0) / (y1 - y0));
            }
        }
        xs.sort_by(f64::total_cmp);
        for pair in xs.chunks_exact(2) {
            let first = (pair[0] - 0.5).ceil().max(0.0);
            let last = (pair[1] - 0.5).floor().min(w as f64 - 1.0);
            if first > last {
                continue;
            }
            for col in first as usize..=last as usize {
                mask[(row, col)] = 1;
            }
        }
    }

    for (from, to) in edges() {
        trace_segment(&mut mask, from, to);
    }
    mask
}

/// 描出线段 `from -> to` 经过的像素. 越界部分被截断到图像边缘.
fn trace_segment(mask: &mut Array2<u8>, (x0, y0): Point2dF, (x1, y1): Point2dF) {
    let (h, w) = mask.dim();
    let to_idx = |v: f64, len: usize| -> usize {
        if v.is_nan() || v < 0.0 {
            0
        } else {
            (v.floor() as usize).min(len - 1)
        }
    };

    let (dx, dy) = (x1 - x0, y1 - y0);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let col = to_idx(x0 + dx * t, w);
        let row = to_idx(y0 + dy * t, h);
        mask[(row, col)] = 1;
    }
}

/// 用最近邻插值把二值掩码缩放到 `(h, w)`, 缩放后仍然是二值的.
pub(crate) fn resize_mask(mask: &Array2<u8>, (h, w): (u32, u32)) -> Array2<u8> {
    let (src_h, src_w) = mask.dim();
    if src_h == 0 || src_w == 0 {
        return Array2::zeros((h as usize, w as usize));
    }

    let buf: Vec<u8> = mask.iter().copied().collect();
    let Some(img) = GrayImage::from_raw(src_w as u32, src_h as u32, buf) else {
        unreachable!("buffer length always equals h * w")
    };
    let resized = imageops::resize(&img, w, h, FilterType::Nearest);
    Array2::from_shape_vec((h as usize, w as usize), resized.into_raw())
        .unwrap_or_else(|_| unreachable!("image crate returns a w * h buffer"))
}
