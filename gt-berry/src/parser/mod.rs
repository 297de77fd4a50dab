//! 形状解析器.
//!
//! 把同一形状种类的一组标注元素转换为统一的数值表示 (每行一个元素),
//! 并在该表示上计算两两之间的 IoU (Intersection-over-Union).
//!
//! 解析器按 [`ShapeKind`] 注册, 通过 [`ShapeKind::parser`] 获取.
//! 没有注册解析器的形状 (点、笔刷) 会得到 `GtError::UnsupportedShape`.

mod chain;
mod raster;
mod rectangle;

pub use chain::ChainParser;
pub use rectangle::RectangleParser;

use crate::{GtError, GtResult, LabelElement, ShapeKind};
use ndarray::{Array2, ArrayView1};

/// 形状解析器.
pub trait ShapeParser: Sync {
    /// 该解析器负责的形状种类.
    fn kind(&self) -> ShapeKind;

    /// 把 `elements` 转换为 `n * d` 的数组, `n = elements.len()`.
    ///
    /// `resize` 为 `true` 时, 输出维度与切片大小无关 (固定维度算法需要).
    /// 空输入返回 `0 * d` 的数组.
    fn convert_to_array(&self, elements: &[&LabelElement], resize: bool) -> GtResult<Array2<f64>>;

    /// 计算两个数值表示之间的 IoU, 取值 `[0, 1]`.
    ///
    /// `a` 与 `b` 的长度必须相同, 否则程序 panic.
    fn intersection_over_union(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64;

    /// 检查 `elements` 都是本解析器负责的形状.
    fn check_kind(&self, elements: &[&LabelElement]) -> GtResult<()> {
        match elements.iter().find(|e| e.kind() != self.kind()) {
            None => Ok(()),
            Some(e) => Err(GtError::ShapeMismatch {
                expected: self.kind(),
                found: e.kind(),
            }),
        }
    }
}

static RECTANGLE: RectangleParser = RectangleParser;
static CHAIN: ChainParser = ChainParser;

impl ShapeKind {
    /// 获取该形状种类注册的解析器.
    ///
    /// 未注册的种类返回 `Err(GtError::UnsupportedShape)`; 这是配置错误, 调用方不应尝试恢复.
    pub fn parser(self) -> GtResult<&'static dyn ShapeParser> {
        match self {
            ShapeKind::Rectangle => Ok(&RECTANGLE),
            ShapeKind::Chain => Ok(&CHAIN),
            kind => Err(GtError::UnsupportedShape(kind)),
        }
    }
}

/// 解析单个元素, 返回其数值表示.
pub fn convert_one(element: &LabelElement, resize: bool) -> GtResult<ndarray::Array1<f64>> {
    let parser = element.kind().parser()?;
    let arr = parser.convert_to_array(&[element], resize)?;
    Ok(arr.row(0).to_owned())
}
