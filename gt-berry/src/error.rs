//! 运行时错误.

use crate::data::{ScanId, ShapeKind, SliceId};
use thiserror::Error;

/// 真值生成与质量评估的运行时错误.
///
/// 注意 "标注不足" 不在其中: 它是预期情况, 以 `None` 表示.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GtError {
    /// 该形状没有注册解析器. 这是配置错误 (新增了标注工具却没有对应解析器).
    #[error("no parser registered for shape kind `{0}`")]
    UnsupportedShape(ShapeKind),

    /// 解析器收到了不属于它的形状.
    #[error("parser for `{expected}` received a `{found}` element")]
    ShapeMismatch {
        /// 解析器负责的形状.
        expected: ShapeKind,
        /// 实际收到的形状.
        found: ShapeKind,
    },

    /// 同一切片上混合了不同形状的标注.
    #[error("slice {0} mixes `{1}` and `{2}` annotations")]
    MixedShapes(SliceId, ShapeKind, ShapeKind),

    /// 标注元素的切片索引超出扫描的切片范围.
    #[error("slice index {index} out of range for scan {scan} with {len} slices")]
    SliceOutOfRange {
        /// 所属扫描.
        scan: ScanId,
        /// 越界的索引.
        index: usize,
        /// 扫描的切片个数.
        len: usize,
    },

    /// 数值表示的维度不一致.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// 期望维度.
        expected: usize,
        /// 实际维度.
        found: usize,
    },

    /// 样本不足以运行共识算法.
    ///
    /// 第一个参数代表目前已有的样本数, 第二个参数代表最少需要的样本数.
    #[error("{0} samples given, at least {1} required")]
    NotEnoughSamples(usize, usize),

    /// 样本没有任何特征.
    #[error("samples have no features")]
    EmptyFeatures,

    /// 标注导出文件引用了不存在的记录.
    #[error("dump references unknown {0}")]
    DanglingReference(String),
}

/// 真值生成 / 质量评估的运行时结果.
pub type GtResult<T> = Result<T, GtError>;
