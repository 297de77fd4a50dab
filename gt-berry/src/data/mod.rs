//! 扫描、切片与标注元素.
//!
//! 标注元素在标注时一次性创建, 之后不可变. 每个元素属于唯一的 [`Label`],
//! 而每个 `Label` 属于唯一的标注者 ([`UserId`]) 和唯一的 [`Scan`].
//! 反向引用通过 `Arc` 共享, 因此元素集合可以安全地跨线程使用.

mod shape;

#[cfg(feature = "serde")]
mod dump;

#[cfg(test)]
pub(crate) mod fixture;

pub use shape::{Brush, Chain, Point, Rectangle, Shape, ShapeKind};

#[cfg(feature = "serde")]
pub use dump::{ElementRecord, LabelDump, LabelRecord};

use crate::{GtError, GtResult};
use std::fmt::{self, Formatter};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 定义一个以 `u64` 为底层的标识符.
macro_rules! define_id {
    ($(#[$meta: meta])* $name: ident, $prefix: literal) => {
        $(#[$meta])*
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_id!(
    /// 标注者标识.
    UserId,
    "user"
);
define_id!(
    /// 扫描标识.
    ScanId,
    "scan"
);
define_id!(
    /// 标签标识.
    LabelId,
    "label"
);
define_id!(
    /// 标注元素标识.
    ElementId,
    "element"
);

/// 切片标识: 所属扫描 + 切片索引.
///
/// 全序: 先按扫描, 再按索引. 结果映射因此能以确定的顺序迭代.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SliceId {
    /// 所属扫描.
    pub scan: ScanId,
    /// 扫描内的切片索引.
    pub index: usize,
}

impl fmt::Display for SliceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/slice#{}", self.scan, self.index)
    }
}

/// 三维扫描中的一张二维切片.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Slice {
    /// 切片标识.
    pub id: SliceId,
    /// 像素宽.
    pub width: u32,
    /// 像素高.
    pub height: u32,
}

impl Slice {
    /// 切片的像素形状 `(h, w)`.
    #[inline]
    pub fn shape(&self) -> crate::Idx2d {
        (self.height as usize, self.width as usize)
    }
}

/// 一次扫描, 包含若干切片.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scan {
    /// 扫描标识.
    pub id: ScanId,
    /// 按索引排列的切片.
    slices: Vec<Slice>,
}

impl Scan {
    /// 创建一个含 `len` 张同样大小 `width * height` 切片的扫描.
    pub fn new(id: ScanId, len: usize, width: u32, height: u32) -> Self {
        let slices = (0..len)
            .map(|index| Slice {
                id: SliceId { scan: id, index },
                width,
                height,
            })
            .collect();
        Self { id, slices }
    }

    /// 以每张切片的 `(width, height)` 创建扫描.
    pub fn from_sizes<I: IntoIterator<Item = (u32, u32)>>(id: ScanId, sizes: I) -> Self {
        let slices = sizes
            .into_iter()
            .enumerate()
            .map(|(index, (width, height))| Slice {
                id: SliceId { scan: id, index },
                width,
                height,
            })
            .collect();
        Self { id, slices }
    }

    /// 所有切片.
    #[inline]
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// 切片个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// 是否没有切片?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// 按索引获取切片. 越界时返回 `Err(GtError::SliceOutOfRange)`.
    pub fn slice(&self, index: usize) -> GtResult<&Slice> {
        self.slices.get(index).ok_or(GtError::SliceOutOfRange {
            scan: self.id,
            index,
            len: self.slices.len(),
        })
    }

    /// 所有切片标识.
    #[inline]
    pub fn slice_ids(&self) -> impl Iterator<Item = SliceId> + '_ {
        self.slices.iter().map(|s| s.id)
    }
}

/// 一位标注者对一次扫描的一次标注会话.
#[derive(Clone, Debug)]
pub struct Label {
    /// 标签标识.
    pub id: LabelId,
    /// 标注者.
    pub owner: UserId,
    /// 被标注的扫描.
    pub scan: Arc<Scan>,
    /// 标注耗时 (秒). 旧数据可能没有记录.
    pub labeling_time: Option<f64>,
}

impl Label {
    /// 初始化.
    #[inline]
    pub fn new(id: LabelId, owner: UserId, scan: Arc<Scan>) -> Self {
        Self {
            id,
            owner,
            scan,
            labeling_time: None,
        }
    }

    /// 设置标注耗时 (秒).
    #[inline]
    pub fn with_labeling_time(mut self, seconds: f64) -> Self {
        self.labeling_time = Some(seconds);
        self
    }
}

/// 一位标注者对一张切片的一个标注.
#[derive(Clone, Debug)]
pub struct LabelElement {
    /// 元素标识.
    pub id: ElementId,
    /// 所属标签.
    pub label: Arc<Label>,
    /// 所标注的切片在扫描中的索引.
    pub slice_index: usize,
    /// 具体形状.
    pub shape: Shape,
}

impl LabelElement {
    /// 初始化.
    #[inline]
    pub fn new(id: ElementId, label: Arc<Label>, slice_index: usize, shape: Shape) -> Self {
        Self {
            id,
            label,
            slice_index,
            shape,
        }
    }

    /// 标注者.
    #[inline]
    pub fn owner(&self) -> UserId {
        self.label.owner
    }

    /// 所属扫描.
    #[inline]
    pub fn scan(&self) -> &Scan {
        &self.label.scan
    }

    /// 经由 `label.scan.slices[slice_index]` 解析所标注的切片.
    #[inline]
    pub fn slice(&self) -> GtResult<&Slice> {
        self.scan().slice(self.slice_index)
    }

    /// 所标注切片的标识. 索引越界时返回错误.
    #[inline]
    pub fn slice_id(&self) -> GtResult<SliceId> {
        self.slice().map(|s| s.id)
    }

    /// 形状种类.
    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }
}
