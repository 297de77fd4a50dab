//! 标注形状.
//!
//! 坐标均为切片上的归一化坐标, 即 `[0, 1] x [0, 1]`, `x` 沿宽, `y` 沿高.

use crate::Point2dF;
use std::fmt::{self, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 矩形标注: 左上角 `(x, y)` 与宽高.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rectangle {
    /// 左上角 x.
    pub x: f64,
    /// 左上角 y.
    pub y: f64,
    /// 宽.
    pub width: f64,
    /// 高.
    pub height: f64,
}

impl Rectangle {
    /// 初始化.
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 对角表示 `[x1, y1, x2, y2]`.
    #[inline]
    pub fn corners(&self) -> [f64; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }
}

/// 链标注: 有序点列. `is_loop` 表示末点是否与首点相连.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    /// 按边界顺序排列的点 `(x, y)`.
    pub points: Vec<Point2dF>,
    /// 首尾是否相连.
    pub is_loop: bool,
}

impl Chain {
    /// 初始化.
    #[inline]
    pub fn new(points: Vec<Point2dF>, is_loop: bool) -> Self {
        Self { points, is_loop }
    }
}

/// 点标注.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    /// x.
    pub x: f64,
    /// y.
    pub y: f64,
}

/// 笔刷标注. 掩码图像保存在外部存储中, 这里只保留其引用键.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Brush {
    /// 外部存储中的掩码图像键.
    pub image_key: String,
}

/// 标注元素的具体形状.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// 矩形.
    Rectangle(Rectangle),
    /// 链 (多边形).
    Chain(Chain),
    /// 点.
    Point(Point),
    /// 笔刷.
    Brush(Brush),
}

impl Shape {
    /// 形状种类.
    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Chain(_) => ShapeKind::Chain,
            Shape::Point(_) => ShapeKind::Point,
            Shape::Brush(_) => ShapeKind::Brush,
        }
    }
}

/// 形状种类. 解析器按该标签注册, 见 [`crate::parser`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeKind {
    /// 矩形.
    Rectangle,
    /// 链.
    Chain,
    /// 点.
    Point,
    /// 笔刷.
    Brush,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Chain => "chain",
            ShapeKind::Point => "point",
            ShapeKind::Brush => "brush",
        })
    }
}
