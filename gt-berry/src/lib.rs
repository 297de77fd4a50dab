#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 从多名标注者对同一 CT/DICOM 切片的独立标注出发, 生成共识真值
//! (ground truth), 并据此评估每位标注者的特异度、灵敏度与综合得分.
//!
//! 该 crate 只负责纯计算部分: 标注数据由外部 (数据库/ORM 层) 提供,
//! 结果交由外部的报告脚本消费. 不涉及 HTTP、存储后端与图像格式转换.
//!
//! # 注意
//!
//! 1. 所有计算都是同步的、无 I/O 的. 打开 `rayon` feature 后,
//!   切片之间与用户之间的计算会并行进行, 但结果与串行版本一致.
//! 2. 少于两个标注的切片不是错误, 而是以 `None` 表示 "无共识".
//!
//! # 开发计划
//!
//! ### 标注数据模型 ✅
//!
//! 扫描、切片、标签、标注元素 (矩形 / 链 / 点 / 笔刷) 及其反向引用.
//!
//! 实现位于 `gt-berry/src/data`.
//!
//! ### 形状解析器 ✅
//!
//! 1. 矩形 -> `[x1, y1, x2, y2]`;
//! 2. 链 (多边形) -> 切片像素大小的二值掩码, 可选缩放到 100x100 后展平.
//!
//! 同时提供两种形状各自的 IoU 计算.
//!
//! 实现位于 `gt-berry/src/parser`.
//!
//! ### 共识算法 ✅
//!
//! 多数投票 (均值), DBSCAN, K-Means (肘部法则自动选 k),
//! 球形协方差高斯混合模型 (BIC 自动选分量数). 纯 Rust 实现.
//!
//! 实现位于 `gt-berry/src/consensus`.
//!
//! ### 数据集生成 ✅
//!
//! 按切片分组, 跳过标注不足的切片, 对其余切片求共识.
//!
//! 实现位于 `gt-berry/src/dataset`.
//!
//! ### 标注者质量评估 ✅
//!
//! 以 IoU 阈值 0.4 判定 TP, 以 "正确放弃" 判定 TN, 计算特异度/灵敏度/得分.
//!
//! 实现位于 `gt-berry/src/quality`.
//!
//! ### 更好的聚类超参数 ⌛️
//!
//! `eps = 0.5`, `min_samples = 2`, `max_clusters = 5` 仍是固定默认值,
//! 但已可以通过参数结构体覆写.

/// 二维索引 `(h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 归一化或像素坐标系下的点 `(x, y)`.
type Point2dF = (f64, f64);

pub mod consts;

mod error;

pub use error::{GtError, GtResult};

/// 标注数据模型.
pub mod data;

pub use data::{
    Brush, Chain, ElementId, Label, LabelElement, LabelId, Point, Rectangle, Scan, ScanId, Shape,
    ShapeKind, Slice, SliceId, UserId,
};

#[cfg(feature = "serde")]
pub use data::{ElementRecord, LabelDump, LabelRecord};

pub mod parser;

pub mod consensus;

pub mod dataset;

pub mod quality;

pub mod prelude;
