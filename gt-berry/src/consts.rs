//! 通用常量.

/// 形成共识所需的最少独立标注个数. 少于该值的切片没有共识.
pub const MIN_ANNOTATIONS: usize = 2;

/// 标注与共识的 IoU **严格大于** 该值时, 视为命中 (true positive).
pub const IOU_THRESHOLD: f64 = 0.4;

/// 固定维度算法所要求的掩码规范大小 `(h, w)`.
pub const RESIZED_SHAPE: (u32, u32) = (100, 100);

/// 规范大小掩码展平后的长度.
pub const RESIZED_LEN: usize = (RESIZED_SHAPE.0 * RESIZED_SHAPE.1) as usize;

/// 矩形的数值表示长度: `[x1, y1, x2, y2]`.
pub const RECTANGLE_LEN: usize = 4;

/// DBSCAN 邻域半径.
pub const DBSCAN_EPS: f64 = 0.5;

/// DBSCAN 核心点的最少邻居个数 (包括自身).
pub const DBSCAN_MIN_SAMPLES: usize = 2;

/// K-Means 肘部法则搜索的最大簇数.
pub const MAX_NUMBER_OF_CLUSTERS: usize = 5;

/// 随机算法的默认种子.
pub const DEFAULT_SEED: u64 = 42;
