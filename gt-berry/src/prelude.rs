//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx2d;
pub use crate::{GtError, GtResult};

pub use crate::{
    Chain, ElementId, Label, LabelElement, LabelId, Rectangle, Scan, ScanId, Shape, ShapeKind,
    SliceId, UserId,
};

#[cfg(feature = "serde")]
pub use crate::LabelDump;

pub use crate::consts::{IOU_THRESHOLD, MIN_ANNOTATIONS, RESIZED_SHAPE};

pub use crate::parser::{convert_one, ShapeParser};

pub use crate::consensus::{ConsensusAlgorithm, Dbscan, GaussianMixture, KMeans, MajorityVoting};

pub use crate::dataset::{DatasetGenerator, GroundTruth};

pub use crate::quality::{
    compute_specificity_and_sensitivity_for_users, labeling_time_vs_score, users_of,
    QualityReport, UserQuality,
};
