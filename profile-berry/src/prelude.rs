//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Point2d;

pub use crate::data::{
    BooleanMask, Landmark, Profile, ProfileCollection, ProfileType, Segment, SegmentId,
    SegmentedProfile, Statistic,
};

pub use crate::rules::{ProfileIndexFinder, Rule, RuleSet, RuleSetCollection};

pub use crate::fitting::{
    FitterOptions, IterativeSegmentFitter, ProfileSegmenter, ProportionalFitter, SegmentFitter,
    SegmenterOptions,
};

pub use crate::align::{MedianOptions, OffsetOptions, ProfileOffsetter, RepresentativeMedianFinder};

pub use crate::dataset::{
    AnalysisOptions, Dataset, DatasetProfilingMethod, DatasetSegmentationMethod, DatasetValidator,
    Nucleus, SegmentationMode,
};
