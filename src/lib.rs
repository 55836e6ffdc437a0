pub mod cli;
pub mod corrector;
pub mod crop;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod skew;
pub mod transform;

pub use cli::{Cli, Mode};
pub use corrector::MenuCorrector;
pub use crop::{estimate_crop, CropRect};
pub use detection::{DetectionOptions, HoughSegmentDetector, PrecomputedSegments, SegmentDetector};
pub use error::{Error, Result};
pub use geometry::{classify_segments, Bucket, ClassifiedSegment, ClassifiedSegments, Segment};
pub use skew::estimate_skew;
pub use transform::{apply_crop, BicubicRotator, Rotator};
