use log::debug;
use nalgebra::{Matrix3, Vector3};

/// Segments with an angle strictly inside (-27°, 27°) are horizontal
pub const HORIZONTAL_LIMIT_DEGREES: f64 = 27.0;

/// Segments with |angle| >= 63° are vertical
pub const VERTICAL_LIMIT_DEGREES: f64 = 63.0;

/// A detected line segment in image pixel coordinates (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Segment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Both endpoints coincide, so the segment has no direction
    pub fn is_degenerate(&self) -> bool {
        self.x1 == self.x2 && self.y1 == self.y2
    }

    /// Orientation in degrees, in (-180, 180]
    ///
    /// Measured from the positive x axis towards positive y, which points down
    /// in image coordinates.
    pub fn angle_degrees(&self) -> f64 {
        let dy = self.y2 as f64 - self.y1 as f64;
        let dx = self.x2 as f64 - self.x1 as f64;
        dy.atan2(dx).to_degrees()
    }

    pub fn length(&self) -> f64 {
        let dy = self.y2 as f64 - self.y1 as f64;
        let dx = self.x2 as f64 - self.x1 as f64;
        dx.hypot(dy)
    }

    /// Euclidean distance from `(x, y)` to the closest point of the segment
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        let (x1, y1) = (self.x1 as f64, self.y1 as f64);
        let (dx, dy) = (self.x2 as f64 - x1, self.y2 as f64 - y1);
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq == 0.0 {
            0.0
        } else {
            (((x - x1) * dx + (y - y1) * dy) / len_sq).clamp(0.0, 1.0)
        };
        (x - (x1 + t * dx)).hypot(y - (y1 + t * dy))
    }
}

/// Orientation class of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Horizontal,
    Vertical,
    /// Diagonal band between the horizontal and vertical limits
    Unclassified,
}

impl Bucket {
    pub fn of_angle(angle: f64) -> Self {
        if angle > -HORIZONTAL_LIMIT_DEGREES && angle < HORIZONTAL_LIMIT_DEGREES {
            Bucket::Horizontal
        } else if angle <= -VERTICAL_LIMIT_DEGREES || angle >= VERTICAL_LIMIT_DEGREES {
            Bucket::Vertical
        } else {
            Bucket::Unclassified
        }
    }
}

/// A segment together with the angle it was classified by
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedSegment {
    pub segment: Segment,
    pub angle: f64,
}

/// Segments of one image partitioned by orientation
#[derive(Debug, Clone, Default)]
pub struct ClassifiedSegments {
    pub horizontal: Vec<ClassifiedSegment>,
    pub vertical: Vec<ClassifiedSegment>,
    /// Number of diagonal segments that were dropped
    pub unclassified: usize,
    /// Number of degenerate or non-finite segments that were dropped
    pub rejected: usize,
}

impl ClassifiedSegments {
    /// True when the provider reported no usable segments at all
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty() && self.unclassified == 0
    }

    /// True when at least one horizontal or vertical segment survived
    pub fn has_evidence(&self) -> bool {
        !self.horizontal.is_empty() || !self.vertical.is_empty()
    }
}

/// Partition segments into horizontal, vertical and unclassified buckets.
///
/// Degenerate segments (coinciding endpoints) are skipped and counted in
/// `rejected`.
pub fn classify_segments(segments: &[Segment]) -> ClassifiedSegments {
    let mut classified = ClassifiedSegments::default();

    for segment in segments {
        if segment.is_degenerate() {
            classified.rejected += 1;
            continue;
        }
        let angle = segment.angle_degrees();
        if !angle.is_finite() {
            classified.rejected += 1;
            continue;
        }

        let entry = ClassifiedSegment {
            segment: *segment,
            angle,
        };
        match Bucket::of_angle(angle) {
            Bucket::Horizontal => classified.horizontal.push(entry),
            Bucket::Vertical => classified.vertical.push(entry),
            Bucket::Unclassified => classified.unclassified += 1,
        }
    }

    debug!(
        "Classified {} segments: {} horizontal, {} vertical, {} diagonal, {} rejected",
        segments.len(),
        classified.horizontal.len(),
        classified.vertical.len(),
        classified.unclassified,
        classified.rejected
    );

    classified
}

/// Arithmetic mean that does not depend on the order of `values`
pub(crate) fn stable_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted.iter().sum::<f64>() / sorted.len() as f64)
}

/// Forward rotation matrix about `center`.
///
/// Positive angles rotate counter-clockwise as the image is displayed
/// (y pointing down), so a border sloping down by `angle` becomes level.
pub fn rotation_matrix(angle_degrees: f64, center: (f64, f64)) -> Matrix3<f64> {
    let theta = angle_degrees.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let (cx, cy) = center;

    let translate_to_origin = Matrix3::new(
        1.0, 0.0, -cx,
        0.0, 1.0, -cy,
        0.0, 0.0, 1.0,
    );

    let rotate = Matrix3::new(
        cos_t, sin_t, 0.0,
        -sin_t, cos_t, 0.0,
        0.0, 0.0, 1.0,
    );

    let translate_back = Matrix3::new(
        1.0, 0.0, cx,
        0.0, 1.0, cy,
        0.0, 0.0, 1.0,
    );

    translate_back * rotate * translate_to_origin
}

/// Transform a point using the affine matrix
pub fn transform_point(matrix: &Matrix3<f64>, x: f64, y: f64) -> (f64, f64) {
    let p = Vector3::new(x, y, 1.0);
    let result = matrix * p;
    (result.x / result.z, result.y / result.z)
}
