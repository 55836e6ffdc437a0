//! Skew estimation from classified border segments.
//!
//! Horizontal segments are preferred: their mean angle is the skew. Without
//! any, opposite left/right borders are searched among the vertical segments
//! and their mean angle, moved into the horizontal frame, is used instead.

use log::{debug, trace};

use crate::geometry::{stable_mean, ClassifiedSegment, ClassifiedSegments};

/// Two vertical segments must be further apart than `width / 3` to be
/// opposite borders rather than the same border detected twice
pub const PAIR_MIN_SEPARATION_DIVISOR: f64 = 3.0;

/// Opposite borders must be within this many degrees of parallel
pub const PAIR_MAX_ANGLE_DIFF_DEGREES: f64 = 10.0;

/// Shift negative angles up by 180° so both ends of the ±90° branch cut
/// land on the same side; 180 stays 180
fn normalize_vertical(angle: f64) -> f64 {
    if angle < 0.0 {
        angle + 180.0
    } else {
        angle
    }
}

/// Mean normalized angle of `a` and `b` if they look like opposite borders
pub fn complementary_pair_angle(
    a: &ClassifiedSegment,
    b: &ClassifiedSegment,
    width: u32,
) -> Option<f64> {
    let dx1 = a.segment.x1 as f64 - b.segment.x1 as f64;
    let dx2 = a.segment.x2 as f64 - b.segment.x2 as f64;
    let x_diff = ((dx1 + dx2) / 2.0).abs();
    let angle_diff = (a.angle.abs() - b.angle.abs()).abs();

    let separated = x_diff > width as f64 / PAIR_MIN_SEPARATION_DIVISOR;
    let parallel = angle_diff < PAIR_MAX_ANGLE_DIFF_DEGREES;
    trace!(
        "Pair {:?} / {:?}: x_diff={:.1} angle_diff={:.2} accepted={}",
        a.segment,
        b.segment,
        x_diff,
        angle_diff,
        separated && parallel
    );

    if separated && parallel {
        Some((normalize_vertical(a.angle) + normalize_vertical(b.angle)) / 2.0)
    } else {
        None
    }
}

/// Skew from vertical segments that pair up as opposite borders
pub fn vertical_pair_skew(vertical: &[ClassifiedSegment], width: u32) -> Option<f64> {
    let mut pair_angles = Vec::new();
    for (i, a) in vertical.iter().enumerate() {
        for b in &vertical[i + 1..] {
            if let Some(angle) = complementary_pair_angle(a, b, width) {
                pair_angles.push(angle);
            }
        }
    }

    debug!(
        "Vertical fallback: {} complementary pairs among {} segments",
        pair_angles.len(),
        vertical.len()
    );

    stable_mean(&pair_angles).map(|mean| mean - 90.0)
}

/// Rotation in degrees that levels the document, or `None` when the evidence
/// does not support a correction.
pub fn estimate_skew(classified: &ClassifiedSegments, width: u32) -> Option<f64> {
    if !classified.horizontal.is_empty() {
        let angles: Vec<f64> = classified.horizontal.iter().map(|s| s.angle).collect();
        let skew = stable_mean(&angles);
        debug!(
            "Skew from {} horizontal segments: {:?}",
            angles.len(),
            skew
        );
        return skew;
    }

    if !classified.vertical.is_empty() {
        return vertical_pair_skew(&classified.vertical, width);
    }

    debug!("No horizontal or vertical segments, skipping rotation");
    None
}
