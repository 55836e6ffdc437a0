//! Crop bounds from the outermost border segments.

use log::debug;

use crate::error::{Error, Result};
use crate::geometry::ClassifiedSegments;

/// A detected width below `width * 0.5` is too narrow to be the document
pub const NARROW_WIDTH_FRACTION: f64 = 0.5;

/// A right bound left of `width / 1.33` is treated as noise
pub const RIGHT_NOISE_DIVISOR: f64 = 1.33;

/// A left bound right of `width / 3` is treated as noise
pub const LEFT_NOISE_DIVISOR: f64 = 3.0;

/// A detected height below `height * 0.75` is too short to be the document
pub const SHORT_HEIGHT_FRACTION: f64 = 0.75;

/// A bottom bound above `height * 0.75` is treated as noise
pub const BOTTOM_NOISE_FRACTION: f64 = 0.75;

/// A top bound below `height / 4` is treated as noise
pub const TOP_NOISE_DIVISOR: f64 = 4.0;

/// Crop region as half-open ranges `top..bottom` and `left..right`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl CropRect {
    /// Rectangle covering the whole image
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            top: 0,
            bottom: height,
            left: 0,
            right: width,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_full(&self, width: u32, height: u32) -> bool {
        *self == Self::full(width, height)
    }

    /// Check that the rectangle is non-empty and fits a `width`x`height` image
    pub fn validate(&self, width: u32, height: u32) -> Result<()> {
        if self.top >= self.bottom || self.left >= self.right {
            return Err(Error::InvalidCrop {
                top: self.top,
                bottom: self.bottom,
                left: self.left,
                right: self.right,
            });
        }
        if self.bottom > height || self.right > width {
            return Err(Error::CropOutOfBounds {
                bottom: self.bottom,
                right: self.right,
                width,
                height,
            });
        }
        Ok(())
    }
}

/// Restore each side of one axis to the image edge when the detected extent
/// is implausibly small and that side sits away from its edge.
fn guard_axis(
    low: i64,
    high: i64,
    extent: u32,
    min_span: f64,
    high_noise: f64,
    low_noise: f64,
) -> (i64, i64) {
    let (mut low, mut high) = (low, high);
    if ((high - low) as f64) < min_span {
        if (high as f64) < high_noise {
            high = extent as i64;
        }
        if (low as f64) > low_noise {
            low = 0;
        }
    }
    (low, high)
}

/// Bounds of the region enclosed by the outermost horizontal and vertical
/// segments, with noisy sides replaced by the image edge.
///
/// Horizontal segments bound the rows (`top = min y2`, `bottom = max y1`),
/// vertical segments bound the columns (`left = min x1`, `right = max x2`).
/// An axis without segments is left uncropped.
pub fn estimate_crop(classified: &ClassifiedSegments, width: u32, height: u32) -> Result<CropRect> {
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }
    let (w, h) = (width as i64, height as i64);

    let (top, bottom) = match (
        classified.horizontal.iter().map(|s| s.segment.y2).min(),
        classified.horizontal.iter().map(|s| s.segment.y1).max(),
    ) {
        (Some(top), Some(bottom)) => ((top as i64).clamp(0, h), (bottom as i64).clamp(0, h)),
        _ => (0, h),
    };

    let (left, right) = match (
        classified.vertical.iter().map(|s| s.segment.x1).min(),
        classified.vertical.iter().map(|s| s.segment.x2).max(),
    ) {
        (Some(left), Some(right)) => ((left as i64).clamp(0, w), (right as i64).clamp(0, w)),
        _ => (0, w),
    };

    debug!(
        "Detected bounds: top={} bottom={} left={} right={}",
        top, bottom, left, right
    );

    let wf = width as f64;
    let hf = height as f64;
    let (left, right) = guard_axis(
        left,
        right,
        width,
        wf * NARROW_WIDTH_FRACTION,
        wf / RIGHT_NOISE_DIVISOR,
        wf / LEFT_NOISE_DIVISOR,
    );
    let (top, bottom) = guard_axis(
        top,
        bottom,
        height,
        hf * SHORT_HEIGHT_FRACTION,
        hf * BOTTOM_NOISE_FRACTION,
        hf / TOP_NOISE_DIVISOR,
    );

    let mut rect = CropRect {
        top: top as u32,
        bottom: bottom as u32,
        left: left as u32,
        right: right as u32,
    };
    // Inverted extents are already excluded by the guards on clamped input;
    // fall back per axis rather than hand back an unusable rectangle.
    if rect.top >= rect.bottom {
        rect.top = 0;
        rect.bottom = height;
    }
    if rect.left >= rect.right {
        rect.left = 0;
        rect.right = width;
    }

    debug!("Crop rectangle: {:?}", rect);
    Ok(rect)
}
