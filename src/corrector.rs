//! Deskew and crop pipelines over injected line detection and rotation.
//!
//! Both pipelines classify the detected segments the same way and are
//! otherwise independent: a caller may deskew, crop, or do both in sequence.
//! Whenever the evidence is too weak the input image comes back unchanged.

use image::DynamicImage;
use log::{debug, info};

use crate::crop::{estimate_crop, CropRect};
use crate::detection::{HoughSegmentDetector, SegmentDetector};
use crate::error::{Error, Result};
use crate::geometry::{classify_segments, ClassifiedSegments};
use crate::skew::estimate_skew;
use crate::transform::{apply_crop, draw_segments, BicubicRotator, Rotator};
use crate::transform::{OUTLINE_COLOR, OUTLINE_THICKNESS};

/// Document straightening and cropping driven by detected border lines
#[derive(Debug, Clone, Default)]
pub struct MenuCorrector<D = HoughSegmentDetector, R = BicubicRotator> {
    detector: D,
    rotator: R,
}

impl<D: SegmentDetector, R: Rotator> MenuCorrector<D, R> {
    pub fn new(detector: D, rotator: R) -> Self {
        Self { detector, rotator }
    }

    pub fn rotator(&self) -> &R {
        &self.rotator
    }

    /// Detect and classify the segments of `image`
    pub fn classify(&self, image: &DynamicImage) -> Result<ClassifiedSegments> {
        ensure_not_empty(image)?;
        let segments = self.detector.detect_segments(image);
        Ok(classify_segments(&segments))
    }

    /// Rotation that levels the document, or `None` if no correction applies
    pub fn estimate_skew(&self, image: &DynamicImage) -> Result<Option<f64>> {
        let classified = self.classify(image)?;
        Ok(estimate_skew(&classified, image.width()))
    }

    /// Region bounded by the document border; the full image when no border
    /// is found
    pub fn estimate_crop(&self, image: &DynamicImage) -> Result<CropRect> {
        let classified = self.classify(image)?;
        estimate_crop(&classified, image.width(), image.height())
    }

    /// Rotate `image` so its border lines are axis aligned
    pub fn deskew(&self, image: &DynamicImage) -> Result<DynamicImage> {
        match self.estimate_skew(image)? {
            Some(angle) => {
                info!("Rotating by {:.3}°", angle);
                Ok(self.rotator.rotate(image, angle))
            }
            None => {
                info!("No reliable border lines, leaving image unrotated");
                Ok(image.clone())
            }
        }
    }

    /// Crop `image` to the region enclosed by its border lines
    pub fn crop(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let classified = self.classify(image)?;
        if classified.is_empty() {
            info!("No lines detected, leaving image uncropped");
            return Ok(image.clone());
        }

        let rect = estimate_crop(&classified, image.width(), image.height())?;
        if rect.is_full(image.width(), image.height()) {
            debug!("Crop covers the whole image");
            return Ok(image.clone());
        }
        info!(
            "Cropping to rows {}..{} columns {}..{}",
            rect.top, rect.bottom, rect.left, rect.right
        );
        apply_crop(image, &rect)
    }

    /// Deskew, then crop the straightened image
    pub fn correct(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let deskewed = self.deskew(image)?;
        self.crop(&deskewed)
    }

    /// Copy of `image` with every detected segment drawn in green.
    ///
    /// Strokes go onto the input itself, not the blurred detection buffer, so
    /// the page stays sharp under the overlay.
    pub fn outline(&self, image: &DynamicImage) -> Result<DynamicImage> {
        ensure_not_empty(image)?;
        let segments = self.detector.detect_segments(image);
        info!("Outlining {} detected segments", segments.len());
        let canvas = draw_segments(image, &segments, OUTLINE_COLOR, OUTLINE_THICKNESS)?;
        Ok(DynamicImage::ImageRgb8(canvas))
    }
}

fn ensure_not_empty(image: &DynamicImage) -> Result<()> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }
    Ok(())
}
