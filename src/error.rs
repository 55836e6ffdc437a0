//! Error types for menu-deskew

use thiserror::Error;

/// Errors reported for caller precondition violations.
///
/// Sparse or contradictory line evidence is never an error; it degrades to
/// "no correction" or a full-image crop instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The image has no pixels along at least one axis
    #[error("image has zero size ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Rectangle with an empty or inverted extent
    #[error("invalid crop rectangle: top={top} bottom={bottom} left={left} right={right}")]
    InvalidCrop {
        top: u32,
        bottom: u32,
        left: u32,
        right: u32,
    },

    /// Rectangle does not fit inside the image it is applied to
    #[error("crop rectangle {right}x{bottom} exceeds image size {width}x{height}")]
    CropOutOfBounds {
        bottom: u32,
        right: u32,
        width: u32,
        height: u32,
    },
}

/// Result type for correction operations
pub type Result<T> = std::result::Result<T, Error>;
