use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::detection::DetectionOptions;

/// Which correction to apply
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Rotate so the document border is level
    Deskew,
    /// Cut away the background outside the document border
    Crop,
    /// Deskew, then crop the straightened image
    #[default]
    Both,
    /// Draw the detected line segments instead of correcting
    Outline,
}

#[derive(Parser, Debug)]
#[command(name = "menu-deskew")]
#[command(version, about = "Straighten and crop photographed documents using their border lines")]
pub struct Cli {
    /// Input image path
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output path [default: input_corrected.<ext>]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Correction to apply
    #[arg(short, long, value_enum, default_value_t = Mode::Both)]
    pub mode: Mode,

    /// Show detection details
    #[arg(long)]
    pub verbose: bool,

    /// Fill value (0-255) for pixels uncovered by rotation
    #[arg(long, default_value = "0")]
    pub background: u8,

    /// Lower Canny hysteresis threshold
    #[arg(long, default_value = "100")]
    pub canny_low: f32,

    /// Upper Canny hysteresis threshold
    #[arg(long, default_value = "200")]
    pub canny_high: f32,

    /// Minimum Hough votes for a line
    #[arg(long, default_value = "100")]
    pub vote_threshold: u32,

    /// Shortest line segment kept, in pixels
    #[arg(long, default_value = "100")]
    pub min_line_length: u32,

    /// Longest gap bridged inside one line segment, in pixels
    #[arg(long, default_value = "400")]
    pub max_line_gap: u32,
}

impl Cli {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self.input.file_stem().unwrap_or_default().to_string_lossy();
            let ext = self
                .input
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "png".to_string());
            let parent = self.input.parent().unwrap_or(Path::new("."));
            parent.join(format!("{}_corrected.{}", stem, ext))
        })
    }

    pub fn detection_options(&self) -> Result<DetectionOptions, String> {
        if self.canny_low > self.canny_high {
            return Err(format!(
                "--canny-low ({}) must not exceed --canny-high ({})",
                self.canny_low, self.canny_high
            ));
        }

        Ok(DetectionOptions {
            canny_low: self.canny_low,
            canny_high: self.canny_high,
            vote_threshold: self.vote_threshold,
            min_line_length: self.min_line_length,
            max_line_gap: self.max_line_gap,
            ..Default::default()
        })
    }
}
