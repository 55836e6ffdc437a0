use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use imageproc::morphology::dilate;
use log::debug;

use crate::geometry::Segment;

/// Source of straight-line evidence for an image
pub trait SegmentDetector {
    /// Segments lying on strong edges; empty when nothing was found
    fn detect_segments(&self, image: &DynamicImage) -> Vec<Segment>;
}

/// Segments known ahead of time, returned for every image
#[derive(Debug, Clone, Default)]
pub struct PrecomputedSegments(pub Vec<Segment>);

impl SegmentDetector for PrecomputedSegments {
    fn detect_segments(&self, _image: &DynamicImage) -> Vec<Segment> {
        self.0.clone()
    }
}

/// Tuning of the edge and line detection chain
#[derive(Debug, Clone)]
pub struct DetectionOptions {
    /// Gaussian sigma applied before edge detection (5x5 kernel equivalent)
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// L-infinity radius of the square dilation applied to the edge map
    pub dilation_radius: u8,
    /// Minimum accumulator votes for a Hough line
    pub vote_threshold: u32,
    pub suppression_radius: u32,
    /// Shortest segment kept, in pixels
    pub min_line_length: u32,
    /// Longest run of non-edge pixels bridged inside one segment
    pub max_line_gap: u32,
    /// Smallest fraction of a segment's samples that must be edge pixels
    pub min_edge_density: f32,
    /// Edge pixels within this distance of an accepted segment are claimed by
    /// it and no longer support other lines
    pub claim_radius: f32,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 100.0,
            canny_high: 200.0,
            dilation_radius: 4,
            vote_threshold: 100,
            suppression_radius: 8,
            min_line_length: 100,
            max_line_gap: 400,
            min_edge_density: 0.5,
            claim_radius: 15.0,
        }
    }
}

/// Blur, Canny, dilation and Hough transform, with each Hough line cut into
/// the segments actually covered by edge pixels.
///
/// Lines are visited from best to worst supported; the edge pixels around
/// every accepted segment are removed before the next line is cut, so a thick
/// border band yields one segment instead of a fan of slightly tilted ones.
///
/// Near-horizontal segments are emitted left to right (`x1 <= x2`) and
/// near-vertical ones top to bottom (`y1 <= y2`).
#[derive(Debug, Clone, Default)]
pub struct HoughSegmentDetector {
    pub options: DetectionOptions,
}

impl HoughSegmentDetector {
    pub fn new(options: DetectionOptions) -> Self {
        Self { options }
    }

    /// Dilated edge map that the Hough transform votes on
    pub fn edge_map(&self, image: &DynamicImage) -> GrayImage {
        let gray = image.to_luma8();
        let blurred = gaussian_blur_f32(&gray, self.options.blur_sigma);
        let edges = canny(&blurred, self.options.canny_low, self.options.canny_high);
        if self.options.dilation_radius == 0 {
            edges
        } else {
            dilate(&edges, Norm::LInf, self.options.dilation_radius)
        }
    }
}

impl SegmentDetector for HoughSegmentDetector {
    fn detect_segments(&self, image: &DynamicImage) -> Vec<Segment> {
        let edges = self.edge_map(image);

        let options = LineDetectionOptions {
            vote_threshold: self.options.vote_threshold,
            suppression_radius: self.options.suppression_radius,
        };
        let polar_lines = detect_lines(&edges, options);
        let segments = extract_segments(&edges, &polar_lines, &self.options);

        debug!(
            "Detected {} Hough lines, {} segments",
            polar_lines.len(),
            segments.len()
        );

        segments
    }
}

/// Cut polar lines into segments, strongest line first, claiming the edge
/// pixels of every accepted segment.
fn extract_segments(
    edges: &GrayImage,
    lines: &[PolarLine],
    options: &DetectionOptions,
) -> Vec<Segment> {
    let mut ranked: Vec<(usize, &PolarLine)> = lines
        .iter()
        .map(|line| (sample_line(edges, line).len(), line))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let mut remaining = edges.clone();
    let mut segments = Vec::new();

    for (_, line) in ranked {
        let found = split_line(
            &remaining,
            line,
            options.min_line_length as f64,
            options.max_line_gap as usize,
            options.min_edge_density as f64,
        );
        for segment in &found {
            claim_pixels(&mut remaining, segment, options.claim_radius as f64);
        }
        segments.extend(found);
    }

    segments
}

/// Clear every edge pixel within `radius` of `segment`
fn claim_pixels(edges: &mut GrayImage, segment: &Segment, radius: f64) {
    if radius <= 0.0 {
        return;
    }
    let (width, height) = edges.dimensions();
    let pad = radius.ceil() as i64;
    let x_min = (segment.x1.min(segment.x2) as i64 - pad).max(0);
    let x_max = (segment.x1.max(segment.x2) as i64 + pad).min(width as i64 - 1);
    let y_min = (segment.y1.min(segment.y2) as i64 - pad).max(0);
    let y_max = (segment.y1.max(segment.y2) as i64 + pad).min(height as i64 - 1);

    for y in y_min..=y_max {
        for x in x_min..=x_max {
            if segment.distance_to(x as f64, y as f64) <= radius {
                edges.put_pixel(x as u32, y as u32, Luma([0]));
            }
        }
    }
}

/// Edge pixels under a polar line, in order along its dominant axis
fn sample_line(edges: &GrayImage, line: &PolarLine) -> Vec<(usize, i32, i32)> {
    let (width, height) = edges.dimensions();
    let theta = (line.angle_in_degrees as f64).to_radians();
    let r = line.r as f64;

    let cos_t = theta.cos();
    let sin_t = theta.sin();

    let mut hits = Vec::new();

    if sin_t.abs() > cos_t.abs() {
        // More horizontal line - iterate over x
        for x in 0..width {
            let y = ((r - x as f64 * cos_t) / sin_t).round() as i64;
            if y >= 0 && y < height as i64 && edges.get_pixel(x, y as u32)[0] > 0 {
                hits.push((x as usize, x as i32, y as i32));
            }
        }
    } else {
        // More vertical line - iterate over y
        for y in 0..height {
            let x = ((r - y as f64 * sin_t) / cos_t).round() as i64;
            if x >= 0 && x < width as i64 && edges.get_pixel(x as u32, y)[0] > 0 {
                hits.push((y as usize, x as i32, y as i32));
            }
        }
    }

    hits
}

/// An open run of edge hits along a line
#[derive(Debug, Clone, Copy)]
struct Run {
    start: (i32, i32),
    start_step: usize,
    end: (i32, i32),
    end_step: usize,
    hits: usize,
}

/// Cut a polar line into segments separated by gaps longer than `max_gap`,
/// keeping those that are long enough and mostly covered by edge pixels
fn split_line(
    edges: &GrayImage,
    line: &PolarLine,
    min_length: f64,
    max_gap: usize,
    min_density: f64,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut run: Option<Run> = None;

    let mut close = |run: Run| {
        let segment = Segment::new(run.start.0, run.start.1, run.end.0, run.end.1);
        let density = run.hits as f64 / (run.end_step - run.start_step + 1) as f64;
        if !segment.is_degenerate() && segment.length() >= min_length && density >= min_density {
            segments.push(segment);
        }
    };

    for (step, x, y) in sample_line(edges, line) {
        let fresh = Run {
            start: (x, y),
            start_step: step,
            end: (x, y),
            end_step: step,
            hits: 1,
        };
        run = match run {
            Some(current) if step - current.end_step - 1 <= max_gap => Some(Run {
                end: (x, y),
                end_step: step,
                hits: current.hits + 1,
                ..current
            }),
            Some(current) => {
                close(current);
                Some(fresh)
            }
            None => Some(fresh),
        };
    }
    if let Some(current) = run {
        close(current);
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal_polar(y: f32) -> PolarLine {
        PolarLine {
            r: y,
            angle_in_degrees: 90,
        }
    }

    #[test]
    fn test_precomputed_segments() {
        let provider = PrecomputedSegments(vec![Segment::new(0, 0, 10, 1)]);
        let image = DynamicImage::new_luma8(4, 4);
        assert_eq!(provider.detect_segments(&image), vec![Segment::new(0, 0, 10, 1)]);
    }

    #[test]
    fn test_split_line_bridges_short_gaps() {
        let mut edges = GrayImage::new(300, 50);
        for x in (10..120).chain(130..250) {
            edges.put_pixel(x, 20, Luma([255]));
        }
        let segments = split_line(&edges, &horizontal_polar(20.0), 50.0, 20, 0.5);
        assert_eq!(segments, vec![Segment::new(10, 20, 249, 20)]);
    }

    #[test]
    fn test_split_line_splits_long_gaps() {
        let mut edges = GrayImage::new(300, 50);
        for x in (0..100).chain(200..300) {
            edges.put_pixel(x, 20, Luma([255]));
        }
        let segments = split_line(&edges, &horizontal_polar(20.0), 50.0, 20, 0.5);
        assert_eq!(
            segments,
            vec![Segment::new(0, 20, 99, 20), Segment::new(200, 20, 299, 20)]
        );
    }

    #[test]
    fn test_split_line_drops_short_runs() {
        let mut edges = GrayImage::new(300, 50);
        for x in 10..40 {
            edges.put_pixel(x, 20, Luma([255]));
        }
        assert!(split_line(&edges, &horizontal_polar(20.0), 50.0, 20, 0.5).is_empty());
    }

    #[test]
    fn test_split_line_drops_sparse_bridged_runs() {
        // Two short blobs bridged by a long gap, as when a tilted line only
        // clips two border bands
        let mut edges = GrayImage::new(400, 50);
        for x in (0..30).chain(370..400) {
            edges.put_pixel(x, 20, Luma([255]));
        }
        assert!(split_line(&edges, &horizontal_polar(20.0), 100.0, 400, 0.5).is_empty());
        assert_eq!(
            split_line(&edges, &horizontal_polar(20.0), 100.0, 400, 0.0),
            vec![Segment::new(0, 20, 399, 20)]
        );
    }

    #[test]
    fn test_thick_band_yields_one_segment() {
        let mut edges = GrayImage::new(400, 100);
        for y in 40..54 {
            for x in 20..380 {
                edges.put_pixel(x, y, Luma([255]));
            }
        }
        // Two parallel lines inside the band and one tilted by 2 degrees
        // through its center
        let tilted_r = (200.0 * 92f64.to_radians().cos() + 47.0 * 92f64.to_radians().sin()) as f32;
        let lines = [
            horizontal_polar(47.0),
            horizontal_polar(43.0),
            PolarLine {
                r: tilted_r,
                angle_in_degrees: 92,
            },
        ];

        let segments = extract_segments(&edges, &lines, &DetectionOptions::default());
        assert_eq!(segments.len(), 1, "{:?}", segments);
        assert!(segments[0].angle_degrees().abs() < 3.0);
        assert!((40..54).contains(&segments[0].y1));
    }

    #[test]
    fn test_claim_pixels_clears_corridor() {
        let mut edges = GrayImage::from_pixel(100, 60, Luma([255]));
        claim_pixels(&mut edges, &Segment::new(10, 30, 90, 30), 5.0);
        assert_eq!(edges.get_pixel(50, 30)[0], 0);
        assert_eq!(edges.get_pixel(50, 35)[0], 0);
        assert_eq!(edges.get_pixel(50, 36)[0], 255);
        assert_eq!(edges.get_pixel(2, 30)[0], 255);
    }

    #[test]
    fn test_vertical_line_runs_top_to_bottom() {
        let mut edges = GrayImage::new(50, 300);
        for y in 5..280 {
            edges.put_pixel(30, y, Luma([255]));
        }
        let line = PolarLine {
            r: 30.0,
            angle_in_degrees: 0,
        };
        let segments = split_line(&edges, &line, 50.0, 20, 0.5);
        assert_eq!(segments, vec![Segment::new(30, 5, 30, 279)]);
        assert_eq!(segments[0].angle_degrees(), 90.0);
    }

    #[test]
    fn test_blank_image_has_no_segments() {
        let image = DynamicImage::new_luma8(200, 200);
        let detector = HoughSegmentDetector::default();
        assert!(detector.detect_segments(&image).is_empty());
    }
}
