use image::{DynamicImage, ImageBuffer, Pixel, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use log::{debug, warn};

use crate::crop::CropRect;
use crate::error::{Error, Result};
use crate::geometry::{rotation_matrix, transform_point, Segment};

/// Stroke colour used when outlining detected segments
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Stroke width used when outlining detected segments
pub const OUTLINE_THICKNESS: u32 = 10;

/// Rigid rotation of an image about its center
pub trait Rotator {
    /// Rotate by `angle_degrees` (positive is counter-clockwise as displayed)
    /// about `(width / 2, height / 2)`, keeping the input dimensions.
    fn rotate(&self, image: &DynamicImage, angle_degrees: f64) -> DynamicImage;
}

/// Inverse-mapped rotation with bicubic (Catmull-Rom) interpolation
#[derive(Debug, Clone, Copy, Default)]
pub struct BicubicRotator {
    /// Value written to every channel of pixels with no source
    pub background: u8,
}

impl BicubicRotator {
    pub fn new(background: u8) -> Self {
        Self { background }
    }
}

impl Rotator for BicubicRotator {
    fn rotate(&self, image: &DynamicImage, angle_degrees: f64) -> DynamicImage {
        let bg = self.background;
        match image {
            DynamicImage::ImageLuma8(img) => {
                DynamicImage::ImageLuma8(rotate_buffer(img, angle_degrees, bg))
            }
            DynamicImage::ImageLumaA8(img) => {
                DynamicImage::ImageLumaA8(rotate_buffer(img, angle_degrees, bg))
            }
            DynamicImage::ImageRgb8(img) => {
                DynamicImage::ImageRgb8(rotate_buffer(img, angle_degrees, bg))
            }
            DynamicImage::ImageRgba8(img) => {
                DynamicImage::ImageRgba8(rotate_buffer(img, angle_degrees, bg))
            }
            DynamicImage::ImageLuma16(img) => {
                DynamicImage::ImageLuma16(rotate_buffer(img, angle_degrees, bg))
            }
            DynamicImage::ImageLumaA16(img) => {
                DynamicImage::ImageLumaA16(rotate_buffer(img, angle_degrees, bg))
            }
            DynamicImage::ImageRgb16(img) => {
                DynamicImage::ImageRgb16(rotate_buffer(img, angle_degrees, bg))
            }
            DynamicImage::ImageRgba16(img) => {
                DynamicImage::ImageRgba16(rotate_buffer(img, angle_degrees, bg))
            }
            DynamicImage::ImageRgb32F(img) => {
                DynamicImage::ImageRgb32F(rotate_buffer(img, angle_degrees, bg))
            }
            DynamicImage::ImageRgba32F(img) => {
                DynamicImage::ImageRgba32F(rotate_buffer(img, angle_degrees, bg))
            }
            other => {
                warn!("Unknown pixel format {:?}, rotating as RGBA8", other.color());
                DynamicImage::ImageRgba8(rotate_buffer(&other.to_rgba8(), angle_degrees, bg))
            }
        }
    }
}

/// Channel value type that can be resampled
pub trait Sample: Copy + Into<f64> {
    /// Nearest representable value, saturating for integer types
    fn from_f64(value: f64) -> Self;

    /// The 8-bit level `level` expressed in this type's range
    fn from_level(level: u8) -> Self;
}

impl Sample for u8 {
    fn from_f64(value: f64) -> Self {
        value.round().clamp(0.0, u8::MAX as f64) as u8
    }

    fn from_level(level: u8) -> Self {
        level
    }
}

impl Sample for u16 {
    fn from_f64(value: f64) -> Self {
        value.round().clamp(0.0, u16::MAX as f64) as u16
    }

    fn from_level(level: u8) -> Self {
        level as u16 * 257
    }
}

impl Sample for f32 {
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn from_level(level: u8) -> Self {
        level as f32 / 255.0
    }
}

/// Cubic interpolation kernel (Catmull-Rom)
fn cubic_weight(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;

    [
        -0.5 * t3 + t2 - 0.5 * t,
        1.5 * t3 - 2.5 * t2 + 1.0,
        -1.5 * t3 + 2.0 * t2 + 0.5 * t,
        0.5 * t3 - 0.5 * t2,
    ]
}

/// Bicubic interpolation of every channel at a given position
fn bicubic_interpolate<S: Sample>(
    raw: &[S],
    channels: usize,
    width: u32,
    height: u32,
    x: f64,
    y: f64,
) -> [f64; 4] {
    let x_floor = x.floor() as i32;
    let y_floor = y.floor() as i32;

    let wx = cubic_weight(x - x.floor());
    let wy = cubic_weight(y - y.floor());

    let mut result = [0.0; 4];

    for j in 0..4 {
        for i in 0..4 {
            let px = (x_floor + i as i32 - 1).clamp(0, width as i32 - 1) as usize;
            let py = (y_floor + j as i32 - 1).clamp(0, height as i32 - 1) as usize;
            let idx = (py * width as usize + px) * channels;

            let weight = wx[i] * wy[j];
            for c in 0..channels {
                result[c] += raw[idx + c].into() * weight;
            }
        }
    }

    result
}

/// Rotate a buffer about its center, keeping its dimensions and pixel type
pub fn rotate_buffer<P>(
    img: &ImageBuffer<P, Vec<P::Subpixel>>,
    angle_degrees: f64,
    background: u8,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
    P::Subpixel: Sample,
{
    let (width, height) = img.dimensions();
    let center = ((width / 2) as f64, (height / 2) as f64);
    let forward = rotation_matrix(angle_degrees, center);

    let inverse = match forward.try_inverse() {
        Some(inv) => inv,
        None => {
            warn!("Could not invert rotation matrix, returning original image");
            return img.clone();
        }
    };

    let channels = P::CHANNEL_COUNT as usize;
    let raw: &[P::Subpixel] = img.as_raw();
    let fill = P::Subpixel::from_level(background);
    let mut output: ImageBuffer<P, Vec<P::Subpixel>> = ImageBuffer::new(width, height);
    let max_x = width as f64 - 1.0;
    let max_y = height as f64 - 1.0;

    for (out_x, out_y, pixel) in output.enumerate_pixels_mut() {
        let (src_x, src_y) = transform_point(&inverse, out_x as f64, out_y as f64);
        let values = pixel.channels_mut();

        if src_x >= 0.0 && src_x <= max_x && src_y >= 0.0 && src_y <= max_y {
            let interpolated = bicubic_interpolate(raw, channels, width, height, src_x, src_y);
            for (c, value) in values.iter_mut().enumerate() {
                *value = Sample::from_f64(interpolated[c]);
            }
        } else {
            values.fill(fill);
        }
    }

    output
}

/// Cut `rect` out of `image`
pub fn apply_crop(image: &DynamicImage, rect: &CropRect) -> Result<DynamicImage> {
    let (width, height) = (image.width(), image.height());
    rect.validate(width, height)?;

    debug!(
        "Cropping {}x{} to rows {}..{} columns {}..{}",
        width, height, rect.top, rect.bottom, rect.left, rect.right
    );

    Ok(image.crop_imm(rect.left, rect.top, rect.width(), rect.height()))
}

/// Draw `segments` onto an RGB copy of `image` as thick strokes
pub fn draw_segments(
    image: &DynamicImage,
    segments: &[Segment],
    color: Rgb<u8>,
    thickness: u32,
) -> Result<RgbImage> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }

    let mut canvas = image.to_rgb8();
    let thickness = thickness.max(1);

    for segment in segments.iter().filter(|s| !s.is_degenerate()) {
        let (x1, y1) = (segment.x1 as f32, segment.y1 as f32);
        let (x2, y2) = (segment.x2 as f32, segment.y2 as f32);
        let length = segment.length() as f32;
        // Unit normal of the segment
        let (nx, ny) = (-(y2 - y1) / length, (x2 - x1) / length);

        for k in 0..thickness {
            let offset = k as f32 - (thickness - 1) as f32 / 2.0;
            draw_line_segment_mut(
                &mut canvas,
                (x1 + nx * offset, y1 + ny * offset),
                (x2 + nx * offset, y2 + ny * offset),
                color,
            );
        }
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Luma, Rgba, RgbaImage};

    #[test]
    fn test_zero_rotation_is_identity() {
        let mut img = RgbImage::new(9, 7);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgb([(x * 20) as u8, (y * 30) as u8, 7]);
        }
        let rotated = rotate_buffer(&img, 0.0, 0);
        assert_eq!(rotated, img);
    }

    #[test]
    fn test_rotation_keeps_dimensions_and_fills_corners() {
        let img = RgbaImage::from_pixel(40, 20, Rgba([200, 100, 50, 255]));
        let rotated = rotate_buffer(&img, 30.0, 0);
        assert_eq!(rotated.dimensions(), (40, 20));
        assert_eq!(*rotated.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*rotated.get_pixel(20, 10), Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_rotation_direction() {
        // A bright pixel right of center moves up for a counter-clockwise turn
        let mut img = image::GrayImage::new(21, 21);
        img.put_pixel(18, 10, Luma([255]));
        let rotated = rotate_buffer(&img, 90.0, 0);
        assert_eq!(rotated.get_pixel(10, 2)[0], 255);
        assert_eq!(rotated.get_pixel(18, 10)[0], 0);
    }

    #[test]
    fn test_rotator_preserves_color_type() {
        let rotator = BicubicRotator::new(255);
        let gray = DynamicImage::new_luma8(10, 10);
        assert!(matches!(rotator.rotate(&gray, 3.0), DynamicImage::ImageLuma8(_)));
        let rgb16 = DynamicImage::new_rgb16(10, 10);
        assert!(matches!(rotator.rotate(&rgb16, 3.0), DynamicImage::ImageRgb16(_)));
    }

    #[test]
    fn test_sixteen_bit_keeps_depth() {
        let mut img = ImageBuffer::<Luma<u16>, Vec<u16>>::new(20, 20);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Luma([1000 + (x * 20 + y) as u16 * 50]);
        }
        assert_eq!(rotate_buffer(&img, 0.0, 0), img);

        let rotator = BicubicRotator::new(255);
        let rotated = rotator.rotate(&DynamicImage::ImageLuma16(img), 3.0);
        let DynamicImage::ImageLuma16(rotated) = rotated else {
            panic!("expected a 16-bit grayscale image");
        };
        assert_eq!(rotated.dimensions(), (20, 20));
        assert_eq!(rotated.get_pixel(0, 0)[0], u16::MAX);
        assert!(rotated.get_pixel(10, 10)[0] > 255);
    }

    #[test]
    fn test_float_image_keeps_type() {
        let img = DynamicImage::new_rgb32f(12, 12);
        let rotator = BicubicRotator::default();
        assert!(matches!(rotator.rotate(&img, 5.0), DynamicImage::ImageRgb32F(_)));
    }

    #[test]
    fn test_apply_crop() {
        let image = DynamicImage::new_rgb8(40, 30);
        let rect = CropRect {
            top: 5,
            bottom: 25,
            left: 10,
            right: 30,
        };
        let cropped = apply_crop(&image, &rect).unwrap();
        assert_eq!(cropped.dimensions(), (20, 20));
    }

    #[test]
    fn test_apply_crop_rejects_mismatched_image() {
        let image = DynamicImage::new_rgb8(40, 30);
        let rect = CropRect::full(50, 30);
        assert!(matches!(
            apply_crop(&image, &rect),
            Err(Error::CropOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_draw_segments_marks_pixels() {
        let image = DynamicImage::new_rgb8(50, 50);
        let canvas = draw_segments(
            &image,
            &[Segment::new(5, 25, 45, 25)],
            OUTLINE_COLOR,
            OUTLINE_THICKNESS,
        )
        .unwrap();
        assert_eq!(*canvas.get_pixel(25, 25), OUTLINE_COLOR);
        assert_eq!(*canvas.get_pixel(25, 21), OUTLINE_COLOR);
        assert_eq!(*canvas.get_pixel(25, 5), Rgb([0, 0, 0]));
    }
}
