use crate::errors::{InvalidRange, OutOfBounds};
use crate::{Coord, Dims, Error};

/// The image being inpainted. Every pixel is a fixed length vector of `f32`
/// channels, 8-bit inputs are stored in the 0-255 range.
///
/// Pixels that are part of the hole are cleared to `NaN` when an inpainter
/// takes ownership of the canvas, so a pixel is "assigned" exactly when all
/// of its channels are finite. `Unknown` mask pixels are left untouched and
/// stay assigned, only holes are unassigned.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    dims: Dims,
    channels: usize,
    data: Vec<f32>,
}

const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

impl Canvas {
    /// Creates a canvas with every channel of every pixel set to `value`
    pub fn new(dims: Dims, channels: usize, value: f32) -> Self {
        Self {
            dims,
            channels,
            data: vec![value; dims.pixel_count() * channels],
        }
    }

    /// Wraps a row-major, channel interleaved buffer
    pub fn from_raw(dims: Dims, channels: usize, data: Vec<f32>) -> Result<Self, Error> {
        if channels == 0 {
            return Err(Error::InvalidRange(InvalidRange {
                min: 1.0,
                max: 64.0,
                value: 0.0,
                name: "channels",
            }));
        }

        if data.len() != dims.pixel_count() * channels {
            return Err(Error::InvalidRange(InvalidRange {
                min: (dims.pixel_count() * channels) as f32,
                max: (dims.pixel_count() * channels) as f32,
                value: data.len() as f32,
                name: "canvas-buffer-length",
            }));
        }

        Ok(Self {
            dims,
            channels,
            data,
        })
    }

    /// Creates a canvas by evaluating `f` for every pixel
    ///
    /// # Panics
    ///
    /// Panics if `channels` is 0.
    pub fn from_fn<F>(dims: Dims, channels: usize, mut f: F) -> Self
    where
        F: FnMut(Coord, &mut [f32]),
    {
        assert!(channels > 0, "a canvas needs at least one channel");
        let mut canvas = Self::new(dims, channels, 0.0);
        for (i, px) in canvas.data.chunks_exact_mut(channels).enumerate() {
            f(Coord::from_flat(i, dims), px);
        }
        canvas
    }

    /// Converts any image into a 3 channel RGB canvas
    pub fn from_dynamic_image(img: &image::DynamicImage) -> Self {
        let rgb = img.to_rgb();
        let dims = Dims::new(rgb.width(), rgb.height());

        Self {
            dims,
            channels: 3,
            data: rgb.into_raw().into_iter().map(f32::from).collect(),
        }
    }

    /// Converts an RGBA image into a 4 channel canvas, eg. for RGB-D data
    /// stored with depth in the alpha channel
    pub fn from_rgba_image(img: &image::RgbaImage) -> Self {
        Self {
            dims: Dims::new(img.width(), img.height()),
            channels: 4,
            data: img.as_raw().iter().copied().map(f32::from).collect(),
        }
    }

    /// Converts a grayscale image into a single channel canvas
    pub fn from_luma_image(img: &image::GrayImage) -> Self {
        Self {
            dims: Dims::new(img.width(), img.height()),
            channels: 1,
            data: img.as_raw().iter().copied().map(f32::from).collect(),
        }
    }

    /// Converts back to 8-bit RGBA. Single channel canvases become gray,
    /// a 4th channel becomes alpha, unassigned pixels become black.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        fn to_u8(v: f32) -> u8 {
            if v.is_finite() {
                v.round().max(0.0).min(255.0) as u8
            } else {
                0
            }
        }

        image::RgbaImage::from_fn(self.dims.width, self.dims.height, |x, y| {
            let px = self.pixel(Coord::new(x, y));
            let rgba = match self.channels {
                1 | 2 => {
                    let v = to_u8(px[0]);
                    [v, v, v, 255]
                }
                3 => [to_u8(px[0]), to_u8(px[1]), to_u8(px[2]), 255],
                _ => [to_u8(px[0]), to_u8(px[1]), to_u8(px[2]), to_u8(px[3])],
            };
            image::Rgba(rgba)
        })
    }

    pub fn to_dynamic_image(&self) -> image::DynamicImage {
        image::DynamicImage::ImageRgba8(self.to_rgba_image())
    }

    #[inline]
    pub fn dims(&self) -> Dims {
        self.dims
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn as_raw(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn pixel(&self, coord: Coord) -> &[f32] {
        let start = coord.to_flat(self.dims) * self.channels;
        &self.data[start..start + self.channels]
    }

    #[inline]
    pub fn pixel_mut(&mut self, coord: Coord) -> &mut [f32] {
        let start = coord.to_flat(self.dims) * self.channels;
        &mut self.data[start..start + self.channels]
    }

    /// Bounds checked pixel access
    pub fn try_pixel(&self, coord: Coord) -> Result<&[f32], Error> {
        if self.dims.contains(coord) {
            Ok(self.pixel(coord))
        } else {
            Err(Error::OutOfBounds(OutOfBounds::Coord(coord, self.dims)))
        }
    }

    pub fn set_pixel(&mut self, coord: Coord, value: &[f32]) {
        self.pixel_mut(coord).copy_from_slice(value);
    }

    /// Copies all channels of the pixel at `from` into `to`
    #[inline]
    pub fn copy_pixel(&mut self, from: Coord, to: Coord) {
        let src = from.to_flat(self.dims) * self.channels;
        let dst = to.to_flat(self.dims) * self.channels;
        self.data.copy_within(src..src + self.channels, dst);
    }

    #[inline]
    pub fn channel(&self, coord: Coord, channel: usize) -> f32 {
        self.data[coord.to_flat(self.dims) * self.channels + channel]
    }

    /// Rec. 601 luma for color canvases, the first channel otherwise
    #[inline]
    pub fn luminance(&self, coord: Coord) -> f32 {
        let px = self.pixel(coord);
        if px.len() >= 3 {
            px[0] * LUMA_WEIGHTS[0] + px[1] * LUMA_WEIGHTS[1] + px[2] * LUMA_WEIGHTS[2]
        } else {
            px[0]
        }
    }

    /// True if the pixel holds a real value rather than the hole sentinel
    #[inline]
    pub fn is_assigned(&self, coord: Coord) -> bool {
        self.pixel(coord).iter().all(|v| v.is_finite())
    }

    /// Replaces the pixel with the hole sentinel
    pub(crate) fn clear(&mut self, coord: Coord) {
        for v in self.pixel_mut(coord) {
            *v = f32::NAN;
        }
    }

    pub(crate) fn check_channel(&self, channel: usize) -> Result<(), Error> {
        if channel < self.channels {
            Ok(())
        } else {
            Err(Error::ChannelMismatch(channel, self.channels))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rgb_roundtrip_keeps_values() {
        let img = image::RgbImage::from_fn(4, 3, |x, y| image::Rgb([x as u8 * 10, y as u8, 200]));
        let canvas = Canvas::from_dynamic_image(&image::DynamicImage::ImageRgb8(img.clone()));

        assert_eq!(canvas.channels(), 3);
        assert_eq!(canvas.pixel(Coord::new(3, 2)), &[30.0, 2.0, 200.0]);

        let back = canvas.to_rgba_image();
        assert_eq!(back.get_pixel(3, 2), &image::Rgba([30, 2, 200, 255]));
    }

    #[test]
    fn cleared_pixels_are_unassigned() {
        let mut canvas = Canvas::new(Dims::new(2, 2), 3, 1.0);
        canvas.clear(Coord::new(1, 0));

        assert!(!canvas.is_assigned(Coord::new(1, 0)));
        assert!(canvas.is_assigned(Coord::new(0, 0)));
        assert_eq!(canvas.to_rgba_image().get_pixel(1, 0), &image::Rgba([0, 0, 0, 255]));

        canvas.copy_pixel(Coord::new(0, 0), Coord::new(1, 0));
        assert!(canvas.is_assigned(Coord::new(1, 0)));
    }

    #[test]
    fn luminance_of_gray_is_gray() {
        let canvas = Canvas::new(Dims::new(1, 1), 3, 100.0);
        assert!((canvas.luminance(Coord::new(0, 0)) - 100.0).abs() < 1e-3);

        let scalar = Canvas::new(Dims::new(1, 1), 1, 42.0);
        assert_eq!(scalar.luminance(Coord::new(0, 0)), 42.0);
    }

    #[test]
    #[should_panic(expected = "at least one channel")]
    fn from_fn_needs_a_channel() {
        Canvas::from_fn(Dims::new(4, 4), 0, |_, _| {});
    }

    #[test]
    fn raw_buffer_length_is_checked() {
        assert!(Canvas::from_raw(Dims::new(2, 2), 3, vec![0.0; 11]).is_err());
        assert!(Canvas::from_raw(Dims::new(2, 2), 0, vec![]).is_err());
        assert!(Canvas::from_raw(Dims::new(2, 2), 3, vec![0.0; 12]).is_ok());
    }
}
