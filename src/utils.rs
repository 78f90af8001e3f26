use crate::{Canvas, Error, Mask, MaskConvention};
use std::path::Path;

/// Helper type used to define the source of `ImageSource`'s data
#[derive(Clone)]
pub enum ImageSource<'a> {
    /// A raw buffer of image data, see `image::load_from_memory` for details
    /// on what is supported
    Memory(&'a [u8]),
    /// The path to an image to load from disk. The image format is inferred
    /// from the file extension, see `image::open` for details
    Path(&'a Path),
    /// An already loaded image that is passed directly to the inpainter
    Image(image::DynamicImage),
}

impl<'a> ImageSource<'a> {
    pub fn from_path(path: &'a Path) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<image::DynamicImage> for ImageSource<'a> {
    fn from(img: image::DynamicImage) -> Self {
        Self::Image(img)
    }
}

impl<'a, S> From<&'a S> for ImageSource<'a>
where
    S: AsRef<Path> + 'a,
{
    fn from(path: &'a S) -> Self {
        Self::Path(path.as_ref())
    }
}

pub fn load_dynamic_image(src: ImageSource<'_>) -> Result<image::DynamicImage, image::ImageError> {
    match src {
        ImageSource::Memory(data) => image::load_from_memory(data),
        ImageSource::Path(path) => image::open(path),
        ImageSource::Image(img) => Ok(img),
    }
}

/// Which channel of an image holds a mask
#[derive(Clone, Copy, Debug)]
pub enum ChannelMask {
    R,
    G,
    B,
    A,
}

impl Default for ChannelMask {
    fn default() -> Self {
        ChannelMask::R
    }
}

/// Loads an image as a 3 channel RGB canvas
pub fn load_canvas(src: ImageSource<'_>) -> Result<Canvas, Error> {
    let img = load_dynamic_image(src)?;
    Ok(Canvas::from_dynamic_image(&img))
}

/// Loads a mask from one channel of an image
pub fn load_mask(src: ImageSource<'_>, channel: ChannelMask, convention: MaskConvention) -> Result<Mask, Error> {
    let img = load_dynamic_image(src)?.to_rgba();
    Ok(Mask::from_luma_image(&extract_channel(&img, channel), convention))
}

pub(crate) fn extract_channel(image: &image::RgbaImage, mask: ChannelMask) -> image::GrayImage {
    let channel = match mask {
        ChannelMask::R => 0,
        ChannelMask::G => 1,
        ChannelMask::B => 2,
        ChannelMask::A => 3,
    };

    image::GrayImage::from_fn(image.width(), image.height(), |x, y| {
        image::Luma([image.get_pixel(x, y)[channel]])
    })
}
