use crate::{Coord, Dims, Region};
use std::fmt;

#[derive(Debug)]
pub struct InvalidRange {
    pub(crate) min: f32,
    pub(crate) max: f32,
    pub(crate) value: f32,
    pub(crate) name: &'static str,
}

impl fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parameter '{}' - value '{}' is outside the range of {}-{}",
            self.name, self.value, self.min, self.max
        )
    }
}

#[derive(Debug)]
pub struct SizeMismatch {
    pub(crate) image: Dims,
    pub(crate) mask: Dims,
}

impl fmt::Display for SizeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the image size ({}x{}) must match the mask size ({}x{})",
            self.image.width, self.image.height, self.mask.width, self.mask.height
        )
    }
}

/// What was out of bounds, and of which extent
#[derive(Debug)]
pub enum OutOfBounds {
    Coord(Coord, Dims),
    Region(Region, Dims),
}

impl fmt::Display for OutOfBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coord(c, d) => write!(
                f,
                "pixel ({}, {}) is outside of the {}x{} extent",
                c.x, c.y, d.width, d.height
            ),
            Self::Region(r, d) => write!(
                f,
                "region {}x{} at ({}, {}) is outside of the {}x{} extent",
                r.width, r.height, r.x, r.y, d.width, d.height
            ),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    /// An error in the image library occurred, eg failed to load/save
    Image(image::ImageError),
    /// Io is notoriously error free with no problems, but we cover it just in case!
    Io(std::io::Error),
    /// An input parameter had an invalid range specified
    InvalidRange(InvalidRange),
    /// The image and the mask must have the same dimensions
    SizeMismatch(SizeMismatch),
    /// A pixel or region was addressed outside of the image extent, this
    /// always means a region was not cropped before use
    OutOfBounds(OutOfBounds),
    /// The mask is in a state the algorithm can't proceed from
    InvalidMaskState(String),
    /// A target and source patch were compared but the target had no valid
    /// pixels to compare against
    DegenerateComparison(Region),
    /// There was not a single fully valid patch to copy from
    NoSourcePatchesAvailable,
    /// The canvas does not have the channel a strategy was configured to read,
    /// (channel, channel count)
    ChannelMismatch(usize, usize),
    /// An operation was called in the wrong lifecycle state
    InvalidState(&'static str),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Image(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(ie) => write!(f, "{}", ie),
            Self::Io(io) => write!(f, "{}", io),
            Self::InvalidRange(ir) => write!(f, "{}", ir),
            Self::SizeMismatch(sm) => write!(f, "{}", sm),
            Self::OutOfBounds(oob) => write!(f, "{}", oob),
            Self::InvalidMaskState(msg) => write!(f, "invalid mask state: {}", msg),
            Self::DegenerateComparison(region) => write!(
                f,
                "target patch {}x{} at ({}, {}) has no valid pixels to compare",
                region.width, region.height, region.x, region.y
            ),
            Self::NoSourcePatchesAvailable => write!(
                f,
                "no fully valid source patch exists to copy from"
            ),
            Self::ChannelMismatch(channel, count) => write!(
                f,
                "channel {} was requested, but the image only has {} channel(s)",
                channel, count
            ),
            Self::InvalidState(msg) => write!(f, "invalid inpainter state: {}", msg),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(ie: image::ImageError) -> Self {
        Self::Image(ie)
    }
}

impl From<std::io::Error> for Error {
    fn from(io: std::io::Error) -> Self {
        Self::Io(io)
    }
}
