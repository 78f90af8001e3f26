use super::criminisi::{CriminisiPriority, IntensitySource};
use super::Priority;
use crate::field::ScalarField;
use crate::{Canvas, Coord, Error, Mask};

/// Criminisi priority driven by a depth channel instead of color.
///
/// For RGB-D canvases depth discontinuities are usually the structures that
/// should be continued into the hole first, color edges inside a surface
/// matter less.
pub struct DepthPriority {
    inner: CriminisiPriority,
    channel: usize,
}

impl DepthPriority {
    /// Uses canvas channel `channel` as depth
    pub fn new(channel: usize) -> Self {
        Self {
            inner: CriminisiPriority::with_source(IntensitySource::Channel(channel)),
            channel,
        }
    }

    pub fn depth_channel(&self) -> usize {
        self.channel
    }

    pub fn confidence(&self) -> Option<&ScalarField> {
        self.inner.confidence()
    }
}

impl Priority for DepthPriority {
    fn name(&self) -> &'static str {
        "Depth"
    }

    fn initialize(&mut self, canvas: &Canvas, mask: &Mask, patch_radius: u32) -> Result<(), Error> {
        self.inner.initialize(canvas, mask, patch_radius)
    }

    fn compute_priority(&mut self, pixel: Coord, canvas: &Canvas, mask: &Mask) -> Result<f32, Error> {
        self.inner.compute_priority(pixel, canvas, mask)
    }

    fn update(
        &mut self,
        target: Coord,
        filled: &[Coord],
        canvas: &Canvas,
        mask: &Mask,
    ) -> Result<(), Error> {
        self.inner.update(target, filled, canvas, mask)
    }
}
