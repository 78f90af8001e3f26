use crate::errors::OutOfBounds;
use crate::{Canvas, Coord, Error, Mask, PatchPair};

/// Copies the source half of a [`PatchPair`] into the hole pixels of its
/// target half.
///
/// Pixels that are already valid are never touched, even inside the target
/// window, which is what keeps inpainting from degrading into blitting.
#[derive(Copy, Clone, Debug, Default)]
pub struct PatchInpainter;

impl PatchInpainter {
    pub fn new() -> Self {
        Self
    }

    /// Fills the hole pixels of `pair.target` and marks them valid. Returns
    /// the filled pixels in raster order.
    ///
    /// Nothing is written unless every pixel to be filled has a valid
    /// counterpart in the source window.
    pub fn paint(&self, canvas: &mut Canvas, mask: &mut Mask, pair: &PatchPair) -> Result<Vec<Coord>, Error> {
        let dims = mask.dims();
        for region in &[pair.target, pair.source] {
            if !region.is_inside(dims) {
                return Err(Error::OutOfBounds(OutOfBounds::Region(*region, dims)));
            }
        }

        let fills: Vec<(Coord, Coord)> = pair
            .coords()
            .filter(|(target, _)| mask.hole_at(*target))
            .collect();

        if let Some((_, source)) = fills.iter().find(|(_, source)| !mask.valid_at(*source)) {
            return Err(Error::InvalidMaskState(format!(
                "source pixel ({}, {}) is not valid",
                source.x, source.y
            )));
        }

        let mut filled = Vec::with_capacity(fills.len());
        for (target, source) in fills {
            canvas.copy_pixel(source, target);
            mask.set_valid(target)?;
            filled.push(target);
        }

        Ok(filled)
    }
}
