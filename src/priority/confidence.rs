use super::Priority;
use crate::field::ScalarField;
use crate::{Canvas, Coord, Error, Mask, Region};

/// Per-pixel confidence, 1 for original content, 0 for missing content and
/// propagated from the target patch as holes are filled
pub(crate) struct ConfidenceMap {
    confidence: ScalarField,
    patch_radius: u32,
}

impl ConfidenceMap {
    pub(crate) fn new(mask: &Mask, patch_radius: u32) -> Self {
        let mut confidence = ScalarField::new(mask.dims(), 0.0);
        for coord in Region::whole(mask.dims()).coords() {
            if mask.valid_at(coord) {
                confidence.set(coord, 1.0);
            }
        }

        Self {
            confidence,
            patch_radius,
        }
    }

    /// Average confidence over the patch window, clipped to the image.
    ///
    /// A boundary pixel always has a valid neighbor with a positive
    /// confidence, so a non-positive sum means the mask and the map went out
    /// of sync and the run can't continue.
    pub(crate) fn confidence_at(&self, pixel: Coord) -> Result<f32, Error> {
        let window = Region::centered(pixel, self.patch_radius)
            .crop(self.confidence.dims())
            .ok_or_else(|| {
                Error::InvalidMaskState(format!("pixel ({}, {}) is outside the image", pixel.x, pixel.y))
            })?;

        let sum: f32 = window.coords().map(|c| *self.confidence.get(c)).sum();
        if sum <= 0.0 {
            return Err(Error::InvalidMaskState(format!(
                "boundary pixel ({}, {}) has no confident pixels around it",
                pixel.x, pixel.y
            )));
        }

        Ok(sum / window.area() as f32)
    }

    /// Gives every filled pixel that has no confidence yet `value`
    pub(crate) fn propagate(&mut self, value: f32, filled: &[Coord]) {
        for coord in filled {
            let c = self.confidence.get_mut(*coord);
            if *c == 0.0 {
                *c = value;
            }
        }
    }

    pub(crate) fn field(&self) -> &ScalarField {
        &self.confidence
    }
}

/// "Onion peel" priority, fills the pixels best supported by original
/// content first, which peels the hole from the outside in
#[derive(Default)]
pub struct ConfidencePriority {
    map: Option<ConfidenceMap>,
}

impl ConfidencePriority {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current confidence map, available once initialized
    pub fn confidence(&self) -> Option<&ScalarField> {
        self.map.as_ref().map(ConfidenceMap::field)
    }

    fn map(&self) -> Result<&ConfidenceMap, Error> {
        self.map
            .as_ref()
            .ok_or(Error::InvalidState("confidence priority was not initialized"))
    }
}

impl Priority for ConfidencePriority {
    fn name(&self) -> &'static str {
        "OnionPeel"
    }

    fn initialize(&mut self, _canvas: &Canvas, mask: &Mask, patch_radius: u32) -> Result<(), Error> {
        self.map = Some(ConfidenceMap::new(mask, patch_radius));
        Ok(())
    }

    fn compute_priority(&mut self, pixel: Coord, _canvas: &Canvas, _mask: &Mask) -> Result<f32, Error> {
        self.map()?.confidence_at(pixel)
    }

    fn update(
        &mut self,
        target: Coord,
        filled: &[Coord],
        _canvas: &Canvas,
        _mask: &Mask,
    ) -> Result<(), Error> {
        // the filled pixels still have zero confidence, so this is the value
        // the target had before the fill
        let value = self.map()?.confidence_at(target)?;
        if let Some(map) = self.map.as_mut() {
            map.propagate(value, filled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Dims, PixelState};

    #[test]
    fn confidence_is_propagated_into_filled_pixels() {
        let dims = Dims::new(6, 6);
        let mut mask = Mask::from_fn(dims, |c| {
            if c.x < 3 {
                PixelState::Hole
            } else {
                PixelState::Valid
            }
        });
        let canvas = Canvas::new(dims, 1, 0.0);

        let mut priority = ConfidencePriority::new();
        priority.initialize(&canvas, &mask, 1).unwrap();

        let target = Coord::new(2, 2);
        let before = priority.compute_priority(target, &canvas, &mask).unwrap();
        assert!((before - 3.0 / 9.0).abs() < 1e-6);

        let filled = mask.hole_pixels_in_region(&Region::centered(target, 1));
        for c in &filled {
            mask.set_valid(*c).unwrap();
        }
        priority.update(target, &filled, &canvas, &mask).unwrap();

        let confidence = priority.confidence().unwrap();
        for c in &filled {
            assert_eq!(*confidence.get(*c), before);
        }
        assert_eq!(*confidence.get(Coord::new(4, 4)), 1.0);
        assert_eq!(*confidence.get(Coord::new(0, 0)), 0.0);
    }

    #[test]
    fn pixel_without_confident_neighbors_is_fatal() {
        let dims = Dims::new(5, 5);
        let mask = Mask::from_fn(dims, |c| {
            if c.x < 4 {
                PixelState::Hole
            } else {
                PixelState::Valid
            }
        });
        let canvas = Canvas::new(dims, 1, 0.0);

        let mut priority = ConfidencePriority::new();
        priority.initialize(&canvas, &mask, 1).unwrap();

        assert!(matches!(
            priority.compute_priority(Coord::new(1, 1), &canvas, &mask),
            Err(Error::InvalidMaskState(_))
        ));
    }
}
