use super::Priority;
use crate::errors::SizeMismatch;
use crate::field::ScalarField;
use crate::{Canvas, Coord, Error, Mask};

/// Priorities supplied from outside, eg. painted by a user to force the
/// order in which the hole is filled
pub struct ManualPriority {
    priorities: ScalarField,
}

impl ManualPriority {
    pub fn new(priorities: ScalarField) -> Self {
        Self { priorities }
    }

    pub fn priorities(&self) -> &ScalarField {
        &self.priorities
    }
}

impl Priority for ManualPriority {
    fn name(&self) -> &'static str {
        "Manual"
    }

    fn initialize(&mut self, _canvas: &Canvas, mask: &Mask, _patch_radius: u32) -> Result<(), Error> {
        if self.priorities.dims() != mask.dims() {
            return Err(Error::SizeMismatch(SizeMismatch {
                image: self.priorities.dims(),
                mask: mask.dims(),
            }));
        }
        Ok(())
    }

    fn compute_priority(&mut self, pixel: Coord, _canvas: &Canvas, _mask: &Mask) -> Result<f32, Error> {
        self.priorities.try_get(pixel).map(|p| *p)
    }

    fn update(
        &mut self,
        _target: Coord,
        _filled: &[Coord],
        _canvas: &Canvas,
        _mask: &Mask,
    ) -> Result<(), Error> {
        Ok(())
    }
}
