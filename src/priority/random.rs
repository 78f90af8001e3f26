use super::Priority;
use crate::{Canvas, Coord, Error, Mask};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Uniformly random priorities, a baseline that ignores image content
pub struct RandomPriority {
    seed: u64,
    rng: Pcg32,
}

impl RandomPriority {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl Priority for RandomPriority {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn initialize(&mut self, _canvas: &Canvas, _mask: &Mask, _patch_radius: u32) -> Result<(), Error> {
        // reseed so reruns with the same strategy produce the same fill order
        self.rng = Pcg32::seed_from_u64(self.seed);
        Ok(())
    }

    fn compute_priority(&mut self, _pixel: Coord, _canvas: &Canvas, _mask: &Mask) -> Result<f32, Error> {
        Ok(self.rng.gen::<f32>())
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
