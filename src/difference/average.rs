use super::{PatchDifference, PatchPair};
use crate::{Canvas, Error, Mask};

/// How a per-channel difference is turned into a cost
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Norm {
    Squared,
    Absolute,
}

impl Default for Norm {
    fn default() -> Self {
        Norm::Squared
    }
}

impl Norm {
    #[inline]
    fn cost(self, a: f32, b: f32) -> f32 {
        let d = a - b;
        match self {
            Norm::Squared => d * d,
            Norm::Absolute => d.abs(),
        }
    }
}

/// Per-pixel cost summed over the channels, averaged over the pixels that
/// are valid in the target patch
#[derive(Copy, Clone, Debug, Default)]
pub struct AveragePixelDifference {
    pub norm: Norm,
}

impl AveragePixelDifference {
    pub fn new(norm: Norm) -> Self {
        Self { norm }
    }
}

impl PatchDifference for AveragePixelDifference {
    fn name(&self) -> &'static str {
        "AveragePixelDifference"
    }

    fn difference(&self, canvas: &Canvas, mask: &Mask, pair: &PatchPair) -> Result<f32, Error> {
        let mut total = 0.0f32;
        let mut count = 0usize;

        for (target, source) in pair.coords() {
            if !mask.valid_at(target) {
                continue;
            }

            total += canvas
                .pixel(target)
                .iter()
                .zip(canvas.pixel(source))
                .map(|(a, b)| self.norm.cost(*a, *b))
                .sum::<f32>();
            count += 1;
        }

        if count == 0 {
            return Err(Error::DegenerateComparison(pair.target));
        }
        Ok(total / count as f32)
    }
}

/// Average squared difference of a single channel, the depth of an RGB-D
/// canvas
#[derive(Copy, Clone, Debug)]
pub struct DepthDifference {
    pub channel: usize,
}

impl DepthDifference {
    pub fn new(channel: usize) -> Self {
        Self { channel }
    }
}

impl PatchDifference for DepthDifference {
    fn name(&self) -> &'static str {
        "DepthDifference"
    }

    fn check_canvas(&self, canvas: &Canvas) -> Result<(), Error> {
        canvas.check_channel(self.channel)
    }

    fn difference(&self, canvas: &Canvas, mask: &Mask, pair: &PatchPair) -> Result<f32, Error> {
        canvas.check_channel(self.channel)?;

        let mut total = 0.0f32;
        let mut count = 0usize;
        for (target, source) in pair.coords().filter(|(t, _)| mask.valid_at(*t)) {
            total += Norm::Squared.cost(
                canvas.channel(target, self.channel),
                canvas.channel(source, self.channel),
            );
            count += 1;
        }

        if count == 0 {
            return Err(Error::DegenerateComparison(pair.target));
        }
        Ok(total / count as f32)
    }
}
