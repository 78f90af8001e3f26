use super::{PatchDifference, PatchPair};
use crate::filters::{magnitude, masked_gradient_by};
use crate::{Canvas, Coord, Error, Mask};

/// A normalized histogram whose bin range is taken from the target patch.
/// Values outside the range land in the extremal bins.
struct Histogram {
    min: f32,
    max: f32,
    bins: Vec<f32>,
}

impl Histogram {
    fn with_range(values: &[f32], bins: usize) -> Self {
        let (min, max) = values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));

        let mut hist = Self {
            min,
            max,
            bins: vec![0.0; bins],
        };
        hist.accumulate(values);
        hist
    }

    fn matching(other: &Histogram, values: &[f32]) -> Self {
        let mut hist = Self {
            min: other.min,
            max: other.max,
            bins: vec![0.0; other.bins.len()],
        };
        hist.accumulate(values);
        hist
    }

    fn bin_of(&self, value: f32) -> usize {
        let last = self.bins.len() - 1;
        if value <= self.min {
            0
        } else if value >= self.max {
            last
        } else {
            let t = (value - self.min) / (self.max - self.min);
            ((t * self.bins.len() as f32) as usize).min(last)
        }
    }

    fn accumulate(&mut self, values: &[f32]) {
        if values.is_empty() {
            return;
        }

        let weight = 1.0 / values.len() as f32;
        for v in values {
            let bin = self.bin_of(*v);
            self.bins[bin] += weight;
        }
    }

    fn l1_distance(&self, other: &Histogram) -> f32 {
        self.bins
            .iter()
            .zip(&other.bins)
            .map(|(a, b)| (a - b).abs())
            .sum()
    }
}

/// Distance between the per-channel color histograms of the two patches,
/// summed over the channels
#[derive(Copy, Clone, Debug)]
pub struct ColorHistogramDifference {
    bins: usize,
}

impl ColorHistogramDifference {
    pub fn new(bins: usize) -> Self {
        Self { bins: bins.max(1) }
    }

    pub fn bins(&self) -> usize {
        self.bins
    }
}

impl Default for ColorHistogramDifference {
    fn default() -> Self {
        Self::new(20)
    }
}

impl PatchDifference for ColorHistogramDifference {
    fn name(&self) -> &'static str {
        "ColorHistogramDifference"
    }

    fn difference(&self, canvas: &Canvas, mask: &Mask, pair: &PatchPair) -> Result<f32, Error> {
        let targets: Vec<Coord> = pair
            .coords()
            .map(|(t, _)| t)
            .filter(|t| mask.valid_at(*t))
            .collect();
        if targets.is_empty() {
            return Err(Error::DegenerateComparison(pair.target));
        }
        let sources: Vec<Coord> = pair.coords().map(|(_, s)| s).collect();

        let mut total = 0.0;
        for channel in 0..canvas.channels() {
            let target_values: Vec<f32> = targets.iter().map(|c| canvas.channel(*c, channel)).collect();
            let source_values: Vec<f32> = sources.iter().map(|c| canvas.channel(*c, channel)).collect();

            let target_hist = Histogram::with_range(&target_values, self.bins);
            let source_hist = Histogram::matching(&target_hist, &source_values);
            total += target_hist.l1_distance(&source_hist);
        }

        Ok(total)
    }
}

/// Distance between the histograms of luminance gradient magnitudes of the
/// two patches. Gradients only read valid pixels.
#[derive(Copy, Clone, Debug)]
pub struct GradientMagnitudeHistogramDifference {
    bins: usize,
}

impl GradientMagnitudeHistogramDifference {
    pub fn new(bins: usize) -> Self {
        Self { bins: bins.max(1) }
    }

    pub fn bins(&self) -> usize {
        self.bins
    }
}

impl Default for GradientMagnitudeHistogramDifference {
    fn default() -> Self {
        Self::new(20)
    }
}

impl PatchDifference for GradientMagnitudeHistogramDifference {
    fn name(&self) -> &'static str {
        "GradientMagnitudeHistogramDifference"
    }

    fn difference(&self, canvas: &Canvas, mask: &Mask, pair: &PatchPair) -> Result<f32, Error> {
        let luminance = |c: Coord| canvas.luminance(c);
        let gradient_magnitude = |c: Coord| magnitude(masked_gradient_by(luminance, mask, c));

        let target_values: Vec<f32> = pair
            .coords()
            .map(|(t, _)| t)
            .filter(|t| mask.valid_at(*t))
            .map(gradient_magnitude)
            .collect();
        if target_values.is_empty() {
            return Err(Error::DegenerateComparison(pair.target));
        }

        let source_values: Vec<f32> = pair.coords().map(|(_, s)| gradient_magnitude(s)).collect();

        let target_hist = Histogram::with_range(&target_values, self.bins);
        let source_hist = Histogram::matching(&target_hist, &source_values);
        Ok(target_hist.l1_distance(&source_hist))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Dims, PixelState};

    #[test]
    fn histograms_are_normalized() {
        let hist = Histogram::with_range(&[0.0, 1.0, 2.0, 3.0, 10.0], 4);
        let sum: f32 = hist.bins.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);

        // out of range values are kept in the extremal bins
        let other = Histogram::matching(&hist, &[-5.0, 50.0]);
        assert_eq!(other.bins, vec![0.5, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn constant_target_range() {
        let hist = Histogram::with_range(&[7.0, 7.0], 3);
        assert_eq!(hist.bins, vec![1.0, 0.0, 0.0]);
        let other = Histogram::matching(&hist, &[7.0, 8.0]);
        assert_eq!(hist.l1_distance(&other), 1.0);
    }

    #[test]
    fn color_histograms_ignore_layout() {
        let dims = Dims::new(8, 4);
        // left half is a checkerboard, right half the same values in stripes
        let canvas = Canvas::from_fn(dims, 1, |c, px| {
            px[0] = if c.x < 4 {
                ((c.x + c.y) % 2) as f32 * 100.0
            } else {
                (c.x % 2) as f32 * 100.0
            };
        });
        let mask = Mask::new(dims);

        let pair = PatchPair::new(Coord::new(1, 1), Coord::new(5, 2), 1, dims).unwrap();
        let metric = ColorHistogramDifference::new(2);
        // 5 zeros and 4 ones against 6 and 3
        let d = metric.difference(&canvas, &mask, &pair).unwrap();
        assert!((d - 2.0 / 9.0).abs() < 1e-6);

        let same = PatchPair::new(Coord::new(1, 1), Coord::new(2, 2), 1, dims).unwrap();
        assert_eq!(metric.difference(&canvas, &mask, &same).unwrap(), 0.0);
    }

    #[test]
    fn flat_patches_match_on_gradients() {
        let dims = Dims::new(10, 10);
        let canvas = Canvas::from_fn(dims, 3, |c, px| {
            let v = if c.x < 7 { 50.0 } else { 200.0 };
            px.copy_from_slice(&[v, v, v]);
        });
        let mask = Mask::from_fn(dims, |c| {
            if c.x == 0 {
                PixelState::Hole
            } else {
                PixelState::Valid
            }
        });

        let metric = GradientMagnitudeHistogramDifference::new(8);
        let flat = PatchPair::new(Coord::new(1, 4), Coord::new(3, 4), 1, dims).unwrap();
        let edge = PatchPair::new(Coord::new(1, 4), Coord::new(7, 4), 1, dims).unwrap();

        // 6 valid target pixels against 9 source pixels, equal up to rounding
        assert!(metric.difference(&canvas, &mask, &flat).unwrap() < 1e-6);
        assert!(metric.difference(&canvas, &mask, &edge).unwrap() > 0.5);
    }
}
