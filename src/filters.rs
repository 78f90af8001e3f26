//! Small float image filters used by the priority strategies and the
//! gradient based difference metrics

use crate::field::ScalarField;
use crate::{Coord, Mask, Region};

/// Normalized 1D gaussian kernel, covering 3 sigma on each side
pub(crate) fn gaussian_kernel_1d(sigma: f32) -> Vec<f32> {
    let half = (sigma * 3.0).ceil().max(1.0) as i32;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|x| {
            let x = x as f32;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }

    kernel
}

/// Blurs `src` with a separable kernel, writing only the pixels of `region`
/// into `dst`. Edges are clamped, so the result for any pixel is the same
/// as blurring the whole image.
pub(crate) fn blur_into(src: &ScalarField, dst: &mut ScalarField, region: &Region, kernel: &[f32]) {
    let dims = src.dims();
    let region = match region.crop(dims) {
        Some(r) => r,
        None => return,
    };

    let half_k = (kernel.len() / 2) as i32;
    let (width, height) = (dims.width as i32, dims.height as i32);

    // horizontal pass over every row the vertical pass will read
    let rows = Region::new(region.x, region.y - half_k, region.width, region.height + 2 * half_k as u32)
        .crop(dims)
        .unwrap_or(region);

    let mut temp = vec![0.0f32; rows.area()];
    for (i, coord) in rows.coords().enumerate() {
        let mut sum = 0.0f32;
        for (k, &k_val) in kernel.iter().enumerate() {
            let sx = (coord.x as i32 + k as i32 - half_k).max(0).min(width - 1);
            sum += *src.get(Coord::new(sx as u32, coord.y)) * k_val;
        }
        temp[i] = sum;
    }

    for coord in region.coords() {
        let mut sum = 0.0f32;
        for (k, &k_val) in kernel.iter().enumerate() {
            let sy = (coord.y as i32 + k as i32 - half_k).max(0).min(height - 1);
            let ty = (sy - rows.y) as usize;
            let tx = (coord.x as i32 - rows.x) as usize;
            sum += temp[ty * rows.width as usize + tx] * k_val;
        }
        dst.set(coord, sum);
    }
}

/// Central difference gradient of a field, one-sided at the image edges
pub(crate) fn gradient(field: &ScalarField, coord: Coord) -> [f32; 2] {
    let dims = field.dims();
    let sample = |dx: i32, dy: i32| {
        coord
            .offset(dx, dy)
            .to_unsigned(dims)
            .map(|c| (*field.get(c), true))
            .unwrap_or((*field.get(coord), false))
    };

    let axis = |(a, a_in): (f32, bool), (b, b_in): (f32, bool)| {
        if a_in && b_in {
            (b - a) * 0.5
        } else {
            b - a
        }
    };

    [
        axis(sample(-1, 0), sample(1, 0)),
        axis(sample(0, -1), sample(0, 1)),
    ]
}

/// Gradient of `intensity` at a valid pixel that only reads valid pixels.
///
/// Central differences are used when both neighbors along an axis are
/// valid, one-sided differences when one is, and the axis is zero when
/// neither is. Non-valid pixels have a zero gradient.
pub(crate) fn masked_gradient(intensity: &ScalarField, mask: &Mask, coord: Coord) -> [f32; 2] {
    masked_gradient_by(|c| *intensity.get(c), mask, coord)
}

/// [`masked_gradient`] over intensities computed on the fly
pub(crate) fn masked_gradient_by<F>(intensity: F, mask: &Mask, coord: Coord) -> [f32; 2]
where
    F: Fn(Coord) -> f32,
{
    if !mask.valid_at(coord) {
        return [0.0, 0.0];
    }

    let dims = mask.dims();
    let center = intensity(coord);
    let valid_value = |dx: i32, dy: i32| {
        coord
            .offset(dx, dy)
            .to_unsigned(dims)
            .filter(|c| mask.valid_at(*c))
            .map(&intensity)
    };

    let axis = |before: Option<f32>, after: Option<f32>| match (before, after) {
        (Some(b), Some(a)) => (a - b) * 0.5,
        (Some(b), None) => center - b,
        (None, Some(a)) => a - center,
        (None, None) => 0.0,
    };

    [
        axis(valid_value(-1, 0), valid_value(1, 0)),
        axis(valid_value(0, -1), valid_value(0, 1)),
    ]
}

#[inline]
pub(crate) fn magnitude(v: [f32; 2]) -> f32 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}
