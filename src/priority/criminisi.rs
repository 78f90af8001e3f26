use super::confidence::ConfidenceMap;
use super::Priority;
use crate::field::{ScalarField, VectorField};
use crate::filters::{blur_into, gaussian_kernel_1d, gradient, magnitude, masked_gradient};
use crate::{Canvas, Coord, Error, Mask, Region};

/// Normalization of the data term, the maximum intensity of 8-bit content.
/// It scales every priority equally so it never changes which pixel wins.
const ALPHA: f32 = 255.0;
/// Blur applied to the valid-indicator mask before taking its gradient
const NORMAL_BLUR_SIGMA: f32 = 2.0;

/// Which scalar image isophotes are computed from
#[derive(Copy, Clone, Debug)]
pub(crate) enum IntensitySource {
    Luminance,
    Channel(usize),
}

/// Criminisi et al. priority, `confidence * data`, where the data term is
/// the strength of the isophote hitting the fill front head on. Linear
/// structures get continued into the hole before flat areas are filled.
pub struct CriminisiPriority {
    source: IntensitySource,
    state: Option<CriminisiState>,
}

struct CriminisiState {
    confidence: ConfidenceMap,
    intensity: ScalarField,
    valid_indicator: ScalarField,
    blurred_mask: ScalarField,
    isophotes: VectorField,
    normals: VectorField,
    kernel: Vec<f32>,
    patch_radius: u32,
}

impl Default for CriminisiPriority {
    fn default() -> Self {
        Self::new()
    }
}

impl CriminisiPriority {
    pub fn new() -> Self {
        Self {
            source: IntensitySource::Luminance,
            state: None,
        }
    }

    pub(crate) fn with_source(source: IntensitySource) -> Self {
        Self {
            source,
            state: None,
        }
    }

    pub fn confidence(&self) -> Option<&ScalarField> {
        self.state.as_ref().map(|s| s.confidence.field())
    }

    /// Isophotes of the boundary pixels, as of the last priority computation
    pub fn isophotes(&self) -> Option<&VectorField> {
        self.state.as_ref().map(|s| &s.isophotes)
    }

    /// Unit normals of the boundary pixels, as of the last priority computation
    pub fn boundary_normals(&self) -> Option<&VectorField> {
        self.state.as_ref().map(|s| &s.normals)
    }

    fn state(&mut self) -> Result<&mut CriminisiState, Error> {
        self.state
            .as_mut()
            .ok_or(Error::InvalidState("criminisi priority was not initialized"))
    }
}

impl CriminisiState {
    fn intensity_of(source: IntensitySource, canvas: &Canvas, coord: Coord) -> f32 {
        match source {
            IntensitySource::Luminance => canvas.luminance(coord),
            IntensitySource::Channel(c) => canvas.channel(coord, c),
        }
    }

    /// The strongest isophote among the valid pixels of the patch window
    fn isophote_at(&self, pixel: Coord, mask: &Mask) -> [f32; 2] {
        let window = match Region::centered(pixel, self.patch_radius).crop(mask.dims()) {
            Some(w) => w,
            None => return [0.0, 0.0],
        };

        let mut best = [0.0f32, 0.0];
        let mut best_mag = 0.0f32;
        for coord in window.coords() {
            let g = masked_gradient(&self.intensity, mask, coord);
            let mag = magnitude(g);
            if mag > best_mag {
                best_mag = mag;
                best = g;
            }
        }

        // rotate the gradient by 90 degrees
        [-best[1], best[0]]
    }

    fn normal_at(&self, pixel: Coord) -> [f32; 2] {
        let g = gradient(&self.blurred_mask, pixel);
        let mag = magnitude(g);
        if mag > 0.0 {
            [g[0] / mag, g[1] / mag]
        } else {
            [0.0, 0.0]
        }
    }
}

/// How strongly an isophote flows into the fill front along its normal
#[inline]
fn data_term(isophote: [f32; 2], normal: [f32; 2]) -> f32 {
    (isophote[0] * normal[0] + isophote[1] * normal[1]).abs() / ALPHA
}

impl Priority for CriminisiPriority {
    fn name(&self) -> &'static str {
        "Criminisi"
    }

    fn initialize(&mut self, canvas: &Canvas, mask: &Mask, patch_radius: u32) -> Result<(), Error> {
        if let IntensitySource::Channel(c) = self.source {
            canvas.check_channel(c)?;
        }

        let dims = mask.dims();
        let source = self.source;
        let mut intensity = ScalarField::new(dims, 0.0);
        let mut valid_indicator = ScalarField::new(dims, 0.0);
        for coord in Region::whole(dims).coords() {
            if mask.valid_at(coord) {
                intensity.set(coord, CriminisiState::intensity_of(source, canvas, coord));
                valid_indicator.set(coord, 1.0);
            }
        }

        let kernel = gaussian_kernel_1d(NORMAL_BLUR_SIGMA);
        let mut blurred_mask = ScalarField::new(dims, 0.0);
        blur_into(&valid_indicator, &mut blurred_mask, &Region::whole(dims), &kernel);

        self.state = Some(CriminisiState {
            confidence: ConfidenceMap::new(mask, patch_radius),
            intensity,
            valid_indicator,
            blurred_mask,
            isophotes: VectorField::new(dims, [0.0, 0.0]),
            normals: VectorField::new(dims, [0.0, 0.0]),
            kernel,
            patch_radius,
        });

        Ok(())
    }

    fn compute_priority(&mut self, pixel: Coord, _canvas: &Canvas, mask: &Mask) -> Result<f32, Error> {
        let state = self.state()?;

        let confidence = state.confidence.confidence_at(pixel)?;
        let isophote = state.isophote_at(pixel, mask);
        let normal = state.normal_at(pixel);
        state.isophotes.set(pixel, isophote);
        state.normals.set(pixel, normal);

        Ok(confidence * data_term(isophote, normal))
    }

    fn update(
        &mut self,
        target: Coord,
        filled: &[Coord],
        canvas: &Canvas,
        _mask: &Mask,
    ) -> Result<(), Error> {
        let source = self.source;
        let state = self.state()?;

        let value = state.confidence.confidence_at(target)?;
        state.confidence.propagate(value, filled);

        if filled.is_empty() {
            return Ok(());
        }

        let mut changed = Region::new(filled[0].x as i32, filled[0].y as i32, 1, 1);
        for c in filled {
            state
                .intensity
                .set(*c, CriminisiState::intensity_of(source, canvas, *c));
            state.valid_indicator.set(*c, 1.0);

            let x = changed.x.min(c.x as i32);
            let y = changed.y.min(c.y as i32);
            let right = changed.right().max(c.x as i32 + 1);
            let bottom = changed.bottom().max(c.y as i32 + 1);
            changed = Region::new(x, y, (right - x) as u32, (bottom - y) as u32);
        }

        // the blurred mask only changes within a kernel's reach of a fill
        let reach = (state.kernel.len() / 2) as u32;
        blur_into(
            &state.valid_indicator,
            &mut state.blurred_mask,
            &changed.dilate(reach),
            &state.kernel,
        );

        Ok(())
    }
}
