//! Scoring how well a source patch matches a target patch.
//!
//! Every metric follows the same convention, smaller is better, and only
//! compares pixels that are valid in the target patch.

mod average;
mod histogram;

pub use average::{AveragePixelDifference, DepthDifference, Norm};
pub use histogram::{ColorHistogramDifference, GradientMagnitudeHistogramDifference};

use crate::errors::OutOfBounds;
use crate::source_patches::SourcePatch;
use crate::{Canvas, Coord, Dims, Error, Mask, Region};

/// A difference metric between the two halves of a [`PatchPair`]
pub trait PatchDifference: Send + Sync {
    /// Name the score is stored and sorted under
    fn name(&self) -> &'static str;

    fn difference(&self, canvas: &Canvas, mask: &Mask, pair: &PatchPair) -> Result<f32, Error>;

    /// Checks the canvas has what the metric reads, called once on build
    fn check_canvas(&self, _canvas: &Canvas) -> Result<(), Error> {
        Ok(())
    }
}

/// A target window and an equally sized source window.
///
/// The target window is cropped to the image, the source window is the
/// same crop of the source patch, so offsets line up between the two.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PatchPair {
    pub target_center: Coord,
    pub source_center: Coord,
    pub target: Region,
    pub source: Region,
}

impl PatchPair {
    pub fn new(
        target_center: Coord,
        source_center: Coord,
        patch_radius: u32,
        dims: Dims,
    ) -> Result<Self, Error> {
        let target = Region::centered(target_center, patch_radius)
            .crop(dims)
            .ok_or(Error::OutOfBounds(OutOfBounds::Coord(target_center, dims)))?;

        let source = target.translate(
            source_center.x as i32 - target_center.x as i32,
            source_center.y as i32 - target_center.y as i32,
        );
        if !source.is_inside(dims) {
            return Err(Error::OutOfBounds(OutOfBounds::Region(source, dims)));
        }

        Ok(Self {
            target_center,
            source_center,
            target,
            source,
        })
    }

    /// Corresponding (target, source) pixels, in raster order of the target
    pub fn coords(&self) -> impl Iterator<Item = (Coord, Coord)> {
        let (t, s) = (self.target, self.source);
        self.target.offsets().map(move |(dx, dy)| {
            (
                Coord::new(t.x as u32 + dx, t.y as u32 + dy),
                Coord::new(s.x as u32 + dx, s.y as u32 + dy),
            )
        })
    }
}

/// A candidate pair and the scores computed for it so far
#[derive(Clone, Debug)]
pub struct ScoredPair {
    pub pair: PatchPair,
    scores: Vec<(&'static str, f32)>,
}

impl ScoredPair {
    pub fn new(pair: PatchPair) -> Self {
        Self {
            pair,
            scores: Vec::new(),
        }
    }

    pub fn score(&self, name: &str) -> Option<f32> {
        self.scores.iter().find(|(n, _)| *n == name).map(|(_, s)| *s)
    }

    pub fn set_score(&mut self, name: &'static str, value: f32) {
        match self.scores.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.scores.push((name, value)),
        }
    }
}

/// One target patch paired with every source patch it may be filled from
pub struct CandidatePairs {
    target_center: Coord,
    target: Region,
    pairs: Vec<ScoredPair>,
}

impl CandidatePairs {
    pub fn new<'a, I>(target_center: Coord, patch_radius: u32, dims: Dims, sources: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'a SourcePatch>,
    {
        let target = Region::centered(target_center, patch_radius)
            .crop(dims)
            .ok_or(Error::OutOfBounds(OutOfBounds::Coord(target_center, dims)))?;

        let pairs = sources
            .into_iter()
            .map(|source| {
                PatchPair::new(target_center, source.center, patch_radius, dims).map(ScoredPair::new)
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            target_center,
            target,
            pairs,
        })
    }

    #[inline]
    pub fn target_center(&self) -> Coord {
        self.target_center
    }

    #[inline]
    pub fn target(&self) -> Region {
        self.target
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[ScoredPair] {
        &self.pairs
    }

    /// Scores every pair with `metric`, split over up to `max_threads`
    /// threads. The scores don't depend on the thread count.
    pub fn compute_all_source_differences(
        &mut self,
        metric: &dyn PatchDifference,
        canvas: &Canvas,
        mask: &Mask,
        max_threads: usize,
    ) -> Result<(), Error> {
        if self.pairs.is_empty() {
            return Ok(());
        }

        let n_workers = max_threads.max(1).min(self.pairs.len());
        score_in_parallel(&mut self.pairs, metric, canvas, mask, n_workers)
    }

    /// Stable ascending sort by the named score, unscored pairs go last
    pub fn sort(&mut self, metric_name: &str) {
        self.pairs.sort_by(|a, b| {
            let a = a.score(metric_name).unwrap_or(f32::INFINITY);
            let b = b.score(metric_name).unwrap_or(f32::INFINITY);
            a.total_cmp(&b)
        });
    }

    /// The first pair, the best match once sorted
    pub fn best(&self) -> Option<&ScoredPair> {
        self.pairs.first()
    }
}

// for WASM we do not have threads and crossbeam panics
#[cfg(target_arch = "wasm32")]
fn score_in_parallel(
    pairs: &mut [ScoredPair],
    metric: &dyn PatchDifference,
    canvas: &Canvas,
    mask: &Mask,
    _n_workers: usize,
) -> Result<(), Error> {
    score_chunk(pairs, metric, canvas, mask)
}

#[cfg(not(target_arch = "wasm32"))]
fn score_in_parallel(
    pairs: &mut [ScoredPair],
    metric: &dyn PatchDifference,
    canvas: &Canvas,
    mask: &Mask,
    n_workers: usize,
) -> Result<(), Error> {
    if n_workers <= 1 {
        return score_chunk(pairs, metric, canvas, mask);
    }

    let chunk_size = (pairs.len() + n_workers - 1) / n_workers;
    let outcome = crossbeam_utils::thread::scope(|scope| {
        let handles: Vec<_> = pairs
            .chunks_mut(chunk_size)
            .map(|chunk| scope.spawn(move |_| score_chunk(chunk, metric, canvas, mask)))
            .collect();

        handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
    });

    let results = match outcome {
        Ok(results) => results,
        Err(panic) => std::panic::resume_unwind(panic),
    };

    // chunks are in order, so the first error is the one a single thread hits
    for result in results {
        match result {
            Ok(scored) => scored?,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    Ok(())
}

fn score_chunk(
    chunk: &mut [ScoredPair],
    metric: &dyn PatchDifference,
    canvas: &Canvas,
    mask: &Mask,
) -> Result<(), Error> {
    let name = metric.name();
    for scored in chunk {
        let value = metric.difference(canvas, mask, &scored.pair)?;
        scored.set_score(name, value);
    }
    Ok(())
}

/// How strongly the image changes across the fill front in the window
/// around `center`.
///
/// Averages the euclidean norm of the pixel difference over every pair of a
/// hole pixel and a 4-adjacent valid pixel inside the window. A window
/// without such pairs has no energy.
pub fn boundary_energy(canvas: &Canvas, mask: &Mask, center: Coord, radius: u32) -> Result<f32, Error> {
    let dims = mask.dims();
    let window = Region::centered(center, radius)
        .crop(dims)
        .ok_or(Error::OutOfBounds(OutOfBounds::Coord(center, dims)))?;

    let mut total = 0.0;
    let mut pairs = 0;
    for hole in window.coords().filter(|c| mask.hole_at(*c)) {
        for &(dx, dy) in &[(-1, 0), (1, 0), (0, -1), (0, 1)] {
            let neighbor = match hole.offset(dx, dy).to_unsigned(dims) {
                Some(n) if window.contains(n.to_signed()) && mask.valid_at(n) => n,
                _ => continue,
            };

            let norm: f32 = canvas
                .pixel(hole)
                .iter()
                .zip(canvas.pixel(neighbor))
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f32>()
                .sqrt();
            total += norm;
            pairs += 1;
        }
    }

    if pairs == 0 {
        return Ok(0.0);
    }
    Ok(total / pairs as f32)
}
