//! Strategies deciding which part of the fill front gets filled next.
//!
//! A [`Priority`] computes a scalar per boundary pixel and owns whatever per
//! pixel state it needs for that (confidence maps, isophotes, normals). The
//! [`PriorityField`] drives a strategy over the whole fill front, and keeps
//! the boundary and priority images the inpainter selects targets from.

mod confidence;
mod criminisi;
mod depth;
mod manual;
mod random;

pub use confidence::ConfidencePriority;
pub use criminisi::CriminisiPriority;
pub use depth::DepthPriority;
pub use manual::ManualPriority;
pub use random::RandomPriority;

use crate::field::{BinaryField, ScalarField};
use crate::{Canvas, Coord, Error, Mask, Region};

/// A priority strategy, higher values are filled sooner
pub trait Priority: Send {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Sets up the per-pixel state for a run, called once before the first
    /// priority is requested
    fn initialize(&mut self, canvas: &Canvas, mask: &Mask, patch_radius: u32) -> Result<(), Error>;

    /// The priority of a single boundary pixel
    fn compute_priority(&mut self, pixel: Coord, canvas: &Canvas, mask: &Mask)
        -> Result<f32, Error>;

    /// Bookkeeping after the patch centered on `target` was copied. `filled`
    /// holds the pixels that turned from hole to valid, `canvas` and `mask`
    /// already reflect the fill.
    fn update(
        &mut self,
        target: Coord,
        filled: &[Coord],
        canvas: &Canvas,
        mask: &Mask,
    ) -> Result<(), Error>;
}

/// The priority strategies an inpainter can be configured with
pub enum PriorityStrategy {
    /// Uniformly random priorities, seeded from the run seed
    Random,
    /// Confidence only, fills from the outside in
    OnionPeel,
    /// Confidence times the isophote data term
    Criminisi,
    /// Criminisi driven by the depth channel of an RGB-D canvas
    Depth { channel: usize },
    /// Priorities supplied by the caller, one per pixel
    Manual(ScalarField),
    Custom(Box<dyn Priority>),
}

impl Default for PriorityStrategy {
    fn default() -> Self {
        PriorityStrategy::OnionPeel
    }
}

impl PriorityStrategy {
    pub(crate) fn into_priority(self, seed: u64) -> Box<dyn Priority> {
        match self {
            PriorityStrategy::Random => Box::new(RandomPriority::new(seed)),
            PriorityStrategy::OnionPeel => Box::new(ConfidencePriority::new()),
            PriorityStrategy::Criminisi => Box::new(CriminisiPriority::new()),
            PriorityStrategy::Depth { channel } => Box::new(DepthPriority::new(channel)),
            PriorityStrategy::Manual(priorities) => Box::new(ManualPriority::new(priorities)),
            PriorityStrategy::Custom(priority) => priority,
        }
    }
}

/// The priority and boundary images of a run, maintained by a strategy
pub struct PriorityField {
    strategy: Box<dyn Priority>,
    priorities: ScalarField,
    boundary: BinaryField,
}

impl PriorityField {
    pub fn new(strategy: Box<dyn Priority>, mask: &Mask) -> Self {
        let dims = mask.dims();
        Self {
            strategy,
            priorities: ScalarField::new(dims, 0.0),
            boundary: BinaryField::new(dims, false),
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Initializes the strategy and computes the initial fill front
    pub fn initialize(&mut self, canvas: &Canvas, mask: &Mask, patch_radius: u32) -> Result<(), Error> {
        self.strategy.initialize(canvas, mask, patch_radius)?;
        self.update_boundary(mask, &Region::whole(mask.dims()));
        Ok(())
    }

    /// Recomputes the priority of every boundary pixel, all other pixels
    /// get a priority of 0
    pub fn compute_all_priorities(&mut self, canvas: &Canvas, mask: &Mask) -> Result<(), Error> {
        self.priorities.fill(0.0);

        let boundary: Vec<Coord> = self.boundary.set_coords().collect();
        for pixel in boundary {
            let priority = self.strategy.compute_priority(pixel, canvas, mask)?;
            self.priorities.set(pixel, priority);
        }

        Ok(())
    }

    /// Read-only view of the last computed priorities
    pub fn priority_image(&self) -> &ScalarField {
        &self.priorities
    }

    /// Read-only view of the current fill front
    pub fn boundary_image(&self) -> &BinaryField {
        &self.boundary
    }

    /// Reclassifies the fill front around `changed`. Only pixels adjacent to a
    /// changed pixel can change boundary status, so the region is grown by one.
    pub fn update_boundary(&mut self, mask: &Mask, changed: &Region) {
        if let Some(region) = changed.dilate(1).crop(mask.dims()) {
            for coord in region.coords() {
                self.boundary.set(coord, mask.is_boundary(coord));
            }
        }
    }

    /// Strategy bookkeeping after a fill, followed by a boundary update
    pub fn update(
        &mut self,
        target: Coord,
        target_region: &Region,
        filled: &[Coord],
        canvas: &Canvas,
        mask: &Mask,
    ) -> Result<(), Error> {
        self.strategy.update(target, filled, canvas, mask)?;
        self.update_boundary(mask, target_region);
        Ok(())
    }

    /// The boundary pixel with the highest priority, ties go to the first
    /// pixel in raster order
    pub fn highest_priority(&self) -> Option<(Coord, f32)> {
        let mut best: Option<(Coord, f32)> = None;
        for pixel in self.boundary.set_coords() {
            let p = *self.priorities.get(pixel);
            match best {
                Some((_, best_p)) if p <= best_p => {}
                _ => best = Some((pixel, p)),
            }
        }
        best
    }

    /// The `count` highest priority boundary pixels, ordered by descending
    /// priority then raster order
    pub fn ranked(&self, count: usize) -> Vec<(Coord, f32)> {
        let mut all: Vec<(Coord, f32)> = self
            .boundary
            .set_coords()
            .map(|c| (c, *self.priorities.get(c)))
            .collect();
        // stable, so equal priorities stay in raster order
        all.sort_by(|a, b| b.1.total_cmp(&a.1));
        all.truncate(count);
        all
    }
}
