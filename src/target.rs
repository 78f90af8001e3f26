//! Choosing the next patch to fill.
//!
//! The inpainting loop asks a [`TargetSelector`] where to fill next, which
//! keeps richer lookahead policies out of the loop itself.

use crate::difference::{CandidatePairs, PatchDifference, ScoredPair};
use crate::priority::PriorityField;
use crate::source_patches::{SearchScope, SourcePatchCollection};
use crate::{Canvas, Coord, Error, Mask, Region};
use tracing::trace;

/// The patch chosen to be filled next
#[derive(Clone, Debug)]
pub struct Target {
    pub pixel: Coord,
    /// The patch window around `pixel`, cropped to the image
    pub region: Region,
    pub priority: f32,
    /// The best source match, if the selector already searched for it
    pub best_match: Option<ScoredPair>,
}

/// Read-only view of the inpainting state between two iterations
pub struct TargetContext<'a> {
    pub canvas: &'a Canvas,
    pub mask: &'a Mask,
    pub priorities: &'a PriorityField,
    pub sources: &'a SourcePatchCollection,
    pub difference: &'a dyn PatchDifference,
    pub scope: SearchScope,
    pub patch_radius: u32,
    pub max_thread_count: usize,
}

impl<'a> TargetContext<'a> {
    /// The patch window around `pixel`
    pub fn target_region(&self, pixel: Coord) -> Region {
        Region::centered(pixel, self.patch_radius)
            .crop(self.mask.dims())
            .unwrap_or_else(|| Region::new(pixel.x as i32, pixel.y as i32, 0, 0))
    }

    /// Scores every candidate source patch against the patch around `pixel`
    /// and returns the lowest scoring pair, ties go to the source found first
    pub fn best_match(&self, pixel: Coord) -> Result<ScoredPair, Error> {
        let sources = self.sources.candidates(pixel, self.scope);
        if sources.is_empty() {
            return Err(Error::NoSourcePatchesAvailable);
        }

        let mut pairs = CandidatePairs::new(pixel, self.patch_radius, self.mask.dims(), sources.iter())?;
        trace!(x = pixel.x, y = pixel.y, candidates = pairs.len(), "scoring candidates");

        pairs.compute_all_source_differences(self.difference, self.canvas, self.mask, self.max_thread_count)?;
        pairs.sort(self.difference.name());

        pairs.best().cloned().ok_or(Error::NoSourcePatchesAvailable)
    }
}

/// Picks the next target out of the current fill front
pub trait TargetSelector: Send {
    fn name(&self) -> &'static str;

    fn select_next_target(&mut self, ctx: &TargetContext<'_>) -> Result<Target, Error>;
}

fn empty_front() -> Error {
    Error::InvalidMaskState("holes remain, but none of them borders a valid pixel".to_owned())
}

/// The boundary pixel with the highest priority
#[derive(Copy, Clone, Debug, Default)]
pub struct MaxPriority;

impl TargetSelector for MaxPriority {
    fn name(&self) -> &'static str {
        "MaxPriority"
    }

    fn select_next_target(&mut self, ctx: &TargetContext<'_>) -> Result<Target, Error> {
        let (pixel, priority) = ctx.priorities.highest_priority().ok_or_else(empty_front)?;

        Ok(Target {
            pixel,
            region: ctx.target_region(pixel),
            priority,
            best_match: None,
        })
    }
}

/// Looks at the `candidates` highest priority boundary pixels and fills the
/// one whose best source match is closest, trading priority order for
/// fewer poor matches
#[derive(Copy, Clone, Debug)]
pub struct Lookahead {
    candidates: usize,
}

impl Lookahead {
    pub fn new(candidates: usize) -> Self {
        Self {
            candidates: candidates.max(1),
        }
    }

    pub fn candidates(&self) -> usize {
        self.candidates
    }
}

impl TargetSelector for Lookahead {
    fn name(&self) -> &'static str {
        "Lookahead"
    }

    fn select_next_target(&mut self, ctx: &TargetContext<'_>) -> Result<Target, Error> {
        let name = ctx.difference.name();
        let mut best: Option<(Target, f32)> = None;

        // ranked by priority then raster order, so only a strictly better
        // score replaces an earlier candidate
        for (pixel, priority) in ctx.priorities.ranked(self.candidates) {
            let matched = ctx.best_match(pixel)?;
            let score = matched.score(name).unwrap_or(f32::INFINITY);

            if let Some((_, best_score)) = &best {
                if score >= *best_score {
                    continue;
                }
            }

            best = Some((
                Target {
                    pixel,
                    region: ctx.target_region(pixel),
                    priority,
                    best_match: Some(matched),
                },
                score,
            ));
        }

        best.map(|(target, _)| target).ok_or_else(empty_front)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::difference::AveragePixelDifference;
    use crate::priority::ManualPriority;
    use crate::{Dims, Field, PixelState};

    struct Setup {
        canvas: Canvas,
        mask: Mask,
        priorities: PriorityField,
        sources: SourcePatchCollection,
        metric: AveragePixelDifference,
    }

    impl Setup {
        // a hole column at x = 6 and a bright row at y = 6 right of it,
        // no source has the bright row on its right side only
        fn new(manual: impl Fn(Coord) -> f32) -> Self {
            let dims = Dims::new(12, 12);
            let canvas = Canvas::from_fn(dims, 1, |c, px| {
                px[0] = if c.x > 6 && c.y == 6 { 50.0 } else { 10.0 };
            });
            let mask = Mask::from_fn(dims, |c| {
                if c.x == 6 {
                    PixelState::Hole
                } else {
                    PixelState::Valid
                }
            });

            let mut manual_field = Field::new(dims, 0.0);
            for c in Region::whole(dims).coords() {
                manual_field.set(c, manual(c));
            }

            let mut priorities = PriorityField::new(Box::new(ManualPriority::new(manual_field)), &mask);
            priorities.initialize(&canvas, &mask, 1).unwrap();
            priorities.compute_all_priorities(&canvas, &mask).unwrap();

            let mut sources = SourcePatchCollection::new(dims, 1);
            sources.refresh(&mask, &Region::whole(dims));

            Self {
                canvas,
                mask,
                priorities,
                sources,
                metric: AveragePixelDifference::default(),
            }
        }

        fn ctx(&self) -> TargetContext<'_> {
            TargetContext {
                canvas: &self.canvas,
                mask: &self.mask,
                priorities: &self.priorities,
                sources: &self.sources,
                difference: &self.metric,
                scope: SearchScope::Image,
                patch_radius: 1,
                max_thread_count: 1,
            }
        }
    }

    #[test]
    fn max_priority_takes_the_arg_max() {
        let setup = Setup::new(|c| c.y as f32);
        let target = MaxPriority.select_next_target(&setup.ctx()).unwrap();
        assert_eq!(target.pixel, Coord::new(6, 11));
        assert_eq!(target.priority, 11.0);
        assert_eq!(target.region, Region::new(5, 10, 3, 2));
        assert!(target.best_match.is_none());
    }

    #[test]
    fn lookahead_prefers_better_matches() {
        // the seam at y = 6 has the highest priority but no perfect match
        let setup = Setup::new(|c| if c.y == 6 { 5.0 } else { 1.0 });

        let greedy = MaxPriority.select_next_target(&setup.ctx()).unwrap();
        assert_eq!(greedy.pixel, Coord::new(6, 6));

        let target = Lookahead::new(3).select_next_target(&setup.ctx()).unwrap();
        let matched = target.best_match.unwrap();
        assert_eq!(matched.score("AveragePixelDifference"), Some(0.0));
        assert_eq!(target.pixel, Coord::new(6, 0));
    }

    #[test]
    fn empty_front_is_an_error() {
        let mut setup = Setup::new(|_| 1.0);
        setup.mask = Mask::new(setup.mask.dims());
        setup.priorities = PriorityField::new(Box::new(crate::ConfidencePriority::new()), &setup.mask);

        assert!(matches!(
            MaxPriority.select_next_target(&setup.ctx()),
            Err(Error::InvalidMaskState(_))
        ));
    }
}
