use crate::difference::{PatchDifference, PatchPair};
use crate::errors::{InvalidRange, SizeMismatch};
use crate::field::{BinaryField, ScalarField};
use crate::priority::{PriorityField, PriorityStrategy};
use crate::source_patches::{SearchScope, SourcePatchCollection};
use crate::target::{Lookahead, TargetContext, TargetSelector};
use crate::utils::{load_canvas, load_mask, ChannelMask, ImageSource};
use crate::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Lifecycle of an [`Inpainter`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Built, strategies not set up yet
    Uninitialized,
    /// Initialized, nothing filled yet
    Ready,
    /// At least one patch was filled and holes remain
    Iterating,
    /// No holes remain
    Complete,
}

/// What a single iteration did
#[derive(Copy, Clone, Debug)]
pub struct IterationRecord {
    /// Zero based index of the iteration
    pub iteration: usize,
    /// The target and the source it was filled from
    pub pair: PatchPair,
    /// Score of the pair under the configured difference metric
    pub score: f32,
    /// Priority of the target pixel
    pub priority: f32,
    /// Number of hole pixels that were filled
    pub filled: usize,
}

/// Observes an inpainting run. Visitors only ever see the state between two
/// iterations and can't influence the result.
pub trait InpaintingVisitor {
    fn iteration_complete(&mut self, record: &IterationRecord);

    fn inpainting_complete(&mut self, _canvas: &Canvas, _mask: &Mask) {}
}

impl<G> InpaintingVisitor for G
where
    G: FnMut(&IterationRecord) + Send,
{
    fn iteration_complete(&mut self, record: &IterationRecord) {
        self(record)
    }
}

/// Greedy exemplar based inpainting.
///
/// Every iteration picks the fill front pixel with the highest priority,
/// searches the valid part of the image for the patch that best matches
/// the known pixels around it and copies that patch into the hole pixels
/// around it. The inpainter owns the canvas and the mask for the whole run.
///
/// # Example
/// ```no_run
/// let inpainter = patch_inpainting::Inpainter::builder()
///     .patch_radius(4)
///     .priority(patch_inpainting::PriorityStrategy::Criminisi)
///     .build_from_images(&"imgs/photo.png", &"imgs/photo_mask.png")
///     .expect("failed to build inpainter");
///
/// let inpainted = inpainter.run().expect("failed to inpaint");
/// inpainted.save("out/photo.png").expect("failed to save image");
/// ```
pub struct Inpainter {
    canvas: Canvas,
    mask: Mask,
    params: Parameters,
    max_thread_count: usize,
    priorities: Option<PriorityField>,
    sources: SourcePatchCollection,
    painter: PatchInpainter,
    visitor: Option<Box<dyn InpaintingVisitor>>,
    // pixels filled since the source patches were last refreshed
    dirty: Option<Region>,
    state: EngineState,
    completed_iterations: usize,
}

impl Inpainter {
    /// Creates a new builder with default parameters
    pub fn builder() -> InpainterBuilder {
        InpainterBuilder::default()
    }

    /// An inpainter with default parameters apart from the patch radius
    pub fn new(canvas: Canvas, mask: Mask, patch_radius: u32) -> Result<Self, Error> {
        Self::builder().patch_radius(patch_radius).build(canvas, mask)
    }

    /// Replaces the priority strategy, only possible before initialization
    pub fn set_priority_strategy(&mut self, strategy: PriorityStrategy) -> Result<(), Error> {
        if self.state != EngineState::Uninitialized {
            return Err(Error::InvalidState(
                "the priority strategy can't change once initialized",
            ));
        }
        if let PriorityStrategy::Depth { channel } = strategy {
            self.canvas.check_channel(channel)?;
        }
        self.params.priority = Some(strategy);
        Ok(())
    }

    pub fn set_visitor(&mut self, visitor: Box<dyn InpaintingVisitor>) {
        self.visitor = Some(visitor);
    }

    /// Sets up the priority strategy, falling back to the default strategy
    /// if none was given, and forgets all source patches
    pub fn initialize(&mut self) -> Result<(), Error> {
        if self.state != EngineState::Uninitialized {
            return Err(Error::InvalidState("the inpainter is already initialized"));
        }

        let strategy = self
            .params
            .priority
            .take()
            .unwrap_or_default()
            .into_priority(self.params.seed);

        let mut priorities = PriorityField::new(strategy, &self.mask);
        priorities.initialize(&self.canvas, &self.mask, self.params.patch_radius)?;

        self.sources.clear();
        self.dirty = Some(Region::whole(self.mask.dims()));

        info!(
            width = self.mask.dims().width,
            height = self.mask.dims().height,
            holes = self.mask.hole_count(),
            patch_radius = self.params.patch_radius,
            priority = priorities.strategy_name(),
            difference = self.params.difference.name(),
            selector = self.params.target_selector.name(),
            "inpainter initialized"
        );

        self.priorities = Some(priorities);
        self.state = EngineState::Ready;
        Ok(())
    }

    /// Fills a single patch and returns what was done
    pub fn iterate(&mut self) -> Result<IterationRecord, Error> {
        match self.state {
            EngineState::Uninitialized => {
                return Err(Error::InvalidState("initialize must be called before iterate"))
            }
            EngineState::Complete => return Err(Error::InvalidState("there is nothing left to inpaint")),
            EngineState::Ready | EngineState::Iterating => {}
        }

        if !self.has_more_to_inpaint() {
            self.finish();
            return Err(Error::InvalidState("there is nothing left to inpaint"));
        }

        let priorities = self
            .priorities
            .as_mut()
            .ok_or(Error::InvalidState("initialize must be called before iterate"))?;

        priorities.compute_all_priorities(&self.canvas, &self.mask)?;

        if let Some(changed) = self.dirty.take() {
            let added = self.sources.refresh(&self.mask, &changed);
            trace!(added, total = self.sources.len(), "source patches refreshed");
        }
        if self.sources.is_empty() {
            return Err(Error::NoSourcePatchesAvailable);
        }

        let (target, best) = {
            let ctx = TargetContext {
                canvas: &self.canvas,
                mask: &self.mask,
                priorities,
                sources: &self.sources,
                difference: self.params.difference.as_ref(),
                scope: self.params.search_scope,
                patch_radius: self.params.patch_radius,
                max_thread_count: self.max_thread_count,
            };

            let target = self.params.target_selector.select_next_target(&ctx)?;
            let best = match &target.best_match {
                Some(best) => best.clone(),
                None => ctx.best_match(target.pixel)?,
            };
            (target, best)
        };

        let filled = self.painter.paint(&mut self.canvas, &mut self.mask, &best.pair)?;
        if filled.is_empty() {
            return Err(Error::InvalidMaskState(format!(
                "target pixel ({}, {}) had no hole pixels to fill",
                target.pixel.x, target.pixel.y
            )));
        }

        priorities.update(target.pixel, &best.pair.target, &filled, &self.canvas, &self.mask)?;
        self.dirty = Some(best.pair.target);

        let record = IterationRecord {
            iteration: self.completed_iterations,
            pair: best.pair,
            score: best.score(self.params.difference.name()).unwrap_or(f32::NAN),
            priority: target.priority,
            filled: filled.len(),
        };
        self.completed_iterations += 1;

        debug!(
            iteration = record.iteration,
            target_x = record.pair.target_center.x,
            target_y = record.pair.target_center.y,
            source_x = record.pair.source_center.x,
            source_y = record.pair.source_center.y,
            priority = record.priority,
            score = record.score,
            filled = record.filled,
            "patch copied"
        );

        if let Some(visitor) = self.visitor.as_mut() {
            visitor.iteration_complete(&record);
        }

        if self.has_more_to_inpaint() {
            self.state = EngineState::Iterating;
        } else {
            self.finish();
        }

        Ok(record)
    }

    /// Iterates until no holes remain, or until the stop flag is raised.
    /// The stop flag is only checked between iterations, a stopped run can
    /// be resumed with further calls to `iterate` or `inpaint`.
    pub fn inpaint(&mut self) -> Result<(), Error> {
        if self.state == EngineState::Uninitialized {
            self.initialize()?;
        }

        while self.has_more_to_inpaint() {
            if self.is_stopped() {
                info!(
                    iterations = self.completed_iterations,
                    holes = self.mask.hole_count(),
                    "inpainting stopped"
                );
                return Ok(());
            }

            self.iterate()?;
        }

        self.finish();
        Ok(())
    }

    /// Inpaints and returns the result, consuming the inpainter
    pub fn run(mut self) -> Result<InpaintedImage, Error> {
        self.inpaint()?;
        Ok(InpaintedImage {
            canvas: self.canvas,
            mask: self.mask,
        })
    }

    #[inline]
    pub fn has_more_to_inpaint(&self) -> bool {
        self.mask.has_holes()
    }

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The canvas as of the last completed iteration. Hole pixels that are
    /// not filled yet hold NaN, `Unknown` pixels keep their input values.
    pub fn current_output(&self) -> &Canvas {
        &self.canvas
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    #[inline]
    pub fn completed_iterations(&self) -> usize {
        self.completed_iterations
    }

    #[inline]
    pub fn patch_radius(&self) -> u32 {
        self.params.patch_radius
    }

    pub fn source_patches(&self) -> &SourcePatchCollection {
        &self.sources
    }

    /// Priorities of the last iteration, available once initialized
    pub fn priority_image(&self) -> Option<&ScalarField> {
        self.priorities.as_ref().map(PriorityField::priority_image)
    }

    /// The current fill front, available once initialized
    pub fn boundary_image(&self) -> Option<&BinaryField> {
        self.priorities.as_ref().map(PriorityField::boundary_image)
    }

    fn is_stopped(&self) -> bool {
        self.params
            .stop_flag
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    fn finish(&mut self) {
        if self.state == EngineState::Complete {
            return;
        }

        self.state = EngineState::Complete;
        info!(iterations = self.completed_iterations, "inpainting complete");

        if let Some(visitor) = self.visitor.as_mut() {
            visitor.inpainting_complete(&self.canvas, &self.mask);
        }
    }
}

/// Builds an [`Inpainter`] by setting parameters, calling `build` checks the
/// parameters and inputs once, before any work is done
#[derive(Default)]
pub struct InpainterBuilder {
    params: Parameters,
}

impl InpainterBuilder {
    /// Creates a new `InpainterBuilder`, can also be created via
    /// `Inpainter::builder()`
    pub fn new() -> Self {
        Self::default()
    }

    /// Radius of the square patches, a radius of `r` gives `2r + 1` pixel
    /// wide patches.
    ///
    /// Default: 4
    pub fn patch_radius(mut self, radius: u32) -> Self {
        self.params.patch_radius = radius;
        self
    }

    /// Decides which part of the fill front is filled first.
    ///
    /// Default: [`PriorityStrategy::OnionPeel`]
    pub fn priority(mut self, strategy: PriorityStrategy) -> Self {
        self.params.priority = Some(strategy);
        self
    }

    /// The metric candidate source patches are ranked by.
    ///
    /// Default: [`AveragePixelDifference`] with squared differences
    pub fn difference<D: PatchDifference + 'static>(mut self, difference: D) -> Self {
        self.params.difference = Box::new(difference);
        self
    }

    /// Replaces how the next target is chosen.
    ///
    /// Default: [`MaxPriority`](crate::MaxPriority)
    pub fn target_selector<T: TargetSelector + 'static>(mut self, selector: T) -> Self {
        self.params.target_selector = Box::new(selector);
        self.params.lookahead = None;
        self
    }

    /// Shorthand for a [`Lookahead`] target selector over the `candidates`
    /// highest priority fill front pixels
    pub fn lookahead(mut self, candidates: usize) -> Self {
        self.params.lookahead = Some(candidates);
        self
    }

    /// Default: [`SearchScope::Image`]
    pub fn search_scope(mut self, scope: SearchScope) -> Self {
        self.params.search_scope = scope;
        self
    }

    /// Adjacency used to find the fill front, overrides the one of the mask
    pub fn connectivity(mut self, connectivity: Connectivity) -> Self {
        self.params.connectivity = Some(connectivity);
        self
    }

    /// How mask images are turned into masks by `build_from_images`.
    ///
    /// Default: luma below 128 is a hole
    pub fn mask_convention(mut self, convention: MaskConvention) -> Self {
        self.params.mask_convention = convention;
        self
    }

    /// Which channel of a mask image `build_from_images` reads.
    ///
    /// Default: [`ChannelMask::R`]
    pub fn mask_channel(mut self, channel: ChannelMask) -> Self {
        self.params.mask_channel = channel;
        self
    }

    /// Seed for the randomized priority strategy.
    ///
    /// Default: 0
    pub fn seed(mut self, value: u64) -> Self {
        self.params.seed = value;
        self
    }

    /// The maximum number of threads candidate scoring is split over. The
    /// result does not depend on this number.
    ///
    /// Default: The number of logical cores on this system.
    pub fn max_thread_count(mut self, count: usize) -> Self {
        self.params.max_thread_count = Some(count);
        self
    }

    /// A flag that stops `inpaint` before the next iteration once raised
    pub fn stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.params.stop_flag = Some(flag);
        self
    }

    /// Creates an `Inpainter`, or returns an error if invalid parameters or
    /// inputs were specified. Hole pixels of the canvas are cleared.
    pub fn build(mut self, mut canvas: Canvas, mut mask: Mask) -> Result<Inpainter, Error> {
        self.check_parameters_validity()?;
        self.check_images_validity(&canvas, &mask)?;

        if let Some(connectivity) = self.params.connectivity {
            mask.set_connectivity(connectivity);
        }

        if let Some(candidates) = self.params.lookahead {
            self.params.target_selector = Box::new(Lookahead::new(candidates));
        }

        for coord in Region::whole(mask.dims()).coords() {
            if mask.hole_at(coord) {
                canvas.clear(coord);
            }
        }

        let max_thread_count = self.params.max_thread_count.unwrap_or_else(num_cpus::get);
        let sources = SourcePatchCollection::new(mask.dims(), self.params.patch_radius);

        Ok(Inpainter {
            canvas,
            mask,
            params: self.params,
            max_thread_count,
            priorities: None,
            sources,
            painter: PatchInpainter::new(),
            visitor: None,
            dirty: None,
            state: EngineState::Uninitialized,
            completed_iterations: 0,
        })
    }

    /// Loads the image and the mask and builds an `Inpainter` from them
    pub fn build_from_images<'a, I, M>(self, image: I, mask: M) -> Result<Inpainter, Error>
    where
        I: Into<ImageSource<'a>>,
        M: Into<ImageSource<'a>>,
    {
        let canvas = load_canvas(image.into())?;
        let mask = load_mask(mask.into(), self.params.mask_channel, self.params.mask_convention)?;
        self.build(canvas, mask)
    }

    fn check_parameters_validity(&self) -> Result<(), Error> {
        if self.params.patch_radius == 0 {
            return Err(Error::InvalidRange(InvalidRange {
                min: 1.0,
                max: 1024.0,
                value: 0.0,
                name: "patch-radius",
            }));
        }

        if let Some(max_count) = self.params.max_thread_count {
            if max_count == 0 {
                return Err(Error::InvalidRange(InvalidRange {
                    min: 1.0,
                    max: 1024.0,
                    value: max_count as f32,
                    name: "max-thread-count",
                }));
            }
        }

        if let Some(candidates) = self.params.lookahead {
            if candidates == 0 {
                return Err(Error::InvalidRange(InvalidRange {
                    min: 1.0,
                    max: 1024.0,
                    value: candidates as f32,
                    name: "lookahead",
                }));
            }
        }

        Ok(())
    }

    fn check_images_validity(&self, canvas: &Canvas, mask: &Mask) -> Result<(), Error> {
        if canvas.dims() != mask.dims() {
            return Err(Error::SizeMismatch(SizeMismatch {
                image: canvas.dims(),
                mask: mask.dims(),
            }));
        }

        if canvas.channels() == 0 {
            return Err(Error::InvalidRange(InvalidRange {
                min: 1.0,
                max: 64.0,
                value: 0.0,
                name: "channels",
            }));
        }

        // channels read by the configured strategies have to exist
        if let Some(PriorityStrategy::Depth { channel }) = &self.params.priority {
            canvas.check_channel(*channel)?;
        }
        self.params.difference.check_canvas(canvas)?;

        // a full patch has to fit for there to be any source patches
        let dims = mask.dims();
        let side = self.params.patch_radius as u64 * 2 + 1;
        if (dims.width as u64) < side || (dims.height as u64) < side {
            return Err(Error::InvalidRange(InvalidRange {
                min: 1.0,
                max: (dims.width.min(dims.height).saturating_sub(1) / 2) as f32,
                value: self.params.patch_radius as f32,
                name: "patch-radius",
            }));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn striped(dims: Dims) -> (Canvas, Mask) {
        let canvas = Canvas::from_fn(dims, 3, |c, px| {
            let v = if (c.y / 2) % 2 == 0 { 30.0 } else { 220.0 };
            px.copy_from_slice(&[v, v * 0.5, 255.0 - v]);
        });
        let mask = Mask::from_fn(dims, |c| {
            if (6..10).contains(&c.x) && (5..9).contains(&c.y) {
                PixelState::Hole
            } else {
                PixelState::Valid
            }
        });
        (canvas, mask)
    }

    #[test]
    fn walks_through_the_states() {
        let (canvas, mask) = striped(Dims::new(16, 16));
        let mut inpainter = Inpainter::builder()
            .patch_radius(1)
            .max_thread_count(1)
            .build(canvas, mask)
            .unwrap();

        assert_eq!(inpainter.state(), EngineState::Uninitialized);
        assert!(matches!(inpainter.iterate(), Err(Error::InvalidState(_))));

        inpainter.initialize().unwrap();
        assert_eq!(inpainter.state(), EngineState::Ready);
        assert!(matches!(
            inpainter.set_priority_strategy(PriorityStrategy::Random),
            Err(Error::InvalidState(_))
        ));

        let record = inpainter.iterate().unwrap();
        assert_eq!(record.iteration, 0);
        assert!(record.filled > 0);
        assert_eq!(inpainter.state(), EngineState::Iterating);
        assert_eq!(inpainter.completed_iterations(), 1);

        inpainter.inpaint().unwrap();
        assert_eq!(inpainter.state(), EngineState::Complete);
        assert!(!inpainter.has_more_to_inpaint());
        assert!(matches!(inpainter.iterate(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn holes_are_cleared_on_build() {
        let (canvas, mask) = striped(Dims::new(16, 16));
        let inpainter = Inpainter::new(canvas, mask, 1).unwrap();

        let output = inpainter.current_output();
        assert!(!output.is_assigned(Coord::new(6, 5)));
        assert!(output.is_assigned(Coord::new(5, 5)));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let dims = Dims::new(8, 8);
        let build = |builder: InpainterBuilder| {
            let (canvas, mask) = (Canvas::new(dims, 1, 0.0), Mask::new(dims));
            builder.build(canvas, mask)
        };

        assert!(matches!(
            build(Inpainter::builder().patch_radius(0)),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            build(Inpainter::builder().max_thread_count(0)),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            build(Inpainter::builder().lookahead(0)),
            Err(Error::InvalidRange(_))
        ));
        // a 9x9 patch doesn't fit into an 8x8 image
        assert!(matches!(
            build(Inpainter::builder().patch_radius(4)),
            Err(Error::InvalidRange(_))
        ));
        assert!(build(Inpainter::builder().patch_radius(3)).is_ok());

        let mismatched = Inpainter::builder().build(Canvas::new(dims, 1, 0.0), Mask::new(Dims::new(9, 9)));
        assert!(matches!(mismatched, Err(Error::SizeMismatch(_))));
    }

    #[test]
    fn channels_are_checked_on_build() {
        let dims = Dims::new(9, 9);
        let mask = Mask::from_fn(dims, |c| {
            if c == Coord::new(4, 4) {
                PixelState::Hole
            } else {
                PixelState::Valid
            }
        });
        let build = |builder: InpainterBuilder, channels: usize| builder.build(Canvas::new(dims, channels, 0.0), mask.clone());

        assert!(matches!(
            build(Inpainter::builder().patch_radius(1).priority(PriorityStrategy::Criminisi), 0),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            build(Inpainter::builder().priority(PriorityStrategy::Depth { channel: 3 }), 3),
            Err(Error::ChannelMismatch(3, 3))
        ));
        assert!(matches!(
            build(Inpainter::builder().difference(DepthDifference::new(3)), 3),
            Err(Error::ChannelMismatch(3, 3))
        ));
        assert!(build(Inpainter::builder().difference(DepthDifference::new(3)), 4).is_ok());
    }

    #[test]
    fn unknown_pixels_keep_their_values() {
        let dims = Dims::new(10, 10);
        let canvas = Canvas::new(dims, 1, 7.0);
        let mask = Mask::from_fn(dims, |c| match (c.x, c.y) {
            (0, 0) => PixelState::Unknown,
            (5, 5) => PixelState::Hole,
            _ => PixelState::Valid,
        });

        let mut inpainter = Inpainter::builder().patch_radius(1).build(canvas, mask).unwrap();
        let check = |inpainter: &Inpainter| {
            for coord in Region::whole(dims).coords() {
                let output = inpainter.current_output();
                assert_eq!(inpainter.mask().is_hole(coord).unwrap(), !output.is_assigned(coord));
            }
        };

        check(&inpainter);
        assert_eq!(inpainter.current_output().pixel(Coord::new(0, 0)), &[7.0]);

        inpainter.inpaint().unwrap();
        check(&inpainter);
        assert_eq!(inpainter.mask().get(Coord::new(0, 0)).unwrap(), PixelState::Unknown);
    }

    #[test]
    fn stop_flag_is_checked_between_iterations() {
        let (canvas, mask) = striped(Dims::new(16, 16));
        let stop = Arc::new(AtomicBool::new(false));
        let mut inpainter = Inpainter::builder()
            .patch_radius(1)
            .max_thread_count(1)
            .stop_flag(Arc::clone(&stop))
            .build(canvas, mask)
            .unwrap();

        let raise = Arc::clone(&stop);
        inpainter.set_visitor(Box::new(move |_: &IterationRecord| raise.store(true, Ordering::Relaxed)));

        inpainter.inpaint().unwrap();
        assert_eq!(inpainter.completed_iterations(), 1);
        assert!(inpainter.has_more_to_inpaint());

        // lowering the flag resumes the run
        stop.store(false, Ordering::Relaxed);
        inpainter.set_visitor(Box::new(|_: &IterationRecord| {}));
        inpainter.inpaint().unwrap();
        assert_eq!(inpainter.state(), EngineState::Complete);
    }

    #[test]
    fn unreachable_holes_are_fatal() {
        let dims = Dims::new(12, 12);
        let canvas = Canvas::new(dims, 1, 50.0);
        // the hole is walled off by unknown pixels
        let mask = Mask::from_fn(dims, |c| match (c.x, c.y) {
            (5, 5) => PixelState::Hole,
            (4..=6, 4..=6) => PixelState::Unknown,
            _ => PixelState::Valid,
        });

        let mut inpainter = Inpainter::builder().patch_radius(1).build(canvas, mask).unwrap();
        assert!(matches!(inpainter.inpaint(), Err(Error::InvalidMaskState(_))));
    }
}
