// BEGIN - Embark standard lints v0.4
// do not change or add/remove here, but one can add exceptions after this section
// for more info see: <https://github.com/EmbarkStudios/rust-ecosystem/issues/59>
#![deny(unsafe_code)]
#![warn(
    clippy::all,
    clippy::await_holding_lock,
    clippy::char_lit_as_u8,
    clippy::checked_conversions,
    clippy::dbg_macro,
    clippy::debug_assert_with_mut_call,
    clippy::doc_markdown,
    clippy::empty_enum,
    clippy::enum_glob_use,
    clippy::exit,
    clippy::expl_impl_clone_on_copy,
    clippy::explicit_deref_methods,
    clippy::explicit_into_iter_loop,
    clippy::fallible_impl_from,
    clippy::filter_map_next,
    clippy::float_cmp_const,
    clippy::fn_params_excessive_bools,
    clippy::if_let_mutex,
    clippy::implicit_clone,
    clippy::imprecise_flops,
    clippy::inefficient_to_string,
    clippy::invalid_upcast_comparisons,
    clippy::large_types_passed_by_value,
    clippy::let_unit_value,
    clippy::linkedlist,
    clippy::lossy_float_literal,
    clippy::macro_use_imports,
    clippy::manual_ok_or,
    clippy::map_err_ignore,
    clippy::map_flatten,
    clippy::map_unwrap_or,
    clippy::match_on_vec_items,
    clippy::match_same_arms,
    clippy::match_wildcard_for_single_variants,
    clippy::mem_forget,
    clippy::mismatched_target_os,
    clippy::mut_mut,
    clippy::mutex_integer,
    clippy::needless_borrow,
    clippy::needless_continue,
    clippy::option_option,
    clippy::path_buf_push_overwrite,
    clippy::ptr_as_ptr,
    clippy::ref_option_ref,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::same_functions_in_if_condition,
    clippy::semicolon_if_nothing_returned,
    clippy::string_add_assign,
    clippy::string_add,
    clippy::string_lit_as_bytes,
    clippy::string_to_string,
    clippy::todo,
    clippy::trait_duplication_in_bounds,
    clippy::unimplemented,
    clippy::unnested_or_patterns,
    clippy::unused_self,
    clippy::useless_transmute,
    clippy::verbose_file_reads,
    clippy::zero_sized_map_values,
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms
)]
// END - Embark standard lints v0.4

//! `patch-inpainting` fills holes in images by greedily copying patches from
//! the known part of the image, in the manner of Criminisi et al.
//!
//! Build an `Inpainter` via an `InpainterBuilder`, which follows the builder
//! pattern. Calling `build` checks the parameters and the image and mask
//! inputs once, before any work is done.
//!
//! Every iteration the inpainter
//!
//! 1. computes a priority for every hole pixel bordering a valid pixel
//! 2. picks the pixel with the highest priority as target
//! 3. compares the patch around it against every fully valid patch
//! 4. copies the best match into the hole pixels of the target patch
//!
//! until no hole pixels remain.
//!
//! ## Usage
//!
//! ```no_run
//! use patch_inpainting as pi;
//!
//! // Inpaint with the Criminisi priority and 9x9 patches
//! let inpainter = pi::Inpainter::builder()
//!     .patch_radius(4)
//!     .priority(pi::PriorityStrategy::Criminisi)
//!     // Black pixels in the mask are the hole
//!     .build_from_images(&"imgs/photo.png", &"imgs/photo_mask.png")
//!     .expect("failed to build inpainter");
//!
//! let inpainted = inpainter.run().expect("failed to inpaint");
//! inpainted.save("out/photo.png").expect("failed to save image");
//! ```
//!
//! The inpainter can also be driven one iteration at a time, eg. to record
//! the fill order.
//!
//! ```
//! use patch_inpainting::{Canvas, Dims, Inpainter, Mask, PixelState};
//!
//! let dims = Dims::new(16, 16);
//! let canvas = Canvas::new(dims, 3, 128.0);
//! let mask = Mask::from_fn(dims, |c| {
//!     if c.x == 8 && c.y == 8 {
//!         PixelState::Hole
//!     } else {
//!         PixelState::Valid
//!     }
//! });
//!
//! let mut inpainter = Inpainter::new(canvas, mask, 2).unwrap();
//! inpainter.initialize().unwrap();
//! while inpainter.has_more_to_inpaint() {
//!     let record = inpainter.iterate().unwrap();
//!     println!("filled {} pixels from {:?}", record.filled, record.pair.source_center);
//! }
//! ```
mod canvas;
mod difference;
mod errors;
mod field;
mod filters;
mod mask;
mod paint;
mod priority;
mod region;
pub mod session;
mod source_patches;
mod target;
mod utils;

pub use image;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub use canvas::Canvas;
pub use difference::{
    boundary_energy, AveragePixelDifference, CandidatePairs, ColorHistogramDifference,
    DepthDifference, GradientMagnitudeHistogramDifference, Norm, PatchDifference, PatchPair,
    ScoredPair,
};
pub use errors::{Error, OutOfBounds};
pub use field::{BinaryField, Field, ScalarField, VectorField};
pub use mask::{Connectivity, Mask, MaskConvention, PixelState};
pub use paint::PatchInpainter;
pub use priority::{
    ConfidencePriority, CriminisiPriority, DepthPriority, ManualPriority, Priority,
    PriorityField, PriorityStrategy, RandomPriority,
};
pub use region::{Coord, Region, SignedCoord};
pub use session::{EngineState, Inpainter, InpainterBuilder, InpaintingVisitor, IterationRecord};
pub use source_patches::{SearchScope, SourcePatch, SourcePatchCollection};
pub use target::{Lookahead, MaxPriority, Target, TargetContext, TargetSelector};
pub use utils::{load_canvas, load_dynamic_image, load_mask, ChannelMask, ImageSource};

/// Simple dimensions struct
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dims {
    pub width: u32,
    pub height: u32,
}

impl Dims {
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
        }
    }
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn contains(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }
}

struct Parameters {
    patch_radius: u32,
    priority: Option<PriorityStrategy>,
    difference: Box<dyn PatchDifference>,
    target_selector: Box<dyn TargetSelector>,
    lookahead: Option<usize>,
    search_scope: SearchScope,
    connectivity: Option<Connectivity>,
    mask_convention: MaskConvention,
    mask_channel: ChannelMask,
    max_thread_count: Option<usize>,
    seed: u64,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            patch_radius: 4,
            priority: None,
            difference: Box::new(AveragePixelDifference::default()),
            target_selector: Box::new(MaxPriority),
            lookahead: None,
            search_scope: SearchScope::Image,
            connectivity: None,
            mask_convention: MaskConvention::default(),
            mask_channel: ChannelMask::default(),
            max_thread_count: None,
            seed: 0,
            stop_flag: None,
        }
    }
}

/// An image produced by `Inpainter::run()`
pub struct InpaintedImage {
    canvas: Canvas,
    mask: Mask,
}

impl InpaintedImage {
    /// Saves the inpainted image to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent_path) = path.parent() {
            std::fs::create_dir_all(&parent_path)?;
        }

        self.canvas.to_rgba_image().save(&path)?;
        Ok(())
    }

    /// Saves the final mask, pixels left unfilled by a stopped run stay
    /// black
    pub fn save_mask<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent_path) = path.parent() {
            std::fs::create_dir_all(&parent_path)?;
        }

        self.mask.to_luma_image().save(&path)?;
        Ok(())
    }

    /// Writes the inpainted image to the specified stream
    pub fn write<W: std::io::Write>(
        self,
        writer: &mut W,
        fmt: image::ImageOutputFormat,
    ) -> Result<(), Error> {
        let dyn_img = self.into_image();
        Ok(dyn_img.write_to(writer, fmt)?)
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Returns the inpainted output image
    pub fn into_image(self) -> image::DynamicImage {
        self.canvas.to_dynamic_image()
    }
}

impl AsRef<Canvas> for InpaintedImage {
    fn as_ref(&self) -> &Canvas {
        &self.canvas
    }
}
