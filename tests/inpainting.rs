use patch_inpainting as pi;
use pi::{Canvas, Coord, Dims, Mask, PixelState, Region};
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

/// Diagonal stripes with some noise, and a blob shaped hole
fn textured(dims: Dims, channels: usize, seed: u64) -> (Canvas, Mask) {
    let mut rng = rand_pcg::Pcg32::seed_from_u64(seed);
    let canvas = Canvas::from_fn(dims, channels, |c, px| {
        let stripe = if ((c.x + c.y) / 3) % 2 == 0 { 40.0 } else { 200.0 };
        for (i, p) in px.iter_mut().enumerate() {
            *p = stripe + (i as f32) * 5.0 + rng.gen_range(0..8) as f32;
        }
    });

    let (cx, cy) = (dims.width as i32 / 2, dims.height as i32 / 2);
    let mask = Mask::from_fn(dims, |c| {
        let (dx, dy) = (c.x as i32 - cx, c.y as i32 - cy);
        if dx * dx + 2 * dy * dy < 20 {
            PixelState::Hole
        } else {
            PixelState::Valid
        }
    });

    (canvas, mask)
}

fn builder() -> pi::InpainterBuilder {
    pi::Inpainter::builder().patch_radius(2).max_thread_count(1)
}

#[test]
fn holes_shrink_until_gone() {
    let (canvas, mask) = textured(Dims::new(24, 20), 3, 1);
    let initial_holes = mask.hole_count();
    assert!(initial_holes > 0);

    let mut inpainter = builder().build(canvas, mask).unwrap();
    inpainter.initialize().unwrap();

    let mut holes = initial_holes;
    let mut sources = 0;
    while inpainter.has_more_to_inpaint() {
        let record = inpainter.iterate().unwrap();

        let remaining = inpainter.mask().hole_count();
        assert!(remaining < holes);
        assert_eq!(holes - remaining, record.filled);
        holes = remaining;

        // source patches are only ever added
        let now = inpainter.source_patches().len();
        assert!(now >= sources);
        sources = now;

        assert!(inpainter.completed_iterations() <= initial_holes);
    }

    assert_eq!(inpainter.state(), pi::EngineState::Complete);
}

#[test]
fn source_patches_are_never_dropped() {
    let (canvas, mask) = textured(Dims::new(20, 20), 1, 2);
    let mut inpainter = builder().build(canvas, mask).unwrap();
    inpainter.initialize().unwrap();

    let mut known: Vec<Coord> = Vec::new();
    while inpainter.has_more_to_inpaint() {
        inpainter.iterate().unwrap();

        let collection = inpainter.source_patches();
        assert!(known.iter().all(|c| collection.contains(*c)));
        known = collection.iter().map(|p| p.center).collect();
    }
}

#[test]
fn mask_and_image_agree() {
    let (canvas, mask) = textured(Dims::new(22, 18), 3, 3);
    let mut inpainter = builder()
        .priority(pi::PriorityStrategy::Criminisi)
        .build(canvas, mask)
        .unwrap();
    inpainter.initialize().unwrap();

    let check = |inpainter: &pi::Inpainter| {
        let mask = inpainter.mask();
        let output = inpainter.current_output();
        for coord in Region::whole(mask.dims()).coords() {
            assert_eq!(mask.is_valid(coord).unwrap(), output.is_assigned(coord), "at {:?}", coord);
        }
    };

    check(&inpainter);
    while inpainter.has_more_to_inpaint() {
        inpainter.iterate().unwrap();
        check(&inpainter);
    }
}

#[test]
fn valid_pixels_are_never_overwritten() {
    let (canvas, mask) = textured(Dims::new(20, 20), 3, 4);
    let mut inpainter = builder().build(canvas, mask).unwrap();
    inpainter.initialize().unwrap();

    while inpainter.has_more_to_inpaint() {
        let before_canvas = inpainter.current_output().clone();
        let before_mask = inpainter.mask().clone();

        inpainter.iterate().unwrap();

        for coord in Region::whole(before_mask.dims()).coords() {
            if before_mask.is_valid(coord).unwrap() {
                assert_eq!(inpainter.current_output().pixel(coord), before_canvas.pixel(coord));
                assert!(inpainter.mask().is_valid(coord).unwrap());
            }
        }
    }
}

#[test]
fn filled_pixels_come_from_the_source_patch() {
    let (canvas, mask) = textured(Dims::new(20, 20), 3, 5);
    let original = canvas.clone();
    let mut inpainter = builder().build(canvas, mask).unwrap();
    inpainter.initialize().unwrap();

    let record = inpainter.iterate().unwrap();
    let pair = record.pair;
    let output = inpainter.current_output();
    for (target, source) in pair.coords() {
        if original.pixel(target) != output.pixel(target) {
            assert_eq!(output.pixel(target), output.pixel(source));
        }
    }
}

#[test]
fn boundary_matches_brute_force() {
    for seed in 0..4 {
        let dims = Dims::new(13, 11);
        let mut rng = rand_pcg::Pcg32::seed_from_u64(seed);
        for connectivity in &[pi::Connectivity::Four, pi::Connectivity::Eight] {
            let mask = Mask::from_fn(dims, |_| {
                if rng.gen_bool(0.3) {
                    PixelState::Hole
                } else {
                    PixelState::Valid
                }
            })
            .with_connectivity(*connectivity);

            let boundary = mask.find_boundary(&Region::whole(dims)).unwrap();
            for coord in Region::whole(dims).coords() {
                let mut expected = false;
                if mask.is_hole(coord).unwrap() {
                    for dy in -1i32..=1 {
                        for dx in -1i32..=1 {
                            let diagonal = dx != 0 && dy != 0;
                            if (dx == 0 && dy == 0)
                                || (diagonal && *connectivity == pi::Connectivity::Four)
                            {
                                continue;
                            }
                            if let Some(n) = coord.offset(dx, dy).to_unsigned(dims) {
                                expected |= mask.is_valid(n).unwrap();
                            }
                        }
                    }
                }
                assert_eq!(*boundary.get(coord), expected, "at {:?}", coord);
            }
        }
    }
}

fn full_run(builder: pi::InpainterBuilder, seed: u64) -> (Canvas, Vec<pi::IterationRecord>) {
    let (canvas, mask) = textured(Dims::new(20, 18), 3, seed);
    let mut inpainter = builder.build(canvas, mask).unwrap();

    let records = Rc::new(RefCell::new(Vec::new()));
    let completed = Rc::new(RefCell::new(0));

    struct Recorder {
        records: Rc<RefCell<Vec<pi::IterationRecord>>>,
        completed: Rc<RefCell<usize>>,
    }

    impl pi::InpaintingVisitor for Recorder {
        fn iteration_complete(&mut self, record: &pi::IterationRecord) {
            self.records.borrow_mut().push(*record);
        }

        fn inpainting_complete(&mut self, _canvas: &Canvas, mask: &Mask) {
            assert!(!mask.has_holes());
            *self.completed.borrow_mut() += 1;
        }
    }

    inpainter.set_visitor(Box::new(Recorder {
        records: Rc::clone(&records),
        completed: Rc::clone(&completed),
    }));
    inpainter.inpaint().unwrap();

    assert_eq!(*completed.borrow(), 1);
    assert_eq!(records.borrow().len(), inpainter.completed_iterations());

    let output = inpainter.current_output().clone();
    let records = records.borrow().clone();
    (output, records)
}

#[test]
fn thread_count_does_not_change_the_result() {
    let (single, single_records) = full_run(pi::Inpainter::builder().patch_radius(2).max_thread_count(1), 6);
    let (multi, multi_records) = full_run(pi::Inpainter::builder().patch_radius(2).max_thread_count(4), 6);

    assert_eq!(single, multi);
    assert_eq!(single_records.len(), multi_records.len());
    for (a, b) in single_records.iter().zip(&multi_records) {
        assert_eq!(a.pair, b.pair);
    }
}

#[test]
fn random_priority_is_reproducible() {
    let run = |seed| {
        full_run(
            builder().priority(pi::PriorityStrategy::Random).seed(seed),
            7,
        )
    };

    let (a, _) = run(3);
    let (b, _) = run(3);
    assert_eq!(a, b);
}

macro_rules! completes {
    ($name:ident, $builder:expr) => {
        #[test]
        fn $name() {
            let (output, records) = full_run($builder, 8);
            assert!(!records.is_empty());
            let dims = output.dims();
            for coord in Region::whole(dims).coords() {
                assert!(output.is_assigned(coord));
            }
        }
    };
}

completes!(completes_with_onion_peel, builder());
completes!(
    completes_with_criminisi,
    builder().priority(pi::PriorityStrategy::Criminisi)
);
completes!(completes_with_lookahead, builder().lookahead(4));
completes!(
    completes_with_local_search,
    builder().search_scope(pi::SearchScope::Local { radius: 4 })
);
completes!(
    completes_with_eight_connectivity,
    builder().connectivity(pi::Connectivity::Eight)
);
completes!(
    completes_with_absolute_differences,
    builder().difference(pi::AveragePixelDifference::new(pi::Norm::Absolute))
);
completes!(
    completes_with_color_histograms,
    builder().difference(pi::ColorHistogramDifference::new(16))
);
completes!(
    completes_with_gradient_histograms,
    builder().difference(pi::GradientMagnitudeHistogramDifference::new(16))
);

#[test]
fn rgbd_canvas_with_depth_strategies() {
    let dims = Dims::new(20, 20);
    // near plane on the left, far plane on the right, noisy color
    let canvas = Canvas::from_fn(dims, 4, |c, px| {
        let depth = if c.x < 10 { 20.0 } else { 180.0 };
        px.copy_from_slice(&[
            ((c.x * 37 + c.y * 11) % 255) as f32,
            ((c.y * 53) % 255) as f32,
            90.0,
            depth,
        ]);
    });
    let mask = Mask::from_fn(dims, |c| {
        if (7..13).contains(&c.x) && (8..12).contains(&c.y) {
            PixelState::Hole
        } else {
            PixelState::Valid
        }
    });

    let inpainter = builder()
        .priority(pi::PriorityStrategy::Depth { channel: 3 })
        .difference(pi::DepthDifference::new(3))
        .build(canvas, mask)
        .unwrap();

    let inpainted = inpainter.run().unwrap();
    let output = inpainted.canvas();
    for coord in Region::whole(dims).coords() {
        let depth = output.channel(coord, 3);
        assert!(depth == 20.0 || depth == 180.0, "depth {} at {:?}", depth, coord);
    }
}

#[test]
fn missing_sources_are_fatal() {
    // every 5x5 window of a 5x5 image covers the hole
    let dims = Dims::new(5, 5);
    let mask = Mask::from_fn(dims, |c| {
        if c == Coord::new(2, 2) {
            PixelState::Hole
        } else {
            PixelState::Valid
        }
    });

    let mut inpainter = pi::Inpainter::builder()
        .patch_radius(2)
        .build(Canvas::new(dims, 1, 1.0), mask)
        .unwrap();
    assert!(matches!(inpainter.inpaint(), Err(pi::Error::NoSourcePatchesAvailable)));
}

#[test]
fn all_hole_image_has_no_sources() {
    let dims = Dims::new(8, 8);
    let mask = Mask::from_fn(dims, |_| PixelState::Hole);

    let mut inpainter = pi::Inpainter::new(Canvas::new(dims, 3, 0.0), mask, 1).unwrap();
    inpainter.initialize().unwrap();
    assert!(matches!(inpainter.iterate(), Err(pi::Error::NoSourcePatchesAvailable)));
}

#[test]
fn inpainted_image_converts_to_rgba() {
    let (canvas, mask) = textured(Dims::new(16, 16), 3, 9);
    let inpainted = builder().build(canvas, mask).unwrap().run().unwrap();

    assert!(!inpainted.mask().has_holes());
    let img = inpainted.into_image().to_rgba();
    assert_eq!(img.dimensions(), (16, 16));
    assert!(img.pixels().all(|p| p[3] == 255));
}

#[test]
fn written_png_and_saved_mask_decode() {
    let (canvas, mask) = textured(Dims::new(16, 12), 3, 21);
    let inpainted = builder().build(canvas, mask).unwrap().run().unwrap();

    let mask_path = std::env::temp_dir()
        .join("patch-inpainting-tests")
        .join("written_png_and_saved_mask_decode.png");
    inpainted.save_mask(&mask_path).unwrap();
    let saved_mask = pi::image::open(&mask_path).unwrap().to_luma();
    assert_eq!(saved_mask.dimensions(), (16, 12));
    assert!(saved_mask.pixels().all(|p| p[0] == 255));

    let expected = inpainted.canvas().to_rgba_image();
    let mut bytes = Vec::new();
    inpainted
        .write(&mut bytes, pi::image::ImageOutputFormat::Png)
        .unwrap();
    assert!(!bytes.is_empty());

    let decoded = pi::image::load_from_memory(&bytes).unwrap().to_rgba();
    assert_eq!(decoded.dimensions(), (16, 12));
    assert_eq!(decoded, expected);
}
