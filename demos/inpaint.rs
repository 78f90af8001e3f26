use patch_inpainting as pi;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn setup_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("patch_inpainting=info"))
        .unwrap_or_else(|e| panic!("Invalid log filter: {}", e));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .unwrap_or_else(|e| panic!("Logger initialization failed: {}", e));
}

// a checkerboard with a round hole punched into it
fn synthetic() -> (pi::Canvas, pi::Mask) {
    let dims = pi::Dims::square(96);
    let canvas = pi::Canvas::from_fn(dims, 3, |c, px| {
        let v = if (c.x / 12 + c.y / 12) % 2 == 0 { 220.0 } else { 30.0 };
        px.copy_from_slice(&[v, v * 0.5, 255.0 - v]);
    });

    let mask = pi::Mask::from_fn(dims, |c| {
        let (dx, dy) = (c.x as i32 - 48, c.y as i32 - 48);
        if dx * dx + dy * dy < 14 * 14 {
            pi::PixelState::Hole
        } else {
            pi::PixelState::Valid
        }
    });

    (canvas, mask)
}

fn main() -> Result<(), pi::Error> {
    setup_logging();

    // `inpaint <image> <mask>` fills the black areas of the mask's red channel,
    // without arguments a synthetic image is used
    let args: Vec<String> = std::env::args().skip(1).collect();

    let builder = pi::Inpainter::builder()
        .patch_radius(4)
        .priority(pi::PriorityStrategy::Criminisi)
        // only compare against sources close to the hole
        .search_scope(pi::SearchScope::Local { radius: 40 });

    let mut inpainter = match args.as_slice() {
        [image, mask] => builder
            .mask_channel(pi::ChannelMask::R)
            .build_from_images(image, mask)?,
        _ => {
            let (canvas, mask) = synthetic();
            builder.build(canvas, mask)?
        }
    };

    inpainter.set_visitor(Box::new(|record: &pi::IterationRecord| {
        if record.iteration % 50 == 0 {
            println!(
                "iteration {}: filled {} pixels around {:?}",
                record.iteration, record.filled, record.pair.target_center
            );
        }
    }));

    let inpainted = inpainter.run()?;

    //save the result to the disk
    inpainted.save("out/inpaint.png")?;
    inpainted.save_mask("out/inpaint_mask.png")
}
