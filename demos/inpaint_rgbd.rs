use patch_inpainting as pi;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEPTH: usize = 3;

fn main() -> Result<(), pi::Error> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("patch_inpainting=debug"))
        .unwrap_or_else(|e| panic!("Invalid log filter: {}", e));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .unwrap_or_else(|e| panic!("Logger initialization failed: {}", e));

    // an RGB-D scene: a near box in front of a far striped wall, the depth
    // lives in the fourth channel
    let dims = pi::Dims::new(80, 60);
    let canvas = pi::Canvas::from_fn(dims, 4, |c, px| {
        let near = (20..44).contains(&c.x) && (15..45).contains(&c.y);
        if near {
            px.copy_from_slice(&[200.0, 60.0, 40.0, 30.0]);
        } else {
            let stripe = if (c.y / 5) % 2 == 0 { 180.0 } else { 90.0 };
            px.copy_from_slice(&[stripe, stripe, 160.0, 220.0]);
        }
    });

    // the hole straddles the edge of the box
    let mask = pi::Mask::from_fn(dims, |c| {
        if (38..52).contains(&c.x) && (25..35).contains(&c.y) {
            pi::PixelState::Hole
        } else {
            pi::PixelState::Valid
        }
    });

    let inpainter = pi::Inpainter::builder()
        .patch_radius(3)
        .priority(pi::PriorityStrategy::Depth { channel: DEPTH })
        .difference(pi::DepthDifference::new(DEPTH))
        .lookahead(4)
        .build(canvas, mask)?;

    let inpainted = inpainter.run()?;

    // the 4th channel is written out as alpha
    inpainted.save("out/inpaint_rgbd.png")
}
