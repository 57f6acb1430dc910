use clap::Args;
use fastrand::Rng;
use markforge_core::error::{MppError, MppResult};
use markforge_core::scene::{MarkRecord, SceneDefinition, ShapeRecord, StackRecord};
use std::path::PathBuf;
use tracing::info;

const BACKGROUND: f64 = 1.0;
const OBJECT: f64 = -3.0;

#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    #[arg(short, long)]
    pub out: PathBuf,

    #[arg(long, default_value_t = 48)]
    pub width: usize,

    #[arg(long, default_value_t = 48)]
    pub height: usize,

    /// Disks painted into the energy stack, each with a matching candidate.
    #[arg(long, default_value_t = 4)]
    pub objects: usize,

    /// Extra candidates at random positions.
    #[arg(long, default_value_t = 8)]
    pub decoys: usize,

    #[arg(long, default_value_t = 4.0)]
    pub radius: f64,

    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: &DemoArgs) -> MppResult<()> {
    let mut rng = args.seed.map_or_else(Rng::new, Rng::with_seed);
    let scene = synthetic_scene(args, &mut rng)?;
    scene
        .save_to_file(&args.out)
        .map_err(MppError::Validation)?;
    info!(
        "🧪 Wrote scene '{}' ({}x{}, {} candidates) to {}",
        scene.name,
        args.width,
        args.height,
        scene.pool.len(),
        args.out.display()
    );
    Ok(())
}

fn random_center(args: &DemoArgs, rng: &mut Rng) -> [f64; 2] {
    let r = args.radius.ceil() as usize;
    [
        rng.usize(r..args.width - r) as f64,
        rng.usize(r..args.height - r) as f64,
    ]
}

/// Uniform background with `objects` low-energy disks. The first `objects`
/// candidates sit exactly on the disks; the rest are decoys.
pub fn synthetic_scene(args: &DemoArgs, rng: &mut Rng) -> MppResult<SceneDefinition> {
    let span = 2 * args.radius.ceil() as usize + 1;
    if !(args.radius > 0.0) || args.width < span || args.height < span {
        return Err(MppError::Config(format!(
            "a {}x{} stack cannot hold disks of radius {}",
            args.width, args.height, args.radius
        )));
    }

    let mut values = vec![BACKGROUND; args.width * args.height];
    let mut pool = Vec::with_capacity(args.objects + args.decoys);

    for i in 0..args.objects + args.decoys {
        let center = random_center(args, rng);
        if i < args.objects {
            for y in 0..args.height {
                for x in 0..args.width {
                    let dx = x as f64 - center[0];
                    let dy = y as f64 - center[1];
                    if dx * dx + dy * dy <= args.radius * args.radius {
                        values[y * args.width + x] = OBJECT;
                    }
                }
            }
        }
        pool.push(MarkRecord {
            id: i as u64,
            shape: ShapeRecord::Ellipse {
                center,
                radii: [args.radius, args.radius],
                angle: 0.0,
            },
        });
    }

    Ok(SceneDefinition {
        name: format!("demo-{}x{}", args.width, args.height),
        stack: StackRecord {
            width: args.width,
            height: args.height,
            depth: 1,
            values,
        },
        pool,
        initial: Vec::new(),
    })
}
