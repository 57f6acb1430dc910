use crate::reports::{self, CandidateRow};
use clap::{ArgMatches, Args};
use markforge_core::api;
use markforge_core::config::RunConfig;
use markforge_core::energy::CoverageOracle;
use markforge_core::error::{MppError, MppResult};
use markforge_core::job::RunIdentifier;
use markforge_core::mark::Mark;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub config: RunConfig,

    #[arg(short, long)]
    pub scene: PathBuf,

    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Only show the N lowest-energy candidates.
    #[arg(long)]
    pub top: Option<usize>,
}

pub fn run(args: &InspectArgs, matches: Option<&ArgMatches>) -> MppResult<()> {
    let config = super::resolve_config(args.config_file.as_deref(), &args.config, matches)?;
    config.validate().map_err(MppError::Config)?;
    let scene = super::load_scene(&args.scene)?;
    let run_id = RunIdentifier::from_parts(&config, &scene).map_err(MppError::Config)?;

    // Also checks pool ids and the initial marks.
    let (energy, _) = api::prepare_scene(&scene, Arc::new(CoverageOracle::default()))?;
    let region = *energy.region();

    let mut rows = Vec::with_capacity(scene.pool.len());
    for record in &scene.pool {
        let mark = Mark::try_from(record)?;
        rows.push(CandidateRow {
            id: record.id,
            kind: mark.kind().to_string(),
            voxels: mark.voxels(&region).len(),
            energy: energy.mark_energy(&mark)?,
            initial: scene.initial.contains(&record.id),
        });
    }
    rows.sort_by(|a, b| a.energy.total_cmp(&b.energy).then(a.id.cmp(&b.id)));
    if let Some(n) = args.top {
        rows.truncate(n);
    }

    println!("\n🔎 === SCENE: {} === 🔎", scene.name);
    println!(
        "Stack {}x{}x{} | {} candidates | {} initial | run {}",
        scene.stack.width,
        scene.stack.height,
        scene.stack.depth,
        scene.pool.len(),
        scene.initial.len(),
        run_id.short()
    );
    reports::print_candidate_report(&rows);
    Ok(())
}
