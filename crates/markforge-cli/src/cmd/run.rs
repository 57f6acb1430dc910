use crate::reports;
use clap::{ArgMatches, Args};
use markforge_core::api;
use markforge_core::bridge::{MarkEnergy, Pixelized};
use markforge_core::config::RunConfig;
use markforge_core::error::{MppError, MppResult};
use markforge_core::job::RunIdentifier;
use markforge_core::optimizer::{Checkpoint, HistorySink, ReportSink, RunStatistics};
use markforge_core::scene::MarkRecord;
use markforge_core::state::{KernelState, MarksFromPartition};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: RunConfig,

    #[arg(short, long)]
    pub scene: PathBuf,

    /// JSON run configuration. Flags given explicitly override its values.
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Write one CSV row per checkpoint.
    #[arg(long)]
    pub trace: Option<PathBuf>,

    /// Write the final marks and statistics as JSON.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Logs every checkpoint and keeps the history for the trace export.
struct CliSink {
    history: HistorySink,
}

impl ReportSink<Pixelized<MarksFromPartition>> for CliSink {
    fn report(&mut self, checkpoint: &Checkpoint<'_, Pixelized<MarksFromPartition>>) -> MppResult<()> {
        info!(
            "It {:6} | T {:9.4} | Energy {:10.3} | Marks {}",
            checkpoint.iteration,
            checkpoint.temperature,
            checkpoint.score.score,
            checkpoint.score.size
        );
        self.history.report(checkpoint)
    }

    fn finish(&mut self, stats: &RunStatistics) -> MppResult<()> {
        ReportSink::<Pixelized<MarksFromPartition>>::finish(&mut self.history, stats)
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub scene: String,
    pub energy: f64,
    pub marks: Vec<MarkRecord>,
    pub contributions: Vec<MarkEnergy>,
    pub iterations: usize,
    pub termination: String,
    pub statistics: RunStatistics,
}

pub fn run(args: &RunArgs, matches: Option<&ArgMatches>) -> MppResult<()> {
    let config = super::resolve_config(args.config_file.as_deref(), &args.config, matches)?;
    let scene = super::load_scene(&args.scene)?;
    let run_id = RunIdentifier::from_parts(&config, &scene).map_err(MppError::Config)?;

    let mut sink = CliSink {
        history: HistorySink::new(),
    };
    let outcome = api::run_scene(&scene, &config, &mut sink)?;

    if let Some(path) = &args.trace {
        sink.history.write_csv(path)?;
        info!("📈 Trace written to {}", path.display());
    }

    let report = RunReport {
        run_id: run_id.hash.clone(),
        scene: scene.name.clone(),
        energy: outcome.score.score,
        marks: outcome
            .reported
            .kernel
            .marks()
            .iter()
            .map(|m| m.to_record())
            .collect(),
        contributions: outcome.reported.contributions.clone(),
        iterations: outcome.iterations,
        termination: outcome.termination_rule.clone(),
        statistics: outcome.statistics.clone(),
    };

    info!("\n=== 🏁 FINAL RESULT ===");
    reports::print_run_summary(&report);
    reports::print_kernel_report(&report.statistics);
    reports::print_mark_report(&report.contributions);

    if let Some(path) = &args.output {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!("💾 Result written to {}", path.display());
    }
    Ok(())
}
