use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::process;
use tracing::{error, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// trace, debug, info, warn or error. Logs go to stderr.
    #[arg(global = true, long, default_value_t = Level::INFO)]
    log_level: Level,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Optimize a scene and report the accepted marks.
    Run(cmd::run::RunArgs),
    /// Write a synthetic scene with known objects and decoy candidates.
    Demo(cmd::demo::DemoArgs),
    /// Score every candidate of a scene on its own.
    Inspect(cmd::inspect::InspectArgs),
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let sub_matches = matches.subcommand().map(|(_, m)| m);
    let result = match &cli.command {
        Commands::Run(args) => cmd::run::run(args, sub_matches),
        Commands::Demo(args) => cmd::demo::run(args),
        Commands::Inspect(args) => cmd::inspect::run(args, sub_matches),
    };

    if let Err(e) = result {
        error!("❌ {}", e);
        process::exit(1);
    }
}
