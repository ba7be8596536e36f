use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};

use wingback_scout::input::load_player_table;
use wingback_scout::logging;
use wingback_scout::model::profile::ScoringProfile;
use wingback_scout::pipeline::run_pipeline;
use wingback_scout::report::write_reports;

#[derive(Debug, Parser)]
#[command(
    name = "wingback-scout",
    version,
    about = "League-aware right wing-back shortlist with feasibility and weight sensitivity"
)]
struct Cli {
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Warnings and errors only.
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score a player table and write the shortlist reports.
    Run(RunArgs),
    /// Print the default scoring profile as TOML.
    PrintProfile,
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Player table (.csv, .tsv, optionally .gz).
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    out: PathBuf,
    /// TOML scoring profile; omitted sections fall back to the defaults.
    #[arg(long)]
    profile: Option<PathBuf>,
    /// Date contract lengths are measured from (YYYY-MM-DD).
    #[arg(long)]
    reference_date: Option<NaiveDate>,
    #[arg(long)]
    min_minutes: Option<u32>,
    /// Comma-separated position codes, e.g. DR,DMR.
    #[arg(long, value_delimiter = ',')]
    positions: Option<Vec<String>>,
    /// Candidates shown in summary.json and report.txt.
    #[arg(long, default_value_t = 10)]
    top: usize,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);
    if let Err(err) = dispatch(cli.command) {
        tracing::error!("{err}");
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn dispatch(command: Command) -> Result<(), String> {
    match command {
        Command::Run(args) => run(&args),
        Command::PrintProfile => {
            let text = toml::to_string_pretty(&ScoringProfile::default_v1())
                .map_err(|e| e.to_string())?;
            print!("{text}");
            Ok(())
        }
    }
}

fn run(args: &RunArgs) -> Result<(), String> {
    let profile = load_profile(args.profile.as_deref())?;
    let today = chrono::Local::now().date_naive();
    let profile = apply_overrides(profile, args, today);

    let (table, _load) = load_player_table(&args.input).map_err(|e| e.to_string())?;
    let run = run_pipeline(&table, &profile).map_err(|e| e.to_string())?;
    write_reports(&run, &args.out, args.top).map_err(|e| e.to_string())?;
    Ok(())
}

fn load_profile(path: Option<&Path>) -> Result<ScoringProfile, String> {
    match path {
        Some(path) => ScoringProfile::load(path).map_err(|e| e.to_string()),
        None => Ok(ScoringProfile::default_v1()),
    }
}

/// CLI flags win over the profile; the reference date falls back to
/// `today` only when neither names one.
fn apply_overrides(mut profile: ScoringProfile, args: &RunArgs, today: NaiveDate) -> ScoringProfile {
    if let Some(date) = args.reference_date {
        profile.reference_date = Some(date);
    }
    if profile.reference_date.is_none() {
        tracing::info!(%today, "no reference date given; using today");
        profile.reference_date = Some(today);
    }
    if let Some(min) = args.min_minutes {
        profile.eligibility.min_minutes = min;
    }
    if let Some(positions) = &args.positions {
        profile.eligibility.positions = positions.clone();
    }
    profile
}
