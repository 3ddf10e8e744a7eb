use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use app_utils::{Config, init_tracing};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use librollcall::attendance::Availability;
use librollcall::blueprint::{self, BLUEPRINT_FILE_NAME, MAPPING_FILE_NAME};
use librollcall::normalize::parse_timestamp_text;
use tracing::{debug, info};

use crate::summary::{BlueprintSummary, ReportSummary};

mod export;
mod summary;

#[derive(Debug, Parser)]
#[command(name = "rollcall")]
#[command(about = "Trip attendance and exam blueprint reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve attendance from the configured roster and scan log
    Attendance {
        /// Only count scans at or after this time, e.g. `2026-10-19T08:00:00`
        #[arg(long, value_parser = parse_cutoff)]
        cutoff: Option<NaiveDateTime>,
        /// Write the PRESENT students to this CSV file
        #[arg(long)]
        present_csv: Option<PathBuf>,
        /// Write the ABSENT students to this CSV file
        #[arg(long)]
        absent_csv: Option<PathBuf>,
    },
    /// Aggregate a question mapping CSV into a blueprint
    Blueprint {
        /// Question mapping with columns Question,Unit,Difficulty,Marks,Type
        #[arg(long)]
        tags: PathBuf,
        /// Directory the two CSV files are written to
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn parse_cutoff(text: &str) -> Result<NaiveDateTime> {
    parse_timestamp_text(text).with_context(|| format!("unrecognized date/time `{text}`"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Attendance {
            cutoff,
            present_csv,
            absent_csv,
        } => {
            let config = Config::from_env()?;
            init_tracing()?;
            debug!(?config, "loaded configuration");

            let service = config.attendance_service()?;
            let report = service.report(cutoff).await;
            if let Availability::Unavailable(message) = report.availability() {
                bail!("Roster data could not be loaded: {message}");
            }

            print!("{}", ReportSummary::new(&report));

            let id_column = &config.attendance.roster_id_column;
            if let Some(path) = present_csv {
                export::write_roster(&path, id_column, report.present())?;
                info!(path = %path.display(), "wrote present students");
            }
            if let Some(path) = absent_csv {
                export::write_roster(&path, id_column, report.absent())?;
                info!(path = %path.display(), "wrote absent students");
            }
        }
        Commands::Blueprint { tags, out } => {
            init_tracing()?;
            write_blueprint(&tags, &out)?;
        }
    }

    Ok(())
}

fn write_blueprint(tags: &Path, out: &Path) -> Result<()> {
    let file = File::open(tags).with_context(|| format!("could not open {}", tags.display()))?;
    let questions = blueprint::read_tagged_questions(file)
        .with_context(|| format!("could not read {}", tags.display()))?;
    let summary = blueprint::aggregate(&questions);

    print!("{}", BlueprintSummary::new(&summary));
    if summary.is_empty() {
        return Ok(());
    }

    fs::create_dir_all(out).with_context(|| format!("could not create {}", out.display()))?;
    let summary_path = out.join(BLUEPRINT_FILE_NAME);
    fs::write(&summary_path, blueprint::blueprint_csv(&summary)?)
        .with_context(|| format!("could not write {}", summary_path.display()))?;
    let mapping_path = out.join(MAPPING_FILE_NAME);
    fs::write(&mapping_path, blueprint::question_mapping_csv(&questions)?)
        .with_context(|| format!("could not write {}", mapping_path.display()))?;
    info!(out = %out.display(), "wrote blueprint files");
    Ok(())
}
