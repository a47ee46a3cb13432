use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use timetable::config::TimetableConfig;
use timetable::grid::GridScope;
use timetable::{InMemoryScheduleRepository, ScheduleRequest, ScheduleService};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:
  timetable check <candidate.json> [--config <file>] [--exclude <schedule-id>]
  timetable grid <week-id> (--class <id> | --room <id> | --lecturer <id>) [--config <file>]";

/// Exit code when the candidate collides with an existing entry.
const EXIT_CONFLICT: i32 = 2;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Check {
        candidate: PathBuf,
        exclude: Option<i64>,
    },
    Grid {
        week: i64,
        scope: GridScope,
    },
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    command: Command,
    config: Option<PathBuf>,
}

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("timetable failed: {err:#}");
            process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let args = parse_args(std::env::args().skip(1))?;
    let config = TimetableConfig::load_or_default(args.config.as_deref())?;
    init_tracing(&config.log_filter);

    let repository = match &config.seed_path {
        Some(path) => InMemoryScheduleRepository::load_seed(path)
            .with_context(|| format!("loading seed {}", path.display()))?,
        None => InMemoryScheduleRepository::new(),
    };
    info!("Loaded {} schedules into the repository", repository.len());

    let service =
        ScheduleService::new(Arc::new(repository)).with_grid_builder(config.grid_builder());

    match args.command {
        Command::Check { candidate, exclude } => {
            let content = fs::read_to_string(&candidate)
                .with_context(|| format!("reading candidate {}", candidate.display()))?;
            let request: ScheduleRequest = serde_json::from_str(&content)
                .with_context(|| format!("parsing candidate {}", candidate.display()))?;

            match service.check_conflict(&request, exclude)? {
                Some(conflict) => {
                    eprintln!("{conflict}");
                    println!("{}", serde_json::to_string_pretty(&conflict)?);
                    Ok(EXIT_CONFLICT)
                }
                None => {
                    println!("no conflict");
                    Ok(0)
                }
            }
        }
        Command::Grid { week, scope } => {
            let grid = service.build_week_grid(week, &scope)?;
            print!("{grid}");
            Ok(0)
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let name = args.next().ok_or_else(|| anyhow!("missing command\n{USAGE}"))?;

    let mut positional = Vec::new();
    let mut config = None;
    let mut exclude = None;
    let mut scope = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args.next().ok_or_else(|| anyhow!("--config needs a path"))?;
                config = Some(PathBuf::from(value));
            }
            "--exclude" => {
                let value = args.next().ok_or_else(|| anyhow!("--exclude needs an id"))?;
                exclude = Some(
                    value
                        .parse::<i64>()
                        .with_context(|| format!("invalid schedule id {value:?}"))?,
                );
            }
            "--class" | "--room" | "--lecturer" => {
                if scope.is_some() {
                    bail!("only one of --class, --room or --lecturer may be given");
                }
                let value = args.next().ok_or_else(|| anyhow!("{arg} needs an id"))?;
                scope = Some(match arg.as_str() {
                    "--class" => GridScope::Class(value),
                    "--room" => GridScope::Room(value),
                    _ => GridScope::Lecturer(value),
                });
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            _ => positional.push(arg),
        }
    }

    let command = match (name.as_str(), positional.as_slice()) {
        ("check", [candidate]) => {
            if scope.is_some() {
                bail!("--class, --room and --lecturer only apply to grid\n{USAGE}");
            }
            Command::Check {
                candidate: PathBuf::from(candidate),
                exclude,
            }
        }
        ("grid", [week]) => {
            if exclude.is_some() {
                bail!("--exclude only applies to check\n{USAGE}");
            }
            let scope = scope.ok_or_else(|| {
                anyhow!("grid needs one of --class, --room or --lecturer\n{USAGE}")
            })?;
            Command::Grid {
                scope,
                week: week
                    .parse::<i64>()
                    .with_context(|| format!("invalid week id {week:?}"))?,
            }
        }
        _ => bail!("unrecognized arguments\n{USAGE}"),
    };

    Ok(Args { command, config })
}
