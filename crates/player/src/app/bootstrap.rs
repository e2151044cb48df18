use std::env;
use std::path::PathBuf;

use brick_engine::{resolve_project_paths, ProjectPaths, RunConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub(crate) struct AppWiring {
    pub(crate) paths: ProjectPaths,
    pub(crate) config: RunConfig,
}

#[derive(Debug, Default, PartialEq)]
struct CliOptions {
    project: Option<PathBuf>,
    max_ticks: Option<u64>,
    target_tps: Option<u32>,
}

#[derive(Debug, PartialEq)]
enum CliCommand {
    Help,
    Run(CliOptions),
}

/// Returns `Ok(None)` when only the usage text was requested.
pub(crate) fn build_app() -> Result<Option<AppWiring>, String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let options = match parse_args(&args)? {
        CliCommand::Help => {
            println!("{}", usage_text());
            return Ok(None);
        }
        CliCommand::Run(options) => options,
    };

    init_tracing();
    info!("=== Brick Player Startup ===");

    let paths = resolve_project_paths(options.project).map_err(|err| err.to_string())?;
    let mut config = RunConfig::default();
    if let Some(max_ticks) = options.max_ticks {
        config.max_ticks = (max_ticks > 0).then_some(max_ticks);
    }
    if let Some(target_tps) = options.target_tps {
        config.target_tps = target_tps;
    }
    info!(
        root = %paths.root.display(),
        target_tps = config.target_tps,
        max_ticks = ?config.max_ticks,
        "project_resolved"
    );

    Ok(Some(AppWiring { paths, config }))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_args(args: &[String]) -> Result<CliCommand, String> {
    if matches!(args.first().map(String::as_str), Some("-h" | "--help")) {
        return Ok(CliCommand::Help);
    }

    let mut options = CliOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--project" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --project".to_string())?;
                options.project = Some(PathBuf::from(value));
                index += 2;
            }
            "--max-ticks" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --max-ticks".to_string())?;
                options.max_ticks = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("invalid --max-ticks value '{value}' (expected u64)"))?,
                );
                index += 2;
            }
            "--tps" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --tps".to_string())?;
                let tps = value
                    .parse::<u32>()
                    .map_err(|_| format!("invalid --tps value '{value}' (expected u32)"))?;
                if tps == 0 {
                    return Err("--tps must be greater than zero".to_string());
                }
                options.target_tps = Some(tps);
                index += 2;
            }
            other => return Err(format!("unknown argument '{other}'\n\n{}", usage_text())),
        }
    }
    Ok(CliCommand::Run(options))
}

fn usage_text() -> String {
    "usage: brick_player [--project <dir>] [--max-ticks <n>] [--tps <n>]\n\
\n\
  --project <dir>   project directory holding program.json and images/\n\
                    (defaults to BRICK_PROJECT_ROOT, then the nearest ancestor\n\
                    of the current directory with a program.json)\n\
  --max-ticks <n>   stop after n scheduler ticks; 0 runs until every script ends\n\
  --tps <n>         scheduler ticks per simulated second (default 60)"
        .to_string()
}
