use std::io::{self, IsTerminal};

use clap::CommandFactory;
use frame_review::cli::{CliArgs, CliSources, parse_cli};
use frame_review::error::AppError;
use frame_review::manifest;
use frame_review::replay::{self, Pacing, ReplayOptions};
use frame_review::settings::resolve_settings;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), AppError> {
    let (cli_args, cli_sources): (CliArgs, CliSources) = parse_cli();
    init_tracing(cli_args.log_level.as_deref())?;

    if cli_args.items.is_empty() {
        usage();
        return Ok(());
    }

    let resolved = resolve_settings(&cli_args, &cli_sources)?;
    if let Some(path) = &resolved.config_path {
        info!(path = %path.display(), "loaded configuration");
    }
    let settings = resolved.settings;

    let batch = manifest::load_batch(&cli_args.items).await;
    if batch.is_empty() {
        return Err(AppError::NoItems);
    }

    let mut out = io::stdout();
    if cli_args.list {
        replay::print_listing(&batch, &mut out)?;
        return Ok(());
    }

    let item = match cli_args.select {
        Some(position) => {
            let entries = batch.items_snapshot();
            let entry = entries
                .get(position - 1)
                .ok_or(AppError::SelectionOutOfRange {
                    position,
                    count: entries.len(),
                })?;
            batch.select(entry.item.id)
        }
        None => batch.select_first_if_needed(),
    };
    let Some(item) = item else {
        return Err(AppError::NoItems);
    };

    let options = ReplayOptions {
        scrub: cli_args.scrub,
        show_markers: cli_args.markers,
        inspect: cli_args.inspect,
        pacing: Pacing::RealTime,
    };
    let progress = progress_bar();

    tokio::select! {
        result = replay::run(item, &settings, &options, &progress, &mut out) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            progress.abandon();
            warn!("replay interrupted");
        }
    }
    Ok(())
}

fn init_tracing(level: Option<&str>) -> Result<(), AppError> {
    let filter = match level {
        Some(level) => {
            EnvFilter::try_new(level).map_err(|err| AppError::Logging(err.to_string()))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| AppError::Logging(err.to_string()))
}

fn usage() {
    let mut command = CliArgs::command();
    command.print_help().ok();
    println!();
}

fn progress_bar() -> indicatif::ProgressBar {
    if !io::stderr().is_terminal() {
        return indicatif::ProgressBar::hidden();
    }
    let progress = indicatif::ProgressBar::new(0);
    progress.set_style(replay_bar_style());
    progress
}

fn replay_bar_style() -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames {msg}",
    )
    .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
    .progress_chars("##-")
}
