use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use frame_review_types::Size;

pub const DEFAULT_SPEED: f64 = 1.0;
pub const DEFAULT_TIMELINE_WIDTH: f64 = 800.0;

#[derive(Debug, Default)]
pub struct CliSources {
    pub speed_from_cli: bool,
    pub timeline_width_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            speed_from_cli: value_from_cli(matches, "speed"),
            timeline_width_from_cli: value_from_cli(matches, "timeline_width"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    let command = CliArgs::command();
    let matches = command.get_matches();
    let args = match CliArgs::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    let sources = CliSources::from_matches(&matches);
    (args, sources)
}

#[derive(Debug, Parser)]
#[command(
    name = "frame-review",
    about = "Replay analyzed videos with per-frame overlays kept in sync with playback",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Print the loaded items with their overlay reports and exit
    #[arg(long = "list")]
    pub list: bool,

    /// Position of the item to replay, starting at 1 (defaults to the first item)
    #[arg(long = "select", value_parser = parse_position)]
    pub select: Option<usize>,

    /// Viewport size the overlays are projected into
    #[arg(long = "viewport", value_name = "WxH", value_parser = parse_viewport)]
    pub viewport: Option<Size>,

    /// Overlay coordinate mode (presentation, processed)
    #[arg(long = "mode")]
    pub mode: Option<String>,

    /// Playback speed multiplier
    #[arg(
        long = "speed",
        id = "speed",
        default_value_t = DEFAULT_SPEED,
        value_parser = parse_positive_f64
    )]
    pub speed: f64,

    /// Scrub to a position between 0 and 1 before playback starts
    #[arg(long = "scrub", value_name = "RATIO", value_parser = parse_ratio)]
    pub scrub: Option<f64>,

    /// Print the timeline marker strip for the selected item
    #[arg(long = "markers")]
    pub markers: bool,

    /// List each overlay of the shown frame with its status, text and analyzed-image rect
    #[arg(long = "inspect")]
    pub inspect: bool,

    /// Timeline width in pixels used for markers and scrubbing
    #[arg(
        long = "timeline-width",
        id = "timeline_width",
        default_value_t = DEFAULT_TIMELINE_WIDTH,
        value_parser = parse_positive_f64
    )]
    pub timeline_width: f64,

    /// Log filter, e.g. info or frame_review_sync=debug (defaults to RUST_LOG, then info)
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Analysis manifests (JSON)
    pub items: Vec<PathBuf>,
}

fn parse_position(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|_| format!("'{value}' is not a valid position"))?;
    if parsed == 0 {
        return Err("positions start at 1".into());
    }
    Ok(parsed)
}

fn parse_positive_f64(value: &str) -> Result<f64, String> {
    let parsed = value
        .parse::<f64>()
        .map_err(|_| format!("'{value}' is not a valid number"))?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err("value must be greater than zero".into());
    }
    Ok(parsed)
}

fn parse_ratio(value: &str) -> Result<f64, String> {
    let parsed = value
        .parse::<f64>()
        .map_err(|_| format!("'{value}' is not a valid number"))?;
    if !(0.0..=1.0).contains(&parsed) {
        return Err("ratio must be between 0 and 1".into());
    }
    Ok(parsed)
}

pub(crate) fn parse_viewport(value: &str) -> Result<Size, String> {
    let parts: Vec<_> = value
        .split(['x', 'X', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() != 2 {
        return Err("viewport must be WIDTHxHEIGHT".into());
    }
    let parse = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| format!("'{s}' is not a valid number"))
    };
    let width = parse(parts[0])?;
    let height = parse(parts[1])?;
    if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
        return Err("viewport width and height must be positive".into());
    }
    Ok(Size::new(width, height))
}
