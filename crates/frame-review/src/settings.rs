use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use frame_review_geometry::RenderMode;
use frame_review_geometry::config::DEFAULT_LABEL_OFFSET;
use frame_review_sync::ConfigurationError;
use frame_review_types::Size;
use serde::Deserialize;

use crate::cli::{CliArgs, CliSources};

pub const DEFAULT_VIEWPORT: Size = Size::new(960.0, 540.0);
const PROJECT_CONFIG_FILE: &str = "frame-review.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FileConfig {
    pub(crate) playback: Option<PlaybackFileConfig>,
    pub(crate) timeline: Option<TimelineFileConfig>,
    pub(crate) overlay: Option<OverlayFileConfig>,
    pub(crate) viewport: Option<ViewportFileConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub(crate) struct PlaybackFileConfig {
    pub(crate) min_sample_rate_hz: Option<u32>,
    pub(crate) fallback_fps: Option<f64>,
    pub(crate) speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub(crate) struct TimelineFileConfig {
    pub(crate) max_markers: Option<usize>,
    pub(crate) width: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub(crate) struct OverlayFileConfig {
    pub(crate) mode: Option<String>,
    pub(crate) label_offset: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub(crate) struct ViewportFileConfig {
    pub(crate) width: Option<f64>,
    pub(crate) height: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub sync: frame_review_sync::Configuration,
    pub geometry: frame_review_geometry::Configuration,
    pub playback: PlaybackSettings,
    pub timeline_width: f64,
    pub viewport: Size,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    pub speed: f64,
}

#[derive(Debug)]
pub struct ResolvedSettings {
    pub settings: EffectiveSettings,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    NotFound {
        path: PathBuf,
    },
    Environment {
        source: ConfigurationError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "failed to parse config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, field, value } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "invalid value '{}' for '{}' in {}",
                        value,
                        field,
                        path.display()
                    )
                } else {
                    write!(f, "invalid value '{}' for '{}'", value, field)
                }
            }
            ConfigError::NotFound { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
            ConfigError::Environment { source } => {
                write!(f, "invalid environment configuration: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Environment { source } => Some(source),
            ConfigError::InvalidValue { .. } => None,
            ConfigError::NotFound { .. } => None,
        }
    }
}

/// Layers CLI flags over the config file over `FRAME_REVIEW_*` environment
/// values over built-in defaults.
pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<ResolvedSettings, ConfigError> {
    let base = frame_review_sync::Configuration::from_env()
        .map_err(|source| ConfigError::Environment { source })?;
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path, base)
}

fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        return Ok((load_file_config(path)?, Some(path.to_path_buf())));
    }

    let candidates = [project_config_path(), default_config_path()];
    for path in candidates.into_iter().flatten() {
        if path.exists() {
            let config = load_file_config(&path)?;
            return Ok((config, Some(path)));
        }
    }
    Ok((FileConfig::default(), None))
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
    base: frame_review_sync::Configuration,
) -> Result<ResolvedSettings, ConfigError> {
    let FileConfig {
        playback: file_playback,
        timeline: file_timeline,
        overlay: file_overlay,
        viewport: file_viewport,
    } = file;

    let playback_cfg = file_playback.unwrap_or_default();
    let timeline_cfg = file_timeline.unwrap_or_default();
    let overlay_cfg = file_overlay.unwrap_or_default();
    let config_path_ref = config_path.as_ref();

    let mut sync = base;
    if let Some(rate) = playback_cfg.min_sample_rate_hz {
        if rate == 0 {
            return Err(invalid(config_path_ref, "playback.min_sample_rate_hz", rate));
        }
        sync.min_sample_rate_hz = rate;
    }
    if let Some(fps) = playback_cfg.fallback_fps {
        sync.fallback_fps = positive(fps, config_path_ref, "playback.fallback_fps")?;
    }
    if let Some(markers) = timeline_cfg.max_markers {
        if markers == 0 {
            return Err(invalid(config_path_ref, "timeline.max_markers", markers));
        }
        sync.max_markers = markers;
    }

    let speed = resolve_f64(
        cli.speed,
        playback_cfg.speed,
        !sources.speed_from_cli,
        config_path_ref,
        "playback.speed",
    )?;
    let timeline_width = resolve_f64(
        cli.timeline_width,
        timeline_cfg.width,
        !sources.timeline_width_from_cli,
        config_path_ref,
        "timeline.width",
    )?;

    let mode = resolve_mode(cli.mode.clone(), overlay_cfg.mode, config_path_ref)?;
    let label_offset = match overlay_cfg.label_offset {
        Some(offset) if offset.is_finite() => offset,
        Some(offset) => return Err(invalid(config_path_ref, "overlay.label_offset", offset)),
        None => DEFAULT_LABEL_OFFSET,
    };
    let geometry = frame_review_geometry::Configuration {
        label_offset,
        ..frame_review_geometry::Configuration::with_mode(mode)
    };

    let viewport = match cli.viewport {
        Some(size) => size,
        None => resolve_viewport(file_viewport, config_path_ref)?,
    };

    let settings = EffectiveSettings {
        sync,
        geometry,
        playback: PlaybackSettings { speed },
        timeline_width,
        viewport,
    };

    Ok(ResolvedSettings {
        settings,
        config_path,
    })
}

pub(crate) fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "frame-review", "frame-review")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub(crate) fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir()
        .ok()
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn invalid(path: Option<&PathBuf>, field: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        path: path.cloned(),
        field,
        value: value.to_string(),
    }
}

fn positive(value: f64, path: Option<&PathBuf>, field: &'static str) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(path, field, value))
    }
}

fn resolve_f64(
    cli_value: f64,
    file_value: Option<f64>,
    use_file: bool,
    config_path: Option<&PathBuf>,
    field: &'static str,
) -> Result<f64, ConfigError> {
    if use_file && let Some(value) = file_value {
        return positive(value, config_path, field);
    }
    Ok(cli_value)
}

fn resolve_mode(
    cli_value: Option<String>,
    file_value: Option<String>,
    config_path: Option<&PathBuf>,
) -> Result<RenderMode, ConfigError> {
    let (raw, path) = match normalize_string(cli_value) {
        Some(value) => (Some(value), None),
        None => (normalize_string(file_value), config_path),
    };
    let Some(value) = raw else {
        return Ok(RenderMode::default());
    };
    RenderMode::from_str(&value).map_err(|_| invalid(path, "overlay.mode", value))
}

fn resolve_viewport(
    file_value: Option<ViewportFileConfig>,
    config_path: Option<&PathBuf>,
) -> Result<Size, ConfigError> {
    let Some(viewport) = file_value else {
        return Ok(DEFAULT_VIEWPORT);
    };
    let width = viewport.width.unwrap_or(DEFAULT_VIEWPORT.width);
    let height = viewport.height.unwrap_or(DEFAULT_VIEWPORT.height);
    let size = Size::new(width, height);
    if size.is_degenerate() {
        return Err(invalid(
            config_path,
            "viewport",
            format!("{width}x{height}"),
        ));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn cli(args: &[&str]) -> CliArgs {
        let mut argv = vec!["frame-review"];
        argv.extend_from_slice(args);
        argv.push("item.json");
        CliArgs::parse_from(argv)
    }

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    fn resolve(
        cli: &CliArgs,
        sources: &CliSources,
        file: FileConfig,
    ) -> Result<EffectiveSettings, ConfigError> {
        merge(
            cli,
            sources,
            file,
            None,
            frame_review_sync::Configuration::default(),
        )
        .map(|resolved| resolved.settings)
    }

    #[test]
    fn defaults_without_file() {
        let settings = resolve(&cli(&[]), &CliSources::default(), FileConfig::default()).unwrap();
        assert_eq!(settings.sync, frame_review_sync::Configuration::default());
        assert_eq!(settings.geometry.mode, RenderMode::Presentation);
        assert_eq!(settings.geometry.label_offset, DEFAULT_LABEL_OFFSET);
        assert_eq!(settings.viewport, DEFAULT_VIEWPORT);
        assert_eq!(settings.playback.speed, 1.0);
    }

    #[test]
    fn file_values_apply_when_cli_is_silent() {
        let (_dir, path) = write_config(
            r#"
[playback]
min_sample_rate_hz = 90
fallback_fps = 30.0
speed = 4.0

[timeline]
max_markers = 120
width = 640.0

[overlay]
mode = "processed"
label_offset = 14.0

[viewport]
width = 1280.0
height = 720.0
"#,
        );
        let file = load_file_config(&path).unwrap();
        let settings = resolve(&cli(&[]), &CliSources::default(), file).unwrap();
        assert_eq!(settings.sync.min_sample_rate_hz, 90);
        assert_eq!(settings.sync.fallback_fps, 30.0);
        assert_eq!(settings.sync.max_markers, 120);
        assert_eq!(settings.playback.speed, 4.0);
        assert_eq!(settings.timeline_width, 640.0);
        assert_eq!(settings.geometry.mode, RenderMode::ProcessedDirect);
        assert_eq!(settings.geometry.label_offset, 14.0);
        assert_eq!(settings.viewport, Size::new(1280.0, 720.0));
    }

    #[test]
    fn cli_overrides_file() {
        let (_dir, path) = write_config(
            r#"
[playback]
speed = 4.0

[overlay]
mode = "processed"
"#,
        );
        let file = load_file_config(&path).unwrap();
        let args = cli(&["--speed", "2", "--mode", "presentation", "--viewport", "320x240"]);
        let sources = CliSources {
            speed_from_cli: true,
            timeline_width_from_cli: false,
        };
        let settings = resolve(&args, &sources, file).unwrap();
        assert_eq!(settings.playback.speed, 2.0);
        assert_eq!(settings.geometry.mode, RenderMode::Presentation);
        assert_eq!(settings.viewport, Size::new(320.0, 240.0));
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let cases = [
            ("[playback]\nspeed = 0.0\n", "playback.speed"),
            ("[playback]\nmin_sample_rate_hz = 0\n", "playback.min_sample_rate_hz"),
            ("[timeline]\nmax_markers = 0\n", "timeline.max_markers"),
            ("[overlay]\nmode = \"sideways\"\n", "overlay.mode"),
            ("[viewport]\nwidth = 0.0\n", "viewport"),
        ];
        for (contents, expected) in cases {
            let (_dir, path) = write_config(contents);
            let file = load_file_config(&path).unwrap();
            let err = resolve(&cli(&[]), &CliSources::default(), file).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { field, .. } if field == expected),
                "{contents}"
            );
        }
    }

    #[test]
    fn missing_override_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let (_dir, path) = write_config("[playback\nspeed = 1");
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
