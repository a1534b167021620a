/// Layered settings: defaults, TOML file, environment, then flags
use crate::cli::Cli;
use crate::error::{CliError, Result};
use normalize_engine::{
    FfmpegTranscoder, NormalizeConfig, DEFAULT_TARGET_AMPLITUDE, DEFAULT_TOLERANCE,
    DEFAULT_WORKERS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File read from the current directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "normalize.toml";

/// Prefix of the environment overrides (`NORMALIZE_WORKERS=4`)
pub const ENV_PREFIX: &str = "NORMALIZE";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_amplitude")]
    pub amplitude: u32,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Per-subprocess limit in seconds, 0 = unlimited
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// File extensions considered audio, matched case-insensitively
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            amplitude: default_amplitude(),
            workers: default_workers(),
            tolerance: default_tolerance(),
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_timeout_secs(),
            extensions: default_extensions(),
        }
    }
}

impl Settings {
    /// Load settings from the config file and environment
    ///
    /// An explicit `config_file` must exist; the default file is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(CliError::Argument(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    tracing::debug!("Using {}", default_path.display());
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with NORMALIZE_)
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("extensions"),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Apply command-line overrides on top of the loaded settings
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(amplitude) = cli.amplitude {
            self.amplitude = amplitude;
        }
        if let Some(workers) = cli.workers {
            self.workers = usize::try_from(workers.max(1)).unwrap_or(1);
        }
        if let Some(tolerance) = cli.tolerance {
            self.tolerance = tolerance;
        }
        if let Some(ffmpeg_path) = &cli.ffmpeg_path {
            self.ffmpeg_path = ffmpeg_path.clone();
        }
        if let Some(timeout_secs) = cli.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.amplitude == 0 {
            return Err(CliError::Argument(
                "amplitude must be greater than zero".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.tolerance) {
            return Err(CliError::Argument(format!(
                "tolerance must be in [0, 1), got {}",
                self.tolerance
            )));
        }

        if self.extensions.iter().all(|ext| ext.trim_start_matches('.').is_empty()) {
            return Err(CliError::Config(
                "at least one file extension is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Immutable engine configuration shared with every worker
    pub fn engine_config(&self) -> Result<NormalizeConfig> {
        Ok(NormalizeConfig::builder()
            .target_amplitude(self.amplitude)
            .tolerance(self.tolerance)
            .workers(self.workers)
            .build()?)
    }

    pub fn transcoder(&self) -> FfmpegTranscoder {
        FfmpegTranscoder::new(self.ffmpeg_path.clone()).with_timeout(self.timeout())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

// Default values
fn default_amplitude() -> u32 {
    DEFAULT_TARGET_AMPLITUDE
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_extensions() -> Vec<String> {
    vec!["mp3".to_string()]
}
