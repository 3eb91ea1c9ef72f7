//! Application configuration loading for CLI defaults.
//!
//! Layering: built-in defaults, then `config.toml`, then command-line flags.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use harvester_core::HarvesterConfig;

use crate::cli::{Args, FetcherKind};

/// TOML-backed file configuration for harvester defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Default download folder.
    pub output_dir: Option<PathBuf>,
    /// Default concurrent downloads (same range as CLI).
    pub concurrency: Option<u8>,
    /// Default discovery validation pool width.
    pub workers: Option<u8>,
    /// Page fetch timeout in seconds.
    pub fetch_timeout_secs: Option<u64>,
    /// Reachability probe timeout in seconds.
    pub validation_timeout_secs: Option<u64>,
    /// Grace period before a cancelled download's slot is force-freed.
    pub cancel_grace_secs: Option<u64>,
    /// Default media fetcher.
    pub fetcher: Option<FetcherKind>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_count("concurrency", self.concurrency)?;
        validate_count("workers", self.workers)?;
        validate_timeout_secs("fetch_timeout_secs", self.fetch_timeout_secs)?;
        validate_timeout_secs("validation_timeout_secs", self.validation_timeout_secs)?;
        validate_timeout_secs("cancel_grace_secs", self.cancel_grace_secs)?;
        Ok(())
    }
}

fn validate_count(field: &str, value: Option<u8>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=100).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=100");
    }
    Ok(())
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/harvester/config.toml`
/// 2. `$HOME/.config/harvester/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("harvester")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("harvester")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {}", line_index + 1);

        match key {
            "output_dir" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "concurrency" => {
                cfg.concurrency = Some(parse_integer_u8(value).with_context(invalid)?);
            }
            "workers" => {
                cfg.workers = Some(parse_integer_u8(value).with_context(invalid)?);
            }
            "fetch_timeout_secs" => {
                cfg.fetch_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "validation_timeout_secs" => {
                cfg.validation_timeout_secs =
                    Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "cancel_grace_secs" => {
                cfg.cancel_grace_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "fetcher" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                let Some(kind) = FetcherKind::from_label(&parsed) else {
                    bail!(
                        "Invalid `fetcher` value '{parsed}' on line {}: expected one of: auto, http, yt-dlp",
                        line_index + 1
                    );
                };
                cfg.fetcher = Some(kind);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!(
                        "Invalid `verbosity` value '{}' on line {}",
                        parsed,
                        line_index + 1
                    )
                })?);
            }
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<u16>()?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

/// Effective runtime settings after layering defaults, file and flags.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Library configuration, already validated.
    pub harvester: HarvesterConfig,
    /// Media fetcher to build.
    pub fetcher: FetcherKind,
}

/// Merges CLI flags over file config over defaults and validates the result.
pub fn resolve_runtime_config(args: &Args, file: Option<&FileConfig>) -> Result<RuntimeConfig> {
    let file = file.cloned().unwrap_or_default();
    let mut harvester = HarvesterConfig::default();

    if let Some(dir) = args.output_dir.clone().or(file.output_dir) {
        harvester.download_folder = dir;
    }
    if let Some(n) = args.concurrency.or(file.concurrency) {
        harvester.max_concurrent_downloads = usize::from(n);
    }
    if let Some(n) = args.workers.or(file.workers) {
        harvester.discovery_workers = usize::from(n);
    }
    if let Some(secs) = args.fetch_timeout.or(file.fetch_timeout_secs) {
        harvester.fetch_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.validation_timeout.or(file.validation_timeout_secs) {
        harvester.validation_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.cancel_grace_secs {
        harvester.cancel_grace = Duration::from_secs(secs);
    }
    harvester
        .validate()
        .context("Invalid harvester configuration")?;

    Ok(RuntimeConfig {
        harvester,
        fetcher: args.fetcher.or(file.fetcher).unwrap_or(FetcherKind::Auto),
    })
}
