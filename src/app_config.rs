//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// TOML-backed file configuration for doclink defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default catalogue JSON file.
    pub catalogue: Option<PathBuf>,
    /// Verify candidates unless the command line says otherwise.
    pub verify: Option<bool>,
    /// Default batch concurrency (same range as CLI).
    pub concurrency: Option<u8>,
    /// Verification client connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Per-check request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Redirect hops followed per check.
    pub max_redirects: Option<u8>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(1..=64).contains(&concurrency)
        {
            bail!("Invalid config value for `concurrency`: {concurrency}. Expected range: 1..=64");
        }

        if let Some(max_redirects) = self.max_redirects
            && max_redirects > 20
        {
            bail!("Invalid config value for `max_redirects`: {max_redirects}. Expected range: 0..=20");
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("request_timeout_secs", self.request_timeout_secs)?;

        Ok(())
    }
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

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/doclink/config.toml`
/// 2. `$HOME/.config/doclink/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("doclink")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("doclink")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist; the default path is optional.
pub fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(path) = explicit {
        return read_file_config(path).map(Some);
    }

    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    read_file_config(&path).map(Some)
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "catalogue" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.catalogue = Some(PathBuf::from(parsed));
            }
            "verify" => {
                cfg.verify = Some(parse_boolean(value).with_context(context)?);
            }
            "concurrency" => {
                let parsed = parse_integer_u64(value).with_context(context)?;
                let n = u8::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("concurrency out of range for u8"))
                    .with_context(context)?;
                cfg.concurrency = Some(n);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "request_timeout_secs" => {
                cfg.request_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "max_redirects" => {
                let parsed = parse_integer_u64(value).with_context(context)?;
                let n = u8::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_redirects out of range for u8"))
                    .with_context(context)?;
                cfg.max_redirects = Some(n);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
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

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
