//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// TOML-style file configuration for hostdl defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Default directory downloads are written to.
    pub target_dir: Option<PathBuf>,
    /// Page request connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Page request total timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Direct-link transfer connect timeout in seconds.
    pub download_connect_timeout_secs: Option<u64>,
    /// Direct-link transfer stall timeout in seconds (longest gap between reads).
    pub download_read_timeout_secs: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        validate_timeout_secs(
            "download_connect_timeout_secs",
            self.download_connect_timeout_secs,
        )?;
        validate_timeout_secs(
            "download_read_timeout_secs",
            self.download_read_timeout_secs,
        )?;
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

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Log filter directive used when neither `RUST_LOG` nor CLI flags decide.
    #[must_use]
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/hostdl/config.toml`
/// 2. `$HOME/.config/hostdl/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("hostdl")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("hostdl")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from an explicit path, or from the default path if present.
///
/// An explicit path must exist; a missing default file yields the empty config.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        return load_file_config(path);
    }
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path),
        _ => Ok(FileConfig::default()),
    }
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

        match key {
            "target_dir" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `target_dir` value on line {line_no}"))?;
                cfg.target_dir = Some(PathBuf::from(parsed));
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_timeout(key, value, line_no)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_timeout(key, value, line_no)?);
            }
            "download_connect_timeout_secs" => {
                cfg.download_connect_timeout_secs = Some(parse_timeout(key, value, line_no)?);
            }
            "download_read_timeout_secs" => {
                cfg.download_read_timeout_secs = Some(parse_timeout(key, value, line_no)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn parse_timeout(key: &str, value: &str, line_no: usize) -> Result<u64> {
    parse_integer_u64(value).with_context(|| format!("Invalid `{key}` value on line {line_no}"))
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

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
target_dir = "/data/downloads"
connect_timeout_secs = 5
read_timeout_secs = 20
download_connect_timeout_secs = 15
download_read_timeout_secs = 900
verbosity = "verbose"
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.target_dir, Some(PathBuf::from("/data/downloads")));
        assert_eq!(cfg.connect_timeout_secs, Some(5));
        assert_eq!(cfg.read_timeout_secs, Some(20));
        assert_eq!(cfg.download_connect_timeout_secs, Some(15));
        assert_eq!(cfg.download_read_timeout_secs, Some(900));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
    }

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str("read_timeout_secs = 45").expect("partial config should parse");
        assert_eq!(cfg.read_timeout_secs, Some(45));
        assert!(cfg.target_dir.is_none());
        assert!(cfg.verbosity.is_none());
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_timeout() {
        let err = parse_config_str("connect_timeout_secs = 0").expect_err("zero timeout rejected");
        assert!(err.to_string().contains("connect_timeout_secs"));

        let err = parse_config_str("download_read_timeout_secs = 3601")
            .expect_err("too-large timeout rejected");
        assert!(err.to_string().contains("download_read_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_key_with_line_number() {
        let err = parse_config_str("# header\n\nconcurrency = 4").expect_err("unknown key");
        let msg = err.to_string();
        assert!(msg.contains("concurrency"), "got: {msg}");
        assert!(msg.contains("line 3"), "got: {msg}");
    }

    #[test]
    fn test_parse_config_rejects_unquoted_string() {
        let err = parse_config_str("target_dir = /tmp").expect_err("unquoted string");
        assert!(err.to_string().contains("target_dir"));
    }

    #[test]
    fn test_parse_config_rejects_numeric_values_with_trailing_tokens() {
        let err = parse_config_str("read_timeout_secs = 4 trailing")
            .expect_err("expected trailing token error");
        assert!(err.to_string().contains("read_timeout_secs"));
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
target_dir = "/srv/#incoming" # hash inside quotes is kept
verbosity = "quiet" # preferred noise level
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.target_dir, Some(PathBuf::from("/srv/#incoming")));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Quiet));
    }

    #[test]
    fn test_parse_config_rejects_bad_verbosity() {
        let err = parse_config_str(r#"verbosity = "loud""#).expect_err("bad verbosity");
        assert!(format!("{err:#}").contains("default, verbose, quiet, debug"));
    }

    #[test]
    fn test_verbosity_filter_directive() {
        assert_eq!(VerbositySetting::Default.filter_directive(), "info");
        assert_eq!(VerbositySetting::Verbose.filter_directive(), "debug");
        assert_eq!(VerbositySetting::Quiet.filter_directive(), "error");
        assert_eq!(VerbositySetting::Debug.filter_directive(), "trace");
    }

    #[test]
    fn test_load_config_explicit_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "read_timeout_secs = 12\n").expect("write config");
        let cfg = load_config(Some(&path)).expect("explicit config loads");
        assert_eq!(cfg.read_timeout_secs, Some(12));

        let missing = dir.path().join("missing.toml");
        assert!(load_config(Some(&missing)).is_err());
    }
}
