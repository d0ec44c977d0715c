//! Config file loading and resolution of the effective run settings.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use toolchain_mirror::{
    CONNECT_TIMEOUT_SECS, DatabaseOptions, Platform, PlatformTarget, READ_TIMEOUT_SECS,
    RemoteDestination, ScrapeRules,
};
use url::Url;

use crate::cli::Args;

/// Key/value file configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Directory holding logs/, toolchains/ and cache/.
    pub base_dir: Option<PathBuf>,
    /// Remote base destination, e.g. `gdrive:Development/ESP32/Toolchains`.
    pub remote_destination: Option<String>,
    /// Program invoked to copy files to the remote.
    pub sync_program: Option<String>,
    /// Only links to this host are mirrored.
    pub download_host: Option<String>,
    /// Id of the page section listing the downloads.
    pub section_id: Option<String>,
    /// Default console verbosity.
    pub verbosity: Option<VerbositySetting>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    pub db_busy_timeout_ms: Option<u32>,
    pub linux_url: Option<Url>,
    pub macos_url: Option<Url>,
    pub windows_url: Option<Url>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;

        if let Some(value) = self.db_busy_timeout_ms
            && value > 120_000
        {
            bail!("Invalid config value for `db_busy_timeout_ms`: {value}. Expected range: 0..=120000");
        }

        if let Some(host) = self.download_host.as_deref()
            && (host.is_empty() || host.contains(['/', ' ', ':']))
        {
            bail!("Invalid config value for `download_host`: '{host}'. Expected a bare host name");
        }

        if let Some(section_id) = self.section_id.as_deref()
            && (section_id.is_empty() || section_id.contains(char::is_whitespace))
        {
            bail!("Invalid config value for `section_id`: '{section_id}'. Expected an HTML id");
        }

        for (key, value) in [
            ("remote_destination", self.remote_destination.as_deref()),
            ("sync_program", self.sync_program.as_deref()),
        ] {
            if value.is_some_and(|v| v.trim().is_empty()) {
                bail!("Invalid config value for `{key}`: must not be empty");
            }
        }

        Ok(())
    }

    /// Page override for a platform, if configured.
    #[must_use]
    pub fn page_url(&self, platform: Platform) -> Option<&Url> {
        match platform {
            Platform::Linux => self.linux_url.as_ref(),
            Platform::Macos => self.macos_url.as_ref(),
            Platform::Windows => self.windows_url.as_ref(),
        }
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
    /// Equivalent `(quiet, verbose count)` CLI flags.
    #[must_use]
    pub fn as_flags(self) -> (bool, u8) {
        match self {
            Self::Default => (false, 0),
            Self::Verbose => (false, 1),
            Self::Quiet => (true, 0),
            Self::Debug => (false, 2),
        }
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/toolchain-mirror/config.toml`
/// 2. `$HOME/.config/toolchain-mirror/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("toolchain-mirror")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("toolchain-mirror")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist. The default path is optional and yields an
/// empty config when absent.
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
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "base_dir" => {
                cfg.base_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "remote_destination" => {
                cfg.remote_destination = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "sync_program" => {
                cfg.sync_program = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "download_host" => {
                cfg.download_host = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "section_id" => {
                cfg.section_id = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "db_busy_timeout_ms" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                let n = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("db_busy_timeout_ms out of range for u32"))?;
                cfg.db_busy_timeout_ms = Some(n);
            }
            "linux_url" => cfg.linux_url = Some(parse_page_url(value).with_context(invalid)?),
            "macos_url" => cfg.macos_url = Some(parse_page_url(value).with_context(invalid)?),
            "windows_url" => {
                cfg.windows_url = Some(parse_page_url(value).with_context(invalid)?);
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

fn parse_page_url(raw_value: &str) -> Result<Url> {
    let url = Url::parse(&parse_string_literal(raw_value)?)?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Expected an http or https URL");
    }
    Ok(url)
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

/// Effective settings after merging CLI flags over the config file.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub base_dir: PathBuf,
    pub quiet: bool,
    pub verbose: u8,
    pub remote: RemoteDestination,
    pub sync_program: Option<String>,
    pub rules: ScrapeRules,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub db_options: DatabaseOptions,
    pub targets: Vec<PlatformTarget>,
}

impl RunSettings {
    /// Merges `args` over `cfg`. CLI flags win.
    pub fn resolve(args: &Args, cfg: &FileConfig) -> Result<Self> {
        let (quiet, verbose) = if args.quiet || args.verbose > 0 {
            (args.quiet, args.verbose)
        } else {
            cfg.verbosity.unwrap_or(VerbositySetting::Default).as_flags()
        };

        let remote = args
            .remote
            .clone()
            .or_else(|| cfg.remote_destination.clone())
            .map(RemoteDestination::new)
            .unwrap_or_default();

        let defaults = ScrapeRules::default();
        let rules = ScrapeRules {
            section_id: cfg.section_id.clone().unwrap_or(defaults.section_id),
            download_host: cfg.download_host.clone().unwrap_or(defaults.download_host),
        };

        let mut db_options = DatabaseOptions::default();
        if let Some(busy_timeout_ms) = cfg.db_busy_timeout_ms {
            db_options.busy_timeout_ms = busy_timeout_ms;
        }

        Ok(Self {
            base_dir: args
                .base_dir
                .clone()
                .or_else(|| cfg.base_dir.clone())
                .unwrap_or_default(),
            quiet,
            verbose,
            remote,
            sync_program: args.sync_program.clone().or_else(|| cfg.sync_program.clone()),
            rules,
            connect_timeout_secs: cfg.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
            read_timeout_secs: cfg.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
            db_options,
            targets: resolve_targets(&args.platforms, cfg)?,
        })
    }
}

/// Platforms to mirror, always in the fixed linux, macos, windows order.
///
/// An empty selection means all platforms.
fn resolve_targets(selected: &[Platform], cfg: &FileConfig) -> Result<Vec<PlatformTarget>> {
    Platform::ALL
        .into_iter()
        .filter(|platform| selected.is_empty() || selected.contains(platform))
        .map(|platform| {
            let page_url = match cfg.page_url(platform) {
                Some(url) => url.clone(),
                None => Url::parse(&platform.default_doc_url())
                    .with_context(|| format!("Invalid default page URL for {platform}"))?,
            };
            Ok(PlatformTarget { platform, page_url })
        })
        .collect()
}
