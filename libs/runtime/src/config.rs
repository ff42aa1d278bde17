//! Server configuration.
//!
//! Sources are layered in this order, later ones winning:
//! built-in defaults, the YAML file, then `APP__`-prefixed environment
//! variables (`APP__SERVER__PORT=8080` sets `server.port`). Files under
//! `modules_dir` are folded into the `modules` bag afterwards, keyed by
//! file stem.

use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paths::home_dir::resolve_home_dir;

const ENV_PREFIX: &str = "APP__";
const HOME_SUBDIR: &str = ".commons";
const DEFAULT_DATABASE_URL: &str = "sqlite://database/commons.db?mode=rwc";
const DEFAULT_LOG_FILE: &str = "logs/commons.log";
const MEMORY_DSN: &str = "sqlite::memory:";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: Option<DatabaseConfig>,
    /// Absent means [`default_logging_config`].
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub modules_dir: Option<String>,
    /// Raw per-module sections; each module deserializes its own.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Absolute after loading. Empty selects `$HOME/.commons`.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Request timeout handed to the HTTP host; 0 keeps its own default.
    #[serde(default)]
    pub timeout_sec: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `sqlite://relative/or/absolute.db?mode=rwc`, `sqlite::memory:` or `postgres://...`
    pub url: String,
    pub max_conns: Option<u32>,
    /// SQLite only.
    pub busy_timeout_ms: Option<u32>,
}

/// Subsystem (tracing target prefix) -> sink settings. `default` catches the rest.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String,
    /// Relative paths land under `server.home_dir`; empty disables the file sink.
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    pub max_age_days: Option<u32>,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            timeout_sec: 0,
        }
    }
}

pub fn default_logging_config() -> LoggingConfig {
    LoggingConfig::from([(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: DEFAULT_LOG_FILE.to_string(),
            file_level: "debug".to_string(),
            max_age_days: Some(7),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    )])
}

impl Default for AppConfig {
    /// Config used when no file is given: local SQLite plus default logging.
    fn default() -> Self {
        Self {
            database: Some(DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_conns: Some(10),
                busy_timeout_ms: Some(5000),
            }),
            logging: Some(default_logging_config()),
            ..Self::bare()
        }
    }
}

impl AppConfig {
    /// Only the server section; what a config file is layered over.
    fn bare() -> Self {
        Self {
            server: ServerConfig::default(),
            database: None,
            logging: None,
            modules_dir: None,
            modules: HashMap::new(),
        }
    }

    /// Load `config_path` over the bare defaults, then the environment.
    /// `server.home_dir` comes back absolute and created.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let config_path = config_path.as_ref();
        if !config_path.is_file() {
            bail!("Config file not found: {}", config_path.display());
        }

        let mut config: AppConfig = Figment::from(Serialized::defaults(Self::bare()))
            .merge(Yaml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

        config.resolve_home_dir()?;
        if let Some(dir) = config.modules_dir.clone() {
            merge_module_files(&mut config.modules, Path::new(&dir))?;
        }
        Ok(config)
    }

    /// [`Self::load_layered`] when a path is given, built-in defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_layered(path);
        }
        let mut config = Self::default();
        config.resolve_home_dir()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Typed view of one module's section. A missing section yields `T::default()`.
    pub fn module_config<T>(&self, module_name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.modules.get(module_name) else {
            return Ok(T::default());
        };
        serde_json::from_value(raw.clone())
            .with_context(|| format!("Invalid configuration for module '{module_name}'"))
    }

    /// `--port` replaces `server.port`; `-v`/`-vv` raise the default console level.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let level = match args.verbose {
            0 => return,
            1 => "debug",
            _ => "trace",
        };
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(section) = logging.get_mut("default") {
            section.console_level = level.to_string();
        }
    }

    fn resolve_home_dir(&mut self) -> Result<()> {
        let configured = Some(self.server.home_dir.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let resolved = resolve_home_dir(configured, HOME_SUBDIR, true)
            .context("Failed to resolve server.home_dir")?;
        self.server.home_dir = resolved.to_string_lossy().to_string();
        Ok(())
    }
}

/// Flags from the command line that touch configuration.
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
    pub mock: bool,
}

/// Each `<name>.yaml`/`<name>.yml` in `dir` becomes `modules[name]`, replacing
/// an inline section of the same name. A missing directory is skipped.
fn merge_module_files(bag: &mut HashMap<String, serde_json::Value>, dir: &Path) -> Result<()> {
    if !dir.exists() {
        tracing::debug!("modules_dir {} does not exist, skipping", dir.display());
        return Ok(());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read modules_dir {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_yaml(path))
        .collect();
    // Deterministic when `a.yaml` and `a.yml` both exist: the later name wins
    files.sort();

    for path in files {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value: serde_json::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?;
        bag.insert(name.to_string(), value);
    }
    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Anchor a relative SQLite file DSN at `base_dir`, keeping any query string.
/// In-memory and non-SQLite DSNs pass through; separators become `/`.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let Some(rest) = dsn.strip_prefix("sqlite://") else {
        return Ok(dsn.to_string());
    };

    let (file, query) = rest
        .split_once('?')
        .map_or((rest, None), |(f, q)| (f, Some(q)));
    if file.is_empty() {
        bail!("Empty SQLite path in DSN");
    }

    let path = base_dir.join(file);
    if create_dirs {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let path = path.to_string_lossy().replace('\\', "/");
    Ok(match query {
        Some(q) => format!("sqlite://{path}?{q}"),
        None => format!("sqlite://{path}"),
    })
}

/// `"sqlite"` or `"postgres"`, from the DSN scheme.
pub fn detect_backend(url: &str) -> Result<&'static str> {
    let raw = url.trim();
    if raw.is_empty() {
        bail!("Database URL not configured");
    }
    if raw.eq_ignore_ascii_case(MEMORY_DSN) {
        return Ok("sqlite");
    }
    let parsed = url::Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{raw}': {e}"))?;
    match parsed.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {other}")),
    }
}
