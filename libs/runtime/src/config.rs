use anyhow::{anyhow, Context, Result};
use garden_db::DbConnConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::home_dir::resolve_home_dir;

/// Environment prefix; `GARDEN__DATABASE__DSN` maps to `database.dsn`.
pub const ENV_PREFIX: &str = "GARDEN__";

const DEFAULT_SUBDIR: &str = ".gardenspace";
const DEFAULT_DSN: &str = "sqlite://database/gardenspace.db";
const MOCK_DSN: &str = "sqlite::memory:";

/// Main application configuration with strongly-typed global sections
/// and a flexible per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    /// Database connection; the default SQLite file is used when absent.
    pub database: Option<DbConnConfig>,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Directory containing per-module YAML files (optional).
    #[serde(default)]
    pub modules_dir: Option<String>,
    /// Per-module configuration bag: module_name → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppSection {
    /// Empty means the platform default (`~/.gardenspace`). Normalised to an absolute path on load.
    #[serde(default)]
    pub home_dir: String,
}

/// Logging configuration - maps targets to their logging settings.
/// Key "default" is the catch-all for logs that don't match an explicit target.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    #[serde(default)]
    pub file: String, // "logs/garden.log"; empty disables the file sink
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_age_days: Option<u32>,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/gardenspace.log".to_string(),
            file_level: "debug".to_string(),
            max_age_days: Some(7),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

/// Database settings used when the config names none.
pub fn default_database_config() -> DbConnConfig {
    DbConnConfig {
        dsn: Some(DEFAULT_DSN.to_string()),
        pool: Some(garden_db::PoolCfg {
            max_conns: Some(10),
            acquire_timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        }),
        ..Default::default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            database: Some(default_database_config()),
            logging: Some(default_logging_config()),
            modules_dir: None,
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    /// Normalizes `app.home_dir` into an absolute path and creates the directory.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let path = config_path.as_ref();
        if !path.is_file() {
            return Err(anyhow!("Config file not found: {}", path.display()));
        }

        // Optional sections stay None unless YAML/ENV provide them.
        let base = AppConfig {
            app: AppSection::default(),
            database: None,
            logging: None,
            modules_dir: None,
            modules: HashMap::new(),
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(config_path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: AppConfig = figment
            .extract()
            .with_context(|| {
                format!(
                    "Failed to load config from {}",
                    config_path.as_ref().display()
                )
            })?;

        config.finish_loading()?;
        Ok(config)
    }

    /// Load configuration from file or fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                c.finish_loading()?;
                Ok(c)
            }
        }
    }

    fn finish_loading(&mut self) -> Result<()> {
        normalize_home_dir_inplace(&mut self.app).context("Failed to resolve app.home_dir")?;

        if let Some(dir) = self.modules_dir.clone() {
            merge_module_files(&mut self.modules, dir)?;
        }

        if self.database.is_none() {
            self.database = Some(default_database_config());
        }
        self.absolutize_database_paths()
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            match args.verbose {
                0 => {}
                1 => default_section.console_level = "debug".to_string(),
                _ => default_section.console_level = "trace".to_string(),
            }
        }

        if args.mock {
            self.database = Some(DbConnConfig {
                pool: Some(garden_db::PoolCfg {
                    max_conns: Some(1),
                    ..Default::default()
                }),
                ..DbConnConfig::from_dsn(MOCK_DSN)
            });
        }
    }

    /// Home directory as a path (absolute once loaded).
    pub fn home_dir(&self) -> PathBuf {
        PathBuf::from(&self.app.home_dir)
    }

    /// Database settings; defaults when unset.
    pub fn database_config(&self) -> DbConnConfig {
        self.database.clone().unwrap_or_else(default_database_config)
    }

    /// Typed config for one module. Missing sections yield `T::default()`.
    pub fn module_config<T: DeserializeOwned + Default>(&self, module: &str) -> Result<T> {
        match self.modules.get(module) {
            Some(raw) => serde_json::from_value(raw.clone())
                .with_context(|| format!("Invalid config for module '{}'", module)),
            None => Ok(T::default()),
        }
    }

    /// Resolve relative SQLite locations under `app.home_dir`.
    fn absolutize_database_paths(&mut self) -> Result<()> {
        let base = self.home_dir();
        let Some(db) = self.database.as_mut() else {
            return Ok(());
        };

        if let Some(dsn) = db.dsn.as_deref() {
            if dsn.trim_start().starts_with("sqlite") {
                db.dsn = Some(absolutize_sqlite_dsn(dsn, &base)?);
            }
        }
        if let Some(path) = db.path.as_ref() {
            if path.is_relative() {
                db.path = Some(base.join(path));
            }
        }
        Ok(())
    }
}

/// Rewrite a SQLite DSN so that its file path is absolute.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if garden_db::options::is_memory_dsn(dsn) {
        return Ok(dsn.to_string());
    }
    let tail = dsn
        .trim()
        .strip_prefix("sqlite:")
        .ok_or_else(|| anyhow!("DSN must start with sqlite: (got: {})", dsn))?;
    let tail = tail.strip_prefix("//").unwrap_or(tail);

    let (path_str, query) = match tail.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (tail, None),
    };
    if path_str.is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }

    let mut p = PathBuf::from(path_str);
    if p.is_relative() {
        p = base_dir.join(p);
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Command line arguments relevant to configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub print_config: bool,
    pub verbose: u8,
    pub mock: bool,
}

fn normalize_home_dir_inplace(app: &mut AppSection) -> Result<()> {
    let configured = if app.home_dir.trim().is_empty() {
        None
    } else {
        Some(app.home_dir.clone())
    };

    let resolved = resolve_home_dir(configured, DEFAULT_SUBDIR, true)
        .context("home_dir normalization failed")?;

    app.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}

fn merge_module_files(
    bag: &mut HashMap<String, serde_json::Value>,
    dir: impl AsRef<Path>,
) -> Result<()> {
    use std::fs;
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"));
        if !path.is_file() || !is_yaml {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let raw = fs::read_to_string(&path)?;
        let val: serde_yaml::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid module config file {}", path.display()))?;
        bag.insert(name, serde_json::to_value(val)?);
    }
    Ok(())
}
