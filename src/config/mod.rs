use crate::core::scheduler::DEFAULT_INTERVAL;
use crate::errors::{AppError, AppResult};
use crate::utils::date::WeekdayLocale;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub weekday_locale: WeekdayLocale,
    #[serde(default = "default_row_limit")]
    pub row_limit: u32,
    #[serde(default = "default_task_limit")]
    pub task_limit: u32,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_refresh_interval() -> u64 {
    DEFAULT_INTERVAL.as_secs()
}
fn default_row_limit() -> u32 {
    100
}
fn default_task_limit() -> u32 {
    200
}

/// `~/x` → `$HOME/x`; anything else unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            refresh_interval_secs: default_refresh_interval(),
            weekday_locale: WeekdayLocale::default(),
            row_limit: default_row_limit(),
            task_limit: default_task_limit(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rtasksync")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rtasksync")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rtasksync.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rtasksync.sqlite")
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        let mut cfg: Config = serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        cfg.database = expand_tilde(&cfg.database).to_string_lossy().to_string();
        Ok(cfg)
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> AppResult<Config> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = match custom_name {
            Some(name) => {
                let p = Path::new(&name);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    dir.join(p)
                }
            }
            None => Self::database_file(),
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };

        if !is_test {
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(config.to_yaml()?.as_bytes())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.conf");
        fs::write(&path, "database: /tmp/x.sqlite\nweekday_locale: en\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.database, "/tmp/x.sqlite");
        assert_eq!(cfg.weekday_locale, WeekdayLocale::En);
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(300));
        assert_eq!(cfg.row_limit, 100);
        assert_eq!(cfg.task_limit, 200);
    }

    #[test]
    fn broken_yaml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.conf");
        fs::write(&path, "refresh_interval_secs: [nope").unwrap();
        assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn tilde_database_is_expanded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.conf");
        fs::write(&path, "database: ~/t.sqlite\n").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert!(!cfg.database.starts_with('~'));
        assert!(cfg.database.ends_with("t.sqlite"));
    }

    #[test]
    fn absent_file_gives_defaults() {
        let cfg = Config::load_from(Path::new("/definitely/not/here.conf")).unwrap();
        assert_eq!(cfg.refresh_interval_secs, 300);
    }
}
