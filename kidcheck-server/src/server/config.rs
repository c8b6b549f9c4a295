use serde::Deserialize;
use std::{env, fs, io, path::Path};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_DB_PATH: &str = "data/kidcheck.db";
pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listen_port: Option<u16>,
    pub dev_cors_origin: Option<String>,
    pub db_path: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AppConfig {
    /// Reads `CONFIG_PATH` (default `config.yaml`).
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_or_default(path)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(&path)?;
        // An empty file is valid and means "all defaults".
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: AppConfig = serde_yaml::from_str(&text)?;
        Ok(cfg)
    }

    /// Like [`AppConfig::load_from_path`], but a missing file yields defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load_from_path(&path) {
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.as_ref().display(), "no config file; using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// CLI flag, then `PORT`, then the config file, then 3001.
    pub fn resolve_port(&self, cli: Option<u16>) -> u16 {
        cli.or_else(|| env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()))
            .or(self.listen_port)
            .unwrap_or(DEFAULT_PORT)
    }

    /// CLI flag, then `DB_PATH`, then the config file, then `data/kidcheck.db`.
    pub fn resolve_db_path(&self, cli: Option<String>) -> String {
        cli.or_else(|| env::var("DB_PATH").ok())
            .or_else(|| self.db_path.clone())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_yaml_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "listen_port: 8080\ndev_cors_origin: \"http://localhost:5173\"\ndb_path: /tmp/k.db"
        )
        .unwrap();
        let cfg = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(cfg.listen_port, Some(8080));
        assert_eq!(cfg.dev_cors_origin.as_deref(), Some("http://localhost:5173"));
        assert_eq!(cfg.db_path.as_deref(), Some("/tmp/k.db"));
    }

    #[test]
    fn partial_and_empty_files_fall_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen_port: 9000").unwrap();
        let cfg = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(cfg.listen_port, Some(9000));
        assert!(cfg.dev_cors_origin.is_none());

        let empty = tempfile::NamedTempFile::new().unwrap();
        let cfg = AppConfig::load_from_path(empty.path()).unwrap();
        assert!(cfg.listen_port.is_none());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_or_default(dir.path().join("absent.yaml")).unwrap();
        assert!(cfg.listen_port.is_none());
        assert!(cfg.db_path.is_none());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen_port: [not, a, port").unwrap();
        assert!(matches!(
            AppConfig::load_or_default(file.path()),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn cli_values_win() {
        let cfg = AppConfig {
            listen_port: Some(9000),
            dev_cors_origin: None,
            db_path: Some("from-config.db".into()),
        };
        assert_eq!(cfg.resolve_port(Some(7000)), 7000);
        assert_eq!(cfg.resolve_db_path(Some("cli.db".into())), "cli.db");
    }
}
