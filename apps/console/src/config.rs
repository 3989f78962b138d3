use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use repu_client::{ClientConfig, BASE_URL_ENV};

pub const DEFAULT_CONFIG_PATH: &str = "configs/default.yaml";
pub const STATE_DIR_ENV: &str = "REPU_STATE_DIR";
const DEFAULT_STATE_DIR: &str = ".repu";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub api_base_url: Option<String>,
    pub state_dir: Option<PathBuf>,
}

impl AppConfig {
    /// An explicit path must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let cfg = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        Ok(cfg.with_overrides(|key| std::env::var(key).ok()))
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg: AppConfig = serde_yaml::from_str(&s)
            .with_context(|| format!("parsing {}", path.display()))?;
        info!("load_config: {:?}", cfg);
        Ok(cfg)
    }

    /// A non-blank state dir from the environment wins over the file.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(STATE_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.state_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// `REPU_API_BASE_URL` when set, else `api_base_url` from the file.
    pub fn client_config(&self) -> anyhow::Result<ClientConfig> {
        match ClientConfig::from_env() {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                debug!(error = %e, "no base url in environment, using config file");
                Ok(ClientConfig::new(self.base_url()?)?)
            }
        }
    }

    pub fn base_url(&self) -> anyhow::Result<&str> {
        self.api_base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow!("api_base_url is not set (config file or {BASE_URL_ENV})"))
    }

    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_yaml_and_env_overrides() {
        let cfg: AppConfig =
            serde_yaml::from_str("api_base_url: http://file:8080\nstate_dir: /tmp/repu\n").unwrap();

        let env: HashMap<&str, &str> = [(STATE_DIR_ENV, "/var/lib/repu")].into_iter().collect();
        let overridden = cfg.clone().with_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(overridden.state_dir(), PathBuf::from("/var/lib/repu"));

        let blank = cfg.clone().with_overrides(|_| Some(" ".to_string()));
        assert_eq!(blank.state_dir(), PathBuf::from("/tmp/repu"));
    }

    #[test]
    fn test_client_config_prefers_environment() {
        let cfg: AppConfig = serde_yaml::from_str("api_base_url: http://file:8080/\n").unwrap();
        let expected = ClientConfig::from_env()
            .unwrap_or_else(|_| ClientConfig::new("http://file:8080").unwrap());
        assert_eq!(cfg.client_config().unwrap(), expected);
    }

    #[test]
    fn test_missing_base_url() {
        let cfg = AppConfig::default().with_overrides(|_| None);
        assert!(cfg.base_url().is_err());
        assert_eq!(cfg.state_dir(), PathBuf::from(DEFAULT_STATE_DIR));
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.yaml");
        std::fs::write(&path, "api_base_url: http://127.0.0.1:8080\n").unwrap();

        let cfg = AppConfig::from_file(&path).unwrap();
        assert_eq!(cfg.base_url().unwrap(), "http://127.0.0.1:8080");
        assert!(AppConfig::from_file(&dir.path().join("missing.yaml")).is_err());
    }
}
