//! Top-level daemon configuration: the set of upstream targets to check,
//! how many worker processes to run, and where to bind the status page.
//!
//! Loaded from a JSON file rather than the directive language the module
//! this is drawn from is normally configured through — this rewrite has no
//! surrounding proxy config parser to hang health-check directives off of,
//! so a flat JSON document is the closest equivalent `check-config` offers
//! tooling for (`serde_json` is already load-bearing for `CheckConfig`).

use check_config::CheckConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub addr: SocketAddr,
    pub check: CheckConfig,
}

#[derive(Debug, Deserialize)]
pub struct DaemonConfig {
    pub targets: Vec<TargetConfig>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    pub status_bind: SocketAddr,
    #[serde(default = "default_status_path")]
    pub status_path: String,
}

fn default_workers() -> usize {
    2
}

fn default_status_path() -> String {
    "/status".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("reading config file {path:?}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config file {path:?}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("target {name:?}: {source}")]
    InvalidTarget {
        name: String,
        #[source]
        source: check_config::ConfigError,
    },
    #[error("workers must be at least 1")]
    ZeroWorkers,
    #[error("no targets configured")]
    NoTargets,
}

impl DaemonConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: DaemonConfig =
            serde_json::from_str(&text).map_err(|source| ConfigLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.targets.is_empty() {
            return Err(ConfigLoadError::NoTargets);
        }
        if self.workers == 0 {
            return Err(ConfigLoadError::ZeroWorkers);
        }
        for target in &self.targets {
            target
                .check
                .validate()
                .map_err(|source| ConfigLoadError::InvalidTarget {
                    name: target.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_targets() {
        let json = r#"{"targets": [], "status_bind": "127.0.0.1:9000"}"#;
        let config: DaemonConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(config.validate(), Err(ConfigLoadError::NoTargets)));
    }

    #[test]
    fn parses_a_minimal_config() {
        let json = r#"{
            "targets": [
                {
                    "name": "api-1",
                    "addr": "10.0.0.1:80",
                    "check": {
                        "kind": "http",
                        "interval": "5s",
                        "timeout": "2s",
                        "rise": 2,
                        "fall": 3
                    }
                }
            ],
            "status_bind": "127.0.0.1:9000"
        }"#;
        let config: DaemonConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.workers, 2);
        config.validate().unwrap();
    }
}
