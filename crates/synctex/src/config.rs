use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::reader::{DEFAULT_BUFFER_SIZE, MIN_LOOKAHEAD};
use crate::tree::DEFAULT_FRIEND_BUCKETS;

/// Environment variable naming the build directory to search.
pub const BUILD_DIR_ENV: &str = "SYNCTEX_BUILD_DIR";
/// Environment variable overriding the read window size.
pub const BUFFER_SIZE_ENV: &str = "SYNCTEX_BUFFER_SIZE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },
}

/// Tunables of a [`Scanner`](crate::Scanner).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    /// Size of the read window in bytes.
    pub buffer_size: usize,
    /// Number of buckets of the friend index.
    pub friend_buckets: usize,
    /// Where to look for the synctex file when it is not next to the output.
    pub build_directory: Option<PathBuf>,
    /// Only report nodes of the requested line in forward searches, never
    /// of the lines after it.
    pub strong_forward: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            friend_buckets: DEFAULT_FRIEND_BUCKETS,
            build_directory: None,
            strong_forward: false,
        }
    }
}

impl ScannerConfig {
    /// Parse a JSON config. Missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: ScannerConfig = serde_json::from_str(text)?;
        Ok(config.sanitized())
    }

    /// Load the config from `path` if given, then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_json(&text)?
            }
            None => Self::default(),
        };
        config.with_env(|name| std::env::var(name).ok())
    }

    /// Override fields from environment variables, looked up with `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(dir) = lookup(BUILD_DIR_ENV).filter(|dir| !dir.is_empty()) {
            self.build_directory = Some(PathBuf::from(dir));
        }
        if let Some(value) = lookup(BUFFER_SIZE_ENV) {
            self.buffer_size = value.trim().parse().map_err(|_| ConfigError::Env {
                name: BUFFER_SIZE_ENV,
                value,
            })?;
        }
        Ok(self.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.buffer_size = self.buffer_size.max(MIN_LOOKAHEAD);
        self.friend_buckets = self.friend_buckets.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScannerConfig::from_json("{}").unwrap();
        assert_eq!(config, ScannerConfig::default());
        assert_eq!(config.buffer_size, 32768);
        assert_eq!(config.friend_buckets, 1024);
    }

    #[test]
    fn test_from_json() {
        let config = ScannerConfig::from_json(
            r#"{"buffer_size": 4, "build_directory": "out", "strong_forward": true}"#,
        )
        .unwrap();
        assert_eq!(config.buffer_size, 16);
        assert_eq!(config.build_directory, Some(PathBuf::from("out")));
        assert!(config.strong_forward);
    }

    #[test]
    fn test_unknown_key() {
        assert_matches!(
            ScannerConfig::from_json(r#"{"bufer_size": 4}"#),
            Err(ConfigError::Json(_))
        );
    }

    #[test]
    fn test_with_env() {
        let env = HashMap::from([
            (BUILD_DIR_ENV, "/tmp/build".to_string()),
            (BUFFER_SIZE_ENV, "1024".to_string()),
        ]);
        let config = ScannerConfig::default()
            .with_env(|name| env.get(name).cloned())
            .unwrap();
        assert_eq!(config.build_directory, Some(PathBuf::from("/tmp/build")));
        assert_eq!(config.buffer_size, 1024);

        let err = ScannerConfig::default()
            .with_env(|name| (name == BUFFER_SIZE_ENV).then(|| "lots".to_string()))
            .unwrap_err();
        assert_matches!(err, ConfigError::Env { name: BUFFER_SIZE_ENV, .. });
    }
}
