//! Configuration for the probe.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use loosebox_machine::{ConfigError, InspectorConfig, MachineSpec};
use std::path::{Path, PathBuf};

/// Default spec file name, looked up in the working directory.
pub const DEFAULT_SPEC_FILE: &str = "loosebox.json";

/// Errors raised while loading the machine spec.
#[derive(Debug, thiserror::Error)]
pub enum ProbeConfigError {
    #[error("failed to read spec file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid spec file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// Configuration for the probe.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Absolute path to the machine spec document.
    pub spec_path: PathBuf,

    /// Runtime binaries.
    pub inspector: InspectorConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            spec_path: to_abs(Path::new(DEFAULT_SPEC_FILE)),
            inspector: InspectorConfig::default(),
        }
    }
}

impl ProbeConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `LOOSEBOX_CONFIG` | `./loosebox.json` |
    /// | `LOOSEBOX_DOCKER` | `docker` |
    /// | `LOOSEBOX_IGNITE` | `ignite` |
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            spec_path: std::env::var("LOOSEBOX_CONFIG")
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| to_abs(Path::new(&v)))
                .unwrap_or(default.spec_path),
            inspector: InspectorConfig::from_env(),
        }
    }

    /// Read, parse and validate the machine spec.
    pub fn load_spec(&self) -> Result<MachineSpec, ProbeConfigError> {
        let doc = std::fs::read_to_string(&self.spec_path).map_err(|e| ProbeConfigError::Read {
            path: self.spec_path.clone(),
            source: e,
        })?;

        let invalid = |source| ProbeConfigError::Invalid {
            path: self.spec_path.clone(),
            source,
        };
        let spec = MachineSpec::from_json(&doc).map_err(invalid)?;
        spec.validate().map_err(invalid)?;
        Ok(spec)
    }
}

/// Resolve `p` against the working directory, keeping it as-is on failure.
fn to_abs(p: &Path) -> PathBuf {
    if p.is_absolute() {
        return p.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(p))
        .unwrap_or_else(|_| p.to_path_buf())
}
