//! JIT persistence flags.
//!
//! Flags are read from a TOML file, e.g.
//!
//! ```toml
//! persistent-cache-directory = "/var/cache/jit"
//! disable-strict-signature-checks = false
//! persistent-cache-prefix = "jit_compile_cache"
//! ```
//!
//! and can be overridden by `JITPLAT_*` environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CompilerError, Result};

pub const ENV_CACHE_DIRECTORY: &str = "JITPLAT_PERSISTENT_CACHE_DIRECTORY";
pub const ENV_DISABLE_STRICT_SIGNATURE_CHECKS: &str = "JITPLAT_DISABLE_STRICT_SIGNATURE_CHECKS";
pub const ENV_CACHE_PREFIX: &str = "JITPLAT_PERSISTENT_CACHE_PREFIX";

/// Default prefix of persisted executables.
pub const DEFAULT_CACHE_PREFIX: &str = "jit_compile_cache";

/// Flags controlling persistence of compiled executables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct JitFlags {
    /// Directory of the persistent cache. Empty disables persistence.
    pub persistent_cache_directory: PathBuf,
    /// Skip strict signature checks when loading persisted executables.
    pub disable_strict_signature_checks: bool,
    /// File-name prefix of persisted executables.
    pub persistent_cache_prefix: String,
}

impl Default for JitFlags {
    fn default() -> Self {
        Self {
            persistent_cache_directory: PathBuf::new(),
            disable_strict_signature_checks: false,
            persistent_cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
        }
    }
}

impl JitFlags {
    /// Parse flags from a TOML string. Missing keys take their defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load flags from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CompilerError::FlagsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let flags = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded jit flags");
        Ok(flags)
    }

    /// Apply `JITPLAT_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(dir) = lookup(ENV_CACHE_DIRECTORY) {
            self.persistent_cache_directory = PathBuf::from(dir);
        }
        if let Some(value) = lookup(ENV_DISABLE_STRICT_SIGNATURE_CHECKS) {
            self.disable_strict_signature_checks =
                parse_bool(ENV_DISABLE_STRICT_SIGNATURE_CHECKS, &value)?;
        }
        if let Some(prefix) = lookup(ENV_CACHE_PREFIX) {
            self.persistent_cache_prefix = prefix;
        }
        Ok(self)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CompilerError::InvalidEnv {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
