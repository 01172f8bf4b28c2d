//! Persistence configuration and the persistence layer of a compiler.
//!
//! The on-disk format belongs to the persistence collaborator; this module
//! only carries its configuration to it.

use std::path::PathBuf;

use jitplat_core::DeviceType;

use crate::flags::JitFlags;

/// Configuration forwarded verbatim to the executable persistor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistorConfig {
    /// Cache directory. Empty disables persistence.
    pub cache_directory: PathBuf,
    /// Whether persisted executables must match their signature exactly.
    pub strict_signature_checks: bool,
    /// File-name prefix of persisted executables.
    pub cache_prefix: String,
}

impl PersistorConfig {
    pub fn new(
        cache_directory: impl Into<PathBuf>,
        strict_signature_checks: bool,
        cache_prefix: impl Into<String>,
    ) -> Self {
        Self {
            cache_directory: cache_directory.into(),
            strict_signature_checks,
            cache_prefix: cache_prefix.into(),
        }
    }

    /// Build the configuration from JIT flags.
    pub fn from_flags(flags: &JitFlags) -> Self {
        Self::new(
            flags.persistent_cache_directory.clone(),
            !flags.disable_strict_signature_checks,
            flags.persistent_cache_prefix.clone(),
        )
    }

    /// Whether a cache directory is configured.
    pub fn is_enabled(&self) -> bool {
        !self.cache_directory.as_os_str().is_empty()
    }
}

impl Default for PersistorConfig {
    fn default() -> Self {
        Self::from_flags(&JitFlags::default())
    }
}

/// Persistence layer of a [`DeviceCompiler`](crate::DeviceCompiler), bound
/// to the compilation device whose executables it stores.
#[derive(Debug, Clone)]
pub struct ExecutablePersistor {
    config: PersistorConfig,
    device_type: DeviceType,
}

impl ExecutablePersistor {
    pub fn new(config: PersistorConfig, device_type: DeviceType) -> Self {
        Self {
            config,
            device_type,
        }
    }

    pub fn config(&self) -> &PersistorConfig {
        &self.config
    }

    /// Compilation device this persistor stores executables for.
    pub fn device_type(&self) -> &DeviceType {
        &self.device_type
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }
}
