//! Compiler resolution errors.

use std::path::PathBuf;

use jitplat_core::{CoreError, DeviceType, ErrorKind};
use jitplat_registry::RegistryError;
use thiserror::Error;

/// Errors that can occur while resolving a compiler or an allocator.
#[derive(Debug, Error)]
pub enum CompilerError {
    /// No compiler backend is linked in for the platform. Callers should
    /// fall back to running uncompiled.
    #[error("Could not find compiler for platform {platform}: {}: {source}", .source.kind())]
    Unimplemented {
        platform: String,
        #[source]
        source: RegistryError,
    },

    #[error("No JIT device registered for {device_type}")]
    NoJitDevice { device_type: DeviceType },

    #[error("no platform resolved for device {device} of type {device_type}")]
    PlatformUnresolved {
        device: String,
        device_type: DeviceType,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("failed to read flags file {}: {source}", path.display())]
    FlagsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid flags: {0}")]
    Flags(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: String, value: String },
}

impl CompilerError {
    /// The classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompilerError::Unimplemented { .. } => ErrorKind::Unimplemented,
            CompilerError::NoJitDevice { .. }
            | CompilerError::Flags(_)
            | CompilerError::InvalidEnv { .. } => ErrorKind::InvalidArgument,
            CompilerError::PlatformUnresolved { .. } => ErrorKind::FailedPrecondition,
            CompilerError::Registry(e) => e.kind(),
            CompilerError::Core(e) => e.kind(),
            CompilerError::FlagsIo { .. } => ErrorKind::Internal,
        }
    }

    /// Whether the caller should fall back to uncompiled execution rather
    /// than abort.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Unimplemented
    }
}

/// Result type alias for compiler operations.
pub type Result<T> = std::result::Result<T, CompilerError>;
