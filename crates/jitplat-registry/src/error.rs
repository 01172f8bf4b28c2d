//! Registry error types.

use jitplat_core::{CoreError, ErrorKind, PlatformId};

/// Errors that can occur during registry lookups and client construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No platform is registered under the id.
    #[error("platform not found: {id}")]
    PlatformNotFound { id: PlatformId },

    /// No compiler backend is registered for the platform.
    #[error("could not find registered compiler for platform {platform} -- check target linkage")]
    CompilerNotFound { platform: String },

    /// The registry could not answer the lookup.
    #[error("registry unavailable: {detail}")]
    Unavailable { detail: String },

    /// Backend client construction failed.
    #[error("backend client creation failed: {0}")]
    ClientCreation(#[from] CoreError),
}

impl RegistryError {
    /// The classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::PlatformNotFound { .. }
            | RegistryError::CompilerNotFound { .. } => ErrorKind::NotFound,
            RegistryError::Unavailable { .. } => ErrorKind::Internal,
            RegistryError::ClientCreation(e) => e.kind(),
        }
    }

    /// Whether the lookup failed because nothing is registered.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
