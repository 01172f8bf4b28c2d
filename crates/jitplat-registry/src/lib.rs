//! Backend registry and backend client cache for jitplat.
//!
//! # Architecture
//!
//! The registry answers three questions during compiler resolution:
//! - **Platforms**: which platform a [`PlatformId`](jitplat_core::PlatformId) names
//! - **Compiler backends**: whether a compiler is linked in for a platform
//! - **Compilation devices**: which device compiles ops for a logical device type
//!
//! The [`BackendClientCache`] is the one piece of shared mutable state: a
//! get-or-create store of backend clients keyed by their construction
//! options. It is an ordinary value, created and torn down by its owner.

pub mod cache;
pub mod error;
pub mod registry;

// Re-exports for convenience.
pub use cache::{BackendClientCache, CacheStats};
pub use error::{RegistryError, Result};
pub use registry::{BackendRegistry, CompilerBackend, DeviceRegistration, InMemoryBackendRegistry};
