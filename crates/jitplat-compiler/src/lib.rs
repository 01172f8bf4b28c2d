//! JIT compiler resolution for jitplat devices.
//!
//! Given a device, its [`PlatformInfo`](jitplat_core::PlatformInfo), and the
//! session's runtime context, [`CompilerResolver::resolve`] selects or builds
//! the [`DeviceCompiler`] for it, and [`select_allocator`] picks the memory
//! allocator compiled code should use.
//!
//! Resolution outcomes:
//! - **Compiler**: a compiler owned by the caller
//! - **Unimplemented**: no compiler backend for the platform; run uncompiled
//! - **Other errors**: invalid configuration or registry failures

pub mod allocator;
pub mod cache;
pub mod compiler;
pub mod error;
pub mod flags;
pub mod persistor;
pub mod resolve;

pub use allocator::select_allocator;
pub use cache::DeviceCompilerCache;
pub use compiler::{create_device_compiler, CompilerClient, CompilerId, DeviceCompiler};
pub use error::{CompilerError, Result};
pub use flags::JitFlags;
pub use persistor::{ExecutablePersistor, PersistorConfig};
pub use resolve::CompilerResolver;
