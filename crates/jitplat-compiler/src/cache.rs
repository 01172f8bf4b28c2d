//! Per-device-type compiler cache.
//!
//! Compiler resolution itself keeps nothing. Callers that want one compiler
//! per compilation target share it through this cache, which resolves each
//! device type at most once and tears entries down explicitly.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jitplat_core::DeviceType;
use tracing::debug;

use crate::compiler::DeviceCompiler;
use crate::error::Result;

/// Shared device compilers keyed by the device type they were resolved for.
#[derive(Debug, Default)]
pub struct DeviceCompilerCache {
    compilers: DashMap<DeviceType, Arc<DeviceCompiler>>,
}

impl DeviceCompilerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiler for `device_type`, running `resolve` if there is
    /// none yet.
    ///
    /// `resolve` runs at most once per key even under concurrent calls, and
    /// must not call back into this cache. Errors are returned, not cached.
    pub fn get_or_resolve<F>(
        &self,
        device_type: &DeviceType,
        resolve: F,
    ) -> Result<Arc<DeviceCompiler>>
    where
        F: FnOnce() -> Result<DeviceCompiler>,
    {
        if let Some(compiler) = self.compilers.get(device_type) {
            return Ok(Arc::clone(compiler.value()));
        }

        match self.compilers.entry(device_type.clone()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let compiler = Arc::new(resolve()?);
                debug!(
                    device_type = %device_type,
                    compiler = %compiler.id(),
                    "cached device compiler"
                );
                entry.insert(Arc::clone(&compiler));
                Ok(compiler)
            }
        }
    }

    pub fn get(&self, device_type: &DeviceType) -> Option<Arc<DeviceCompiler>> {
        self.compilers.get(device_type).map(|c| Arc::clone(c.value()))
    }

    /// Remove and return the compiler for `device_type`.
    pub fn remove(&self, device_type: &DeviceType) -> Option<Arc<DeviceCompiler>> {
        self.compilers.remove(device_type).map(|(_, c)| c)
    }

    /// Drop every cached compiler.
    pub fn clear(&self) {
        self.compilers.clear();
    }

    pub fn len(&self) -> usize {
        self.compilers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compilers.is_empty()
    }
}
