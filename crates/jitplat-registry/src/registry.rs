//! Backend registry trait and in-memory implementation.
//!
//! The `BackendRegistry` trait abstracts over where platforms, compiler
//! backends, and compilation-device registrations come from. The
//! `InMemoryBackendRegistry` holds them in concurrent maps and is suitable
//! for embedding, development, and testing.

use dashmap::DashMap;
use jitplat_core::{DeviceType, Platform, PlatformId};

use crate::error::{RegistryError, Result};

/// A compiler backend registered for a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerBackend {
    /// Backend name (e.g., "llvm-cpu").
    pub name: String,
    /// Platform the backend compiles for.
    pub platform_id: PlatformId,
}

/// Registration tying a logical device type to its compilation device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRegistration {
    /// Name of the device that compiles ops for the logical device.
    pub compilation_device_name: DeviceType,
}

/// Abstract backend registry.
pub trait BackendRegistry: Send + Sync {
    /// Look up a platform by id.
    fn platform_with_id(&self, id: &PlatformId) -> Result<Platform>;

    /// Look up the compiler backend for a platform. Must fail with a
    /// not-found error (see [`RegistryError::is_not_found`]) when none is
    /// registered.
    fn compiler_for_platform(&self, platform: &Platform) -> Result<CompilerBackend>;

    /// Look up the compilation device registered for a logical device type.
    fn compilation_device(&self, device_type: &DeviceType) -> Option<DeviceRegistration>;
}

/// Registry backed by concurrent in-memory maps.
#[derive(Debug, Default)]
pub struct InMemoryBackendRegistry {
    platforms: DashMap<PlatformId, Platform>,
    compilers: DashMap<PlatformId, CompilerBackend>,
    unavailable: DashMap<PlatformId, String>,
    devices: DashMap<DeviceType, DeviceRegistration>,
}

impl InMemoryBackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the host platform, its compiler, and the standard
    /// CPU/GPU compilation devices.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_platform(Platform::host())
            .with_compiler(PlatformId::HOST, "host-jit")
            .with_compilation_device(DeviceType::CPU, DeviceType::CPU_JIT)
            .with_compilation_device(DeviceType::GPU, DeviceType::GPU_JIT)
    }

    pub fn with_platform(self, platform: Platform) -> Self {
        self.register_platform(platform);
        self
    }

    pub fn with_compiler(self, platform_id: PlatformId, name: impl Into<String>) -> Self {
        self.register_compiler(platform_id, name);
        self
    }

    pub fn with_compilation_device(self, device_type: DeviceType, compilation: DeviceType) -> Self {
        self.register_compilation_device(device_type, compilation);
        self
    }

    /// Register (or replace) a platform.
    pub fn register_platform(&self, platform: Platform) {
        self.platforms.insert(platform.id.clone(), platform);
    }

    /// Register (or replace) the compiler backend for a platform.
    pub fn register_compiler(&self, platform_id: PlatformId, name: impl Into<String>) {
        self.unavailable.remove(&platform_id);
        self.compilers.insert(
            platform_id.clone(),
            CompilerBackend {
                name: name.into(),
                platform_id,
            },
        );
    }

    /// Make compiler lookups for a platform fail with something other than
    /// not-found.
    pub fn mark_compiler_unavailable(&self, platform_id: PlatformId, detail: impl Into<String>) {
        self.unavailable.insert(platform_id, detail.into());
    }

    /// Register (or replace) the compilation device for a device type.
    pub fn register_compilation_device(&self, device_type: DeviceType, compilation: DeviceType) {
        self.devices.insert(
            device_type,
            DeviceRegistration {
                compilation_device_name: compilation,
            },
        );
    }

    /// Ids of all registered platforms, sorted.
    pub fn platform_ids(&self) -> Vec<PlatformId> {
        let mut ids: Vec<_> = self.platforms.iter().map(|p| p.key().clone()).collect();
        ids.sort();
        ids
    }
}

impl BackendRegistry for InMemoryBackendRegistry {
    fn platform_with_id(&self, id: &PlatformId) -> Result<Platform> {
        self.platforms
            .get(id)
            .map(|p| p.value().clone())
            .ok_or_else(|| RegistryError::PlatformNotFound { id: id.clone() })
    }

    fn compiler_for_platform(&self, platform: &Platform) -> Result<CompilerBackend> {
        if let Some(detail) = self.unavailable.get(&platform.id) {
            return Err(RegistryError::Unavailable {
                detail: detail.value().clone(),
            });
        }
        self.compilers
            .get(&platform.id)
            .map(|c| c.value().clone())
            .ok_or_else(|| RegistryError::CompilerNotFound {
                platform: platform.name.clone(),
            })
    }

    fn compilation_device(&self, device_type: &DeviceType) -> Option<DeviceRegistration> {
        self.devices.get(device_type).map(|r| r.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitplat_core::ErrorKind;

    fn cuda() -> Platform {
        Platform::new(PlatformId::new("cuda"), "CUDA", 2, 1 << 30)
    }

    #[test]
    fn defaults_cover_host() {
        let reg = InMemoryBackendRegistry::with_defaults();
        let host = reg.platform_with_id(&PlatformId::HOST).unwrap();
        assert_eq!(reg.compiler_for_platform(&host).unwrap().name, "host-jit");
        assert_eq!(
            reg.compilation_device(&DeviceType::CPU).unwrap().compilation_device_name,
            DeviceType::CPU_JIT
        );
    }

    #[test]
    fn missing_platform_is_not_found() {
        let reg = InMemoryBackendRegistry::new();
        let err = reg.platform_with_id(&PlatformId::new("rocm")).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("rocm"));
    }

    #[test]
    fn missing_compiler_is_not_found() {
        let reg = InMemoryBackendRegistry::new().with_platform(cuda());
        let err = reg.compiler_for_platform(&cuda()).unwrap_err();
        assert!(matches!(err, RegistryError::CompilerNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn unavailable_compiler_is_not_not_found() {
        let reg = InMemoryBackendRegistry::new()
            .with_platform(cuda())
            .with_compiler(PlatformId::new("cuda"), "ptx");
        reg.mark_compiler_unavailable(PlatformId::new("cuda"), "driver crashed");

        let err = reg.compiler_for_platform(&cuda()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.is_not_found());

        reg.register_compiler(PlatformId::new("cuda"), "ptx");
        assert!(reg.compiler_for_platform(&cuda()).is_ok());
    }

    #[test]
    fn unregistered_compilation_device() {
        let reg = InMemoryBackendRegistry::with_defaults();
        assert!(reg.compilation_device(&DeviceType::TPU).is_none());
    }

    #[test]
    fn platform_ids_sorted() {
        let reg = InMemoryBackendRegistry::with_defaults().with_platform(cuda());
        assert_eq!(
            reg.platform_ids(),
            vec![PlatformId::new("cuda"), PlatformId::HOST]
        );
    }
}
