//! `*.topology.toml` parsing: platforms, compilers, and devices to resolve.
//!
//! ```toml
//! [[platform]]
//! id = "cuda"
//! name = "CUDA"
//! device-count = 2
//! memory-per-device = 8589934592
//! compiler = "ptx"
//!
//! [[compilation-device]]
//! device-type = "GPU"
//! compilation-device = "GPU_JIT"
//!
//! [[device]]
//! name = "gpu:0"
//! type = "GPU"
//! stream-platform = "cuda"
//!
//! [session.gpu_options]
//! visible_device_list = "0"
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use jitplat_core::sim::{HostAllocator, SimDevice, SimStream, DEFAULT_ALLOCATOR_CAPACITY};
use jitplat_core::{
    BackendClientOptions, DeviceMetadata, DeviceType, Platform, PlatformId, RuntimeContext,
    SessionConfig,
};
use jitplat_registry::{BackendClientCache, BackendRegistry, InMemoryBackendRegistry};
use serde::{Deserialize, Serialize};

/// A device topology description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Topology {
    /// Start from the host platform and standard CPU/GPU registrations.
    #[serde(default = "default_true")]
    pub include_defaults: bool,
    #[serde(default, rename = "platform")]
    pub platforms: Vec<PlatformSpec>,
    #[serde(default, rename = "compilation-device")]
    pub compilation_devices: Vec<CompilationDeviceSpec>,
    #[serde(default, rename = "device")]
    pub devices: Vec<DeviceSpec>,
    /// Session configuration shared by every device.
    #[serde(default)]
    pub session: Option<SessionConfig>,
}

fn default_true() -> bool {
    true
}

/// A platform and, optionally, its compiler backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformSpec {
    #[serde(flatten)]
    pub platform: Platform,
    /// Compiler backend name. Absent means no compiler is linked in.
    #[serde(default)]
    pub compiler: Option<String>,
}

/// A device-type to compilation-device registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompilationDeviceSpec {
    pub device_type: DeviceType,
    pub compilation_device: DeviceType,
}

/// A device to resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Platform owning the device's accelerator stream.
    #[serde(default)]
    pub stream_platform: Option<PlatformId>,
    #[serde(default)]
    pub stream_ordinal: i32,
    #[serde(default)]
    pub allocator_capacity: Option<u64>,
    /// Specialized-accelerator metadata.
    #[serde(default)]
    pub metadata: Option<MetadataSpec>,
}

/// Metadata published by a specialized accelerator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MetadataSpec {
    pub platform: PlatformId,
    pub jit_device_type: DeviceType,
}

impl Topology {
    /// Load a topology from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse a topology from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Build the backend registry the topology describes.
    pub fn registry(&self) -> InMemoryBackendRegistry {
        let registry = if self.include_defaults {
            InMemoryBackendRegistry::with_defaults()
        } else {
            InMemoryBackendRegistry::new()
        };
        for spec in &self.platforms {
            registry.register_platform(spec.platform.clone());
            if let Some(compiler) = &spec.compiler {
                registry.register_compiler(spec.platform.id.clone(), compiler.clone());
            }
        }
        for spec in &self.compilation_devices {
            registry.register_compilation_device(
                spec.device_type.clone(),
                spec.compilation_device.clone(),
            );
        }
        registry
    }

    /// The runtime context every device is resolved under.
    pub fn context(&self) -> RuntimeContext {
        match &self.session {
            Some(config) => RuntimeContext::with_config(config.clone()),
            None => RuntimeContext::new(),
        }
    }

    /// Instantiate the devices. Backend clients for specialized devices are
    /// taken from `clients`.
    pub fn devices(
        &self,
        registry: &dyn BackendRegistry,
        clients: &BackendClientCache,
    ) -> Result<Vec<SimDevice>> {
        self.devices
            .iter()
            .map(|spec| spec.build(registry, clients))
            .collect()
    }
}

impl DeviceSpec {
    fn build(
        &self,
        registry: &dyn BackendRegistry,
        clients: &BackendClientCache,
    ) -> Result<SimDevice> {
        let capacity = self.allocator_capacity.unwrap_or(DEFAULT_ALLOCATOR_CAPACITY);
        let mut device = SimDevice::new(self.name.clone(), self.device_type.clone())
            .with_allocator(Arc::new(HostAllocator::new(
                format!("{}_allocator", self.name),
                capacity,
            )));
        if let Some(threads) = self.worker_threads {
            device = device.with_worker_threads(threads);
        }
        if let Some(platform) = &self.stream_platform {
            device = device.with_stream(Arc::new(SimStream::new(
                platform.clone(),
                self.stream_ordinal,
            )));
        }
        if let Some(spec) = &self.metadata {
            let platform = registry
                .platform_with_id(&spec.platform)
                .with_context(|| format!("metadata of device {}", self.name))?;
            if platform.device_count == 0 {
                bail!(
                    "metadata of device {} names platform {} with no devices",
                    self.name,
                    platform.name
                );
            }
            let client = clients
                .get_or_create(&BackendClientOptions::new(platform))
                .with_context(|| format!("creating backend client for device {}", self.name))?;
            device = device.with_metadata(Arc::new(DeviceMetadata::new(
                spec.jit_device_type.clone(),
                client,
            )));
        }
        Ok(device)
    }
}
