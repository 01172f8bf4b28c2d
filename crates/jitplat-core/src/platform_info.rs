//! Platform identity resolution for devices.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::allocator::DeviceMemoryAllocator;
use crate::device::Device;
use crate::device_type::DeviceType;
use crate::metadata::DeviceMetadata;
use crate::platform::PlatformId;

/// How a device was classified. Decided once, when the [`PlatformInfo`] is
/// built.
#[derive(Debug, Clone)]
pub enum PlatformClass {
    /// The host CPU.
    Host,
    /// A generic accelerator addressed through its execution stream.
    GenericAccelerator,
    /// A device publishing its own metadata and backend allocator.
    SpecializedAccelerator {
        metadata: Arc<DeviceMetadata>,
        allocator: Arc<dyn DeviceMemoryAllocator>,
    },
    /// None of the above; the platform id is unset.
    Unresolved,
}

/// Immutable platform descriptor for one device.
#[derive(Debug, Clone)]
pub struct PlatformInfo {
    device_type: DeviceType,
    platform_id: Option<PlatformId>,
    class: PlatformClass,
}

impl PlatformInfo {
    /// Assemble a descriptor directly.
    pub fn new(
        device_type: DeviceType,
        platform_id: Option<PlatformId>,
        class: PlatformClass,
    ) -> Self {
        Self {
            device_type,
            platform_id,
            class,
        }
    }

    /// The device's type tag.
    pub fn device_type(&self) -> &DeviceType {
        &self.device_type
    }

    /// The resolved platform, if any.
    pub fn platform_id(&self) -> Option<&PlatformId> {
        self.platform_id.as_ref()
    }

    /// The device classification.
    pub fn class(&self) -> &PlatformClass {
        &self.class
    }

    /// Specialized-accelerator metadata, when the device has it.
    pub fn device_metadata(&self) -> Option<&Arc<DeviceMetadata>> {
        match &self.class {
            PlatformClass::SpecializedAccelerator { metadata, .. } => Some(metadata),
            _ => None,
        }
    }

    /// The allocator to use instead of the device's default one.
    pub fn custom_allocator(&self) -> Option<&Arc<dyn DeviceMemoryAllocator>> {
        match &self.class {
            PlatformClass::SpecializedAccelerator { allocator, .. } => Some(allocator),
            _ => None,
        }
    }
}

/// Classify `device` and resolve its platform.
///
/// Host CPUs map to [`PlatformId::HOST`], generic accelerators to the
/// platform owning their stream, and devices with metadata to the metadata's
/// platform and backend allocator. Anything else leaves the platform unset.
pub fn resolve_platform_info(device: &dyn Device) -> PlatformInfo {
    let device_type = device.device_type().clone();

    if device_type == DeviceType::CPU {
        debug!(device = device.name(), "resolved host platform");
        return PlatformInfo::new(device_type, Some(PlatformId::HOST), PlatformClass::Host);
    }

    if device_type == DeviceType::GPU {
        let platform_id = device.accelerator_stream().map(|s| s.platform_id());
        if platform_id.is_none() {
            warn!(device = device.name(), "accelerator has no stream; platform unresolved");
        }
        debug!(device = device.name(), platform = ?platform_id, "resolved accelerator platform");
        return PlatformInfo::new(device_type, platform_id, PlatformClass::GenericAccelerator);
    }

    if let Some(metadata) = device.metadata() {
        let platform_id = metadata.platform().id.clone();
        let allocator = metadata.shared_memory_allocator();
        debug!(
            device = device.name(),
            platform = %platform_id,
            jit_device = %metadata.jit_device_type(),
            "resolved platform from device metadata"
        );
        return PlatformInfo::new(
            device_type,
            Some(platform_id),
            PlatformClass::SpecializedAccelerator {
                metadata,
                allocator,
            },
        );
    }

    warn!(device = device.name(), device_type = %device_type, "no platform for device");
    PlatformInfo::new(device_type, None, PlatformClass::Unresolved)
}
