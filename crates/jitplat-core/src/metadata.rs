//! Metadata exposed by specialized accelerators.

use std::sync::Arc;

use crate::allocator::DeviceMemoryAllocator;
use crate::client::BackendClient;
use crate::device_type::DeviceType;
use crate::platform::Platform;

/// Descriptor a specialized accelerator publishes about itself.
///
/// When present it takes precedence over registry-driven resolution: the
/// device already knows its platform, compilation device, and client.
#[derive(Debug, Clone)]
pub struct DeviceMetadata {
    platform: Platform,
    jit_device_type: DeviceType,
    client: Arc<BackendClient>,
}

impl DeviceMetadata {
    /// Create metadata for a device driven by `client`.
    pub fn new(jit_device_type: DeviceType, client: Arc<BackendClient>) -> Self {
        Self {
            platform: client.platform().clone(),
            jit_device_type,
            client,
        }
    }

    /// The device's platform.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Compilation device used for this accelerator.
    pub fn jit_device_type(&self) -> &DeviceType {
        &self.jit_device_type
    }

    /// The backend client driving the device.
    pub fn client(&self) -> &Arc<BackendClient> {
        &self.client
    }

    /// The backend's own allocator. It reports out-of-memory precisely,
    /// unlike the device's default allocator wrapper.
    pub fn shared_memory_allocator(&self) -> Arc<dyn DeviceMemoryAllocator> {
        self.client.shared_memory_allocator()
    }
}
