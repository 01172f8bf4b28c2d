//! Allocator selection for resolved platforms.

use std::sync::Arc;

use jitplat_core::{AllocatorAdapter, Device, DeviceMemoryAllocator, PlatformInfo, Stream};
use jitplat_registry::BackendRegistry;
use tracing::debug;

use crate::error::{CompilerError, Result};

/// Pick the allocator compiled code should allocate through.
///
/// A custom allocator on `platform_info` wins outright. Otherwise the
/// device's default allocator is adapted: bound to the platform when no
/// stream is given (host execution), bound to `stream` otherwise.
pub fn select_allocator(
    device: &dyn Device,
    stream: Option<Arc<dyn Stream>>,
    platform_info: &PlatformInfo,
    registry: &dyn BackendRegistry,
) -> Result<Arc<dyn DeviceMemoryAllocator>> {
    if let Some(custom) = platform_info.custom_allocator() {
        debug!(device = device.name(), "using custom allocator");
        return Ok(Arc::clone(custom));
    }

    let allocator = device.default_allocator();
    match stream {
        None => {
            let platform_id = platform_info
                .platform_id()
                .ok_or_else(|| CompilerError::PlatformUnresolved {
                    device: device.name().to_string(),
                    device_type: platform_info.device_type().clone(),
                })?;
            let platform = registry.platform_with_id(platform_id)?;
            debug!(
                device = device.name(),
                allocator = allocator.name(),
                platform = %platform.name,
                "adapting default allocator to platform"
            );
            Ok(Arc::new(AllocatorAdapter::for_platform(allocator, platform)))
        }
        Some(stream) => {
            debug!(
                device = device.name(),
                allocator = allocator.name(),
                "adapting default allocator to stream"
            );
            Ok(Arc::new(AllocatorAdapter::for_stream(allocator, stream)))
        }
    }
}
