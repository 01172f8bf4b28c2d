//! Device and execution-stream abstractions.
//!
//! Devices are owned by the embedding runtime. This crate only reads the few
//! properties that platform and compiler resolution depend on.

use std::fmt;
use std::sync::Arc;

use crate::allocator::Allocator;
use crate::device_type::DeviceType;
use crate::metadata::DeviceMetadata;
use crate::platform::PlatformId;

/// An execution stream on an accelerator.
pub trait Stream: fmt::Debug + Send + Sync {
    /// Identifier of the platform owning the stream's executor.
    fn platform_id(&self) -> PlatformId;

    /// Ordinal of the device the stream executes on.
    fn device_ordinal(&self) -> i32;
}

/// A compute device as seen by platform and compiler resolution.
pub trait Device: fmt::Debug + Send + Sync {
    /// Device name (e.g., "/device:GPU:0").
    fn name(&self) -> &str;

    /// Logical device type tag.
    fn device_type(&self) -> &DeviceType;

    /// Size of the device's CPU worker-thread pool.
    fn worker_threads(&self) -> usize;

    /// The device's default allocator.
    fn default_allocator(&self) -> Arc<dyn Allocator>;

    /// The accelerator execution stream, for generic accelerators.
    fn accelerator_stream(&self) -> Option<Arc<dyn Stream>> {
        None
    }

    /// Specialized-accelerator metadata. Devices without it return `None`.
    fn metadata(&self) -> Option<Arc<DeviceMetadata>> {
        None
    }
}
