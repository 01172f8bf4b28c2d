//! Device, platform, and allocator model for jitplat.
//!
//! Provides the types every other jitplat crate speaks in, plus the two
//! leaf operations of compiler resolution:
//! - [`parse_visible_device_list`]: turns a textual allow-list into a set of
//!   accelerator ordinals (or "no restriction").
//! - [`resolve_platform_info`]: classifies a device as host, generic
//!   accelerator, or specialized accelerator and fixes its platform identity.
//!
//! Devices, streams, and raw allocators are owned by the embedding runtime
//! and reached through the [`Device`], [`Stream`], and [`Allocator`] traits.
//! The [`sim`] module provides in-memory implementations.

pub mod allocator;
pub mod client;
pub mod context;
pub mod device;
pub mod device_type;
pub mod error;
pub mod metadata;
pub mod platform;
pub mod platform_info;
pub mod sim;
pub mod visibility;

// Re-exports for convenience.
pub use allocator::{
    Allocator, AllocatorAdapter, AllocatorBinding, BackendMemoryAllocator, DeviceMemory,
    DeviceMemoryAllocator,
};
pub use client::{BackendClient, BackendClientOptions, ClientId};
pub use context::{GpuOptions, RuntimeContext, SessionConfig};
pub use device::{Device, Stream};
pub use device_type::DeviceType;
pub use error::{CoreError, ErrorKind, Result};
pub use metadata::DeviceMetadata;
pub use platform::{Platform, PlatformId};
pub use platform_info::{resolve_platform_info, PlatformClass, PlatformInfo};
pub use visibility::{allow_list, parse_visible_device_list, AllowedDevices};
