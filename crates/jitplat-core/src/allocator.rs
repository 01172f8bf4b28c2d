//! Device memory allocators.
//!
//! Two layers are modeled:
//! - [`Allocator`]: the raw allocator a device hands out. It reports failure
//!   as `None` and knows nothing about platforms.
//! - [`DeviceMemoryAllocator`]: a platform-aware allocator addressed by device
//!   ordinal, reporting failure as a typed error.
//!
//! [`AllocatorAdapter`] lifts the former into the latter, bound either to a
//! platform (host execution) or to an execution stream.
//! [`BackendMemoryAllocator`] is the allocator owned by a backend client.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::device::Stream;
use crate::error::{CoreError, Result};
use crate::platform::{Platform, PlatformId};

/// Alignment requested from raw allocators.
pub const ALLOCATOR_ALIGNMENT: usize = 64;

/// Raw allocator exposed by a device.
pub trait Allocator: fmt::Debug + Send + Sync {
    /// Allocator name, for diagnostics.
    fn name(&self) -> &str;

    /// Allocate `size` bytes. Returns an opaque handle, or `None` if the
    /// request cannot be satisfied.
    fn allocate_raw(&self, alignment: usize, size: u64) -> Option<u64>;

    /// Release a handle returned by [`Allocator::allocate_raw`].
    fn deallocate_raw(&self, handle: u64);
}

/// A live device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceMemory {
    /// Opaque buffer handle. Zero for empty buffers.
    pub handle: u64,
    /// Buffer size in bytes.
    pub size: u64,
    /// Device the buffer lives on.
    pub device_ordinal: i32,
}

impl DeviceMemory {
    /// An empty buffer on `device_ordinal`.
    pub fn empty(device_ordinal: i32) -> Self {
        Self {
            handle: 0,
            size: 0,
            device_ordinal,
        }
    }

    /// Whether this is an empty buffer.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Platform-aware device memory allocator.
pub trait DeviceMemoryAllocator: fmt::Debug + Send + Sync {
    /// Platform this allocator allocates for.
    fn platform_id(&self) -> &PlatformId;

    /// Allocate `size` bytes on `device_ordinal`.
    fn allocate(&self, device_ordinal: i32, size: u64) -> Result<DeviceMemory>;

    /// Release a buffer returned by [`DeviceMemoryAllocator::allocate`].
    fn deallocate(&self, memory: DeviceMemory) -> Result<()>;

    /// The stream allocations on `device_ordinal` are ordered against.
    fn stream(&self, device_ordinal: i32) -> Result<Arc<dyn Stream>>;
}

/// What an [`AllocatorAdapter`] is bound to.
#[derive(Debug, Clone)]
pub enum AllocatorBinding {
    /// Host execution: bound to a platform, no stream.
    Platform(Platform),
    /// Accelerator execution: bound to a stream.
    Stream(Arc<dyn Stream>),
}

/// Adapts a device's raw [`Allocator`] to [`DeviceMemoryAllocator`].
///
/// The wrapped allocator is shared, not owned: dropping the adapter only
/// drops the adapter's reference and its binding.
#[derive(Debug)]
pub struct AllocatorAdapter {
    wrapped: Arc<dyn Allocator>,
    binding: AllocatorBinding,
    platform_id: PlatformId,
}

impl AllocatorAdapter {
    /// Bind `wrapped` to a platform.
    pub fn for_platform(wrapped: Arc<dyn Allocator>, platform: Platform) -> Self {
        let platform_id = platform.id.clone();
        Self {
            wrapped,
            binding: AllocatorBinding::Platform(platform),
            platform_id,
        }
    }

    /// Bind `wrapped` to a stream; the platform is the stream's platform.
    pub fn for_stream(wrapped: Arc<dyn Allocator>, stream: Arc<dyn Stream>) -> Self {
        let platform_id = stream.platform_id();
        Self {
            wrapped,
            binding: AllocatorBinding::Stream(stream),
            platform_id,
        }
    }

    /// The binding added by this adapter.
    pub fn binding(&self) -> &AllocatorBinding {
        &self.binding
    }

    /// The wrapped raw allocator.
    pub fn wrapped(&self) -> &Arc<dyn Allocator> {
        &self.wrapped
    }
}

impl DeviceMemoryAllocator for AllocatorAdapter {
    fn platform_id(&self) -> &PlatformId {
        &self.platform_id
    }

    fn allocate(&self, device_ordinal: i32, size: u64) -> Result<DeviceMemory> {
        if size == 0 {
            return Ok(DeviceMemory::empty(device_ordinal));
        }
        let handle = self
            .wrapped
            .allocate_raw(ALLOCATOR_ALIGNMENT, size)
            .ok_or_else(|| CoreError::ResourceExhausted {
                bytes: size,
                ordinal: device_ordinal,
                platform: self.platform_id.to_string(),
            })?;
        Ok(DeviceMemory {
            handle,
            size,
            device_ordinal,
        })
    }

    fn deallocate(&self, memory: DeviceMemory) -> Result<()> {
        if !memory.is_empty() {
            self.wrapped.deallocate_raw(memory.handle);
        }
        Ok(())
    }

    fn stream(&self, _device_ordinal: i32) -> Result<Arc<dyn Stream>> {
        match &self.binding {
            AllocatorBinding::Stream(stream) => Ok(Arc::clone(stream)),
            AllocatorBinding::Platform(_) => Err(CoreError::NoStream {
                platform: self.platform_id.to_string(),
            }),
        }
    }
}

/// Allocator owned by a backend client.
///
/// Tracks usage per device against the platform's `memory_per_device`, so an
/// exhausted device yields an out-of-memory error naming the exact request.
#[derive(Debug)]
pub struct BackendMemoryAllocator {
    platform: Platform,
    next_handle: AtomicU64,
    state: Mutex<AllocationState>,
}

#[derive(Debug, Default)]
struct AllocationState {
    in_use: HashMap<i32, u64>,
    live: HashMap<u64, DeviceMemory>,
}

impl BackendMemoryAllocator {
    /// Create an allocator for `platform`.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            next_handle: AtomicU64::new(1),
            state: Mutex::new(AllocationState::default()),
        }
    }

    /// Bytes currently allocated on `device_ordinal`.
    pub fn bytes_in_use(&self, device_ordinal: i32) -> u64 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.in_use.get(&device_ordinal).copied().unwrap_or(0)
    }
}

impl DeviceMemoryAllocator for BackendMemoryAllocator {
    fn platform_id(&self) -> &PlatformId {
        &self.platform.id
    }

    fn allocate(&self, device_ordinal: i32, size: u64) -> Result<DeviceMemory> {
        if !self.platform.has_device(device_ordinal) {
            return Err(CoreError::DeviceOrdinalOutOfRange {
                ordinal: device_ordinal,
                platform: self.platform.name.clone(),
                device_count: self.platform.device_count,
            });
        }
        if size == 0 {
            return Ok(DeviceMemory::empty(device_ordinal));
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let used = state.in_use.get(&device_ordinal).copied().unwrap_or(0);
        if used.saturating_add(size) > self.platform.memory_per_device {
            return Err(CoreError::ResourceExhausted {
                bytes: size,
                ordinal: device_ordinal,
                platform: self.platform.name.clone(),
            });
        }

        let memory = DeviceMemory {
            handle: self.next_handle.fetch_add(1, Ordering::Relaxed),
            size,
            device_ordinal,
        };
        state.in_use.insert(device_ordinal, used + size);
        state.live.insert(memory.handle, memory);
        Ok(memory)
    }

    fn deallocate(&self, memory: DeviceMemory) -> Result<()> {
        if memory.is_empty() {
            return Ok(());
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let live = state
            .live
            .remove(&memory.handle)
            .ok_or(CoreError::UnknownBuffer {
                handle: memory.handle,
            })?;
        if let Some(used) = state.in_use.get_mut(&live.device_ordinal) {
            *used -= live.size;
        }
        Ok(())
    }

    fn stream(&self, _device_ordinal: i32) -> Result<Arc<dyn Stream>> {
        Err(CoreError::NoStream {
            platform: self.platform.name.clone(),
        })
    }
}
