//! In-memory devices, streams, and allocators.
//!
//! Suitable for tests and for driving resolution from a static topology
//! description. They model only what resolution observes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::allocator::Allocator;
use crate::device::{Device, Stream};
use crate::device_type::DeviceType;
use crate::metadata::DeviceMetadata;
use crate::platform::PlatformId;

/// Default worker-thread pool size of a [`SimDevice`].
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Default capacity of the allocator a [`SimDevice`] is created with.
pub const DEFAULT_ALLOCATOR_CAPACITY: u64 = 1 << 30;

/// A stream owned by a fixed platform.
#[derive(Debug, Clone)]
pub struct SimStream {
    platform_id: PlatformId,
    device_ordinal: i32,
}

impl SimStream {
    pub fn new(platform_id: PlatformId, device_ordinal: i32) -> Self {
        Self {
            platform_id,
            device_ordinal,
        }
    }
}

impl Stream for SimStream {
    fn platform_id(&self) -> PlatformId {
        self.platform_id.clone()
    }

    fn device_ordinal(&self) -> i32 {
        self.device_ordinal
    }
}

/// Bounded allocator that hands out sequential handles.
#[derive(Debug)]
pub struct HostAllocator {
    name: String,
    capacity: u64,
    next_handle: AtomicU64,
    live: Mutex<HashMap<u64, u64>>,
}

impl HostAllocator {
    /// Create an allocator with `capacity` bytes.
    pub fn new(name: impl Into<String>, capacity: u64) -> Self {
        Self {
            name: name.into(),
            capacity,
            next_handle: AtomicU64::new(1),
            live: Mutex::new(HashMap::new()),
        }
    }

    /// Bytes currently allocated.
    pub fn bytes_in_use(&self) -> u64 {
        let live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        live.values().sum()
    }
}

impl Allocator for HostAllocator {
    fn name(&self) -> &str {
        &self.name
    }

    fn allocate_raw(&self, _alignment: usize, size: u64) -> Option<u64> {
        let mut live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        let used: u64 = live.values().sum();
        if used.saturating_add(size) > self.capacity {
            return None;
        }
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        live.insert(handle, size);
        Some(handle)
    }

    fn deallocate_raw(&self, handle: u64) {
        let mut live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        live.remove(&handle);
    }
}

/// A device assembled from plain values.
#[derive(Debug, Clone)]
pub struct SimDevice {
    name: String,
    device_type: DeviceType,
    worker_threads: usize,
    allocator: Arc<dyn Allocator>,
    stream: Option<Arc<dyn Stream>>,
    metadata: Option<Arc<DeviceMetadata>>,
}

impl SimDevice {
    /// A device with no stream and no metadata.
    pub fn new(name: impl Into<String>, device_type: DeviceType) -> Self {
        let name = name.into();
        let allocator = Arc::new(HostAllocator::new(
            format!("{name}_allocator"),
            DEFAULT_ALLOCATOR_CAPACITY,
        ));
        Self {
            name,
            device_type,
            worker_threads: DEFAULT_WORKER_THREADS,
            allocator,
            stream: None,
            metadata: None,
        }
    }

    /// A host CPU device.
    pub fn cpu(name: impl Into<String>) -> Self {
        Self::new(name, DeviceType::CPU)
    }

    /// A generic accelerator executing on `stream`.
    pub fn gpu(name: impl Into<String>, stream: Arc<dyn Stream>) -> Self {
        Self::new(name, DeviceType::GPU).with_stream(stream)
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn with_allocator(mut self, allocator: Arc<dyn Allocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn with_stream(mut self, stream: Arc<dyn Stream>) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_metadata(mut self, metadata: Arc<DeviceMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl Device for SimDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn device_type(&self) -> &DeviceType {
        &self.device_type
    }

    fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    fn default_allocator(&self) -> Arc<dyn Allocator> {
        Arc::clone(&self.allocator)
    }

    fn accelerator_stream(&self) -> Option<Arc<dyn Stream>> {
        self.stream.clone()
    }

    fn metadata(&self) -> Option<Arc<DeviceMetadata>> {
        self.metadata.clone()
    }
}
