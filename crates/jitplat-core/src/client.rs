//! Backend clients and their construction options.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::allocator::{BackendMemoryAllocator, DeviceMemoryAllocator};
use crate::error::{CoreError, Result};
use crate::platform::Platform;
use crate::visibility::AllowedDevices;

/// Options a backend client is constructed from.
///
/// Equality is structural; the backend client cache uses these options as its
/// key, so two equal option sets always share one client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendClientOptions {
    /// Platform the client compiles and executes for.
    pub platform: Platform,
    /// Threads for intra-op parallelism. Zero selects the backend default.
    pub intra_op_parallelism_threads: usize,
    /// Devices the client may use. `None` means every device.
    pub allowed_devices: AllowedDevices,
    /// Number of replicas compiled computations run on.
    pub number_of_replicas: usize,
}

impl BackendClientOptions {
    /// Options for `platform` with backend defaults.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            intra_op_parallelism_threads: 0,
            allowed_devices: None,
            number_of_replicas: 1,
        }
    }

    /// Set the intra-op thread count.
    pub fn with_intra_op_parallelism_threads(mut self, threads: usize) -> Self {
        self.intra_op_parallelism_threads = threads;
        self
    }

    /// Restrict the devices the client may use.
    pub fn with_allowed_devices(mut self, allowed: AllowedDevices) -> Self {
        self.allowed_devices = allowed;
        self
    }

    /// Set the replica count.
    pub fn with_number_of_replicas(mut self, replicas: usize) -> Self {
        self.number_of_replicas = replicas;
        self
    }
}

/// Unique identity of a constructed backend client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A constructed handle to a compiler and execution backend.
#[derive(Debug)]
pub struct BackendClient {
    id: ClientId,
    options: BackendClientOptions,
    devices: Vec<i32>,
    allocator: Arc<BackendMemoryAllocator>,
}

impl BackendClient {
    /// Construct a client on the allowed devices the platform has.
    ///
    /// Allowed ordinals the platform does not expose are skipped; it is an
    /// error only when no device is left.
    pub fn create(options: BackendClientOptions) -> Result<Self> {
        let platform = &options.platform;
        let devices: Vec<i32> = match &options.allowed_devices {
            Some(allowed) => allowed
                .iter()
                .copied()
                .filter(|&o| platform.has_device(o))
                .collect(),
            None => (0..platform.device_count)
                .filter_map(|o| i32::try_from(o).ok())
                .collect(),
        };
        if devices.is_empty() {
            return Err(CoreError::NoVisibleDevices {
                platform: platform.name.clone(),
            });
        }

        let allocator = Arc::new(BackendMemoryAllocator::new(platform.clone()));
        Ok(Self {
            id: ClientId(Uuid::new_v4()),
            options,
            devices,
            allocator,
        })
    }

    /// Unique client identity.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// The options the client was constructed from.
    pub fn options(&self) -> &BackendClientOptions {
        &self.options
    }

    /// The client's platform.
    pub fn platform(&self) -> &Platform {
        &self.options.platform
    }

    /// Ordinals of the devices this client may use, ascending.
    pub fn devices(&self) -> &[i32] {
        &self.devices
    }

    /// The lowest visible device ordinal.
    pub fn default_device_ordinal(&self) -> i32 {
        self.devices[0]
    }

    /// The backend's shared memory allocator.
    pub fn shared_memory_allocator(&self) -> Arc<dyn DeviceMemoryAllocator> {
        self.allocator.clone()
    }
}
