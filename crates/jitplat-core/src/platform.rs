//! Platform identities.
//!
//! A platform is an execution backend (the host CPU, a GPU family, ...)
//! addressed by an opaque [`PlatformId`]. Platforms are owned by the backend
//! registry; everything else refers to them by id or by shared value.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque platform identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformId(Cow<'static, str>);

impl PlatformId {
    /// The fixed identifier of the host platform.
    pub const HOST: PlatformId = PlatformId(Cow::Borrowed("host"));

    /// Create an identifier from an arbitrary string.
    pub fn new(id: impl Into<String>) -> Self {
        PlatformId(Cow::Owned(id.into()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered execution platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Platform {
    /// Platform identifier.
    pub id: PlatformId,
    /// Human-readable name (e.g., "Host", "CUDA").
    pub name: String,
    /// Number of devices the platform exposes.
    pub device_count: usize,
    /// Memory available on each device, in bytes.
    pub memory_per_device: u64,
}

impl Platform {
    /// Create a platform description.
    pub fn new(
        id: PlatformId,
        name: impl Into<String>,
        device_count: usize,
        memory_per_device: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            device_count,
            memory_per_device,
        }
    }

    /// The host platform: one device with a nominal 16 GiB of memory.
    pub fn host() -> Self {
        Self::new(PlatformId::HOST, "Host", 1, 16 * 1024 * 1024 * 1024)
    }

    /// Whether `ordinal` names a device of this platform.
    pub fn has_device(&self, ordinal: i32) -> bool {
        usize::try_from(ordinal).is_ok_and(|o| o < self.device_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_platform() {
        let p = Platform::host();
        assert_eq!(p.id, PlatformId::HOST);
        assert_eq!(p.device_count, 1);
        assert!(p.has_device(0));
        assert!(!p.has_device(1));
    }

    #[test]
    fn negative_ordinals_are_never_devices() {
        let p = Platform::new(PlatformId::new("cuda"), "CUDA", 4, 1 << 30);
        assert!(p.has_device(3));
        assert!(!p.has_device(-1));
        assert!(!p.has_device(4));
    }

    #[test]
    fn id_display() {
        assert_eq!(PlatformId::new("rocm").to_string(), "rocm");
        assert_eq!(PlatformId::HOST.as_str(), "host");
    }
}
