//! Logical device type tags.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A logical device type tag such as `"CPU"` or `"GPU"`.
///
/// Tags double as compilation-device names: a compilation device is itself a
/// `DeviceType` naming the backend that compiles ops for a logical device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceType(Cow<'static, str>);

impl DeviceType {
    /// Host CPU.
    pub const CPU: DeviceType = DeviceType(Cow::Borrowed("CPU"));
    /// Generic accelerator.
    pub const GPU: DeviceType = DeviceType(Cow::Borrowed("GPU"));
    /// Tensor processing unit.
    pub const TPU: DeviceType = DeviceType(Cow::Borrowed("TPU"));
    /// Compilation device for host code.
    pub const CPU_JIT: DeviceType = DeviceType(Cow::Borrowed("CPU_JIT"));
    /// Compilation device for generic accelerators.
    pub const GPU_JIT: DeviceType = DeviceType(Cow::Borrowed("GPU_JIT"));
    /// Compilation device used for TPUs that carry no device metadata.
    pub const TPU_JIT: DeviceType = DeviceType(Cow::Borrowed("TPU_JIT"));

    /// Create a device type from an arbitrary tag.
    pub fn new(tag: impl Into<String>) -> Self {
        DeviceType(Cow::Owned(tag.into()))
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceType {
    fn from(tag: &str) -> Self {
        DeviceType::new(tag)
    }
}
