//! Runtime context handed to compiler resolution.

use serde::{Deserialize, Serialize};

/// GPU-specific session options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuOptions {
    /// Comma-separated list of visible accelerator ordinals.
    #[serde(default)]
    pub visible_device_list: String,
}

/// Session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub gpu_options: GpuOptions,
}

/// The runtime context of a function invocation.
#[derive(Debug, Clone, Default)]
pub struct RuntimeContext {
    config: Option<SessionConfig>,
}

impl RuntimeContext {
    /// A context with no session configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context carrying `config`.
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config: Some(config),
        }
    }

    /// A context whose configuration only sets the visible device list.
    pub fn with_visible_devices(visible_device_list: impl Into<String>) -> Self {
        Self::with_config(SessionConfig {
            gpu_options: GpuOptions {
                visible_device_list: visible_device_list.into(),
            },
        })
    }

    /// The session configuration, if any.
    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }
}
