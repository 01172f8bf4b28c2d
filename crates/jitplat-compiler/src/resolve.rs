//! Compiler resolution: picks or builds the JIT compiler for a device.

use std::sync::Arc;

use jitplat_core::{
    parse_visible_device_list, AllowedDevices, BackendClientOptions, Device, DeviceType,
    PlatformInfo, RuntimeContext,
};
use jitplat_registry::{BackendClientCache, BackendRegistry};
use tracing::{debug, warn};

use crate::compiler::{create_device_compiler, DeviceCompiler};
use crate::error::{CompilerError, Result};
use crate::persistor::PersistorConfig;

/// Resolves device compilers against a backend registry, sharing backend
/// clients through a client cache.
#[derive(Clone)]
pub struct CompilerResolver {
    registry: Arc<dyn BackendRegistry>,
    clients: Arc<BackendClientCache>,
}

impl CompilerResolver {
    pub fn new(registry: Arc<dyn BackendRegistry>, clients: Arc<BackendClientCache>) -> Self {
        Self { registry, clients }
    }

    pub fn registry(&self) -> &Arc<dyn BackendRegistry> {
        &self.registry
    }

    pub fn clients(&self) -> &Arc<BackendClientCache> {
        &self.clients
    }

    /// Resolve the compiler for `device`.
    ///
    /// In priority order:
    /// 1. Devices with metadata compile through the metadata's own
    ///    compilation device and client, with no registry lookups.
    /// 2. TPUs without metadata get a client-less `TPU_JIT` compiler.
    /// 3. Everything else goes through the registry: platform, compiler
    ///    backend, shared backend client, compilation device.
    ///
    /// A platform without a compiler backend yields
    /// [`CompilerError::Unimplemented`], which callers treat as "run
    /// uncompiled" rather than as fatal.
    pub fn resolve(
        &self,
        device: &dyn Device,
        context: &RuntimeContext,
        platform_info: &PlatformInfo,
        persistor_config: &PersistorConfig,
    ) -> Result<DeviceCompiler> {
        if let Some(metadata) = platform_info.device_metadata() {
            debug!(device = device.name(), "resolving compiler from device metadata");
            return Ok(create_device_compiler(
                persistor_config,
                metadata.jit_device_type().clone(),
                Some(Arc::clone(metadata.client())),
            ));
        }

        if platform_info.device_type() == &DeviceType::TPU {
            debug!(device = device.name(), "resolving headless TPU compiler");
            return Ok(create_device_compiler(persistor_config, DeviceType::TPU_JIT, None));
        }

        let platform_id = platform_info
            .platform_id()
            .ok_or_else(|| CompilerError::PlatformUnresolved {
                device: device.name().to_string(),
                device_type: platform_info.device_type().clone(),
            })?;
        let platform = self.registry.platform_with_id(platform_id)?;

        if let Err(e) = self.registry.compiler_for_platform(&platform) {
            if e.is_not_found() {
                warn!(platform = %platform.name, "no compiler backend; falling back");
                return Err(CompilerError::Unimplemented {
                    platform: platform.name.clone(),
                    source: e,
                });
            }
            return Err(e.into());
        }

        let options = BackendClientOptions::new(platform)
            .with_intra_op_parallelism_threads(device.worker_threads())
            .with_allowed_devices(allowed_devices(context)?);
        let client = self.clients.get_or_create(&options)?;

        let registration = self
            .registry
            .compilation_device(platform_info.device_type())
            .ok_or_else(|| CompilerError::NoJitDevice {
                device_type: platform_info.device_type().clone(),
            })?;

        debug!(
            device = device.name(),
            compilation_device = %registration.compilation_device_name,
            client = %client.id(),
            "resolved compiler through registry"
        );
        Ok(create_device_compiler(
            persistor_config,
            registration.compilation_device_name,
            Some(client),
        ))
    }
}

/// The accelerator allow-list of the session, if it configures one.
fn allowed_devices(context: &RuntimeContext) -> Result<AllowedDevices> {
    match context.config() {
        Some(config) => Ok(parse_visible_device_list(
            &config.gpu_options.visible_device_list,
        )?),
        None => Ok(None),
    }
}
