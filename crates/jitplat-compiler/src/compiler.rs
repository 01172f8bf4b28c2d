//! Device compilers and the factory that builds them.

use std::fmt;
use std::sync::Arc;

use jitplat_core::{BackendClient, DeviceType};
use tracing::info;
use uuid::Uuid;

use crate::persistor::{ExecutablePersistor, PersistorConfig};

/// Wraps the backend client a compiler compiles through.
///
/// Some compilers, such as the headless TPU compiler, have no client; the
/// wrapper tolerates that.
#[derive(Debug, Clone)]
pub struct CompilerClient {
    client: Option<Arc<BackendClient>>,
}

impl CompilerClient {
    pub fn new(client: Option<Arc<BackendClient>>) -> Self {
        Self { client }
    }

    pub fn backend_client(&self) -> Option<&Arc<BackendClient>> {
        self.client.as_ref()
    }

    /// Device compiled for by default, if a client is present.
    pub fn default_device_ordinal(&self) -> Option<i32> {
        self.client.as_ref().map(|c| c.default_device_ordinal())
    }
}

/// Unique identity of a device compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompilerId(Uuid);

impl fmt::Display for CompilerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A JIT compiler for one compilation device: a persistence layer plus a
/// backend client wrapper.
#[derive(Debug)]
pub struct DeviceCompiler {
    id: CompilerId,
    persistor: ExecutablePersistor,
    client: CompilerClient,
}

impl DeviceCompiler {
    pub fn new(persistor: ExecutablePersistor, client: CompilerClient) -> Self {
        Self {
            id: CompilerId(Uuid::new_v4()),
            persistor,
            client,
        }
    }

    pub fn id(&self) -> CompilerId {
        self.id
    }

    /// The compilation device.
    pub fn device_type(&self) -> &DeviceType {
        self.persistor.device_type()
    }

    pub fn persistor(&self) -> &ExecutablePersistor {
        &self.persistor
    }

    pub fn client(&self) -> &CompilerClient {
        &self.client
    }
}

/// Build a compiler for `device_type` from a persistence config and an
/// optional backend client. Inputs are not validated.
pub fn create_device_compiler(
    persistor_config: &PersistorConfig,
    device_type: DeviceType,
    client: Option<Arc<BackendClient>>,
) -> DeviceCompiler {
    let persistor = ExecutablePersistor::new(persistor_config.clone(), device_type);
    let compiler = DeviceCompiler::new(persistor, CompilerClient::new(client));
    info!(
        compiler = %compiler.id(),
        device_type = %compiler.device_type(),
        client = ?compiler.client().backend_client().map(|c| c.id()),
        persistent = compiler.persistor().is_enabled(),
        "created device compiler"
    );
    compiler
}
