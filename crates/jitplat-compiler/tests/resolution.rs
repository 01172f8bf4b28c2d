//! End-to-end compiler resolution across every device class.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use jitplat_compiler::{CompilerError, CompilerResolver, DeviceCompilerCache, PersistorConfig};
use jitplat_core::sim::{SimDevice, SimStream};
use jitplat_core::{
    resolve_platform_info, BackendClient, BackendClientOptions, DeviceMetadata, DeviceType,
    ErrorKind, Platform, PlatformId, RuntimeContext,
};
use jitplat_registry::{
    BackendClientCache, BackendRegistry, CompilerBackend, DeviceRegistration,
    InMemoryBackendRegistry, RegistryError,
};

/// Registry wrapper counting every lookup.
#[derive(Default)]
struct CountingRegistry {
    inner: InMemoryBackendRegistry,
    lookups: AtomicUsize,
}

impl CountingRegistry {
    fn new(inner: InMemoryBackendRegistry) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl BackendRegistry for CountingRegistry {
    fn platform_with_id(&self, id: &PlatformId) -> Result<Platform, RegistryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.platform_with_id(id)
    }

    fn compiler_for_platform(
        &self,
        platform: &Platform,
    ) -> Result<CompilerBackend, RegistryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.compiler_for_platform(platform)
    }

    fn compilation_device(&self, device_type: &DeviceType) -> Option<DeviceRegistration> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.compilation_device(device_type)
    }
}

fn cuda() -> Platform {
    Platform::new(PlatformId::new("cuda"), "CUDA", 4, 8 << 30)
}

fn full_registry() -> InMemoryBackendRegistry {
    InMemoryBackendRegistry::with_defaults()
        .with_platform(cuda())
        .with_compiler(PlatformId::new("cuda"), "ptx")
}

fn setup(registry: InMemoryBackendRegistry) -> (Arc<CountingRegistry>, CompilerResolver) {
    let registry = Arc::new(CountingRegistry::new(registry));
    let resolver = CompilerResolver::new(registry.clone(), Arc::new(BackendClientCache::new()));
    (registry, resolver)
}

fn gpu_device(name: &str) -> SimDevice {
    SimDevice::gpu(name, Arc::new(SimStream::new(PlatformId::new("cuda"), 0)))
}

#[test]
fn metadata_branch_skips_registry() {
    let (registry, resolver) = setup(InMemoryBackendRegistry::new());
    let npu = Platform::new(PlatformId::new("npu"), "NPU", 2, 1 << 30);
    let client = Arc::new(BackendClient::create(BackendClientOptions::new(npu)).unwrap());
    let metadata = Arc::new(DeviceMetadata::new(
        DeviceType::new("NPU_JIT"),
        Arc::clone(&client),
    ));
    let device = SimDevice::new("npu:0", DeviceType::new("NPU")).with_metadata(metadata);
    let info = resolve_platform_info(&device);

    let compiler = resolver
        .resolve(&device, &RuntimeContext::new(), &info, &PersistorConfig::default())
        .unwrap();

    assert_eq!(compiler.device_type(), &DeviceType::new("NPU_JIT"));
    assert!(Arc::ptr_eq(compiler.client().backend_client().unwrap(), &client));
    assert_eq!(registry.lookups(), 0);
    assert!(resolver.clients().is_empty());
}

#[test]
fn metadata_wins_over_tpu_tag() {
    let (registry, resolver) = setup(InMemoryBackendRegistry::new());
    let client =
        Arc::new(BackendClient::create(BackendClientOptions::new(Platform::host())).unwrap());
    let metadata = Arc::new(DeviceMetadata::new(DeviceType::new("TPU_SYSTEM_JIT"), client));
    let device = SimDevice::new("tpu:0", DeviceType::TPU).with_metadata(metadata);
    let info = resolve_platform_info(&device);

    let compiler = resolver
        .resolve(&device, &RuntimeContext::new(), &info, &PersistorConfig::default())
        .unwrap();
    assert_eq!(compiler.device_type(), &DeviceType::new("TPU_SYSTEM_JIT"));
    assert_eq!(registry.lookups(), 0);
}

#[test]
fn headless_tpu_uses_fixed_jit_device() {
    for registry in [InMemoryBackendRegistry::new(), full_registry()] {
        let (registry, resolver) = setup(registry);
        let device = SimDevice::new("tpu:0", DeviceType::TPU);
        let info = resolve_platform_info(&device);

        let compiler = resolver
            .resolve(&device, &RuntimeContext::new(), &info, &PersistorConfig::default())
            .unwrap();
        assert_eq!(compiler.device_type(), &DeviceType::TPU_JIT);
        assert!(compiler.client().backend_client().is_none());
        assert_eq!(registry.lookups(), 0);
    }
}

#[test]
fn accelerator_resolves_registered_compilation_device() {
    let (_, resolver) = setup(full_registry());
    let device = gpu_device("gpu:0").with_worker_threads(12);
    let info = resolve_platform_info(&device);
    let config = PersistorConfig::new("/var/cache/jit", true, "gpu");

    let compiler = resolver
        .resolve(&device, &RuntimeContext::with_visible_devices("1,3"), &info, &config)
        .unwrap();

    assert_eq!(compiler.device_type(), &DeviceType::GPU_JIT);
    assert_eq!(compiler.persistor().config(), &config);
    let client = compiler.client().backend_client().unwrap();
    assert_eq!(client.platform(), &cuda());
    assert_eq!(client.devices(), &[1, 3]);
    assert_eq!(client.options().intra_op_parallelism_threads, 12);
}

#[test]
fn missing_compiler_backend_is_recoverable() {
    let registry = InMemoryBackendRegistry::with_defaults().with_platform(cuda());
    let (_, resolver) = setup(registry);
    let device = gpu_device("gpu:0");
    let info = resolve_platform_info(&device);

    let err = resolver
        .resolve(&device, &RuntimeContext::new(), &info, &PersistorConfig::default())
        .unwrap_err();

    assert!(err.is_recoverable());
    assert_eq!(err.kind(), ErrorKind::Unimplemented);
    let msg = err.to_string();
    assert!(msg.contains("Could not find compiler for platform CUDA: NOT_FOUND: "));
    assert!(msg.contains("could not find registered compiler"));
    assert!(resolver.clients().is_empty());
}

#[test]
fn other_compiler_lookup_failures_are_surfaced() {
    let registry = full_registry();
    registry.mark_compiler_unavailable(PlatformId::new("cuda"), "backend init failed");
    let (_, resolver) = setup(registry);
    let device = gpu_device("gpu:0");
    let info = resolve_platform_info(&device);

    let err = resolver
        .resolve(&device, &RuntimeContext::new(), &info, &PersistorConfig::default())
        .unwrap_err();

    assert!(!err.is_recoverable());
    assert!(matches!(
        err,
        CompilerError::Registry(RegistryError::Unavailable { .. })
    ));
    assert!(resolver.clients().is_empty());
}

#[test]
fn unknown_platform_propagates_registry_error() {
    let (_, resolver) = setup(InMemoryBackendRegistry::with_defaults());
    let device = gpu_device("gpu:0");
    let info = resolve_platform_info(&device);

    let err = resolver
        .resolve(&device, &RuntimeContext::new(), &info, &PersistorConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        CompilerError::Registry(RegistryError::PlatformNotFound { .. })
    ));
}

#[test]
fn client_creation_failure_propagates() {
    let (_, resolver) = setup(full_registry());
    let device = gpu_device("gpu:0");
    let info = resolve_platform_info(&device);

    // cuda has ordinals 0..4; nothing is left once 9 is dropped.
    let context = RuntimeContext::with_visible_devices("9");

    let err = resolver
        .resolve(&device, &context, &info, &PersistorConfig::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
    assert!(matches!(
        err,
        CompilerError::Registry(RegistryError::ClientCreation(_))
    ));
}

#[test]
fn host_device_ignores_accelerator_ordinals_it_lacks() {
    let (_, resolver) = setup(full_registry());
    let device = SimDevice::cpu("cpu:0");
    let info = resolve_platform_info(&device);

    let compiler = resolver
        .resolve(
            &device,
            &RuntimeContext::with_visible_devices("0,1"),
            &info,
            &PersistorConfig::default(),
        )
        .unwrap();
    assert_eq!(compiler.device_type(), &DeviceType::CPU_JIT);
    let client = compiler.client().backend_client().unwrap();
    assert_eq!(client.platform().id, PlatformId::HOST);
    assert_eq!(client.devices(), &[0]);
}

#[test]
fn unregistered_compilation_device_is_invalid_argument() {
    let registry = InMemoryBackendRegistry::new()
        .with_platform(cuda())
        .with_compiler(PlatformId::new("cuda"), "ptx");
    let (_, resolver) = setup(registry);
    let device = gpu_device("gpu:0");
    let info = resolve_platform_info(&device);

    let err = resolver
        .resolve(&device, &RuntimeContext::new(), &info, &PersistorConfig::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.to_string(), "No JIT device registered for GPU");
    // The client was still built and cached before the registration lookup.
    assert_eq!(resolver.clients().len(), 1);
}

#[test]
fn devices_with_equal_options_share_client() {
    let (_, resolver) = setup(full_registry());
    let context = RuntimeContext::with_visible_devices("0,1");
    let config = PersistorConfig::default();

    let first = gpu_device("gpu:0");
    let second = gpu_device("gpu:1");
    let a = resolver
        .resolve(&first, &context, &resolve_platform_info(&first), &config)
        .unwrap();
    let b = resolver
        .resolve(&second, &context, &resolve_platform_info(&second), &config)
        .unwrap();

    assert_ne!(a.id(), b.id());
    assert!(Arc::ptr_eq(
        a.client().backend_client().unwrap(),
        b.client().backend_client().unwrap()
    ));
    assert_eq!(resolver.clients().statistics().created, 1);
}

#[test]
fn concurrent_resolution_constructs_one_client() {
    const THREADS: usize = 48;
    let (_, resolver) = setup(full_registry());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let resolver = resolver.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let device = gpu_device(&format!("gpu:{i}"));
                let info = resolve_platform_info(&device);
                let context = RuntimeContext::with_visible_devices("0,1,2,3");
                barrier.wait();
                let compiler = resolver
                    .resolve(&device, &context, &info, &PersistorConfig::default())
                    .unwrap();
                Arc::clone(compiler.client().backend_client().unwrap())
            })
        })
        .collect();

    let clients: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));

    let stats = resolver.clients().statistics();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, THREADS - 1);
}

#[test]
fn compiler_cache_shares_resolution_per_device_type() {
    let (registry, resolver) = setup(full_registry());
    let cache = DeviceCompilerCache::new();
    let device = SimDevice::cpu("cpu:0");
    let info = resolve_platform_info(&device);
    let context = RuntimeContext::new();
    let config = PersistorConfig::default();

    let a = cache
        .get_or_resolve(info.device_type(), || {
            resolver.resolve(&device, &context, &info, &config)
        })
        .unwrap();
    let lookups = registry.lookups();
    let b = cache
        .get_or_resolve(info.device_type(), || {
            resolver.resolve(&device, &context, &info, &config)
        })
        .unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(registry.lookups(), lookups);
    assert_eq!(a.device_type(), &DeviceType::CPU_JIT);
}
