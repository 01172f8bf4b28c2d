//! `jitplat resolve`: resolve platform info, compiler, and allocator for
//! every device of a topology.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use jitplat_compiler::{select_allocator, CompilerResolver, JitFlags, PersistorConfig};
use jitplat_core::{resolve_platform_info, Device, PlatformClass, PlatformInfo};
use jitplat_registry::{BackendClientCache, BackendRegistry};
use serde::Serialize;

use crate::topology::Topology;

/// Resolution result for one device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub device: String,
    pub device_type: String,
    pub class: &'static str,
    pub platform: Option<String>,
    pub compiler: CompilerOutcome,
    pub allocator: AllocatorOutcome,
}

/// Outcome of compiler resolution.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum CompilerOutcome {
    Compiled {
        compilation_device: String,
        backend_client: Option<String>,
        persistent: bool,
    },
    /// No compiler backend; the device runs uncompiled.
    Fallback { reason: String },
    Failed { error: String },
}

/// Outcome of allocator selection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum AllocatorOutcome {
    Selected { binding: String },
    Failed { error: String },
}

/// Run the `resolve` command.
pub fn run(
    topology: &Path,
    device: Option<&str>,
    flags: Option<&Path>,
    format: &str,
) -> Result<()> {
    let topo = Topology::load(topology)?;
    let flags = match flags {
        Some(path) => JitFlags::load(path)?,
        None => JitFlags::default(),
    }
    .with_env_overrides()
    .context("applying JIT flag overrides")?;

    let reports = build_report(&topo, device, &PersistorConfig::from_flags(&flags))?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&reports)?),
        "human" => print_human(&reports),
        other => bail!("unknown report format: {other} (expected 'human' or 'json')"),
    }

    let failed = reports.iter().filter(|r| r.has_failure()).count();
    if failed > 0 {
        bail!("{failed} device(s) failed to resolve");
    }
    Ok(())
}

/// Resolve every device of `topo`, or only the one named `only`.
pub fn build_report(
    topo: &Topology,
    only: Option<&str>,
    persistor_config: &PersistorConfig,
) -> Result<Vec<DeviceReport>> {
    let registry: Arc<dyn BackendRegistry> = Arc::new(topo.registry());
    let clients = Arc::new(BackendClientCache::new());
    let devices = topo.devices(registry.as_ref(), &clients)?;
    let resolver = CompilerResolver::new(Arc::clone(&registry), clients);
    let context = topo.context();

    let selected: Vec<_> = devices
        .iter()
        .filter(|d| only.map_or(true, |name| d.name() == name))
        .collect();
    if let Some(name) = only {
        if selected.is_empty() {
            bail!("device not found in topology: {name}");
        }
    }

    Ok(selected
        .into_iter()
        .map(|device| {
            let info = resolve_platform_info(device);
            let compiler = match resolver.resolve(device, &context, &info, persistor_config) {
                Ok(compiler) => CompilerOutcome::Compiled {
                    compilation_device: compiler.device_type().to_string(),
                    backend_client: compiler
                        .client()
                        .backend_client()
                        .map(|c| c.id().to_string()),
                    persistent: compiler.persistor().is_enabled(),
                },
                Err(e) if e.is_recoverable() => CompilerOutcome::Fallback {
                    reason: e.to_string(),
                },
                Err(e) => CompilerOutcome::Failed {
                    error: format!("{} ({})", e, e.kind()),
                },
            };
            let allocator = describe_allocator(device, &info, registry.as_ref());
            DeviceReport {
                device: device.name().to_string(),
                device_type: info.device_type().to_string(),
                class: class_name(info.class()),
                platform: info.platform_id().map(|p| p.to_string()),
                compiler,
                allocator,
            }
        })
        .collect())
}

fn describe_allocator(
    device: &dyn Device,
    info: &PlatformInfo,
    registry: &dyn BackendRegistry,
) -> AllocatorOutcome {
    let stream = device.accelerator_stream();
    let binding = match (info.custom_allocator(), &stream) {
        (Some(_), _) => "custom".to_string(),
        (None, Some(s)) => format!("stream {}:{}", s.platform_id(), s.device_ordinal()),
        (None, None) => "platform".to_string(),
    };
    match select_allocator(device, stream, info, registry) {
        Ok(allocator) => AllocatorOutcome::Selected {
            binding: format!("{binding} ({})", allocator.platform_id()),
        },
        Err(e) => AllocatorOutcome::Failed {
            error: e.to_string(),
        },
    }
}

fn class_name(class: &PlatformClass) -> &'static str {
    match class {
        PlatformClass::Host => "host",
        PlatformClass::GenericAccelerator => "generic-accelerator",
        PlatformClass::SpecializedAccelerator { .. } => "specialized-accelerator",
        PlatformClass::Unresolved => "unresolved",
    }
}

impl DeviceReport {
    fn has_failure(&self) -> bool {
        matches!(self.compiler, CompilerOutcome::Failed { .. })
            || matches!(self.allocator, AllocatorOutcome::Failed { .. })
    }
}

fn print_human(reports: &[DeviceReport]) {
    for report in reports {
        println!("{} [{}]", report.device, report.device_type);
        println!("  Class:     {}", report.class);
        println!(
            "  Platform:  {}",
            report.platform.as_deref().unwrap_or("(unresolved)")
        );
        match &report.compiler {
            CompilerOutcome::Compiled {
                compilation_device,
                backend_client,
                persistent,
            } => {
                println!("  Compiler:  {compilation_device}");
                println!(
                    "  Client:    {}",
                    backend_client.as_deref().unwrap_or("(none)")
                );
                println!("  Persisted: {}", if *persistent { "yes" } else { "no" });
            }
            CompilerOutcome::Fallback { reason } => {
                println!("  Compiler:  none, running uncompiled ({reason})");
            }
            CompilerOutcome::Failed { error } => println!("  Compiler:  FAILED: {error}"),
        }
        match &report.allocator {
            AllocatorOutcome::Selected { binding } => println!("  Allocator: {binding}"),
            AllocatorOutcome::Failed { error } => println!("  Allocator: FAILED: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPOLOGY: &str = r#"
[[platform]]
id = "cuda"
name = "CUDA"
device-count = 2
memory-per-device = 1024
compiler = "ptx"

[[platform]]
id = "rocm"
name = "ROCm"
device-count = 1
memory-per-device = 1024

[[platform]]
id = "npu"
name = "NPU"
device-count = 1
memory-per-device = 4096

[[device]]
name = "cpu:0"
type = "CPU"

[[device]]
name = "gpu:0"
type = "GPU"
stream-platform = "cuda"

[[device]]
name = "gpu:1"
type = "GPU"
stream-platform = "cuda"

[[device]]
name = "rocm:0"
type = "GPU"
stream-platform = "rocm"

[[device]]
name = "npu:0"
type = "NPU"
[device.metadata]
platform = "npu"
jit-device-type = "NPU_JIT"

[[device]]
name = "tpu:0"
type = "TPU"
"#;

    fn report() -> Vec<DeviceReport> {
        let topo = Topology::parse(TOPOLOGY).unwrap();
        build_report(&topo, None, &PersistorConfig::default()).unwrap()
    }

    fn find<'a>(reports: &'a [DeviceReport], name: &str) -> &'a DeviceReport {
        reports.iter().find(|r| r.device == name).unwrap()
    }

    fn client_of(report: &DeviceReport) -> Option<String> {
        match &report.compiler {
            CompilerOutcome::Compiled { backend_client, .. } => backend_client.clone(),
            other => panic!("expected compiled outcome, got {other:?}"),
        }
    }

    #[test]
    fn host_device() {
        let reports = report();
        let cpu = find(&reports, "cpu:0");
        assert_eq!(cpu.class, "host");
        assert_eq!(cpu.platform.as_deref(), Some("host"));
        assert!(matches!(
            &cpu.compiler,
            CompilerOutcome::Compiled { compilation_device, .. } if compilation_device == "CPU_JIT"
        ));
        assert!(matches!(
            &cpu.allocator,
            AllocatorOutcome::Selected { binding } if binding.starts_with("platform")
        ));
    }

    #[test]
    fn accelerators_on_one_platform_share_a_client() {
        let reports = report();
        let a = client_of(find(&reports, "gpu:0"));
        let b = client_of(find(&reports, "gpu:1"));
        assert!(a.is_some());
        assert_eq!(a, b);
        assert!(matches!(
            &find(&reports, "gpu:0").allocator,
            AllocatorOutcome::Selected { binding } if binding.starts_with("stream cuda:0")
        ));
    }

    #[test]
    fn platform_without_compiler_falls_back() {
        let reports = report();
        let rocm = find(&reports, "rocm:0");
        assert!(matches!(rocm.compiler, CompilerOutcome::Fallback { .. }));
        assert!(!rocm.has_failure());
    }

    #[test]
    fn specialized_and_headless_devices() {
        let reports = report();
        let npu = find(&reports, "npu:0");
        assert_eq!(npu.class, "specialized-accelerator");
        assert!(matches!(
            &npu.allocator,
            AllocatorOutcome::Selected { binding } if binding.starts_with("custom")
        ));

        let tpu = find(&reports, "tpu:0");
        assert_eq!(tpu.class, "unresolved");
        assert_eq!(client_of(tpu), None);
        assert!(matches!(tpu.allocator, AllocatorOutcome::Failed { .. }));
    }

    #[test]
    fn single_device_selection() {
        let topo = Topology::parse(TOPOLOGY).unwrap();
        let reports = build_report(&topo, Some("gpu:1"), &PersistorConfig::default()).unwrap();
        assert_eq!(reports.len(), 1);

        let err = build_report(&topo, Some("gpu:9"), &PersistorConfig::default()).unwrap_err();
        assert!(err.to_string().contains("gpu:9"));
    }

    #[test]
    fn invalid_visible_list_fails_generic_devices() {
        let topo = Topology::parse(&format!(
            "{TOPOLOGY}\n[session.gpu_options]\nvisible_device_list = \"0,zero\"\n"
        ))
        .unwrap();
        let reports = build_report(&topo, None, &PersistorConfig::default()).unwrap();
        let gpu = find(&reports, "gpu:0");
        assert!(matches!(
            &gpu.compiler,
            CompilerOutcome::Failed { error } if error.contains("INVALID_ARGUMENT")
        ));
        assert!(gpu.has_failure());
        // Metadata devices never consult the session.
        assert!(!find(&reports, "npu:0").has_failure());
    }

    #[test]
    fn run_writes_json_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.topology.toml");
        std::fs::write(&path, TOPOLOGY).unwrap();

        // tpu:0 has no platform, so allocator selection fails.
        let err = run(&path, None, None, "json").unwrap_err();
        assert!(err.to_string().contains("1 device(s) failed"));

        run(&path, Some("cpu:0"), None, "human").unwrap();
        assert!(run(&path, Some("cpu:0"), None, "yaml").is_err());
    }
}
