//! Runtime strategies behind a [`Machine`](crate::Machine).
//!
//! The two runtimes expose very different introspection surfaces. The
//! container engine answers templated inspection queries against its object
//! model; the microVM manager only offers process exit codes and log streams.
//! Each strategy maps its runtime onto the same identity / created / started
//! contract. Lifecycle predicates collapse "unknown" into `false`.

use crate::inspect::Inspector;
use crate::spec::{BackendKind, MachineSpec};

/// Inspection template for the container name.
pub const NAME_FORMAT: &str = "{{.Name}}";
/// Inspection template for the running flag.
pub const RUNNING_FORMAT: &str = "{{.State.Running}}";
/// Label the microVM runtime puts on the container backing a VM.
pub const MICROVM_NAME_LABEL: &str = "ignite.name";

/// Lifecycle and identity queries for one runtime.
pub trait Backend: std::fmt::Debug {
    /// Runtime this strategy talks to.
    fn kind(&self) -> BackendKind;

    /// Name or id the container runtime knows the machine by.
    fn container_name(&self, name: &str, inspector: &dyn Inspector) -> String;

    /// Whether the instance exists, running or stopped.
    fn is_created(&self, name: &str, inspector: &dyn Inspector) -> bool;

    /// Whether the instance is running.
    fn is_started(&self, name: &str, inspector: &dyn Inspector) -> bool;
}

/// Pick the strategy for a spec.
///
/// microVM options decide; a declared `backend` that disagrees is only logged.
pub fn backend_for(spec: &MachineSpec) -> Box<dyn Backend> {
    let backend: Box<dyn Backend> = if spec.is_microvm() {
        Box::new(MicroVmBackend)
    } else {
        Box::new(ContainerBackend)
    };
    if backend_mismatch(spec, backend.kind()) {
        tracing::warn!(
            name = %spec.name,
            declared = %spec.backend,
            selected = %backend.kind(),
            "Declared backend does not match machine options"
        );
    }
    backend
}

fn backend_mismatch(spec: &MachineSpec, selected: BackendKind) -> bool {
    spec.backend != selected
}

/// Parse a boolean the way the runtime's template output spells it.
///
/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Strip the single quotes wrapping templated inspection output.
pub(crate) fn unquote(line: &str) -> &str {
    line.trim().trim_matches('\'')
}

/// Container engine strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerBackend;

impl Backend for ContainerBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Container
    }

    fn container_name(&self, name: &str, _inspector: &dyn Inspector) -> String {
        name.to_string()
    }

    fn is_created(&self, name: &str, inspector: &dyn Inspector) -> bool {
        match inspector.inspect(name, NAME_FORMAT) {
            Ok(lines) => lines.first().is_some_and(|l| !unquote(l).is_empty()),
            Err(e) => {
                tracing::debug!(machine = %name, error = %e, "Container not found");
                false
            }
        }
    }

    fn is_started(&self, name: &str, inspector: &dyn Inspector) -> bool {
        let lines = match inspector.inspect(name, RUNNING_FORMAT) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::debug!(machine = %name, error = %e, "Container state query failed");
                return false;
            }
        };
        lines
            .first()
            .and_then(|l| parse_bool(unquote(l)))
            .unwrap_or(false)
    }
}

/// microVM manager strategy.
///
/// The runtime has no inspect primitive, so a successful log fetch stands in
/// for existence. Created and started are therefore the same check.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroVmBackend;

impl MicroVmBackend {
    fn logs_available(name: &str, inspector: &dyn Inspector) -> bool {
        tracing::info!(machine = %name, "Checking microVM logs");
        match inspector.vm_logs(name) {
            Ok(0) => true,
            Ok(code) => {
                tracing::info!(machine = %name, code, "microVM logs unavailable");
                false
            }
            Err(e) => {
                tracing::info!(machine = %name, error = %e, "microVM log query failed");
                false
            }
        }
    }
}

impl Backend for MicroVmBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::MicroVm
    }

    fn container_name(&self, name: &str, inspector: &dyn Inspector) -> String {
        let filter = format!("label={MICROVM_NAME_LABEL}={name}");
        match inspector.list_ids(&filter) {
            Ok(ids) => match ids.iter().map(|id| id.trim()).find(|id| !id.is_empty()) {
                Some(id) => id.to_string(),
                None => name.to_string(),
            },
            Err(e) => {
                tracing::debug!(machine = %name, error = %e, "Falling back to declared name");
                name.to_string()
            }
        }
    }

    fn is_created(&self, name: &str, inspector: &dyn Inspector) -> bool {
        Self::logs_available(name, inspector)
    }

    fn is_started(&self, name: &str, inspector: &dyn Inspector) -> bool {
        Self::logs_available(name, inspector)
    }
}
