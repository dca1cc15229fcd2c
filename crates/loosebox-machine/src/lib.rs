//! # loosebox-machine
//!
//! Machine abstraction for loosebox clusters.
//! A [`Machine`] is one cluster node backed either by a container or by a
//! microVM. It answers identity, lifecycle and published-port queries the same
//! way for both runtimes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use loosebox_machine::{CliInspector, InspectorConfig, Machine, MachineSpec};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = MachineSpec::from_json(r#"{"name": "node%d", "image": "alpine"}"#)?;
//! spec.validate()?;
//!
//! let inspector = CliInspector::new(InspectorConfig::from_env());
//! let mut node = Machine::new(&spec, &inspector, "node0");
//!
//! if node.is_started() {
//!     let ssh = node.host_port(22)?;
//!     println!("{} ssh on port {}", node.hostname(), ssh);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Backend Strategies**: Container and microVM runtimes behind one contract
//! - **Lifecycle Queries**: Created / started checks that degrade to `false`
//! - **Port Resolution**: Host port lookup with a per-machine cache
//! - **Spec Types**: serde-backed machine spec with lazily applied defaults

mod backend;
mod error;
mod inspect;
mod machine;
mod ports;
mod spec;

#[cfg(test)]
mod testing;

pub use backend::{
    backend_for, Backend, ContainerBackend, MicroVmBackend, MICROVM_NAME_LABEL, NAME_FORMAT,
    RUNNING_FORMAT,
};
pub use error::{ConfigError, MachineError, Result};
pub use inspect::{CliInspector, InspectError, Inspector, InspectorConfig};
pub use machine::{host_port_format, Machine};
pub use ports::PortCache;
pub use spec::{
    BackendKind, IgniteOptions, MachineSpec, PortMapping, Volume, VolumeKind, DEFAULT_CPUS,
    DEFAULT_DISK, DEFAULT_KERNEL, DEFAULT_MEMORY, NAME_PLACEHOLDER,
};
