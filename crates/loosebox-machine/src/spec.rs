//! Declarative machine specification.
//!
//! A [`MachineSpec`] is handed to the core already parsed. Optional fields keep
//! their "unset" representation in the stored value; defaults are filled in by
//! the accessors at read time.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder that per-replica numbering substitutes in a name template.
pub const NAME_PLACEHOLDER: &str = "%d";

/// Default microVM vCPU count.
pub const DEFAULT_CPUS: u64 = 2;
/// Default microVM memory size.
pub const DEFAULT_MEMORY: &str = "1GB";
/// Default microVM disk size.
pub const DEFAULT_DISK: &str = "4GB";
/// Default OCI image used for the microVM kernel overlay.
pub const DEFAULT_KERNEL: &str = "weaveworks/ignite-kernel:4.19.47";

const DEFAULT_PROTOCOL: &str = "tcp";
const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Machine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    /// Name template, `%d` being the replica index. Also used as hostname.
    #[serde(default = "default_name")]
    pub name: String,
    /// Container image for this machine
    pub image: String,
    /// Start the machine as a privileged container
    #[serde(default)]
    pub privileged: bool,
    /// Volumes attached to this machine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    /// User-defined networks, created ahead of time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
    /// Ports to expose to the host
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_mappings: Vec<PortMapping>,
    /// Command run in the machine
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cmd: String,
    /// Declared runtime backend
    #[serde(default)]
    pub backend: BackendKind,
    /// microVM specific options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignite: Option<IgniteOptions>,
}

fn default_name() -> String {
    format!("node{NAME_PLACEHOLDER}")
}

impl MachineSpec {
    /// Parse a spec from a JSON document.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(doc)?)
    }

    /// Check the name template carries the replica placeholder.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidName`] when `%d` is missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.name.contains(NAME_PLACEHOLDER) {
            tracing::warn!(
                name = %self.name,
                "machine name is not valid, it should contain %d"
            );
            return Err(ConfigError::InvalidName(self.name.clone()));
        }
        Ok(())
    }

    /// True iff the spec carries microVM options.
    pub fn is_microvm(&self) -> bool {
        self.ignite.is_some()
    }

    /// microVM options with defaults applied.
    ///
    /// The stored spec is left untouched.
    pub fn ignite_config(&self) -> IgniteOptions {
        let mut opts = self.ignite.clone().unwrap_or_default();
        if opts.cpus == 0 {
            opts.cpus = DEFAULT_CPUS;
        }
        if opts.memory.is_empty() {
            opts.memory = DEFAULT_MEMORY.into();
        }
        if opts.disk.is_empty() {
            opts.disk = DEFAULT_DISK.into();
        }
        if opts.kernel.is_empty() {
            opts.kernel = DEFAULT_KERNEL.into();
        }
        opts
    }
}

/// Runtime technology a machine is declared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Container engine
    #[default]
    #[serde(alias = "docker")]
    Container,
    /// microVM manager
    #[serde(alias = "ignite")]
    MicroVm,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Container => write!(f, "container"),
            BackendKind::MicroVm => write!(f, "microvm"),
        }
    }
}

/// Kind of volume attached to a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeKind {
    /// Host directory or file
    Bind,
    /// Named runtime volume, anonymous when the source is empty
    Volume,
}

/// Volume attached to a machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(rename = "type")]
    pub kind: VolumeKind,
    /// Host path for binds, volume name (or empty) for volumes
    #[serde(default)]
    pub source: String,
    /// Mount point inside the machine
    pub destination: String,
    #[serde(default)]
    pub read_only: bool,
}

impl Volume {
    /// An unnamed runtime volume.
    pub fn is_anonymous(&self) -> bool {
        self.kind == VolumeKind::Volume && self.source.is_empty()
    }
}

/// Mapping of a machine port onto the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    /// Layer 4 protocol, "tcp" or "udp"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    /// Host address to bind to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    /// Base host port; 0 lets the runtime pick one
    #[serde(default)]
    pub host_port: u16,
    pub container_port: u16,
}

impl PortMapping {
    /// Protocol, "tcp" when unset.
    pub fn protocol(&self) -> &str {
        if self.protocol.is_empty() {
            DEFAULT_PROTOCOL
        } else {
            &self.protocol
        }
    }

    /// Bind address, "0.0.0.0" when unset.
    pub fn address(&self) -> &str {
        if self.address.is_empty() {
            DEFAULT_ADDRESS
        } else {
            &self.address
        }
    }

    /// Host port replica `index` binds to.
    ///
    /// Replicas are offset from the base port. An auto-assigned base stays 0
    /// for every replica; `None` means the offset runs past 65535.
    pub fn host_port_for_replica(&self, index: u16) -> Option<u16> {
        if self.host_port == 0 {
            return Some(0);
        }
        self.host_port.checked_add(index)
    }
}

/// microVM specific options. Zero or empty values mean "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgniteOptions {
    /// Number of vCPUs
    #[serde(default)]
    pub cpus: u64,
    /// RAM size, e.g. "1GB"
    #[serde(default)]
    pub memory: String,
    /// Disk size, e.g. "4GB"
    #[serde(default)]
    pub disk: String,
    /// OCI image for the kernel overlay
    #[serde(default)]
    pub kernel: String,
    /// Host path -> guest path copies performed at creation
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub copy_files: BTreeMap<String, String>,
}
