//! Machine type - one cluster node backed by a container or a microVM.

use crate::backend::{backend_for, Backend};
use crate::error::{MachineError, Result};
use crate::inspect::Inspector;
use crate::ports::PortCache;
use crate::spec::{BackendKind, MachineSpec};

/// Inspection template resolving the host port published for `<port>/tcp`.
pub fn host_port_format(container_port: u16) -> String {
    format!(
        "{{{{(index (index .NetworkSettings.Ports \"{container_port}/tcp\") 0).HostPort}}}}"
    )
}

/// A single machine.
///
/// The spec and the inspector are borrowed for the machine's lifetime. Port
/// resolutions are cached on the instance; nothing is shared between machines.
/// A machine is meant to be driven from one thread at a time.
pub struct Machine<'a> {
    /// Spec this machine was declared from
    spec: &'a MachineSpec,
    /// Query boundary towards the runtimes
    inspector: &'a dyn Inspector,
    /// Runtime strategy, fixed at construction
    backend: Box<dyn Backend>,
    /// Declared instance name
    name: String,
    /// Hostname inside the machine
    hostname: String,
    ip: Option<String>,
    ports: PortCache,
}

impl<'a> Machine<'a> {
    /// Create a machine for an already validated spec.
    ///
    /// `name` is the per-replica instance name; it doubles as the hostname
    /// unless [`with_hostname`](Self::with_hostname) overrides it.
    pub fn new(
        spec: &'a MachineSpec,
        inspector: &'a dyn Inspector,
        name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let backend = backend_for(spec);
        tracing::debug!(machine = %name, backend = %backend.kind(), "Creating machine handle");
        Self {
            spec,
            inspector,
            backend,
            hostname: name.clone(),
            name,
            ip: None,
            ports: PortCache::new(),
        }
    }

    /// Set the hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the machine IP address.
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Get the spec this machine was declared from.
    pub fn spec(&self) -> &'a MachineSpec {
        self.spec
    }

    /// Get the declared instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the machine hostname.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Get the machine IP address, if known.
    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// True iff the spec carries microVM options.
    pub fn is_microvm(&self) -> bool {
        self.spec.is_microvm()
    }

    /// Name of the container backing this machine.
    ///
    /// For microVMs this asks the runtime for the id of the container labelled
    /// with the machine name, falling back to the declared name when the query
    /// fails or finds nothing.
    pub fn container_name(&self) -> String {
        self.backend.container_name(&self.name, self.inspector)
    }

    /// Whether the machine exists, running or stopped.
    ///
    /// Query failures read as `false`.
    pub fn is_created(&self) -> bool {
        self.backend.is_created(&self.name, self.inspector)
    }

    /// Whether the machine is running.
    ///
    /// Query failures read as `false`. For microVMs this is the same check as
    /// [`is_created`](Self::is_created), so a stopped VM may still report as
    /// started.
    pub fn is_started(&self) -> bool {
        self.backend.is_started(&self.name, self.inspector)
    }

    /// Host port published for `container_port`.
    ///
    /// The first successful resolution is cached for the life of the machine;
    /// later calls return it without querying. Each call issues at most one
    /// inspection and failures are not retried.
    ///
    /// # Errors
    /// - [`MachineError::Query`] if the inspection fails
    /// - [`MachineError::UnexpectedResultShape`] unless exactly one line comes back
    /// - [`MachineError::MalformedPortValue`] if that line is not a port number
    pub fn host_port(&mut self, container_port: u16) -> Result<u16> {
        if let Some(host_port) = self.ports.get(container_port) {
            tracing::trace!(machine = %self.name, container_port, host_port, "Port cache hit");
            return Ok(host_port);
        }

        let target = self.container_name();
        let lines = self
            .inspector
            .inspect(&target, &host_port_format(container_port))
            .map_err(|source| {
                tracing::warn!(
                    machine = %self.name,
                    container_port,
                    error = %source,
                    "Port inspection failed"
                );
                MachineError::Query {
                    target: target.clone(),
                    source,
                }
            })?;

        if lines.len() != 1 {
            return Err(MachineError::UnexpectedResultShape { lines });
        }

        let value = lines[0].replace('\'', "");
        let value = value.trim();
        let host_port = value
            .parse::<u16>()
            .map_err(|source| MachineError::MalformedPortValue {
                value: value.to_string(),
                source,
            })?;

        self.ports.set(container_port, host_port);
        tracing::debug!(machine = %self.name, container_port, host_port, "Resolved host port");
        Ok(host_port)
    }

    /// Port resolutions cached so far.
    pub fn cached_ports(&self) -> &PortCache {
        &self.ports
    }
}

impl std::fmt::Debug for Machine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.name)
            .field("hostname", &self.hostname)
            .field("ip", &self.ip)
            .field("backend", &self.backend)
            .field("ports", &self.ports)
            .finish()
    }
}
