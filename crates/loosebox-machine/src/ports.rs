//! Per-machine memo of resolved port bindings.

use std::collections::HashMap;

/// Maps container port -> host port.
///
/// Entries are never evicted; a published port is assumed stable for as long
/// as the owning machine lives.
#[derive(Debug, Clone, Default)]
pub struct PortCache {
    ports: HashMap<u16, u16>,
}

impl PortCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached host port for `container_port`, if resolved.
    pub fn get(&self, container_port: u16) -> Option<u16> {
        self.ports.get(&container_port).copied()
    }

    /// Record a resolution. The first value stored for a port is kept.
    pub fn set(&mut self, container_port: u16, host_port: u16) {
        self.ports.entry(container_port).or_insert(host_port);
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Iterate over `(container_port, host_port)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.ports.iter().map(|(c, h)| (*c, *h))
    }
}
