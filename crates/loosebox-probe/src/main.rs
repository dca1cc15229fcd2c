//! loosebox probe entry point.
//!
//! Reports the lifecycle state and published ports of one machine.
//!
//! ```text
//! loosebox-probe <machine-name> [container-port ...]
//! ```
//!
//! Without explicit ports, every port mapping declared in the spec is resolved.
//! Logs go to stderr, the report to stdout.

mod config;

use anyhow::Context;
use config::ProbeConfig;
use loosebox_machine::{CliInspector, Machine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("loosebox=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let name = args
        .next()
        .context("usage: loosebox-probe <machine-name> [container-port ...]")?;
    let requested = args
        .map(|a| a.parse::<u16>().with_context(|| format!("invalid port {a:?}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let config = ProbeConfig::from_env();
    tracing::debug!(?config, "Configuration loaded");

    let spec = config.load_spec()?;
    let inspector = CliInspector::new(config.inspector.clone());
    let mut machine = Machine::new(&spec, &inspector, name);

    let ports = if requested.is_empty() {
        spec.port_mappings.iter().map(|pm| pm.container_port).collect()
    } else {
        requested
    };

    println!("name:      {}", machine.name());
    println!("hostname:  {}", machine.hostname());
    println!("backend:   {}", machine.backend_kind());
    println!("container: {}", machine.container_name());
    println!("created:   {}", machine.is_created());
    println!("started:   {}", machine.is_started());

    for port in ports {
        match machine.host_port(port) {
            Ok(host) => println!("port:      {port}/tcp -> {host}"),
            Err(e) => {
                tracing::error!(port, error = %e, "Failed to resolve host port");
                println!("port:      {port}/tcp -> unresolved");
            }
        }
    }

    Ok(())
}
