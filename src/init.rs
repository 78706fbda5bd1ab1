use std::path::Path;

use crate::core::Router;
use crate::error::Result;
use crate::read_config::load_topology;
use crate::utils::{Logger, RouterSettings};

/// Loads settings and topology, validates them and builds the router for
/// `router_id`. `interval_secs` overrides the settings file when given.
pub fn init_router(
    topology_path: &Path,
    router_id: &str,
    settings_path: Option<&Path>,
    interval_secs: Option<u64>,
) -> Result<Router> {
    let mut settings = match settings_path {
        Some(path) => RouterSettings::load(path)?,
        None => RouterSettings::default(),
    };
    if let Some(secs) = interval_secs {
        settings.interval_secs = secs.max(1);
    }

    log::debug!("Topology file: {}", topology_path.display());
    log::debug!("Router ID: {}", router_id);

    let topology = load_topology(topology_path)?;
    topology.validate(router_id)?;
    let identity = topology.identity_of(router_id)?;

    let router = Router::new(identity, settings, &topology, Logger::new(router_id));
    log::info!("Router initialized");
    Ok(router)
}
