use std::path::{Path, PathBuf};

use crate::{config::ResolvedConfig, errors::DiscoverError, logger::Logger};

use super::{api::Inventory, select::select};

pub const HOSTNAME_PATH: &str = "/etc/hostname";

/// One discovery pass over a server inventory.
pub struct Discovery<'a, I> {
    inventory: I,
    logger: &'a dyn Logger,
    hostname_path: PathBuf,
}

impl<'a, I: Inventory> Discovery<'a, I> {
    pub fn new(inventory: I, logger: &'a dyn Logger) -> Self {
        Discovery {
            inventory,
            logger,
            hostname_path: PathBuf::from(HOSTNAME_PATH),
        }
    }

    /// Overrides the file the local hostname is read from.
    pub fn hostname_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.hostname_path = path.as_ref().to_path_buf();
        self
    }

    pub async fn run(&self, config: &ResolvedConfig) -> Result<Vec<String>, DiscoverError> {
        let location = match &config.location {
            Some(location) => Some(location.clone()),
            None => self.detect_location().await?,
        };

        if let Some(location) = &location {
            self.logger
                .info(&format!("filtering by location {}", location));
        }

        self.logger.debug(&format!(
            "using address_type={} label_selector={} location={}",
            config.address_family,
            config.label_selector,
            location.as_deref().unwrap_or_default()
        ));

        let servers = self
            .inventory
            .running_servers(&config.label_selector)
            .await?;
        self.logger
            .debug(&format!("found {} running servers", servers.len()));

        // Location names are compared verbatim, no case or whitespace folding
        let addrs = servers
            .iter()
            .filter(|s| location.as_ref().map_or(true, |l| *l == s.location))
            .filter_map(|s| select(s, config.address_family, self.logger))
            .map(|ip| ip.to_string())
            .collect::<Vec<_>>();

        self.logger
            .debug(&format!("found IP addresses: {:?}", addrs));
        Ok(addrs)
    }

    /// Looks up the server this process runs on by hostname. `None` when no
    /// such server exists, meaning discovery spans all locations.
    async fn detect_location(&self) -> Result<Option<String>, DiscoverError> {
        let content = tokio::fs::read_to_string(&self.hostname_path)
            .await
            .map_err(|e| {
                DiscoverError::HostnameUnreadable(
                    self.hostname_path.display().to_string(),
                    e.to_string(),
                )
            })?;
        let hostname = content.trim();

        self.logger.info(&format!(
            "Location not specified. Searching for current server named {}.",
            hostname
        ));

        let server = if hostname.is_empty() {
            None
        } else {
            self.inventory.server_by_name(hostname).await?
        };

        match server {
            Some(server) => {
                self.logger.info(&format!(
                    "Detected current server {} with id {}",
                    server.name, server.id
                ));
                Ok(Some(server.location))
            }
            None => {
                self.logger.info(
                    "No location specified and not an hcloud server. Joining all matching label selector.",
                );
                Ok(None)
            }
        }
    }
}
