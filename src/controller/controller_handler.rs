use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use log::{error, info};

use crate::broadcast::EventBroadcaster;
use crate::configuration::config::Config;
use crate::error_handling::types::{ConfigError, ControllerError};
use crate::ingestion::IngestionHandler;
use crate::network::ChannelListener;
use crate::session_management::SessionManager;
use crate::storage::FileStorage;
use crate::web_interface::WebServer;

/// Capacity of the broadcast channel feeding observer fan-out.
const BROADCAST_CAPACITY: usize = 256;

/// Wires the collector together and runs it.
///
/// Owns the configuration and the construction order: storage first, then
/// the broadcaster and session registry, then the shared ingestion handler,
/// and finally the two listeners. Runs until the process receives ctrl-c;
/// in-flight writes either complete and become visible or roll back with
/// their staging files.
pub struct Controller {
    pub config: Config,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        config
            .validate()
            .map_err(ControllerError::ConfigurationError)?;
        Ok(Self { config })
    }

    pub async fn run(&mut self) -> Result<(), ControllerError> {
        let storage = Arc::new(
            FileStorage::new(&self.config.storage_path)
                .map_err(ControllerError::StorageError)?,
        );
        let broadcaster = EventBroadcaster::new(BROADCAST_CAPACITY);
        let sessions = Arc::new(SessionManager::new());
        let handler = Arc::new(IngestionHandler::new(
            Arc::clone(&storage),
            broadcaster.clone(),
        ));

        let ip: IpAddr = self.config.bind_address.parse().map_err(|_| {
            ControllerError::ConfigurationError(ConfigError::BadAddressFormat(
                self.config.bind_address.clone(),
            ))
        })?;

        let channel = ChannelListener::new(
            Arc::clone(&handler),
            Arc::clone(&sessions),
            broadcaster.clone(),
        );
        let bound = channel
            .bind(SocketAddr::new(ip, self.config.channel_port))
            .await
            .map_err(ControllerError::ChannelError)?;

        let web = WebServer::new(handler, Arc::clone(&storage));

        info!(
            "Collector up: channel on {}:{}, web on {}:{}, storage at {}",
            self.config.bind_address,
            self.config.channel_port,
            self.config.bind_address,
            self.config.web_port,
            self.config.storage_path.display()
        );

        tokio::select! {
            _ = channel.serve(bound) => {}
            res = web.start(&self.config.bind_address, self.config.web_port) => {
                res.map_err(ControllerError::WebError)?;
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for shutdown signal: {}", e);
                }
                info!("Shutdown signal received");
            }
        }

        info!(
            "Collector stopped ({} device session(s) open at shutdown)",
            sessions.active_count()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_accepts_a_valid_config() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            bind_address: "127.0.0.1".to_string(),
            storage_path: dir.path().join("shots"),
            ..Config::default()
        };
        let controller = Controller::new(config).unwrap();
        assert_eq!(controller.config.bind_address, "127.0.0.1");
    }

    #[test]
    fn test_new_rejects_an_invalid_config() {
        let config = Config {
            web_port: 22,
            ..Config::default()
        };
        assert!(matches!(
            Controller::new(config),
            Err(ControllerError::ConfigurationError(_))
        ));
    }
}
