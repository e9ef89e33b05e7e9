use crate::config::MissionConfig;
use crate::flight_control::{MissionStatus, MissionSupervisor};
use crate::http_handler::HttpVehicleLink;
use crate::vehicle::{ConnectionError, VehicleLink};
use std::sync::Arc;

/// Struct bundling the shared components of one mission run: the vehicle link, the shared mission
/// status and the effective configuration.
#[derive(Clone)]
pub struct Keychain {
    /// The vehicle link all control loops talk through.
    link: Arc<dyn VehicleLink>,
    /// Shared mission status, written by the control loops and the supervisor.
    status: Arc<MissionStatus>,
    /// The effective mission configuration.
    config: Arc<MissionConfig>,
}

impl Keychain {
    /// Connects to the vehicle bridge named in `config` and sets up a fresh mission status.
    ///
    /// # Errors
    /// Returns the [`ConnectionError`] if the vehicle does not connect within the configured
    /// connection timeout.
    pub async fn connect(config: MissionConfig) -> Result<Self, ConnectionError> {
        let link = HttpVehicleLink::connect(&config.vehicle_url, config.connection_timeout).await?;
        Ok(Self::with_link(Arc::new(link), config))
    }

    /// Creates a keychain around an already established link.
    pub fn with_link(link: Arc<dyn VehicleLink>, config: MissionConfig) -> Self {
        Self { link, status: Arc::new(MissionStatus::new()), config: Arc::new(config) }
    }

    /// Provides a cloned reference to the vehicle link.
    pub fn link(&self) -> Arc<dyn VehicleLink> { Arc::clone(&self.link) }

    /// Provides a cloned reference to the mission status.
    pub fn status(&self) -> Arc<MissionStatus> { Arc::clone(&self.status) }

    /// Provides a cloned reference to the mission configuration.
    pub fn config(&self) -> Arc<MissionConfig> { Arc::clone(&self.config) }

    /// Builds the mission supervisor over the components held by this keychain.
    pub fn supervisor(&self) -> MissionSupervisor {
        MissionSupervisor::new(self.link(), self.status(), self.config())
    }
}
