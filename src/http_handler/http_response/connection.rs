/// Response type for the /connection endpoint.
#[derive(serde::Deserialize, Debug)]
pub(crate) struct ConnectionResponse {
    /// Whether the bridge currently has a link to the autopilot.
    connected: bool,
}

impl ConnectionResponse {
    pub(crate) fn is_connected(&self) -> bool { self.connected }
}
