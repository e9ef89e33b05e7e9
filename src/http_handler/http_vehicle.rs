use super::http_client::HTTPClient;
use super::http_request::{
    action_post::{ActionRequest, VehicleAction},
    connection_get::ConnectionRequest,
    offboard_post::OffboardModeRequest,
    position_ned_put::PositionNedRequest,
    telemetry_get::{AttitudeRequest, BatteryRequest, PositionRequest},
};
use super::http_response::{command_result::CommandResultResponse, response_common::HTTPError};
use crate::vehicle::{
    ActionError, Attitude, BatterySample, ConnectionError, OffboardError, Pose, PositionNedYaw,
    TelemetryError, VehicleLink,
};
use crate::{event, info, warn};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

/// [`VehicleLink`] implementation against the REST vehicle bridge.
pub struct HttpVehicleLink {
    client: Arc<HTTPClient>,
}

impl HttpVehicleLink {
    /// Pause between two `/connection` polls while waiting for the autopilot.
    const CONNECT_POLL: Duration = Duration::from_millis(500);
    /// Back-off after a failed telemetry poll.
    const TELEMETRY_BACKOFF: Duration = Duration::from_millis(200);

    /// Polls the bridge until it reports an autopilot connection or `timeout` elapses.
    pub async fn connect(base_url: &str, timeout: Duration) -> Result<Self, ConnectionError> {
        let client = HTTPClient::new(base_url, HTTPClient::REQUEST_TIMEOUT)
            .map_err(|e| ConnectionError::Unreachable(e.to_string()))?;
        info!("Waiting for vehicle connection at {}.", client.url());
        let deadline = Instant::now() + timeout;
        loop {
            match client.send(ConnectionRequest {}).await {
                Ok(resp) if resp.is_connected() => {
                    info!("Vehicle connected.");
                    return Ok(Self { client: Arc::new(client) });
                }
                Ok(_) => event!("Bridge reachable, autopilot not connected yet."),
                Err(e) => warn!("Connection poll failed: {e}"),
            }
            if Instant::now() + Self::CONNECT_POLL > deadline {
                return Err(ConnectionError::Timeout(timeout));
            }
            tokio::time::sleep(Self::CONNECT_POLL).await;
        }
    }

    async fn action(&self, action: VehicleAction) -> Result<(), ActionError> {
        let res = self.client.send(ActionRequest { action }).await;
        map_action_result(action.name(), res)
    }

    async fn offboard_mode(&self, start: bool) -> Result<(), OffboardError> {
        map_offboard_result(self.client.send(OffboardModeRequest { start }).await)
    }

    /// Lazy telemetry stream: every item is one fresh poll, failed polls are retried after a
    /// back-off so the consumer's own timeout decides when to fall back. A consumer that gives
    /// up drops the stream, which cancels the pending poll.
    fn polling_stream<T, F, Fut>(&self, what: &'static str, poll: F) -> BoxStream<'static, T>
    where
        T: Send + 'static,
        F: Fn(Arc<HTTPClient>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, HTTPError>> + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        stream::unfold((client, poll), move |(client, poll)| async move {
            loop {
                match poll(Arc::clone(&client)).await {
                    Ok(item) => return Some((item, (client, poll))),
                    Err(e) => {
                        warn!("{what} poll failed: {e}");
                        tokio::time::sleep(Self::TELEMETRY_BACKOFF).await;
                    }
                }
            }
        })
        .boxed()
    }
}

fn map_action_result(
    action: &'static str,
    res: Result<CommandResultResponse, HTTPError>,
) -> Result<(), ActionError> {
    match res {
        Ok(resp) if resp.is_success() => Ok(()),
        Ok(resp) => Err(ActionError::Rejected { action, reason: resp.reason() }),
        Err(e) if e.is_rejection() => Err(ActionError::Rejected { action, reason: e.to_string() }),
        Err(e) => Err(ActionError::LinkDown { action, reason: e.to_string() }),
    }
}

fn map_offboard_result(res: Result<CommandResultResponse, HTTPError>) -> Result<(), OffboardError> {
    match res {
        Ok(resp) if resp.is_success() => Ok(()),
        Ok(resp) => Err(OffboardError::Rejected(resp.reason())),
        Err(e) if e.is_rejection() => Err(OffboardError::Rejected(e.to_string())),
        Err(e) => Err(OffboardError::LinkDown(e.to_string())),
    }
}

fn map_telemetry_error(e: HTTPError) -> TelemetryError {
    match e {
        HTTPError::Timeout => TelemetryError::Timeout(HTTPClient::REQUEST_TIMEOUT),
        other => TelemetryError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl VehicleLink for HttpVehicleLink {
    async fn hold(&self) -> Result<(), ActionError> { self.action(VehicleAction::Hold).await }

    async fn arm(&self) -> Result<(), ActionError> { self.action(VehicleAction::Arm).await }

    async fn takeoff(&self) -> Result<(), ActionError> { self.action(VehicleAction::Takeoff).await }

    async fn land(&self) -> Result<(), ActionError> { self.action(VehicleAction::Land).await }

    async fn start_offboard(&self) -> Result<(), OffboardError> { self.offboard_mode(true).await }

    async fn stop_offboard(&self) -> Result<(), OffboardError> { self.offboard_mode(false).await }

    async fn send_position(&self, setpoint: PositionNedYaw) -> Result<(), OffboardError> {
        map_offboard_result(self.client.send(PositionNedRequest::from(setpoint)).await)
    }

    async fn position(&self) -> Result<Pose, TelemetryError> {
        let pos = self.client.send(PositionRequest {}).await.map_err(map_telemetry_error)?;
        let att = self.client.send(AttitudeRequest {}).await.map_err(map_telemetry_error)?;
        Ok(Pose::new(pos.north_m(), pos.east_m(), att.yaw_deg()))
    }

    fn attitude_stream(&self) -> BoxStream<'static, Attitude> {
        self.polling_stream("Attitude", |client| async move {
            client.send(AttitudeRequest {}).await.map(|resp| Attitude::new(resp.yaw_deg()))
        })
    }

    fn battery_stream(&self) -> BoxStream<'static, BatterySample> {
        self.polling_stream("Battery", |client| async move {
            client.send(BatteryRequest {}).await.map(|resp| BatterySample::new(resp.voltage_v()))
        })
    }
}
