use super::TelemetryError;
use futures::{StreamExt, stream::BoxStream};
use std::time::Duration;
use tokio::time::timeout;

type StreamOpener<T> = Box<dyn Fn() -> BoxStream<'static, T> + Send + Sync>;

/// Bounded single-sample reads from a lazy telemetry stream.
///
/// A read that times out drops the stream together with its in-flight request, and the next read
/// opens a fresh one. A late reply is therefore never handed out by a later read.
pub struct TelemetryReader<T> {
    open: StreamOpener<T>,
    stream: Option<BoxStream<'static, T>>,
}

impl<T> TelemetryReader<T> {
    /// Creates a reader that (re)opens its stream through `open`.
    pub fn new(open: impl Fn() -> BoxStream<'static, T> + Send + Sync + 'static) -> Self {
        Self { open: Box::new(open), stream: None }
    }

    /// Reads the next sample.
    ///
    /// # Arguments
    /// * `within` - Upper bound for the reply.
    ///
    /// # Returns
    /// * `Ok(sample)` - A sample requested by this call.
    /// * `Err(TelemetryError::Timeout)` - No reply in time, the pending request is discarded.
    /// * `Err(TelemetryError::Unavailable)` - The stream ended.
    pub async fn read(&mut self, within: Duration) -> Result<T, TelemetryError> {
        // dropping this future mid-read drops the pending request with the stream
        let mut stream = self.stream.take().unwrap_or_else(|| (self.open)());
        match timeout(within, stream.next()).await {
            Ok(Some(sample)) => {
                self.stream = Some(stream);
                Ok(sample)
            }
            Ok(None) => Err(TelemetryError::Unavailable(String::from("telemetry stream closed"))),
            Err(_) => Err(TelemetryError::Timeout(within)),
        }
    }
}
