use super::common::Vec2D;
use crate::config::MissionConfig;
use crate::{event, info};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One body-relative displacement target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeTarget {
    dx: f64,
    dy: f64,
    distance: f64,
}

impl RelativeTarget {
    pub fn new(dx: f64, dy: f64) -> Self { Self { dx, dy, distance: dx.hypot(dy) } }

    /// Draws `dx` and `dy` uniformly from the given ranges.
    pub fn sample<R: Rng>(
        rng: &mut R,
        dx_range: &RangeInclusive<f64>,
        dy_range: &RangeInclusive<f64>,
    ) -> Self {
        Self::new(rng.random_range(dx_range.clone()), rng.random_range(dy_range.clone()))
    }

    pub fn dx(&self) -> f64 { self.dx }
    pub fn dy(&self) -> f64 { self.dy }
    pub fn distance(&self) -> f64 { self.distance }
    pub fn body(&self) -> Vec2D<f64> { Vec2D::new(self.dx, self.dy) }
}

/// Consumer side of the waypoint feed. Yields `None` once the producer is exhausted.
pub struct WaypointFeed {
    rx: mpsc::Receiver<RelativeTarget>,
}

impl WaypointFeed {
    /// Wraps an existing channel, e.g. one fed by an external target source.
    pub fn from_receiver(rx: mpsc::Receiver<RelativeTarget>) -> Self { Self { rx } }

    /// A finite feed replaying `targets` and then closing.
    pub fn scripted(targets: Vec<RelativeTarget>) -> Self {
        let (tx, rx) = mpsc::channel(targets.len().max(1));
        for target in targets {
            // capacity equals the number of targets, so this never fails
            tx.try_send(target).ok();
        }
        Self { rx }
    }

    pub async fn next(&mut self) -> Option<RelativeTarget> { self.rx.recv().await }
}

/// Produces random relative targets at a fixed period into a channel of capacity one.
///
/// The generator is not restartable: once its task ends (cap reached, cancelled or the consumer
/// dropped) a new one has to be spawned.
pub struct WaypointGenerator {
    period: Duration,
    dx_range: RangeInclusive<f64>,
    dy_range: RangeInclusive<f64>,
    limit: Option<usize>,
    rng: StdRng,
}

impl WaypointGenerator {
    pub fn new(config: &MissionConfig) -> Self {
        Self {
            period: config.data_rate,
            dx_range: config.dx_range.clone(),
            dy_range: config.dy_range.clone(),
            limit: config.max_waypoints,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replaces the entropy-seeded generator with a deterministic one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Spawns the producer task.
    ///
    /// # Arguments
    /// * `c_tok` - Stops the producer. Dropping the returned feed stops it as well.
    ///
    /// # Returns
    /// The consumer side of the channel and a handle resolving to the number of targets sent.
    pub fn spawn(self, c_tok: CancellationToken) -> (WaypointFeed, JoinHandle<usize>) {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(self.produce(tx, c_tok));
        (WaypointFeed::from_receiver(rx), handle)
    }

    async fn produce(mut self, tx: mpsc::Sender<RelativeTarget>, c_tok: CancellationToken) -> usize {
        let mut produced = 0;
        loop {
            if self.limit.is_some_and(|max| produced >= max) {
                info!("Waypoint generator reached its cap of {produced} targets.");
                break;
            }
            tokio::select! {
                biased;
                () = c_tok.cancelled() => break,
                () = tokio::time::sleep(self.period) => {}
            }
            let target = RelativeTarget::sample(&mut self.rng, &self.dx_range, &self.dy_range);
            event!(
                "Generated target dx={:.2}, dy={:.2}, d={:.2}",
                target.dx, target.dy, target.distance
            );
            tokio::select! {
                biased;
                () = c_tok.cancelled() => break,
                res = tx.send(target) => {
                    if res.is_err() {
                        break;
                    }
                }
            }
            produced += 1;
        }
        produced
    }
}
