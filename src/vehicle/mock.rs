use super::{
    ActionError, Attitude, BatterySample, OffboardError, Pose, PositionNedYaw, TelemetryError,
    VehicleLink,
};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::time::Duration;
use tokio::sync::watch;

/// What the battery stream does once the scripted voltages run out.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BatteryTail {
    Repeat(f64),
    End,
}

struct MockState {
    heading: watch::Sender<Option<f64>>,
    attitude_delay: Mutex<Option<Duration>>,
    battery_block: Mutex<Option<Duration>>,
    battery_reads: AtomicUsize,
    voltages: Mutex<VecDeque<f64>>,
    tail: Mutex<BatteryTail>,
    fail_command_at: Mutex<Option<usize>>,
    fail_stop_offboard: AtomicBool,
    commands: Mutex<Vec<PositionNedYaw>>,
    command_attempts: AtomicUsize,
    stop_offboard_calls: AtomicUsize,
    land_calls: AtomicUsize,
    actions: Mutex<Vec<&'static str>>,
}

/// Scripted in-memory vehicle used by the loop and supervisor tests.
#[derive(Clone)]
pub(crate) struct MockVehicle {
    inner: Arc<MockState>,
}

impl MockVehicle {
    pub(crate) fn new() -> Self {
        let (heading, _) = watch::channel(Some(0.0));
        Self {
            inner: Arc::new(MockState {
                heading,
                attitude_delay: Mutex::new(None),
                battery_block: Mutex::new(None),
                battery_reads: AtomicUsize::new(0),
                voltages: Mutex::new(VecDeque::new()),
                tail: Mutex::new(BatteryTail::Repeat(22.2)),
                fail_command_at: Mutex::new(None),
                fail_stop_offboard: AtomicBool::new(false),
                commands: Mutex::new(Vec::new()),
                command_attempts: AtomicUsize::new(0),
                stop_offboard_calls: AtomicUsize::new(0),
                land_calls: AtomicUsize::new(0),
                actions: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn set_heading(&self, heading: Option<f64>) { self.inner.heading.send_replace(heading); }

    /// The next attitude reply carries the heading at request time but arrives `delay` later.
    pub(crate) fn delay_next_attitude(&self, delay: Duration) {
        *self.inner.attitude_delay.lock().unwrap() = Some(delay);
    }

    /// The next battery read blocks its worker thread for `block`, ignoring cancellation.
    pub(crate) fn block_next_battery_read(&self, block: Duration) {
        *self.inner.battery_block.lock().unwrap() = Some(block);
    }

    pub(crate) fn battery_reads(&self) -> usize { self.inner.battery_reads.load(Ordering::SeqCst) }

    pub(crate) fn script_voltages(&self, voltages: impl IntoIterator<Item = f64>, tail: BatteryTail) {
        self.inner.voltages.lock().unwrap().extend(voltages);
        *self.inner.tail.lock().unwrap() = tail;
    }

    /// Makes the `n`-th position command (1-based) fail.
    pub(crate) fn fail_command_at(&self, n: usize) { *self.inner.fail_command_at.lock().unwrap() = Some(n); }

    pub(crate) fn fail_stop_offboard(&self) { self.inner.fail_stop_offboard.store(true, Ordering::SeqCst); }

    pub(crate) fn commands(&self) -> Vec<PositionNedYaw> { self.inner.commands.lock().unwrap().clone() }

    pub(crate) fn command_attempts(&self) -> usize { self.inner.command_attempts.load(Ordering::SeqCst) }

    pub(crate) fn stop_offboard_calls(&self) -> usize {
        self.inner.stop_offboard_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn land_calls(&self) -> usize { self.inner.land_calls.load(Ordering::SeqCst) }

    pub(crate) fn actions(&self) -> Vec<&'static str> { self.inner.actions.lock().unwrap().clone() }

    fn record(&self, action: &'static str) { self.inner.actions.lock().unwrap().push(action); }
}

#[async_trait]
impl VehicleLink for MockVehicle {
    async fn hold(&self) -> Result<(), ActionError> {
        self.record("hold");
        Ok(())
    }

    async fn arm(&self) -> Result<(), ActionError> {
        self.record("arm");
        Ok(())
    }

    async fn takeoff(&self) -> Result<(), ActionError> {
        self.record("takeoff");
        Ok(())
    }

    async fn land(&self) -> Result<(), ActionError> {
        self.record("land");
        self.inner.land_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn start_offboard(&self) -> Result<(), OffboardError> {
        self.record("start_offboard");
        Ok(())
    }

    async fn stop_offboard(&self) -> Result<(), OffboardError> {
        self.record("stop_offboard");
        self.inner.stop_offboard_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_stop_offboard.load(Ordering::SeqCst) {
            Err(OffboardError::LinkDown(String::from("mock stop failure")))
        } else {
            Ok(())
        }
    }

    async fn send_position(&self, setpoint: PositionNedYaw) -> Result<(), OffboardError> {
        let attempt = self.inner.command_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.inner.fail_command_at.lock().unwrap() == Some(attempt) {
            return Err(OffboardError::Rejected(format!("mock rejection of command {attempt}")));
        }
        self.inner.commands.lock().unwrap().push(setpoint);
        Ok(())
    }

    async fn position(&self) -> Result<Pose, TelemetryError> {
        let heading = (*self.inner.heading.borrow()).unwrap_or(0.0);
        Ok(Pose::new(0.0, 0.0, heading))
    }

    fn attitude_stream(&self) -> BoxStream<'static, Attitude> {
        let rx = self.inner.heading.subscribe();
        let inner = Arc::clone(&self.inner);
        stream::unfold((rx, inner), |(mut rx, state)| async move {
            loop {
                let current = *rx.borrow_and_update();
                if let Some(heading) = current {
                    let delay = state.attitude_delay.lock().unwrap().take();
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    return Some((Attitude::new(heading), (rx, state)));
                }
                if rx.changed().await.is_err() {
                    return None;
                }
            }
        })
        .boxed()
    }

    fn battery_stream(&self) -> BoxStream<'static, BatterySample> {
        let inner = Arc::clone(&self.inner);
        stream::unfold(inner, |state| async move {
            state.battery_reads.fetch_add(1, Ordering::SeqCst);
            let block = state.battery_block.lock().unwrap().take();
            if let Some(block) = block {
                std::thread::sleep(block);
            }
            let next = state.voltages.lock().unwrap().pop_front();
            let voltage = match next {
                Some(v) => v,
                None => match *state.tail.lock().unwrap() {
                    BatteryTail::Repeat(v) => v,
                    BatteryTail::End => return None,
                },
            };
            Some((BatterySample::new(voltage), state))
        })
        .boxed()
    }
}
