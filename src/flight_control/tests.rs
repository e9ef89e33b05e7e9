use super::{
    AbortOutcome, EmergencyAbort, MissionExit, MissionLoop, MissionStatus, MissionSupervisor,
    StatusReporter, WaypointFeed,
    preflight::PreflightError,
    run_preflight,
    supervisor::{TerminationCause, stop_unit},
    waypoint_generator::RelativeTarget,
};
use crate::config::MissionConfig;
use crate::vehicle::{
    MissionError, OffboardError,
    mock::{BatteryTail, MockVehicle},
};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// 1 Ah at 10 V: every 10 V sample at 72 A drains 2% over the one second poll interval.
fn scenario_config(command_interval_s: u64) -> MissionConfig {
    MissionConfig {
        battery_capacity_ah: 1.0,
        battery_nominal_voltage_v: 10.0,
        draw_current_a: 72.0,
        battery_poll_interval: Duration::from_secs(1),
        critical_battery_percent: 15.0,
        command_interval: Duration::from_secs(command_interval_s),
        ..MissionConfig::default()
    }
}

fn forward_targets(n: usize) -> WaypointFeed {
    WaypointFeed::scripted(vec![RelativeTarget::new(2.0, 0.0); n])
}

fn supervisor_for(vehicle: &MockVehicle, config: MissionConfig) -> MissionSupervisor {
    MissionSupervisor::new(
        Arc::new(vehicle.clone()),
        Arc::new(MissionStatus::new()),
        Arc::new(config),
    )
}

#[tokio::test(start_paused = true)]
async fn test_no_commands_once_critical() {
    let vehicle = MockVehicle::new();
    let status = Arc::new(MissionStatus::new());
    status.set_critical_battery();
    let mission = MissionLoop::new(
        Arc::new(vehicle.clone()),
        Arc::clone(&status),
        forward_targets(3),
        &scenario_config(1),
    );
    assert_eq!(mission.run(CancellationToken::new()).await, MissionExit::Aborted);
    assert_eq!(vehicle.command_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_critical_interrupts_command_wait() {
    let vehicle = MockVehicle::new();
    let status = Arc::new(MissionStatus::new());
    let mission = MissionLoop::new(
        Arc::new(vehicle.clone()),
        Arc::clone(&status),
        forward_targets(10),
        &scenario_config(3),
    );
    let handle = tokio::spawn(mission.run(CancellationToken::new()));
    tokio::time::sleep(Duration::from_secs(4)).await;
    status.set_critical_battery();
    let start = Instant::now();
    assert_eq!(handle.await.unwrap(), MissionExit::Aborted);
    assert!(start.elapsed() < Duration::from_secs(1));
    // commands at t = 0 s and t = 3 s, none after the flag
    assert_eq!(vehicle.commands().len(), 2);
    assert_eq!(status.progress().waypoints, 2);
}

#[tokio::test(start_paused = true)]
async fn test_targets_accumulate_in_nav_frame() {
    let vehicle = MockVehicle::new();
    vehicle.set_heading(Some(90.0));
    let status = Arc::new(MissionStatus::new());
    let config = scenario_config(1);
    let feed = WaypointFeed::scripted(vec![RelativeTarget::new(1.0, 0.0), RelativeTarget::new(2.0, 0.0)]);
    let mission = MissionLoop::new(Arc::new(vehicle.clone()), Arc::clone(&status), feed, &config);
    assert_eq!(mission.run(CancellationToken::new()).await, MissionExit::Exhausted);

    let commands = vehicle.commands();
    assert_eq!(commands.len(), 2);
    assert!(commands[0].north_m.abs() < 1e-9);
    assert!((commands[0].east_m - 1.0).abs() < 1e-9);
    assert!((commands[1].east_m - 3.0).abs() < 1e-9);
    assert!((commands[1].yaw_deg - 90.0).abs() < 1e-9);
    assert!(commands.iter().all(|c| (c.down_m + config.flight_altitude_m).abs() < 1e-9));
    assert!((status.progress().target.y() - 3.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_heading_fallback_without_attitude() {
    let vehicle = MockVehicle::new();
    vehicle.set_heading(None);
    let config = scenario_config(1);
    let mission =
        MissionLoop::new(Arc::new(vehicle.clone()), Arc::new(MissionStatus::new()), forward_targets(2), &config);
    assert_eq!(mission.run(CancellationToken::new()).await, MissionExit::Exhausted);

    let commands = vehicle.commands();
    assert_eq!(commands.len(), 2);
    assert!((commands[1].north_m - 4.0).abs() < 1e-9);
    assert!(commands[1].east_m.abs() < 1e-9);
    assert!(commands[1].yaw_deg.abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_heading_fallback_reuses_last_heading() {
    let vehicle = MockVehicle::new();
    vehicle.set_heading(Some(90.0));
    let (tx, rx) = mpsc::channel(1);
    let mission = MissionLoop::new(
        Arc::new(vehicle.clone()),
        Arc::new(MissionStatus::new()),
        WaypointFeed::from_receiver(rx),
        &scenario_config(1),
    );
    let handle = tokio::spawn(mission.run(CancellationToken::new()));

    tx.send(RelativeTarget::new(1.0, 0.0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    vehicle.set_heading(None);
    tx.send(RelativeTarget::new(1.0, 0.0)).await.unwrap();
    drop(tx);
    assert_eq!(handle.await.unwrap(), MissionExit::Exhausted);

    let commands = vehicle.commands();
    assert_eq!(commands.len(), 2);
    assert!(commands[1].north_m.abs() < 1e-9);
    assert!((commands[1].east_m - 2.0).abs() < 1e-9);
    assert!((commands[1].yaw_deg - 90.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_slow_attitude_reply_is_not_reused() {
    let vehicle = MockVehicle::new();
    // the first reply reports 0° but only arrives after the 500 ms heading timeout
    vehicle.delay_next_attitude(Duration::from_millis(600));
    let (tx, rx) = mpsc::channel(1);
    let mission = MissionLoop::new(
        Arc::new(vehicle.clone()),
        Arc::new(MissionStatus::new()),
        WaypointFeed::from_receiver(rx),
        &scenario_config(1),
    );
    let handle = tokio::spawn(mission.run(CancellationToken::new()));

    tx.send(RelativeTarget::new(1.0, 0.0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(650)).await;
    vehicle.set_heading(Some(90.0));
    tx.send(RelativeTarget::new(1.0, 0.0)).await.unwrap();
    drop(tx);
    assert_eq!(handle.await.unwrap(), MissionExit::Exhausted);

    let commands = vehicle.commands();
    assert_eq!(commands.len(), 2);
    assert!(commands[0].yaw_deg.abs() < 1e-9);
    assert!((commands[1].yaw_deg - 90.0).abs() < 1e-9);
    assert!((commands[1].north_m - 1.0).abs() < 1e-9);
    assert!((commands[1].east_m - 1.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_power_dropout_does_not_end_mission() {
    let vehicle = MockVehicle::new();
    vehicle.script_voltages([10.0, 0.0, 0.0, 0.0], BatteryTail::Repeat(10.0));
    let supervisor = supervisor_for(&vehicle, scenario_config(2));

    let report = supervisor.run(forward_targets(3), CancellationToken::new()).await;
    assert_eq!(report.cause, TerminationCause::Exhausted);
    assert!(report.is_clean());
    assert!(report.error.is_none());
    assert_eq!(report.waypoints, 3);
    assert_eq!(report.power_stats.unwrap().glitches, 3);
    assert!(!supervisor.status().is_critical_battery());
    assert!(supervisor.status().is_terminated());
    assert_eq!(vehicle.land_calls(), 0);
    assert_eq!(vehicle.stop_offboard_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_critical_crossing_lands_once() {
    let vehicle = MockVehicle::new();
    vehicle.script_voltages(std::iter::repeat_n(10.0, 43), BatteryTail::Repeat(10.0));
    let supervisor = supervisor_for(&vehicle, scenario_config(5));
    let start = Instant::now();

    let report = supervisor.run(forward_targets(100), CancellationToken::new()).await;
    // the 43rd sample at t = 42 s moves the estimate from 16% to 14%
    assert!(start.elapsed() < Duration::from_secs(43));
    assert_eq!(report.cause, TerminationCause::CriticalBattery);
    assert!((report.final_power.unwrap().percent_remaining() - 14.0).abs() < 1e-9);
    assert_eq!(report.abort, Some(AbortOutcome::Executed { offboard_stopped: true, landed: true }));
    // commands at t = 0, 5, ..., 40 s
    assert_eq!(vehicle.commands().len(), 9);
    assert_eq!(vehicle.land_calls(), 1);
    assert_eq!(vehicle.stop_offboard_calls(), 1);
    assert!(!report.is_clean());
}

#[tokio::test(start_paused = true)]
async fn test_failed_command_still_lands() {
    let vehicle = MockVehicle::new();
    vehicle.fail_command_at(5);
    vehicle.fail_stop_offboard();
    let supervisor = supervisor_for(&vehicle, scenario_config(1));

    let report = supervisor.run(forward_targets(10), CancellationToken::new()).await;
    assert_eq!(report.cause, TerminationCause::CommandFailed);
    assert!(matches!(report.error, Some(MissionError::Offboard(OffboardError::Rejected(_)))));
    assert_eq!(report.abort, Some(AbortOutcome::Executed { offboard_stopped: false, landed: true }));
    assert_eq!(vehicle.command_attempts(), 5);
    assert_eq!(vehicle.commands().len(), 4);
    assert_eq!(report.waypoints, 4);
    assert_eq!(vehicle.stop_offboard_calls(), 1);
    assert_eq!(vehicle.land_calls(), 1);
    assert_eq!(vehicle.actions()[vehicle.actions().len() - 2..], ["stop_offboard", "land"]);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_aborts_mission() {
    let vehicle = MockVehicle::new();
    let supervisor = supervisor_for(&vehicle, scenario_config(1));
    let interrupt = CancellationToken::new();
    let trigger = interrupt.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        trigger.cancel();
    });

    let report = supervisor.run(forward_targets(100), interrupt).await;
    assert_eq!(report.cause, TerminationCause::Interrupted);
    assert!(report.aborted());
    assert_eq!(vehicle.commands().len(), 3);
    assert_eq!(vehicle.land_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_telemetry_loss_aborts_mission() {
    let vehicle = MockVehicle::new();
    vehicle.script_voltages([22.2, 22.2], BatteryTail::End);
    let supervisor = supervisor_for(&vehicle, MissionConfig::default());

    let report = supervisor.run(forward_targets(100), CancellationToken::new()).await;
    assert_eq!(report.cause, TerminationCause::TelemetryLost);
    assert!(report.error.as_ref().is_some_and(MissionError::is_fatal));
    assert_eq!(vehicle.land_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stuck_power_loop_is_fatal() {
    let vehicle = MockVehicle::new();
    // blocks a worker thread, so the power loop cannot observe its cancellation
    vehicle.block_next_battery_read(Duration::from_millis(800));
    let config = MissionConfig { stop_grace: Duration::from_millis(100), ..scenario_config(1) };
    let supervisor = supervisor_for(&vehicle, config);

    let (tx, rx) = mpsc::channel::<RelativeTarget>(1);
    let watcher = vehicle.clone();
    tokio::spawn(async move {
        while watcher.battery_reads() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        drop(tx);
    });

    let report = supervisor.run(WaypointFeed::from_receiver(rx), CancellationToken::new()).await;
    assert_eq!(report.cause, TerminationCause::Exhausted);
    assert_eq!(report.error, Some(MissionError::StopTimeout("power loop")));
    assert!(report.power_stats.is_none());
    assert!(report.aborted());
    assert!(!report.is_clean());
    assert_eq!(vehicle.land_calls(), 1);
}

#[tokio::test]
async fn test_abort_runs_once() {
    let vehicle = MockVehicle::new();
    let abort = EmergencyAbort::new(Arc::new(vehicle.clone()));
    let (first, second) = tokio::join!(abort.trigger("first"), abort.trigger("second"));
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|o| o.executed()).count(), 1);
    assert!(outcomes.contains(&AbortOutcome::AlreadyTriggered));
    assert!(abort.is_triggered());
    assert_eq!(abort.trigger("third").await, AbortOutcome::AlreadyTriggered);
    assert_eq!(vehicle.land_calls(), 1);
    assert_eq!(vehicle.stop_offboard_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_unit_times_out() {
    let c_tok = CancellationToken::new();
    let stubborn = tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    });
    let res = stop_unit("stubborn unit", stubborn, &c_tok, Duration::from_secs(2)).await;
    assert_eq!(res, Err(MissionError::StopTimeout("stubborn unit")));

    let polite_tok = CancellationToken::new();
    let inner = polite_tok.clone();
    let polite = tokio::spawn(async move {
        inner.cancelled().await;
        7
    });
    assert_eq!(stop_unit("polite unit", polite, &polite_tok, Duration::from_secs(2)).await, Ok(7));
}

#[tokio::test(start_paused = true)]
async fn test_preflight_sequence() {
    let vehicle = MockVehicle::new();
    let config = MissionConfig::default();
    run_preflight(&vehicle, &config, &CancellationToken::new()).await.unwrap();
    assert_eq!(vehicle.actions(), ["hold", "arm", "takeoff", "start_offboard"]);
    let initial = vehicle.commands()[0];
    assert!((initial.down_m + config.flight_altitude_m).abs() < 1e-9);
    assert_eq!(initial.north_m, 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_preflight_interrupt_on_ground() {
    let vehicle = MockVehicle::new();
    let interrupt = CancellationToken::new();
    interrupt.cancel();
    let res = run_preflight(&vehicle, &MissionConfig::default(), &interrupt).await;
    assert_eq!(res, Err(PreflightError::Interrupted { airborne: false }));
    assert!(!res.unwrap_err().is_airborne());
    assert!(vehicle.actions().is_empty());
    assert!(vehicle.commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_preflight_interrupt_after_takeoff_lands() {
    let vehicle = MockVehicle::new();
    let config = MissionConfig { takeoff_settle: Duration::from_secs(5), ..MissionConfig::default() };
    let supervisor = supervisor_for(&vehicle, config.clone());
    let interrupt = CancellationToken::new();
    let trigger = interrupt.clone();
    tokio::spawn(async move {
        // hold and arm pause take 1 s, takeoff settles until t = 6 s
        tokio::time::sleep(Duration::from_secs(3)).await;
        trigger.cancel();
    });

    let err = run_preflight(&vehicle, &config, &interrupt).await.unwrap_err();
    assert_eq!(err, PreflightError::Interrupted { airborne: true });
    assert!(err.is_airborne());
    assert!(vehicle.commands().is_empty());
    supervisor.emergency_abort("pre-flight did not complete while airborne").await;
    assert_eq!(vehicle.actions(), ["hold", "arm", "takeoff", "stop_offboard", "land"]);
    assert_eq!(vehicle.land_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_status_reporter_stops_on_termination() {
    let status = Arc::new(MissionStatus::new());
    let handle = StatusReporter::new(Arc::clone(&status), Duration::from_secs(2)).spawn();
    tokio::time::sleep(Duration::from_secs(5)).await;
    status.mark_terminated();
    // ticks at t = 0, 2, 4 s printed, the one at 6 s sees the terminated flag
    assert_eq!(handle.await.unwrap(), 3);
}
