//! Interrupt glue wired to a real guard and wheel-speed timer, with edges
//! delivered from another thread the way the capture IRQ would.

use std::thread;

use ecu_modules::app::ports::ActuatorHook;
use ecu_modules::backfire::{BackfireGuard, TriggerOutcome};
use ecu_modules::isr_glue::IsrGlue;
use ecu_modules::sensors::wheel_speed::WheelSpeed;

use crate::mock_hw::{MockClock, RecordingValve, enabled, idling, writes};

#[test]
fn glue_without_guard_reports_not_initialized() {
    let wheel = WheelSpeed::new();
    let glue = IsrGlue::new().with_wheel_speed(wheel.timer());

    assert_eq!(
        glue.request_close_iacv_for_backfire(200),
        TriggerOutcome::NotInitialized
    );
    assert!(!glue.is_backfire_iacv_active());
}

#[test]
fn glue_forwards_backfire_requests() {
    let sensors = idling();
    let clock = MockClock::at(0);
    let (valve, log) = RecordingValve::at(20.0);
    let guard = BackfireGuard::new(&sensors, &clock, ActuatorHook::Present(valve));
    guard.apply_config(enabled()).expect("valid config");

    let glue = IsrGlue::new().with_backfire(&guard);
    assert!(glue.request_close_iacv_for_backfire(100).is_engaged());
    assert!(glue.is_backfire_iacv_active());

    clock.set(100);
    assert!(guard.tick().is_some());
    assert!(!glue.is_backfire_iacv_active());
    assert_eq!(writes(&log), vec![0.0, 20.0]);
}

#[test]
fn edges_from_interrupt_thread_reach_the_slow_side() {
    let wheel = WheelSpeed::new();
    let glue = IsrGlue::new().with_wheel_speed(wheel.timer());

    thread::scope(|s| {
        s.spawn(|| {
            // Steady 2 ms period, starting just before the µs counter wraps.
            let mut ts = u32::MAX - 5_000;
            for _ in 0..1_000 {
                glue.wheel_speed_capture_us(ts);
                ts = ts.wrapping_add(2_000);
            }
        });
        s.spawn(|| {
            for _ in 0..1_000 {
                let kph = wheel.speed_kph();
                assert!(kph == 0.0 || (kph - 3_420.0).abs() < 1e-2, "torn read {kph}");
            }
        });
    });

    assert!((wheel.speed_kph() - 3_420.0).abs() < 1e-2);
}

#[test]
fn concurrent_requests_and_ticks_keep_valve_writes_paired() {
    let sensors = idling();
    let clock = MockClock::at(0);
    let (valve, log) = RecordingValve::at(40.0);
    let guard = BackfireGuard::new(&sensors, &clock, ActuatorHook::Present(valve));
    guard.apply_config(enabled()).expect("valid config");
    let glue = IsrGlue::new().with_backfire(&guard);

    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..2_000 {
                let _ = glue.request_close_iacv_for_backfire(30);
                thread::yield_now();
            }
        });
        s.spawn(|| {
            for _ in 0..2_000 {
                clock.advance(10);
                let _ = guard.tick();
                thread::yield_now();
            }
        });
    });

    // Flush any override still pending when both threads stopped.
    clock.advance(1_000);
    let _ = guard.tick();
    assert!(!guard.is_active());
    assert!(!guard.state().active);

    let log = writes(&log);
    assert!(!log.is_empty());
    assert_eq!(log.len() % 2, 0, "unpaired writes: {log:?}");
    for pair in log.chunks(2) {
        assert_eq!(pair, [0.0, 40.0], "out of order: {log:?}");
    }
}
