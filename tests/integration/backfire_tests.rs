//! Integration tests for the backfire guard against mock sensors, clock
//! and valve.

use ecu_modules::backfire::{MIN_HOLD_MS, Refusal, SAVED_TARGET_FALLBACK, TriggerOutcome};
use ecu_modules::config::{GuardConfig, RetriggerPolicy};
use ecu_modules::sensors::SensorKind;

use crate::mock_hw::{MockClock, RecordingValve, enabled, guard_with, idling, writes};

fn engaged_hold(outcome: TriggerOutcome) -> u16 {
    match outcome {
        TriggerOutcome::Engaged(e) => e.hold_ms,
        other => panic!("expected Engaged, got {other:?}"),
    }
}

// ── Hold clamping ─────────────────────────────────────────────

#[test]
fn hold_longer_than_max_is_capped() {
    let sensors = idling();
    let clock = MockClock::at(10_000);
    let (valve, _) = RecordingValve::at(30.0);
    let guard = guard_with(&sensors, &clock, Some(valve), enabled());

    assert_eq!(engaged_hold(guard.trigger(5_000)), 1_000);
    assert_eq!(guard.restore_deadline(), Some(11_000));
}

#[test]
fn zero_hold_gets_the_floor() {
    let sensors = idling();
    let clock = MockClock::at(10_000);
    let (valve, _) = RecordingValve::at(30.0);
    let guard = guard_with(&sensors, &clock, Some(valve), enabled());

    assert_eq!(engaged_hold(guard.trigger(0)), MIN_HOLD_MS);
    assert_eq!(guard.restore_deadline(), Some(10_050));
}

// ── Threshold gating ──────────────────────────────────────────

#[test]
fn rpm_just_below_minimum_is_refused() {
    let sensors = idling();
    sensors.publish(SensorKind::EngineSpeed, 799.0);
    let clock = MockClock::at(0);
    let (valve, log) = RecordingValve::at(30.0);
    let guard = guard_with(&sensors, &clock, Some(valve), enabled());

    let outcome = guard.trigger(200);
    assert!(matches!(
        outcome,
        TriggerOutcome::Refused(Refusal::RpmBelowMinimum { min_rpm: 800, .. })
    ));
    assert!(!guard.is_active());
    assert!(writes(&log).is_empty(), "refusal must not touch the valve");
}

#[test]
fn rpm_at_minimum_is_admitted() {
    let sensors = idling();
    sensors.publish(SensorKind::EngineSpeed, 800.0);
    let clock = MockClock::at(0);
    let (valve, _) = RecordingValve::at(30.0);
    let guard = guard_with(&sensors, &clock, Some(valve), enabled());

    assert!(guard.trigger(200).is_engaged());
}

#[test]
fn tps_just_above_threshold_is_refused() {
    let sensors = idling();
    sensors.publish(SensorKind::ThrottlePosition, 12.01);
    let clock = MockClock::at(0);
    let (valve, _) = RecordingValve::at(30.0);
    let guard = guard_with(&sensors, &clock, Some(valve), enabled());

    assert!(matches!(
        guard.trigger(200),
        TriggerOutcome::Refused(Refusal::ThrottleAboveThreshold { .. })
    ));
    assert!(!guard.is_active());
}

#[test]
fn tps_at_threshold_is_admitted() {
    let sensors = idling();
    sensors.publish(SensorKind::ThrottlePosition, 12.0);
    let clock = MockClock::at(0);
    let (valve, _) = RecordingValve::at(30.0);
    let guard = guard_with(&sensors, &clock, Some(valve), enabled());

    assert!(guard.trigger(200).is_engaged());
    assert!(guard.is_active());
}

#[test]
fn hysteresis_does_not_widen_entry() {
    let sensors = idling();
    sensors.publish(SensorKind::ThrottlePosition, 15.0);
    let clock = MockClock::at(0);
    let (valve, _) = RecordingValve::at(30.0);
    let config = GuardConfig {
        tps_hysteresis: 20.0,
        ..enabled()
    };
    let guard = guard_with(&sensors, &clock, Some(valve), config);

    assert!(!guard.trigger(200).is_engaged());
}

#[test]
fn missing_sensors_read_as_zero() {
    // rpm 0 < 800: a dead crank signal must never close the valve.
    let sensors = ecu_modules::sensors::SensorRegistry::new();
    let clock = MockClock::at(0);
    let (valve, _) = RecordingValve::at(30.0);
    let guard = guard_with(&sensors, &clock, Some(valve), enabled());

    assert!(matches!(
        guard.trigger(200),
        TriggerOutcome::Refused(Refusal::RpmBelowMinimum { .. })
    ));
}

// ── Override lifecycle ────────────────────────────────────────

#[test]
fn override_runs_for_exactly_the_hold_and_restores_once() {
    let sensors = idling();
    let clock = MockClock::at(5_000);
    let (valve, log) = RecordingValve::at(27.5);
    let guard = guard_with(&sensors, &clock, Some(valve), enabled());

    let outcome = guard.trigger(300);
    let TriggerOutcome::Engaged(e) = outcome else {
        panic!("expected Engaged, got {outcome:?}");
    };
    assert!((e.saved_percent - 27.5).abs() < f32::EPSILON);
    assert!(e.saved_from_valve);
    assert!(e.valve_commanded);

    for now in (5_000..5_300).step_by(10) {
        clock.set(now);
        assert!(guard.tick().is_none(), "restored early at {now}");
        assert!(guard.is_active());
    }
    clock.set(5_299);
    assert!(guard.tick().is_none());

    clock.set(5_300);
    let restored = guard.tick().expect("restore at deadline");
    assert!((restored.percent - 27.5).abs() < f32::EPSILON);
    assert!(!guard.is_active());

    // Further ticks are no-ops.
    clock.advance(1_000);
    assert!(guard.tick().is_none());

    assert_eq!(writes(&log), vec![0.0, 27.5]);
}

#[test]
fn retrigger_keeps_deadline_under_default_policy() {
    let sensors = idling();
    let clock = MockClock::at(1_000);
    let (valve, log) = RecordingValve::at(40.0);
    let guard = guard_with(&sensors, &clock, Some(valve), enabled());

    assert!(guard.trigger(200).is_engaged());
    let deadline = guard.restore_deadline();

    clock.advance(150);
    assert_eq!(
        guard.trigger(1_000),
        TriggerOutcome::AlreadyActive {
            restore_at_ms: 1_200
        }
    );
    assert_eq!(guard.restore_deadline(), deadline);
    assert_eq!(writes(&log).len(), 1, "re-trigger must not command the valve");
}

#[test]
fn extend_policy_moves_deadline_forward_only() {
    let sensors = idling();
    let clock = MockClock::at(1_000);
    let (valve, log) = RecordingValve::at(40.0);
    let config = GuardConfig {
        retrigger: RetriggerPolicy::Extend,
        ..enabled()
    };
    let guard = guard_with(&sensors, &clock, Some(valve), config);

    assert!(guard.trigger(500).is_engaged());

    // 1100 + 100 < 1500: not later, deadline stays.
    clock.set(1_100);
    assert!(matches!(
        guard.trigger(100),
        TriggerOutcome::AlreadyActive { restore_at_ms: 1_500 }
    ));

    clock.set(1_400);
    assert_eq!(
        guard.trigger(500),
        TriggerOutcome::Extended {
            hold_ms: 500,
            restore_at_ms: 1_900
        }
    );

    clock.set(1_899);
    assert!(guard.tick().is_none());
    clock.set(1_900);
    let restored = guard.tick().expect("restore at extended deadline");
    assert!((restored.percent - 40.0).abs() < f32::EPSILON);
    assert_eq!(writes(&log), vec![0.0, 40.0]);
}

#[test]
fn deadline_across_counter_wrap() {
    let sensors = idling();
    let clock = MockClock::at(u32::MAX - 100);
    let (valve, _) = RecordingValve::at(30.0);
    let guard = guard_with(&sensors, &clock, Some(valve), enabled());

    assert!(guard.trigger(300).is_engaged());
    assert_eq!(guard.restore_deadline(), Some(199));

    clock.set(u32::MAX);
    assert!(guard.tick().is_none());
    clock.set(198);
    assert!(guard.tick().is_none());
    clock.set(199);
    assert!(guard.tick().is_some());
}

// ── Degraded modes ────────────────────────────────────────────

#[test]
fn absent_hook_tracks_override_without_commanding() {
    let sensors = idling();
    let clock = MockClock::at(0);
    let guard = guard_with(&sensors, &clock, None, enabled());

    let TriggerOutcome::Engaged(e) = guard.trigger(100) else {
        panic!("absent hook must still engage");
    };
    assert!(!e.valve_commanded);
    assert!(!e.saved_from_valve);
    assert!((e.saved_percent - SAVED_TARGET_FALLBACK).abs() < f32::EPSILON);
    assert!(guard.is_active());

    clock.set(100);
    let restored = guard.tick().expect("restore still happens");
    assert!(!restored.valve_commanded);
    assert!(!guard.is_active());
}

#[test]
fn write_only_valve_restores_the_fallback() {
    let sensors = idling();
    let clock = MockClock::at(0);
    let (valve, log) = RecordingValve::write_only();
    let guard = guard_with(&sensors, &clock, Some(valve), enabled());

    let TriggerOutcome::Engaged(e) = guard.trigger(100) else {
        panic!("expected Engaged");
    };
    assert!(e.valve_commanded);
    assert!(!e.saved_from_valve);

    clock.set(100);
    assert!(guard.tick().is_some());
    assert_eq!(writes(&log), vec![0.0, SAVED_TARGET_FALLBACK]);
}

#[test]
fn disabled_guard_never_engages() {
    let sensors = idling();
    let clock = MockClock::at(0);
    let (valve, log) = RecordingValve::at(30.0);
    let guard = guard_with(&sensors, &clock, Some(valve), GuardConfig::default());

    assert_eq!(
        guard.trigger(200),
        TriggerOutcome::Refused(Refusal::Disabled)
    );
    assert!(writes(&log).is_empty());
}
