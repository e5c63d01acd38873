//! Engine modules firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  SensorRegistry   Esp32Clock   PwmIdleValve   LogEventSink   │
//! │  (SensorPort)     (ClockPort)  (IdleValvePort) (EventSink)   │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ───────────────────     │
//! │                                                              │
//! │   GPIO ISRs ──▶ IsrGlue ──▶ PulseTimer (wheel, crank)        │
//! │   detector  ──▶ IsrGlue ──▶ BackfireGuard ◀── EngineModules  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::Pin;
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::FromValueType;
use log::{info, warn};

use ecu_modules::adapters::idle_valve::PwmIdleValve;
use ecu_modules::adapters::log_sink::LogEventSink;
use ecu_modules::adapters::time::Esp32Clock;
use ecu_modules::app::ports::{ActuatorHook, ClockPort};
use ecu_modules::app::service::EngineModules;
use ecu_modules::backfire::BackfireGuard;
use ecu_modules::config::ModuleConfig;
use ecu_modules::drivers::hw_init;
use ecu_modules::isr_glue::IsrGlue;
use ecu_modules::pins;
use ecu_modules::sensors::pulse::PulseTimer;
use ecu_modules::sensors::throttle::ThrottleSensor;
use ecu_modules::sensors::wheel_speed::WheelSpeed;
use ecu_modules::sensors::{SensorKind, SensorRegistry};

/// Board default; replaced wholesale by a tuning tool at run time.
static DEFAULT_CONFIG: &[u8] = include_bytes!("../config/modules.json");

static SENSORS: SensorRegistry = SensorRegistry::new();
static WHEEL_SPEED: WheelSpeed = WheelSpeed::new();
/// Edge rate × 60 / teeth = rpm.
static CRANK: PulseTimer = PulseTimer::new(60.0 / pins::CRANK_TEETH as f32);

type IdleValve = PwmIdleValve<LedcDriver<'static>>;
type Guard = BackfireGuard<&'static SensorRegistry, Esp32Clock, IdleValve>;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  ecu-modules v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;

    let peripherals = Peripherals::take()?;
    let iacv_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default().frequency(pins::IACV_PWM_FREQ_HZ.Hz()),
    )?;
    let iacv_pin = peripherals.pins.gpio1;
    anyhow::ensure!(
        i32::from(iacv_pin.pin()) == pins::IACV_PWM_GPIO,
        "IACV pin mismatch: claimed GPIO {}, pin map says {}",
        iacv_pin.pin(),
        pins::IACV_PWM_GPIO
    );
    let iacv_channel = LedcDriver::new(peripherals.ledc.channel0, iacv_timer, iacv_pin)?;
    let valve = PwmIdleValve::with_initial_percent(iacv_channel, pins::IACV_INITIAL_PERCENT);

    // ── 3. Modules ────────────────────────────────────────────
    let guard: &'static Guard = Box::leak(Box::new(BackfireGuard::new(
        &SENSORS,
        Esp32Clock::new(),
        ActuatorHook::Present(valve),
    )));
    let glue: &'static IsrGlue<'static> = Box::leak(Box::new(
        IsrGlue::new()
            .with_wheel_speed(WHEEL_SPEED.timer())
            .with_backfire(guard),
    ));

    let mut sink = LogEventSink::new();
    let mut modules = EngineModules::new(guard, &WHEEL_SPEED, &SENSORS, Esp32Clock::new());
    modules.start(&mut sink);

    match ModuleConfig::from_json(DEFAULT_CONFIG) {
        Ok(config) => {
            if let Err(e) = modules.apply_config(config, &mut sink) {
                warn!("Board config rejected ({}), running with defaults", e);
            }
        }
        Err(e) => warn!("Board config unreadable ({}), running with defaults", e),
    }

    // Edges arrive only after the modules have been initialised.
    hw_init::init_isr_service(glue, &CRANK)?;

    // ── 4. Slow loop ──────────────────────────────────────────
    let tps = ThrottleSensor::new(pins::TPS_CLOSED_RAW, pins::TPS_OPEN_RAW);
    let clock = Esp32Clock::new();
    let mut detector_was_active = false;

    info!("Entering slow loop");
    loop {
        FreeRtos::delay_ms(modules.config().slow_tick_interval_ms);

        match hw_init::adc1_read(pins::TPS_ADC_CHANNEL).and_then(|raw| tps.percent(raw)) {
            Some(percent) => SENSORS.publish(SensorKind::ThrottlePosition, percent),
            None => SENSORS.invalidate(SensorKind::ThrottlePosition),
        }
        SENSORS.publish_pulse_rate(
            SensorKind::EngineSpeed,
            &CRANK,
            clock.now_us(),
            modules.config().edge_timeout_us(),
        );

        // Detector output is active-low; fire once per assertion.
        let detected = !hw_init::gpio_read(pins::BACKFIRE_SENSE_GPIO);
        if detected && !detector_was_active {
            glue.request_close_iacv_for_backfire(pins::BACKFIRE_HOLD_MS);
        }
        detector_was_active = detected;

        modules.on_slow_tick(&mut sink);
    }
}
