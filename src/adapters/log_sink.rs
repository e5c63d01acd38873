//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing module events to the logger
//! (UART / USB-CDC in production).  A CAN or tuning-stream adapter would
//! implement the same trait.

use log::{info, warn};

use crate::app::events::ModuleEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ModuleEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ModuleEvent) {
        match event {
            ModuleEvent::Telemetry(t) => {
                info!(
                    "TELEM | t={}ms | VSS={:.1}km/h | TPS={:.1}% | RPM={:.0} | iacv_hold={} ({}ms left)",
                    t.uptime_ms,
                    t.vehicle_speed_kph,
                    t.tps,
                    t.rpm,
                    if t.override_active { "ON" } else { "off" },
                    t.override_remaining_ms,
                );
            }
            ModuleEvent::OverrideReleased(r) => {
                info!(
                    "IACV  | released at {}ms -> {:.2}%{}",
                    r.at_ms,
                    r.percent,
                    if r.valve_commanded { "" } else { " (not commanded)" }
                );
            }
            ModuleEvent::ConfigApplied => {
                info!("CONF  | applied");
            }
            ModuleEvent::ConfigRejected(e) => {
                warn!("CONF  | rejected: {}", e);
            }
            ModuleEvent::Started => {
                info!("START | modules initialised");
            }
        }
    }
}
