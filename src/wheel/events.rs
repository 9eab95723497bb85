use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use super::state::Winner;

pub const SPIN_STARTED_EVENT: &str = "wheel-spin-started";
pub const SPIN_ENDED_EVENT: &str = "wheel-spin-ended";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WheelEvent {
    #[serde(rename_all = "camelCase")]
    SpinStarted {
        spin_id: String,
        started_at: DateTime<Utc>,
        start_angle: f64,
        target_angle: f64,
    },
    #[serde(rename_all = "camelCase")]
    SpinEnded { spin_id: String, winner: Winner },
}

impl WheelEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WheelEvent::SpinStarted { .. } => SPIN_STARTED_EVENT,
            WheelEvent::SpinEnded { .. } => SPIN_ENDED_EVENT,
        }
    }
}

/// Destination for start and completion notifications.
pub trait EventSink {
    fn emit(&mut self, event: WheelEvent);
}

impl EventSink for Vec<WheelEvent> {
    fn emit(&mut self, event: WheelEvent) {
        self.push(event);
    }
}

impl EventSink for UnboundedSender<WheelEvent> {
    fn emit(&mut self, event: WheelEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.send(event);
    }
}

/// Sink for hosts that only poll snapshots.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&mut self, _event: WheelEvent) {}
}
