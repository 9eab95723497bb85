pub mod config;
pub mod controller;
pub mod driver;
pub mod easing;
pub mod events;
pub mod planner;
pub mod scheduler;
pub mod state;

pub use config::WheelConfig;
pub use controller::{SegmentUpdate, StartOutcome, WheelController, WheelSnapshot, WheelStatus};
pub use driver::{FrameDriver, SharedWheel};
pub use easing::Easing;
pub use events::{EventSink, NoopSink, WheelEvent};
pub use planner::{plan_rotation, ExtraTurns, RotationPlan};
pub use scheduler::{FrameHandle, FrameScheduler, IntervalScheduler, ManualScheduler};
pub use state::{Progress, ResetAngle, SpinPhase, SpinState, Winner};
