use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    log_debug, log_info, log_warn,
    random::{RandomSource, Seed},
    segments::{SectorCache, SectorSet, Segment},
    selection::{Selection, WinnerRequest, WinnerSelector},
};

use super::{
    config::WheelConfig,
    events::{EventSink, WheelEvent},
    planner::plan_rotation,
    scheduler::{FrameHandle, FrameScheduler},
    state::{Progress, ResetAngle, SpinPhase, SpinPlan, SpinState, Winner},
};

const ENABLE_LOGS: bool = true;

pub const SPINNING_ANNOUNCEMENT: &str = "Spinning…";

/// Whether a spin can begin right now.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WheelStatus {
    Ready,
    Spinning,
    Disabled,
    /// Fewer than two segments; the wheel has nothing meaningful to pick.
    NotEnoughSegments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Started {
        spin_id: String,
        winner_index: usize,
        target_angle: f64,
        extra_turns: u32,
    },
    AlreadySpinning,
    NotReady(WheelStatus),
    /// The external winner id matched no segment and the policy refuses to guess.
    UnresolvedWinner { requested: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentUpdate {
    Applied,
    Unchanged,
    /// Held until the current spin is reset or the next one starts.
    Deferred,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelSnapshot {
    pub phase: SpinPhase,
    pub current_angle: f64,
    pub status: WheelStatus,
    pub winner: Option<Winner>,
    pub announcement: String,
    pub spin_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Owns the spin state machine and drives it one host frame at a time.
pub struct WheelController<S: FrameScheduler, E: EventSink> {
    state: SpinState,
    config: WheelConfig,
    segments: Vec<Segment>,
    sectors: SectorCache,
    pending_segments: Option<Vec<Segment>>,
    winner_id: Option<String>,
    rng: RandomSource,
    disabled: bool,
    pending_winner: Option<Winner>,
    winner: Option<Winner>,
    frame: Option<FrameHandle>,
    announcement: String,
    scheduler: S,
    events: E,
    trace_frames: bool,
}

impl<S: FrameScheduler, E: EventSink> WheelController<S, E> {
    pub fn new(config: WheelConfig, scheduler: S, events: E) -> Self {
        let trace_frames = std::env::var("WHEEL_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if let Err(err) = config.validate() {
            log_warn!("invalid wheel config ({err}); falling back to safe values");
        }

        let mut sectors = SectorCache::new();
        sectors.update(&[]);

        Self {
            state: SpinState::new(),
            config: config.sanitized(),
            segments: Vec::new(),
            sectors,
            pending_segments: None,
            winner_id: None,
            rng: RandomSource::new(None),
            disabled: false,
            pending_winner: None,
            winner: None,
            frame: None,
            announcement: String::new(),
            scheduler,
            events,
            trace_frames,
        }
    }

    pub fn set_segments(&mut self, segments: Vec<Segment>) -> SegmentUpdate {
        if self.state.is_spinning() {
            if self.pending_segments.is_none() && self.sectors.matches(&segments) {
                return SegmentUpdate::Unchanged;
            }
            log_info!("segment list changed mid-spin; deferring {} segments", segments.len());
            self.pending_segments = Some(segments);
            return SegmentUpdate::Deferred;
        }
        self.apply_segments(segments, ResetAngle::Zero)
    }

    /// Swaps in a new segment list. The wheel returns to `Idle` with the angle
    /// handled per `reset_angle`.
    fn apply_segments(
        &mut self,
        segments: Vec<Segment>,
        reset_angle: ResetAngle,
    ) -> SegmentUpdate {
        if !self.sectors.update(&segments) {
            return SegmentUpdate::Unchanged;
        }

        {
            let mut seen = HashSet::new();
            if let Some(dup) = segments.iter().find(|s| !seen.insert(s.id.as_str())) {
                log_warn!("duplicate segment id {:?}; the first occurrence wins", dup.id);
            }
        }

        self.segments = segments;
        self.state.cancel(reset_angle);
        self.winner = None;
        self.pending_winner = None;
        self.announcement.clear();
        log_info!("wheel rebuilt with {} sectors", self.sectors.sectors().len());
        SegmentUpdate::Applied
    }

    /// Outcome decided outside the wheel; `None` or empty samples locally.
    pub fn set_winner_id(&mut self, winner_id: Option<String>) {
        self.winner_id = winner_id;
    }

    pub fn winner_id(&self) -> Option<&str> {
        self.winner_id.as_deref()
    }

    /// Restarts the random stream. A seed makes every later draw reproducible.
    pub fn set_seed(&mut self, seed: Option<Seed>) {
        self.rng = RandomSource::new(seed.as_ref());
    }

    /// Takes effect from the next spin; an in-flight spin keeps its timing.
    pub fn set_config(&mut self, config: WheelConfig) {
        if let Err(err) = config.validate() {
            log_warn!("invalid wheel config ({err}); falling back to safe values");
        }
        self.config = config.sanitized();
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn status(&self) -> WheelStatus {
        if self.state.is_spinning() {
            WheelStatus::Spinning
        } else if self.disabled {
            WheelStatus::Disabled
        } else if self.sectors.sectors().len() < 2 {
            WheelStatus::NotEnoughSegments
        } else {
            WheelStatus::Ready
        }
    }

    pub fn start(&mut self) -> StartOutcome {
        if self.state.is_spinning() {
            return StartOutcome::AlreadySpinning;
        }

        if let Some(segments) = self.pending_segments.take() {
            self.apply_segments(segments, ResetAngle::Zero);
        }

        let status = self.status();
        if status != WheelStatus::Ready {
            return StartOutcome::NotReady(status);
        }

        let request = WinnerRequest::from_winner_id(self.winner_id.as_deref());
        let selector = WinnerSelector::new(self.config.unmatched_winner);
        let index = match selector.select(
            &self.segments,
            self.sectors.sectors(),
            &request,
            &mut self.rng,
        ) {
            Selection::Chosen(index) => index,
            Selection::Unresolved { requested } => {
                return StartOutcome::UnresolvedWinner { requested };
            }
            Selection::Empty => return StartOutcome::NotReady(WheelStatus::NotEnoughSegments),
        };

        let (Some(sector), Some(segment)) =
            (self.sectors.sectors().get(index), self.segments.get(index))
        else {
            return StartOutcome::NotReady(WheelStatus::NotEnoughSegments);
        };

        let extra_turns = self.config.extra_turns.draw(&mut self.rng);
        let rotation = plan_rotation(self.state.current_angle, sector.mid_angle, extra_turns);

        let winner = Winner {
            id: segment.id.clone(),
            label: segment.label.clone(),
            index,
        };

        let spin_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        self.state.begin_spin(SpinPlan {
            spin_id: spin_id.clone(),
            target_angle: rotation.target_angle,
            extra_turns,
            start_time: self.scheduler.now_ms(),
            duration_ms: self.config.spin_duration_ms,
            easing: self.config.easing,
            started_at,
        });

        self.winner = None;
        self.pending_winner = Some(winner);
        self.announcement = SPINNING_ANNOUNCEMENT.to_string();
        self.request_frame();

        log_info!(
            "spin {} started: sector {} of {}, {} extra turns, {:.3}° -> {:.3}°",
            spin_id,
            index,
            self.sectors.sectors().len(),
            extra_turns,
            rotation.start_angle,
            rotation.target_angle
        );

        self.events.emit(WheelEvent::SpinStarted {
            spin_id: spin_id.clone(),
            started_at,
            start_angle: rotation.start_angle,
            target_angle: rotation.target_angle,
        });

        StartOutcome::Started {
            spin_id,
            winner_index: index,
            target_angle: rotation.target_angle,
            extra_turns,
        }
    }

    /// Host refresh callback. Frames other than the one last requested are
    /// stale and ignored.
    pub fn on_frame(&mut self, handle: FrameHandle, now_ms: f64) -> SpinPhase {
        if self.frame != Some(handle) {
            log_debug!("ignoring stale frame {}", handle.id());
            return self.state.phase;
        }
        self.frame = None;
        self.tick(now_ms);
        self.state.phase
    }

    /// Advances the spin to `now_ms`. Safe to call when not spinning.
    pub fn tick(&mut self, now_ms: f64) -> Progress {
        let progress = self.state.advance(now_ms);
        match progress {
            Progress::Inactive => {}
            Progress::Running { angle, eased } => {
                if self.trace_frames {
                    log::debug!("frame t={now_ms:.1}ms eased={eased:.4} angle={angle:.3}");
                }
                if self.frame.is_none() {
                    self.request_frame();
                }
            }
            Progress::Finished { .. } => self.complete(),
        }
        progress
    }

    fn complete(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel_frame(handle);
        }
        let spin_id = self.state.spin_id.clone().unwrap_or_default();
        if let Some(winner) = self.pending_winner.take() {
            log_info!(
                "spin {} landed on {:?} (index {}) at {:.3}°",
                spin_id,
                winner.label,
                winner.index,
                self.state.current_angle
            );
            self.announcement = format!("Winner: {}", winner.label);
            self.winner = Some(winner.clone());
            self.events.emit(WheelEvent::SpinEnded { spin_id, winner });
        }
    }

    /// Stops any spin without publishing a winner and returns to `Idle`.
    /// A segment list deferred during the spin is applied here and keeps the
    /// caller's `reset_angle`.
    pub fn reset(&mut self, reset_angle: ResetAngle) {
        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel_frame(handle);
        }
        if self.state.phase == SpinPhase::Idle && self.winner.is_none() {
            return;
        }

        if self.state.is_spinning() {
            log_info!(
                "spin {} reset before landing",
                self.state.spin_id.as_deref().unwrap_or("?")
            );
        }
        self.state.cancel(reset_angle);
        self.winner = None;
        self.pending_winner = None;
        self.announcement.clear();

        if let Some(segments) = self.pending_segments.take() {
            self.apply_segments(segments, reset_angle);
        }
    }

    fn request_frame(&mut self) {
        self.frame = Some(self.scheduler.schedule_frame());
    }

    pub fn phase(&self) -> SpinPhase {
        self.state.phase
    }

    pub fn current_angle(&self) -> f64 {
        self.state.current_angle
    }

    pub fn spin_state(&self) -> &SpinState {
        &self.state
    }

    pub fn winner(&self) -> Option<&Winner> {
        self.winner.as_ref()
    }

    pub fn announcement(&self) -> &str {
        &self.announcement
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn sectors(&self) -> &SectorSet {
        self.sectors.sectors()
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    pub fn has_pending_segments(&self) -> bool {
        self.pending_segments.is_some()
    }

    pub fn snapshot(&self) -> WheelSnapshot {
        WheelSnapshot {
            phase: self.state.phase,
            current_angle: self.state.current_angle,
            status: self.status(),
            winner: self.winner.clone(),
            announcement: self.announcement.clone(),
            spin_id: self.state.spin_id.clone(),
            started_at: self.state.started_at,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheel::scheduler::ManualScheduler;

    type TestWheel = WheelController<ManualScheduler, Vec<WheelEvent>>;

    fn wheel(duration_ms: f64) -> TestWheel {
        let config = WheelConfig {
            spin_duration_ms: duration_ms,
            ..WheelConfig::default()
        };
        let mut wheel = WheelController::new(config, ManualScheduler::new(), Vec::new());
        wheel.set_segments(vec![
            Segment::new("a", "Alpha", 1.0),
            Segment::new("b", "Bravo", 3.0),
        ]);
        wheel.set_seed(Some(Seed::from(42u64)));
        wheel
    }

    fn pump(wheel: &mut TestWheel, step_ms: f64) -> usize {
        let mut frames = 0;
        while let Some(handle) = wheel.scheduler_mut().advance(step_ms) {
            let now = wheel.scheduler().now_ms();
            wheel.on_frame(handle, now);
            frames += 1;
        }
        frames
    }

    #[test]
    fn not_ready_without_two_segments() {
        let mut wheel = WheelController::new(
            WheelConfig::default(),
            ManualScheduler::new(),
            Vec::<WheelEvent>::new(),
        );
        assert_eq!(wheel.status(), WheelStatus::NotEnoughSegments);
        assert_eq!(
            wheel.start(),
            StartOutcome::NotReady(WheelStatus::NotEnoughSegments)
        );

        wheel.set_segments(vec![Segment::new("solo", "Solo", 1.0)]);
        assert_eq!(
            wheel.start(),
            StartOutcome::NotReady(WheelStatus::NotEnoughSegments)
        );
        assert_eq!(wheel.phase(), SpinPhase::Idle);
        assert!(wheel.events().is_empty());
        assert!(!wheel.scheduler().is_pending());
    }

    #[test]
    fn disabled_wheel_refuses_to_spin() {
        let mut wheel = wheel(500.0);
        wheel.set_disabled(true);
        assert_eq!(wheel.start(), StartOutcome::NotReady(WheelStatus::Disabled));
        wheel.set_disabled(false);
        assert!(matches!(wheel.start(), StartOutcome::Started { .. }));
    }

    #[test]
    fn seeded_spin_picks_reference_winner() {
        let mut wheel = wheel(500.0);
        match wheel.start() {
            StartOutcome::Started {
                winner_index,
                extra_turns,
                ..
            } => {
                assert_eq!(winner_index, 1);
                assert_eq!(extra_turns, 5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn start_while_spinning_is_ignored() {
        let mut wheel = wheel(500.0);
        let first = wheel.start();
        assert!(matches!(first, StartOutcome::Started { .. }));
        let target = wheel.spin_state().target_angle;
        assert_eq!(wheel.start(), StartOutcome::AlreadySpinning);
        assert_eq!(wheel.spin_state().target_angle, target);
        assert_eq!(wheel.events().len(), 1);
    }

    #[test]
    fn completes_exactly_once_at_target() {
        let mut wheel = wheel(500.0);
        wheel.start();
        assert_eq!(wheel.announcement(), SPINNING_ANNOUNCEMENT);
        assert!(wheel.winner().is_none());

        let frames = pump(&mut wheel, 16.0);
        assert_eq!(frames, 32);
        assert_eq!(wheel.phase(), SpinPhase::Landed);
        assert_eq!(wheel.current_angle(), wheel.spin_state().target_angle);

        let ended: Vec<_> = wheel
            .events()
            .iter()
            .filter(|e| matches!(e, WheelEvent::SpinEnded { .. }))
            .collect();
        assert_eq!(ended.len(), 1);
        assert_eq!(wheel.winner().map(|w| w.id.as_str()), Some("b"));
        assert_eq!(wheel.announcement(), "Winner: Bravo");

        // Late ticks change nothing.
        assert_eq!(wheel.tick(10_000.0), Progress::Inactive);
        assert_eq!(wheel.events().len(), 2);
    }

    #[test]
    fn stale_frame_is_ignored() {
        let mut wheel = wheel(500.0);
        wheel.start();
        let handle = wheel.scheduler_mut().advance(16.0).unwrap();
        wheel.on_frame(handle, 16.0);
        let angle = wheel.current_angle();
        // Delivering the same handle twice does nothing.
        wheel.on_frame(handle, 400.0);
        assert_eq!(wheel.current_angle(), angle);
    }

    #[test]
    fn reset_mid_spin_never_lands() {
        let mut wheel = wheel(500.0);
        wheel.start();
        for _ in 0..5 {
            let handle = wheel.scheduler_mut().advance(16.0).unwrap();
            let now = wheel.scheduler().now_ms();
            wheel.on_frame(handle, now);
        }
        let angle = wheel.current_angle();
        wheel.reset(ResetAngle::Preserve);

        assert_eq!(wheel.phase(), SpinPhase::Idle);
        assert_eq!(wheel.current_angle(), angle);
        assert!(!wheel.scheduler().is_pending());
        assert_eq!(pump(&mut wheel, 16.0), 0);
        assert!(wheel.winner().is_none());
        assert!(wheel
            .events()
            .iter()
            .all(|e| !matches!(e, WheelEvent::SpinEnded { .. })));
        assert_eq!(wheel.announcement(), "");
    }

    #[test]
    fn reset_can_zero_the_angle() {
        let mut wheel = wheel(100.0);
        wheel.start();
        pump(&mut wheel, 16.0);
        assert!(wheel.winner().is_some());
        wheel.reset(ResetAngle::Zero);
        assert_eq!(wheel.current_angle(), 0.0);
        assert!(wheel.winner().is_none());
        assert_eq!(wheel.phase(), SpinPhase::Idle);
    }

    #[test]
    fn reset_while_idle_is_a_no_op() {
        let mut wheel = wheel(100.0);
        wheel.reset(ResetAngle::Zero);
        assert_eq!(wheel.phase(), SpinPhase::Idle);
        assert!(wheel.events().is_empty());
    }

    #[test]
    fn segment_change_mid_spin_is_deferred() {
        let mut wheel = wheel(200.0);
        wheel.start();
        let update = wheel.set_segments(vec![
            Segment::new("x", "X", 1.0),
            Segment::new("y", "Y", 1.0),
            Segment::new("z", "Z", 1.0),
        ]);
        assert_eq!(update, SegmentUpdate::Deferred);
        assert_eq!(wheel.sectors().len(), 2);

        pump(&mut wheel, 16.0);
        assert_eq!(wheel.phase(), SpinPhase::Landed);
        assert_eq!(wheel.winner().map(|w| w.id.as_str()), Some("b"));
        assert!(wheel.has_pending_segments());

        assert!(matches!(wheel.start(), StartOutcome::Started { .. }));
        assert_eq!(wheel.sectors().len(), 3);
        assert!(!wheel.has_pending_segments());
    }

    fn spin_with_deferred_list(reset_angle: ResetAngle) -> (TestWheel, f64) {
        let mut wheel = wheel(500.0);
        wheel.start();
        for _ in 0..5 {
            let handle = wheel.scheduler_mut().advance(16.0).unwrap();
            let now = wheel.scheduler().now_ms();
            wheel.on_frame(handle, now);
        }
        let update = wheel.set_segments(vec![
            Segment::new("x", "X", 1.0),
            Segment::new("y", "Y", 1.0),
            Segment::new("z", "Z", 1.0),
        ]);
        assert_eq!(update, SegmentUpdate::Deferred);
        let angle = wheel.current_angle();
        assert!(angle > 0.0);
        wheel.reset(reset_angle);
        (wheel, angle)
    }

    #[test]
    fn reset_applies_deferred_segments_and_keeps_angle() {
        let (mut wheel, angle) = spin_with_deferred_list(ResetAngle::Preserve);
        assert_eq!(wheel.phase(), SpinPhase::Idle);
        assert_eq!(wheel.current_angle(), angle);
        assert_eq!(wheel.sectors().len(), 3);
        assert_eq!(wheel.segments()[0].id, "x");
        assert!(!wheel.has_pending_segments());
        assert!(wheel.winner().is_none());

        assert_eq!(pump(&mut wheel, 16.0), 0);
        assert!(wheel
            .events()
            .iter()
            .all(|e| !matches!(e, WheelEvent::SpinEnded { .. })));
    }

    #[test]
    fn reset_applies_deferred_segments_and_zeroes_angle() {
        let (wheel, _) = spin_with_deferred_list(ResetAngle::Zero);
        assert_eq!(wheel.phase(), SpinPhase::Idle);
        assert_eq!(wheel.current_angle(), 0.0);
        assert_eq!(wheel.sectors().len(), 3);
        assert!(!wheel.has_pending_segments());
        assert!(wheel
            .events()
            .iter()
            .all(|e| !matches!(e, WheelEvent::SpinEnded { .. })));
    }

    #[test]
    fn segment_change_while_idle_clears_winner() {
        let mut wheel = wheel(100.0);
        wheel.start();
        pump(&mut wheel, 16.0);
        assert!(wheel.winner().is_some());

        assert_eq!(
            wheel.set_segments(wheel.segments().to_vec()),
            SegmentUpdate::Unchanged
        );
        assert!(wheel.winner().is_some());

        let update = wheel.set_segments(vec![
            Segment::new("a", "Alpha", 2.0),
            Segment::new("b", "Bravo", 3.0),
        ]);
        assert_eq!(update, SegmentUpdate::Applied);
        assert!(wheel.winner().is_none());
        assert_eq!(wheel.phase(), SpinPhase::Idle);
        assert_eq!(wheel.current_angle(), 0.0);
    }

    #[test]
    fn unresolved_winner_refuses_spin() {
        let mut wheel = wheel(100.0);
        wheel.set_winner_id(Some("nobody".into()));
        assert_eq!(
            wheel.start(),
            StartOutcome::UnresolvedWinner {
                requested: "nobody".into()
            }
        );
        assert_eq!(wheel.phase(), SpinPhase::Idle);
        assert!(wheel.events().is_empty());
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut wheel = wheel(100.0);
        wheel.start();
        let snap = wheel.snapshot();
        assert_eq!(snap.phase, SpinPhase::Spinning);
        assert_eq!(snap.status, WheelStatus::Spinning);
        assert!(snap.spin_id.is_some());
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["phase"], "spinning");
        assert_eq!(json["announcement"], SPINNING_ANNOUNCEMENT);
    }
}
