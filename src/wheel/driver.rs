use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use log::info;
use tokio::{sync::Mutex, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use super::{
    controller::WheelController,
    events::EventSink,
    scheduler::{FrameScheduler, IntervalScheduler},
};

/// Roughly one display refresh at 60 Hz.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub type SharedWheel<E> = Arc<Mutex<WheelController<IntervalScheduler, E>>>;

/// Stand-in for a display refresh loop: fires the wheel's pending frame on a
/// fixed interval until stopped.
pub struct FrameDriver {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    frame_interval: Duration,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

impl FrameDriver {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            handle: None,
            cancel_token: None,
            frame_interval,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start<E>(&mut self, wheel: SharedWheel<E>) -> Result<()>
    where
        E: EventSink + Send + 'static,
    {
        if self.handle.is_some() {
            bail!("frame driver already running");
        }

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let frame_interval = self.frame_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(frame_interval);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let mut guard = wheel.lock().await;
                        if let Some(frame) = guard.scheduler_mut().take_due() {
                            let now = guard.scheduler().now_ms();
                            guard.on_frame(frame, now);
                        }
                    }
                }
            }
        });

        info!("frame driver started ({:?} per frame)", frame_interval);
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.await?;
            info!("frame driver stopped");
        }
        Ok(())
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::Segment;
    use crate::wheel::{SpinPhase, StartOutcome, WheelConfig, WheelEvent};

    #[tokio::test]
    async fn drives_a_spin_to_completion() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<WheelEvent>();
        let config = WheelConfig {
            spin_duration_ms: 80.0,
            ..WheelConfig::default()
        };
        let wheel = Arc::new(Mutex::new(WheelController::new(
            config,
            IntervalScheduler::new(),
            tx,
        )));
        {
            let mut guard = wheel.lock().await;
            guard.set_segments(vec![
                Segment::new("a", "Alpha", 1.0),
                Segment::new("b", "Bravo", 1.0),
            ]);
            guard.set_winner_id(Some("a".into()));
        }

        let mut driver = FrameDriver::new(Duration::from_millis(5));
        driver.start(wheel.clone()).unwrap();
        assert!(driver.start(wheel.clone()).is_err());

        let outcome = wheel.lock().await.start();
        assert!(matches!(outcome, StartOutcome::Started { winner_index: 0, .. }));

        let ended = time::timeout(Duration::from_secs(5), async {
            loop {
                match rx.recv().await {
                    Some(WheelEvent::SpinEnded { winner, .. }) => break Some(winner),
                    Some(_) => continue,
                    None => break None,
                }
            }
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(ended.id, "a");

        driver.stop().await.unwrap();
        assert!(!driver.is_running());
        let guard = wheel.lock().await;
        assert_eq!(guard.phase(), SpinPhase::Landed);
        assert_eq!(guard.current_angle(), guard.spin_state().target_angle);
    }
}
