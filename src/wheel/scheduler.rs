//! Host frame scheduling behind a minimal interface.
//!
//! A scheduler hands out one [`FrameHandle`] per requested frame. When the
//! host's refresh fires, it passes that handle and the frame timestamp back
//! to the controller; a cancelled handle is simply never delivered.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

pub trait FrameScheduler {
    /// Current host time in milliseconds. Only differences are meaningful.
    fn now_ms(&self) -> f64;
    fn schedule_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Single-slot queue of requested frames shared by the schedulers below.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl FrameQueue {
    pub fn request(&mut self) -> FrameHandle {
        self.next_id = self.next_id.wrapping_add(1);
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    pub fn cancel(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }

    /// Takes the frame due on this refresh, if any.
    pub fn take(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Fake clock for headless hosts and tests: time only moves on `advance`.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: f64,
    queue: FrameQueue,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: f64) -> Self {
        Self {
            now,
            queue: FrameQueue::default(),
        }
    }

    /// Moves the clock forward and returns the frame that fires, if one was
    /// requested.
    pub fn advance(&mut self, ms: f64) -> Option<FrameHandle> {
        self.now += ms;
        self.queue.take()
    }

    pub fn is_pending(&self) -> bool {
        self.queue.is_pending()
    }
}

impl FrameScheduler for ManualScheduler {
    fn now_ms(&self) -> f64 {
        self.now
    }

    fn schedule_frame(&mut self) -> FrameHandle {
        self.queue.request()
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.queue.cancel(handle);
    }
}

/// Wall-clock scheduler polled by [`super::driver::FrameDriver`].
#[derive(Debug)]
pub struct IntervalScheduler {
    origin: Instant,
    queue: FrameQueue,
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalScheduler {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            queue: FrameQueue::default(),
        }
    }

    pub fn take_due(&mut self) -> Option<FrameHandle> {
        self.queue.take()
    }
}

impl FrameScheduler for IntervalScheduler {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn schedule_frame(&mut self) -> FrameHandle {
        self.queue.request()
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.queue.cancel(handle);
    }
}
