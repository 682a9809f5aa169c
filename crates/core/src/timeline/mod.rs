/// Largest simulated step a single tick may take, in seconds.
pub const MAX_DELTA: f32 = 0.05;

/// Elapsed simulated time, advanced once per tick.
///
/// Accumulated in `f64`: an `f32` total stops absorbing 60 Hz steps after
/// a few days of uptime.
#[derive(Debug, Default, Clone)]
pub struct AnimationClock {
    elapsed: f64,
    last_frame_ms: Option<f64>,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn last_frame_ms(&self) -> Option<f64> {
        self.last_frame_ms
    }

    /// Forgets the last tick timestamp so the next tick starts from zero
    /// delta. Elapsed time is kept.
    pub fn reset_timestamp(&mut self) {
        self.last_frame_ms = None;
    }

    /// Advances by an explicit step, clamped to `[0, MAX_DELTA]`.
    pub fn advance(&mut self, delta: f32) -> f32 {
        let delta = if delta.is_finite() {
            delta.clamp(0.0, MAX_DELTA)
        } else {
            0.0
        };
        self.elapsed += f64::from(delta);
        delta
    }

    /// Advances from a host timestamp in milliseconds and returns the step
    /// taken. The first tick after a reset only records the timestamp.
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let delta = match self.last_frame_ms {
            None => 0.0,
            Some(last) => ((now_ms - last) / 1000.0) as f32,
        };
        self.last_frame_ms = Some(now_ms);
        self.advance(delta)
    }
}

/// Handle for one requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Host-side frame scheduling, e.g. a display-refresh callback.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Scheduler that only remembers the outstanding request. The host decides
/// when to fire it, which suits headless playback and tests.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Option<FrameToken>,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The request that would fire next, if any.
    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    /// Number of requests cancelled so far.
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next_id += 1;
        let token = FrameToken(self.next_id);
        self.pending = Some(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
            self.cancelled += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Stopped,
    Running { pending: Option<FrameToken> },
}

/// Owns the animation clock and the start/stop lifecycle of the frame loop.
///
/// The driver never owns a thread. Callbacks carrying a token that is no
/// longer pending are ignored, so [`stop`](Self::stop) takes effect
/// immediately.
#[derive(Debug)]
pub struct FrameDriver<S> {
    scheduler: S,
    clock: AnimationClock,
    state: DriverState,
}

impl<S: FrameScheduler> FrameDriver<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            clock: AnimationClock::new(),
            state: DriverState::Stopped,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, DriverState::Running { .. })
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Stopped -> Running. Requests the first frame. No-op when running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.clock.reset_timestamp();
        let token = self.scheduler.request_frame();
        self.state = DriverState::Running {
            pending: Some(token),
        };
    }

    /// Running -> Stopped. Cancels the outstanding request. No-op when
    /// already stopped.
    pub fn stop(&mut self) {
        if let DriverState::Running { pending } = self.state {
            if let Some(token) = pending {
                self.scheduler.cancel_frame(token);
            }
            self.state = DriverState::Stopped;
        }
    }

    /// Accepts a due frame. Returns the elapsed time to render at, or `None`
    /// when `token` is stale or the driver is stopped.
    pub fn begin_tick(&mut self, token: FrameToken, now_ms: f64) -> Option<f64> {
        match self.state {
            DriverState::Running {
                pending: Some(pending),
            } if pending == token => {
                self.state = DriverState::Running { pending: None };
                self.clock.tick(now_ms);
                Some(self.clock.elapsed())
            }
            _ => None,
        }
    }

    /// Fixed-step variant of [`begin_tick`](Self::begin_tick) for headless
    /// playback. Only runs while started.
    pub fn begin_step(&mut self, delta: f32) -> Option<f64> {
        match self.state {
            DriverState::Running { pending } => {
                if let Some(token) = pending {
                    self.scheduler.cancel_frame(token);
                }
                self.state = DriverState::Running { pending: None };
                self.clock.advance(delta);
                Some(self.clock.elapsed())
            }
            DriverState::Stopped => None,
        }
    }

    /// Requests the next frame if the loop is still running.
    pub fn end_tick(&mut self) {
        if let DriverState::Running { pending: None } = self.state {
            let token = self.scheduler.request_frame();
            self.state = DriverState::Running {
                pending: Some(token),
            };
        }
    }
}
