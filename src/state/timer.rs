//! Tick-driven countdown used for the per-question and whole-session timers.
//!
//! One call to [`Countdown::tick`] represents one second of wall clock. The
//! async runtime feeds ticks; tests feed them directly.

/// Remaining seconds at or below which the countdown reports urgency
pub const URGENT_THRESHOLD_SECS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
    Stopped,
}

/// What a single tick produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    Tick { remaining: u32 },
    Urgent { remaining: u32 },
    TimeUp,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    state: TimerState,
    limit: u32,
    remaining: u32,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            limit: 0,
            remaining: 0,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Seconds counted down since the last start
    pub fn elapsed(&self) -> u32 {
        self.limit.saturating_sub(self.remaining)
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Start counting down from `limit_secs`.
    ///
    /// Returns false (and changes nothing) if the countdown is already running
    /// or paused; use [`Countdown::resume`] to continue a paused one.
    pub fn start(&mut self, limit_secs: u32) -> bool {
        if matches!(self.state, TimerState::Running | TimerState::Paused) {
            tracing::debug!("Countdown already active, ignoring start");
            return false;
        }
        self.limit = limit_secs;
        self.remaining = limit_secs;
        // A zero limit still runs, so the first tick raises TimeUp
        self.state = TimerState::Running;
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.state = TimerState::Paused;
        true
    }

    /// Continue a paused countdown from the preserved remaining value
    pub fn resume(&mut self) -> bool {
        if self.state != TimerState::Paused {
            return false;
        }
        self.state = TimerState::Running;
        true
    }

    /// Cancel without raising TimeUp. Stopping an inactive countdown is a no-op.
    pub fn stop(&mut self) -> bool {
        if !matches!(self.state, TimerState::Running | TimerState::Paused) {
            return false;
        }
        self.state = TimerState::Stopped;
        true
    }

    /// Return to idle, forgetting the limit (used on exit)
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance by one second. Only a running countdown produces signals.
    pub fn tick(&mut self) -> Vec<TimerSignal> {
        if self.state != TimerState::Running {
            return Vec::new();
        }

        self.remaining = self.remaining.saturating_sub(1);
        let mut signals = vec![TimerSignal::Tick {
            remaining: self.remaining,
        }];

        if self.remaining == 0 {
            self.state = TimerState::Expired;
            signals.push(TimerSignal::TimeUp);
        } else if self.remaining <= URGENT_THRESHOLD_SECS {
            signals.push(TimerSignal::Urgent {
                remaining: self.remaining,
            });
        }

        signals
    }
}
