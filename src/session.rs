use std::time::{Duration, SystemTime};

use crate::scorer::{self, Classification};

/// Trial length presets. The alert threshold is where the countdown starts
/// flagging low time to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sixty,
    Fifteen,
}

impl Mode {
    pub fn seconds(&self) -> u32 {
        match self {
            Mode::Sixty => 60,
            Mode::Fifteen => 15,
        }
    }

    pub fn alert_threshold(&self) -> u32 {
        match self {
            Mode::Sixty => 10,
            Mode::Fifteen => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Finished,
}

/// How a trial ended. Exact-match completion scores by word count; the other
/// two score by character count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    ExactMatch,
    Timeout,
    Manual,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("operation not valid while session is {0:?}")]
    InvalidState(Phase),
}

/// Notifications produced by session operations, in the order they occurred.
/// The presentation layer consumes these; the session never touches display
/// state directly.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Tick { seconds_remaining: u32 },
    LowTime,
    Feedback(Classification),
    Finished { wpm: f64 },
}

/// One typing trial: target text, the typed buffer, and the countdown.
///
/// All mutation goes through the operations below; timestamps are passed in
/// so the arithmetic is deterministic under test. Invariants held here:
/// the countdown never goes negative, `Paused` always has a recorded pause
/// instant, and a finished trial has its start instant cleared and its final
/// speed computed exactly once.
#[derive(Debug)]
pub struct Session {
    target: String,
    typed: String,
    mode: Mode,
    phase: Phase,
    started_at: Option<SystemTime>,
    paused_at: Option<SystemTime>,
    paused_total: Duration,
    seconds_remaining: u32,
    low_time_sent: bool,
    final_wpm: Option<f64>,
    final_elapsed_secs: Option<f64>,
    completion: Option<Completion>,
}

impl Session {
    /// An empty slot waiting for its first `start`.
    pub fn idle() -> Self {
        Self {
            target: String::new(),
            typed: String::new(),
            mode: Mode::Sixty,
            phase: Phase::Idle,
            started_at: None,
            paused_at: None,
            paused_total: Duration::ZERO,
            seconds_remaining: 0,
            low_time_sent: false,
            final_wpm: None,
            final_elapsed_secs: None,
            completion: None,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn final_wpm(&self) -> Option<f64> {
        self.final_wpm
    }

    pub fn final_elapsed_secs(&self) -> Option<f64> {
        self.final_elapsed_secs
    }

    pub fn completion(&self) -> Option<Completion> {
        self.completion
    }

    /// Wall-clock time since start minus everything spent paused.
    pub fn active_elapsed(&self, now: SystemTime) -> Duration {
        match self.started_at {
            Some(started_at) => now
                .duration_since(started_at)
                .unwrap_or_default()
                .saturating_sub(self.paused_total),
            None => Duration::ZERO,
        }
    }

    /// Begin a fresh trial. Rejected while a trial is running or paused;
    /// from `Idle` or `Finished` the previous trial is replaced wholesale.
    pub fn start(
        &mut self,
        mode: Mode,
        target: String,
        now: SystemTime,
    ) -> Result<(), SessionError> {
        match self.phase {
            Phase::Running | Phase::Paused => Err(SessionError::InvalidState(self.phase)),
            Phase::Idle | Phase::Finished => {
                *self = Self {
                    target,
                    typed: String::new(),
                    mode,
                    phase: Phase::Running,
                    started_at: Some(now),
                    paused_at: None,
                    paused_total: Duration::ZERO,
                    seconds_remaining: mode.seconds(),
                    low_time_sent: false,
                    final_wpm: None,
                    final_elapsed_secs: None,
                    completion: None,
                };
                Ok(())
            }
        }
    }

    /// Advance the countdown by exactly one second. No-op unless running.
    /// Crossing the mode's alert threshold raises a one-shot low-time signal;
    /// reaching zero completes the trial on the timeout path.
    pub fn tick(&mut self, now: SystemTime) -> Vec<SessionEvent> {
        if self.phase != Phase::Running {
            return Vec::new();
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);

        let mut events = vec![SessionEvent::Tick {
            seconds_remaining: self.seconds_remaining,
        }];

        if !self.low_time_sent && self.seconds_remaining <= self.mode.alert_threshold() {
            self.low_time_sent = true;
            events.push(SessionEvent::LowTime);
        }

        if self.seconds_remaining == 0 {
            events.extend(self.complete(Completion::Timeout, now));
        }

        events
    }

    /// Replace the typed buffer and reclassify it. Ignored unless running.
    /// When the buffer (trailing whitespace trimmed) equals the target, the
    /// trial completes immediately on the exact-match path.
    pub fn submit(&mut self, typed: &str, now: SystemTime) -> Vec<SessionEvent> {
        if self.phase != Phase::Running {
            return Vec::new();
        }

        self.typed = typed.to_string();

        let mut events = vec![SessionEvent::Feedback(scorer::classify(
            &self.typed,
            &self.target,
        ))];

        if self.typed.trim_end() == self.target {
            events.extend(self.complete(Completion::ExactMatch, now));
        }

        events
    }

    /// Freeze the countdown and stop accepting input. Only valid from
    /// `Running`; anything else is a no-op.
    pub fn pause(&mut self, now: SystemTime) {
        if self.phase == Phase::Running {
            self.phase = Phase::Paused;
            self.paused_at = Some(now);
        }
    }

    /// Close the open pause segment and return to `Running`. Only valid
    /// from `Paused`; anything else is a no-op.
    pub fn resume(&mut self, now: SystemTime) {
        if self.phase == Phase::Paused {
            if let Some(paused_at) = self.paused_at.take() {
                self.paused_total += now.duration_since(paused_at).unwrap_or_default();
            }
            self.phase = Phase::Running;
        }
    }

    /// Stop the trial manually. Idempotent: a second call (or a call after
    /// timeout/auto-finish) does nothing. A trial that never started has
    /// nothing to score and is also a no-op.
    pub fn finish(&mut self, now: SystemTime) -> Vec<SessionEvent> {
        match self.phase {
            Phase::Running | Phase::Paused => self.complete(Completion::Manual, now),
            Phase::Idle | Phase::Finished => Vec::new(),
        }
    }

    fn complete(&mut self, completion: Completion, now: SystemTime) -> Vec<SessionEvent> {
        // A pause segment still open when the trial ends counts as paused time.
        if self.phase == Phase::Paused {
            if let Some(paused_at) = self.paused_at.take() {
                self.paused_total += now.duration_since(paused_at).unwrap_or_default();
            }
        }

        let elapsed_secs = self.active_elapsed(now).as_secs_f64();
        let wpm = match completion {
            Completion::ExactMatch => scorer::words_per_min(
                self.typed.trim_end().split_whitespace().count(),
                elapsed_secs,
            ),
            Completion::Timeout | Completion::Manual => {
                scorer::chars_per_min(self.typed.chars().count(), elapsed_secs)
            }
        };

        self.phase = Phase::Finished;
        self.completion = Some(completion);
        self.final_wpm = Some(wpm);
        self.final_elapsed_secs = Some(elapsed_secs);
        self.started_at = None;

        vec![SessionEvent::Finished { wpm }]
    }
}
