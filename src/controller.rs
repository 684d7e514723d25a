use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::clock::Clock;
use crate::leaderboard::{Leaderboard, ScoreEntry};
use crate::quotes::{FallbackPool, QuoteSource};
use crate::runtime::{self, AppEvent, TickerHandle, TICK_INTERVAL};
use crate::scorer::Classification;
use crate::session::{Mode, Phase, Session, SessionError, SessionEvent};

/// Notifications handed to the presentation layer, in occurrence order.
/// Rendering reads session state through accessors; these carry the
/// transient signals a redraw alone would miss.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Tick { seconds_remaining: u32 },
    LowTime,
    Feedback(Classification),
    Finished { wpm: f64 },
    LeaderboardChanged(Vec<ScoreEntry>),
}

impl From<SessionEvent> for Notice {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::Tick { seconds_remaining } => Notice::Tick { seconds_remaining },
            SessionEvent::LowTime => Notice::LowTime,
            SessionEvent::Feedback(kind) => Notice::Feedback(kind),
            SessionEvent::Finished { wpm } => Notice::Finished { wpm },
        }
    }
}

/// Owns the single active session, the leaderboard, and the ticker handle.
///
/// Every method is called from the one thread draining the event channel,
/// so operations never interleave. Background work (the quote fetch, the
/// ticker) only ever posts events back into that same channel.
pub struct SessionController {
    session: Session,
    leaderboard: Leaderboard,
    pool: FallbackPool,
    clock: Arc<dyn Clock>,
    tx: Sender<AppEvent>,
    ticker: Option<TickerHandle>,
    pending_mode: Option<Mode>,
}

impl SessionController {
    pub fn new(tx: Sender<AppEvent>, clock: Arc<dyn Clock>) -> Self {
        Self {
            session: Session::idle(),
            leaderboard: Leaderboard::new(),
            pool: FallbackPool::new(),
            clock,
            tx,
            ticker: None,
            pending_mode: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// True while a quote fetch is in flight for an upcoming trial.
    pub fn start_pending(&self) -> bool {
        self.pending_mode.is_some()
    }

    /// Kick off a new trial. With a source, the quote fetch runs on a worker
    /// thread and the trial begins when its result lands in the queue; the
    /// fallback pool covers a failed fetch. Without a source the resolution
    /// still goes through the queue so ordering guarantees hold.
    pub fn request_start<S: QuoteSource>(
        &mut self,
        mode: Mode,
        source: Option<S>,
    ) -> Result<(), SessionError> {
        match self.session.phase() {
            Phase::Running | Phase::Paused => {
                return Err(SessionError::InvalidState(self.session.phase()))
            }
            Phase::Idle | Phase::Finished => {}
        }

        self.pending_mode = Some(mode);
        match source {
            Some(source) => runtime::spawn_quote_fetch(self.tx.clone(), source),
            None => {
                let _ = self.tx.send(AppEvent::Quote(None));
            }
        }
        Ok(())
    }

    /// Begin a trial with a caller-supplied target, skipping the fetch.
    pub fn start_with_target(&mut self, mode: Mode, target: String) -> Result<(), SessionError> {
        self.session.start(mode, target, self.clock.now())?;
        self.restart_ticker();
        Ok(())
    }

    /// A fetch result arrived. Empty or missing quotes fall back to the
    /// local pool, so a pending start always gets a target. Results with no
    /// pending start (e.g. superseded by a custom-target start) are dropped.
    pub fn on_quote(&mut self, quote: Option<String>) -> Vec<Notice> {
        let Some(mode) = self.pending_mode.take() else {
            return Vec::new();
        };

        let target = quote
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| self.pool.next());

        if self.session.start(mode, target, self.clock.now()).is_ok() {
            self.restart_ticker();
        }
        Vec::new()
    }

    pub fn tick(&mut self) -> Vec<Notice> {
        let events = self.session.tick(self.clock.now());
        self.after_session_events(events)
    }

    pub fn submit(&mut self, typed: &str) -> Vec<Notice> {
        let events = self.session.submit(typed, self.clock.now());
        self.after_session_events(events)
    }

    pub fn pause(&mut self) {
        self.session.pause(self.clock.now());
        if self.session.phase() == Phase::Paused {
            self.cancel_ticker();
        }
    }

    pub fn resume(&mut self) {
        self.session.resume(self.clock.now());
        if self.session.phase() == Phase::Running && self.ticker.is_none() {
            self.restart_ticker();
        }
    }

    pub fn finish(&mut self) -> Vec<Notice> {
        let events = self.session.finish(self.clock.now());
        self.after_session_events(events)
    }

    /// Common tail for operations that may have completed the trial:
    /// cancel the ticker and record the score exactly once.
    fn after_session_events(&mut self, events: Vec<SessionEvent>) -> Vec<Notice> {
        let finished = events
            .iter()
            .any(|e| matches!(e, SessionEvent::Finished { .. }));

        let mut notices: Vec<Notice> = events.into_iter().map(Notice::from).collect();

        if finished {
            self.cancel_ticker();
            if let Some(wpm) = self.session.final_wpm() {
                let entries = self.leaderboard.record(wpm).to_vec();
                notices.push(Notice::LeaderboardChanged(entries));
            }
        }

        notices
    }

    fn restart_ticker(&mut self) {
        self.cancel_ticker();
        self.ticker = Some(runtime::spawn_ticker(self.tx.clone(), TICK_INTERVAL));
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}
