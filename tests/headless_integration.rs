use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use takt::clock::ManualClock;
use takt::controller::{Notice, SessionController};
use takt::quotes::{HttpQuoteSource, QuoteSource};
use takt::runtime::AppEvent;
use takt::session::{Completion, Mode, Phase};

// Headless integration using the controller + event channel without a TTY.
// The manual clock stands in for wall time so elapsed arithmetic is exact.

struct CannedSource(Option<String>);

impl QuoteSource for CannedSource {
    fn fetch_quote(&self) -> Option<String> {
        self.0.clone()
    }
}

fn harness() -> (SessionController, ManualClock, Receiver<AppEvent>) {
    let (tx, rx) = mpsc::channel();
    let clock = ManualClock::new(SystemTime::UNIX_EPOCH + Duration::from_secs(10_000));
    let controller = SessionController::new(tx, Arc::new(clock.clone()));
    (controller, clock, rx)
}

/// Resolve queued quote events until the trial is running.
fn pump_start(controller: &mut SessionController, rx: &Receiver<AppEvent>) {
    for _ in 0..10 {
        if controller.session().phase() == Phase::Running {
            return;
        }
        if let Ok(AppEvent::Quote(quote)) = rx.recv_timeout(Duration::from_millis(500)) {
            controller.on_quote(quote);
        }
    }
    panic!("trial never started");
}

#[test]
fn auto_finish_beats_the_countdown() {
    let (mut controller, clock, _rx) = harness();
    controller
        .start_with_target(Mode::Sixty, "cat".to_string())
        .unwrap();

    clock.advance(Duration::from_secs(2));
    controller.tick();
    controller.tick();

    let notices = controller.submit("cat");

    // Finished immediately, long before the 60 second timeout
    assert_eq!(controller.session().phase(), Phase::Finished);
    assert_eq!(
        controller.session().completion(),
        Some(Completion::ExactMatch)
    );
    assert!(notices
        .iter()
        .any(|n| matches!(n, Notice::Finished { .. })));
    assert_eq!(controller.session().seconds_remaining(), 58);
}

#[test]
fn fetched_quote_flows_through_the_queue_into_a_trial() {
    let (mut controller, _clock, rx) = harness();
    controller
        .request_start(
            Mode::Fifteen,
            Some(CannedSource(Some("a fetched sentence".to_string()))),
        )
        .unwrap();

    pump_start(&mut controller, &rx);
    assert_eq!(controller.session().target(), "a fetched sentence");
    assert_eq!(controller.session().seconds_remaining(), 15);
}

#[test]
fn fetch_failure_still_starts_a_trial() {
    let (mut controller, _clock, rx) = harness();
    controller
        .request_start(Mode::Fifteen, Some(CannedSource(None)))
        .unwrap();

    pump_start(&mut controller, &rx);
    assert!(!controller.session().target().is_empty());
}

#[test]
fn offline_start_never_touches_the_network() {
    let (mut controller, _clock, rx) = harness();
    controller
        .request_start::<HttpQuoteSource>(Mode::Sixty, None)
        .unwrap();

    pump_start(&mut controller, &rx);
    assert!(!controller.session().target().is_empty());
}

#[test]
fn full_timed_trial_with_pause_scores_active_time_only() {
    let (mut controller, clock, _rx) = harness();
    controller
        .start_with_target(Mode::Sixty, "hello world again".to_string())
        .unwrap();

    // 10 seconds of typing
    for _ in 0..10 {
        clock.advance(Duration::from_secs(1));
        controller.tick();
    }
    controller.submit("hello worl");

    // 5 seconds paused; ticks delivered while paused change nothing
    controller.pause();
    clock.advance(Duration::from_secs(5));
    controller.tick();
    assert_eq!(controller.session().seconds_remaining(), 50);
    controller.resume();

    // 5 more seconds
    for _ in 0..5 {
        clock.advance(Duration::from_secs(1));
        controller.tick();
    }

    let notices = controller.finish();

    assert_eq!(controller.session().final_elapsed_secs(), Some(15.0));
    // 10 chars over 15 active seconds on the character formula
    let expected = (10.0 / 5.0) / (15.0 / 60.0);
    assert!((controller.session().final_wpm().unwrap() - expected).abs() < 1e-9);
    assert!(notices
        .iter()
        .any(|n| matches!(n, Notice::LeaderboardChanged(_))));
}

#[test]
fn countdown_timeout_finishes_and_emits_low_time_on_the_way() {
    let (mut controller, clock, _rx) = harness();
    controller
        .start_with_target(Mode::Fifteen, "some words to type".to_string())
        .unwrap();
    controller.submit("some words");

    let mut low_time_signals = 0;
    for _ in 0..15 {
        clock.advance(Duration::from_secs(1));
        let notices = controller.tick();
        low_time_signals += notices
            .iter()
            .filter(|n| matches!(n, Notice::LowTime))
            .count();
    }

    assert_eq!(low_time_signals, 1);
    assert_eq!(controller.session().phase(), Phase::Finished);
    assert_eq!(controller.session().completion(), Some(Completion::Timeout));

    // Ticks after the finish are inert
    clock.advance(Duration::from_secs(1));
    assert!(controller.tick().is_empty());
}

#[test]
fn scores_accumulate_on_the_leaderboard_across_trials() {
    let (mut controller, clock, _rx) = harness();

    for target in ["one two", "three four", "five six"] {
        controller
            .start_with_target(Mode::Sixty, target.to_string())
            .unwrap();
        clock.advance(Duration::from_secs(4));
        controller.submit(target);
        assert_eq!(controller.session().phase(), Phase::Finished);
    }

    // 2 words in 4 seconds every time: three identical scores
    let entries = controller.leaderboard().entries();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| (e.wpm - 30.0).abs() < 1e-9));
}
