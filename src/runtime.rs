use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::quotes::QuoteSource;

/// The countdown advances one second per tick.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Unified event type consumed by the app loop. Everything that can touch
/// session state arrives through one channel with one consumer, so every
/// operation runs to completion before the next begins.
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// Outcome of a background quote fetch; None means fall back locally.
    Quote(Option<String>),
}

/// Forwards crossterm input into the shared event channel.
pub fn spawn_input_reader(tx: Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::read() {
            Ok(CtEvent::Key(key)) => {
                if tx.send(AppEvent::Key(key)).is_err() {
                    break;
                }
            }
            Ok(CtEvent::Resize(_, _)) => {
                if tx.send(AppEvent::Resize).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(_) => break,
        }
    });
}

/// Handle to a periodic tick sender. Cancelling (or dropping) the handle
/// stops the stream; the flag is checked on wake, before every send.
/// Consumers still guard on session phase, which makes a tick already in
/// the queue at cancel time harmless.
#[derive(Debug)]
pub struct TickerHandle {
    stop: Arc<AtomicBool>,
}

impl TickerHandle {
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start a ticker that posts `AppEvent::Tick` every `interval` until the
/// returned handle is cancelled or the receiver goes away.
pub fn spawn_ticker(tx: Sender<AppEvent>, interval: Duration) -> TickerHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();

    thread::spawn(move || loop {
        thread::sleep(interval);
        if flag.load(Ordering::Relaxed) {
            break;
        }
        if tx.send(AppEvent::Tick).is_err() {
            break;
        }
    });

    TickerHandle { stop }
}

/// Run one quote fetch off the control path and post the outcome back into
/// the queue. The fetch can block up to its timeout without ever delaying
/// ticks or input handling.
pub fn spawn_quote_fetch<S: QuoteSource>(tx: Sender<AppEvent>, source: S) {
    thread::spawn(move || {
        let quote = source.fetch_quote();
        let _ = tx.send(AppEvent::Quote(quote));
    });
}
