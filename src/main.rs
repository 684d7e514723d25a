pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::{
        mpsc::{self, Receiver},
        Arc,
    },
};

use takt::{
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    controller::{Notice, SessionController},
    quotes::HttpQuoteSource,
    runtime::{self, AppEvent},
    scorer::Classification,
    session::{Mode, Phase},
};

/// terminal typing speed test with timed trials and a session leaderboard
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing speed test. Type a fetched quote against a 60 or 15 second countdown, get live mistake feedback, and chase your top five speeds."
)]
pub struct Cli {
    /// trial length
    #[clap(short = 'm', long, value_enum)]
    mode: Option<ModeArg>,

    /// skip the remote quote fetch and draw from the built-in sentences
    #[clap(long)]
    offline: bool,

    /// fixed target sentence to type instead of a fetched quote
    #[clap(short = 'q', long)]
    quote: Option<String>,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum ModeArg {
    Sixty,
    Fifteen,
}

impl ModeArg {
    fn as_mode(&self) -> Mode {
        match self {
            ModeArg::Sixty => Mode::Sixty,
            ModeArg::Fifteen => Mode::Fifteen,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sixty" => Some(ModeArg::Sixty),
            "fifteen" => Some(ModeArg::Fifteen),
            _ => None,
        }
    }
}

/// CLI flags merged over the saved config.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub mode: ModeArg,
    pub offline: bool,
    pub quote: Option<String>,
}

impl RuntimeSettings {
    fn merge(cli: &Cli, cfg: &Config) -> Self {
        let mode = cli
            .mode
            .or_else(|| ModeArg::from_name(&cfg.mode))
            .unwrap_or(ModeArg::Sixty);
        Self {
            mode,
            offline: cli.offline || cfg.offline,
            quote: cli.quote.clone(),
        }
    }
}

impl From<&RuntimeSettings> for Config {
    fn from(rs: &RuntimeSettings) -> Self {
        Self {
            mode: rs.mode.to_string().to_lowercase(),
            offline: rs.offline,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Typing,
    Results,
}

pub struct App {
    pub controller: SessionController,
    pub screen: Screen,
    pub feedback: Option<Classification>,
    pub low_time: bool,
    pub mode: Mode,
    pub offline: bool,
    pub custom_quote: Option<String>,
}

impl App {
    pub fn new(controller: SessionController, settings: &RuntimeSettings) -> Self {
        Self {
            controller,
            screen: Screen::Typing,
            feedback: None,
            low_time: false,
            mode: settings.mode.as_mode(),
            offline: settings.offline,
            custom_quote: settings.quote.clone(),
        }
    }

    /// Kick off a trial; a rejected request (already running/paused) is
    /// simply ignored.
    fn start_trial(&mut self) {
        let result = match &self.custom_quote {
            Some(quote) => self.controller.start_with_target(self.mode, quote.clone()),
            None => {
                let source = (!self.offline).then(HttpQuoteSource::new);
                self.controller.request_start(self.mode, source)
            }
        };

        if result.is_ok() {
            self.feedback = None;
            self.low_time = false;
            self.screen = Screen::Typing;
        }
    }

    fn apply(&mut self, notices: Vec<Notice>) {
        for notice in notices {
            match notice {
                Notice::Feedback(kind) => self.feedback = Some(kind),
                Notice::LowTime => self.low_time = true,
                Notice::Finished { .. } => self.screen = Screen::Results,
                Notice::Tick { .. } | Notice::LeaderboardChanged(_) => {}
            }
        }
    }

    /// Apply an edit to a copy of the typed buffer and resubmit the whole
    /// thing, so classification always sees the full text.
    fn edit_typed(&mut self, edit: impl FnOnce(&mut String)) {
        let mut buffer = self.controller.session().typed().to_string();
        edit(&mut buffer);
        let notices = self.controller.submit(&buffer);
        self.apply(notices);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let settings = RuntimeSettings::merge(&cli, &store.load());
    let _ = store.save(&Config::from(&settings));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    runtime::spawn_input_reader(tx.clone());
    let controller = SessionController::new(tx, Arc::new(SystemClock));
    let mut app = App::new(controller, &settings);

    let res = run_app(&mut terminal, &mut app, &rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: &Receiver<AppEvent>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| draw(app, f))?;

        match rx.recv()? {
            AppEvent::Tick => {
                let notices = app.controller.tick();
                app.apply(notices);
            }
            AppEvent::Quote(quote) => {
                let notices = app.controller.on_quote(quote);
                app.apply(notices);
                if app.controller.session().phase() == Phase::Running {
                    app.screen = Screen::Typing;
                }
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
                {
                    break;
                }
                if key.code == KeyCode::Esc {
                    break;
                }
                handle_key(app, key);
            }
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let phase = app.controller.session().phase();

    match (phase, key.code) {
        (Phase::Running, KeyCode::Char(c)) => app.edit_typed(|buffer| buffer.push(c)),
        (Phase::Running, KeyCode::Backspace) => app.edit_typed(|buffer| {
            buffer.pop();
        }),
        (Phase::Running, KeyCode::Tab) => app.controller.pause(),
        (Phase::Paused, KeyCode::Tab) => app.controller.resume(),
        (Phase::Running | Phase::Paused, KeyCode::Enter) => {
            let notices = app.controller.finish();
            app.apply(notices);
        }
        (Phase::Idle | Phase::Finished, KeyCode::Char('s')) => app.start_trial(),
        _ => {}
    }
}

fn draw(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}
