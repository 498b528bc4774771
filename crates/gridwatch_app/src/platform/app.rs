use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use engine_logging::{engine_info, LogDestination};
use gridwatch_core::{update, AppState, Effect, Msg, SessionState};
use log::LevelFilter;

use super::cli::Cli;
use super::effects::EffectRunner;
use super::ui;

const TICK: Duration = Duration::from_millis(75);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);
const LOG_FILE: &str = "./gridwatch.log";

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let destination = if cli.log_to_terminal {
        LogDestination::Both
    } else {
        LogDestination::File
    };
    engine_logging::initialize(destination, LevelFilter::Info, Path::new(LOG_FILE));
    engine_info!("gridwatch starting base_url={}", cli.base_url);

    let runner = EffectRunner::new(cli.engine_config())?;
    runner.load_config(cli.config_source());
    let input_rx = spawn_input_reader();

    let mut app = App::new(runner);
    app.render()?;

    while app.state.session() != SessionState::Stopped {
        let mut inbox = Vec::new();
        if let Some(msg) = app.runner.next_msg(TICK) {
            inbox.push(msg);
        }
        while let Ok(msg) = input_rx.try_recv() {
            inbox.push(msg);
        }
        for msg in inbox {
            app.dispatch_msg(msg);
        }
        if app.state.consume_dirty() {
            app.render()?;
        }
    }

    if app.stop_requested {
        app.runner.wait_for_stop(SHUTDOWN_GRACE);
    }
    engine_info!("gridwatch exiting");
    Ok(())
}

struct App {
    runner: EffectRunner,
    state: AppState,
    last_update: Option<String>,
    stop_requested: bool,
}

impl App {
    fn new(runner: EffectRunner) -> Self {
        Self {
            runner,
            state: AppState::new(),
            last_update: None,
            stop_requested: false,
        }
    }

    fn dispatch_msg(&mut self, msg: Msg) {
        let previous_cycle = self.state.latest().map(|s| s.cycle());
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        if self.state.latest().map(|s| s.cycle()) != previous_cycle {
            self.last_update = Some(Local::now().format("%H:%M:%S").to_string());
        }
        if effects.contains(&Effect::StopPolling) {
            self.stop_requested = true;
        }
        self.runner.enqueue(effects);
    }

    fn render(&self) -> io::Result<()> {
        let view = self.state.view();
        let lines = ui::render::render(&view, self.last_update.as_deref());
        let mut out = io::stdout().lock();
        write!(out, "{}", ui::constants::CLEAR_SCREEN)?;
        for line in lines {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }
}

/// Forward quit requests typed on stdin.
fn spawn_input_reader() -> mpsc::Receiver<Msg> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if matches!(line.trim(), "q" | "quit") && tx.send(Msg::QuitRequested).is_err() {
                break;
            }
        }
    });
    rx
}
