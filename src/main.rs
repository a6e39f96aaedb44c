//! Key Counter - terminal panel counting two key/mouse skill triggers
//!
//! Global input is polled on a background thread; the panel redraws the
//! counters and flashes while an accepted trigger is held.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode as CtKeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use std::{
    fs::File,
    io::stdout,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
};

use key_counter::{
    config::{self, Config, STATE_FILE_NAME},
    input::{backend_factories, Aggregator, InputThread, TokenEvent, DEFAULT_STOP_TIMEOUT},
    store::CounterStore,
    ui::{App, AppState, CounterPanel, StatusBar, ThemeColors},
};

#[cfg(target_os = "linux")]
use key_counter::input::evdev_status;

/// Log to a file, since the terminal is taken over by the panel
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    match config::log_path().and_then(|path| File::create(path).map_err(Into::into)) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => eprintln!("Logging to stderr, log file unavailable: {}", e),
    }

    builder.init();
}

fn main() -> Result<()> {
    init_logging();

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    let state_path = config.state_path().unwrap_or_else(|e| {
        warn!("No config directory ({}), keeping counters in the working directory", e);
        STATE_FILE_NAME.into()
    });

    let mut app = App::new(config.clone(), CounterStore::new(state_path));

    // Start input capture
    let (event_tx, event_rx) = mpsc::channel::<TokenEvent>();
    let mut input = InputThread::spawn(
        Aggregator::new(app.watch_set()),
        backend_factories(&config.input),
        config.poll_interval(),
        event_tx,
    )?;

    #[cfg(target_os = "linux")]
    {
        if config.input.evdev {
            app.set_status(format!("Evdev: {}", evdev_status()));
        }
    }

    // SIGINT from outside the terminal still restores it
    let quit_flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&quit_flag);
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("Key Counter started");
    let colors = ThemeColors::from_theme(config.ui.theme);
    let tick_rate = config.refresh_interval();

    loop {
        // Process input events
        while let Ok(token_event) = event_rx.try_recv() {
            app.process_event(&token_event);
        }

        // Draw UI
        terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(5),    // Counters
                    Constraint::Length(1), // Status bar
                ])
                .split(frame.area());

            let panel = CounterPanel::new(app.keys(), app.counts(), colors)
                .delays(app.delays())
                .background(app.background());
            frame.render_widget(panel, chunks[0]);

            let elapsed = app.elapsed_formatted();
            let status = StatusBar::new(app.state.name(), &elapsed, app.total_events, colors)
                .message(app.get_status());
            frame.render_widget(status, chunks[1]);
        })?;

        // Only Ctrl+C is handled; plain keys may be triggers
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && key.code == CtKeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    app.quit();
                }
            }
        }

        if quit_flag.load(Ordering::SeqCst) {
            app.quit();
        }

        if app.state == AppState::Quitting {
            break;
        }
    }

    input.stop(DEFAULT_STOP_TIMEOUT);
    let late = app.drain_pending(&event_rx);
    if late > 0 {
        info!("processed {} event(s) queued at exit", late);
    }
    app.shutdown();

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("Key Counter stopped");
    println!("\nKey Counter session complete.");
    println!("{}", app.summary());

    Ok(())
}
