use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use std::{env, error::Error, io};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod error;
mod irrigation;
mod locations;
mod open_meteo;
mod session;
mod settings;

use crate::app::run_app;
use crate::cli::Args;
use crate::irrigation::{Humidity, IrrigationState};
use crate::locations::Location;
use crate::open_meteo::{Forecast, OpenMeteo};
use crate::session::{Command, Session};
use crate::settings::Settings;

const DEFAULT_LOG_FILTER: &str = "info";

/// `RUST_LOG` when set and valid, otherwise `info`.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Log to `log_file` when given (the TUI owns the terminal), otherwise to stderr.
fn init_logging(log_file: Option<&Path>) -> error::Result<()> {
    let filter = log_filter(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .init(),
    }
    Ok(())
}

#[derive(Serialize)]
struct Report<'a> {
    location: Option<&'a Location>,
    forecast: &'a Forecast,
    humidity: Humidity,
    manual: bool,
    irrigation: IrrigationState,
    message: &'a str,
    trigger_index: Option<usize>,
}

fn print_report(session: &Session<OpenMeteo>, json: bool) -> error::Result<()> {
    let report = Report {
        location: session.location(),
        forecast: session.forecast(),
        humidity: session.humidity(),
        manual: session.manual(),
        irrigation: session.irrigation(),
        message: session.message(),
        trigger_index: session.trigger_index(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(l) = report.location {
        println!("{} ({:.4}, {:.4})", l.name, l.latitude, l.longitude);
    }
    for (i, day) in report.forecast.days.iter().enumerate() {
        let probability = match day.precipitation_probability {
            Some(p) => format!("{p:>3}%"),
            None => "  --".to_string(),
        };
        let marker = if report.trigger_index == Some(i) { " *" } else { "" };
        println!("  {} {probability}{marker}", day.label());
    }
    println!("Soil humidity {}%", report.humidity.value());
    println!("Irrigation is {}", report.irrigation);
    if !report.message.is_empty() {
        println!("{}", report.message);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if args.once {
        init_logging(None)?;
    } else {
        let log_file = match args.log_file.clone() {
            Some(path) => path,
            None => settings::default_log_path()?,
        };
        init_logging(Some(&log_file))?;
    }

    let settings_path = match args.settings.clone() {
        Some(path) => path,
        None => settings::default_settings_path()?,
    };
    let mut settings = Settings::load(&settings_path)?;

    let selected = match (&args.location, &settings.location) {
        (Some(name), _) => locations::find(&settings.locations, name)?,
        (None, Some(name)) => locations::find(&settings.locations, name).unwrap_or_else(|err| {
            warn!(%err, "saved location not found, using the first one");
            0
        }),
        (None, None) => 0,
    };
    let humidity = args.humidity.map(Humidity::new).unwrap_or(settings.humidity);

    let mut session = Session::new(
        OpenMeteo,
        settings.locations.clone(),
        humidity,
        settings.thresholds,
    );
    if args.manual {
        session.handle(Command::ToggleManual);
    }
    session.handle(Command::SelectLocation(selected));

    if args.once {
        print_report(&session, args.json)?;
        return Ok(());
    }

    let refresh =
        Settings::refresh_interval(args.refresh_minutes.unwrap_or(settings.refresh_minutes));

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut session, refresh);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    settings.location = session.location().map(|l| l.name.clone());
    settings.humidity = session.humidity();
    settings.save(&settings_path)?;
    info!(path = %settings_path.display(), "session saved");

    Ok(())
}
