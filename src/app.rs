use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::io;
use std::{time::Duration, time::Instant};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, BorderType, Borders, Gauge, Paragraph},
    Frame, Terminal,
};

use crate::irrigation::IrrigationState;
use crate::open_meteo::ForecastSource;
use crate::session::{Command, Session};

use chrono::Local;

const MISSING: &str = "--";
const POLL: Duration = Duration::from_millis(250);

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Quit,
    Command(Command),
}

fn key_input(code: KeyCode) -> Option<Input> {
    let command = match code {
        KeyCode::Char('q') | KeyCode::Esc => return Some(Input::Quit),
        KeyCode::Right => Command::NextLocation,
        KeyCode::Left => Command::PreviousLocation,
        KeyCode::Up => Command::AdjustHumidity(1),
        KeyCode::Down => Command::AdjustHumidity(-1),
        KeyCode::PageUp => Command::AdjustHumidity(10),
        KeyCode::PageDown => Command::AdjustHumidity(-10),
        KeyCode::Char('m') => Command::ToggleManual,
        KeyCode::Char('o') => Command::TurnOn,
        KeyCode::Char('f') => Command::TurnOff,
        KeyCode::Char('r') => Command::Refresh,
        KeyCode::Char(c @ '0'..='9') => Command::SetHumidity((c as u8 - b'0') * 10),
        _ => return None,
    };
    Some(Input::Command(command))
}

pub fn run_app<B: Backend, S: ForecastSource>(
    terminal: &mut Terminal<B>,
    session: &mut Session<S>,
    refresh: Duration,
) -> io::Result<()> {
    let mut last_refresh = Instant::now();
    loop {
        terminal.draw(|f| ui(f, session))?;

        if event::poll(POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key_input(key.code) {
                        Some(Input::Quit) => return Ok(()),
                        Some(Input::Command(command)) => {
                            if matches!(
                                command,
                                Command::NextLocation | Command::PreviousLocation | Command::Refresh
                            ) {
                                last_refresh = Instant::now();
                            }
                            session.handle(command);
                        }
                        None => {}
                    }
                }
            }
        }

        if last_refresh.elapsed() >= refresh {
            last_refresh = Instant::now();
            session.handle(Command::Refresh);
        }
    }
}

fn panel(title: &str) -> Block {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Yellow),
        ))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(Color::Cyan))
        .border_type(BorderType::Rounded)
}

fn display_headline<S: ForecastSource>(session: &Session<S>) -> Paragraph {
    let (name, coords) = match session.location() {
        Some(l) => (
            l.name.clone(),
            format!("{:.4}, {:.4}", l.latitude, l.longitude),
        ),
        None => (MISSING.to_string(), MISSING.to_string()),
    };
    Paragraph::new(vec![
        Line::from(vec![
            Span::raw(" "),
            Span::styled(name, Style::default().fg(Color::Yellow)),
            Span::raw(" : "),
            Span::styled(coords, Style::default().fg(Color::Blue)),
        ]),
        Line::from(format!(" {}", Local::now().format("%d-%m-%Y %H:%M"))),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .border_type(BorderType::Rounded),
    )
}

fn display_status<S: ForecastSource>(session: &Session<S>) -> Paragraph {
    let state = session.irrigation();
    let color = match state {
        IrrigationState::On => Color::Green,
        IrrigationState::Off => Color::Red,
    };
    let manual = if session.manual() { "ON" } else { "OFF" };
    let message = if session.message().is_empty() {
        MISSING.to_string()
    } else {
        session.message().to_string()
    };

    Paragraph::new(vec![
        Line::from(vec![
            Span::raw(" "),
            Span::styled(
                format!("Irrigation is {state}"),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw(format!(" {:16}", "Manual control")),
            Span::styled(manual, Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::raw(" "),
            Span::styled(message, Style::default().fg(Color::Green)),
        ]),
    ])
    .block(panel("Irrigation"))
}

fn display_humidity<S: ForecastSource>(session: &Session<S>) -> Gauge {
    let humidity = session.humidity().value();
    Gauge::default()
        .block(panel("Soil humidity simulator"))
        .gauge_style(Style::default().fg(Color::Blue))
        .percent(humidity as u16)
        .label(format!("{humidity}%"))
}

fn forecast_bars<S: ForecastSource>(session: &Session<S>) -> Vec<Bar> {
    let threshold = session.thresholds().rain_probability;
    session
        .forecast()
        .days
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let value = day.precipitation_probability.unwrap_or(0);
            let color = if session.trigger_index() == Some(i) {
                Color::Red
            } else if value > threshold {
                Color::Yellow
            } else {
                Color::Green
            };
            let text = match day.precipitation_probability {
                Some(p) => format!("{p}%"),
                None => MISSING.to_string(),
            };
            Bar::default()
                .value(value as u64)
                .text_value(text)
                .label(Line::from(day.label()))
                .style(Style::default().fg(color))
        })
        .collect()
}

fn ui<S: ForecastSource>(f: &mut Frame, session: &Session<S>) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(display_headline(session), layout[0]);
    f.render_widget(display_status(session), layout[1]);
    f.render_widget(display_humidity(session), layout[2]);

    let chart_block = panel("Maximum daily precipitation probability (%)");
    if session.forecast().is_empty() {
        let empty = Paragraph::new(format!("\n  {MISSING}")).block(chart_block);
        f.render_widget(empty, layout[3]);
    } else {
        let bars = forecast_bars(session);
        let chart = BarChart::default()
            .block(chart_block)
            .data(BarGroup::default().bars(&bars))
            .bar_width(7)
            .bar_gap(1)
            .max(100);
        f.render_widget(chart, layout[3]);
    }

    let help = Paragraph::new(Line::from(vec![Span::styled(
        " ←/→ location  ↑/↓ PgUp/PgDn 0-9 humidity  m manual  o/f on/off  r refresh  q quit",
        Style::default().fg(Color::DarkGray),
    )]));
    f.render_widget(help, layout[4]);
}
