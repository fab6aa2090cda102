use clap::builder::{styling::AnsiColor, Styles};
use clap::Parser;
use std::path::PathBuf;

const ABOUT: &str = "Precipitation forecast and simulated irrigation TUI";

const LONG_ABOUT: &str = "
TUI showing the daily precipitation probability forecast (from Open-Meteo) for a city, and a
simulated irrigation output driven by it.

Irrigation is switched off whenever a forecast day has a precipitation probability above 60%.
Otherwise it runs while the simulated soil humidity is below 76%, unless manual control is on.

The last location and humidity are saved, so subsequent runs of `irrigator` resume where you left
off unless otherwise specified.
";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[arg(help = "Location name (e.g. Zagreb, London, Buenaventura)")]
    pub location: Option<String>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100), help = "Simulated soil humidity in percent")]
    pub humidity: Option<u8>,

    #[arg(long, help = "Start with manual irrigation control enabled")]
    pub manual: bool,

    #[arg(long, help = "Print the forecast and irrigation decision, then exit")]
    pub once: bool,

    #[arg(long, requires = "once", help = "With --once, print JSON instead of text")]
    pub json: bool,

    #[arg(long, help = "Settings file [default: ~/.config/irrigator/settings.json]")]
    pub settings: Option<PathBuf>,

    #[arg(long, help = "Log file for the TUI [default: ~/.config/irrigator/irrigator.log]")]
    pub log_file: Option<PathBuf>,

    #[arg(long, help = "Minutes between automatic forecast refreshes")]
    pub refresh_minutes: Option<u64>,
}
