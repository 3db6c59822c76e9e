use std::path::PathBuf;

use clap::builder::{styling::AnsiColor, Styles};
use clap::Parser;

use crate::config::Config;
use crate::units::{Precipitation, Temperature, Wind};
use crate::window::HourlyMode;

const ABOUT: &str = "Open-Meteo weather TUI";

const LONG_ABOUT: &str = "
TUI for viewing current conditions and the daily and hourly forecast sourced from Open-Meteo.

Search for any place by name (e.g. Berlin, São Paulo, Madison). The best match from the Open-Meteo
geocoding service is used. Press / inside the program to search again, t/w/p to switch the
temperature, wind and precipitation units.

Settings can be kept in a TOML file passed with --config; command line options win over the file.
";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[arg(help = "Place to search for on startup (e.g. Berlin)")]
    pub location: Option<String>,

    #[arg(short, long, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, help = "Temperature units")]
    pub temperature: Option<Temperature>,

    #[arg(long, value_enum, help = "Wind speed units")]
    pub wind: Option<Wind>,

    #[arg(long, value_enum, help = "Precipitation units")]
    pub precipitation: Option<Precipitation>,

    #[arg(long, value_enum, help = "Browse hours by page or by fixed 6-hour block")]
    pub hourly: Option<HourlyMode>,
}

impl Args {
    /// Lays command line overrides over the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(t) = self.temperature {
            config.units.temperature = t;
        }
        if let Some(w) = self.wind {
            config.units.wind = w;
        }
        if let Some(p) = self.precipitation {
            config.units.precipitation = p;
        }
        if let Some(mode) = self.hourly {
            config.hourly.mode = mode;
        }
    }

    /// The startup search, ignoring blank input.
    pub fn query(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "wxcast",
            "Madison",
            "--temperature",
            "imperial",
            "--precipitation",
            "in",
            "--hourly",
            "blocks",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.units.temperature, Temperature::Imperial);
        assert_eq!(config.units.wind, Wind::Kmh);
        assert_eq!(config.units.precipitation, Precipitation::In);
        assert_eq!(config.hourly.mode, HourlyMode::Blocks);
        assert_eq!(args.query(), Some("Madison"));
    }

    #[test]
    fn test_blank_location() {
        let args = Args::parse_from(["wxcast", "  "]);
        assert_eq!(args.query(), None);
        let args = Args::parse_from(["wxcast"]);
        assert_eq!(args.query(), None);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_rejects_unknown_unit() {
        assert!(Args::try_parse_from(["wxcast", "--wind", "knots"]).is_err());
    }
}
