use std::fs;
use std::path::Path;

use log::LevelFilter;
use serde::Deserialize;

use crate::errors::ConfigError;
use crate::units::{Precipitation, Temperature, UnitPreferences, Wind};
use crate::window::HourlyMode;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_path: "wxcast.log".to_string(),
            log_level: LevelFilter::Info,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Api {
    pub geocoding_url: String,
    pub forecast_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            timeout_secs: 10,
            user_agent: concat!("wxcast/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct Units {
    pub temperature: Temperature,
    pub wind: Wind,
    pub precipitation: Precipitation,
}

impl From<Units> for UnitPreferences {
    fn from(u: Units) -> Self {
        UnitPreferences {
            temperature: u.temperature,
            wind: u.wind,
            precipitation: u.precipitation,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct Hourly {
    pub mode: HourlyMode,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub general: General,
    pub api: Api,
    pub units: Units,
    pub hourly: Hourly,
}

/// Loads the configuration file. Every section is optional.
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)?;
    parse_config(&toml)
}

pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(toml)?)
}
