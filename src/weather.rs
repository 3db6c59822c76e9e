use chrono::{NaiveDate, NaiveDateTime, Timelike};
use ratatui::style::Color;

/// Icon shown for a weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconCategory {
    Clear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Storm,
}

impl IconCategory {
    /// Maps a WMO weather code onto an icon. Total over `i32`; codes outside
    /// the known ranges fall back to `PartlyCloudy`.
    pub fn classify(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1 | 2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45 | 48 => Self::Fog,
            51..=57 => Self::Drizzle,
            61..=67 | 80..=82 => Self::Rain,
            71..=77 | 85 | 86 => Self::Snow,
            95..=99 => Self::Storm,
            _ => Self::PartlyCloudy,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Clear => "☀",
            Self::PartlyCloudy => "⛅",
            Self::Overcast => "☁",
            Self::Fog => "🌫",
            Self::Drizzle => "🌦",
            Self::Rain => "🌧",
            Self::Snow => "❄",
            Self::Storm => "⛈",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "Sunny",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Overcast => "Overcast",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Storm => "Storm",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Clear => Color::Yellow,
            Self::PartlyCloudy => Color::LightYellow,
            Self::Overcast | Self::Fog => Color::Gray,
            Self::Drizzle | Self::Rain => Color::LightBlue,
            Self::Snow => Color::White,
            Self::Storm => Color::Magenta,
        }
    }
}

/// One hour of the hourly series.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub weather_code: i32,
}

impl ForecastPoint {
    pub fn date(&self) -> NaiveDate {
        self.time.date()
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    pub fn icon(&self) -> IconCategory {
        IconCategory::classify(self.weather_code)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub max_temp: f64,
    pub min_temp: f64,
    pub weather_code: i32,
}

impl DailySummary {
    pub fn icon(&self) -> IconCategory {
        IconCategory::classify(self.weather_code)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub weather_code: i32,
    pub wind_speed: f64,
    pub wind_direction: f64,

    // looked up in the hourly series at `time`
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub current: CurrentConditions,
    pub hourly: Vec<ForecastPoint>,
    pub daily: Vec<DailySummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn display_name(&self) -> String {
        match self.country.as_deref() {
            Some(country) if !country.is_empty() => format!("{}, {}", self.name, country),
            _ => self.name.clone(),
        }
    }
}
