use clap::ValueEnum;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Wind {
    #[default]
    Kmh,
    Mph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Precipitation {
    #[default]
    Mm,
    In,
}

/// A change to exactly one unit dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSetting {
    Temperature(Temperature),
    Wind(Wind),
    Precipitation(Precipitation),
}

/// Unit parameters understood by the forecast API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParams {
    pub temperature_unit: &'static str,
    pub wind_unit: &'static str,
    pub precipitation_unit: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitPreferences {
    pub temperature: Temperature,
    pub wind: Wind,
    pub precipitation: Precipitation,
}

impl UnitPreferences {
    pub fn to_query_params(&self) -> QueryParams {
        QueryParams {
            temperature_unit: match self.temperature {
                Temperature::Metric => "celsius",
                Temperature::Imperial => "fahrenheit",
            },
            wind_unit: match self.wind {
                Wind::Kmh => "kmh",
                Wind::Mph => "mph",
            },
            precipitation_unit: match self.precipitation {
                Precipitation::Mm => "mm",
                Precipitation::In => "inch",
            },
        }
    }

    pub fn set(&mut self, setting: UnitSetting) {
        match setting {
            UnitSetting::Temperature(t) => self.temperature = t,
            UnitSetting::Wind(w) => self.wind = w,
            UnitSetting::Precipitation(p) => self.precipitation = p,
        }
    }

    pub fn toggled_temperature(&self) -> UnitSetting {
        UnitSetting::Temperature(match self.temperature {
            Temperature::Metric => Temperature::Imperial,
            Temperature::Imperial => Temperature::Metric,
        })
    }

    pub fn toggled_wind(&self) -> UnitSetting {
        UnitSetting::Wind(match self.wind {
            Wind::Kmh => Wind::Mph,
            Wind::Mph => Wind::Kmh,
        })
    }

    pub fn toggled_precipitation(&self) -> UnitSetting {
        UnitSetting::Precipitation(match self.precipitation {
            Precipitation::Mm => Precipitation::In,
            Precipitation::In => Precipitation::Mm,
        })
    }

    pub fn temperature_label(&self) -> &'static str {
        match self.temperature {
            Temperature::Metric => "°C",
            Temperature::Imperial => "°F",
        }
    }

    pub fn wind_label(&self) -> &'static str {
        match self.wind {
            Wind::Kmh => "km/h",
            Wind::Mph => "mph",
        }
    }

    pub fn precipitation_label(&self) -> &'static str {
        match self.precipitation {
            Precipitation::Mm => "mm",
            Precipitation::In => "in",
        }
    }
}

pub mod direction {
    const COMPASS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];

    pub fn degree_to_compass(deg: f64) -> &'static str {
        let deg = deg.rem_euclid(360.0);
        let val = (deg / 22.5 + 0.5) as usize;
        COMPASS[val % 16]
    }

    #[test]
    fn test_degree_to_compass() {
        assert_eq!(degree_to_compass(0.0), "N");
        assert_eq!(degree_to_compass(90.0), "E");
        assert_eq!(degree_to_compass(180.0), "S");
        assert_eq!(degree_to_compass(270.0), "W");
        assert_eq!(degree_to_compass(360.0), "N");
        assert_eq!(degree_to_compass(-90.0), "W");
        assert_eq!(degree_to_compass(350.0), "N");
    }
}
