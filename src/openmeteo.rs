use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use reqwest::blocking::Response;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::config::Api;
use crate::errors::FetchError;
use crate::units::UnitPreferences;
use crate::weather::{CurrentConditions, DailySummary, Forecast, ForecastPoint, Location};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";
const GEOCODING_CANDIDATES: &str = "5";

const HOURLY_FIELDS: &str =
    "temperature_2m,apparent_temperature,relativehumidity_2m,precipitation,weathercode";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,weathercode";

pub mod geocoding {
    use super::*;

    #[derive(Deserialize, Debug, Default)]
    pub struct Search {
        pub results: Option<Vec<Place>>,
    }

    #[derive(Deserialize, Debug, Clone)]
    pub struct Place {
        pub name: String,

        pub country: Option<String>,

        pub latitude: f64,

        pub longitude: f64,
    }

    impl Search {
        /// The highest ranked candidate; the service returns them in rank order.
        pub fn best(self, query: &str) -> Result<Location, FetchError> {
            let place = self
                .results
                .and_then(|places| places.into_iter().next())
                .ok_or_else(|| FetchError::NoResults(query.to_string()))?;
            Ok(Location {
                name: place.name,
                country: place.country,
                latitude: place.latitude,
                longitude: place.longitude,
            })
        }
    }
}

pub mod forecast {
    use super::*;

    #[derive(Deserialize, Debug)]
    pub struct Payload {
        pub current_weather: CurrentWeather,

        pub hourly: Hourly,

        pub daily: Daily,
    }

    #[derive(Deserialize, Debug)]
    pub struct CurrentWeather {
        pub time: String,

        pub temperature: f64,

        pub windspeed: f64,

        pub winddirection: f64,

        pub weathercode: i32,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct Hourly {
        pub time: Vec<String>,

        pub temperature_2m: Vec<Option<f64>>,

        #[serde(default)]
        pub apparent_temperature: Vec<Option<f64>>,

        #[serde(default)]
        pub relativehumidity_2m: Vec<Option<f64>>,

        #[serde(default)]
        pub precipitation: Vec<Option<f64>>,

        pub weathercode: Vec<Option<i32>>,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct Daily {
        pub time: Vec<String>,

        pub temperature_2m_max: Vec<Option<f64>>,

        pub temperature_2m_min: Vec<Option<f64>>,

        pub weathercode: Vec<Option<i32>>,
    }

    impl Payload {
        pub fn into_forecast(self) -> Result<Forecast, FetchError> {
            let hourly = self.hourly.points()?;
            let daily = self.daily.summaries()?;

            let time = NaiveDateTime::parse_from_str(&self.current_weather.time, TIME_FORMAT)?;
            let hour_index = self.hourly.time.iter().position(|t| *t == self.current_weather.time);
            let at_hour = |series: &[Option<f64>]| hour_index.and_then(|i| series.get(i).copied().flatten());

            let current = CurrentConditions {
                time,
                temperature: self.current_weather.temperature,
                weather_code: self.current_weather.weathercode,
                wind_speed: self.current_weather.windspeed,
                wind_direction: self.current_weather.winddirection,
                feels_like: at_hour(&self.hourly.apparent_temperature),
                humidity: at_hour(&self.hourly.relativehumidity_2m),
                precipitation: at_hour(&self.hourly.precipitation),
            };

            Ok(Forecast {
                current,
                hourly,
                daily,
            })
        }
    }

    impl Hourly {
        fn points(&self) -> Result<Vec<ForecastPoint>, FetchError> {
            check_len("hourly.temperature_2m", self.time.len(), self.temperature_2m.len())?;
            check_len("hourly.weathercode", self.time.len(), self.weathercode.len())?;

            let mut points: Vec<ForecastPoint> = Vec::with_capacity(self.time.len());
            let mut last: Option<NaiveDateTime> = None;
            for (i, ts) in self.time.iter().enumerate() {
                let time = NaiveDateTime::parse_from_str(ts, TIME_FORMAT)?;
                if last.is_some_and(|last| last >= time) {
                    return Err(FetchError::Payload(format!(
                        "hourly timestamps not strictly ascending at {ts}"
                    )));
                }
                last = Some(time);

                // hours the service has no value for are left out
                match (self.temperature_2m[i], self.weathercode[i]) {
                    (Some(temperature), Some(weather_code)) => points.push(ForecastPoint {
                        time,
                        temperature,
                        weather_code,
                    }),
                    _ => debug!("skipping incomplete hour {ts}"),
                }
            }
            Ok(points)
        }
    }

    impl Daily {
        fn summaries(&self) -> Result<Vec<DailySummary>, FetchError> {
            check_len("daily.temperature_2m_max", self.time.len(), self.temperature_2m_max.len())?;
            check_len("daily.temperature_2m_min", self.time.len(), self.temperature_2m_min.len())?;
            check_len("daily.weathercode", self.time.len(), self.weathercode.len())?;

            let mut days = Vec::with_capacity(self.time.len());
            for (i, date) in self.time.iter().enumerate() {
                let date = NaiveDate::parse_from_str(date, DATE_FORMAT)?;
                match (
                    self.temperature_2m_max[i],
                    self.temperature_2m_min[i],
                    self.weathercode[i],
                ) {
                    (Some(max_temp), Some(min_temp), Some(weather_code)) => days.push(DailySummary {
                        date,
                        max_temp,
                        min_temp,
                        weather_code,
                    }),
                    _ => debug!("skipping incomplete day {date}"),
                }
            }
            Ok(days)
        }
    }

    fn check_len(field: &str, expected: usize, actual: usize) -> Result<(), FetchError> {
        if expected == actual {
            Ok(())
        } else {
            Err(FetchError::Payload(format!(
                "{field} has {actual} entries, expected {expected}"
            )))
        }
    }
}

/// Blocking Open-Meteo client. Cheap to clone; worker threads get their own copy.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::blocking::Client,
    geocoding_url: String,
    forecast_url: String,
}

impl Client {
    pub fn new(api: &Api) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(api.user_agent.clone())
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            geocoding_url: api.geocoding_url.clone(),
            forecast_url: api.forecast_url.clone(),
        })
    }

    pub fn geocoding_url(&self, query: &str) -> Result<Url, FetchError> {
        Url::parse_with_params(
            &self.geocoding_url,
            &[
                ("name", query),
                ("count", GEOCODING_CANDIDATES),
                ("language", "en"),
            ],
        )
        .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }

    pub fn forecast_url(&self, location: &Location, units: &UnitPreferences) -> Result<Url, FetchError> {
        let params = units.to_query_params();
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        Url::parse_with_params(
            &self.forecast_url,
            &[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current_weather", "true"),
                ("hourly", HOURLY_FIELDS),
                ("daily", DAILY_FIELDS),
                ("timezone", "auto"),
                ("temperature_unit", params.temperature_unit),
                ("windspeed_unit", params.wind_unit),
                ("precipitation_unit", params.precipitation_unit),
            ],
        )
        .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }

    /// Resolves free text to the best matching location.
    pub fn search(&self, query: &str) -> Result<Location, FetchError> {
        let url = self.geocoding_url(query)?;
        let search: geocoding::Search = self.get_web_json("geocoding", url)?.json()?;
        search.best(query)
    }

    pub fn forecast(&self, location: &Location, units: &UnitPreferences) -> Result<Forecast, FetchError> {
        let url = self.forecast_url(location, units)?;
        let payload: forecast::Payload = self.get_web_json("forecast", url)?.json()?;
        payload.into_forecast()
    }

    fn get_web_json(&self, service: &'static str, url: Url) -> Result<Response, FetchError> {
        debug!("GET {url}");
        let response = self.http.get(url).send()?;
        check_status(service, response.status())?;
        Ok(response)
    }
}

fn check_status(service: &'static str, status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::NetworkFailure { service, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Temperature, UnitSetting};
    use crate::weather::IconCategory;

    const FORECAST: &str = r#"{
        "current_weather": {
            "time": "2025-10-04T01:00",
            "temperature": 12.4,
            "windspeed": 9.7,
            "winddirection": 225,
            "weathercode": 61
        },
        "hourly": {
            "time": ["2025-10-04T00:00", "2025-10-04T01:00", "2025-10-04T02:00"],
            "temperature_2m": [12.9, 12.4, 11.8],
            "apparent_temperature": [11.0, 10.6, null],
            "relativehumidity_2m": [81, 84, 86],
            "precipitation": [0.0, 0.3, 0.1],
            "weathercode": [3, 61, 61]
        },
        "daily": {
            "time": ["2025-10-04", "2025-10-05", "2025-10-06"],
            "temperature_2m_max": [15.2, 17.8, 14.0],
            "temperature_2m_min": [9.1, 8.4, 7.7],
            "precipitation_sum": [2.1, 0.0, 12.5],
            "weathercode": [0, 61, 97]
        }
    }"#;

    fn client() -> Client {
        Client::new(&Api::default()).unwrap()
    }

    fn berlin() -> Location {
        Location {
            name: "Berlin".to_string(),
            country: Some("Germany".to_string()),
            latitude: 52.52,
            longitude: 13.41,
        }
    }

    #[test]
    fn test_parse_forecast() {
        let payload: forecast::Payload = serde_json::from_str(FORECAST).unwrap();
        let forecast = payload.into_forecast().unwrap();

        assert_eq!(forecast.hourly.len(), 3);
        assert_eq!(forecast.hourly[1].hour(), 1);
        assert_eq!(forecast.current.feels_like, Some(10.6));
        assert_eq!(forecast.current.humidity, Some(84.0));
        assert_eq!(forecast.current.precipitation, Some(0.3));
        assert_eq!(forecast.current.wind_direction, 225.0);

        let icons: Vec<_> = forecast.daily.iter().map(|d| d.icon()).collect();
        assert_eq!(icons, vec![IconCategory::Clear, IconCategory::Rain, IconCategory::Storm]);
    }

    #[test]
    fn test_current_hour_missing_from_series() {
        let json = FORECAST.replace("\"time\": \"2025-10-04T01:00\"", "\"time\": \"2025-10-04T05:00\"");
        let payload: forecast::Payload = serde_json::from_str(&json).unwrap();
        let forecast = payload.into_forecast().unwrap();
        assert_eq!(forecast.current.feels_like, None);
        assert_eq!(forecast.current.humidity, None);
        assert_eq!(forecast.current.precipitation, None);
    }

    #[test]
    fn test_null_values_drop_incomplete_entries() {
        let json = FORECAST
            .replace("[12.9, 12.4, 11.8]", "[12.9, null, 11.8]")
            .replace("[15.2, 17.8, 14.0]", "[15.2, 17.8, null]");
        let payload: forecast::Payload = serde_json::from_str(&json).unwrap();
        let forecast = payload.into_forecast().unwrap();

        let hours: Vec<u32> = forecast.hourly.iter().map(|p| p.hour()).collect();
        assert_eq!(hours, vec![0, 2]);
        assert_eq!(forecast.daily.len(), 2);
        // the current hour's other metrics are still looked up
        assert_eq!(forecast.current.humidity, Some(84.0));
    }

    #[test]
    fn test_null_hours_still_checked_for_order() {
        let json = FORECAST
            .replace("[12.9, 12.4, 11.8]", "[12.9, 12.4, null]")
            .replace("\"2025-10-04T02:00\"]", "\"2025-10-04T01:00\"]");
        let payload: forecast::Payload = serde_json::from_str(&json).unwrap();
        assert!(matches!(payload.into_forecast(), Err(FetchError::Payload(_))));
    }

    #[test]
    fn test_check_status() {
        assert!(check_status("forecast", StatusCode::OK).is_ok());
        match check_status("geocoding", StatusCode::NOT_FOUND) {
            Err(FetchError::NetworkFailure { service, status }) => {
                assert_eq!(service, "geocoding");
                assert_eq!(status, StatusCode::NOT_FOUND);
            }
            other => panic!("unexpected {other:?}"),
        }
        let err = check_status("forecast", StatusCode::INTERNAL_SERVER_ERROR).unwrap_err();
        assert_eq!(err.to_string(), "forecast request failed (500 Internal Server Error)");
    }

    #[test]
    fn test_ragged_payload_is_rejected() {
        let json = FORECAST.replace("[12.9, 12.4, 11.8]", "[12.9, 12.4]");
        let payload: forecast::Payload = serde_json::from_str(&json).unwrap();
        assert!(matches!(payload.into_forecast(), Err(FetchError::Payload(_))));
    }

    #[test]
    fn test_unordered_hours_are_rejected() {
        let json = FORECAST.replace("\"2025-10-04T02:00\"]", "\"2025-10-04T01:00\"]");
        let payload: forecast::Payload = serde_json::from_str(&json).unwrap();
        assert!(matches!(payload.into_forecast(), Err(FetchError::Payload(_))));
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let json = FORECAST.replace("\"2025-10-05\"", "\"tomorrow\"");
        let payload: forecast::Payload = serde_json::from_str(&json).unwrap();
        assert!(matches!(payload.into_forecast(), Err(FetchError::Payload(_))));
    }

    #[test]
    fn test_geocoding_best_result() {
        let search: geocoding::Search = serde_json::from_str(
            r#"{"results": [
                {"name": "Paris", "country": "France", "latitude": 48.85, "longitude": 2.35},
                {"name": "Paris", "country": "United States", "latitude": 33.66, "longitude": -95.55}
            ]}"#,
        )
        .unwrap();
        let best = search.best("paris").unwrap();
        assert_eq!(best.display_name(), "Paris, France");
    }

    #[test]
    fn test_geocoding_no_results() {
        let search: geocoding::Search = serde_json::from_str(r#"{"generationtime_ms": 0.5}"#).unwrap();
        assert!(matches!(search.best("xyzzy"), Err(FetchError::NoResults(q)) if q == "xyzzy"));

        let search: geocoding::Search = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(matches!(search.best("xyzzy"), Err(FetchError::NoResults(_))));
    }

    #[test]
    fn test_geocoding_url_encodes_query() {
        let url = client().geocoding_url("São Paulo").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("name".to_string(), "São Paulo".to_string())));
        assert!(pairs.contains(&("count".to_string(), "5".to_string())));
        assert!(url.as_str().starts_with("https://geocoding-api.open-meteo.com/v1/search?"));
    }

    #[test]
    fn test_forecast_url_carries_units() {
        let mut units = UnitPreferences::default();
        units.set(UnitSetting::Temperature(Temperature::Imperial));
        let url = client().forecast_url(&berlin(), &units).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("latitude"), "52.52");
        assert_eq!(get("longitude"), "13.41");
        assert_eq!(get("temperature_unit"), "fahrenheit");
        assert_eq!(get("windspeed_unit"), "kmh");
        assert_eq!(get("precipitation_unit"), "mm");
        assert_eq!(get("current_weather"), "true");
        assert_eq!(get("timezone"), "auto");
    }
}
