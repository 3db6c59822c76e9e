//! Terminal weather client for the Open-Meteo geocoding and forecast services.

pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod openmeteo;
pub mod units;
pub mod view;
pub mod weather;
pub mod window;
