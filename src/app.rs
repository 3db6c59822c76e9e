use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use log::{error, info, warn};
use ratatui::{backend::Backend, Terminal};

use crate::errors::FetchError;
use crate::openmeteo::Client;
use crate::units::{UnitPreferences, UnitSetting};
use crate::view::ui;
use crate::weather::{Forecast, ForecastPoint, Location};
use crate::window::{select_window, Block, HourlyMode, Pages, SelectionKey};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sequence number of a fetch. Only the reply to the latest one is applied.
pub type RequestToken = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchJob {
    /// Geocode the query, then fetch the forecast for the best match.
    Search(String),
    /// Fetch the forecast again for a known location.
    Refresh(Location),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub token: RequestToken,
    pub job: FetchJob,
    pub units: UnitPreferences,
}

#[derive(Debug)]
pub struct FetchReply {
    pub token: RequestToken,
    /// Units the forecast in `result` was requested in.
    pub units: UnitPreferences,
    pub result: Result<(Location, Forecast), FetchError>,
}

impl FetchReply {
    pub fn answering(request: &FetchRequest, result: Result<(Location, Forecast), FetchError>) -> Self {
        Self {
            token: request.token,
            units: request.units,
            result,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Action {
    None,
    Quit,
    Fetch(FetchRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

/// The one active selection; replaced as a whole, never patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub key: SelectionKey,
    pub page: usize,
}

#[derive(Debug)]
pub struct App {
    pub units: UnitPreferences,
    /// Units of the forecast on screen; lags `units` until a refetch lands.
    pub forecast_units: UnitPreferences,
    pub mode: HourlyMode,
    pub input_mode: InputMode,
    pub query: String,
    pub location: Option<Location>,
    pub forecast: Option<Forecast>,
    pub selection: Option<Selection>,
    pub status: Option<String>,
    pub loading: bool,
    latest_token: RequestToken,
}

impl App {
    pub fn new(units: UnitPreferences, mode: HourlyMode) -> Self {
        Self {
            units,
            forecast_units: units,
            mode,
            input_mode: InputMode::Normal,
            query: String::new(),
            location: None,
            forecast: None,
            selection: None,
            status: None,
            loading: false,
            latest_token: 0,
        }
    }

    fn issue(&mut self, job: FetchJob) -> Action {
        self.latest_token += 1;
        self.loading = true;
        Action::Fetch(FetchRequest {
            token: self.latest_token,
            job,
            units: self.units,
        })
    }

    pub fn search(&mut self, query: &str) -> Action {
        let query = query.trim();
        if query.is_empty() {
            return Action::None;
        }
        info!("searching for {query:?}");
        self.issue(FetchJob::Search(query.to_string()))
    }

    /// Applies a unit change and re-fetches the forecast for the last location.
    pub fn set_units(&mut self, setting: UnitSetting) -> Action {
        self.units.set(setting);
        info!("units changed: {:?}", self.units.to_query_params());
        match self.location.clone() {
            Some(location) => self.issue(FetchJob::Refresh(location)),
            None => Action::None,
        }
    }

    /// Applies a fetch reply unless a newer request has been issued since.
    pub fn accept(&mut self, reply: FetchReply) -> bool {
        if reply.token != self.latest_token {
            info!(
                "dropping stale reply {} (latest is {})",
                reply.token, self.latest_token
            );
            return false;
        }
        self.loading = false;
        match reply.result {
            Ok((location, forecast)) => {
                info!("forecast received for {}", location.display_name());
                self.selection = forecast
                    .daily
                    .first()
                    .map(|day| self.first_selection(day.date));
                self.location = Some(location);
                self.forecast = Some(forecast);
                self.forecast_units = reply.units;
                self.status = None;
            }
            Err(e) => {
                error!("fetch failed: {e}");
                self.status = Some(e.to_string());
            }
        }
        true
    }

    fn first_selection(&self, date: chrono::NaiveDate) -> Selection {
        let key = match self.mode {
            HourlyMode::Pages => SelectionKey::day(date),
            HourlyMode::Blocks => SelectionKey::block(date, Block::ALL[0]),
        };
        Selection { key, page: 0 }
    }

    /// Hourly points for the current selection; empty when there is nothing to show.
    pub fn hourly_window(&self) -> Vec<&ForecastPoint> {
        match (&self.forecast, &self.selection) {
            (Some(forecast), Some(selection)) => select_window(&forecast.hourly, &selection.key),
            _ => vec![],
        }
    }

    pub fn selected_day_index(&self) -> Option<usize> {
        let (forecast, selection) = (self.forecast.as_ref()?, self.selection.as_ref()?);
        forecast
            .daily
            .iter()
            .position(|d| d.date == selection.key.date)
    }

    pub fn select_day(&mut self, index: usize) {
        let Some(date) = self
            .forecast
            .as_ref()
            .and_then(|f| f.daily.get(index))
            .map(|d| d.date)
        else {
            return;
        };
        let block = self.selection.and_then(|s| s.key.block);
        let mut selection = self.first_selection(date);
        if let (HourlyMode::Blocks, Some(block)) = (self.mode, block) {
            selection.key = SelectionKey::block(date, block);
        }
        self.selection = Some(selection);
    }

    pub fn next_day(&mut self) {
        if let Some(i) = self.selected_day_index() {
            self.select_day(i + 1);
        }
    }

    pub fn prev_day(&mut self) {
        if let Some(i) = self.selected_day_index() {
            if i > 0 {
                self.select_day(i - 1);
            }
        }
    }

    /// Moves to the next block or page of the selected day.
    pub fn next_window(&mut self) {
        self.step_window(1);
    }

    pub fn prev_window(&mut self) {
        self.step_window(-1);
    }

    fn step_window(&mut self, delta: isize) {
        let Some(selection) = self.selection else {
            return;
        };
        let key = selection.key;
        match (self.mode, key.block) {
            (HourlyMode::Blocks, Some(block)) => {
                let moved = if delta > 0 { block.next() } else { block.prev() };
                if let Some(block) = moved {
                    self.selection = Some(Selection {
                        key: SelectionKey::block(key.date, block),
                        page: 0,
                    });
                }
            }
            _ => {
                let moved = {
                    let pages = Pages::new(self.hourly_window());
                    let enabled = if delta > 0 {
                        pages.has_next(selection.page)
                    } else {
                        pages.has_prev(selection.page)
                    };
                    if !enabled {
                        return;
                    }
                    let target = selection.page as isize + delta;
                    pages.get_page(target).map(|_| target as usize)
                };
                match moved {
                    Ok(page) => self.selection = Some(Selection { key, page }),
                    Err(e) => warn!("{e}"),
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::None;
        }
        match self.input_mode {
            InputMode::Search => match key.code {
                KeyCode::Enter => {
                    self.input_mode = InputMode::Normal;
                    let query = self.query.clone();
                    self.search(&query)
                }
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    Action::None
                }
                KeyCode::Backspace => {
                    self.query.pop();
                    Action::None
                }
                KeyCode::Char(c) => {
                    self.query.push(c);
                    Action::None
                }
                _ => Action::None,
            },
            InputMode::Normal => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
                KeyCode::Char('/') | KeyCode::Char('s') => {
                    self.input_mode = InputMode::Search;
                    self.query.clear();
                    Action::None
                }
                KeyCode::Char('t') => self.set_units(self.units.toggled_temperature()),
                KeyCode::Char('w') => self.set_units(self.units.toggled_wind()),
                KeyCode::Char('p') => self.set_units(self.units.toggled_precipitation()),
                KeyCode::Char(c @ '1'..='9') => {
                    self.select_day(c as usize - '1' as usize);
                    Action::None
                }
                KeyCode::Left => {
                    self.prev_day();
                    Action::None
                }
                KeyCode::Right => {
                    self.next_day();
                    Action::None
                }
                KeyCode::Up => {
                    self.prev_window();
                    Action::None
                }
                KeyCode::Down => {
                    self.next_window();
                    Action::None
                }
                _ => Action::None,
            },
        }
    }
}

/// Runs a fetch on a worker thread and posts the outcome back to the UI loop.
fn dispatch(client: &Client, request: FetchRequest, tx: Sender<FetchReply>) {
    let client = client.clone();
    thread::spawn(move || {
        let units = request.units;
        let result = match request.job.clone() {
            FetchJob::Search(query) => client.search(&query).and_then(|location| {
                let forecast = client.forecast(&location, &units)?;
                Ok((location, forecast))
            }),
            FetchJob::Refresh(location) => client
                .forecast(&location, &units)
                .map(|forecast| (location, forecast)),
        };
        if tx.send(FetchReply::answering(&request, result)).is_err() {
            warn!("ui loop gone before reply {} arrived", request.token);
        }
    });
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &Client,
    initial_query: Option<&str>,
) -> io::Result<()> {
    let (tx, rx): (Sender<FetchReply>, Receiver<FetchReply>) = mpsc::channel();

    if let Some(query) = initial_query {
        if let Action::Fetch(request) = app.search(query) {
            dispatch(client, request, tx.clone());
        }
    }

    loop {
        while let Ok(reply) = rx.try_recv() {
            app.accept(reply);
        }

        terminal.draw(|f| ui(f, app))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            match app.handle_key(key) {
                Action::Quit => return Ok(()),
                Action::Fetch(request) => dispatch(client, request, tx.clone()),
                Action::None => {}
            }
        }
    }
}
