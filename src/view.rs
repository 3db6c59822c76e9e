use chrono::NaiveDateTime;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, List, ListItem, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, InputMode};
use crate::units::direction::degree_to_compass;
use crate::weather::{CurrentConditions, DailySummary, ForecastPoint, IconCategory, Location};
use crate::window::{HourlyMode, Pages};

const MISSING: &str = "—";
const NO_HOURLY_DATA: &str = "No hourly data";

/// Half-up rounding, the way temperatures are shown everywhere in the UI.
fn round(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

fn degrees(v: f64) -> String {
    format!("{}°", round(v))
}

fn long_date(time: &NaiveDateTime) -> String {
    time.format("%A, %b %-d").to_string()
}

fn framed(title: &str) -> Block<'_> {
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

fn icon_span(icon: IconCategory) -> Span<'static> {
    Span::styled(icon.glyph(), Style::default().fg(icon.color()))
}

fn display_headline<'a>(app: &'a App) -> Paragraph<'a> {
    let search = match app.input_mode {
        InputMode::Search => Line::from(vec![
            Span::raw(" Search: "),
            Span::styled(
                format!("{}_", app.query),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        InputMode::Normal => Line::from(vec![
            Span::raw(" Search: "),
            Span::styled(app.query.as_str(), Style::default().fg(Color::DarkGray)),
        ]),
    };

    let place = match (&app.location, &app.forecast) {
        (Some(location), Some(forecast)) => headline_place(location, &forecast.current),
        _ => Line::from(Span::styled(
            " Press / to search for a place",
            Style::default().fg(Color::DarkGray),
        )),
    };

    Paragraph::new(vec![search, place]).block(framed("wxcast"))
}

fn headline_place<'a>(location: &Location, current: &CurrentConditions) -> Line<'a> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled(
            location.display_name(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" : "),
        Span::raw(long_date(&current.time)),
    ])
}

fn display_current_conditions<'a>(app: &App, current: &CurrentConditions) -> Table<'a> {
    let units = &app.forecast_units;
    let icon = IconCategory::classify(current.weather_code);
    let value = |text: String| Cell::from(text).style(Style::default().fg(Color::Green));

    let feels = current.feels_like.map_or(MISSING.to_string(), degrees);
    let humid = current
        .humidity
        .map_or(MISSING.to_string(), |h| format!("{}%", round(h)));
    let wind = format!(
        "{} {} ({})",
        round(current.wind_speed),
        units.wind_label(),
        degree_to_compass(current.wind_direction)
    );
    let precip = current
        .precipitation
        .map_or(MISSING.to_string(), |p| format!("{p} {}", units.precipitation_label()));

    let rows = vec![
        Row::new(vec![Cell::from("")]),
        Row::new(vec![
            Cell::from(" Temperature"),
            Cell::from(Line::from(vec![
                Span::styled(
                    degrees(current.temperature),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                icon_span(icon),
                Span::raw(format!(" {}", icon.label())),
            ])),
        ]),
        Row::new(vec![Cell::from(" Feels like"), value(feels)]),
        Row::new(vec![Cell::from(" Humidity"), value(humid)]),
        Row::new(vec![Cell::from(" Wind"), value(wind)]),
        Row::new(vec![Cell::from(" Precipitation"), value(precip)]),
    ];

    Table::new(rows, [Constraint::Length(15), Constraint::Min(20)])
        .block(framed("Current Conditions"))
}

fn display_day<'a>(day: &DailySummary, selected: bool) -> Paragraph<'a> {
    let icon = day.icon();
    let border = if selected { Color::Yellow } else { Color::Cyan };
    Paragraph::new(vec![
        Line::from(Span::styled(
            day.date.format("%a").to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(icon_span(icon)),
        Line::from(vec![
            Span::styled(degrees(day.max_temp), Style::default().fg(Color::Green)),
            Span::raw(" "),
            Span::styled(degrees(day.min_temp), Style::default().fg(Color::DarkGray)),
        ]),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .border_type(BorderType::Rounded),
    )
}

fn display_hour<'a>(point: &ForecastPoint) -> ListItem<'a> {
    ListItem::new(Line::from(vec![
        Span::raw(" "),
        icon_span(point.icon()),
        Span::raw(format!(" {:>6}", format!("{}:00", point.hour()))),
        Span::styled(
            format!("  {}", degrees(point.temperature)),
            Style::default().fg(Color::Green),
        ),
    ]))
}

fn control<'a>(label: &'a str, enabled: bool) -> Span<'a> {
    let style = if enabled {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(label, style)
}

fn render_hourly(f: &mut Frame, app: &App, area: Rect) {
    let window = app.hourly_window();
    let selection = app.selection;
    let day_name = selection
        .map(|s| s.key.date.format("%A").to_string())
        .unwrap_or_default();

    let (title, items, footer) = match (app.mode, selection.and_then(|s| s.key.block)) {
        (HourlyMode::Blocks, Some(block)) => {
            let items: Vec<ListItem> = window.iter().map(|p| display_hour(p)).collect();
            let footer = Line::from(vec![
                Span::raw(" "),
                control("▲ Earlier", block.prev().is_some()),
                Span::raw("   "),
                control("Later ▼", block.next().is_some()),
            ]);
            (format!("Hourly forecast · {day_name} {}", block.label()), items, footer)
        }
        _ => {
            let page = selection.map_or(0, |s| s.page);
            let pages = Pages::new(window.clone());
            let items: Vec<ListItem> = pages
                .get_page(page as isize)
                .map(|points| points.iter().map(|p| display_hour(p)).collect())
                .unwrap_or_default();
            let footer = Line::from(vec![
                Span::raw(" "),
                control("▲ Prev 6h", pages.has_prev(page)),
                Span::raw("   "),
                control("Next 6h ▼", pages.has_next(page)),
                Span::raw(format!("   {}/{}", page + 1, pages.page_count().max(1))),
            ]);
            (format!("Hourly forecast · {day_name}"), items, footer)
        }
    };

    let block = framed(&title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if window.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            format!(" {NO_HOURLY_DATA}"),
            Style::default().fg(Color::DarkGray),
        )));
        f.render_widget(empty, inner);
        return;
    }

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);
    f.render_widget(List::new(items), parts[0]);
    f.render_widget(Paragraph::new(footer), parts[1]);
}

fn display_status<'a>(app: &'a App) -> Paragraph<'a> {
    if app.loading {
        return Paragraph::new(Span::styled(" Loading…", Style::default().fg(Color::Yellow)));
    }
    if let Some(ref status) = app.status {
        return Paragraph::new(Span::styled(
            format!(" {status}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    Paragraph::new(Span::styled(
        format!(
            " / search  ←→ day  ↑↓ hours  t {}  w {}  p {}  q quit",
            app.units.temperature_label(),
            app.units.wind_label(),
            app.units.precipitation_label()
        ),
        Style::default().fg(Color::DarkGray),
    ))
}

pub fn ui(f: &mut Frame, app: &App) {
    let vert_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(display_headline(app), vert_layout[0]);
    f.render_widget(display_status(app), vert_layout[2]);

    let Some(forecast) = app.forecast.as_ref() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Length(5), Constraint::Min(4)])
        .split(vert_layout[1]);

    f.render_widget(display_current_conditions(app, &forecast.current), chunks[0]);

    if !forecast.daily.is_empty() {
        let selected = app.selected_day_index();
        let tiles = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(
                forecast
                    .daily
                    .iter()
                    .map(|_| Constraint::Ratio(1, forecast.daily.len() as u32)),
            )
            .split(chunks[1]);
        for (i, day) in forecast.daily.iter().enumerate() {
            f.render_widget(display_day(day, selected == Some(i)), tiles[i]);
        }
    }

    render_hourly(f, app, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{berlin, loaded, sample_forecast};
    use crate::app::{Action, FetchReply};
    use crate::errors::FetchError;
    use crate::units::UnitPreferences;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round(2.5), 3);
        assert_eq!(round(2.4), 2);
        assert_eq!(round(-2.5), -2);
        assert_eq!(round(-2.6), -3);
    }

    #[test]
    fn test_empty_screen() {
        let app = App::new(UnitPreferences::default(), HourlyMode::Pages);
        let text = render(&app);
        assert!(text.contains("Press / to search"));
        assert!(text.contains("t °C  w km/h  p mm"));
        assert!(!text.contains("Current Conditions"));
    }

    #[test]
    fn test_forecast_screen() {
        let app = loaded(HourlyMode::Pages);
        let text = render(&app);
        assert!(text.contains("Berlin, Germany"));
        assert!(text.contains("Saturday, Oct 4"));
        assert!(text.contains("Current Conditions"));
        assert!(text.contains("15°"));
        assert!(text.contains("13°"));
        assert!(text.contains("71%"));
        assert!(text.contains("11 km/h (SW)"));
        assert!(text.contains(MISSING));
        assert!(text.contains("Sat"));
        assert!(text.contains("Mon"));
        assert!(text.contains("0:00"));
        assert!(text.contains("5:00"));
        assert!(!text.contains("6:00"));
        assert!(text.contains("1/4"));
    }

    #[test]
    fn test_no_hourly_data_replaces_rows() {
        let mut app = loaded(HourlyMode::Pages);
        app.select_day(2);
        let text = render(&app);
        assert!(text.contains(NO_HOURLY_DATA));
        assert!(!text.contains("0:00"));
    }

    #[test]
    fn test_block_title() {
        let mut app = loaded(HourlyMode::Blocks);
        app.next_window();
        let text = render(&app);
        assert!(text.contains("06:00-12:00"));
        assert!(text.contains("11:00"));
    }

    #[test]
    fn test_error_status() {
        let mut app = loaded(HourlyMode::Pages);
        let Action::Fetch(request) = app.search("xyzzy") else {
            panic!("no fetch");
        };
        app.accept(FetchReply::answering(
            &request,
            Err(FetchError::NoResults("xyzzy".to_string())),
        ));
        let text = render(&app);
        assert!(text.contains("Location not found: xyzzy"));
    }

    #[test]
    fn test_failed_unit_refresh_keeps_labels() {
        let mut app = loaded(HourlyMode::Pages);
        let Action::Fetch(request) = app.handle_key(KeyEvent::new(KeyCode::Char('w'), KeyModifiers::NONE))
        else {
            panic!("no fetch");
        };

        // while the refetch runs, the km/h figures keep their label
        assert!(render(&app).contains("11 km/h (SW)"));

        app.accept(FetchReply::answering(
            &request,
            Err(FetchError::NetworkFailure {
                service: "forecast",
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            }),
        ));
        let text = render(&app);
        assert!(text.contains("11 km/h (SW)"));
        assert!(!text.contains("11 mph"));
    }

    #[test]
    fn test_unit_refresh_relabels_new_forecast() {
        let mut app = loaded(HourlyMode::Pages);
        let Action::Fetch(request) = app.handle_key(KeyEvent::new(KeyCode::Char('w'), KeyModifiers::NONE))
        else {
            panic!("no fetch");
        };
        app.accept(FetchReply::answering(&request, Ok((berlin(), sample_forecast()))));
        assert!(render(&app).contains("11 mph (SW)"));
    }
}
