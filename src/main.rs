use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{error::Error, io};

use wxcast::app::{run_app, App};
use wxcast::cli::Args;
use wxcast::config::{load_config, Config};
use wxcast::logging;
use wxcast::openmeteo::Client;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => load_config(path)?,
        None => Config::default(),
    };
    args.apply(&mut config);

    logging::init(&config.general)?;
    info!("wxcast version: {}", env!("CARGO_PKG_VERSION"));

    let client = Client::new(&config.api)?;
    let mut app = App::new(config.units.into(), config.hourly.mode);

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // create app and run it
    let res = run_app(&mut terminal, &mut app, &client, args.query());

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}
