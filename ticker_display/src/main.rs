//! Ticker display: a console front end for the quote control loop.
//!
//! Usage example:
//! ```bash
//! TICKER_API_KEY=... ticker_display --settings ./ticker-settings.json
//! ticker_display --demo
//! ```
//!
//! Commands are read from stdin, one per line: `next`, `prev`, `refresh`,
//! `symbol AAPL`, `preset 3`, `rotate on|off`, `rotate list AAPL,MSFT`,
//! `rotate every 2`, `apikey KEY`, `quit`.
#![warn(missing_docs)]
mod args;

use std::io::{self, BufReader};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::{bounded, unbounded};
use log::{error, info};
use ticker_common::{Intent, Result, TickerError};
use ticker_display::clock::MarketClock;
use ticker_display::engine::{Engine, EngineOptions, EngineParts};
use ticker_display::fetcher::{AlwaysConnected, Connectivity, HostProbe, HttpQuoteSource, QuoteSource};
use ticker_display::input::{INTENT_QUEUE_CAPACITY, InputListener};
use ticker_display::model::simulator::SimulatedSource;
use ticker_display::renderer::{ConsolePresenter, run_render_loop};
use ticker_display::settings::FileSettings;

use crate::args::Args;

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let (source, link): (Box<dyn QuoteSource>, Box<dyn Connectivity>) = if args.demo {
        info!("Demo mode: using simulated quotes");
        (Box::new(SimulatedSource::new(true)), Box::new(AlwaysConnected))
    } else {
        (
            Box::new(HttpQuoteSource::new(&args.provider_url)?),
            Box::new(HostProbe::for_url(&args.provider_url)?),
        )
    };

    let settings = FileSettings::open(&args.settings);
    info!("Settings file: {}", args.settings.display());

    let parts = EngineParts {
        source,
        link,
        clock: Box::new(MarketClock::new_york()),
        settings: Box::new(settings),
    };
    let options = EngineOptions {
        fallback_credential: args.api_key.clone(),
        fade: Duration::from_millis(args.fade_ms),
        ..EngineOptions::default()
    };
    let engine = Engine::new(parts, options, Instant::now());

    let (shutdown_tx, shutdown_rx) = unbounded::<()>();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received. Shutting down...");
        let _ = shutdown_tx.send(());
    })
    .map_err(|e| TickerError::Format(format!("Error setting Ctrl+C handler: {}", e)))?;

    let (intent_tx, intent_rx) = bounded::<Intent>(INTENT_QUEUE_CAPACITY);
    InputListener::start(BufReader::new(io::stdin()), intent_tx);

    let (render_stop_tx, render_stop_rx) = unbounded::<()>();
    let display = engine.display();
    let render_period = Duration::from_millis(args.render_ms);
    let render = thread::spawn(move || {
        let mut presenter = ConsolePresenter::new(io::stdout());
        run_render_loop(display, &mut presenter, render_stop_rx, render_period);
    });

    let result = engine.run(intent_rx, shutdown_rx, Duration::from_millis(args.tick_ms));
    if let Err(e) = &result {
        error!("Control loop failed: {}", e);
    }

    drop(render_stop_tx);
    if render.join().is_err() {
        error!("Render thread panicked");
    }
    info!("Ticker display stopped");
    result
}

fn init_logger() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}
