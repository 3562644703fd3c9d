//! Presentation side: formatting and the render thread loop.
//!
//! The render loop polls `SharedDisplay` for a new revision, copies the state
//! out under the lock and hands it to a `Presenter` after the lock is released.
//! All text formatting (currency, signs, volume suffixes, range bars) lives here;
//! the control loop only supplies numbers.
use std::io::Write;
use std::time::Duration;

use crossbeam_channel::{Receiver, select, tick};
use log::{debug, error, info};
use ticker_common::quote::{QuoteRecord, VolumeScale};

use crate::display::{DisplayState, SharedDisplay};

const BAR_WIDTH: usize = 20;

/// Draws finished display states.
pub trait Presenter {
    /// Render one frame.
    fn present(&mut self, state: &DisplayState);
}

/// `$150.00`
pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

/// `+1.35%`
pub fn format_percent(percent: f64) -> String {
    format!("{:+.2}%", percent)
}

/// `+2.00`
pub fn format_dollar_change(change: f64) -> String {
    format!("{:+.2}", change)
}

/// `Vol: 70.82M`, `Vol: 12.5K`, `Vol: 950`
pub fn format_volume(volume: f64) -> String {
    let scale = VolumeScale::for_volume(volume);
    let scaled = volume / scale.divisor();
    match scale {
        VolumeScale::Units => format!("Vol: {:.0}", scaled),
        VolumeScale::Thousands => format!("Vol: {:.1}{}", scaled, scale.suffix()),
        VolumeScale::Millions | VolumeScale::Billions => {
            format!("Vol: {:.2}{}", scaled, scale.suffix())
        }
    }
}

/// Horizontal bar filled to `position` percent.
pub fn range_bar(position: u8) -> String {
    let filled = (usize::from(position.min(100)) * BAR_WIDTH + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn quote_lines(quote: &QuoteRecord) -> Vec<String> {
    let arrow = if quote.percent_change >= 0.0 { "▲" } else { "▼" };
    vec![
        format!("${}  {}", quote.symbol, quote.name),
        format!(
            "{}  {}  {}  {}",
            format_price(quote.close),
            format_percent(quote.percent_change),
            format_dollar_change(quote.dollar_change()),
            arrow
        ),
        format!("O: {:.2}   H: {:.2}   L: {:.2}", quote.open, quote.high, quote.low),
        format!(
            "{}   {}",
            format_volume(quote.volume),
            if quote.market_open { "Market Open" } else { "Market Closed" }
        ),
        format!(
            "Day  {:.2} {} {:.2}",
            quote.low,
            range_bar(quote.day_range_position()),
            quote.high
        ),
        format!(
            "52W  {:.2} {} {:.2}",
            quote.fifty_two_week_low,
            range_bar(quote.fifty_two_week_position()),
            quote.fifty_two_week_high
        ),
    ]
}

/// Lines for one frame.
pub fn frame_lines(state: &DisplayState) -> Vec<String> {
    let mut lines = if !state.visible {
        vec![format!("${}", state.symbol)]
    } else {
        match &state.quote {
            Some(quote) => quote_lines(quote),
            None => vec![format!("${}  {}", state.symbol, state.placeholder_price)],
        }
    };
    lines.push(state.status.to_string());
    lines
}

/// Writes frames as plain text blocks.
pub struct ConsolePresenter<W: Write> {
    out: W,
}

impl<W: Write> ConsolePresenter<W> {
    /// Present to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn present(&mut self, state: &DisplayState) {
        let mut frame = frame_lines(state).join("\n");
        frame.push_str("\n\n");
        if let Err(e) = self.out.write_all(frame.as_bytes()).and_then(|_| self.out.flush()) {
            error!("Failed to write frame: {}", e);
        }
    }
}

/// Blocking render loop.
///
/// Wakes every `period`, presents the state when its revision changed, and
/// exits when `stop_rx` yields a message or is disconnected.
pub fn run_render_loop(
    display: SharedDisplay,
    presenter: &mut dyn Presenter,
    stop_rx: Receiver<()>,
    period: Duration,
) {
    let ticker = tick(period);
    let mut seen: Option<u64> = None;
    info!("Render loop started");

    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(ticker) -> _ => {
                let snapshot = match seen {
                    Some(revision) => display.snapshot_if_changed(revision),
                    None => display.snapshot().map(Some),
                };
                match snapshot {
                    Ok(Some(state)) => {
                        seen = Some(state.revision);
                        presenter.present(&state);
                    }
                    Ok(None) => {}
                    Err(e) => debug!("Skipping frame: {}", e),
                }
            }
        }
    }
    info!("Render loop stopping...");
}
