//! Console input: text commands read from a line source become queued intents.
use crossbeam_channel::{Sender, TrySendError};
use log::{debug, info, warn};
use std::io::BufRead;
use std::thread::{self, JoinHandle};
use ticker_common::Intent;

/// Capacity of the intent queue between input and control loop.
pub const INTENT_QUEUE_CAPACITY: usize = 16;

/// Line-oriented input listener that turns text commands into `Intent`s.
///
/// Each line is parsed with `Intent::from_str` and offered to the bounded
/// intent queue without blocking. Lines that do not parse are logged and
/// skipped; intents that arrive while the queue is full are dropped.
pub struct InputListener;

impl InputListener {
    /// Spawn a thread reading `reader` until end of input or a `quit` line.
    pub fn start<R>(reader: R, intents: Sender<Intent>) -> JoinHandle<()>
    where
        R: BufRead + Send + 'static,
    {
        thread::spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Input read error: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<Intent>() {
                    Ok(intent) => {
                        let quit = intent == Intent::Quit;
                        debug!("Queued intent {:?}", intent);
                        match intents.try_send(intent) {
                            Ok(()) => {}
                            Err(TrySendError::Full(dropped)) => {
                                warn!("Intent queue full, dropping {:?}", dropped)
                            }
                            Err(TrySendError::Disconnected(_)) => break,
                        }
                        if quit {
                            break;
                        }
                    }
                    Err(e) => warn!("{}", e),
                }
            }
            info!("Input listener stopping...");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::io::Cursor;
    use ticker_common::intent::Direction;

    #[test]
    fn forwards_parsed_lines_until_quit() {
        let (tx, rx) = bounded(INTENT_QUEUE_CAPACITY);
        let input = Cursor::new("next\n\nbogus\nrefresh\nquit\nprev\n");
        InputListener::start(input, tx).join().unwrap();

        let received: Vec<Intent> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![Intent::Advance(Direction::Forward), Intent::Refresh, Intent::Quit]
        );
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (tx, rx) = bounded(1);
        let input = Cursor::new("next\nprev\nrefresh\n");
        InputListener::start(input, tx).join().unwrap();
        assert_eq!(rx.try_iter().count(), 1);
    }
}
