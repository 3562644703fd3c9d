//! Stock ticker display core.
//!
//! Fetches quotes for one symbol at a time, keeps a bounded cache of the last
//! good quote per symbol, refreshes on a market-hours aware cadence and rotates
//! through a user list with a prefetch-then-swap transition.
//!
//! Threads:
//! - control loop (`engine::Engine::run`) owns every piece of quote state;
//! - render loop (`renderer::run_render_loop`) draws `display::DisplayState`;
//! - input listener (`input::InputListener`) turns console lines into intents.
#![warn(missing_docs)]

pub mod clock;
pub mod display;
pub mod engine;
pub mod fetcher;
pub mod input;
pub mod model;
pub mod renderer;
pub mod scheduler;
pub mod settings;
