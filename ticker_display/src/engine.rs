//! Control loop owning the quote state.
//!
//! The engine runs on a single thread and owns the market state, the symbol
//! cache, the prefetch slot, the rotation list and the refresh scheduler. Once
//! per tick it drains queued intents, finishes any pending rotation swap, runs
//! a due rotation and then asks the scheduler whether the displayed symbol needs
//! a refresh.
//!
//! Locking rules:
//! - Network fetches always run with the display lock released.
//! - Each display change is a single `SharedDisplay::update`; a rotation swap is
//!   one update to hide the quote, a fade pause without the lock, and one update
//!   that applies every field from the prefetch slot.
//!
//! Fetch failures never leave this module: they become a status on the display
//! (or a skipped rotation) and the loop carries on with the next tick.

use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, select, tick};
use log::{debug, info, warn};
use ticker_common::intent::{Direction, RotationInterval};
use ticker_common::symbol::default_symbol;
use ticker_common::{FetchError, Intent, QuoteRecord, Result, Symbol, TickerError};

use crate::clock::WallClock;
use crate::display::{DisplayState, LOCK_TIMEOUT, SharedDisplay, Status};
use crate::fetcher::{Connectivity, QuoteSource};
use crate::model::cache::{CACHE_CAPACITY, SymbolCache, Upsert};
use crate::model::prefetch::PrefetchSlot;
use crate::model::rotation::Rotation;
use crate::renderer::format_price;
use crate::scheduler::{Decision, RefreshScheduler};
use crate::settings::{SettingValue, SettingsStore, keys};

/// Collaborators the engine talks to.
pub struct EngineParts {
    /// Quote provider.
    pub source: Box<dyn QuoteSource>,
    /// Network availability.
    pub link: Box<dyn Connectivity>,
    /// Market-local wall clock.
    pub clock: Box<dyn WallClock>,
    /// Persistent settings.
    pub settings: Box<dyn SettingsStore>,
}

/// Tunables.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Credential used when none is stored.
    pub fallback_credential: String,
    /// Pause between hiding and re-showing the quote during a rotation swap.
    pub fade: Duration,
    /// Symbol cache capacity.
    pub cache_capacity: usize,
    /// Display lock timeout.
    pub lock_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            fallback_credential: String::new(),
            fade: Duration::from_millis(100),
            cache_capacity: CACHE_CAPACITY,
            lock_timeout: LOCK_TIMEOUT,
        }
    }
}

/// How a rotation attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RotationOutcome {
    /// The new symbol is on screen.
    Rotated(Symbol),
    /// Data could not be resolved; nothing moved.
    Skipped(FetchError),
    /// Data is staged but the display was busy; the swap is retried next tick.
    Pending,
    /// Rotation is off or has fewer than two symbols.
    Inactive,
}

/// Single-threaded quote control loop.
pub struct Engine {
    source: Box<dyn QuoteSource>,
    link: Box<dyn Connectivity>,
    clock: Box<dyn WallClock>,
    settings: Box<dyn SettingsStore>,
    display: SharedDisplay,
    cache: SymbolCache,
    prefetch: PrefetchSlot,
    rotation: Rotation,
    scheduler: RefreshScheduler,
    market_open: bool,
    current: Symbol,
    credential: String,
    fade: Duration,
    refresh_pending: bool,
}

impl Engine {
    /// Restore persisted state and prepare the cold-start display.
    ///
    /// The first tick fetches the displayed symbol.
    pub fn new(parts: EngineParts, options: EngineOptions, now: Instant) -> Self {
        let settings = parts.settings;

        let stored_symbol = settings.get_string(keys::SYMBOL, default_symbol().as_str());
        let stored_symbol = Symbol::new(&stored_symbol).unwrap_or_else(|e| {
            warn!("Ignoring stored symbol: {}", e);
            default_symbol()
        });

        let stored_key = settings.get_string(keys::API_KEY, "");
        let credential = if stored_key.is_empty() {
            options.fallback_credential.clone()
        } else {
            stored_key
        };

        let interval = RotationInterval::try_from(settings.get_int(keys::ROTATE_INTERVAL, 5))
            .unwrap_or_else(|e| {
                warn!("{}, using default", e);
                RotationInterval::default()
            });
        let rotation = Rotation::new(
            &settings.get_string(keys::ROTATE_LIST, ""),
            settings.get_bool(keys::ROTATE_ON, false),
            interval,
            now,
        );

        let mut current = stored_symbol.clone();
        if rotation.is_enabled() {
            if let Some(first) = rotation.current() {
                current = first.clone();
            }
        }

        let last_price = if current == stored_symbol {
            settings.get_string(keys::PRICE, "N/A")
        } else {
            "N/A".to_string()
        };
        let display = SharedDisplay::with_timeout(
            DisplayState::cold_start(current.clone(), last_price),
            options.lock_timeout,
        );

        Self {
            source: parts.source,
            link: parts.link,
            clock: parts.clock,
            settings,
            display,
            cache: SymbolCache::new(options.cache_capacity),
            prefetch: PrefetchSlot::default(),
            rotation,
            scheduler: RefreshScheduler::new(now),
            market_open: false,
            current,
            credential,
            fade: options.fade,
            refresh_pending: true,
        }
    }

    /// Handle for the render thread.
    pub fn display(&self) -> SharedDisplay {
        self.display.clone()
    }

    /// Symbol currently shown.
    pub fn current_symbol(&self) -> &Symbol {
        &self.current
    }

    /// Market state from the most recent successful fetch.
    pub fn is_market_open(&self) -> bool {
        self.market_open
    }

    /// Rotation list and index.
    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    /// Last-known-good quotes.
    pub fn cache(&self) -> &SymbolCache {
        &self.cache
    }

    /// Run until `shutdown` fires, a `Quit` intent arrives, or the ticker fails.
    pub fn run(mut self, intents: Receiver<Intent>, shutdown: Receiver<()>, period: Duration) -> Result<()> {
        let ticker = tick(period);
        info!("Control loop started, showing {}", self.current);

        loop {
            select! {
                recv(shutdown) -> _ => break,
                recv(ticker) -> msg => {
                    let now = msg.map_err(|e| TickerError::ChannelRecv(e.to_string()))?;
                    for intent in intents.try_iter() {
                        if self.handle_intent(intent, now).is_break() {
                            info!("Quit requested");
                            return Ok(());
                        }
                    }
                    self.tick(now);
                }
            }
        }
        info!("Control loop stopping...");
        Ok(())
    }

    /// Apply one queued intent.
    pub fn handle_intent(&mut self, intent: Intent, now: Instant) -> ControlFlow<()> {
        debug!("Handling {:?}", intent);
        match intent {
            Intent::SelectPreset(preset) => self.select_symbol(preset.symbol()),
            Intent::ChangeSymbol(symbol) => self.select_symbol(symbol),
            Intent::Advance(direction) => {
                self.advance(direction, now);
            }
            Intent::Refresh => self.refresh_pending = true,
            Intent::SetRotationList(raw) => {
                self.rotation.set_list(&raw);
                self.drop_pending_swap();
                info!("Rotation list: {:?}", self.rotation.symbols());
                self.persist(keys::ROTATE_LIST, SettingValue::Text(raw));
            }
            Intent::SetRotationEnabled(enabled) => {
                self.rotation.set_enabled(enabled);
                self.rotation.reset_timer(now);
                if !enabled {
                    self.drop_pending_swap();
                }
                info!("Rotation {}", if enabled { "enabled" } else { "disabled" });
                self.persist(keys::ROTATE_ON, SettingValue::Bool(enabled));
            }
            Intent::SetRotationInterval(interval) => {
                self.rotation.set_interval(interval);
                info!("Rotation every {} min", self.rotation.interval().minutes());
                self.persist(keys::ROTATE_INTERVAL, SettingValue::Int(interval.minutes() as i64));
            }
            Intent::SetApiKey(key) => {
                self.credential = key.clone();
                self.persist(keys::API_KEY, SettingValue::Text(key));
                self.refresh_pending = true;
            }
            Intent::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// One pass of the control loop after intents are drained.
    pub fn tick(&mut self, now: Instant) {
        if self.prefetch.is_staged() {
            match self.apply_staged() {
                Ok(symbol) => info!("Rotated to {} (deferred swap)", symbol),
                Err(e) => debug!("Swap still pending: {}", e),
            }
        }

        if self.rotation.is_due(now) {
            self.rotation.reset_timer(now);
            self.rotate(Direction::Forward, now);
        }

        if self.refresh_pending {
            self.refresh_pending = false;
            self.scheduler.mark_checked(now);
            if let Err(e) = self.refresh_current() {
                debug!("Requested refresh of {} not applied: {}", self.current, e);
            }
            return;
        }

        let decision = self.scheduler.poll(
            now,
            self.market_open,
            self.clock.minute_of_day(),
            self.rotation.is_active(),
        );
        if let Decision::Fetch(cadence) = decision {
            debug!("Scheduled refresh of {} ({:?})", self.current, cadence);
            if let Err(e) = self.refresh_current() {
                debug!("Scheduled refresh of {} not applied: {}", self.current, e);
            }
        }
    }

    /// Fetch the displayed symbol and show the result.
    ///
    /// On failure the cached quote for the same symbol is shown with a
    /// "cached" status; without a cache entry only the status changes.
    pub fn refresh_current(&mut self) -> std::result::Result<(), FetchError> {
        let symbol = self.current.clone();
        match self.acquire(&symbol) {
            Ok(record) => {
                let price = format_price(record.close);
                let status = self.updated_status();
                if let Err(e) = self.display.update(|state| state.show_quote(record, status)) {
                    warn!("Dropping refresh of {}: {}", symbol, e);
                }
                self.persist(keys::SYMBOL, SettingValue::Text(symbol.to_string()));
                self.persist(keys::PRICE, SettingValue::Text(price));
                Ok(())
            }
            Err(err) => {
                self.report_failure(&symbol, &err);
                Err(err)
            }
        }
    }

    /// Manual rotation step; restarts the rotation timer.
    pub fn advance(&mut self, direction: Direction, now: Instant) -> RotationOutcome {
        if !self.rotation.is_active() {
            debug!("Ignoring {} gesture, rotation inactive", direction);
            return RotationOutcome::Inactive;
        }
        self.rotation.reset_timer(now);
        self.rotate(direction, now)
    }

    fn rotate(&mut self, direction: Direction, now: Instant) -> RotationOutcome {
        let next = self.rotation.next_index(direction);
        let Some(symbol) = self.rotation.symbol_at(next).cloned() else {
            return RotationOutcome::Inactive;
        };

        info!("Prefetching data for {}...", symbol);
        let record = match self.resolve(&symbol, now) {
            Ok(record) => record,
            Err(e) => {
                info!("Prefetch for {} failed, skipping rotation: {}", symbol, e);
                return RotationOutcome::Skipped(e);
            }
        };

        self.prefetch.stage(record, next);
        match self.apply_staged() {
            Ok(symbol) => {
                info!("Rotated to {}", symbol);
                RotationOutcome::Rotated(symbol)
            }
            Err(e) => {
                warn!("Rotation to {} deferred: {}", symbol, e);
                RotationOutcome::Pending
            }
        }
    }

    /// Data for a rotation target. A closed market cannot have moved, so a
    /// cached quote is reused without touching the network.
    fn resolve(&mut self, symbol: &Symbol, now: Instant) -> std::result::Result<QuoteRecord, FetchError> {
        if !self.market_open {
            if let Some(cached) = self.cache.lookup(symbol) {
                debug!(
                    "Market closed - using cached data for {} ({}s old)",
                    symbol,
                    cached.age(now).as_secs()
                );
                return Ok(cached.clone());
            }
            if !self.link.is_connected() {
                return Err(FetchError::NoCachedData(symbol.to_string()));
            }
            debug!("Market closed but no cache for {} - fetching once", symbol);
        }
        self.acquire(symbol)
    }

    /// One network fetch. Updates the market state on success and caches
    /// usable records.
    fn acquire(&mut self, symbol: &Symbol) -> std::result::Result<QuoteRecord, FetchError> {
        if !self.link.is_connected() {
            return Err(FetchError::NoConnectivity);
        }

        let record = self.source.fetch(symbol, &self.credential)?;
        if record.market_open != self.market_open {
            info!("Market is now {}", if record.market_open { "open" } else { "closed" });
        }
        self.market_open = record.market_open;

        if !record.is_usable() {
            return Err(FetchError::EmptyQuote(symbol.to_string()));
        }
        if self.cache.upsert(record.clone()) == Upsert::Inserted {
            debug!("Cached {} ({} symbols)", symbol, self.cache.len());
        }
        Ok(record)
    }

    /// Swap the staged record onto the display and make its index current.
    ///
    /// The slot is only emptied once the final update succeeded.
    fn apply_staged(&mut self) -> Result<Symbol> {
        let Some(staged) = self.prefetch.peek().cloned() else {
            return Ok(self.current.clone());
        };

        self.display.update(|state| state.visible = false)?;
        if !self.fade.is_zero() {
            thread::sleep(self.fade);
        }

        let status = self.updated_status();
        let symbol = staged.record.symbol.clone();
        self.display.update(|state| {
            state.show_quote(staged.record, status);
            state.visible = true;
        })?;

        self.prefetch.take();
        self.rotation.advance_to(staged.index);
        self.current = symbol.clone();
        Ok(symbol)
    }

    /// Abandon a staged swap. A swap that failed after its hide step leaves the
    /// quote hidden, so visibility is restored here.
    fn drop_pending_swap(&mut self) {
        if self.prefetch.take().is_some() {
            if let Err(e) = self.display.update(|state| state.visible = true) {
                warn!("Could not restore display after dropped swap: {}", e);
            }
        }
    }

    fn select_symbol(&mut self, symbol: Symbol) {
        info!("Switching to {}", symbol);
        self.current = symbol.clone();
        self.drop_pending_swap();
        if let Err(e) = self.display.update(|state| state.show_loading(symbol)) {
            warn!("Could not show loading state: {}", e);
        }
        self.refresh_pending = true;
    }

    fn report_failure(&mut self, symbol: &Symbol, err: &FetchError) {
        let result = match err {
            FetchError::NoConnectivity => {
                debug!("No connectivity, not fetching {}", symbol);
                self.display.update(|state| state.status = Status::NoConnectivity)
            }
            _ => {
                warn!("Fetch for {} failed: {}", symbol, err);
                match self.cache.lookup(symbol).cloned() {
                    Some(cached) => self
                        .display
                        .update(|state| state.show_quote(cached, Status::CachedApiError)),
                    None => self.display.update(|state| state.status = Status::ApiError),
                }
            }
        };
        if let Err(e) = result {
            warn!("Could not show failure status: {}", e);
        }
    }

    fn updated_status(&self) -> Status {
        let (hour, minute) = self.clock.hour_minute();
        Status::Updated { hour, minute }
    }

    fn persist(&mut self, key: &str, value: SettingValue) {
        if let Err(e) = self.settings.put(key, value) {
            warn!("Failed to persist {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::fixed::FixedClock;
    use crate::model::test_support::quote;
    use crate::settings::MemorySettings;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    const MIN: Duration = Duration::from_secs(60);

    #[derive(Clone, Default)]
    struct Script {
        calls: Rc<RefCell<Vec<String>>>,
        responses: Rc<RefCell<HashMap<String, std::result::Result<QuoteRecord, FetchError>>>>,
    }

    impl Script {
        fn respond(&self, symbol: &str, response: std::result::Result<QuoteRecord, FetchError>) {
            self.responses.borrow_mut().insert(symbol.to_string(), response);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    struct ScriptedSource(Script);

    impl QuoteSource for ScriptedSource {
        fn fetch(&mut self, symbol: &Symbol, _credential: &str) -> std::result::Result<QuoteRecord, FetchError> {
            self.0.calls.borrow_mut().push(symbol.to_string());
            self.0
                .responses
                .borrow()
                .get(symbol.as_str())
                .cloned()
                .unwrap_or(Err(FetchError::Provider { status: Some(500) }))
        }
    }

    struct Link(Rc<Cell<bool>>);

    impl Connectivity for Link {
        fn is_connected(&self) -> bool {
            self.0.get()
        }
    }

    #[derive(Clone, Default)]
    struct SharedSettings(Rc<RefCell<MemorySettings>>);

    impl SettingsStore for SharedSettings {
        fn get(&self, key: &str) -> Option<SettingValue> {
            self.0.borrow().get(key)
        }

        fn put(&mut self, key: &str, value: SettingValue) -> Result<()> {
            self.0.borrow_mut().put(key, value)
        }
    }

    struct Harness {
        engine: Engine,
        script: Script,
        link: Rc<Cell<bool>>,
        clock: FixedClock,
        settings: SharedSettings,
        start: Instant,
    }

    fn test_options() -> EngineOptions {
        EngineOptions {
            fallback_credential: "demo".to_string(),
            fade: Duration::ZERO,
            ..EngineOptions::default()
        }
    }

    fn harness(settings: SharedSettings) -> Harness {
        harness_with(settings, test_options())
    }

    fn harness_with(settings: SharedSettings, options: EngineOptions) -> Harness {
        let script = Script::default();
        let link = Rc::new(Cell::new(true));
        let clock = FixedClock::at(12, 0);
        let start = Instant::now();
        let parts = EngineParts {
            source: Box::new(ScriptedSource(script.clone())),
            link: Box::new(Link(Rc::clone(&link))),
            clock: Box::new(clock.clone()),
            settings: Box::new(settings.clone()),
        };
        Harness {
            engine: Engine::new(parts, options, start),
            script,
            link,
            clock,
            settings,
            start,
        }
    }

    fn rotation_settings(list: &str) -> SharedSettings {
        let settings = SharedSettings::default();
        {
            let mut store = settings.clone();
            store.put_string(keys::ROTATE_LIST, list).unwrap();
            store.put_bool(keys::ROTATE_ON, true).unwrap();
            store.put_int(keys::ROTATE_INTERVAL, 1).unwrap();
        }
        settings
    }

    fn rotating(list: &str) -> Harness {
        harness(rotation_settings(list))
    }

    /// Rotating harness whose display lock is taken by another thread during
    /// the fade, so the swap stops after hiding the quote.
    fn interrupted_swap() -> Harness {
        let options = EngineOptions {
            fade: Duration::from_millis(100),
            lock_timeout: Duration::from_millis(10),
            ..test_options()
        };
        let mut h = harness_with(rotation_settings("AAPL,MSFT"), options);
        h.script.respond("AAPL", Ok(quote("AAPL", 150.0)));
        h.script.respond("MSFT", Ok(quote("MSFT", 410.0)));

        let display = h.engine.display();
        let holder = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            let _held = display.lock().unwrap();
            std::thread::sleep(Duration::from_millis(200));
        });
        assert_eq!(h.engine.advance(Direction::Forward, h.start), RotationOutcome::Pending);
        holder.join().unwrap();

        assert!(!shown(&h.engine).visible);
        assert_eq!(h.engine.rotation().index(), 0);
        h
    }

    fn closed(symbol: &str, close: f64) -> QuoteRecord {
        QuoteRecord {
            market_open: false,
            ..quote(symbol, close)
        }
    }

    fn shown(engine: &Engine) -> DisplayState {
        engine.display().snapshot().unwrap()
    }

    #[test]
    fn cold_start_shows_persisted_symbol_and_price() {
        let settings = SharedSettings::default();
        {
            let mut store = settings.clone();
            store.put_string(keys::SYMBOL, "nvda").unwrap();
            store.put_string(keys::PRICE, "$900.00").unwrap();
        }
        let h = harness(settings);
        let state = shown(&h.engine);
        assert_eq!(state.symbol.as_str(), "NVDA");
        assert_eq!(state.placeholder_price, "$900.00");
        assert_eq!(state.status, Status::Connecting);
        assert!(h.script.calls().is_empty());
    }

    #[test]
    fn enabled_rotation_starts_at_first_symbol() {
        let h = rotating("aapl,msft");
        assert_eq!(h.engine.current_symbol().as_str(), "AAPL");
        assert_eq!(h.engine.rotation().index(), 0);
    }

    #[test]
    fn first_tick_fetches_and_persists() {
        let mut h = harness(SharedSettings::default());
        h.script.respond("MSFT", Ok(quote("MSFT", 150.0)));
        h.engine.tick(h.start);

        assert_eq!(h.script.calls(), ["MSFT"]);
        let state = shown(&h.engine);
        assert_eq!(state.quote.as_ref().map(|q| q.close), Some(150.0));
        assert_eq!(state.status, Status::Updated { hour: 12, minute: 0 });
        assert!(h.engine.is_market_open());
        assert_eq!(h.settings.get_string(keys::PRICE, ""), "$150.00");
        assert_eq!(h.settings.get_string(keys::SYMBOL, ""), "MSFT");
    }

    #[test]
    fn failed_refresh_shows_cached_quote_for_same_symbol() {
        let settings = SharedSettings::default();
        settings.clone().put_string(keys::SYMBOL, "TSLA").unwrap();
        let mut h = harness(settings);

        let good = quote("TSLA", 250.0);
        h.script.respond("TSLA", Ok(good.clone()));
        h.engine.refresh_current().unwrap();

        h.script.respond("TSLA", Err(FetchError::Provider { status: Some(500) }));
        let err = h.engine.refresh_current().unwrap_err();
        assert_eq!(err, FetchError::Provider { status: Some(500) });

        let state = shown(&h.engine);
        assert_eq!(state.quote, Some(good));
        assert_eq!(state.status, Status::CachedApiError);
        assert_eq!(state.status.to_string(), "Cached (API Error)");
    }

    #[test]
    fn failed_refresh_without_cache_keeps_prior_values() {
        let mut h = harness(SharedSettings::default());
        h.script.respond("MSFT", Ok(quote("MSFT", 410.0)));
        h.engine.refresh_current().unwrap();

        h.engine.handle_intent(Intent::ChangeSymbol(Symbol::new("AMZN").unwrap()), h.start);
        assert_eq!(shown(&h.engine).status, Status::Loading);
        assert!(h.engine.refresh_current().is_err());

        let state = shown(&h.engine);
        assert_eq!(state.status, Status::ApiError);
        assert_eq!(state.symbol.as_str(), "AMZN");
        assert_eq!(state.placeholder_price, "$---.--");
    }

    #[test]
    fn no_connectivity_short_circuits() {
        let mut h = harness(SharedSettings::default());
        h.link.set(false);
        assert_eq!(h.engine.refresh_current(), Err(FetchError::NoConnectivity));
        assert!(h.script.calls().is_empty());
        assert_eq!(shown(&h.engine).status, Status::NoConnectivity);
    }

    #[test]
    fn empty_payload_is_not_displayed_or_cached() {
        let mut h = harness(SharedSettings::default());
        h.script.respond("MSFT", Ok(quote("MSFT", 410.0)));
        h.engine.refresh_current().unwrap();

        let empty = QuoteRecord {
            close: 0.0,
            previous_close: 0.0,
            market_open: false,
            ..quote("MSFT", 410.0)
        };
        h.script.respond("MSFT", Ok(empty));
        assert!(matches!(h.engine.refresh_current(), Err(FetchError::EmptyQuote(_))));

        assert!(!h.engine.is_market_open());
        let state = shown(&h.engine);
        assert_eq!(state.status, Status::CachedApiError);
        assert_eq!(state.quote.as_ref().map(|q| q.close), Some(410.0));
    }

    #[test]
    fn open_market_rotation_prefetches_then_swaps() {
        let mut h = rotating("AAPL,MSFT");
        h.script.respond("AAPL", Ok(quote("AAPL", 150.0)));
        h.script.respond("MSFT", Ok(quote("MSFT", 410.0)));
        h.engine.tick(h.start);
        assert!(h.engine.is_market_open());

        h.engine.tick(h.start + MIN + Duration::from_secs(1));

        assert_eq!(h.script.calls(), ["AAPL", "MSFT"]);
        assert_eq!(h.engine.rotation().index(), 1);
        assert_eq!(h.engine.current_symbol().as_str(), "MSFT");
        let state = shown(&h.engine);
        assert!(state.visible);
        assert_eq!(state.quote.as_ref().map(|q| q.symbol.as_str()), Some("MSFT"));
    }

    #[test]
    fn closed_market_without_cache_fetches_exactly_once() {
        let mut h = rotating("AAPL,MSFT");
        h.script.respond("MSFT", Ok(closed("MSFT", 410.0)));

        let outcome = h.engine.advance(Direction::Forward, h.start);
        assert_eq!(outcome, RotationOutcome::Rotated(Symbol::new("MSFT").unwrap()));
        assert_eq!(h.script.calls(), ["MSFT"]);
    }

    #[test]
    fn closed_market_with_cache_skips_network() {
        let mut h = rotating("AAPL,MSFT");
        h.script.respond("AAPL", Ok(closed("AAPL", 150.0)));
        h.script.respond("MSFT", Ok(closed("MSFT", 410.0)));
        h.engine.refresh_current().unwrap();
        h.engine.advance(Direction::Forward, h.start);
        let calls_before = h.script.calls().len();

        let outcome = h.engine.advance(Direction::Forward, h.start);

        assert_eq!(outcome, RotationOutcome::Rotated(Symbol::new("AAPL").unwrap()));
        assert_eq!(h.script.calls().len(), calls_before);
        assert_eq!(h.engine.rotation().index(), 0);
        assert_eq!(shown(&h.engine).quote.map(|q| q.close), Some(150.0));
    }

    #[test]
    fn closed_market_cache_reuse_works_offline() {
        let mut h = rotating("AAPL,MSFT");
        h.script.respond("MSFT", Ok(closed("MSFT", 410.0)));
        h.engine.advance(Direction::Forward, h.start);
        h.link.set(false);

        assert!(matches!(
            h.engine.advance(Direction::Forward, h.start),
            RotationOutcome::Skipped(FetchError::NoCachedData(_))
        ));
        assert_eq!(
            h.engine.advance(Direction::Back, h.start),
            RotationOutcome::Skipped(FetchError::NoCachedData("AAPL".to_string()))
        );
        assert_eq!(h.engine.rotation().index(), 1);
    }

    #[test]
    fn failed_resolve_skips_rotation() {
        let mut h = rotating("AAPL,MSFT");
        h.script.respond("AAPL", Ok(quote("AAPL", 150.0)));
        h.engine.tick(h.start);

        h.engine.tick(h.start + MIN + Duration::from_secs(1));

        assert_eq!(h.engine.rotation().index(), 0);
        assert_eq!(h.engine.current_symbol().as_str(), "AAPL");
        let state = shown(&h.engine);
        assert_eq!(state.symbol.as_str(), "AAPL");
        assert!(state.visible);
    }

    #[test]
    fn manual_advance_wraps_and_resets_timer() {
        let mut h = rotating("AAPL,MSFT,NVDA");
        for (symbol, close) in [("AAPL", 150.0), ("MSFT", 410.0), ("NVDA", 900.0)] {
            h.script.respond(symbol, Ok(quote(symbol, close)));
        }
        h.engine.tick(h.start);

        let outcome = h.engine.advance(Direction::Back, h.start + 50 * Duration::from_secs(1));
        assert_eq!(outcome, RotationOutcome::Rotated(Symbol::new("NVDA").unwrap()));
        assert_eq!(h.engine.rotation().index(), 2);

        let calls = h.script.calls().len();
        h.engine.tick(h.start + MIN + Duration::from_secs(5));
        assert_eq!(h.script.calls().len(), calls);
        assert_eq!(h.engine.rotation().index(), 2);
    }

    #[test]
    fn advance_ignored_without_rotation() {
        let mut h = harness(SharedSettings::default());
        assert_eq!(h.engine.advance(Direction::Forward, h.start), RotationOutcome::Inactive);
        assert!(h.script.calls().is_empty());
    }

    #[test]
    fn busy_display_defers_swap_until_next_tick() {
        let mut h = rotating("AAPL,MSFT");
        h.script.respond("MSFT", Ok(quote("MSFT", 410.0)));
        let display = h.engine.display();

        let outcome = {
            let _held = display.lock().unwrap();
            h.engine.advance(Direction::Forward, h.start)
        };
        assert_eq!(outcome, RotationOutcome::Pending);
        assert_eq!(h.engine.rotation().index(), 0);

        h.engine.tick(h.start);
        assert_eq!(h.engine.rotation().index(), 1);
        assert_eq!(h.script.calls(), ["MSFT", "MSFT"]);
        assert_eq!(shown(&h.engine).symbol.as_str(), "MSFT");
    }

    #[test]
    fn symbol_change_after_interrupted_swap_shows_quotes_again() {
        let mut h = interrupted_swap();

        h.engine
            .handle_intent(Intent::ChangeSymbol(Symbol::new("AAPL").unwrap()), h.start);
        h.engine.tick(h.start);

        let state = shown(&h.engine);
        assert!(state.visible);
        assert_eq!(state.symbol.as_str(), "AAPL");
        assert_eq!(state.quote.map(|q| q.close), Some(150.0));
        assert_eq!(h.engine.rotation().index(), 0);
    }

    #[test]
    fn editing_rotation_after_interrupted_swap_restores_display() {
        let mut h = interrupted_swap();

        h.engine
            .handle_intent(Intent::SetRotationList("TSLA,META".to_string()), h.start);

        assert!(shown(&h.engine).visible);
        h.engine.tick(h.start);
        assert_eq!(h.engine.current_symbol().as_str(), "AAPL");
    }

    #[test]
    fn disabling_rotation_drops_pending_swap() {
        let mut h = interrupted_swap();

        h.engine.handle_intent(Intent::SetRotationEnabled(false), h.start);
        assert!(shown(&h.engine).visible);
        h.engine.tick(h.start);

        assert_eq!(h.engine.rotation().index(), 0);
        assert_eq!(h.engine.current_symbol().as_str(), "AAPL");
        let state = shown(&h.engine);
        assert_eq!(state.symbol.as_str(), "AAPL");
        assert!(state.visible);
    }

    #[test]
    fn closed_market_refresh_cadence_follows_clock() {
        let mut h = harness(SharedSettings::default());
        h.script.respond("MSFT", Ok(closed("MSFT", 410.0)));
        h.clock.set(22, 0);
        h.engine.tick(h.start);
        assert_eq!(h.script.calls().len(), 1);

        h.engine.tick(h.start + 30 * MIN);
        assert_eq!(h.script.calls().len(), 1);
        h.engine.tick(h.start + 61 * MIN);
        assert_eq!(h.script.calls().len(), 2);

        h.clock.set(9, 45);
        h.engine.tick(h.start + 67 * MIN);
        assert_eq!(h.script.calls().len(), 3);
    }

    #[test]
    fn open_market_with_rotation_leaves_refresh_to_rotation() {
        let mut h = rotating("AAPL,MSFT");
        h.script.respond("AAPL", Ok(quote("AAPL", 150.0)));
        h.engine.tick(h.start);
        h.engine.handle_intent(Intent::SetRotationInterval(RotationInterval::Ten), h.start);

        h.engine.tick(h.start + 6 * MIN);
        assert_eq!(h.script.calls(), ["AAPL"]);
    }

    #[test]
    fn rotation_intents_update_and_persist() {
        let mut h = rotating("AAPL,MSFT");
        h.engine.advance(Direction::Forward, h.start);

        h.engine
            .handle_intent(Intent::SetRotationList("tsla, meta ,".to_string()), h.start);
        assert_eq!(h.engine.rotation().index(), 0);
        assert_eq!(h.engine.rotation().symbols().len(), 2);
        assert_eq!(h.settings.get_string(keys::ROTATE_LIST, ""), "tsla, meta ,");

        h.engine
            .handle_intent(Intent::SetRotationInterval(RotationInterval::Two), h.start);
        assert_eq!(h.settings.get_int(keys::ROTATE_INTERVAL, 0), 2);

        h.engine.handle_intent(Intent::SetRotationEnabled(false), h.start);
        assert!(!h.settings.get_bool(keys::ROTATE_ON, true));
        assert!(!h.engine.rotation().is_active());
    }

    #[test]
    fn preset_and_api_key_intents_trigger_fetch() {
        let mut h = harness(SharedSettings::default());
        h.script.respond("SPY", Ok(quote("SPY", 500.0)));
        let preset = ticker_common::symbol::Preset::SPY;

        assert!(h.engine.handle_intent(Intent::SelectPreset(preset), h.start).is_continue());
        assert_eq!(shown(&h.engine).status, Status::Loading);
        h.engine.tick(h.start);
        assert_eq!(h.script.calls(), ["SPY"]);

        h.engine.handle_intent(Intent::SetApiKey("new-key".to_string()), h.start);
        assert_eq!(h.settings.get_string(keys::API_KEY, ""), "new-key");
        h.engine.tick(h.start);
        assert_eq!(h.script.calls(), ["SPY", "SPY"]);

        assert!(h.engine.handle_intent(Intent::Quit, h.start).is_break());
    }

    #[test]
    fn run_stops_on_quit_intent() {
        let h = harness(SharedSettings::default());
        h.script.respond("MSFT", Ok(quote("MSFT", 410.0)));
        let (intent_tx, intent_rx) = crossbeam_channel::bounded(4);
        let (_shutdown_tx, shutdown_rx) = crossbeam_channel::unbounded();
        intent_tx.send(Intent::Quit).unwrap();

        h.engine.run(intent_rx, shutdown_rx, Duration::from_millis(1)).unwrap();
    }
}
