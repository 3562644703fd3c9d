//! Quote acquisition from the provider.
//!
//! `QuoteSource` is the one-round-trip seam the control loop fetches through and
//! `Connectivity` tells it whether a round-trip is worth attempting. The HTTP
//! implementation maps every outcome onto `FetchError`: a non-200 status keeps
//! its code, a transport failure has none, and a body that is not a quote
//! object is `MalformedResponse`.
use std::cell::Cell;
use std::net::ToSocketAddrs;
use std::time::{Duration, Instant};

use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use ticker_common::net::{API_KEY_PARAM, FETCH_TIMEOUT, SYMBOL_PARAM, quote_endpoint};
use ticker_common::quote::ProviderQuote;
use ticker_common::{FetchError, QuoteRecord, Symbol, TickerError};

/// Blocking source of quotes for one symbol at a time.
///
/// Implementations perform exactly one round-trip per call and return either a
/// complete record or a typed failure. Callers must not hold the display lock
/// while calling `fetch`.
pub trait QuoteSource {
    /// Fetch the current quote for `symbol` using `credential`.
    fn fetch(&mut self, symbol: &Symbol, credential: &str) -> Result<QuoteRecord, FetchError>;
}

/// Whether a network transport is currently available.
pub trait Connectivity {
    /// `true` when a fetch can be attempted.
    fn is_connected(&self) -> bool;
}

/// Link that is always up; used for the offline simulator.
pub struct AlwaysConnected;

impl Connectivity for AlwaysConnected {
    fn is_connected(&self) -> bool {
        true
    }
}

/// Treats the link as up when the provider host resolves.
///
/// A check result is reused for `PROBE_TTL`, so the resolver runs at most that often.
pub struct HostProbe {
    host: String,
    last: Cell<Option<(Instant, bool)>>,
}

/// How long a link check result is reused.
pub const PROBE_TTL: Duration = Duration::from_secs(30);

impl HostProbe {
    /// Probe the host part of `base_url`.
    pub fn for_url(base_url: &str) -> Result<Self, TickerError> {
        let url = Url::parse(base_url).map_err(|e| TickerError::Format(format!("Invalid provider URL: {}", e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| TickerError::Format(format!("Provider URL has no host: {}", base_url)))?;
        let port = url.port_or_known_default().unwrap_or(443);
        Ok(Self {
            host: format!("{}:{}", host, port),
            last: Cell::new(None),
        })
    }
}

impl Connectivity for HostProbe {
    fn is_connected(&self) -> bool {
        let now = Instant::now();
        if let Some((checked_at, up)) = self.last.get() {
            if now.saturating_duration_since(checked_at) < PROBE_TTL {
                return up;
            }
        }

        let up = match self.host.to_socket_addrs() {
            Ok(mut addrs) => addrs.next().is_some(),
            Err(e) => {
                debug!("Link check for {} failed: {}", self.host, e);
                false
            }
        };
        self.last.set(Some((now, up)));
        up
    }
}

/// HTTP quote provider client.
///
/// Issues one `GET {base}/quote?symbol=..&apikey=..` per fetch with a bounded
/// timeout. Only a 200 response is parsed; every other status, and any
/// transport failure, becomes `FetchError::Provider`.
pub struct HttpQuoteSource {
    client: Client,
    endpoint: String,
}

impl HttpQuoteSource {
    /// Build a client for the provider at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, TickerError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| TickerError::Format(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(base_url, client))
    }

    /// Use a preconfigured `client` for the provider at `base_url`.
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            endpoint: quote_endpoint(base_url),
        }
    }

    fn url(&self, symbol: &Symbol, credential: &str) -> Result<Url, FetchError> {
        Url::parse_with_params(
            &self.endpoint,
            &[(SYMBOL_PARAM, symbol.as_str()), (API_KEY_PARAM, credential)],
        )
        .map_err(|e| {
            warn!("Invalid quote URL for {}: {}", symbol, e);
            FetchError::transport()
        })
    }
}

impl QuoteSource for HttpQuoteSource {
    fn fetch(&mut self, symbol: &Symbol, credential: &str) -> Result<QuoteRecord, FetchError> {
        let url = self.url(symbol, credential)?;
        debug!("Requesting quote for {}", symbol);

        let response = self.client.get(url).send().map_err(|e| {
            warn!("Quote request for {} failed: {}", symbol, e);
            FetchError::transport()
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Quote request for {} returned {}", symbol, status);
            return Err(FetchError::Provider {
                status: Some(status.as_u16()),
            });
        }

        let body = response.bytes().map_err(|e| {
            warn!("Reading quote body for {} failed: {}", symbol, e);
            FetchError::transport()
        })?;
        let payload = ProviderQuote::from_slice(&body)?;
        Ok(QuoteRecord::from_payload(symbol.clone(), payload, Instant::now()))
    }
}
