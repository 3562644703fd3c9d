//! Quote provider endpoint constants and helpers.
use std::time::Duration;

/// Default provider base URL.
pub const PROVIDER_BASE_URL: &str = "https://api.twelvedata.com";
/// Upper bound for a single quote request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Query parameter carrying the symbol.
pub const SYMBOL_PARAM: &str = "symbol";
/// Query parameter carrying the credential.
pub const API_KEY_PARAM: &str = "apikey";

/// Quote endpoint under `base_url`, without query parameters.
pub fn quote_endpoint(base_url: &str) -> String {
    format!("{}/quote", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_quote_endpoint() {
        assert_eq!(quote_endpoint("https://example.test/"), "https://example.test/quote");
        assert_eq!(quote_endpoint(PROVIDER_BASE_URL), "https://api.twelvedata.com/quote");
    }
}
