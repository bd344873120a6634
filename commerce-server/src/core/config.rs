use std::time::Duration;

/// Server configuration
///
/// # Environment variables
///
/// All settings can be overridden through environment variables:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | CURRENCY | usd | Currency code passed to the payment gateway |
/// | PAYMENT_TIMEOUT_MS | 10000 | Bound on a single gateway call (milliseconds) |
/// | LOG_LEVEL | info | Tracing log level |
#[derive(Debug, Clone)]
pub struct Config {
    /// Currency code for gateway authorizations
    pub currency: String,
    /// Upper bound on a single payment gateway call (milliseconds)
    pub payment_timeout_ms: u64,
    /// Log level: trace | debug | info | warn | error
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults
    pub fn from_env() -> Self {
        Self {
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "usd".into()),
            payment_timeout_ms: std::env::var("PAYMENT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        }
    }

    /// Override selected settings
    ///
    /// Mostly useful in tests
    pub fn with_overrides(currency: impl Into<String>, payment_timeout_ms: u64) -> Self {
        let mut config = Self::from_env();
        config.currency = currency.into();
        config.payment_timeout_ms = payment_timeout_ms;
        config
    }

    /// Gateway call timeout as a [`Duration`]
    pub fn payment_timeout(&self) -> Duration {
        Duration::from_millis(self.payment_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
