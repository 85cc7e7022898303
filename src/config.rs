use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Settings for discovering and talking to a sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Advertised local name of the device to connect to
    pub device_name: String,
    /// How long to scan for the device before giving up
    pub scan_timeout: Duration,
    /// How long to wait for the connection to be established
    pub connect_timeout: Duration,
    /// Wait after subscribing to history before the first completion check
    pub history_grace_period: Duration,
    /// Interval between completion checks while draining history
    pub history_poll_interval: Duration,
    /// Fail the drain when no record arrives for this long. `None` waits forever.
    pub history_stall_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            device_name: ClientConfig::DEFAULT_DEVICE_NAME.to_string(),
            scan_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(60),
            history_grace_period: Duration::from_secs(3),
            history_poll_interval: Duration::from_secs(1),
            history_stall_timeout: None,
        }
    }
}

impl ClientConfig {
    pub const DEFAULT_DEVICE_NAME: &'static str = "LYWSD03MMC";

    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from the environment, loading `.env` first if present.
    ///
    /// Recognised variables: `LYWSD03MMC_NAME`, `LYWSD03MMC_SCAN_TIMEOUT_SECS`,
    /// `LYWSD03MMC_CONNECT_TIMEOUT_SECS` and `LYWSD03MMC_HISTORY_STALL_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(name) = var("LYWSD03MMC_NAME").filter(|name| !name.trim().is_empty()) {
            config.device_name = name.trim().to_string();
        }
        if let Some(secs) = var("LYWSD03MMC_SCAN_TIMEOUT_SECS") {
            config.scan_timeout = parse_secs("LYWSD03MMC_SCAN_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = var("LYWSD03MMC_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = parse_secs("LYWSD03MMC_CONNECT_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = var("LYWSD03MMC_HISTORY_STALL_TIMEOUT_SECS") {
            config.history_stall_timeout =
                Some(parse_secs("LYWSD03MMC_HISTORY_STALL_TIMEOUT_SECS", &secs)?);
        }
        Ok(config)
    }

    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_history_grace_period(mut self, period: Duration) -> Self {
        self.history_grace_period = period;
        self
    }

    pub fn with_history_poll_interval(mut self, interval: Duration) -> Self {
        self.history_poll_interval = interval;
        self
    }

    pub fn with_history_stall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.history_stall_timeout = timeout;
        self
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| Error::Config(format!("{key}={value:?}: {e}")))
}

#[test]
fn test_defaults() {
    let config = ClientConfig::default();
    assert_eq!(config.device_name, "LYWSD03MMC");
    assert_eq!(config.history_grace_period, Duration::from_secs(3));
    assert_eq!(config.history_poll_interval, Duration::from_secs(1));
    assert_eq!(config.history_stall_timeout, None);
}

#[test]
fn test_from_vars() {
    let config = ClientConfig::from_vars(|key| match key {
        "LYWSD03MMC_NAME" => Some(" Bedroom ".to_string()),
        "LYWSD03MMC_CONNECT_TIMEOUT_SECS" => Some("10".to_string()),
        "LYWSD03MMC_HISTORY_STALL_TIMEOUT_SECS" => Some("120".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.device_name, "Bedroom");
    assert_eq!(config.scan_timeout, Duration::from_secs(30));
    assert_eq!(config.connect_timeout, Duration::from_secs(10));
    assert_eq!(config.history_stall_timeout, Some(Duration::from_secs(120)));
}

#[test]
fn test_from_vars_rejects_garbage() {
    let result = ClientConfig::from_vars(|key| {
        (key == "LYWSD03MMC_SCAN_TIMEOUT_SECS").then(|| "soon".to_string())
    });
    assert!(matches!(result, Err(Error::Config(_))));
}
