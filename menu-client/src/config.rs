//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::channel::ChannelConfig;

/// Client configuration for connecting to the menu backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g., "http://localhost:8000")
    pub base_url: String,

    /// Directory for durable client state (cart, contact info, token)
    pub storage_dir: PathBuf,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Quiet period before a price recalculation is issued
    pub pricing_debounce: Duration,

    /// Fixed delay between realtime channel reconnect attempts
    pub reconnect_delay: Duration,

    /// Keep-alive ping interval on the admin channel
    pub keepalive_interval: Duration,

    /// Log level filter (e.g., "info", "menu_client=debug")
    pub log_level: String,

    /// Optional directory for daily-rolling log files
    pub log_dir: Option<String>,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            storage_dir: PathBuf::from("./.menu-client"),
            timeout: 30,
            pricing_debounce: Duration::from_millis(500),
            reconnect_delay: Duration::from_millis(3000),
            keepalive_interval: Duration::from_secs(20),
            log_level: "info".to_string(),
            log_dir: None,
        }
    }

    /// Load configuration from `MENU_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::new("http://localhost:8000");
        Self {
            base_url: std::env::var("MENU_API_URL").unwrap_or(defaults.base_url),
            storage_dir: std::env::var("MENU_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            timeout: std::env::var("MENU_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout),
            pricing_debounce: std::env::var("MENU_PRICING_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.pricing_debounce),
            reconnect_delay: std::env::var("MENU_RECONNECT_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.reconnect_delay),
            keepalive_interval: std::env::var("MENU_KEEPALIVE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.keepalive_interval),
            log_level: std::env::var("MENU_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: std::env::var("MENU_LOG_DIR").ok().filter(|d| !d.is_empty()),
        }
    }

    /// Set the storage directory
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the pricing debounce window
    pub fn with_pricing_debounce(mut self, debounce: Duration) -> Self {
        self.pricing_debounce = debounce;
        self
    }

    /// Set the channel reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the keep-alive interval
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// WebSocket base URL derived from the API URL, without trailing slash
    pub fn ws_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        }
    }

    /// Absolute URL for a served path such as `/static/uploads/a.png`
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Admin/kitchen push channel
    pub fn admin_channel(&self) -> ChannelConfig {
        ChannelConfig::new(format!("{}/ws/admin/orders", self.ws_url()))
            .with_reconnect_delay(self.reconnect_delay)
            .with_keepalive(Some(self.keepalive_interval))
    }

    /// Group cart channel for `group_id`
    ///
    /// The group endpoint only accepts JSON frames, so no text keep-alive
    /// is sent on it.
    pub fn group_channel(&self, group_id: &str) -> ChannelConfig {
        ChannelConfig::new(format!("{}/ws/group/{}", self.ws_url(), group_id))
            .with_reconnect_delay(self.reconnect_delay)
            .with_keepalive(None)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_from_http() {
        let config = ClientConfig::new("http://localhost:8000/");
        assert_eq!(config.ws_url(), "ws://localhost:8000");
        assert_eq!(
            config.admin_channel().url,
            "ws://localhost:8000/ws/admin/orders"
        );
    }

    #[test]
    fn test_ws_url_from_https() {
        let config = ClientConfig::new("https://menu.example.vn");
        assert_eq!(
            config.group_channel("abc123").url,
            "wss://menu.example.vn/ws/group/abc123"
        );
        assert!(config.group_channel("abc123").keepalive.is_none());
    }

    #[test]
    fn test_resolve_url() {
        let config = ClientConfig::new("http://localhost:8000/");
        assert_eq!(
            config.resolve_url("/static/uploads/a.png"),
            "http://localhost:8000/static/uploads/a.png"
        );
        assert_eq!(
            config.resolve_url("https://cdn.example.vn/a.png"),
            "https://cdn.example.vn/a.png"
        );
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::default()
            .with_timeout(5)
            .with_reconnect_delay(Duration::from_millis(100));
        assert_eq!(config.timeout, 5);
        assert_eq!(config.admin_channel().reconnect_delay, Duration::from_millis(100));
        assert_eq!(config.pricing_debounce, Duration::from_millis(500));
    }
}
