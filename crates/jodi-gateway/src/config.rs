//! Gateway configuration.

use std::time::Duration;

/// Fixed delay between socket reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Connection parameters shared by the REST client and the socket manager.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    /// WebSocket endpoint URL.
    pub socket_url: String,
    /// Bearer token attached to every REST call and the socket handshake.
    pub token: String,
    /// Delay between reconnect attempts. Fixed, no backoff.
    pub reconnect_delay: Duration,
}

impl GatewayConfig {
    /// Create a config with the default reconnect delay.
    pub fn new(
        api_url: impl Into<String>,
        socket_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            socket_url: socket_url.into(),
            token: token.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_delay_is_five_seconds() {
        let config = GatewayConfig::new("https://api.example", "wss://api.example/ws", "t");
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
    }
}
