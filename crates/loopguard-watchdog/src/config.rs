//! Runtime configuration for the watchdog.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{WatchdogError, WatchdogResult};
use crate::DEFAULT_CYCLE_DEADLINE_MS;

/// Shortest accepted cycle deadline.
pub const MIN_CYCLE_DEADLINE: Duration = Duration::from_millis(1);

/// Longest accepted cycle deadline.
pub const MAX_CYCLE_DEADLINE: Duration = Duration::from_secs(10);

/// Watchdog configuration.
///
/// Built once at startup from the command line and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Host name or address of the sensor rig.
    pub sensor_host: String,

    /// TCP port of the sensor rig. Must be non-zero.
    pub sensor_port: u16,

    /// Local address the client listener binds to.
    pub listen_address: String,

    /// Local port the client listener binds to. `0` picks an ephemeral port.
    pub listen_port: u16,

    /// Upper bound on one full relay cycle.
    ///
    /// Default: 5ms.
    pub cycle_deadline: Duration,

    /// Disable Nagle's algorithm on both sockets.
    pub tcp_nodelay: bool,
}

impl WatchdogConfig {
    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> WatchdogConfigBuilder {
        WatchdogConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::InvalidConfiguration`] if any value is invalid.
    pub fn validate(&self) -> WatchdogResult<()> {
        if self.sensor_host.trim().is_empty() {
            return Err(WatchdogError::invalid_configuration(
                "sensor_host must not be empty",
            ));
        }
        if self.sensor_port == 0 {
            return Err(WatchdogError::invalid_configuration(
                "sensor_port must be non-zero",
            ));
        }
        if self.listen_address.parse::<IpAddr>().is_err() {
            return Err(WatchdogError::invalid_configuration(format!(
                "listen_address '{}' is not an IP address",
                self.listen_address
            )));
        }
        if !(MIN_CYCLE_DEADLINE..=MAX_CYCLE_DEADLINE).contains(&self.cycle_deadline) {
            return Err(WatchdogError::invalid_configuration(
                "cycle_deadline must be between 1ms and 10s",
            ));
        }
        Ok(())
    }

    /// `host:port` of the sensor rig, for logging and error context.
    #[must_use]
    pub fn sensor_endpoint(&self) -> String {
        format!("{}:{}", self.sensor_host, self.sensor_port)
    }

    /// Socket address the client listener binds to.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::InvalidConfiguration`] if `listen_address` is
    /// not an IP address.
    pub fn listen_socket_addr(&self) -> WatchdogResult<SocketAddr> {
        let ip = self.listen_address.parse::<IpAddr>().map_err(|err| {
            WatchdogError::invalid_configuration(format!(
                "listen_address '{}': {err}",
                self.listen_address
            ))
        })?;
        Ok(SocketAddr::new(ip, self.listen_port))
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            sensor_host: "localhost".to_string(),
            sensor_port: 30000,
            listen_address: "0.0.0.0".to_string(),
            listen_port: 15000,
            cycle_deadline: Duration::from_millis(DEFAULT_CYCLE_DEADLINE_MS),
            tcp_nodelay: true,
        }
    }
}

/// Builder for [`WatchdogConfig`].
#[derive(Debug, Default)]
pub struct WatchdogConfigBuilder {
    config: WatchdogConfig,
}

impl WatchdogConfigBuilder {
    /// Set the sensor host.
    #[must_use]
    pub fn sensor_host(mut self, host: impl Into<String>) -> Self {
        self.config.sensor_host = host.into();
        self
    }

    /// Set the sensor port.
    #[must_use]
    pub fn sensor_port(mut self, port: u16) -> Self {
        self.config.sensor_port = port;
        self
    }

    /// Set the listener bind address.
    #[must_use]
    pub fn listen_address(mut self, address: impl Into<String>) -> Self {
        self.config.listen_address = address.into();
        self
    }

    /// Set the listener port.
    #[must_use]
    pub fn listen_port(mut self, port: u16) -> Self {
        self.config.listen_port = port;
        self
    }

    /// Set the cycle deadline.
    #[must_use]
    pub fn cycle_deadline(mut self, deadline: Duration) -> Self {
        self.config.cycle_deadline = deadline;
        self
    }

    /// Set the cycle deadline in milliseconds.
    #[must_use]
    pub fn cycle_deadline_ms(self, ms: u64) -> Self {
        self.cycle_deadline(Duration::from_millis(ms))
    }

    /// Enable or disable `TCP_NODELAY`.
    #[must_use]
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.config.tcp_nodelay = enabled;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> WatchdogResult<WatchdogConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
