//! Startup handshake: connect to the sensor rig, then accept one client.
//!
//! Any failure here is fatal. Nothing is retried and no session exists yet,
//! so no safety stop is reported.

use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::config::WatchdogConfig;
use crate::error::{WatchdogError, WatchdogResult};
use crate::session::Session;
use crate::shutdown::SafetyReporter;

/// Connect to the sensor rig named in `config`.
///
/// # Errors
///
/// Returns [`WatchdogError::ConnectFailure`] if the connection cannot be made.
pub async fn connect_sensor(config: &WatchdogConfig) -> WatchdogResult<TcpStream> {
    let endpoint = config.sensor_endpoint();
    debug!(%endpoint, "connecting to sensor rig");

    let stream = TcpStream::connect((config.sensor_host.as_str(), config.sensor_port))
        .await
        .map_err(|source| WatchdogError::connect_failure(&endpoint, source))?;
    stream
        .set_nodelay(config.tcp_nodelay)
        .map_err(|source| WatchdogError::connect_failure(&endpoint, source))?;

    info!(%endpoint, "connected to sensor rig");
    Ok(stream)
}

/// Bind the client listener.
///
/// # Errors
///
/// Returns [`WatchdogError::InvalidConfiguration`] for a bad listen address
/// and [`WatchdogError::AcceptFailure`] if the bind fails.
pub async fn bind_client_listener(config: &WatchdogConfig) -> WatchdogResult<TcpListener> {
    let addr = config.listen_socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| WatchdogError::accept_failure(addr.to_string(), source))?;

    let bound = listener
        .local_addr()
        .map_err(|source| WatchdogError::accept_failure(addr.to_string(), source))?;
    debug!(%bound, "client listener bound");
    Ok(listener)
}

/// Accept exactly one client on `listener`.
///
/// # Errors
///
/// Returns [`WatchdogError::AcceptFailure`] if accepting fails.
pub async fn accept_client(
    listener: &TcpListener,
    config: &WatchdogConfig,
) -> WatchdogResult<TcpStream> {
    let endpoint = listener
        .local_addr()
        .map_or_else(|_| config.listen_port.to_string(), |addr| addr.to_string());
    debug!(%endpoint, "waiting for client");

    let (stream, peer) = listener
        .accept()
        .await
        .map_err(|source| WatchdogError::accept_failure(&endpoint, source))?;
    stream
        .set_nodelay(config.tcp_nodelay)
        .map_err(|source| WatchdogError::accept_failure(&endpoint, source))?;

    info!(%peer, "client connected");
    Ok(stream)
}

/// Validate `config`, connect to the sensor, accept one client, and build
/// the session.
///
/// The listener is dropped once the client is accepted; later connection
/// attempts are refused.
///
/// # Errors
///
/// Returns the first startup failure.
pub async fn establish(
    config: &WatchdogConfig,
    reporter: Arc<dyn SafetyReporter>,
) -> WatchdogResult<Session<TcpStream>> {
    config.validate()?;
    let sensor = connect_sensor(config).await?;
    let listener = bind_client_listener(config).await?;
    let client = accept_client(&listener, config).await?;
    drop(listener);

    Ok(Session::from_config(sensor, client, config, reporter))
}
