//! `DuetServer` builder and server loop.
//!
//! This is the entry point for running a Duet pairing server. It ties
//! together all the layers: transport → protocol → session → queue →
//! rooms, with the supervisor in the middle.

use std::sync::Arc;

use duet_protocol::{Codec, JsonCodec};
use duet_pulse::{Pulse, PulseConfig};
use duet_session::Authenticator;
use duet_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::supervisor::{Supervisor, SupervisorConfig};
use crate::DuetError;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// supervisor sits behind one `Mutex` — that lock IS the critical
/// section around every queue/room mutation.
pub(crate) struct ServerState<A: Authenticator, C: Codec> {
    pub(crate) supervisor: Mutex<Supervisor>,
    pub(crate) auth: A,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Duet server.
///
/// # Example
///
/// ```rust,ignore
/// use duet::DuetServer;
/// use duet_session::TrustingAuthenticator;
///
/// let server = DuetServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(TrustingAuthenticator)
///     .await?;
/// server.run().await
/// ```
pub struct DuetServerBuilder {
    bind_addr: String,
    sweep: PulseConfig,
    supervisor_config: SupervisorConfig,
}

impl DuetServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            sweep: PulseConfig::default(),
            supervisor_config: SupervisorConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the queue sweep interval (zero disables the sweep).
    pub fn sweep_interval(mut self, config: PulseConfig) -> Self {
        self.sweep = config;
        self
    }

    /// Sets the supervisor configuration.
    pub fn supervisor_config(mut self, config: SupervisorConfig) -> Self {
        self.supervisor_config = config;
        self
    }

    /// Builds the server with the given authenticator.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` — what the browser
    /// client speaks.
    pub async fn build<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<DuetServer<A, JsonCodec>, DuetError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            supervisor: Mutex::new(Supervisor::new(self.supervisor_config)),
            auth,
            codec: JsonCodec,
        });

        Ok(DuetServer {
            transport,
            state,
            sweep: self.sweep,
        })
    }
}

impl Default for DuetServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Duet pairing server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DuetServer<A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A, C>>,
    sweep: PulseConfig,
}

impl<A, C> DuetServer<A, C>
where
    A: Authenticator,
    C: Codec + Clone,
{
    /// Creates a new builder.
    pub fn builder() -> DuetServerBuilder {
        DuetServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server: the accept loop plus the queue sweep task.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), DuetError> {
        tracing::info!("duet server running");

        // Background sweep: periodically tell long-waiting queued
        // connections they are still in line.
        let sweep_state = Arc::clone(&self.state);
        let mut pulse = Pulse::new(self.sweep);
        tokio::spawn(async move {
            loop {
                pulse.wait().await;
                sweep_state.supervisor.lock().await.sweep_waiting();
            }
        });

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection::<A, C>(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
