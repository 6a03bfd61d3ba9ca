//! Exitlinks Server - HTTP surface for the link engine.
//!
//! ## Endpoints
//!
//! - `GET /leaving?url=...` - Redirect gate; serves the warning page. Also
//!   mounted under the site's base path, e.g. `/blog/leaving`.
//! - `POST /api/filter` - Rewrite external links in an HTML fragment
//! - `POST /api/classify` - Classify a single href
//! - `GET /assets/exit-links.js` - Client-side click interceptor
//!
//! ## Example
//!
//! ```no_run
//! use exitlinks_core::Settings;
//! use exitlinks_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::new(ServerConfig::default(), Settings::default()).unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

pub mod error;
mod handlers;
pub mod models;
pub mod pages;
pub mod state;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use exitlinks_core::{Settings, SettingsError, GATE_PATH};

pub use error::{ApiError, GateError, Result};
pub use state::AppState;

/// Default server port.
pub const DEFAULT_PORT: u16 = 48780;

/// Default server host (localhost only).
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (default: 127.0.0.1).
    pub host: String,
    /// Port to bind to (default: 48780).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Sets the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {0}: {1}")]
    BindError(SocketAddr, std::io::Error),

    /// Settings cannot be served.
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    /// Server runtime error.
    #[error("server error: {0}")]
    Runtime(String),
}

/// Builds the router for the given state.
pub fn router(state: AppState) -> Router {
    // The interceptor and filter API may be called from pages on other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new().route(GATE_PATH, get(handlers::leaving));
    if let Some(path) = base_gate_path(&state.settings) {
        info!(path = %path, "Serving gate under site base path");
        app = app.route(&path, get(handlers::leaving));
    }

    app.route("/api/filter", post(handlers::filter_content))
        .route("/api/classify", post(handlers::classify_href))
        .route("/assets/exit-links.js", get(handlers::interceptor_script))
        .layer(cors)
        .with_state(state)
}

/// Returns the gate path under the site's base path when it differs from
/// [`GATE_PATH`] and can be mounted as a literal route.
fn base_gate_path(settings: &Settings) -> Option<String> {
    let path = settings.origin().ok()?.gate_path();
    let literal = !path.contains(['{', '}', ':', '*']);
    (path != GATE_PATH && literal).then_some(path)
}

/// The HTTP server.
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Creates a server for the given settings.
    pub fn new(config: ServerConfig, settings: Settings) -> std::result::Result<Self, ServerError> {
        settings.validate()?;
        Self::with_state(config, AppState::new(settings))
    }

    /// Creates a server with custom application state.
    pub fn with_state(
        config: ServerConfig,
        state: AppState,
    ) -> std::result::Result<Self, ServerError> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| ServerError::Runtime(format!("invalid address: {}", e)))?;

        Ok(Self {
            router: router(state),
            addr,
        })
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Runs the server until shutdown.
    pub async fn run(self) -> std::result::Result<(), ServerError> {
        info!("Starting exitlinks server on {}", self.addr);

        let domain = if self.addr.is_ipv6() {
            Domain::IPV6
        } else {
            Domain::IPV4
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        // Allow rebinding while old sockets linger in TIME_WAIT
        socket
            .set_reuse_address(true)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        socket
            .bind(&self.addr.into())
            .map_err(|e| ServerError::BindError(self.addr, e))?;
        socket
            .listen(128)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        // Set non-blocking for tokio
        socket
            .set_nonblocking(true)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = tokio::net::TcpListener::from_std(std_listener)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        axum::serve(listener, self.router)
            .await
            .map_err(|e| ServerError::Runtime(e.to_string()))?;

        Ok(())
    }

    /// Returns the router for testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
