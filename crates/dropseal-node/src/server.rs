//! Peer server.
//!
//! Serves the local share store to receivers over HTTP:
//!
//! | Request                | Outcome                                       |
//! |------------------------|-----------------------------------------------|
//! | `GET /share/{code}`    | 200 `{ "encrypted", "original_filename" }`    |
//! | malformed code         | 400                                           |
//! | unknown code           | 404                                           |
//! | already used           | 409                                           |
//! | expired                | 410                                           |
//! | store failure          | 503                                           |
//!
//! Serving a share consumes it (see `ShareManager::claim_for_peer`), so a
//! code can be fetched from the network at most once.

use std::{
    future::Future,
    net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket},
    sync::Arc,
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use dropseal_core::{Environment, MetadataResolver, ShareCode, ShareError, ShareManager};
use dropseal_store::Storage;
use tokio::net::TcpListener;

use crate::{error::NodeError, resolver::DEFAULT_PEER_PORT};

/// Peer server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerServerConfig {
    /// Address to listen on.
    pub bind_address: String,
}

impl Default for PeerServerConfig {
    fn default() -> Self {
        Self { bind_address: format!("0.0.0.0:{DEFAULT_PEER_PORT}") }
    }
}

type SharedManager<S, E, R> = Arc<ShareManager<S, E, R>>;

/// HTTP server handing out local shares to peers.
pub struct PeerServer {
    listener: TcpListener,
    router: Router,
}

impl PeerServer {
    /// Bind the listener. Nothing is served until [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// - `NodeError::Bind` if the address is unusable
    pub async fn bind<S, E, R>(
        config: &PeerServerConfig,
        shares: SharedManager<S, E, R>,
    ) -> Result<Self, NodeError>
    where
        S: Storage,
        E: Environment,
        R: MetadataResolver + 'static,
    {
        let listener = TcpListener::bind(&config.bind_address).await.map_err(|e| {
            NodeError::Bind { address: config.bind_address.clone(), reason: e.to_string() }
        })?;

        Ok(Self { listener, router: router(shares) })
    }

    /// Address actually bound (useful with port 0).
    ///
    /// # Errors
    ///
    /// - `NodeError::Bind` if the socket has no local address
    pub fn local_addr(&self) -> Result<SocketAddr, NodeError> {
        self.listener.local_addr().map_err(|e| NodeError::Bind {
            address: "listener".to_string(),
            reason: e.to_string(),
        })
    }

    /// Address receivers should pass as `--peer`.
    ///
    /// A wildcard bind is reported with this host's LAN address instead.
    ///
    /// # Errors
    ///
    /// - `NodeError::Bind` if the socket has no local address
    pub fn reachable_addr(&self) -> Result<SocketAddr, NodeError> {
        Ok(advertised(self.local_addr()?, local_ip()))
    }

    /// Serve until the process ends.
    ///
    /// # Errors
    ///
    /// - `NodeError::Server` if the accept loop fails
    pub async fn run(self) -> Result<(), NodeError> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` completes, then drain in-flight requests.
    ///
    /// # Errors
    ///
    /// - `NodeError::Server` if the accept loop fails
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), NodeError> {
        tracing::info!(addr = ?self.listener.local_addr().ok(), "peer server listening");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| NodeError::Server(e.to_string()))
    }
}

/// Address of the interface this host uses for outbound traffic.
///
/// Connecting a UDP socket only selects a route; no packet is sent. Falls
/// back to loopback when the host has no route.
pub fn local_ip() -> IpAddr {
    let routed = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(192, 0, 2, 1), DEFAULT_PEER_PORT))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip());

    match routed {
        Ok(ip) if !ip.is_unspecified() => ip,
        Ok(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Err(err) => {
            tracing::debug!(error = %err, "no outbound route, advertising loopback");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        },
    }
}

fn advertised(bound: SocketAddr, local: IpAddr) -> SocketAddr {
    if bound.ip().is_unspecified() { SocketAddr::new(local, bound.port()) } else { bound }
}

fn router<S, E, R>(shares: SharedManager<S, E, R>) -> Router
where
    S: Storage,
    E: Environment,
    R: MetadataResolver + 'static,
{
    Router::new().route("/share/{code}", get(serve_share::<S, E, R>)).with_state(shares)
}

async fn serve_share<S, E, R>(
    State(shares): State<SharedManager<S, E, R>>,
    Path(code): Path<String>,
) -> Response
where
    S: Storage,
    E: Environment,
    R: MetadataResolver + 'static,
{
    let code = match ShareCode::parse(&code) {
        Ok(code) => code,
        Err(err) => return error_response(&err),
    };

    // Store access blocks (redb commits), keep it off the async workers
    let claimed = tokio::task::spawn_blocking(move || shares.claim_for_peer(&code)).await;

    match claimed {
        Ok(Ok(metadata)) => Json(metadata.to_remote()).into_response(),
        Ok(Err(err)) => {
            tracing::debug!(%code, error = %err, "peer request refused");
            error_response(&err)
        },
        Err(err) => {
            tracing::error!(%code, error = %err, "claim task failed");
            let body = Json(serde_json::json!({ "error": "internal error" }));
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        },
    }
}

fn status_for(err: &ShareError) -> StatusCode {
    match err {
        ShareError::InvalidCodeFormat => StatusCode::BAD_REQUEST,
        ShareError::MetadataNotFound => StatusCode::NOT_FOUND,
        ShareError::AlreadyUsed | ShareError::CodeAlreadyIssued => StatusCode::CONFLICT,
        ShareError::Expired => StatusCode::GONE,
        ShareError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ShareError::NoFileSelected
        | ShareError::DecryptionFailed
        | ShareError::SaveCancelled
        | ShareError::FileAccess { .. }
        | ShareError::CorruptRecord { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &ShareError) -> Response {
    let status = status_for(err);
    // Store details stay in the server log
    let message = if status.is_server_error() {
        status.canonical_reason().unwrap_or("error").to_string()
    } else {
        err.to_string()
    };
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
