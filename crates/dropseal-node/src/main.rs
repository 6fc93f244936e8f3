//! dropseal binary.
//!
//! # Usage
//!
//! ```bash
//! export DROPSEAL_PASSWORD='correct-horse'
//!
//! # One-time account setup
//! dropseal init
//!
//! # Sender: publish and keep serving peers until Ctrl+C; prints the --peer address
//! dropseal send report.pdf --serve
//!
//! # Receiver: ask the sender's node first, then the local store
//! dropseal receive 3f2b8c1e-9a4d-4e7f-8b21-5c6d7e8f9a0b --key <hex> --peer 192.168.1.20
//! ```

use std::{
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use clap::{Parser, Subcommand};
use dropseal_core::{CredentialConfig, ShareConfig, config::DEFAULT_SHARE_TTL};
use dropseal_node::{
    CliOperator, Node, NodeError, PeerServer, PeerServerConfig, StdoutSink, SystemEnv,
};
use dropseal_store::RedbStorage;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

const DEFAULT_BIND: &str = "0.0.0.0:7420";

/// Encrypted one-shot file sharing
#[derive(Parser, Debug)]
#[command(name = "dropseal")]
#[command(about = "Encrypted one-shot file sharing")]
#[command(version)]
struct Args {
    /// Path to the local store
    #[arg(long, env = "DROPSEAL_STORE", default_value = "dropseal.redb", global = true)]
    store: PathBuf,

    /// Account password
    #[arg(long, env = "DROPSEAL_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set up (or change) the account password
    Init,

    /// Check the account password
    Unlock,

    /// Encrypt a file and publish a share code for it
    Send {
        /// File to share
        file: PathBuf,

        /// Hours until the share expires
        #[arg(long, default_value_t = DEFAULT_SHARE_TTL.as_secs() / 3_600)]
        ttl_hours: u64,

        /// Keep serving the store to peers after publishing
        #[arg(long)]
        serve: bool,

        /// Address the peer server binds to
        #[arg(long, default_value = DEFAULT_BIND)]
        bind: String,
    },

    /// Redeem a share code
    Receive {
        /// Share code
        code: String,

        /// Per-file key printed by the sender (hex)
        #[arg(long)]
        key: String,

        /// Sender's address (host, host:port or URL)
        #[arg(long)]
        peer: Option<String>,

        /// Output file or directory
        #[arg(long)]
        out: Option<PathBuf>,

        /// Replace an existing output file
        #[arg(long)]
        force: bool,
    },

    /// Serve the local store to peers
    Serve {
        /// Address to bind to
        #[arg(long, default_value = DEFAULT_BIND)]
        bind: String,
    },

    /// Delete expired shares
    Purge,

    /// Show a local share record
    Status {
        /// Share code
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let mut share_config = ShareConfig::default();
    if let Command::Send { ttl_hours, .. } = &args.command {
        share_config.share_ttl = Duration::from_secs(ttl_hours.saturating_mul(3_600));
    }

    tracing::debug!(store = %args.store.display(), "opening store");
    let storage = RedbStorage::open(&args.store)?;
    let node = Node::new(storage, SystemEnv::new(), share_config, CredentialConfig::default());
    let password = args.password.map(Zeroizing::new);
    let mut stdout = io::stdout();

    match args.command {
        Command::Init => {
            node.init(password.ok_or(NodeError::PasswordRequired)?).await?;
            writeln!(stdout, "password set")?;
        },
        Command::Unlock => {
            node.unlock(password.ok_or(NodeError::PasswordRequired)?).await?;
            writeln!(stdout, "unlocked")?;
        },
        Command::Send { file, serve, bind, .. } => {
            node.unlock(password.ok_or(NodeError::PasswordRequired)?).await?;

            let sent = node.send(&file, &StdoutSink)?;
            writeln!(stdout, "share key:  {}", sent.key_hex())?;
            writeln!(
                stdout,
                "expires in: {}h",
                sent.metadata.remaining_secs(node.now_secs()) / 3_600
            )?;
            stdout.flush()?;

            if serve {
                let server = node.peer_server(&PeerServerConfig { bind_address: bind }).await?;
                serve_until_ctrl_c(server).await?;
            }
        },
        Command::Receive { code, key, peer, out, force } => {
            node.unlock(password.ok_or(NodeError::PasswordRequired)?).await?;

            let operator = CliOperator::new(peer, out);
            let outcome = node.receive(&code, &key, &operator, force).await?;
            writeln!(
                stdout,
                "saved {} bytes to {} (via {})",
                outcome.bytes_written,
                outcome.destination.display(),
                outcome.source
            )?;
        },
        Command::Serve { bind } => {
            let server = node.peer_server(&PeerServerConfig { bind_address: bind }).await?;
            serve_until_ctrl_c(server).await?;
        },
        Command::Purge => {
            let purged = node.purge()?;
            writeln!(stdout, "purged {purged} expired share(s)")?;
        },
        Command::Status { code } => match node.status(&code)? {
            Some(metadata) => {
                let now = node.now_secs();
                let state = if metadata.is_expired(now) {
                    "expired"
                } else if metadata.use_count > 0 {
                    "in use"
                } else {
                    "available"
                };
                writeln!(stdout, "file:       {}", metadata.original_file_name)?;
                writeln!(stdout, "state:      {state}")?;
                writeln!(stdout, "expires in: {}s", metadata.remaining_secs(now))?;
            },
            None => writeln!(stdout, "no local record for {}", code.trim())?,
        },
    }

    Ok(())
}

async fn serve_until_ctrl_c(server: PeerServer) -> Result<(), NodeError> {
    let reachable = server.reachable_addr()?;
    tracing::info!(addr = %server.local_addr()?, %reachable, "serving shares, Ctrl+C to stop");
    writeln!(io::stdout(), "receivers can use: --peer {reachable}")
        .map_err(|e| NodeError::Server(e.to_string()))?;
    server.run_until(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
