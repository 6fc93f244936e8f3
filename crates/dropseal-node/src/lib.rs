//! dropseal node.
//!
//! Production implementations of the core's collaborator seams, and the
//! [`Node`] that wires them together for the `dropseal` binary.
//!
//! # Components
//!
//! - [`SystemEnv`]: wall clock and OS randomness
//! - [`LocalFs`]: `std::fs` file access
//! - [`CliOperator`] / [`StdoutSink`]: command-line answers to the save
//!   dialog and peer prompt, and the code printed to stdout
//! - [`HttpResolver`]: `GET {peer}/share/{code}` over reqwest
//! - [`PeerServer`]: the axum counterpart serving the local store
//!
//! # Deployment
//!
//! ```text
//!   sender                                receiver
//! +-------------------------+           +-------------------------+
//! | dropseal send --serve   |<-- GET ---| dropseal receive        |
//! |   PeerServer            |--- 200 -->|   HttpResolver          |
//! |   RedbStorage           |           |   RedbStorage (local)   |
//! +-------------------------+           +-------------------------+
//! ```
//!
//! redb locks a database file to one process, so a sender that wants to
//! serve peers does so from the same process that published.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod fs;
pub mod node;
pub mod operator;
pub mod resolver;
pub mod server;
pub mod system_env;

pub use error::NodeError;
pub use fs::LocalFs;
pub use node::{Node, SentShare};
pub use operator::{CliOperator, StdoutSink};
pub use resolver::{DEFAULT_PEER_PORT, HttpResolver};
pub use server::{PeerServer, PeerServerConfig, local_ip};
pub use system_env::SystemEnv;
