//! Deterministic test harness for dropseal.
//!
//! - [`SimEnv`]: manual wall clock and a seeded ChaCha RNG, so share codes,
//!   salts and nonces are reproducible from a seed.
//! - [`fakes`]: in-memory collaborators that record what the core asked of
//!   them (file reads and writes, dialog answers, published codes, peer
//!   lookups).
//!
//! # Model-Based Testing
//!
//! The `model` module is a reference implementation of the share lifecycle.
//! Operations are applied to both the model and a real `ShareManager`, and
//! their outcomes are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fakes;
pub mod model;
pub mod sim_env;

pub use fakes::{MemoryFs, RecordingSink, ScriptedOperator, StubBehavior, StubResolver};
pub use model::{ModelOutcome, ShareModel, ShareOp};
pub use sim_env::SimEnv;
