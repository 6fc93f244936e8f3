//! Fuzz target for the share lifecycle under storage failures
//!
//! Drives a ShareManager over ChaoticStorage with arbitrary publish, peer
//! claim, purge and clock operations.
//!
//! # Invariants
//!
//! - Storage errors surface as `ShareError::StoreUnavailable`, never panics
//! - A code is handed to a peer at most once
//! - An expired share is never handed out

#![no_main]

use std::{collections::HashSet, time::Duration};

use arbitrary::Arbitrary;
use dropseal_core::{Environment, NoNetwork, ShareCode, ShareConfig, ShareError, ShareManager};
use dropseal_harness::{RecordingSink, SimEnv};
use dropseal_store::{ChaoticStorage, MemoryStorage};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Scenario {
    seed: u64,
    /// 0-9 maps to 0%-90%
    failure_rate_tenth: u8,
    operations: Vec<Operation>,
}

#[derive(Debug, Arbitrary)]
enum Operation {
    Publish,
    Claim { slot: u8 },
    Purge,
    Advance { hours: u8 },
}

fuzz_target!(|scenario: Scenario| {
    let rate = f64::from(scenario.failure_rate_tenth % 10) / 10.0;
    let storage = ChaoticStorage::with_seed(MemoryStorage::new(), rate, scenario.seed);
    let env = SimEnv::with_seed(scenario.seed);
    let config = ShareConfig::default();
    let shares = ShareManager::new(storage, env.clone(), NoNetwork, config);

    let mut published: Vec<ShareCode> = Vec::new();
    let mut claimed: HashSet<ShareCode> = HashSet::new();
    let sink = RecordingSink::new();

    for op in scenario.operations.iter().take(64) {
        match op {
            Operation::Publish => {
                let code = ShareCode::generate(&env);
                match shares.publish_share("AAAA", &code, "f.bin", &sink) {
                    Ok(_) => published.push(code),
                    Err(err) => assert!(matches!(err, ShareError::StoreUnavailable(_))),
                }
            },
            Operation::Claim { slot } => {
                if published.is_empty() {
                    continue;
                }
                let code = published[usize::from(*slot) % published.len()];
                match shares.claim_for_peer(&code) {
                    Ok(metadata) => {
                        assert!(!metadata.is_expired(env.wall_clock_secs()));
                        assert!(claimed.insert(code), "code {code} served twice");
                    },
                    Err(
                        ShareError::StoreUnavailable(_)
                        | ShareError::MetadataNotFound
                        | ShareError::Expired,
                    ) => {},
                    Err(err) => panic!("unexpected claim error: {err:?}"),
                }
            },
            Operation::Purge => {
                if let Err(err) = shares.purge_expired() {
                    assert!(matches!(err, ShareError::StoreUnavailable(_)));
                }
            },
            Operation::Advance { hours } => {
                env.advance(Duration::from_secs(u64::from(*hours) * 3_600));
            },
        }
    }
});
