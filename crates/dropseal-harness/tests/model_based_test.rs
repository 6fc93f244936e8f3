//! Model-based property tests.
//!
//! Random operation sequences are applied to a real `ShareManager` and to
//! `ShareModel`; every outcome and the final record count must agree.
//!
//! ```text
//! proptest generates: Vec<ShareOp>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!      ShareModel     ShareManager     Compare
//!      (reference)    (SimEnv)         Outcomes
//! ```

use std::{path::Path, time::Duration};

use dropseal_core::{Environment, NoNetwork, ShareCode, ShareConfig, ShareManager};
use dropseal_crypto::SecretKey;
use dropseal_harness::{
    MemoryFs, ModelOutcome, RecordingSink, ScriptedOperator, ShareModel, ShareOp, SimEnv,
};
use dropseal_store::{MemoryStorage, Storage};
use proptest::prelude::*;

const SOURCE: &str = "/src/payload.bin";

/// Real system wrapper mirroring `ShareModel`'s interface.
struct RealWorld {
    env: SimEnv,
    storage: MemoryStorage,
    shares: ShareManager<MemoryStorage, SimEnv, NoNetwork>,
    fs: MemoryFs,
    key: SecretKey,
    codes: Vec<ShareCode>,
    /// Code no operation ever publishes
    stranger: ShareCode,
}

impl RealWorld {
    fn new(seed: u64) -> Self {
        let env = SimEnv::with_seed(seed);
        let storage = MemoryStorage::new();
        let shares =
            ShareManager::new(storage.clone(), env.clone(), NoNetwork, ShareConfig::default());
        let stranger = ShareCode::generate(&SimEnv::with_seed(!seed));
        Self {
            env,
            storage,
            shares,
            fs: MemoryFs::with_file(SOURCE, b"model payload"),
            key: SecretKey::from_bytes([0xAB; 32]),
            codes: Vec::new(),
            stranger,
        }
    }

    async fn apply(&mut self, op: &ShareOp) -> ModelOutcome {
        match *op {
            ShareOp::Publish => {
                let created =
                    self.shares.create_share(Some(Path::new(SOURCE)), &self.key, &self.fs);
                let published = created.and_then(|created| {
                    self.shares.publish_share(
                        &created.encrypted,
                        &created.code,
                        &created.original_file_name,
                        &RecordingSink::new(),
                    )?;
                    Ok(created.code)
                });
                match published {
                    Ok(code) => {
                        self.codes.push(code);
                        ModelOutcome::Published
                    },
                    Err(err) => ModelOutcome::Failed(err),
                }
            },
            ShareOp::Redeem { slot, right_key, save } => {
                let code = self.codes.get(usize::from(slot)).copied().unwrap_or(self.stranger);
                let key =
                    if right_key { self.key.clone() } else { SecretKey::from_bytes([0xCD; 32]) };
                let operator = if save {
                    ScriptedOperator::saving_to("/dst/out.bin")
                } else {
                    ScriptedOperator::cancelling()
                };
                match self.shares.redeem_share(&code.to_string(), &key, &operator, &self.fs).await {
                    Ok(_) => ModelOutcome::Redeemed,
                    Err(err) => ModelOutcome::Failed(err),
                }
            },
            ShareOp::Advance { hours } => {
                self.env.advance(Duration::from_secs(u64::from(hours) * 3_600));
                ModelOutcome::Advanced
            },
            ShareOp::Purge => match self.shares.purge_expired() {
                Ok(purged) => ModelOutcome::Purged(purged),
                Err(err) => ModelOutcome::Failed(err),
            },
        }
    }
}

fn share_op() -> impl Strategy<Value = ShareOp> {
    prop_oneof![
        3 => Just(ShareOp::Publish),
        5 => (0u8..6, any::<bool>(), any::<bool>())
            .prop_map(|(slot, right_key, save)| ShareOp::Redeem { slot, right_key, save }),
        2 => (0u8..30).prop_map(|hours| ShareOp::Advance { hours }),
        1 => Just(ShareOp::Purge),
    ]
}

#[test]
fn prop_manager_matches_model() {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();

    proptest!(ProptestConfig::with_cases(64), |(
        seed in any::<u64>(),
        ops in prop::collection::vec(share_op(), 1..40),
    )| {
        let mut real = RealWorld::new(seed);
        let ttl = ShareConfig::default().share_ttl;
        let mut model = ShareModel::new(real.env.wall_clock_secs(), ttl);

        for op in &ops {
            let expected = model.apply(op);
            let actual = runtime.block_on(real.apply(op));
            prop_assert_eq!(actual, expected, "op {:?}", op);
        }

        let stored = real.storage.keys_with_prefix("share:").unwrap().len();
        prop_assert_eq!(stored, model.stored());
    });
}
