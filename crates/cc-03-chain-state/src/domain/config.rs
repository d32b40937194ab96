//! Genesis configuration.

use cc_02_protocol::config::INIT_WITNESS_NAME;
use shared_crypto::{sha256, PublicKey};
use shared_types::{AccountName, ChainId, TimePointSec};

/// Everything needed to build block 0 state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisConfig {
    /// The chain id is the sha256 of this name.
    pub chain_name: String,
    pub genesis_time: TimePointSec,
    /// Initial CEDAR supply, credited to the first init witness.
    pub init_supply: i64,
    /// Number of init witness accounts, at least 1.
    pub init_witness_count: usize,
    /// Seed of the key shared by every init witness when `init_public_key`
    /// is not given.
    pub init_key_seed: String,
    pub init_public_key: Option<PublicKey>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            chain_name: "cedar".to_string(),
            genesis_time: TimePointSec::from_secs(1_735_689_600),
            init_supply: 1_000_000_000,
            init_witness_count: 1,
            init_key_seed: INIT_WITNESS_NAME.to_string(),
            init_public_key: None,
        }
    }
}

impl GenesisConfig {
    pub fn chain_id(&self) -> ChainId {
        sha256(self.chain_name.as_bytes())
    }

    /// `initwitness`, `initwitness1`, `initwitness2`, ...
    pub fn init_witness_names(&self) -> Vec<AccountName> {
        (0..self.init_witness_count.max(1))
            .map(|i| {
                if i == 0 {
                    AccountName::new(INIT_WITNESS_NAME)
                } else {
                    AccountName::new(format!("{INIT_WITNESS_NAME}{i}"))
                }
            })
            .collect()
    }
}
