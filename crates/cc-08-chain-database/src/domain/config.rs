//! Chain database configuration.

use cc_01_ledger_store::StoreConfig;
use cc_03_chain_state::GenesisConfig;
use cc_05_consensus_params::HardforkSchedule;
use cc_07_fork_choice::DEFAULT_MAX_SIZE;
use shared_types::BlockId;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Directory of the block log. `None` keeps blocks in memory only.
    pub data_dir: Option<PathBuf>,
    pub store: StoreConfig,
    pub genesis: GenesisConfig,
    pub hardforks: HardforkSchedule,
    /// Initial fork buffer size. Once blocks are applied the buffer tracks
    /// the distance to the last irreversible block instead.
    pub fork_db_size: u32,
    pub checkpoints: Vec<(u32, BlockId)>,
    /// Sync the block log to disk on [`crate::ChainDatabase::close`].
    pub flush_on_close: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            store: StoreConfig::default(),
            genesis: GenesisConfig::default(),
            hardforks: HardforkSchedule::default(),
            fork_db_size: DEFAULT_MAX_SIZE,
            checkpoints: Vec::new(),
            flush_on_close: true,
        }
    }
}

impl ChainConfig {
    /// File-backed block log under `dir`.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }
}
