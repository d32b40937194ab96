//! Block 0 state.

use super::ChainState;
use crate::domain::{
    Account, AccountAuthority, BlockSummary, ChainStateError, ChainStateResult,
    DynamicGlobalProperty, FeedHistory, GenesisConfig, HardforkProperty, Witness,
    WitnessSchedule,
};
use cc_01_ledger_store::StoreConfig;
use cc_02_protocol::config::{BLOCK_SUMMARY_COUNT, DEFAULT_MAX_BLOCK_SIZE, MAX_WITNESSES, NULL_ACCOUNT};
use cc_02_protocol::{Authority, ChainProperties, ProtocolError, Version};
use shared_crypto::{PrivateKey, PublicKey};
use shared_types::{AccountName, Asset, BlockId, Price, TimePointSec};
use std::collections::VecDeque;
use tracing::info;

impl ChainState {
    /// Fresh state initialized from `genesis`.
    pub fn from_genesis(config: StoreConfig, genesis: &GenesisConfig) -> ChainStateResult<Self> {
        let mut state = Self::new(config, genesis.chain_id())?;
        state.init_genesis(genesis)?;
        Ok(state)
    }

    /// Create the singletons, the `null` account and the init witnesses.
    /// Writes are permanent: no session may be open.
    pub fn init_genesis(&mut self, genesis: &GenesisConfig) -> ChainStateResult<()> {
        if self.store.open_session_count() != 0 || self.store.len::<DynamicGlobalProperty>()? != 0 {
            return Err(ChainStateError::Genesis(
                "state is not empty or a session is open".into(),
            ));
        }
        if genesis.init_supply < 0 {
            return Err(ChainStateError::Genesis("negative initial supply".into()));
        }
        let time = genesis.genesis_time;
        let init_key = match genesis.init_public_key {
            Some(key) => key,
            None => PrivateKey::from_seed(&genesis.init_key_seed)
                .and_then(|k| k.public_key())
                .map_err(ProtocolError::from)?,
        };

        self.store
            .create(|id| DynamicGlobalProperty::new(id, time, DEFAULT_MAX_BLOCK_SIZE))?;

        self.create_genesis_account(&AccountName::new(NULL_ACCOUNT), PublicKey::null(), Authority::new(1), time)?;

        let names = genesis.init_witness_names();
        for name in &names {
            self.create_genesis_account(name, init_key, Authority::from_key(init_key), time)?;
            self.store
                .create(|id| Witness::new(id, name.clone(), init_key, time))?;
        }
        let supply = Asset::cedar(genesis.init_supply);
        self.modify_account(&names[0], |a| a.balance = supply)?;
        self.modify_dgp(|p| {
            p.current_supply = supply;
            p.virtual_supply = supply;
        })?;

        self.store.create(|id| HardforkProperty {
            id,
            processed_hardforks: vec![time],
            last_hardfork: 0,
            current_hardfork_version: Version::default(),
            next_hardfork: Version::default(),
            next_hardfork_time: time,
        })?;
        self.store.create(|id| FeedHistory {
            id,
            current_median_history: Price::null(),
            price_history: VecDeque::new(),
        })?;
        self.store.create(|id| WitnessSchedule {
            id,
            current_virtual_time: 0,
            next_shuffle_block_num: MAX_WITNESSES as u32,
            current_shuffled_witnesses: names.clone(),
            median_props: ChainProperties::default(),
            majority_version: Version::default(),
        })?;
        for _ in 0..BLOCK_SUMMARY_COUNT {
            self.store.create(|id| BlockSummary {
                id,
                block_id: BlockId::default(),
            })?;
        }

        info!(
            chain = %genesis.chain_name,
            witnesses = names.len(),
            %supply,
            %time,
            "Initialized genesis state"
        );
        Ok(())
    }

    fn create_genesis_account(
        &mut self,
        name: &AccountName,
        key: PublicKey,
        authority: Authority,
        time: TimePointSec,
    ) -> ChainStateResult<()> {
        self.store
            .create(|id| Account::new(id, name.clone(), key, time))?;
        self.store.create(|id| AccountAuthority {
            id,
            account: name.clone(),
            owner: authority.clone(),
            active: authority.clone(),
            posting: authority,
            last_owner_update: TimePointSec::MIN,
        })?;
        Ok(())
    }
}
