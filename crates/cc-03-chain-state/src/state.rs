//! # Chain State
//!
//! [`ChainState`] is the explicit context every component receives: the
//! ledger store, the chain id, the notification hub and the transient
//! context of whatever is being applied right now.

mod economy;

pub use economy::calculate_vshares;
mod genesis;
mod invariants;
mod notify;


use crate::domain::{
    Account, AccountAuthority, AccountRecoveryRequest, BlockSummary, ChainStateError,
    ChainStateResult, Comment, CommentVote, ConvertRequest, DynamicGlobalProperty, Escrow,
    FeedHistory, HardforkProperty, LimitOrder, LiquidityRewardBalance, OwnerAuthorityHistory,
    Proposal, RequiredApproval, SkipFlags, TransactionObject, Witness, WitnessSchedule,
    WitnessVote,
};
use crate::notifications::{ChainNotifications, OperationNotification};
use cc_01_ledger_store::{index_key, Id, LedgerStore, SessionId, StoreConfig};
use cc_02_protocol::{Authority, AuthorityGetters};
use shared_types::{AccountName, BlockId, ChainId, TimePointSec, TransactionId};
use std::sync::Arc;

/// What is being applied right now. Reset by the block and transaction
/// pipelines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyContext {
    /// Building a block or accepting pending transactions locally, as
    /// opposed to applying a block received from the network.
    pub producing: bool,
    pub skip: SkipFlags,
    pub current_block_num: u32,
    pub current_trx_id: Option<TransactionId>,
    pub current_trx_in_block: u32,
    pub current_op_in_trx: u16,
    pub current_virtual_op: u32,
    /// Nesting of proposal creates inside executing proposals.
    pub proposal_create_depth: u32,
    pub proposal_update_depth: u32,
}

/// The chain's state and the context it is being mutated in.
pub struct ChainState {
    store: LedgerStore,
    chain_id: ChainId,
    notifications: Arc<ChainNotifications>,
    context: ApplyContext,
    applied_operations: Vec<OperationNotification>,
}

impl std::fmt::Debug for ChainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainState")
            .field("revision", &self.store.revision())
            .field("objects", &self.store.object_count())
            .field("context", &self.context)
            .finish()
    }
}

impl ChainState {
    /// Empty state with every core index registered.
    pub fn new(config: StoreConfig, chain_id: ChainId) -> ChainStateResult<Self> {
        let mut store = LedgerStore::new(config);
        register_core_indexes(&mut store)?;
        Ok(Self {
            store,
            chain_id,
            notifications: Arc::new(ChainNotifications::default()),
            context: ApplyContext::default(),
            applied_operations: Vec::new(),
        })
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut LedgerStore {
        &mut self.store
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    pub fn notifications(&self) -> &Arc<ChainNotifications> {
        &self.notifications
    }

    pub fn context(&self) -> &ApplyContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ApplyContext {
        &mut self.context
    }

    pub fn is_producing(&self) -> bool {
        self.context.producing
    }

    pub fn skip(&self) -> SkipFlags {
        self.context.skip
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    pub fn begin_session(&mut self) -> SessionId {
        self.store.begin_session()
    }

    pub fn rollback(&mut self, id: SessionId) -> ChainStateResult<()> {
        Ok(self.store.rollback(id)?)
    }

    pub fn merge(&mut self, id: SessionId) -> ChainStateResult<()> {
        Ok(self.store.merge(id)?)
    }

    pub fn keep(&mut self, id: SessionId) -> ChainStateResult<()> {
        Ok(self.store.keep(id)?)
    }

    /// Run `f` in a nested session: merged on `Ok`, rolled back on `Err`.
    pub fn with_session<R, E, F>(&mut self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut ChainState) -> Result<R, E>,
        E: From<ChainStateError>,
    {
        let id = self.begin_session();
        match f(self) {
            Ok(value) => {
                self.merge(id)?;
                Ok(value)
            }
            Err(e) => {
                self.rollback(id)?;
                Err(e)
            }
        }
    }

    /// Run `f` in a nested session that is always rolled back.
    pub fn with_dry_run<R, E, F>(&mut self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut ChainState) -> Result<R, E>,
        E: From<ChainStateError>,
    {
        let id = self.begin_session();
        let result = f(self);
        self.rollback(id)?;
        result
    }

    // =========================================================================
    // Singletons
    // =========================================================================

    pub fn dgp(&self) -> ChainStateResult<&DynamicGlobalProperty> {
        Ok(self.store.get(Id::new(0))?)
    }

    pub fn modify_dgp<F: FnOnce(&mut DynamicGlobalProperty)>(&mut self, f: F) -> ChainStateResult<()> {
        Ok(self.store.modify(Id::<DynamicGlobalProperty>::new(0), f)?)
    }

    pub fn hardfork_property(&self) -> ChainStateResult<&HardforkProperty> {
        Ok(self.store.get(Id::new(0))?)
    }

    pub fn witness_schedule(&self) -> ChainStateResult<&WitnessSchedule> {
        Ok(self.store.get(Id::new(0))?)
    }

    pub fn feed_history(&self) -> ChainStateResult<&FeedHistory> {
        Ok(self.store.get(Id::new(0))?)
    }

    pub fn head_block_num(&self) -> ChainStateResult<u32> {
        Ok(self.dgp()?.head_block_number)
    }

    pub fn head_block_time(&self) -> ChainStateResult<TimePointSec> {
        Ok(self.dgp()?.time)
    }

    pub fn head_block_id(&self) -> ChainStateResult<BlockId> {
        Ok(self.dgp()?.head_block_id)
    }

    pub fn last_irreversible_block_num(&self) -> ChainStateResult<u32> {
        Ok(self.dgp()?.last_irreversible_block_num)
    }

    pub fn has_hardfork(&self, hardfork: u32) -> ChainStateResult<bool> {
        Ok(self.hardfork_property()?.last_hardfork >= hardfork)
    }

    /// Block id recorded in the TaPoS ring for `block_num`.
    pub fn block_summary(&self, block_num: u32) -> ChainStateResult<BlockId> {
        let slot = u64::from(block_num & 0xFFFF);
        Ok(self.store.get::<BlockSummary>(Id::new(slot))?.block_id)
    }

    pub fn is_known_transaction(&self, trx_id: &TransactionId) -> ChainStateResult<bool> {
        Ok(self
            .store
            .find_by::<TransactionObject>("by_trx_id", &index_key!(&trx_id.0[..]))?
            .is_some())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn find_account(&self, name: &AccountName) -> ChainStateResult<Option<&Account>> {
        Ok(self.store.find_by("by_name", &index_key!(name))?)
    }

    pub fn get_account(&self, name: &AccountName) -> ChainStateResult<&Account> {
        self.find_account(name)?
            .ok_or_else(|| ChainStateError::UnknownAccount(name.clone()))
    }

    pub fn modify_account<F: FnOnce(&mut Account)>(&mut self, name: &AccountName, f: F) -> ChainStateResult<()> {
        let id = self.get_account(name)?.id;
        Ok(self.store.modify(id, f)?)
    }

    pub fn find_account_authority(&self, name: &AccountName) -> ChainStateResult<Option<&AccountAuthority>> {
        Ok(self.store.find_by("by_account", &index_key!(name))?)
    }

    pub fn get_account_authority(&self, name: &AccountName) -> ChainStateResult<&AccountAuthority> {
        self.find_account_authority(name)?
            .ok_or_else(|| ChainStateError::UnknownAccount(name.clone()))
    }

    pub fn find_witness(&self, owner: &AccountName) -> ChainStateResult<Option<&Witness>> {
        Ok(self.store.find_by("by_name", &index_key!(owner))?)
    }

    pub fn get_witness(&self, owner: &AccountName) -> ChainStateResult<&Witness> {
        Ok(self.store.get_by("by_name", &index_key!(owner))?)
    }

    pub fn find_comment(&self, author: &AccountName, permlink: &str) -> ChainStateResult<Option<&Comment>> {
        Ok(self.store.find_by("by_permlink", &index_key!(author, permlink))?)
    }

    pub fn get_comment(&self, author: &AccountName, permlink: &str) -> ChainStateResult<&Comment> {
        Ok(self.store.get_by("by_permlink", &index_key!(author, permlink))?)
    }

    pub fn find_proposal(&self, author: &AccountName, title: &str) -> ChainStateResult<Option<&Proposal>> {
        Ok(self.store.find_by("by_author", &index_key!(author, title))?)
    }

    pub fn get_proposal(&self, author: &AccountName, title: &str) -> ChainStateResult<&Proposal> {
        Ok(self.store.get_by("by_author", &index_key!(author, title))?)
    }

    /// Required approval records of one proposal.
    pub fn required_approvals(&self, proposal: Id<Proposal>) -> ChainStateResult<Vec<&RequiredApproval>> {
        Ok(self
            .store
            .equal_range::<RequiredApproval>("by_proposal", &index_key!(proposal))?
            .collect())
    }

    /// Run `f` with authority lookups backed by this state.
    pub fn with_authority_getters<R>(&self, f: impl FnOnce(AuthorityGetters<'_>) -> R) -> R {
        let lookup = |name: &AccountName, pick: fn(&AccountAuthority) -> &Authority| {
            self.find_account_authority(name)
                .ok()
                .flatten()
                .map(|auth| pick(auth).clone())
        };
        let active = |name: &AccountName| lookup(name, |a| &a.active);
        let owner = |name: &AccountName| lookup(name, |a| &a.owner);
        let posting = |name: &AccountName| lookup(name, |a| &a.posting);
        f(AuthorityGetters {
            active: &active,
            owner: &owner,
            posting: &posting,
        })
    }

    // =========================================================================
    // Applied operations
    // =========================================================================

    /// Operations applied since the last [`ChainState::clear_applied_operations`].
    pub fn applied_operations(&self) -> &[OperationNotification] {
        &self.applied_operations
    }

    pub fn clear_applied_operations(&mut self) {
        self.applied_operations.clear();
    }

    /// Forget operations recorded after the first `len`, e.g. those of a
    /// dry run.
    pub fn truncate_applied_operations(&mut self, len: usize) {
        self.applied_operations.truncate(len);
    }
}

/// Register every core object index.
pub fn register_core_indexes(store: &mut LedgerStore) -> ChainStateResult<()> {
    store.register_index::<DynamicGlobalProperty>()?;
    store.register_index::<HardforkProperty>()?;
    store.register_index::<WitnessSchedule>()?;
    store.register_index::<FeedHistory>()?;
    store.register_index::<Account>()?;
    store.register_index::<AccountAuthority>()?;
    store.register_index::<OwnerAuthorityHistory>()?;
    store.register_index::<AccountRecoveryRequest>()?;
    store.register_index::<Witness>()?;
    store.register_index::<WitnessVote>()?;
    store.register_index::<Comment>()?;
    store.register_index::<CommentVote>()?;
    store.register_index::<ConvertRequest>()?;
    store.register_index::<LimitOrder>()?;
    store.register_index::<LiquidityRewardBalance>()?;
    store.register_index::<Escrow>()?;
    store.register_index::<BlockSummary>()?;
    store.register_index::<TransactionObject>()?;
    store.register_index::<Proposal>()?;
    store.register_index::<RequiredApproval>()?;
    Ok(())
}
