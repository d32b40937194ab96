use crate::domain::errors::ChainStateResult;
use cc_01_ledger_store::{index_key, Id, IndexSpec, Object};
use cc_02_protocol::{Operation, ProtocolError};
use shared_crypto::PublicKey;
use shared_types::{AccountName, TimePointSec};
use std::collections::BTreeSet;

/// A deferred transaction collecting approvals.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub id: Id<Proposal>,
    pub author: AccountName,
    pub title: String,
    pub memo: String,
    /// Packed operations, decoded by [`Proposal::operations`].
    pub proposed_operations: Vec<u8>,

    pub required_active_approvals: BTreeSet<AccountName>,
    pub required_owner_approvals: BTreeSet<AccountName>,
    pub required_posting_approvals: BTreeSet<AccountName>,

    pub available_active_approvals: BTreeSet<AccountName>,
    pub available_owner_approvals: BTreeSet<AccountName>,
    pub available_posting_approvals: BTreeSet<AccountName>,
    pub available_key_approvals: BTreeSet<PublicKey>,

    pub expiration_time: TimePointSec,
    pub review_period_time: Option<TimePointSec>,
}

impl Proposal {
    pub fn pack_operations(operations: &[Operation]) -> ChainStateResult<Vec<u8>> {
        Ok(bincode::serialize(operations).map_err(ProtocolError::from)?)
    }

    pub fn operations(&self) -> ChainStateResult<Vec<Operation>> {
        Ok(bincode::deserialize(&self.proposed_operations).map_err(ProtocolError::from)?)
    }

    pub fn is_in_review(&self, now: TimePointSec) -> bool {
        self.review_period_time.is_some_and(|review| now >= review)
    }

    /// Every account named in any required set.
    pub fn required_accounts(&self) -> BTreeSet<AccountName> {
        self.required_active_approvals
            .iter()
            .chain(&self.required_owner_approvals)
            .chain(&self.required_posting_approvals)
            .cloned()
            .collect()
    }

    pub fn has_available_approvals(&self) -> bool {
        !self.available_active_approvals.is_empty()
            || !self.available_owner_approvals.is_empty()
            || !self.available_posting_approvals.is_empty()
            || !self.available_key_approvals.is_empty()
    }
}

impl Object for Proposal {
    const TYPE_NAME: &'static str = "proposal";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_author", |p: &Self| index_key!(&p.author, &p.title)),
            IndexSpec::non_unique("by_expiration", |p: &Self| index_key!(p.expiration_time, p.id)),
        ]
    }
}

/// One account whose approval a proposal requires.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredApproval {
    pub id: Id<RequiredApproval>,
    pub account: AccountName,
    pub proposal: Id<Proposal>,
}

impl Object for RequiredApproval {
    const TYPE_NAME: &'static str = "required_approval";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_account", |r: &Self| index_key!(&r.account, r.proposal)),
            IndexSpec::unique("by_proposal", |r: &Self| index_key!(r.proposal, &r.account)),
        ]
    }
}
