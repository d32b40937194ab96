//! Deferred multi-party transactions.

use super::{check, validate_account_name, BaseOperation, Operation};
use crate::authority::{Authority, RequiredAuthorities};
use crate::config::{MAX_MEMO_SIZE, MAX_TITLE_LENGTH};
use crate::errors::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use shared_crypto::PublicKey;
use shared_types::{AccountName, TimePointSec};
use std::collections::BTreeSet;

fn validate_title(title: &str) -> ProtocolResult<()> {
    check(!title.is_empty(), "title", "title cannot be empty")?;
    check(title.len() < MAX_TITLE_LENGTH, "title", "title is too long")
}

/// Propose a batch of operations to be executed once every required
/// account approved it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCreateOperation {
    pub author: AccountName,
    pub title: String,
    pub memo: String,
    pub proposed_operations: Vec<Operation>,
    pub expiration_time: TimePointSec,
    pub review_period_time: Option<TimePointSec>,
}

impl BaseOperation for ProposalCreateOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("author", &self.author)?;
        validate_title(&self.title)?;
        check(self.memo.len() < MAX_MEMO_SIZE, "memo", "memo is too large")?;
        check(
            !self.proposed_operations.is_empty(),
            "proposed_operations",
            "at least one operation must be proposed",
        )?;
        for op in &self.proposed_operations {
            op.validate()?;
        }
        Ok(())
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.author.clone());
    }
}

/// Add or revoke approvals on an existing proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalUpdateOperation {
    pub author: AccountName,
    pub title: String,
    pub active_approvals_to_add: BTreeSet<AccountName>,
    pub active_approvals_to_remove: BTreeSet<AccountName>,
    pub owner_approvals_to_add: BTreeSet<AccountName>,
    pub owner_approvals_to_remove: BTreeSet<AccountName>,
    pub posting_approvals_to_add: BTreeSet<AccountName>,
    pub posting_approvals_to_remove: BTreeSet<AccountName>,
    pub key_approvals_to_add: BTreeSet<PublicKey>,
    pub key_approvals_to_remove: BTreeSet<PublicKey>,
}

impl ProposalUpdateOperation {
    fn keys(&self) -> impl Iterator<Item = &PublicKey> {
        self.key_approvals_to_add
            .iter()
            .chain(&self.key_approvals_to_remove)
    }
}

fn disjoint<T: Ord>(field: &'static str, add: &BTreeSet<T>, remove: &BTreeSet<T>) -> ProtocolResult<()> {
    check(
        add.is_disjoint(remove),
        field,
        "cannot add and remove the same approval",
    )
}

impl BaseOperation for ProposalUpdateOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("author", &self.author)?;
        validate_title(&self.title)?;

        let posting = !self.posting_approvals_to_add.is_empty()
            || !self.posting_approvals_to_remove.is_empty();
        let others = !self.active_approvals_to_add.is_empty()
            || !self.active_approvals_to_remove.is_empty()
            || !self.owner_approvals_to_add.is_empty()
            || !self.owner_approvals_to_remove.is_empty()
            || self.keys().next().is_some();
        check(posting || others, "approvals", "nothing to update")?;
        if posting && others {
            return Err(ProtocolError::MixedPostingAuthority);
        }

        disjoint(
            "active_approvals_to_add",
            &self.active_approvals_to_add,
            &self.active_approvals_to_remove,
        )?;
        disjoint(
            "owner_approvals_to_add",
            &self.owner_approvals_to_add,
            &self.owner_approvals_to_remove,
        )?;
        disjoint(
            "posting_approvals_to_add",
            &self.posting_approvals_to_add,
            &self.posting_approvals_to_remove,
        )?;
        disjoint(
            "key_approvals_to_add",
            &self.key_approvals_to_add,
            &self.key_approvals_to_remove,
        )?;

        for name in self
            .active_approvals_to_add
            .iter()
            .chain(&self.active_approvals_to_remove)
            .chain(&self.owner_approvals_to_add)
            .chain(&self.owner_approvals_to_remove)
            .chain(&self.posting_approvals_to_add)
            .chain(&self.posting_approvals_to_remove)
        {
            validate_account_name("approvals", name)?;
        }
        Ok(())
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.extend(
            self.active_approvals_to_add
                .iter()
                .chain(&self.active_approvals_to_remove)
                .cloned(),
        );
        required.owner.extend(
            self.owner_approvals_to_add
                .iter()
                .chain(&self.owner_approvals_to_remove)
                .cloned(),
        );
        required.posting.extend(
            self.posting_approvals_to_add
                .iter()
                .chain(&self.posting_approvals_to_remove)
                .cloned(),
        );

        let keys: BTreeSet<PublicKey> = self.keys().copied().collect();
        if !keys.is_empty() {
            let mut auth = Authority::new(keys.len() as u32);
            for key in keys {
                auth = auth.with_key(key, 1);
            }
            required.other.push(auth);
        }
    }
}

/// Remove a proposal. `requester` must be the author or a required approver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDeleteOperation {
    pub author: AccountName,
    pub title: String,
    pub requester: AccountName,
}

impl BaseOperation for ProposalDeleteOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("author", &self.author)?;
        validate_account_name("requester", &self.requester)?;
        validate_title(&self.title)
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.requester.clone());
    }
}
