//! Deferred transactions approved by several parties.
//!
//! A proposal records the operations, the accounts whose approval they
//! need and the approvals given so far. It executes as soon as its
//! approvals satisfy the operations' authorities, unless it has a review
//! period, in which case it executes when it expires. Execution happens in
//! a nested session: if any operation fails the proposal is left in place
//! and retried at expiration.

use super::ensure;
use crate::domain::{EvaluationError, EvaluationResult};
use crate::registry::EvaluatorRegistry;
use cc_01_ledger_store::Id;
use cc_02_protocol::config::{
    MAX_PROPOSAL_DEPTH, MAX_PROPOSAL_LIFETIME_SEC, MAX_SIG_CHECK_DEPTH, MAX_TIME_UNTIL_EXPIRATION,
};
use cc_02_protocol::{
    check_authority, required_authorities, Approvals, AuthorityCheck, ProposalCreateOperation,
    ProposalDeleteOperation, ProposalUpdateOperation, ProtocolError, SignedTransaction,
    Transaction,
};
use cc_03_chain_state::{ChainState, Proposal, RequiredApproval, SkipFlags};
use shared_crypto::PublicKey;
use shared_types::AccountName;
use std::collections::BTreeSet;
use std::fmt::Display;
use tracing::{debug, info, warn};

fn check_depth(state: &ChainState, depth: u32) -> EvaluationResult<()> {
    if state.is_producing() && depth > MAX_PROPOSAL_DEPTH {
        return Err(EvaluationError::ProposalDepthTooHigh {
            max: MAX_PROPOSAL_DEPTH,
        });
    }
    Ok(())
}

pub(crate) fn apply_proposal_create(
    registry: &EvaluatorRegistry,
    state: &mut ChainState,
    op: &ProposalCreateOperation,
) -> EvaluationResult<()> {
    state.context_mut().proposal_create_depth += 1;
    let result = create(registry, state, op);
    state.context_mut().proposal_create_depth -= 1;
    result
}

fn create(
    registry: &EvaluatorRegistry,
    state: &mut ChainState,
    op: &ProposalCreateOperation,
) -> EvaluationResult<()> {
    check_depth(state, state.context().proposal_create_depth)?;
    if state.find_proposal(&op.author, &op.title)?.is_some() {
        return Err(EvaluationError::ObjectExists {
            object: "proposal",
            key: format!("{}/{}", op.author, op.title),
        });
    }

    let now = state.head_block_time()?;
    ensure(
        op.expiration_time > now,
        "ProposalCreate",
        "proposal has already expired on creation",
    )?;
    ensure(
        op.expiration_time <= now + MAX_PROPOSAL_LIFETIME_SEC,
        "ProposalCreate",
        "proposal expiration time is too far in the future",
    )?;
    if let Some(review) = op.review_period_time {
        ensure(
            review > now,
            "ProposalCreate",
            "proposal review period has expired on creation",
        )?;
        ensure(
            review < op.expiration_time,
            "ProposalCreate",
            "proposal review period must end before the proposal expires",
        )?;
    }

    let required = required_authorities(&op.proposed_operations);
    ensure(
        required.other.is_empty(),
        "ProposalCreate",
        "proposed operations cannot require raw key authorities",
    )?;
    // Owner approval implies active approval.
    let owner = required.owner;
    let active: BTreeSet<AccountName> = required.active.difference(&owner).cloned().collect();
    let posting = required.posting;
    if posting.is_empty() == (owner.is_empty() && active.is_empty()) {
        return Err(ProtocolError::MixedPostingAuthority.into());
    }
    for account in owner.iter().chain(&active).chain(&posting) {
        state.get_account(account)?;
    }

    // Dry-run the operations so the evaluators' own checks apply now.
    let mut trx = Transaction::new(op.proposed_operations.clone());
    trx.set_expiration(now + MAX_TIME_UNTIL_EXPIRATION);
    let skip = SkipFlags::AUTHORITY_CHECK
        | SkipFlags::TRANSACTION_SIGNATURES
        | SkipFlags::TAPOS_CHECK
        | SkipFlags::DATABASE_LOCKING;
    registry.validate_transaction(state, &SignedTransaction::from(trx), skip)?;

    let packed = Proposal::pack_operations(&op.proposed_operations)?;
    let accounts: BTreeSet<AccountName> =
        owner.iter().chain(&active).chain(&posting).cloned().collect();
    let proposal = state.store_mut().create(|id| Proposal {
        id,
        author: op.author.clone(),
        title: op.title.clone(),
        memo: op.memo.clone(),
        proposed_operations: packed,
        required_active_approvals: active,
        required_owner_approvals: owner,
        required_posting_approvals: posting,
        available_active_approvals: BTreeSet::new(),
        available_owner_approvals: BTreeSet::new(),
        available_posting_approvals: BTreeSet::new(),
        available_key_approvals: BTreeSet::new(),
        expiration_time: op.expiration_time,
        review_period_time: op.review_period_time,
    })?;
    for account in accounts {
        state.store_mut().create(|id| RequiredApproval {
            id,
            account,
            proposal,
        })?;
    }
    debug!(author = %op.author, title = %op.title, "Created proposal");
    Ok(())
}

pub(crate) fn apply_proposal_update(
    registry: &EvaluatorRegistry,
    state: &mut ChainState,
    op: &ProposalUpdateOperation,
) -> EvaluationResult<()> {
    state.context_mut().proposal_update_depth += 1;
    let result = update(registry, state, op);
    state.context_mut().proposal_update_depth -= 1;
    result
}

fn check_existing<T: Ord + Display>(to_remove: &BTreeSet<T>, available: &BTreeSet<T>) -> EvaluationResult<()> {
    match to_remove.iter().find(|a| !available.contains(*a)) {
        Some(missing) => Err(EvaluationError::NonExistingApproval(missing.to_string())),
        None => Ok(()),
    }
}

fn check_duplicate<T: Ord + Display>(to_add: &BTreeSet<T>, available: &BTreeSet<T>) -> EvaluationResult<()> {
    match to_add.iter().find(|a| available.contains(*a)) {
        Some(existing) => Err(EvaluationError::AlreadyExistingApproval(existing.to_string())),
        None => Ok(()),
    }
}

fn update(
    registry: &EvaluatorRegistry,
    state: &mut ChainState,
    op: &ProposalUpdateOperation,
) -> EvaluationResult<()> {
    check_depth(state, state.context().proposal_update_depth)?;
    let now = state.head_block_time()?;
    let proposal = state.get_proposal(&op.author, &op.title)?;

    if proposal.is_in_review(now)
        && !(op.active_approvals_to_add.is_empty()
            && op.owner_approvals_to_add.is_empty()
            && op.posting_approvals_to_add.is_empty()
            && op.key_approvals_to_add.is_empty())
    {
        return Err(EvaluationError::ApprovalInReviewPeriod);
    }

    check_existing(&op.active_approvals_to_remove, &proposal.available_active_approvals)?;
    check_existing(&op.owner_approvals_to_remove, &proposal.available_owner_approvals)?;
    check_existing(&op.posting_approvals_to_remove, &proposal.available_posting_approvals)?;
    check_existing(&op.key_approvals_to_remove, &proposal.available_key_approvals)?;

    check_duplicate(&op.active_approvals_to_add, &proposal.available_active_approvals)?;
    check_duplicate(&op.owner_approvals_to_add, &proposal.available_owner_approvals)?;
    check_duplicate(&op.posting_approvals_to_add, &proposal.available_posting_approvals)?;
    check_duplicate(&op.key_approvals_to_add, &proposal.available_key_approvals)?;

    let id = proposal.id;
    state.store_mut().modify(id, |p: &mut Proposal| {
        p.available_active_approvals.extend(op.active_approvals_to_add.iter().cloned());
        p.available_owner_approvals.extend(op.owner_approvals_to_add.iter().cloned());
        p.available_posting_approvals.extend(op.posting_approvals_to_add.iter().cloned());
        p.available_key_approvals.extend(op.key_approvals_to_add.iter().copied());

        p.available_active_approvals.retain(|a| !op.active_approvals_to_remove.contains(a));
        p.available_owner_approvals.retain(|a| !op.owner_approvals_to_remove.contains(a));
        p.available_posting_approvals.retain(|a| !op.posting_approvals_to_remove.contains(a));
        p.available_key_approvals.retain(|k| !op.key_approvals_to_remove.contains(k));
    })?;

    let proposal = state.store().get(id)?;
    if proposal.review_period_time.is_some() {
        // Nothing can be approved any more, so the proposal can never pass.
        if proposal.is_in_review(now) && !proposal.has_available_approvals() {
            remove_proposal(state, id)?;
        }
        return Ok(());
    }

    assert_irrelevant_authority(state, proposal, op)?;

    if is_authorized_to_execute(state, id)? {
        if let Err(e) = execute(registry, state, id) {
            warn!(
                author = %op.author,
                title = %op.title,
                error = %e,
                "Approved proposal failed to apply, will retry when it expires"
            );
        }
    }
    Ok(())
}

/// Reject approvals and keys added by `op` that the proposal's operations
/// can never use.
///
/// Verification stops at the first failing category, so each missing
/// category is seeded with its missing accounts and verification repeats.
/// Keys that counted toward a seeded category are not irrelevant.
fn assert_irrelevant_authority(
    state: &ChainState,
    proposal: &Proposal,
    op: &ProposalUpdateOperation,
) -> EvaluationResult<()> {
    let required = required_authorities(&proposal.operations()?);
    let keys = &proposal.available_key_approvals;
    let added: BTreeSet<&AccountName> = op
        .active_approvals_to_add
        .iter()
        .chain(&op.owner_approvals_to_add)
        .chain(&op.posting_approvals_to_add)
        .collect();

    let mut approvals = Approvals::default();
    let mut used_signatures: BTreeSet<PublicKey> = BTreeSet::new();

    // Active, owner and posting: at most one pass per category.
    for _ in 0..3 {
        let outcome = state.with_authority_getters(|getters| {
            check_authority(&required, keys, getters, MAX_SIG_CHECK_DEPTH, &approvals)
        });
        let (seeded, accounts, used) = match outcome {
            AuthorityCheck::Satisfied => return Ok(()),
            AuthorityCheck::MissingActive {
                ref accounts,
                ref used_signatures,
            } => (&mut approvals.active, accounts.clone(), used_signatures.clone()),
            AuthorityCheck::MissingOwner {
                ref accounts,
                ref used_signatures,
            } => (&mut approvals.owner, accounts.clone(), used_signatures.clone()),
            AuthorityCheck::MissingPosting {
                ref accounts,
                ref used_signatures,
            } => (&mut approvals.posting, accounts.clone(), used_signatures.clone()),
            AuthorityCheck::IrrelevantSignatures { unused } => {
                let irrelevant: BTreeSet<PublicKey> = unused
                    .into_iter()
                    .filter(|k| op.key_approvals_to_add.contains(k) && !used_signatures.contains(k))
                    .collect();
                return if irrelevant.is_empty() {
                    Ok(())
                } else {
                    Err(ProtocolError::IrrelevantSignature(irrelevant).into())
                };
            }
            AuthorityCheck::IrrelevantApprovals { unused } => {
                let irrelevant: BTreeSet<AccountName> =
                    unused.into_iter().filter(|a| added.contains(a)).collect();
                return if irrelevant.is_empty() {
                    Ok(())
                } else {
                    Err(ProtocolError::IrrelevantApproval(irrelevant).into())
                };
            }
            other => return Ok(other.into_result()?),
        };
        if !seeded.is_empty() {
            return Ok(outcome.into_result()?);
        }
        *seeded = accounts;
        used_signatures.extend(used);
    }

    warn!(
        author = %proposal.author,
        title = %proposal.title,
        "Authority check did not settle, accepting approvals"
    );
    Ok(())
}

/// Whether the approvals given so far satisfy every operation.
fn is_authorized_to_execute(state: &ChainState, id: Id<Proposal>) -> EvaluationResult<bool> {
    let proposal = state.store().get(id)?;
    let required = required_authorities(&proposal.operations()?);
    let approvals = Approvals {
        active: proposal.available_active_approvals.clone(),
        owner: proposal.available_owner_approvals.clone(),
        posting: proposal.available_posting_approvals.clone(),
    };
    Ok(state
        .with_authority_getters(|getters| {
            check_authority(
                &required,
                &proposal.available_key_approvals,
                getters,
                MAX_SIG_CHECK_DEPTH,
                &approvals,
            )
        })
        .is_satisfied())
}

/// Apply the proposed operations and drop the proposal, all or nothing.
fn execute(registry: &EvaluatorRegistry, state: &mut ChainState, id: Id<Proposal>) -> EvaluationResult<()> {
    let proposal = state.store().get(id)?;
    let operations = proposal.operations()?;
    let (author, title) = (proposal.author.clone(), proposal.title.clone());

    state.with_session(|s| {
        for op in &operations {
            registry.apply_operation(s, op)?;
        }
        remove_proposal(s, id)
    })?;
    info!(%author, %title, operations = operations.len(), "Executed proposal");
    Ok(())
}

fn remove_proposal(state: &mut ChainState, id: Id<Proposal>) -> EvaluationResult<()> {
    let approvals: Vec<Id<RequiredApproval>> =
        state.required_approvals(id)?.into_iter().map(|r| r.id).collect();
    for approval in approvals {
        state.store_mut().remove(approval)?;
    }
    state.store_mut().remove(id)?;
    Ok(())
}

pub(crate) fn apply_proposal_delete(
    state: &mut ChainState,
    op: &ProposalDeleteOperation,
) -> EvaluationResult<()> {
    let proposal = state.get_proposal(&op.author, &op.title)?;
    let allowed = proposal.author == op.requester
        || proposal.required_active_approvals.contains(&op.requester)
        || proposal.required_owner_approvals.contains(&op.requester)
        || proposal.required_posting_approvals.contains(&op.requester);
    if !allowed {
        return Err(EvaluationError::ProposalDeleteNotAllowed {
            requester: op.requester.clone(),
        });
    }
    let id = proposal.id;
    remove_proposal(state, id)
}

/// Expiration sweep for one proposal: execute it if it is authorized,
/// otherwise (or if execution fails) drop it.
pub(crate) fn execute_or_expire(
    registry: &EvaluatorRegistry,
    state: &mut ChainState,
    id: Id<Proposal>,
) -> EvaluationResult<()> {
    if is_authorized_to_execute(state, id)? {
        match execute(registry, state, id) {
            Ok(()) => return Ok(()),
            Err(e) => {
                let proposal = state.store().get(id)?;
                warn!(
                    author = %proposal.author,
                    title = %proposal.title,
                    error = %e,
                    "Expired proposal failed to apply"
                );
            }
        }
    }
    if state.store().find(id).is_some() {
        let proposal = state.store().get(id)?;
        debug!(author = %proposal.author, title = %proposal.title, "Proposal expired");
        remove_proposal(state, id)?;
    }
    Ok(())
}
