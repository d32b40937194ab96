use super::*;
use crate::ports::CustomOperationInterpreter;
use cc_02_protocol::{
    AccountCreateOperation, AccountWitnessVoteOperation, Authority, CommentOperation,
    CustomJsonOperation, EscrowApproveOperation, EscrowReleaseOperation, EscrowTransferOperation,
    FillOrderOperation, LimitOrderCancelOperation, LimitOrderCreateOperation,
    ProposalCreateOperation, ProposalDeleteOperation, ProposalUpdateOperation,
    RecoverAccountOperation, RequestAccountRecoveryOperation, AccountUpdateOperation,
    Transaction, TransferOperation, TransferToVestingOperation, VoteOperation,
};
use cc_01_ledger_store::StoreConfig;
use cc_03_chain_state::{Comment, GenesisConfig, LimitOrder, RequiredApproval};
use parking_lot::Mutex;
use shared_crypto::{PrivateKey, PublicKey};
use shared_types::{Asset, TimePointSec};
use std::sync::Arc;

const SUPPLY: i64 = 1_000_000;
const SKIP: SkipFlags = SkipFlags::TRANSACTION_SIGNATURES
    .union(SkipFlags::TAPOS_CHECK)
    .union(SkipFlags::TRANSACTION_DUPE_CHECK);

fn name(s: &str) -> AccountName {
    AccountName::new(s)
}

fn key(seed: &str) -> PrivateKey {
    PrivateKey::from_seed(seed).unwrap()
}

fn public(seed: &str) -> PublicKey {
    key(seed).public_key().unwrap()
}

fn create_state() -> ChainState {
    let genesis = GenesisConfig {
        init_supply: SUPPLY,
        init_witness_count: 3,
        ..GenesisConfig::default()
    };
    ChainState::from_genesis(StoreConfig::default(), &genesis).unwrap()
}

fn now(state: &ChainState) -> TimePointSec {
    state.head_block_time().unwrap()
}

fn advance(state: &mut ChainState, seconds: u32) {
    state.modify_dgp(|p| p.time = p.time + seconds).unwrap();
}

/// Apply `ops` the way the block applier does: in a session that is rolled
/// back on error.
fn push(registry: &EvaluatorRegistry, state: &mut ChainState, ops: Vec<Operation>) -> EvaluationResult<()> {
    let mut trx = Transaction::new(ops);
    trx.set_expiration(now(state) + 60);
    let trx = SignedTransaction::from(trx);
    state.with_session(|s| registry.apply_transaction(s, &trx, SKIP))
}

fn signed(state: &ChainState, ops: Vec<Operation>, signer: &str) -> SignedTransaction {
    let mut trx = Transaction::new(ops);
    trx.set_expiration(now(state) + 60);
    let mut trx = SignedTransaction::from(trx);
    trx.sign(&key(signer), state.chain_id()).unwrap();
    trx
}

fn transfer(from: &str, to: &str, amount: i64) -> Operation {
    Operation::Transfer(TransferOperation {
        from: name(from),
        to: name(to),
        amount: Asset::cedar(amount),
        memo: String::new(),
    })
}

fn create_account(registry: &EvaluatorRegistry, state: &mut ChainState, account: &str, funds: i64) {
    let auth = Authority::from_key(public(account));
    let create = Operation::AccountCreate(AccountCreateOperation {
        fee: Asset::cedar(1),
        creator: name("initwitness"),
        new_account_name: name(account),
        owner: auth.clone(),
        active: auth.clone(),
        posting: auth,
        memo_key: public(account),
        json_metadata: String::new(),
    });
    push(registry, state, vec![create, transfer("initwitness", account, funds)]).unwrap();
}

fn balance(state: &ChainState, account: &str) -> Asset {
    state.get_account(&name(account)).unwrap().balance
}

fn setup() -> (EvaluatorRegistry, ChainState) {
    let registry = EvaluatorRegistry::new();
    let mut state = create_state();
    create_account(&registry, &mut state, "alice", 10_000);
    create_account(&registry, &mut state, "bob", 10_000);
    create_account(&registry, &mut state, "carol", 10_000);
    (registry, state)
}

// =============================================================================
// Transactions
// =============================================================================

#[test]
fn test_signed_transfer_applies_once() {
    let registry = EvaluatorRegistry::new();
    let mut state = create_state();
    let trx = signed(&state, vec![transfer("initwitness", "initwitness1", 100)], "initwitness");

    registry.apply_transaction(&mut state, &trx, SkipFlags::NOTHING).unwrap();
    assert_eq!(balance(&state, "initwitness"), Asset::cedar(SUPPLY - 100));
    assert_eq!(balance(&state, "initwitness1"), Asset::cedar(100));
    assert_eq!(state.applied_operations().len(), 1);
    assert!(state.context().current_trx_id.is_none());

    let err = registry
        .apply_transaction(&mut state, &trx, SkipFlags::NOTHING)
        .unwrap_err();
    assert_eq!(err.code(), "tx_duplicate");
    state.validate_invariants().unwrap();
}

#[test]
fn test_unsigned_transaction_rejected() {
    let registry = EvaluatorRegistry::new();
    let mut state = create_state();
    let mut trx = Transaction::new(vec![transfer("initwitness", "initwitness1", 1)]);
    trx.set_expiration(now(&state) + 60);

    let err = registry
        .apply_transaction(&mut state, &SignedTransaction::from(trx), SkipFlags::NOTHING)
        .unwrap_err();
    assert_eq!(err.code(), "tx_missing_active_auth");
}

#[test]
fn test_expiration_and_tapos_checks() {
    let registry = EvaluatorRegistry::new();
    let mut state = create_state();
    let skip = SkipFlags::TRANSACTION_SIGNATURES;

    let mut expired = Transaction::new(vec![transfer("initwitness", "initwitness1", 1)]);
    expired.set_expiration(now(&state));
    let err = registry
        .apply_transaction(&mut state, &SignedTransaction::from(expired), skip)
        .unwrap_err();
    assert!(matches!(err, EvaluationError::TransactionExpired { .. }));

    let mut too_far = Transaction::new(vec![transfer("initwitness", "initwitness1", 2)]);
    too_far.set_expiration(now(&state) + MAX_TIME_UNTIL_EXPIRATION + 1);
    let err = registry
        .apply_transaction(&mut state, &SignedTransaction::from(too_far), skip)
        .unwrap_err();
    assert!(matches!(err, EvaluationError::ExpirationTooFar { .. }));

    let mut wrong_fork = Transaction::new(vec![transfer("initwitness", "initwitness1", 3)]);
    wrong_fork.set_expiration(now(&state) + 60);
    wrong_fork.ref_block_prefix = 7;
    let err = registry
        .apply_transaction(&mut state, &SignedTransaction::from(wrong_fork), skip)
        .unwrap_err();
    assert_eq!(err, EvaluationError::TaposMismatch { ref_block_num: 0 });
}

#[test]
fn test_virtual_operations_cannot_be_applied() {
    let registry = EvaluatorRegistry::new();
    let mut state = create_state();
    let fill = Operation::FillOrder(FillOrderOperation {
        current_owner: name("initwitness"),
        current_orderid: 1,
        current_pays: Asset::cedar(1),
        open_owner: name("initwitness1"),
        open_orderid: 1,
        open_pays: Asset::cbd(1),
    });
    let err = registry.apply_operation(&mut state, &fill).unwrap_err();
    assert_eq!(err.code(), "virtual_operation");
}

#[test]
fn test_validate_transaction_changes_nothing() {
    let registry = EvaluatorRegistry::new();
    let mut state = create_state();
    let trx = signed(&state, vec![transfer("initwitness", "initwitness1", 100)], "initwitness");

    registry
        .validate_transaction(&mut state, &trx, SkipFlags::NOTHING)
        .unwrap();
    assert_eq!(balance(&state, "initwitness1"), Asset::cedar(0));
    assert!(state.applied_operations().is_empty());
    assert!(!state.is_known_transaction(&trx.id().unwrap()).unwrap());
}

#[test]
fn test_failed_operation_rolls_back_transaction() {
    let (registry, mut state) = setup();
    let before = balance(&state, "alice");

    let err = push(
        &registry,
        &mut state,
        vec![transfer("alice", "bob", 100), transfer("alice", "nobody", 1)],
    )
    .unwrap_err();
    assert_eq!(err.code(), "unknown_account");
    assert_eq!(balance(&state, "alice"), before);
}

// =============================================================================
// Custom operations
// =============================================================================

/// Credits `initwitness1` one CEDAR per call, then fails if asked to.
struct Recorder {
    calls: Mutex<Vec<String>>,
}

impl CustomOperationInterpreter for Recorder {
    fn apply(&self, state: &mut ChainState, op: &CustomJsonOperation) -> EvaluationResult<()> {
        self.calls.lock().push(op.json.clone());
        state.adjust_balance(&name("initwitness1"), Asset::cedar(1))?;
        let payload: serde_json::Value = serde_json::from_str(&op.json)
            .map_err(|e| EvaluationError::precondition("CustomJson", e.to_string()))?;
        if payload["fail"].as_bool() == Some(true) {
            return Err(EvaluationError::precondition("CustomJson", "asked to fail"));
        }
        Ok(())
    }
}

fn custom(id: &str, json: &str) -> Operation {
    Operation::CustomJson(CustomJsonOperation {
        required_auths: [name("initwitness")].into(),
        required_posting_auths: Default::default(),
        id: id.to_string(),
        json: json.to_string(),
    })
}

#[test]
fn test_custom_interpreters() {
    let recorder = Arc::new(Recorder {
        calls: Mutex::new(Vec::new()),
    });
    let mut registry = EvaluatorRegistry::new();
    registry.register_custom("follow", recorder.clone()).unwrap();
    let err = registry.register_custom("follow", recorder.clone()).unwrap_err();
    assert!(err.is_logic_error());
    assert_eq!(registry.custom_ids().collect::<Vec<_>>(), vec!["follow"]);

    let mut state = create_state();
    push(&registry, &mut state, vec![custom("unknown", "{}")]).unwrap();
    push(&registry, &mut state, vec![custom("follow", r#"{"fail":false}"#)]).unwrap();
    assert_eq!(balance(&state, "initwitness1"), Asset::cedar(1));

    // A failing interpreter is ignored in received blocks, its writes undone.
    push(&registry, &mut state, vec![custom("follow", r#"{"fail":true}"#)]).unwrap();
    assert_eq!(balance(&state, "initwitness1"), Asset::cedar(1));

    state.context_mut().producing = true;
    let err = registry
        .apply_operation(&mut state, &custom("follow", r#"{"fail":true}"#))
        .unwrap_err();
    assert_eq!(err.code(), "custom_operation_failed");
    assert_eq!(balance(&state, "initwitness1"), Asset::cedar(1));
    assert_eq!(recorder.calls.lock().len(), 3);
}

// =============================================================================
// Proposals
// =============================================================================

fn propose(author: &str, title: &str, ops: Vec<Operation>, lifetime: u32, review: Option<u32>, at: TimePointSec) -> Operation {
    Operation::ProposalCreate(ProposalCreateOperation {
        author: name(author),
        title: title.to_string(),
        memo: String::new(),
        proposed_operations: ops,
        expiration_time: at + lifetime,
        review_period_time: review.map(|r| at + r),
    })
}

fn approve(author: &str, title: &str) -> ProposalUpdateOperation {
    ProposalUpdateOperation {
        author: name(author),
        title: title.to_string(),
        ..Default::default()
    }
}

fn proposal_count(state: &ChainState) -> usize {
    state.store().len::<Proposal>().unwrap()
}

#[test]
fn test_proposal_executes_once_approved() {
    let (registry, mut state) = setup();
    let at = now(&state);
    push(&registry, &mut state, vec![propose("alice", "pay", vec![transfer("bob", "alice", 500)], 3600, None, at)]).unwrap();

    let proposal = state.get_proposal(&name("alice"), "pay").unwrap();
    assert_eq!(proposal.required_active_approvals, [name("bob")].into());
    let id = proposal.id;
    assert_eq!(state.required_approvals(id).unwrap().len(), 1);
    assert_eq!(balance(&state, "bob"), Asset::cedar(10_000));

    let mut update = approve("alice", "pay");
    update.active_approvals_to_add.insert(name("bob"));
    push(&registry, &mut state, vec![Operation::ProposalUpdate(update)]).unwrap();

    assert_eq!(balance(&state, "bob"), Asset::cedar(9_500));
    assert_eq!(balance(&state, "alice"), Asset::cedar(10_500));
    assert_eq!(proposal_count(&state), 0);
    assert_eq!(state.store().len::<RequiredApproval>().unwrap(), 0);
}

#[test]
fn test_proposal_key_approval() {
    let (registry, mut state) = setup();
    let at = now(&state);
    push(&registry, &mut state, vec![propose("alice", "pay", vec![transfer("bob", "alice", 1)], 3600, None, at)]).unwrap();

    let mut unrelated = approve("alice", "pay");
    unrelated.key_approvals_to_add.insert(public("stranger"));
    let err = push(&registry, &mut state, vec![Operation::ProposalUpdate(unrelated)]).unwrap_err();
    assert_eq!(err.code(), "tx_irrelevant_sig");

    let mut bobs_key = approve("alice", "pay");
    bobs_key.key_approvals_to_add.insert(public("bob"));
    push(&registry, &mut state, vec![Operation::ProposalUpdate(bobs_key)]).unwrap();
    assert_eq!(proposal_count(&state), 0);
    assert_eq!(balance(&state, "alice"), Asset::cedar(10_001));
}

#[test]
fn test_proposal_approval_bookkeeping() {
    let (registry, mut state) = setup();
    let at = now(&state);
    push(&registry, &mut state, vec![propose("alice", "pay", vec![transfer("bob", "alice", 1)], 3600, None, at)]).unwrap();

    let mut revoke = approve("alice", "pay");
    revoke.active_approvals_to_remove.insert(name("bob"));
    let err = push(&registry, &mut state, vec![Operation::ProposalUpdate(revoke.clone())]).unwrap_err();
    assert_eq!(err.code(), "non_existing_approval");
    assert!(err.is_logic_error());

    // Not enough on its own: the proposal stays.
    let mut carol = approve("alice", "pay");
    carol.active_approvals_to_add.insert(name("carol"));
    push(&registry, &mut state, vec![Operation::ProposalUpdate(carol.clone())]).unwrap();
    assert_eq!(proposal_count(&state), 1);

    let err = push(&registry, &mut state, vec![Operation::ProposalUpdate(carol)]).unwrap_err();
    assert_eq!(err.code(), "already_existing_approval");
}

#[test]
fn test_proposal_delete_permissions() {
    let (registry, mut state) = setup();
    let at = now(&state);
    push(&registry, &mut state, vec![propose("alice", "pay", vec![transfer("bob", "alice", 1)], 3600, None, at)]).unwrap();

    let delete = |requester: &str| {
        Operation::ProposalDelete(ProposalDeleteOperation {
            author: name("alice"),
            title: "pay".into(),
            requester: name(requester),
        })
    };
    let err = push(&registry, &mut state, vec![delete("carol")]).unwrap_err();
    assert_eq!(err.code(), "proposal_delete_not_allowed");

    push(&registry, &mut state, vec![delete("bob")]).unwrap();
    assert_eq!(proposal_count(&state), 0);
    assert_eq!(state.store().len::<RequiredApproval>().unwrap(), 0);
}

#[test]
fn test_proposal_create_checks() {
    let (registry, mut state) = setup();
    let at = now(&state);

    let expired = propose("alice", "late", vec![transfer("bob", "alice", 1)], 0, None, at);
    assert_eq!(push(&registry, &mut state, vec![expired]).unwrap_err().code(), "precondition_failed");

    let review_after_expiry = propose("alice", "odd", vec![transfer("bob", "alice", 1)], 100, Some(200), at);
    assert!(push(&registry, &mut state, vec![review_after_expiry]).is_err());

    // The proposed operations are dry-run against the current state.
    let overdraft = propose("alice", "big", vec![transfer("bob", "alice", 1_000_000)], 3600, None, at);
    assert_eq!(push(&registry, &mut state, vec![overdraft]).unwrap_err().code(), "insufficient_funds");

    let ok = propose("alice", "pay", vec![transfer("bob", "alice", 1)], 3600, None, at);
    push(&registry, &mut state, vec![ok.clone()]).unwrap();
    assert_eq!(push(&registry, &mut state, vec![ok]).unwrap_err().code(), "object_already_exists");
    assert_eq!(balance(&state, "bob"), Asset::cedar(10_000));
}

#[test]
fn test_proposal_with_review_period_executes_at_expiry() {
    let (registry, mut state) = setup();
    let at = now(&state);
    push(&registry, &mut state, vec![propose("alice", "pay", vec![transfer("bob", "alice", 10)], 600, Some(300), at)]).unwrap();

    let mut update = approve("alice", "pay");
    update.active_approvals_to_add.insert(name("bob"));
    push(&registry, &mut state, vec![Operation::ProposalUpdate(update)]).unwrap();
    assert_eq!(proposal_count(&state), 1);
    assert_eq!(balance(&state, "alice"), Asset::cedar(10_000));

    advance(&mut state, 300);
    let mut late = approve("alice", "pay");
    late.active_approvals_to_add.insert(name("carol"));
    let err = push(&registry, &mut state, vec![Operation::ProposalUpdate(late)]).unwrap_err();
    assert_eq!(err, EvaluationError::ApprovalInReviewPeriod);

    advance(&mut state, 300);
    assert_eq!(registry.clear_expired_proposals(&mut state).unwrap(), 1);
    assert_eq!(proposal_count(&state), 0);
    assert_eq!(balance(&state, "alice"), Asset::cedar(10_010));
}

#[test]
fn test_unapproved_proposal_expires() {
    let (registry, mut state) = setup();
    let at = now(&state);
    push(&registry, &mut state, vec![propose("alice", "pay", vec![transfer("bob", "alice", 10)], 600, None, at)]).unwrap();

    advance(&mut state, 599);
    assert_eq!(registry.clear_expired_proposals(&mut state).unwrap(), 0);
    advance(&mut state, 1);
    assert_eq!(registry.clear_expired_proposals(&mut state).unwrap(), 1);
    assert_eq!(proposal_count(&state), 0);
    assert_eq!(state.store().len::<RequiredApproval>().unwrap(), 0);
    assert_eq!(balance(&state, "alice"), Asset::cedar(10_000));
}

#[test]
fn test_failed_execution_keeps_proposal() {
    let (registry, mut state) = setup();
    let at = now(&state);
    push(&registry, &mut state, vec![propose("alice", "pay", vec![transfer("bob", "alice", 10_000)], 600, None, at)]).unwrap();
    push(&registry, &mut state, vec![transfer("bob", "carol", 1)]).unwrap();

    let mut update = approve("alice", "pay");
    update.active_approvals_to_add.insert(name("bob"));
    push(&registry, &mut state, vec![Operation::ProposalUpdate(update)]).unwrap();

    assert_eq!(proposal_count(&state), 1);
    assert_eq!(balance(&state, "bob"), Asset::cedar(9_999));
}

#[test]
fn test_nested_proposal_depth_limited_while_producing() {
    let (registry, mut state) = setup();
    let at = now(&state);
    let inner = propose("bob", "inner", vec![transfer("carol", "bob", 1)], 600, None, at);
    let middle = propose("carol", "middle", vec![inner], 600, None, at);
    let outer = propose("alice", "outer", vec![middle], 600, None, at);

    push(&registry, &mut state, vec![outer.clone()]).unwrap();
    assert_eq!(proposal_count(&state), 1);

    state.context_mut().producing = true;
    state.modify_dgp(|p| p.max_virtual_bandwidth = 1 << 80).unwrap();
    let outer = match outer {
        Operation::ProposalCreate(mut op) => {
            op.title = "outer2".into();
            Operation::ProposalCreate(op)
        }
        _ => unreachable!(),
    };
    let err = registry.apply_operation(&mut state, &outer).unwrap_err();
    assert_eq!(err.code(), "proposal_depth_too_high");
    assert_eq!(state.context().proposal_create_depth, 0);
}

// =============================================================================
// Market
// =============================================================================

fn order(owner: &str, orderid: u32, sell: Asset, receive: Asset, expiration: TimePointSec) -> Operation {
    Operation::LimitOrderCreate(LimitOrderCreateOperation {
        owner: name(owner),
        orderid,
        amount_to_sell: sell,
        min_to_receive: receive,
        fill_or_kill: false,
        expiration,
    })
}

fn give_cbd(state: &mut ChainState, account: &str, amount: i64) {
    state
        .modify_account(&name(account), |a| a.cbd_balance = Asset::cbd(amount))
        .unwrap();
}

#[test]
fn test_orders_match_at_maker_price() {
    let (registry, mut state) = setup();
    give_cbd(&mut state, "bob", 1_000);
    let expiration = now(&state) + 3600;

    push(&registry, &mut state, vec![order("alice", 1, Asset::cedar(100), Asset::cbd(50), expiration)]).unwrap();
    assert_eq!(balance(&state, "alice"), Asset::cedar(9_900));

    // Half the maker's order.
    push(&registry, &mut state, vec![order("bob", 7, Asset::cbd(25), Asset::cedar(40), expiration)]).unwrap();
    assert_eq!(balance(&state, "bob"), Asset::cedar(10_050));
    assert_eq!(state.get_account(&name("alice")).unwrap().cbd_balance, Asset::cbd(25));
    let resting: Vec<&LimitOrder> = state.store().iter::<LimitOrder>().unwrap().collect();
    assert_eq!(resting.len(), 1);
    assert_eq!(resting[0].for_sale, 50);

    let fills: Vec<_> = state
        .applied_operations()
        .iter()
        .filter(|n| matches!(n.op, Operation::FillOrder(_)))
        .collect();
    assert_eq!(fills.len(), 1);

    push(
        &registry,
        &mut state,
        vec![Operation::LimitOrderCancel(LimitOrderCancelOperation {
            owner: name("alice"),
            orderid: 1,
        })],
    )
    .unwrap();
    assert_eq!(balance(&state, "alice"), Asset::cedar(9_950));
    assert_eq!(state.store().len::<LimitOrder>().unwrap(), 0);
}

#[test]
fn test_fill_or_kill_and_expiry() {
    let (registry, mut state) = setup();
    let expiration = now(&state) + 60;

    let mut kill = order("alice", 1, Asset::cedar(100), Asset::cbd(50), expiration);
    if let Operation::LimitOrderCreate(op) = &mut kill {
        op.fill_or_kill = true;
    }
    assert!(push(&registry, &mut state, vec![kill]).is_err());
    assert_eq!(balance(&state, "alice"), Asset::cedar(10_000));

    push(&registry, &mut state, vec![order("alice", 2, Asset::cedar(100), Asset::cbd(50), expiration)]).unwrap();
    advance(&mut state, 61);
    assert_eq!(registry.clear_expired_orders(&mut state).unwrap(), 1);
    assert_eq!(balance(&state, "alice"), Asset::cedar(10_000));
}

// =============================================================================
// Escrow, recovery, content, witnesses
// =============================================================================

#[test]
fn test_escrow_lifecycle() {
    let (registry, mut state) = setup();
    let at = now(&state);
    let escrow = Operation::EscrowTransfer(EscrowTransferOperation {
        from: name("alice"),
        to: name("bob"),
        agent: name("carol"),
        escrow_id: 1,
        cbd_amount: Asset::cbd(0),
        cedar_amount: Asset::cedar(1_000),
        fee: Asset::cedar(10),
        ratification_deadline: at + 100,
        escrow_expiration: at + 1_000,
        json_meta: String::new(),
    });
    push(&registry, &mut state, vec![escrow]).unwrap();
    assert_eq!(balance(&state, "alice"), Asset::cedar(8_990));

    let approve = |who: &str| {
        Operation::EscrowApprove(EscrowApproveOperation {
            from: name("alice"),
            to: name("bob"),
            agent: name("carol"),
            who: name(who),
            escrow_id: 1,
            approve: true,
        })
    };
    push(&registry, &mut state, vec![approve("bob")]).unwrap();
    assert!(push(&registry, &mut state, vec![approve("bob")]).is_err());
    push(&registry, &mut state, vec![approve("carol")]).unwrap();
    assert_eq!(balance(&state, "carol"), Asset::cedar(10_010));

    let release = |who: &str, receiver: &str, amount: i64| {
        Operation::EscrowRelease(EscrowReleaseOperation {
            from: name("alice"),
            to: name("bob"),
            agent: name("carol"),
            who: name(who),
            receiver: name(receiver),
            escrow_id: 1,
            cbd_amount: Asset::cbd(0),
            cedar_amount: Asset::cedar(amount),
        })
    };
    // Before expiration the sender can only release to the receiver.
    assert!(push(&registry, &mut state, vec![release("alice", "alice", 100)]).is_err());
    push(&registry, &mut state, vec![release("alice", "bob", 400)]).unwrap();
    push(&registry, &mut state, vec![release("bob", "alice", 600)]).unwrap();
    assert_eq!(balance(&state, "bob"), Asset::cedar(10_400));
    assert_eq!(balance(&state, "alice"), Asset::cedar(9_590));
    assert_eq!(state.store().len::<cc_03_chain_state::Escrow>().unwrap(), 0);
    state.validate_invariants().unwrap();
}

#[test]
fn test_account_recovery() {
    let (registry, mut state) = setup();
    let original = state.get_account_authority(&name("alice")).unwrap().owner.clone();

    // The account is taken over: its owner key changes.
    let stolen = Authority::from_key(public("thief"));
    push(
        &registry,
        &mut state,
        vec![Operation::AccountUpdate(AccountUpdateOperation {
            account: name("alice"),
            owner: Some(stolen.clone()),
            active: Some(stolen.clone()),
            posting: None,
            memo_key: None,
            json_metadata: String::new(),
        })],
    )
    .unwrap();

    let fresh = Authority::from_key(public("alice-new"));
    let request = |recovery: &str| {
        Operation::RequestAccountRecovery(RequestAccountRecoveryOperation {
            recovery_account: name(recovery),
            account_to_recover: name("alice"),
            new_owner_authority: fresh.clone(),
        })
    };
    assert!(push(&registry, &mut state, vec![request("bob")]).is_err());
    push(&registry, &mut state, vec![request("initwitness")]).unwrap();

    let recover = |recent: Authority| {
        Operation::RecoverAccount(RecoverAccountOperation {
            account_to_recover: name("alice"),
            new_owner_authority: fresh.clone(),
            recent_owner_authority: recent,
        })
    };
    let err = push(&registry, &mut state, vec![recover(Authority::from_key(public("carol")))]).unwrap_err();
    assert_eq!(err.code(), "precondition_failed");

    push(&registry, &mut state, vec![recover(original)]).unwrap();
    assert_eq!(state.get_account_authority(&name("alice")).unwrap().owner, fresh);
    assert_eq!(
        state.store().len::<cc_03_chain_state::AccountRecoveryRequest>().unwrap(),
        0
    );
}

#[test]
fn test_comment_and_vote() {
    let (registry, mut state) = setup();
    push(
        &registry,
        &mut state,
        vec![Operation::TransferToVesting(TransferToVestingOperation {
            from: name("bob"),
            to: name("bob"),
            amount: Asset::cedar(1_000),
        })],
    )
    .unwrap();

    let post = |author: &str, permlink: &str, parent: Option<(&str, &str)>| {
        let (parent_author, parent_permlink) = parent.unwrap_or(("", "blog"));
        Operation::Comment(CommentOperation {
            parent_author: name(parent_author),
            parent_permlink: parent_permlink.to_string(),
            author: name(author),
            permlink: permlink.to_string(),
            title: "t".into(),
            body: "b".into(),
            json_metadata: String::new(),
        })
    };
    push(&registry, &mut state, vec![post("alice", "hello", None)]).unwrap();
    push(&registry, &mut state, vec![post("bob", "re-hello", Some(("alice", "hello")))]).unwrap();
    let root = state.get_comment(&name("alice"), "hello").unwrap();
    assert_eq!(root.children, 1);
    let reply: &Comment = state.get_comment(&name("bob"), "re-hello").unwrap();
    assert_eq!(reply.depth, 1);
    assert_eq!(reply.root_comment, root.id);

    // Root posts are rate limited.
    assert!(push(&registry, &mut state, vec![post("alice", "again", None)]).is_err());

    advance(&mut state, 60);
    let vote = Operation::Vote(VoteOperation {
        voter: name("bob"),
        author: name("alice"),
        permlink: "hello".into(),
        weight: 10_000,
    });
    push(&registry, &mut state, vec![vote.clone()]).unwrap();

    let comment = state.get_comment(&name("alice"), "hello").unwrap();
    assert!(comment.net_rshares > 0);
    assert_eq!(comment.net_votes, 1);
    assert!(comment.total_vote_weight > 0);
    assert!(state.dgp().unwrap().total_reward_shares2 > 0);
    assert!(state.get_account(&name("bob")).unwrap().voting_power < 10_000);
    assert!(push(&registry, &mut state, vec![vote]).is_err());
}

#[test]
fn test_witness_votes_follow_vesting() {
    let (registry, mut state) = setup();
    let vote = |approve: bool| {
        Operation::AccountWitnessVote(AccountWitnessVoteOperation {
            account: name("alice"),
            witness: name("initwitness1"),
            approve,
        })
    };
    let before = state.get_witness(&name("initwitness1")).unwrap().votes;
    let vesting = state.get_account(&name("alice")).unwrap().vesting_shares.amount;

    push(&registry, &mut state, vec![vote(true)]).unwrap();
    assert_eq!(state.get_witness(&name("initwitness1")).unwrap().votes, before + vesting);
    assert!(push(&registry, &mut state, vec![vote(true)]).is_err());

    push(&registry, &mut state, vec![vote(false)]).unwrap();
    assert_eq!(state.get_witness(&name("initwitness1")).unwrap().votes, before);
    assert_eq!(state.get_account(&name("alice")).unwrap().witnesses_voted_for, 0);
    state.validate_invariants().unwrap();
}
