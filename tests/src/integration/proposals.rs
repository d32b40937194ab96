//! # Proposals Through Signed Transactions
//!
//! Approvals arrive as ordinary transactions, so each one is checked
//! against the signer's authority before the proposal sees it.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use cc_02_protocol::{
        AccountUpdateOperation, Authority, Operation, ProposalCreateOperation,
        ProposalUpdateOperation,
    };
    use cc_03_chain_state::{RequiredApproval, SkipFlags};
    use cc_08_chain_database::{ChainDatabase, ChainResult};

    const TITLE: &str = "rotate-bob";

    fn setup() -> ChainDatabase {
        let mut db = open();
        with_accounts(&mut db, &["alice", "bob", "carol"], 10_000);
        db
    }

    fn push(db: &mut ChainDatabase, ops: Vec<Operation>, signers: &[&str]) -> ChainResult<()> {
        let trx = sign(db, ops, signers);
        db.push_transaction(&trx, SkipFlags::NOTHING)
    }

    fn propose(db: &mut ChainDatabase, ops: Vec<Operation>, lifetime: u32, review: Option<u32>) {
        let now = db.state().head_block_time().unwrap();
        let op = Operation::ProposalCreate(ProposalCreateOperation {
            author: name("alice"),
            title: TITLE.into(),
            memo: String::new(),
            proposed_operations: ops,
            expiration_time: now + lifetime,
            review_period_time: review.map(|r| now + r),
        });
        push(db, vec![op], &["alice"]).unwrap();
        produce(db);
    }

    fn rotate_owner() -> Operation {
        Operation::AccountUpdate(AccountUpdateOperation {
            account: name("bob"),
            owner: Some(Authority::from_key(public("bob2"))),
            active: None,
            posting: None,
            memo_key: None,
            json_metadata: String::new(),
        })
    }

    fn update() -> ProposalUpdateOperation {
        ProposalUpdateOperation {
            author: name("alice"),
            title: TITLE.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_owner_approval_executes_proposal() {
        let mut db = setup();
        propose(&mut db, vec![rotate_owner()], 3600, None);

        let proposal = db.state().get_proposal(&name("alice"), TITLE).unwrap();
        assert_eq!(proposal.required_owner_approvals, [name("bob")].into());
        assert!(proposal.required_active_approvals.is_empty());
        let records = db.state().required_approvals(proposal.id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].account, name("bob"));

        let mut approve = update();
        approve.owner_approvals_to_add.insert(name("bob"));
        push(&mut db, vec![Operation::ProposalUpdate(approve)], &["bob"]).unwrap();
        produce(&mut db);

        let state = db.state();
        assert!(state.find_proposal(&name("alice"), TITLE).unwrap().is_none());
        let err = state.get_proposal(&name("alice"), TITLE).unwrap_err();
        assert_eq!(err.code(), "object_not_found");
        assert_eq!(state.store().len::<RequiredApproval>().unwrap(), 0);
        assert_eq!(
            state.get_account_authority(&name("bob")).unwrap().owner,
            Authority::from_key(public("bob2"))
        );
        state.validate_invariants().unwrap();
    }

    #[test]
    fn test_irrelevant_key_approval_rejected() {
        let mut db = setup();
        propose(&mut db, vec![rotate_owner()], 3600, None);

        let mut stranger = update();
        stranger.key_approvals_to_add.insert(public("stranger"));
        let err = push(&mut db, vec![Operation::ProposalUpdate(stranger)], &["stranger"]).unwrap_err();
        assert_eq!(err.code(), "tx_irrelevant_sig");

        assert!(db.pending_transactions().is_empty());
        let proposal = db.state().get_proposal(&name("alice"), TITLE).unwrap();
        assert!(!proposal.has_available_approvals());
    }

    #[test]
    fn test_approval_bookkeeping() {
        let mut db = setup();
        propose(&mut db, vec![transfer("bob", "alice", 500), transfer("carol", "alice", 500)], 3600, None);

        let mut revoke = update();
        revoke.active_approvals_to_remove.insert(name("bob"));
        let err = push(&mut db, vec![Operation::ProposalUpdate(revoke)], &["bob"]).unwrap_err();
        assert_eq!(err.code(), "non_existing_approval");

        // One of two approvals: nothing executes yet.
        let mut carol = update();
        carol.active_approvals_to_add.insert(name("carol"));
        push(&mut db, vec![Operation::ProposalUpdate(carol.clone())], &["carol"]).unwrap();
        produce(&mut db);
        assert_eq!(balance(&db, "alice").amount, 10_000);
        let proposal = db.state().get_proposal(&name("alice"), TITLE).unwrap();
        assert_eq!(proposal.available_active_approvals, [name("carol")].into());

        let err = push(&mut db, vec![Operation::ProposalUpdate(carol)], &["carol"]).unwrap_err();
        assert_eq!(err.code(), "already_existing_approval");

        let mut bob = update();
        bob.active_approvals_to_add.insert(name("bob"));
        push(&mut db, vec![Operation::ProposalUpdate(bob)], &["bob"]).unwrap();
        produce(&mut db);
        assert_eq!(balance(&db, "alice").amount, 11_000);
        assert_eq!(balance(&db, "bob").amount, 9_500);
        assert_eq!(balance(&db, "carol").amount, 9_500);
        assert!(db.state().find_proposal(&name("alice"), TITLE).unwrap().is_none());
    }

    #[test]
    fn test_reviewed_proposal_executes_at_expiration() {
        let mut db = setup();
        propose(&mut db, vec![transfer("bob", "alice", 250)], 60, Some(30));

        let mut bob = update();
        bob.active_approvals_to_add.insert(name("bob"));
        push(&mut db, vec![Operation::ProposalUpdate(bob)], &["bob"]).unwrap();
        produce(&mut db);

        // Approved, but the review period holds it until expiration.
        assert_eq!(balance(&db, "bob").amount, 10_000);
        assert!(db.state().find_proposal(&name("alice"), TITLE).unwrap().is_some());

        produce_from(&mut db, 30).unwrap();
        assert_eq!(balance(&db, "bob").amount, 9_750);
        assert_eq!(balance(&db, "alice").amount, 10_250);
        assert!(db.state().find_proposal(&name("alice"), TITLE).unwrap().is_none());
        assert_eq!(db.state().store().len::<RequiredApproval>().unwrap(), 0);
    }
}
