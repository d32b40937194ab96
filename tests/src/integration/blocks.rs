//! # Block Acceptance
//!
//! Duplicate delivery and competing blocks at the same height.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use cc_03_chain_state::{ChainState, SkipFlags};
    use cc_02_protocol::SignedBlock;
    use cc_05_consensus_params::get_slot_time;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_same_block_twice_is_noop() {
        let mut producer = open();
        with_accounts(&mut producer, &["alice"], 10_000);
        let trx = sign(&producer, vec![transfer("alice", "initwitness", 100)], &["alice"]);
        producer.push_transaction(&trx, SkipFlags::NOTHING).unwrap();
        let block = produce(&mut producer);

        let mut node = open();
        for number in 1..=block.block_num() {
            let block = producer.fetch_block_by_number(number).unwrap().unwrap();
            node.push_block(&block, SkipFlags::NOTHING).unwrap();
        }
        let applied = Arc::new(Mutex::new(0));
        let counter = applied.clone();
        node.state()
            .notifications()
            .applied_block
            .subscribe(move |_: &ChainState, _: &SignedBlock| {
                *counter.lock() += 1;
                Ok(())
            });
        let before = snapshot(&node);

        assert!(!node.push_block(&block, SkipFlags::NOTHING).unwrap());
        assert_eq!(snapshot(&node), before);
        assert_eq!(*applied.lock(), 0);
        assert_eq!(balance(&node, "alice"), balance(&producer, "alice"));
        assert_eq!(snapshot(&node), snapshot(&producer));
    }

    /// Two producers build on the same head in different slots, one block
    /// with a transaction and one without. The first seen stays head until
    /// the other branch grows.
    #[test]
    fn test_competing_blocks_at_same_height() {
        let mut a = open();
        let mut b = open();
        let mut node = open();
        for _ in 0..3 {
            let block = produce(&mut a);
            b.push_block(&block, SkipFlags::NOTHING).unwrap();
            node.push_block(&block, SkipFlags::NOTHING).unwrap();
        }
        let height = a.head_block_num().unwrap() + 1;

        let trx = sign(&a, vec![transfer("initwitness", "initwitness2", 500)], &["initwitness"]);
        a.push_transaction(&trx, SkipFlags::NOTHING).unwrap();
        let with_trx = produce(&mut a);
        let without_trx = produce_late(&mut b);
        assert_eq!(with_trx.transactions.len(), 1);
        assert!(without_trx.transactions.is_empty());
        assert_ne!(with_trx.id().unwrap(), without_trx.id().unwrap());

        assert!(!node.push_block(&with_trx, SkipFlags::NOTHING).unwrap());
        assert!(!node.push_block(&without_trx, SkipFlags::NOTHING).unwrap());
        let dgp = node.state().dgp().unwrap();
        assert_eq!(dgp.head_block_number, height);
        assert_eq!(dgp.head_block_id, with_trx.id().unwrap());
        assert_eq!(balance(&node, "initwitness2"), balance(&a, "initwitness2"));

        // The other branch grows and wins; the transaction goes back to
        // the pending pool.
        let next = produce(&mut b);
        assert!(node.push_block(&next, SkipFlags::NOTHING).unwrap());
        assert_eq!(node.head_block_id().unwrap(), next.id().unwrap());
        assert_eq!(node.get_block_id_for_num(height).unwrap(), without_trx.id().unwrap());
        assert_eq!(node.pending_transactions(), &[trx]);

        node.clear_pending().unwrap();
        assert_eq!(snapshot(&node), snapshot(&b));
    }

    #[test]
    fn test_out_of_order_blocks() {
        let mut a = open();
        let mut node = open();
        let blocks: Vec<SignedBlock> = (0..3).map(|_| produce(&mut a)).collect();

        // Nothing is buffered yet to park the block against.
        let err = node.push_block(&blocks[1], SkipFlags::NOTHING).unwrap_err();
        assert_eq!(err.code(), "unlinkable_block");
        assert_eq!(node.head_block_num().unwrap(), 0);

        node.push_block(&blocks[0], SkipFlags::NOTHING).unwrap();
        assert!(!node.push_block(&blocks[2], SkipFlags::NOTHING).unwrap());
        assert_eq!(node.head_block_num().unwrap(), 1);
        assert!(node.is_known_block(&blocks[2].id().unwrap()).unwrap());

        // The missing parent links the parked block behind it.
        assert!(!node.push_block(&blocks[1], SkipFlags::NOTHING).unwrap());
        assert_eq!(node.head_block_id().unwrap(), blocks[2].id().unwrap());
        assert_eq!(snapshot(&node), snapshot(&a));
    }

    /// A block signed by a witness the schedule did not pick for its slot
    /// is refused by every receiver, even when its producer skipped the
    /// check.
    #[test]
    fn test_block_from_unscheduled_witness_rejected() {
        let mut a = open();
        let mut node = open();
        let (slot, scheduled) = online_slot(&a, 1).unwrap();
        let intruder = ["initwitness", "initwitness1"]
            .into_iter()
            .map(name)
            .find(|w| *w != scheduled)
            .unwrap();

        let err = produce_as(&mut a, &intruder, slot).unwrap_err();
        assert_eq!(err.code(), "wrong_witness");
        assert_eq!(a.head_block_num().unwrap(), 0);

        let when = get_slot_time(a.state(), slot).unwrap();
        let forged = a
            .generate_block(when, &intruder, &key(INIT_WITNESS), SkipFlags::WITNESS_SCHEDULE_CHECK)
            .unwrap();
        let err = node.push_block(&forged, SkipFlags::NOTHING).unwrap_err();
        assert_eq!(err.code(), "wrong_witness");
        assert_eq!(node.head_block_num().unwrap(), 0);
        assert!(!node.is_known_block(&forged.id().unwrap()).unwrap());

        // The scheduled witness in the same slot is accepted.
        let mut honest = open();
        let block = produce_as(&mut honest, &scheduled, slot).unwrap();
        assert!(!node.push_block(&block, SkipFlags::NOTHING).unwrap());
        assert_eq!(node.head_block_id().unwrap(), block.id().unwrap());
    }
}
