//! # Branch Switching
//!
//! A node that first follows one branch and then switches to a longer one
//! must end up exactly where a node that only ever saw the longer branch is.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use cc_02_protocol::SignedBlock;
    use cc_03_chain_state::SkipFlags;
    use cc_08_chain_database::ChainDatabase;

    fn push_all(db: &mut ChainDatabase, blocks: &[SignedBlock]) -> Vec<bool> {
        blocks
            .iter()
            .map(|block| db.push_block(block, SkipFlags::NOTHING).unwrap())
            .collect()
    }

    /// Branch X is blocks 1..=10, branch Y shares 1..=8 and continues with
    /// 9', 10', 11'. Y's blocks carry transfers that X never saw.
    fn branches() -> (Vec<SignedBlock>, Vec<SignedBlock>) {
        let mut x = open();
        let mut y = open();
        let mut shared = vec![with_accounts(&mut x, &["alice", "bob"], 10_000)];
        for _ in 1..8 {
            shared.push(produce(&mut x));
        }
        push_all(&mut y, &shared);

        let mut x_blocks = shared.clone();
        x_blocks.push(produce(&mut x));
        x_blocks.push(produce(&mut x));

        let mut y_blocks = shared;
        for amount in [100, 200, 300] {
            let trx = sign(&y, vec![transfer("alice", "bob", amount)], &["alice"]);
            y.push_transaction(&trx, SkipFlags::NOTHING).unwrap();
            y_blocks.push(produce_late(&mut y));
        }
        (x_blocks, y_blocks)
    }

    #[test]
    fn test_reorg_matches_direct_application() {
        let (x_blocks, y_blocks) = branches();
        assert_eq!(x_blocks.len(), 10);
        assert_eq!(y_blocks.len(), 11);
        assert_eq!(x_blocks[7], y_blocks[7]);
        assert_ne!(x_blocks[8], y_blocks[8]);

        let mut direct = open();
        push_all(&mut direct, &y_blocks);

        let mut reorged = open();
        push_all(&mut reorged, &x_blocks);
        assert_eq!(reorged.head_block_id().unwrap(), x_blocks[9].id().unwrap());

        // 9' and 10' do not outgrow X; 11' does.
        let switched = push_all(&mut reorged, &y_blocks[8..]);
        assert_eq!(switched, vec![false, false, true]);

        assert_eq!(reorged.head_block_id().unwrap(), y_blocks[10].id().unwrap());
        assert_eq!(reorged.head_block_num().unwrap(), 11);
        assert!(reorged.pending_transactions().is_empty());
        assert_eq!(snapshot(&reorged), snapshot(&direct));
        assert_eq!(balance(&reorged, "bob").amount, 10_600);
        for block in &y_blocks {
            assert_eq!(
                reorged.get_block_id_for_num(block.block_num()).unwrap(),
                block.id().unwrap()
            );
        }
        reorged.state().validate_invariants().unwrap();
    }

    #[test]
    fn test_equal_height_keeps_first_seen_head() {
        let (x_blocks, y_blocks) = branches();
        let mut node = open();
        push_all(&mut node, &y_blocks[..10]);

        // X reaches height 10 second: the Y head stays.
        assert_eq!(push_all(&mut node, &x_blocks[8..]), vec![false, false]);
        assert_eq!(node.head_block_id().unwrap(), y_blocks[9].id().unwrap());

        let ids = node.get_block_ids_on_fork(&x_blocks[9].id().unwrap()).unwrap();
        assert_eq!(
            ids,
            vec![
                x_blocks[9].id().unwrap(),
                x_blocks[8].id().unwrap(),
                x_blocks[7].id().unwrap()
            ]
        );

        assert!(!node.push_block(&y_blocks[10], SkipFlags::NOTHING).unwrap());
        assert_eq!(node.head_block_id().unwrap(), y_blocks[10].id().unwrap());
    }

    #[test]
    fn test_pop_blocks_then_reapply() {
        let (_, y_blocks) = branches();
        let mut node = open();
        push_all(&mut node, &y_blocks);
        let tip = snapshot(&node);

        for _ in 0..3 {
            node.pop_block().unwrap();
        }
        assert_eq!(node.head_block_id().unwrap(), y_blocks[7].id().unwrap());
        // Transactions referencing a popped block fail TaPoS and are dropped.
        assert_eq!(node.pending_transactions(), &y_blocks[8].transactions[..]);
        assert_eq!(balance(&node, "bob").amount, 10_100);

        node.clear_pending().unwrap();
        assert_eq!(balance(&node, "bob").amount, 10_000);
        push_all(&mut node, &y_blocks[8..]);
        assert_eq!(snapshot(&node), tip);
    }
}
