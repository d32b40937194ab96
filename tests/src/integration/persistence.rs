//! # Block Log Persistence
//!
//! A single init witness makes every block irreversible on arrival, so
//! everything produced lands in the block log.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use cc_03_chain_state::SkipFlags;
    use cc_08_chain_database::{Chain, ChainConfig, ChainDatabase};
    use std::path::Path;
    use std::sync::Arc;
    use std::thread;

    fn logged(dir: &Path) -> ChainConfig {
        config(1).with_data_dir(dir)
    }

    fn busy_chain(db: &mut ChainDatabase) {
        with_accounts(db, &["alice", "bob"], 10_000);
        for amount in [10, 20, 30] {
            let trx = sign(db, vec![transfer("alice", "bob", amount)], &["alice"]);
            db.push_transaction(&trx, SkipFlags::NOTHING).unwrap();
            produce(db);
        }
    }

    #[test]
    fn test_restart_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = ChainDatabase::open(logged(dir.path())).unwrap();
        busy_chain(&mut db);
        let before = snapshot(&db);
        let head = db.head_block_num().unwrap();
        assert_eq!(db.block_log().head_block_num(), head);
        db.close().unwrap();

        let mut db = ChainDatabase::open(logged(dir.path())).unwrap();
        assert_eq!(snapshot(&db), before);
        assert_eq!(balance(&db, "bob").amount, 10_060);
        db.state().validate_invariants().unwrap();

        // The restarted node keeps producing on top of the replayed head.
        let trx = sign(&db, vec![transfer("bob", "alice", 60)], &["bob"]);
        db.push_transaction(&trx, SkipFlags::NOTHING).unwrap();
        let next = produce(&mut db);
        assert_eq!(next.block_num(), head + 1);
        assert_eq!(balance(&db, "bob").amount, 10_000);
    }

    #[test]
    fn test_reversible_blocks_lost_on_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(3).with_data_dir(dir.path());
        let mut db = ChainDatabase::open(config.clone()).unwrap();
        for _ in 0..3 {
            produce(&mut db);
        }
        assert_eq!(db.state().last_irreversible_block_num().unwrap(), 0);
        db.close().unwrap();

        let db = ChainDatabase::open(config).unwrap();
        assert_eq!(db.head_block_num().unwrap(), 0);
        assert_eq!(snapshot(&db), snapshot(&open()));
    }

    #[test]
    fn test_reindex_matches_replay() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = ChainDatabase::open(logged(dir.path())).unwrap();
        busy_chain(&mut db);
        let before = snapshot(&db);
        db.close().unwrap();

        for from in [0, 3] {
            let db = ChainDatabase::reindex(logged(dir.path()), from).unwrap();
            assert_eq!(snapshot(&db), before);
            db.close().unwrap();
        }
    }

    #[test]
    fn test_shared_chain_handle() {
        let dir = tempfile::tempdir().unwrap();
        let chain = Arc::new(Chain::open(logged(dir.path())).unwrap());
        chain.with_write_lock(|db| busy_chain(db));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let chain = chain.clone();
                thread::spawn(move || chain.with_read_lock(|db| balance(db, "bob").amount))
            })
            .collect();
        for reader in readers {
            assert_eq!(reader.join().unwrap(), 10_060);
        }

        let trx = chain.with_read_lock(|db| sign(db, vec![transfer("alice", "bob", 40)], &["alice"]));
        chain.push_transaction(&trx, SkipFlags::NOTHING).unwrap();
        let block = chain.with_write_lock(produce);
        assert_eq!(block.transactions, vec![trx]);

        let head = chain.with_read_lock(|db| db.head_block_id().unwrap());
        let chain = Arc::try_unwrap(chain).ok().unwrap();
        chain.close().unwrap();

        let db = ChainDatabase::open(logged(dir.path())).unwrap();
        assert_eq!(db.head_block_id().unwrap(), head);
        assert_eq!(balance(&db, "bob").amount, 10_100);
    }
}
