//! # Cedar-Chain Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | chain-push-block | Full validation of received blocks, signatures included |
//! | chain-generate-block | Packing the pending pool into a signed block |
//! | ledger-session | Applying transfers in a session and rolling it back |

use cc_01_ledger_store::StoreConfig;
use cc_02_protocol::SignedBlock;
use cc_03_chain_state::{ChainState, GenesisConfig, SkipFlags};
use cc_04_evaluators::EvaluatorRegistry;
use cc_08_chain_database::ChainDatabase;
use cc_tests::fixtures::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

const ACCOUNTS: [&str; 4] = ["alice", "bob", "carol", "dave"];

fn funded() -> ChainDatabase {
    let mut db = open();
    with_accounts(&mut db, &ACCOUNTS, 1_000_000);
    db
}

/// Queue `count` transfers in the pending pool, rotating senders.
fn fill_pending(db: &mut ChainDatabase, count: usize) {
    for i in 0..count {
        let from = ACCOUNTS[i % ACCOUNTS.len()];
        let to = ACCOUNTS[(i + 1) % ACCOUNTS.len()];
        let trx = sign(db, vec![transfer(from, to, 1 + i as i64)], &[from]);
        db.push_transaction(&trx, SkipFlags::NOTHING).unwrap();
    }
}

// ============================================================================
// Block application
// ============================================================================

fn bench_push_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain-push-block");
    group.measurement_time(Duration::from_secs(10));

    for transactions in [0usize, 10, 50] {
        let mut producer = funded();
        let prefix: Vec<SignedBlock> = (1..=producer.head_block_num().unwrap())
            .map(|n| producer.fetch_block_by_number(n).unwrap().unwrap())
            .collect();
        fill_pending(&mut producer, transactions);
        let block = produce(&mut producer);

        group.throughput(Throughput::Elements(transactions.max(1) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(transactions), &block, |b, block| {
            b.iter_batched(
                || {
                    let mut node = open();
                    for parent in &prefix {
                        node.push_block(parent, SkipFlags::NOTHING).unwrap();
                    }
                    node
                },
                |mut node| black_box(node.push_block(block, SkipFlags::NOTHING).unwrap()),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

// ============================================================================
// Block production
// ============================================================================

fn bench_generate_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain-generate-block");
    group.measurement_time(Duration::from_secs(10));

    for transactions in [10usize, 50] {
        group.throughput(Throughput::Elements(transactions as u64));
        group.bench_function(BenchmarkId::from_parameter(transactions), |b| {
            b.iter_batched(
                || {
                    let mut db = funded();
                    fill_pending(&mut db, transactions);
                    db
                },
                |mut db| black_box(produce(&mut db)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

// ============================================================================
// Undo sessions
// ============================================================================

fn bench_session_rollback(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger-session");
    let registry = EvaluatorRegistry::new();
    let genesis = GenesisConfig {
        init_supply: INIT_SUPPLY,
        init_witness_count: 3,
        ..GenesisConfig::default()
    };
    let mut state = ChainState::from_genesis(StoreConfig::default(), &genesis).unwrap();
    let witnesses = ["initwitness", "initwitness1", "initwitness2"];
    let ops: Vec<_> = (0..100)
        .map(|i| transfer(witnesses[i % 3], witnesses[(i + 1) % 3], 1))
        .collect();

    group.throughput(Throughput::Elements(ops.len() as u64));
    group.bench_function("apply-100-transfers-then-rollback", |b| {
        b.iter(|| {
            let session = state.begin_session();
            for op in &ops {
                registry.apply_operation(&mut state, op).unwrap();
            }
            state.rollback(session).unwrap();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_push_block, bench_generate_block, bench_session_rollback);
criterion_main!(benches);
