//! # Test Fixtures
//!
//! A small network of chain databases sharing one genesis. Every init
//! witness signs with the same key, and blocks are produced by whichever
//! witness the schedule names for the slot.

use cc_02_protocol::{
    AccountCreateOperation, Authority, Operation, SignedBlock, SignedTransaction, Transaction,
    TransferOperation,
};
use cc_03_chain_state::{Account, GenesisConfig, SkipFlags, Witness};
use cc_05_consensus_params::{get_scheduled_witness, get_slot_time};
use cc_08_chain_database::{ChainConfig, ChainDatabase, ChainResult};
use shared_crypto::{PrivateKey, PublicKey};
use shared_types::{AccountName, Asset};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub const INIT_WITNESS: &str = "initwitness";
pub const INIT_SUPPLY: i64 = 1_000_000_000;

/// Scheduled like the others but never online, so its confirmation
/// count stays at zero and no block of a three-witness network becomes
/// irreversible.
pub const STANDBY_WITNESS: &str = "initwitness2";

static TRACING: Once = Once::new();

/// Route chain logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn name(s: &str) -> AccountName {
    AccountName::new(s)
}

pub fn key(seed: &str) -> PrivateKey {
    PrivateKey::from_seed(seed).unwrap()
}

pub fn public(seed: &str) -> PublicKey {
    key(seed).public_key().unwrap()
}

pub fn config(witnesses: usize) -> ChainConfig {
    init_tracing();
    ChainConfig {
        genesis: GenesisConfig {
            init_supply: INIT_SUPPLY,
            init_witness_count: witnesses,
            ..GenesisConfig::default()
        },
        ..ChainConfig::default()
    }
}

/// Three init witnesses, one of them on standby: every fork stays open.
pub fn open() -> ChainDatabase {
    ChainDatabase::open(config(3)).unwrap()
}

/// First slot from `from` on whose witness is online, with that witness.
pub fn online_slot(db: &ChainDatabase, from: u32) -> ChainResult<(u32, AccountName)> {
    let first = from.max(1);
    for slot in first..first + 64 {
        if let Some(witness) = get_scheduled_witness(db.state(), slot)? {
            if witness != name(STANDBY_WITNESS) {
                return Ok((slot, witness));
            }
        }
    }
    panic!("no online witness scheduled from slot {first}");
}

/// Generate the next block as `witness` in `slot`, fully checked.
pub fn produce_as(db: &mut ChainDatabase, witness: &AccountName, slot: u32) -> ChainResult<SignedBlock> {
    let when = get_slot_time(db.state(), slot)?;
    db.generate_block(when, witness, &key(INIT_WITNESS), SkipFlags::NOTHING)
}

/// Produce in the first online slot from `from` on.
pub fn produce_from(db: &mut ChainDatabase, from: u32) -> ChainResult<SignedBlock> {
    let (slot, witness) = online_slot(db, from)?;
    produce_as(db, &witness, slot)
}

pub fn produce(db: &mut ChainDatabase) -> SignedBlock {
    produce_from(db, 1).unwrap()
}

/// Let the next online slot pass and produce in the one after it. Two
/// nodes on the same head that produce and produce late build competing
/// blocks at the same height.
pub fn produce_late(db: &mut ChainDatabase) -> SignedBlock {
    let (first, _) = online_slot(db, 1).unwrap();
    produce_from(db, first + 1).unwrap()
}

/// `ops` referencing the head block, expiring a minute after it, signed
/// by the key of every seed in `signers`.
pub fn sign(db: &ChainDatabase, ops: Vec<Operation>, signers: &[&str]) -> SignedTransaction {
    let state = db.state();
    let mut trx = Transaction::new(ops);
    trx.set_reference_block(&state.head_block_id().unwrap());
    trx.set_expiration(state.head_block_time().unwrap() + 60);
    let mut trx = SignedTransaction::from(trx);
    for signer in signers {
        trx.sign(&key(signer), state.chain_id()).unwrap();
    }
    trx
}

pub fn transfer(from: &str, to: &str, amount: i64) -> Operation {
    Operation::Transfer(TransferOperation {
        from: name(from),
        to: name(to),
        amount: Asset::cedar(amount),
        memo: String::new(),
    })
}

/// Account `account` controlled by the key seeded with its own name. The
/// creation fee becomes its first vesting, which gives it bandwidth.
pub fn create_account(account: &str, funds: i64) -> Vec<Operation> {
    let auth = Authority::from_key(public(account));
    vec![
        Operation::AccountCreate(AccountCreateOperation {
            fee: Asset::cedar(1_000),
            creator: name(INIT_WITNESS),
            new_account_name: name(account),
            owner: auth.clone(),
            active: auth.clone(),
            posting: auth,
            memo_key: public(account),
            json_metadata: String::new(),
        }),
        transfer(INIT_WITNESS, account, funds),
    ]
}

/// Create `accounts` in one block, each funded with `funds`.
pub fn with_accounts(db: &mut ChainDatabase, accounts: &[&str], funds: i64) -> SignedBlock {
    let ops = accounts
        .iter()
        .flat_map(|account| create_account(account, funds))
        .collect();
    let trx = sign(db, ops, &[INIT_WITNESS]);
    db.push_transaction(&trx, SkipFlags::NOTHING).unwrap();
    produce(db)
}

pub fn balance(db: &ChainDatabase, account: &str) -> Asset {
    db.state().get_account(&name(account)).unwrap().balance
}

/// Every consensus object the blocks touch, for comparing two chains.
#[derive(Debug, PartialEq)]
pub struct Snapshot {
    pub dgp: cc_03_chain_state::DynamicGlobalProperty,
    pub accounts: Vec<Account>,
    pub witnesses: Vec<Witness>,
}

pub fn snapshot(db: &ChainDatabase) -> Snapshot {
    let state = db.state();
    Snapshot {
        dgp: state.dgp().unwrap().clone(),
        accounts: state.store().iter::<Account>().unwrap().cloned().collect(),
        witnesses: state.store().iter::<Witness>().unwrap().cloned().collect(),
    }
}
