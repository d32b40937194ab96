use super::*;
use crate::block::*;
use crate::schedule::update_witness_schedule;
use crate::slots::{get_scheduled_witness, get_slot_time};
use cc_01_ledger_store::StoreConfig;
use cc_02_protocol::config::{
    BLOCKCHAIN_VERSION, HARDFORK_1_VERSION, HARDFORK_2_VERSION, MAX_WITNESSES,
};
use cc_02_protocol::{BlockHeaderExtension, SignedBlock};
use cc_03_chain_state::{DynamicGlobalProperty, GenesisConfig, SkipFlags};
use shared_crypto::PrivateKey;
use shared_types::Asset;

fn genesis() -> GenesisConfig {
    GenesisConfig {
        init_supply: 1_000_000,
        init_witness_count: 3,
        ..GenesisConfig::default()
    }
}

fn create_state() -> ChainState {
    ChainState::from_genesis(StoreConfig::default(), &genesis()).unwrap()
}

fn init_key() -> PrivateKey {
    PrivateKey::from_seed(&genesis().init_key_seed).unwrap()
}

fn name(s: &str) -> AccountName {
    AccountName::new(s)
}

/// Empty block for `slot`, signed by its scheduled witness.
fn produce(state: &ChainState, slot: u32, extensions: Vec<BlockHeaderExtension>) -> SignedBlock {
    let mut block = SignedBlock::default();
    let header = block.header_mut();
    header.previous = state.head_block_id().unwrap();
    header.timestamp = get_slot_time(state, slot).unwrap();
    header.witness = get_scheduled_witness(state, slot).unwrap().unwrap();
    header.extensions = extensions;
    block.sign(&init_key()).unwrap();
    block
}

fn apply(engine: &ConsensusEngine, state: &mut ChainState, block: &SignedBlock) -> Option<u32> {
    validate_block_header(state, block, SkipFlags::NOTHING).unwrap();
    process_header_extensions(state, block).unwrap();
    check_running_version(state, block).unwrap();

    let id = block.id().unwrap();
    let size = block.pack_size().unwrap() as u32;
    update_global_dynamic_data(state, block, id, size, SkipFlags::NOTHING).unwrap();
    update_signing_witness(state, block).unwrap();
    let lib = update_last_irreversible_block(state).unwrap();
    create_block_summary(state, id).unwrap();
    update_witness_schedule(state).unwrap();
    engine.process_hardforks(state).unwrap();
    lib
}

fn version_extension() -> Vec<BlockHeaderExtension> {
    vec![BlockHeaderExtension::Version(BLOCKCHAIN_VERSION)]
}

#[test]
fn test_blocks_advance_head_and_irreversibility() {
    let engine = ConsensusEngine::default();
    let mut state = create_state();

    let first = produce(&state, 1, vec![]);
    assert_eq!(apply(&engine, &mut state, &first), None);
    assert_eq!(state.head_block_num().unwrap(), 1);
    assert_eq!(state.head_block_id().unwrap(), first.id().unwrap());
    assert_eq!(state.head_block_time().unwrap(), first.timestamp());
    assert_eq!(state.block_summary(1).unwrap(), first.id().unwrap());
    assert_eq!(&state.dgp().unwrap().current_witness, first.witness());
    assert_eq!(
        state.get_witness(first.witness()).unwrap().last_confirmed_block_num,
        1
    );

    // Once every scheduled witness has confirmed a block, the oldest of
    // their confirmations is irreversible.
    let second = produce(&state, 1, vec![]);
    assert_eq!(apply(&engine, &mut state, &second), None);
    let third = produce(&state, 1, vec![]);
    assert_eq!(apply(&engine, &mut state, &third), Some(1));
    assert_eq!(state.last_irreversible_block_num().unwrap(), 1);

    let dgp = state.dgp().unwrap();
    assert_eq!(dgp.current_aslot, 3);
    assert_eq!(dgp.participation_count, 128);
}

#[test]
fn test_missed_slots_are_charged() {
    let engine = ConsensusEngine::default();
    let mut state = create_state();
    let skipped = [
        get_scheduled_witness(&state, 1).unwrap().unwrap(),
        get_scheduled_witness(&state, 2).unwrap().unwrap(),
    ];

    let block = produce(&state, 3, vec![]);
    apply(&engine, &mut state, &block);

    for witness in &skipped {
        assert_eq!(state.get_witness(witness).unwrap().total_missed, 1);
    }
    assert_eq!(state.get_witness(block.witness()).unwrap().total_missed, 0);
    let dgp = state.dgp().unwrap();
    assert_eq!(dgp.current_aslot, 3);
    assert_eq!(dgp.participation_count, 126);
    // The produced slot is shifted in first, the missed ones after it.
    assert_eq!(dgp.recent_slots_filled & 0b111, 0b100);
}

#[test]
fn test_header_checks() {
    let state = create_state();
    let valid = produce(&state, 1, vec![]);
    assert!(validate_block_header(&state, &valid, SkipFlags::NOTHING).is_ok());

    let mut unlinked = valid.clone();
    unlinked.header_mut().previous = BlockId::new(7, &Default::default());
    unlinked.sign(&init_key()).unwrap();
    let err = validate_block_header(&state, &unlinked, SkipFlags::NOTHING).unwrap_err();
    assert_eq!(err.code(), "unlinkable_block");

    let mut early = valid.clone();
    early.header_mut().timestamp = state.head_block_time().unwrap();
    early.sign(&init_key()).unwrap();
    let err = validate_block_header(&state, &early, SkipFlags::NOTHING).unwrap_err();
    assert_eq!(err.code(), "block_timestamp_too_early");

    let mut off_slot = valid.clone();
    off_slot.header_mut().timestamp = state.head_block_time().unwrap() + 1;
    off_slot.sign(&init_key()).unwrap();
    let err = validate_block_header(&state, &off_slot, SkipFlags::NOTHING).unwrap_err();
    assert_eq!(err.code(), "block_not_in_slot");

    let mut forged = valid.clone();
    forged.sign(&PrivateKey::from_seed("mallory").unwrap()).unwrap();
    let err = validate_block_header(&state, &forged, SkipFlags::NOTHING).unwrap_err();
    assert_eq!(err.code(), "wrong_witness_signature");
    assert!(validate_block_header(&state, &forged, SkipFlags::WITNESS_SIGNATURE).is_ok());

    let intruder = get_scheduled_witness(&state, 2).unwrap().unwrap();
    let mut out_of_turn = valid;
    out_of_turn.header_mut().witness = intruder.clone();
    out_of_turn.sign(&init_key()).unwrap();
    let err = validate_block_header(&state, &out_of_turn, SkipFlags::NOTHING).unwrap_err();
    assert!(matches!(err, ConsensusError::WrongWitness { actual, .. } if actual == intruder));
    assert!(validate_block_header(&state, &out_of_turn, SkipFlags::WITNESS_SCHEDULE_CHECK).is_ok());
}

#[test]
fn test_undo_history_limit() {
    let mut state = create_state();
    state
        .modify_dgp(|p| p.head_block_number = cc_02_protocol::config::MAX_UNDO_HISTORY)
        .unwrap();
    let block = {
        let mut block = produce(&state, 1, vec![]);
        block.header_mut().previous = BlockId::new(
            cc_02_protocol::config::MAX_UNDO_HISTORY,
            &Default::default(),
        );
        block
    };
    let id = block.id().unwrap();

    let err = update_global_dynamic_data(&mut state, &block, id, 100, SkipFlags::NOTHING).unwrap_err();
    assert_eq!(err.code(), "undo_history_exceeded");
}

#[test]
fn test_reserve_ratio_grows_when_blocks_are_small() {
    let engine = ConsensusEngine::default();
    let mut state = create_state();
    for _ in 0..20 {
        let block = produce(&state, 1, vec![]);
        apply(&engine, &mut state, &block);
    }

    let dgp = state.dgp().unwrap();
    assert_eq!(dgp.current_reserve_ratio, 2);
    assert_eq!(
        dgp.max_virtual_bandwidth,
        DynamicGlobalProperty::virtual_bandwidth(dgp.maximum_block_size, 2)
    );
}

#[test]
fn test_schedule_redrawn_each_round() {
    let engine = ConsensusEngine::default();
    let mut state = create_state();
    for _ in 0..MAX_WITNESSES {
        let block = produce(&state, 1, vec![]);
        apply(&engine, &mut state, &block);
    }

    let schedule = state.witness_schedule().unwrap();
    assert_eq!(schedule.next_shuffle_block_num, MAX_WITNESSES as u32 + 3);
    let mut drawn = schedule.current_shuffled_witnesses.clone();
    drawn.sort();
    assert_eq!(drawn, vec![name("initwitness"), name("initwitness1"), name("initwitness2")]);
}

#[test]
fn test_hardforks_apply_by_time_when_votes_are_waived() {
    let mut state = create_state();
    let engine = ConsensusEngine::new(HardforkSchedule::all_at(state.head_block_time().unwrap()));

    let block = produce(&state, 1, version_extension());
    apply(&engine, &mut state, &block);

    let property = state.hardfork_property().unwrap();
    assert_eq!(property.last_hardfork, 2);
    assert_eq!(property.current_hardfork_version, HARDFORK_2_VERSION);
    assert_eq!(property.processed_hardforks.len(), 3);
    assert!(state.has_hardfork(2).unwrap());
}

#[test]
fn test_hardforks_wait_for_witness_votes() {
    let mut state = create_state();
    let genesis_time = state.head_block_time().unwrap();
    let mut schedule = HardforkSchedule::all_at(genesis_time);
    schedule.require_witness_votes = true;
    let engine = ConsensusEngine::new(schedule);

    assert_eq!(engine.process_hardforks(&mut state).unwrap(), 0);
    assert!(!state.has_hardfork(1).unwrap());

    state
        .store_mut()
        .modify(Id::<HardforkProperty>::new(0), |p| {
            p.next_hardfork = HARDFORK_1_VERSION;
            p.next_hardfork_time = genesis_time;
        })
        .unwrap();
    assert_eq!(engine.process_hardforks(&mut state).unwrap(), 1);
    assert_eq!(state.hardfork_property().unwrap().last_hardfork, 1);
}

#[test]
fn test_outdated_witness_rejected_after_hardfork() {
    let mut state = create_state();
    let engine = ConsensusEngine::default();
    engine.set_hardfork(&mut state, 1).unwrap();

    let stale = produce(&state, 1, vec![]);
    let err = check_running_version(&state, &stale).unwrap_err();
    assert_eq!(err.code(), "outdated_witness_version");

    let current = produce(&state, 1, version_extension());
    process_header_extensions(&mut state, &current).unwrap();
    assert!(check_running_version(&state, &current).is_ok());
    assert_eq!(
        state.get_witness(current.witness()).unwrap().running_version,
        BLOCKCHAIN_VERSION
    );
}

#[test]
fn test_set_hardfork_rejects_unknown() {
    let mut state = create_state();
    let engine = ConsensusEngine::default();
    let err = engine.set_hardfork(&mut state, 3).unwrap_err();
    assert_eq!(err, ConsensusError::UnknownHardfork(3));
    assert_eq!(state.hardfork_property().unwrap().last_hardfork, 0);
}

#[test]
fn test_second_hardfork_retallies_votes() {
    let mut state = create_state();
    let voter = name("initwitness");
    let witness = name("initwitness1");

    state.adjust_balance(&voter, Asset::cedar(-1_000)).unwrap();
    let vests = state.create_vesting(&voter, Asset::cedar(1_000)).unwrap();
    // A vote recorded without its weight.
    state
        .store_mut()
        .create(|id| WitnessVote {
            id,
            witness: witness.clone(),
            account: voter.clone(),
        })
        .unwrap();
    state.modify_account(&voter, |a| a.witnesses_voted_for = 1).unwrap();
    assert_eq!(state.get_witness(&witness).unwrap().votes, 0);

    ConsensusEngine::default().set_hardfork(&mut state, 2).unwrap();

    assert_eq!(state.get_witness(&witness).unwrap().votes, vests.amount);
    state.validate_invariants().unwrap();
}

#[test]
fn test_checkpoints() {
    let mut engine = ConsensusEngine::default();
    let pinned = BlockId::new(10, &shared_crypto::sha256(b"ten"));
    engine.add_checkpoints([(10, pinned)]);

    assert!(engine.check_checkpoint(10, &pinned).is_ok());
    assert!(engine.check_checkpoint(11, &BlockId::default()).is_ok());
    let err = engine.check_checkpoint(10, &BlockId::default()).unwrap_err();
    assert_eq!(err.code(), "checkpoint_mismatch");

    assert!(engine.before_last_checkpoint(10));
    assert!(!engine.before_last_checkpoint(11));
}
