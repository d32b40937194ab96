//! Singleton objects. Each index holds exactly one record with id 0.

use cc_01_ledger_store::{Id, Object};
use cc_02_protocol::config::{
    BANDWIDTH_AVERAGE_WINDOW_SECONDS, BANDWIDTH_PRECISION, BLOCK_INTERVAL, INITIAL_VESTING_PRICE,
    PERCENT_100,
};
use cc_02_protocol::{ChainProperties, Version};
use shared_types::{AccountName, Asset, BlockId, Price, TimePointSec};
use std::collections::VecDeque;

/// Chain-wide counters recomputed every block.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicGlobalProperty {
    pub id: Id<DynamicGlobalProperty>,
    pub head_block_number: u32,
    pub head_block_id: BlockId,
    pub time: TimePointSec,
    pub current_witness: AccountName,

    /// Liquid supply plus dollars valued at the median feed.
    pub virtual_supply: Asset,
    pub current_supply: Asset,
    pub current_cbd_supply: Asset,
    pub total_vesting_fund: Asset,
    pub total_vesting_shares: Asset,
    pub total_reward_fund: Asset,
    pub total_reward_shares2: u128,
    /// Share of dollar payouts actually printed, in hundredths of a percent.
    pub cbd_print_rate: u32,

    pub average_block_size: u32,
    pub maximum_block_size: u32,
    /// Absolute slot number of the head block.
    pub current_aslot: u64,
    /// Bitmap of the last 128 slots, 1 for produced.
    pub recent_slots_filled: u128,
    pub participation_count: u8,
    pub last_irreversible_block_num: u32,

    pub max_virtual_bandwidth: u128,
    pub current_reserve_ratio: u64,
}

impl Object for DynamicGlobalProperty {
    const TYPE_NAME: &'static str = "dynamic_global_property";

    fn id(&self) -> Id<Self> {
        self.id
    }
}

impl DynamicGlobalProperty {
    pub fn new(id: Id<Self>, time: TimePointSec, maximum_block_size: u32) -> Self {
        Self {
            id,
            head_block_number: 0,
            head_block_id: BlockId::default(),
            time,
            current_witness: AccountName::default(),
            virtual_supply: Asset::cedar(0),
            current_supply: Asset::cedar(0),
            current_cbd_supply: Asset::cbd(0),
            total_vesting_fund: Asset::cedar(0),
            total_vesting_shares: Asset::vests(0),
            total_reward_fund: Asset::cedar(0),
            total_reward_shares2: 0,
            cbd_print_rate: PERCENT_100,
            average_block_size: 0,
            maximum_block_size,
            current_aslot: 0,
            recent_slots_filled: u128::MAX,
            participation_count: 128,
            last_irreversible_block_num: 0,
            max_virtual_bandwidth: Self::virtual_bandwidth(maximum_block_size, 1),
            current_reserve_ratio: 1,
        }
    }

    /// Bandwidth the network offers over one averaging window at the given
    /// reserve ratio.
    pub fn virtual_bandwidth(maximum_block_size: u32, reserve_ratio: u64) -> u128 {
        u128::from(maximum_block_size)
            * u128::from(reserve_ratio)
            * u128::from(BANDWIDTH_PRECISION)
            * u128::from(BANDWIDTH_AVERAGE_WINDOW_SECONDS)
            / u128::from(BLOCK_INTERVAL)
    }

    /// VESTS per CEDAR.
    pub fn vesting_share_price(&self) -> Price {
        if self.total_vesting_fund.amount == 0 || self.total_vesting_shares.amount == 0 {
            return INITIAL_VESTING_PRICE;
        }
        Price::new(self.total_vesting_shares, self.total_vesting_fund)
    }
}

/// Hardfork bookkeeping. Monotonic outside of a replay from genesis.
#[derive(Debug, Clone, PartialEq)]
pub struct HardforkProperty {
    pub id: Id<HardforkProperty>,
    /// Activation time of every applied hardfork, genesis first.
    pub processed_hardforks: Vec<TimePointSec>,
    pub last_hardfork: u32,
    pub current_hardfork_version: Version,
    pub next_hardfork: Version,
    pub next_hardfork_time: TimePointSec,
}

impl Object for HardforkProperty {
    const TYPE_NAME: &'static str = "hardfork_property";

    fn id(&self) -> Id<Self> {
        self.id
    }
}

/// The current round of block producers.
#[derive(Debug, Clone, PartialEq)]
pub struct WitnessSchedule {
    pub id: Id<WitnessSchedule>,
    pub current_virtual_time: u128,
    pub next_shuffle_block_num: u32,
    pub current_shuffled_witnesses: Vec<AccountName>,
    pub median_props: ChainProperties,
    pub majority_version: Version,
}

impl Object for WitnessSchedule {
    const TYPE_NAME: &'static str = "witness_schedule";

    fn id(&self) -> Id<Self> {
        self.id
    }
}

impl WitnessSchedule {
    pub fn num_scheduled_witnesses(&self) -> usize {
        self.current_shuffled_witnesses.len()
    }
}

/// Hourly medians of the witness price feeds.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedHistory {
    pub id: Id<FeedHistory>,
    pub current_median_history: Price,
    pub price_history: VecDeque<Price>,
}

impl Object for FeedHistory {
    const TYPE_NAME: &'static str = "feed_history";

    fn id(&self) -> Id<Self> {
        self.id
    }
}
