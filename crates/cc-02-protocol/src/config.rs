//! Protocol constants.

use crate::version::Version;
use shared_types::{Asset, Price};

/// Running protocol version.
pub const BLOCKCHAIN_VERSION: Version = Version::new(0, 2, 0);
/// Highest hardfork this code knows about.
pub const BLOCKCHAIN_HARDFORK_VERSION: Version = Version::new(0, 2, 0);
pub const NUM_HARDFORKS: u32 = 2;

/// Switches the cashout window to seven days and resets witness virtual
/// schedule times.
pub const HARDFORK_1: u32 = 1;
pub const HARDFORK_1_VERSION: Version = Version::new(0, 1, 0);
pub const HARDFORK_1_TIME: u32 = 1_767_225_600;
/// Retallies witness votes from vesting shares.
pub const HARDFORK_2: u32 = 2;
pub const HARDFORK_2_VERSION: Version = Version::new(0, 2, 0);
pub const HARDFORK_2_TIME: u32 = 1_782_864_000;

// --- Blocks and slots -------------------------------------------------------

pub const BLOCK_INTERVAL: u32 = 3;
pub const BLOCKS_PER_YEAR: u64 = 365 * 24 * 60 * 60 / BLOCK_INTERVAL as u64;
pub const BLOCKS_PER_DAY: u32 = 24 * 60 * 60 / BLOCK_INTERVAL;
pub const BLOCKS_PER_HOUR: u32 = 60 * 60 / BLOCK_INTERVAL;

pub const MAX_TRANSACTION_SIZE: usize = 1024 * 64;
pub const MIN_BLOCK_SIZE_LIMIT: u32 = MAX_TRANSACTION_SIZE as u32;
pub const MAX_BLOCK_SIZE: u32 = MAX_TRANSACTION_SIZE as u32 * BLOCK_INTERVAL * 2000;
pub const DEFAULT_MAX_BLOCK_SIZE: u32 = 2 * MIN_BLOCK_SIZE_LIMIT;

pub const MAX_TIME_UNTIL_EXPIRATION: u32 = 60 * 60;
pub const MAX_UNDO_HISTORY: u32 = 10_000;
pub const MAX_SIG_CHECK_DEPTH: u32 = 2;
/// Ring of recent block ids used for TaPoS.
pub const BLOCK_SUMMARY_COUNT: u32 = 0x1_0000;

// --- Witnesses --------------------------------------------------------------

pub const MAX_VOTED_WITNESSES: usize = 19;
pub const MAX_RUNNER_WITNESSES: usize = 2;
pub const MAX_WITNESSES: usize = MAX_VOTED_WITNESSES + MAX_RUNNER_WITNESSES;
/// Share of scheduled witnesses that must vote for a hardfork.
pub const HARDFORK_REQUIRED_WITNESS_PERCENT: u32 = 80;
pub const IRREVERSIBLE_THRESHOLD: u32 = 75 * PERCENT_1;
pub const MAX_ACCOUNT_WITNESS_VOTES: u16 = 30;
pub const MAX_URL_LENGTH: usize = 2048;
pub const VIRTUAL_SCHEDULE_LAP_LENGTH: u128 = u64::MAX as u128;

// --- Percentages ------------------------------------------------------------

pub const PERCENT_100: u32 = 10_000;
pub const PERCENT_1: u32 = PERCENT_100 / 100;

// --- Accounts ---------------------------------------------------------------

pub const NULL_ACCOUNT: &str = "null";
pub const INIT_WITNESS_NAME: &str = "initwitness";
pub const MIN_ACCOUNT_CREATION_FEE: i64 = 1;
pub const MAX_MEMO_SIZE: usize = 2048;
pub const MAX_PERMLINK_LENGTH: usize = 256;
pub const MAX_TITLE_LENGTH: usize = 256;
pub const MAX_CUSTOM_ID_LENGTH: usize = 32;

pub const OWNER_AUTH_RECOVERY_PERIOD: u32 = 60 * 60 * 24 * 30;
pub const ACCOUNT_RECOVERY_REQUEST_EXPIRATION_PERIOD: u32 = 60 * 60 * 24;
pub const OWNER_UPDATE_LIMIT: u32 = 60 * 60;

pub const BANDWIDTH_AVERAGE_WINDOW_SECONDS: u32 = 60 * 60 * 24 * 7;
pub const BANDWIDTH_PRECISION: u64 = 1_000_000;
pub const MAX_RESERVE_RATIO: u64 = 20_000;
pub const RESERVE_RATIO_UPDATE_BLOCKS: u32 = 20;

// --- Content ----------------------------------------------------------------

pub const CASHOUT_WINDOW_SECONDS: u32 = 60 * 60 * 24 * 7;
pub const CASHOUT_WINDOW_SECONDS_PRE_HF1: u32 = 60 * 60 * 24;
pub const VOTE_REGENERATION_SECONDS: u32 = 5 * 60 * 60 * 24;
pub const VOTE_REGENERATION_PER_DAY: u32 = 40;
pub const REVERSE_AUCTION_WINDOW_SECONDS: u32 = 60 * 30;
pub const MIN_ROOT_COMMENT_INTERVAL: u32 = 60 * 5;
pub const MIN_REPLY_INTERVAL: u32 = 20;
pub const MAX_COMMENT_DEPTH: u16 = 255;
pub const CONTENT_CONSTANT: u128 = 2_000_000_000_000;
pub const CURATION_REWARD_PERCENT: u32 = 25 * PERCENT_1;
/// Half of the author reward is offered as dollars.
pub const DEFAULT_PERCENT_CBD: u16 = PERCENT_100 as u16;
pub const MAX_ACCEPTED_PAYOUT: Asset = Asset::cbd(1_000_000_000);

// --- Economy ----------------------------------------------------------------

pub const INFLATION_RATE_PERCENT: u64 = 950;
pub const CONTENT_REWARD_PERCENT: u64 = 6667;
pub const VESTING_FUND_PERCENT: u64 = 2667;
pub const CONVERSION_DELAY: u32 = 60 * 60 * 84;
pub const VESTING_WITHDRAW_INTERVALS: i64 = 13;
pub const VESTING_WITHDRAW_INTERVAL_SECONDS: u32 = 60 * 60 * 24 * 7;
pub const LIQUIDITY_REWARD_BLOCKS: u32 = BLOCKS_PER_HOUR;
pub const LIQUIDITY_TIMEOUT_SEC: u32 = 60 * 60 * 24 * 7;
pub const MIN_LIQUIDITY_REWARD_PERIOD_SEC: u32 = 60;
pub const LIQUIDITY_REWARD_PERIOD_SEC: u32 = 60 * 60;
/// Hourly liquidity reward as an annual rate of the virtual supply.
pub const LIQUIDITY_APR_PERCENT: u64 = 750;
pub const MIN_LIQUIDITY_REWARD: Asset = Asset::cedar(1000);

pub const FEED_INTERVAL_BLOCKS: u32 = BLOCKS_PER_HOUR;
pub const FEED_HISTORY_WINDOW: usize = 24 * 7 / 2;
pub const MAX_FEED_AGE: u32 = 60 * 60 * 24 * 7;
pub const MIN_FEEDS: usize = MAX_WITNESSES / 3;
/// Dollar printing slows above this share of the virtual supply ...
pub const CBD_START_PERCENT: u32 = 2 * PERCENT_1;
/// ... and stops entirely above this one.
pub const CBD_STOP_PERCENT: u32 = 5 * PERCENT_1;

pub const MAX_PROPOSAL_LIFETIME_SEC: u32 = 60 * 60 * 24 * 7 * 4;
pub const MAX_PROPOSAL_DEPTH: u32 = 2;

/// Vesting price while no vesting exists: 1.000 CEDAR buys 1.000000 VESTS.
pub const INITIAL_VESTING_PRICE: Price = Price::new(Asset::cedar(1_000), Asset::vests(1_000_000));
