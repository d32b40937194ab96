//! Operations the chain records about itself. They are emitted through the
//! operation notifications and never appear inside transactions.

use serde::{Deserialize, Serialize};
use shared_types::{AccountName, Asset};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillConvertRequestOperation {
    pub owner: AccountName,
    pub requestid: u32,
    pub amount_in: Asset,
    pub amount_out: Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRewardOperation {
    pub author: AccountName,
    pub permlink: String,
    pub cbd_payout: Asset,
    pub cedar_payout: Asset,
    pub vesting_payout: Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurationRewardOperation {
    pub curator: AccountName,
    pub reward: Asset,
    pub comment_author: AccountName,
    pub comment_permlink: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityRewardOperation {
    pub owner: AccountName,
    pub payout: Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillVestingWithdrawOperation {
    pub from_account: AccountName,
    pub to_account: AccountName,
    pub withdrawn: Asset,
    pub deposited: Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillOrderOperation {
    pub current_owner: AccountName,
    pub current_orderid: u32,
    pub current_pays: Asset,
    pub open_owner: AccountName,
    pub open_orderid: u32,
    pub open_pays: Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerRewardOperation {
    pub producer: AccountName,
    pub vesting_shares: Asset,
}

/// Funds of an unratified escrow returned to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnEscrowOperation {
    pub from: AccountName,
    pub escrow_id: u32,
    pub cbd_amount: Asset,
    pub cedar_amount: Asset,
    pub fee: Asset,
}
