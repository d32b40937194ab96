use cc_01_ledger_store::{index_key, Id, IndexSpec, Object};
use cc_02_protocol::Authority;
use shared_crypto::PublicKey;
use shared_types::{AccountName, Asset, TimePointSec};

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Id<Account>,
    pub name: AccountName,
    pub memo_key: PublicKey,
    pub json_metadata: String,
    pub created: TimePointSec,
    pub recovery_account: AccountName,
    pub last_account_recovery: TimePointSec,
    pub last_owner_update: TimePointSec,

    pub balance: Asset,
    pub cbd_balance: Asset,
    pub vesting_shares: Asset,
    /// VESTS released per withdrawal interval.
    pub vesting_withdraw_rate: Asset,
    pub next_vesting_withdrawal: TimePointSec,
    pub withdrawn: i64,
    pub to_withdraw: i64,

    pub witnesses_voted_for: u16,
    pub voting_power: u16,
    pub last_vote_time: TimePointSec,
    pub last_post: TimePointSec,
    pub last_root_post: TimePointSec,
    pub post_count: u32,
    pub curation_rewards: i64,
    pub posting_rewards: i64,

    pub average_bandwidth: u128,
    pub lifetime_bandwidth: u128,
    pub last_bandwidth_update: TimePointSec,
}

impl Account {
    pub fn new(id: Id<Account>, name: AccountName, memo_key: PublicKey, created: TimePointSec) -> Self {
        Self {
            id,
            name,
            memo_key,
            json_metadata: String::new(),
            created,
            recovery_account: AccountName::default(),
            last_account_recovery: TimePointSec::MIN,
            last_owner_update: TimePointSec::MIN,
            balance: Asset::cedar(0),
            cbd_balance: Asset::cbd(0),
            vesting_shares: Asset::vests(0),
            vesting_withdraw_rate: Asset::vests(0),
            next_vesting_withdrawal: TimePointSec::MAX,
            withdrawn: 0,
            to_withdraw: 0,
            witnesses_voted_for: 0,
            voting_power: cc_02_protocol::config::PERCENT_100 as u16,
            last_vote_time: created,
            last_post: TimePointSec::MIN,
            last_root_post: TimePointSec::MIN,
            post_count: 0,
            curation_rewards: 0,
            posting_rewards: 0,
            average_bandwidth: 0,
            lifetime_bandwidth: 0,
            last_bandwidth_update: TimePointSec::MIN,
        }
    }
}

impl Object for Account {
    const TYPE_NAME: &'static str = "account";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_name", |a: &Self| index_key!(&a.name)),
            IndexSpec::non_unique("by_next_vesting_withdrawal", |a: &Self| {
                index_key!(a.next_vesting_withdrawal, a.id)
            }),
        ]
    }
}

/// Authorities live apart from balances so that frequent balance updates
/// do not copy them.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountAuthority {
    pub id: Id<AccountAuthority>,
    pub account: AccountName,
    pub owner: Authority,
    pub active: Authority,
    pub posting: Authority,
    pub last_owner_update: TimePointSec,
}

impl Object for AccountAuthority {
    const TYPE_NAME: &'static str = "account_authority";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![IndexSpec::unique("by_account", |a: &Self| index_key!(&a.account))]
    }
}

/// Previous owner authorities, kept for account recovery.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerAuthorityHistory {
    pub id: Id<OwnerAuthorityHistory>,
    pub account: AccountName,
    pub previous_owner_authority: Authority,
    pub last_valid_time: TimePointSec,
}

impl Object for OwnerAuthorityHistory {
    const TYPE_NAME: &'static str = "owner_authority_history";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_account", |h: &Self| index_key!(&h.account, h.id)),
            IndexSpec::non_unique("by_last_valid", |h: &Self| index_key!(h.last_valid_time, h.id)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecoveryRequest {
    pub id: Id<AccountRecoveryRequest>,
    pub account_to_recover: AccountName,
    pub new_owner_authority: Authority,
    pub expires: TimePointSec,
}

impl Object for AccountRecoveryRequest {
    const TYPE_NAME: &'static str = "account_recovery_request";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_account", |r: &Self| index_key!(&r.account_to_recover)),
            IndexSpec::non_unique("by_expiration", |r: &Self| index_key!(r.expires, r.id)),
        ]
    }
}
