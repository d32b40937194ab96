use cc_01_ledger_store::{index_key, Id, IndexSpec, Object};
use cc_02_protocol::{ChainProperties, Version};
use shared_crypto::PublicKey;
use shared_types::{AccountName, Price, TimePointSec};

#[derive(Debug, Clone, PartialEq)]
pub struct Witness {
    pub id: Id<Witness>,
    pub owner: AccountName,
    pub created: TimePointSec,
    pub url: String,
    /// Sum of the vesting shares of every account voting for this witness.
    pub votes: i64,

    pub virtual_last_update: u128,
    pub virtual_position: u128,
    pub virtual_scheduled_time: u128,

    pub total_missed: u32,
    pub last_aslot: u64,
    pub last_confirmed_block_num: u32,
    pub signing_key: PublicKey,
    pub props: ChainProperties,
    pub cbd_exchange_rate: Price,
    pub last_cbd_exchange_update: TimePointSec,

    pub running_version: Version,
    pub hardfork_version_vote: Version,
    pub hardfork_time_vote: TimePointSec,
}

impl Witness {
    pub fn new(id: Id<Witness>, owner: AccountName, signing_key: PublicKey, created: TimePointSec) -> Self {
        Self {
            id,
            owner,
            created,
            url: String::new(),
            votes: 0,
            virtual_last_update: 0,
            virtual_position: 0,
            virtual_scheduled_time: u128::MAX,
            total_missed: 0,
            last_aslot: 0,
            last_confirmed_block_num: 0,
            signing_key,
            props: ChainProperties::default(),
            cbd_exchange_rate: Price::null(),
            last_cbd_exchange_update: TimePointSec::MIN,
            running_version: Version::default(),
            hardfork_version_vote: Version::default(),
            hardfork_time_vote: TimePointSec::MIN,
        }
    }
}

impl Object for Witness {
    const TYPE_NAME: &'static str = "witness";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_name", |w: &Self| index_key!(&w.owner)),
            // Highest votes first, then by name.
            IndexSpec::unique("by_vote", |w: &Self| index_key!(-w.votes, &w.owner)),
            IndexSpec::non_unique("by_schedule_time", |w: &Self| {
                index_key!(w.virtual_scheduled_time, w.id)
            }),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WitnessVote {
    pub id: Id<WitnessVote>,
    pub witness: AccountName,
    pub account: AccountName,
}

impl Object for WitnessVote {
    const TYPE_NAME: &'static str = "witness_vote";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_account_witness", |v: &Self| index_key!(&v.account, &v.witness)),
            IndexSpec::unique("by_witness_account", |v: &Self| index_key!(&v.witness, &v.account)),
        ]
    }
}
