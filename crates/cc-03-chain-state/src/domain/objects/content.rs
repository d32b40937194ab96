use cc_01_ledger_store::{index_key, Id, IndexSpec, Object};
use cc_02_protocol::config::{MAX_ACCEPTED_PAYOUT, PERCENT_100};
use shared_types::{AccountName, Asset, TimePointSec};

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: Id<Comment>,
    pub parent_author: AccountName,
    pub parent_permlink: String,
    pub author: AccountName,
    pub permlink: String,

    pub title: String,
    pub body: String,
    pub json_metadata: String,
    pub created: TimePointSec,
    pub last_update: TimePointSec,
    pub last_payout: TimePointSec,

    pub depth: u16,
    pub children: u32,
    pub root_comment: Id<Comment>,

    pub net_rshares: i64,
    pub abs_rshares: i64,
    /// Sum of positive rshares, the basis of curation weights.
    pub vote_rshares: i64,
    pub cashout_time: TimePointSec,
    pub total_vote_weight: u64,
    pub net_votes: i32,

    pub total_payout_value: Asset,
    pub curator_payout_value: Asset,
    pub author_rewards: i64,

    pub max_accepted_payout: Asset,
    pub percent_cbd: u16,
    pub allow_votes: bool,
    pub allow_curation_rewards: bool,
}

impl Comment {
    pub fn new(id: Id<Comment>, author: AccountName, permlink: String, created: TimePointSec) -> Self {
        Self {
            id,
            parent_author: AccountName::default(),
            parent_permlink: String::new(),
            author,
            permlink,
            title: String::new(),
            body: String::new(),
            json_metadata: String::new(),
            created,
            last_update: created,
            last_payout: TimePointSec::MIN,
            depth: 0,
            children: 0,
            root_comment: id,
            net_rshares: 0,
            abs_rshares: 0,
            vote_rshares: 0,
            cashout_time: TimePointSec::MAX,
            total_vote_weight: 0,
            net_votes: 0,
            total_payout_value: Asset::cbd(0),
            curator_payout_value: Asset::cbd(0),
            author_rewards: 0,
            max_accepted_payout: MAX_ACCEPTED_PAYOUT,
            percent_cbd: PERCENT_100 as u16,
            allow_votes: true,
            allow_curation_rewards: true,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_author.is_empty()
    }
}

impl Object for Comment {
    const TYPE_NAME: &'static str = "comment";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_permlink", |c: &Self| index_key!(&c.author, &c.permlink)),
            IndexSpec::non_unique("by_cashout_time", |c: &Self| index_key!(c.cashout_time, c.id)),
            IndexSpec::non_unique("by_parent", |c: &Self| {
                index_key!(&c.parent_author, &c.parent_permlink, c.id)
            }),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentVote {
    pub id: Id<CommentVote>,
    pub voter: AccountName,
    pub comment: Id<Comment>,
    /// Curation weight earned by this vote.
    pub weight: u64,
    pub rshares: i64,
    pub vote_percent: i16,
    pub last_update: TimePointSec,
}

impl Object for CommentVote {
    const TYPE_NAME: &'static str = "comment_vote";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_comment_voter", |v: &Self| index_key!(v.comment, &v.voter)),
            IndexSpec::unique("by_voter_comment", |v: &Self| index_key!(&v.voter, v.comment)),
        ]
    }
}
