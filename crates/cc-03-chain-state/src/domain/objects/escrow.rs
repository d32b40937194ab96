use cc_01_ledger_store::{index_key, Id, IndexSpec, Object};
use shared_types::{AccountName, Asset, TimePointSec};

#[derive(Debug, Clone, PartialEq)]
pub struct Escrow {
    pub id: Id<Escrow>,
    pub escrow_id: u32,
    pub from: AccountName,
    pub to: AccountName,
    pub agent: AccountName,
    pub ratification_deadline: TimePointSec,
    pub escrow_expiration: TimePointSec,
    pub cbd_balance: Asset,
    pub cedar_balance: Asset,
    /// Held until the agent approves, then paid to the agent.
    pub pending_fee: Asset,
    pub to_approved: bool,
    pub agent_approved: bool,
    pub disputed: bool,
}

impl Escrow {
    pub fn is_approved(&self) -> bool {
        self.to_approved && self.agent_approved
    }
}

impl Object for Escrow {
    const TYPE_NAME: &'static str = "escrow";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_from_id", |e: &Self| index_key!(&e.from, e.escrow_id)),
            IndexSpec::non_unique("by_ratification_deadline", |e: &Self| {
                index_key!(e.is_approved(), e.ratification_deadline, e.id)
            }),
        ]
    }
}
