use cc_01_ledger_store::{index_key, Id, IndexSpec, Object};
use shared_types::{BlockId, TimePointSec, TransactionId};

/// Ring of recent block ids addressed by `block_num & 0xffff`, used for
/// TaPoS checks.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSummary {
    pub id: Id<BlockSummary>,
    pub block_id: BlockId,
}

impl Object for BlockSummary {
    const TYPE_NAME: &'static str = "block_summary";

    fn id(&self) -> Id<Self> {
        self.id
    }
}

/// Recently applied transaction, kept until it expires for duplicate
/// detection.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionObject {
    pub id: Id<TransactionObject>,
    pub trx_id: TransactionId,
    pub expiration: TimePointSec,
}

impl Object for TransactionObject {
    const TYPE_NAME: &'static str = "transaction";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_trx_id", |t: &Self| index_key!(&t.trx_id.0[..])),
            IndexSpec::non_unique("by_expiration", |t: &Self| index_key!(t.expiration, t.id)),
        ]
    }
}
