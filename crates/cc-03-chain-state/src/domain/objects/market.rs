use cc_01_ledger_store::{index_key, Id, IndexSpec, Object};
use shared_types::{AccountName, Asset, AssetResult, Price, TimePointSec};

/// A pending CBD to CEDAR conversion, settled at the median feed after the
/// conversion delay.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertRequest {
    pub id: Id<ConvertRequest>,
    pub owner: AccountName,
    pub requestid: u32,
    pub amount: Asset,
    pub conversion_date: TimePointSec,
}

impl Object for ConvertRequest {
    const TYPE_NAME: &'static str = "convert_request";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_owner", |r: &Self| index_key!(&r.owner, r.requestid)),
            IndexSpec::non_unique("by_conversion_date", |r: &Self| {
                index_key!(r.conversion_date, r.id)
            }),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimitOrder {
    pub id: Id<LimitOrder>,
    pub created: TimePointSec,
    pub expiration: TimePointSec,
    pub seller: AccountName,
    pub orderid: u32,
    /// Remaining amount, in the symbol of `sell_price.base`.
    pub for_sale: i64,
    pub sell_price: Price,
}

impl LimitOrder {
    pub fn amount_for_sale(&self) -> Asset {
        Asset::new(self.for_sale, self.sell_price.base.symbol)
    }

    pub fn amount_to_receive(&self) -> AssetResult<Asset> {
        self.sell_price.convert(self.amount_for_sale())
    }
}

impl Object for LimitOrder {
    const TYPE_NAME: &'static str = "limit_order";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_account", |o: &Self| index_key!(&o.seller, o.orderid)),
            IndexSpec::non_unique("by_expiration", |o: &Self| index_key!(o.expiration, o.id)),
            IndexSpec::non_unique("by_sell_symbol", |o: &Self| {
                index_key!(o.sell_price.base.symbol.name(), o.id)
            }),
        ]
    }
}

/// Market-making volume credited toward the hourly liquidity reward.
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidityRewardBalance {
    pub id: Id<LiquidityRewardBalance>,
    pub owner: AccountName,
    pub cedar_volume: i64,
    pub cbd_volume: i64,
    pub weight: u128,
    pub last_update: TimePointSec,
}

impl LiquidityRewardBalance {
    /// Only two-sided volume earns weight.
    pub fn update_weight(&mut self) {
        self.weight = if self.cedar_volume > 0 && self.cbd_volume > 0 {
            self.cedar_volume.min(self.cbd_volume) as u128
        } else {
            0
        };
    }
}

impl Object for LiquidityRewardBalance {
    const TYPE_NAME: &'static str = "liquidity_reward_balance";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique("by_owner", |b: &Self| index_key!(&b.owner)),
            // Heaviest first.
            IndexSpec::unique("by_volume_weight", |b: &Self| {
                index_key!(u128::MAX - b.weight, &b.owner)
            }),
        ]
    }
}
