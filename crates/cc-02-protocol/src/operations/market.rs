use super::{check, validate_account_name, validate_positive, BaseOperation};
use crate::authority::RequiredAuthorities;
use crate::errors::ProtocolResult;
use serde::{Deserialize, Serialize};
use shared_types::{AccountName, Asset, AssetSymbol, Price, TimePointSec};

/// Place an order on the internal CEDAR/CBD market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderCreateOperation {
    pub owner: AccountName,
    pub orderid: u32,
    pub amount_to_sell: Asset,
    pub min_to_receive: Asset,
    pub fill_or_kill: bool,
    pub expiration: TimePointSec,
}

impl LimitOrderCreateOperation {
    /// Price the seller asks, `amount_to_sell / min_to_receive`.
    pub fn get_price(&self) -> Price {
        Price::new(self.amount_to_sell, self.min_to_receive)
    }
}

impl BaseOperation for LimitOrderCreateOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("owner", &self.owner)?;
        let market = (self.amount_to_sell.symbol, self.min_to_receive.symbol);
        check(
            matches!(
                market,
                (AssetSymbol::Cedar, AssetSymbol::Cbd) | (AssetSymbol::Cbd, AssetSymbol::Cedar)
            ),
            "amount_to_sell",
            "limit orders must trade CEDAR against CBD",
        )?;
        validate_positive("amount_to_sell", &self.amount_to_sell)?;
        validate_positive("min_to_receive", &self.min_to_receive)?;
        self.get_price().validate()?;
        Ok(())
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.owner.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderCancelOperation {
    pub owner: AccountName,
    pub orderid: u32,
}

impl BaseOperation for LimitOrderCancelOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("owner", &self.owner)
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.owner.clone());
    }
}

/// Witness price feed, quoted as CBD per CEDAR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPublishOperation {
    pub publisher: AccountName,
    pub exchange_rate: Price,
}

impl BaseOperation for FeedPublishOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("publisher", &self.publisher)?;
        check(
            self.exchange_rate.base.symbol == AssetSymbol::Cbd
                && self.exchange_rate.quote.symbol == AssetSymbol::Cedar,
            "exchange_rate",
            "feed must be quoted as CBD / CEDAR",
        )?;
        self.exchange_rate.validate()?;
        Ok(())
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.publisher.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_order_market_pairs() {
        let mut op = LimitOrderCreateOperation {
            owner: "alice".into(),
            orderid: 1,
            amount_to_sell: Asset::cedar(1_000),
            min_to_receive: Asset::cbd(500),
            fill_or_kill: false,
            expiration: TimePointSec::MAX,
        };
        assert!(op.validate().is_ok());

        op.min_to_receive = Asset::vests(500);
        assert!(op.validate().is_err());

        op.min_to_receive = Asset::cbd(0);
        assert!(op.validate().is_err());
    }

    #[test]
    fn test_feed_must_quote_cbd_per_cedar() {
        let mut op = FeedPublishOperation {
            publisher: "initwitness".into(),
            exchange_rate: Price::new(Asset::cbd(1_000), Asset::cedar(1_000)),
        };
        assert!(op.validate().is_ok());
        op.exchange_rate = op.exchange_rate.invert();
        assert!(op.validate().is_err());
    }
}
