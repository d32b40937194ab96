//! Supply bookkeeping checks.

use super::ChainState;
use crate::domain::{
    Account, ChainStateError, ChainStateResult, ConvertRequest, Escrow, LimitOrder, Witness,
};
use shared_types::{Asset, AssetSymbol};

#[derive(Default)]
struct Totals {
    cedar: i128,
    cbd: i128,
}

impl Totals {
    fn add(&mut self, asset: Asset) {
        match asset.symbol {
            AssetSymbol::Cedar => self.cedar += i128::from(asset.amount),
            AssetSymbol::Cbd => self.cbd += i128::from(asset.amount),
            AssetSymbol::Vests => {}
        }
    }
}

impl ChainState {
    /// Re-derive the supply figures from every holding and compare them with
    /// the global properties. Reports the first mismatch.
    pub fn validate_invariants(&self) -> ChainStateResult<()> {
        let dgp = self.dgp()?;
        let mut totals = Totals::default();
        let mut total_vesting: i128 = 0;
        let mut expected_votes: i128 = 0;

        for account in self.store.iter::<Account>()? {
            totals.add(account.balance);
            totals.add(account.cbd_balance);
            total_vesting += i128::from(account.vesting_shares.amount);
            expected_votes +=
                i128::from(account.vesting_shares.amount) * i128::from(account.witnesses_voted_for);
        }
        for request in self.store.iter::<ConvertRequest>()? {
            totals.add(request.amount);
        }
        for order in self.store.iter::<LimitOrder>()? {
            totals.add(order.amount_for_sale());
        }
        for escrow in self.store.iter::<Escrow>()? {
            totals.add(escrow.cedar_balance);
            totals.add(escrow.cbd_balance);
            totals.add(escrow.pending_fee);
        }
        totals.add(dgp.total_vesting_fund);
        totals.add(dgp.total_reward_fund);

        let witness_votes: i128 = self
            .store
            .iter::<Witness>()?
            .map(|w| i128::from(w.votes))
            .sum();

        check("current_supply", i128::from(dgp.current_supply.amount), totals.cedar)?;
        check("current_cbd_supply", i128::from(dgp.current_cbd_supply.amount), totals.cbd)?;
        check(
            "total_vesting_shares",
            i128::from(dgp.total_vesting_shares.amount),
            total_vesting,
        )?;
        check("witness votes", witness_votes, expected_votes)?;

        if dgp.virtual_supply.amount < dgp.current_supply.amount {
            return Err(ChainStateError::InvariantViolation(format!(
                "virtual supply {} below current supply {}",
                dgp.virtual_supply, dgp.current_supply
            )));
        }
        let median = self.median_price()?;
        if !median.is_null() {
            let expected = median
                .convert(dgp.current_cbd_supply)?
                .checked_add(dgp.current_supply)?;
            check(
                "virtual_supply",
                i128::from(dgp.virtual_supply.amount),
                i128::from(expected.amount),
            )?;
        }
        Ok(())
    }
}

fn check(what: &str, recorded: i128, derived: i128) -> ChainStateResult<()> {
    if recorded == derived {
        Ok(())
    } else {
        Err(ChainStateError::InvariantViolation(format!(
            "{what}: recorded {recorded}, derived {derived}"
        )))
    }
}
