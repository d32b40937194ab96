//! The internal CEDAR/CBD order book.
//!
//! A new order is matched against resting orders on the other side, best
//! price first, at the resting order's price. Whatever is left rests on the
//! book until it fills, is cancelled or expires.

use super::ensure;
use crate::domain::{EvaluationError, EvaluationResult};
use cc_01_ledger_store::{index_key, Id};
use cc_02_protocol::config::{LIQUIDITY_TIMEOUT_SEC, MIN_LIQUIDITY_REWARD_PERIOD_SEC};
use cc_02_protocol::{
    FillOrderOperation, LimitOrderCancelOperation, LimitOrderCreateOperation, Operation,
};
use cc_03_chain_state::{ChainState, LimitOrder, LiquidityRewardBalance};
use shared_types::{AccountName, Asset, AssetSymbol, Price};
use std::cmp::Ordering;
use tracing::debug;

pub(crate) fn apply_limit_order_create(
    state: &mut ChainState,
    op: &LimitOrderCreateOperation,
) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    ensure(op.expiration > now, "LimitOrderCreate", "limit order has to expire after head block time")?;
    if state
        .store()
        .find_by::<LimitOrder>("by_account", &index_key!(&op.owner, op.orderid))?
        .is_some()
    {
        return Err(EvaluationError::ObjectExists {
            object: "limit_order",
            key: format!("{}/{}", op.owner, op.orderid),
        });
    }

    state.adjust_balance(&op.owner, op.amount_to_sell.checked_neg()?)?;
    let order = state.store_mut().create(|id| LimitOrder {
        id,
        created: now,
        expiration: op.expiration,
        seller: op.owner.clone(),
        orderid: op.orderid,
        for_sale: op.amount_to_sell.amount,
        sell_price: op.get_price(),
    })?;

    let filled = apply_order(state, order)?;
    if op.fill_or_kill && !filled {
        return Err(EvaluationError::precondition(
            "LimitOrderCreate",
            "cancelling order because it was not filled",
        ));
    }
    Ok(())
}

pub(crate) fn apply_limit_order_cancel(
    state: &mut ChainState,
    op: &LimitOrderCancelOperation,
) -> EvaluationResult<()> {
    let order = state
        .store()
        .get_by::<LimitOrder>("by_account", &index_key!(&op.owner, op.orderid))?
        .id;
    cancel_order(state, order)
}

/// Cancel every order whose expiration has passed.
pub(crate) fn clear_expired_orders(state: &mut ChainState) -> EvaluationResult<usize> {
    let now = state.head_block_time()?;
    let expired: Vec<Id<LimitOrder>> = state
        .store()
        .iter_by::<LimitOrder>("by_expiration")?
        .take_while(|o| o.expiration < now)
        .map(|o| o.id)
        .collect();
    for id in &expired {
        cancel_order(state, *id)?;
    }
    Ok(expired.len())
}

fn cancel_order(state: &mut ChainState, id: Id<LimitOrder>) -> EvaluationResult<()> {
    let order = state.store_mut().remove(id)?;
    state.adjust_balance(&order.seller, order.amount_for_sale())?;
    Ok(())
}

/// Match `new` against the book. Returns true if nothing of it is left.
fn apply_order(state: &mut ChainState, new: Id<LimitOrder>) -> EvaluationResult<bool> {
    let (sell_symbol, receive_symbol, max_price) = {
        let order = state.store().get(new)?;
        (
            order.sell_price.base.symbol,
            order.sell_price.quote.symbol,
            order.sell_price.invert(),
        )
    };

    let mut candidates: Vec<(Price, Id<LimitOrder>)> = state
        .store()
        .equal_range::<LimitOrder>("by_sell_symbol", &index_key!(receive_symbol.name()))?
        .filter(|o| o.id != new && o.sell_price.quote.symbol == sell_symbol)
        .filter(|o| {
            o.sell_price
                .checked_cmp(&max_price)
                .is_ok_and(|ord| ord != Ordering::Less)
        })
        .map(|o| (o.sell_price, o.id))
        .collect();
    candidates.sort_by(|a, b| {
        b.0.checked_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });

    for (match_price, old) in candidates {
        if state.store().find(new).is_none() {
            break;
        }
        if match_orders(state, new, old, &match_price)? & 0x1 != 0 {
            break;
        }
    }
    Ok(state.store().find(new).is_none())
}

/// Trade between the incoming order `new` and the resting order `old` at
/// `match_price`. Bit 0 of the result is set if `new` was filled and bit 1
/// if `old` was.
fn match_orders(
    state: &mut ChainState,
    new: Id<LimitOrder>,
    old: Id<LimitOrder>,
    match_price: &Price,
) -> EvaluationResult<u8> {
    let now = state.head_block_time()?;
    let new_order = state.store().get(new)?.clone();
    let old_order = state.store().get(old)?.clone();
    let new_for_sale = new_order.amount_for_sale();
    let old_for_sale = old_order.amount_for_sale();

    let (new_receives, old_receives) =
        if new_for_sale.checked_cmp(&match_price.convert(old_for_sale)?)? != Ordering::Greater {
            (match_price.convert(new_for_sale)?, new_for_sale)
        } else {
            (old_for_sale, match_price.convert(old_for_sale)?)
        };
    let old_pays = new_receives;
    let new_pays = old_receives;

    if now.seconds_since(old_order.created) >= i64::from(MIN_LIQUIDITY_REWARD_PERIOD_SEC) {
        // Volume is counted in CEDAR: the maker earns it, the taker loses it.
        let (cedar, maker_bought_cedar) = if old_receives.symbol == AssetSymbol::Cedar {
            (old_receives, true)
        } else {
            (new_receives, false)
        };
        adjust_liquidity_reward(state, &old_order.seller, cedar.amount, maker_bought_cedar)?;
        adjust_liquidity_reward(state, &new_order.seller, -cedar.amount, maker_bought_cedar)?;
    }

    state.push_virtual_operation(Operation::FillOrder(FillOrderOperation {
        current_owner: new_order.seller.clone(),
        current_orderid: new_order.orderid,
        current_pays: new_pays,
        open_owner: old_order.seller.clone(),
        open_orderid: old_order.orderid,
        open_pays: old_pays,
    }))?;
    debug!(
        taker = %new_order.seller,
        maker = %old_order.seller,
        %new_pays,
        %old_pays,
        "Filled order"
    );

    let mut result = 0;
    if fill_order(state, new, new_pays, new_receives)? {
        result |= 0x1;
    }
    if fill_order(state, old, old_pays, old_receives)? {
        result |= 0x2;
    }
    Ok(result)
}

/// Credit the seller and shrink the order. Returns true if the order is
/// gone, either fully paid or left with too little to receive anything.
fn fill_order(
    state: &mut ChainState,
    id: Id<LimitOrder>,
    pays: Asset,
    receives: Asset,
) -> EvaluationResult<bool> {
    let order = state.store().get(id)?;
    let seller = order.seller.clone();
    let fully_paid = pays == order.amount_for_sale();
    state.adjust_balance(&seller, receives)?;

    if fully_paid {
        state.store_mut().remove(id)?;
        return Ok(true);
    }
    state
        .store_mut()
        .modify(id, |o: &mut LimitOrder| o.for_sale -= pays.amount)?;
    if state.store().get(id)?.amount_to_receive()?.amount == 0 {
        cancel_order(state, id)?;
        return Ok(true);
    }
    Ok(false)
}

fn adjust_liquidity_reward(
    state: &mut ChainState,
    owner: &AccountName,
    volume: i64,
    bought_cedar: bool,
) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    let apply = |b: &mut LiquidityRewardBalance| {
        if now.seconds_since(b.last_update) >= i64::from(LIQUIDITY_TIMEOUT_SEC) {
            b.cedar_volume = 0;
            b.cbd_volume = 0;
        }
        if bought_cedar {
            b.cedar_volume += volume;
        } else {
            b.cbd_volume += volume;
        }
        b.update_weight();
        b.last_update = now;
    };

    let existing = state
        .store()
        .find_by::<LiquidityRewardBalance>("by_owner", &index_key!(owner))?
        .map(|b| b.id);
    match existing {
        Some(id) => state.store_mut().modify(id, apply)?,
        None => {
            state.store_mut().create(|id| {
                let mut balance = LiquidityRewardBalance {
                    id,
                    owner: owner.clone(),
                    cedar_volume: 0,
                    cbd_volume: 0,
                    weight: 0,
                    last_update: now,
                };
                apply(&mut balance);
                balance
            })?;
        }
    }
    Ok(())
}
