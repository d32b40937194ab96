//! # Operations
//!
//! The closed set of state transitions a transaction can carry, plus the
//! virtual operations the chain records for itself (rewards, fills).
//!
//! Every variant knows its own stateless validation and the authorities it
//! requires, both derivable without touching chain state.

mod account;
mod content;
mod custom;
mod escrow;
mod market;
mod proposal;
mod recovery;
mod transfer;
mod virtual_ops;
mod witness;

pub use account::{AccountCreateOperation, AccountUpdateOperation};
pub use content::{CommentOperation, VoteOperation};
pub use custom::CustomJsonOperation;
pub use escrow::{
    EscrowApproveOperation, EscrowDisputeOperation, EscrowReleaseOperation,
    EscrowTransferOperation,
};
pub use market::{FeedPublishOperation, LimitOrderCancelOperation, LimitOrderCreateOperation};
pub use proposal::{ProposalCreateOperation, ProposalDeleteOperation, ProposalUpdateOperation};
pub use recovery::{RecoverAccountOperation, RequestAccountRecoveryOperation};
pub use transfer::{
    ConvertOperation, TransferOperation, TransferToVestingOperation, WithdrawVestingOperation,
};
pub use virtual_ops::{
    AuthorRewardOperation, CurationRewardOperation, FillConvertRequestOperation,
    FillOrderOperation, FillVestingWithdrawOperation, LiquidityRewardOperation,
    ProducerRewardOperation, ReturnEscrowOperation,
};
pub use witness::{AccountWitnessVoteOperation, ChainProperties, WitnessUpdateOperation};

use crate::authority::RequiredAuthorities;
use crate::errors::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use shared_types::{AccountName, Asset, AssetSymbol};

/// Per-variant behaviour.
pub trait BaseOperation {
    /// Stateless checks.
    fn validate(&self) -> ProtocolResult<()>;

    fn get_required_authorities(&self, _required: &mut RequiredAuthorities) {}
}

macro_rules! operations {
    (
        regular { $($name:ident($ty:ty)),* $(,)? }
        chain_only { $($vname:ident($vty:ty)),* $(,)? }
    ) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub enum Operation {
            $($name($ty),)*
            $($vname($vty),)*
        }

        impl Operation {
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$name(_) => stringify!($name),)*
                    $(Self::$vname(_) => stringify!($vname),)*
                }
            }

            /// Produced by the chain only; never valid inside a transaction.
            pub fn is_virtual(&self) -> bool {
                match self {
                    $(Self::$name(_) => false,)*
                    $(Self::$vname(_) => true,)*
                }
            }

            pub fn validate(&self) -> ProtocolResult<()> {
                match self {
                    $(Self::$name(op) => op.validate(),)*
                    $(Self::$vname(_) => Err(ProtocolError::VirtualOperation(stringify!($vname))),)*
                }
            }

            pub fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
                match self {
                    $(Self::$name(op) => op.get_required_authorities(required),)*
                    $(Self::$vname(_) => {})*
                }
            }
        }

        $(
            impl From<$ty> for Operation {
                fn from(op: $ty) -> Self {
                    Self::$name(op)
                }
            }
        )*
        $(
            impl From<$vty> for Operation {
                fn from(op: $vty) -> Self {
                    Self::$vname(op)
                }
            }
        )*
    };
}

operations! {
    regular {
        Vote(VoteOperation),
        Comment(CommentOperation),
        Transfer(TransferOperation),
        TransferToVesting(TransferToVestingOperation),
        WithdrawVesting(WithdrawVestingOperation),
        LimitOrderCreate(LimitOrderCreateOperation),
        LimitOrderCancel(LimitOrderCancelOperation),
        FeedPublish(FeedPublishOperation),
        Convert(ConvertOperation),
        AccountCreate(AccountCreateOperation),
        AccountUpdate(AccountUpdateOperation),
        WitnessUpdate(WitnessUpdateOperation),
        AccountWitnessVote(AccountWitnessVoteOperation),
        CustomJson(CustomJsonOperation),
        EscrowTransfer(EscrowTransferOperation),
        EscrowApprove(EscrowApproveOperation),
        EscrowDispute(EscrowDisputeOperation),
        EscrowRelease(EscrowReleaseOperation),
        RequestAccountRecovery(RequestAccountRecoveryOperation),
        RecoverAccount(RecoverAccountOperation),
        ProposalCreate(ProposalCreateOperation),
        ProposalUpdate(ProposalUpdateOperation),
        ProposalDelete(ProposalDeleteOperation),
    }
    chain_only {
        FillConvertRequest(FillConvertRequestOperation),
        AuthorReward(AuthorRewardOperation),
        CurationReward(CurationRewardOperation),
        LiquidityReward(LiquidityRewardOperation),
        FillVestingWithdraw(FillVestingWithdrawOperation),
        FillOrder(FillOrderOperation),
        ProducerReward(ProducerRewardOperation),
        ReturnEscrow(ReturnEscrowOperation),
    }
}

/// Union of the authorities required by `ops`.
pub fn required_authorities<'a>(ops: impl IntoIterator<Item = &'a Operation>) -> RequiredAuthorities {
    let mut required = RequiredAuthorities::default();
    for op in ops {
        op.get_required_authorities(&mut required);
    }
    required
}

// =============================================================================
// Validation helpers
// =============================================================================

pub(crate) fn check(condition: bool, field: &'static str, reason: &str) -> ProtocolResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ProtocolError::invalid(field, reason))
    }
}

pub(crate) fn validate_account_name(field: &'static str, name: &AccountName) -> ProtocolResult<()> {
    check(name.is_valid(), field, &format!("invalid account name {name}"))
}

pub(crate) fn validate_symbol(field: &'static str, asset: &Asset, symbol: AssetSymbol) -> ProtocolResult<()> {
    check(
        asset.symbol == symbol,
        field,
        &format!("expected {symbol}, got {}", asset.symbol),
    )
}

pub(crate) fn validate_positive(field: &'static str, asset: &Asset) -> ProtocolResult<()> {
    check(asset.amount > 0, field, "must be positive")
}

pub(crate) fn validate_non_negative(field: &'static str, asset: &Asset) -> ProtocolResult<()> {
    check(asset.amount >= 0, field, "cannot be negative")
}

pub(crate) fn validate_json(field: &'static str, json: &str) -> ProtocolResult<()> {
    if json.is_empty() {
        return Ok(());
    }
    serde_json::from_str::<serde_json::Value>(json)
        .map(|_| ())
        .map_err(|e| ProtocolError::invalid(field, format!("malformed json: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(amount: Asset) -> Operation {
        TransferOperation {
            from: "alice".into(),
            to: "bob".into(),
            amount,
            memo: String::new(),
        }
        .into()
    }

    #[test]
    fn test_transfer_validation() {
        assert!(transfer(Asset::cedar(1)).validate().is_ok());
        assert!(transfer(Asset::cbd(1)).validate().is_ok());
        assert!(transfer(Asset::cedar(0)).validate().is_err());
        assert!(transfer(Asset::vests(1)).validate().is_err());
    }

    #[test]
    fn test_virtual_operations_never_validate() {
        let op: Operation = ProducerRewardOperation {
            producer: "initwitness".into(),
            vesting_shares: Asset::vests(1),
        }
        .into();
        assert!(op.is_virtual());
        assert_eq!(
            op.validate(),
            Err(ProtocolError::VirtualOperation("ProducerReward"))
        );
    }

    #[test]
    fn test_required_authorities_are_collected() {
        let ops = vec![
            transfer(Asset::cedar(5)),
            Operation::AccountUpdate(AccountUpdateOperation {
                account: "bob".into(),
                owner: Some(crate::Authority::new(1).with_account("carol".into(), 1)),
                active: None,
                posting: None,
                memo_key: None,
                json_metadata: String::new(),
            }),
            Operation::Vote(VoteOperation {
                voter: "dave".into(),
                author: "alice".into(),
                permlink: "hello".into(),
                weight: 100,
            }),
        ];
        let required = required_authorities(&ops);
        assert!(required.active.contains(&AccountName::from("alice")));
        assert!(required.owner.contains(&AccountName::from("bob")));
        assert!(required.posting.contains(&AccountName::from("dave")));
    }

    #[test]
    fn test_operation_names() {
        let op = Operation::ProposalDelete(ProposalDeleteOperation {
            author: "alice".into(),
            title: "x".into(),
            requester: "alice".into(),
        });
        assert_eq!(op.name(), "ProposalDelete");
        assert!(!op.is_virtual());
    }

    #[test]
    fn test_json_helper() {
        assert!(validate_json("json", "").is_ok());
        assert!(validate_json("json", "{\"a\":1}").is_ok());
        assert!(validate_json("json", "{a:1").is_err());
    }
}
