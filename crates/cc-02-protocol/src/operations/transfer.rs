use super::{check, validate_account_name, validate_non_negative, validate_positive, validate_symbol, BaseOperation};
use crate::authority::RequiredAuthorities;
use crate::config::MAX_MEMO_SIZE;
use crate::errors::ProtocolResult;
use serde::{Deserialize, Serialize};
use shared_types::{AccountName, Asset, AssetSymbol};

/// Move liquid CEDAR or CBD between accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub amount: Asset,
    pub memo: String,
}

impl BaseOperation for TransferOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("from", &self.from)?;
        validate_account_name("to", &self.to)?;
        check(
            self.amount.symbol != AssetSymbol::Vests,
            "amount",
            "vesting shares are not transferable",
        )?;
        validate_positive("amount", &self.amount)?;
        check(self.memo.len() < MAX_MEMO_SIZE, "memo", "memo is too large")
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.from.clone());
    }
}

/// Power up: turn CEDAR into vesting shares for `to` (or `from` when `to`
/// is empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferToVestingOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub amount: Asset,
}

impl BaseOperation for TransferToVestingOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("from", &self.from)?;
        if !self.to.is_empty() {
            validate_account_name("to", &self.to)?;
        }
        validate_symbol("amount", &self.amount, AssetSymbol::Cedar)?;
        validate_positive("amount", &self.amount)
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.from.clone());
    }
}

/// Start (or with zero shares, stop) a vesting withdrawal schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawVestingOperation {
    pub account: AccountName,
    pub vesting_shares: Asset,
}

impl BaseOperation for WithdrawVestingOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("account", &self.account)?;
        validate_symbol("vesting_shares", &self.vesting_shares, AssetSymbol::Vests)?;
        validate_non_negative("vesting_shares", &self.vesting_shares)
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.account.clone());
    }
}

/// Convert CBD to CEDAR at the median feed price after a delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOperation {
    pub owner: AccountName,
    pub requestid: u32,
    pub amount: Asset,
}

impl BaseOperation for ConvertOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("owner", &self.owner)?;
        validate_symbol("amount", &self.amount, AssetSymbol::Cbd)?;
        validate_positive("amount", &self.amount)
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.owner.clone());
    }
}
