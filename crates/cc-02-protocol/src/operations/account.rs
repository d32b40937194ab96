use super::{validate_account_name, validate_json, validate_non_negative, validate_symbol, BaseOperation};
use crate::authority::{Authority, RequiredAuthorities};
use crate::errors::ProtocolResult;
use serde::{Deserialize, Serialize};
use shared_crypto::PublicKey;
use shared_types::{AccountName, Asset, AssetSymbol};

/// Create a new account; the fee is converted to vesting shares for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreateOperation {
    pub fee: Asset,
    pub creator: AccountName,
    pub new_account_name: AccountName,
    pub owner: Authority,
    pub active: Authority,
    pub posting: Authority,
    pub memo_key: PublicKey,
    pub json_metadata: String,
}

impl BaseOperation for AccountCreateOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("new_account_name", &self.new_account_name)?;
        validate_account_name("creator", &self.creator)?;
        validate_symbol("fee", &self.fee, AssetSymbol::Cedar)?;
        validate_non_negative("fee", &self.fee)?;
        self.owner.validate()?;
        self.active.validate()?;
        self.posting.validate()?;
        validate_json("json_metadata", &self.json_metadata)
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.creator.clone());
    }
}

/// Replace any of an account's authorities or its memo key. Changing the
/// owner authority needs owner authority; everything else needs active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdateOperation {
    pub account: AccountName,
    pub owner: Option<Authority>,
    pub active: Option<Authority>,
    pub posting: Option<Authority>,
    pub memo_key: Option<PublicKey>,
    pub json_metadata: String,
}

impl BaseOperation for AccountUpdateOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("account", &self.account)?;
        for auth in [&self.owner, &self.active, &self.posting].into_iter().flatten() {
            auth.validate()?;
        }
        validate_json("json_metadata", &self.json_metadata)
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        if self.owner.is_some() {
            required.owner.insert(self.account.clone());
        } else {
            required.active.insert(self.account.clone());
        }
    }
}
