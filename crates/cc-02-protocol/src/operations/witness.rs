use super::{check, validate_account_name, validate_non_negative, validate_symbol, BaseOperation};
use crate::authority::RequiredAuthorities;
use crate::config::{DEFAULT_MAX_BLOCK_SIZE, MAX_URL_LENGTH, MIN_ACCOUNT_CREATION_FEE, MIN_BLOCK_SIZE_LIMIT};
use crate::errors::ProtocolResult;
use serde::{Deserialize, Serialize};
use shared_crypto::PublicKey;
use shared_types::{AccountName, Asset, AssetSymbol};

/// Chain parameters each witness votes on. The median of the active
/// witnesses' values is the one in force.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProperties {
    pub account_creation_fee: Asset,
    pub maximum_block_size: u32,
}

impl Default for ChainProperties {
    fn default() -> Self {
        Self {
            account_creation_fee: Asset::cedar(MIN_ACCOUNT_CREATION_FEE),
            maximum_block_size: DEFAULT_MAX_BLOCK_SIZE,
        }
    }
}

impl ChainProperties {
    pub fn validate(&self) -> ProtocolResult<()> {
        validate_symbol(
            "account_creation_fee",
            &self.account_creation_fee,
            AssetSymbol::Cedar,
        )?;
        check(
            self.account_creation_fee.amount >= MIN_ACCOUNT_CREATION_FEE,
            "account_creation_fee",
            "fee is below the minimum",
        )?;
        check(
            self.maximum_block_size >= MIN_BLOCK_SIZE_LIMIT,
            "maximum_block_size",
            "block size limit is too small",
        )
    }
}

/// Register as a witness or update witness settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessUpdateOperation {
    pub owner: AccountName,
    pub url: String,
    pub block_signing_key: PublicKey,
    pub props: ChainProperties,
    pub fee: Asset,
}

impl BaseOperation for WitnessUpdateOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("owner", &self.owner)?;
        check(!self.url.is_empty(), "url", "url cannot be empty")?;
        check(self.url.len() < MAX_URL_LENGTH, "url", "url is too long")?;
        validate_symbol("fee", &self.fee, AssetSymbol::Cedar)?;
        validate_non_negative("fee", &self.fee)?;
        self.props.validate()
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.owner.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWitnessVoteOperation {
    pub account: AccountName,
    pub witness: AccountName,
    pub approve: bool,
}

impl BaseOperation for AccountWitnessVoteOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("account", &self.account)?;
        validate_account_name("witness", &self.witness)
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.account.clone());
    }
}
