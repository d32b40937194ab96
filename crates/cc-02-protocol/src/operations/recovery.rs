use super::{check, validate_account_name, BaseOperation};
use crate::authority::{Authority, RequiredAuthorities};
use crate::errors::ProtocolResult;
use serde::{Deserialize, Serialize};
use shared_types::AccountName;

/// Issued by the recovery partner: allow `account_to_recover` to switch to
/// `new_owner_authority` if it can also prove a recent owner authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAccountRecoveryOperation {
    pub recovery_account: AccountName,
    pub account_to_recover: AccountName,
    pub new_owner_authority: Authority,
}

impl BaseOperation for RequestAccountRecoveryOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("recovery_account", &self.recovery_account)?;
        validate_account_name("account_to_recover", &self.account_to_recover)?;
        self.new_owner_authority.validate()
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.recovery_account.clone());
    }
}

/// Signed by both the requested new owner and a recent owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverAccountOperation {
    pub account_to_recover: AccountName,
    pub new_owner_authority: Authority,
    pub recent_owner_authority: Authority,
}

impl BaseOperation for RecoverAccountOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("account_to_recover", &self.account_to_recover)?;
        check(
            self.new_owner_authority != self.recent_owner_authority,
            "new_owner_authority",
            "cannot recover to the same authority",
        )?;
        check(
            !self.new_owner_authority.is_impossible(),
            "new_owner_authority",
            "new owner authority cannot be impossible",
        )?;
        check(
            self.new_owner_authority.weight_threshold > 0,
            "new_owner_authority",
            "new owner authority cannot be trivial",
        )?;
        self.new_owner_authority.validate()?;
        self.recent_owner_authority.validate()
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.other.push(self.new_owner_authority.clone());
        required.other.push(self.recent_owner_authority.clone());
    }
}
