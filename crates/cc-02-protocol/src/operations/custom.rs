use super::{check, validate_account_name, validate_json, BaseOperation};
use crate::authority::RequiredAuthorities;
use crate::config::MAX_CUSTOM_ID_LENGTH;
use crate::errors::ProtocolResult;
use serde::{Deserialize, Serialize};
use shared_types::AccountName;
use std::collections::BTreeSet;

/// Opaque JSON payload routed to the interpreter registered for `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomJsonOperation {
    pub required_auths: BTreeSet<AccountName>,
    pub required_posting_auths: BTreeSet<AccountName>,
    pub id: String,
    pub json: String,
}

impl BaseOperation for CustomJsonOperation {
    fn validate(&self) -> ProtocolResult<()> {
        check(
            !self.required_auths.is_empty() || !self.required_posting_auths.is_empty(),
            "required_auths",
            "at least one account must be specified",
        )?;
        for name in self.required_auths.iter().chain(&self.required_posting_auths) {
            validate_account_name("required_auths", name)?;
        }
        check(
            self.id.len() <= MAX_CUSTOM_ID_LENGTH,
            "id",
            "id is too long",
        )?;
        validate_json("json", &self.json)
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.extend(self.required_auths.iter().cloned());
        required
            .posting
            .extend(self.required_posting_auths.iter().cloned());
    }
}
