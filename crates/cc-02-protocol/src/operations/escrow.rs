use super::{check, validate_account_name, validate_json, validate_non_negative, validate_symbol, BaseOperation};
use crate::authority::RequiredAuthorities;
use crate::errors::ProtocolResult;
use serde::{Deserialize, Serialize};
use shared_types::{AccountName, Asset, AssetSymbol, TimePointSec};

fn validate_amounts(cbd_amount: &Asset, cedar_amount: &Asset) -> ProtocolResult<()> {
    validate_symbol("cbd_amount", cbd_amount, AssetSymbol::Cbd)?;
    validate_symbol("cedar_amount", cedar_amount, AssetSymbol::Cedar)?;
    validate_non_negative("cbd_amount", cbd_amount)?;
    validate_non_negative("cedar_amount", cedar_amount)?;
    check(
        cbd_amount.amount > 0 || cedar_amount.amount > 0,
        "cedar_amount",
        "escrow must move some funds",
    )
}

fn validate_parties(from: &AccountName, to: &AccountName, agent: &AccountName) -> ProtocolResult<()> {
    validate_account_name("from", from)?;
    validate_account_name("to", to)?;
    validate_account_name("agent", agent)?;
    check(agent != from && agent != to, "agent", "agent must be a third party")
}

/// Lock funds under an agent until both the receiver and the agent approve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowTransferOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub agent: AccountName,
    pub escrow_id: u32,
    pub cbd_amount: Asset,
    pub cedar_amount: Asset,
    pub fee: Asset,
    pub ratification_deadline: TimePointSec,
    pub escrow_expiration: TimePointSec,
    pub json_meta: String,
}

impl BaseOperation for EscrowTransferOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_parties(&self.from, &self.to, &self.agent)?;
        validate_amounts(&self.cbd_amount, &self.cedar_amount)?;
        validate_non_negative("fee", &self.fee)?;
        check(
            self.fee.symbol != AssetSymbol::Vests,
            "fee",
            "fee must be CEDAR or CBD",
        )?;
        check(
            self.ratification_deadline < self.escrow_expiration,
            "ratification_deadline",
            "ratification deadline must be before escrow expiration",
        )?;
        validate_json("json_meta", &self.json_meta)
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.from.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowApproveOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub agent: AccountName,
    pub who: AccountName,
    pub escrow_id: u32,
    pub approve: bool,
}

impl BaseOperation for EscrowApproveOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_parties(&self.from, &self.to, &self.agent)?;
        check(
            self.who == self.to || self.who == self.agent,
            "who",
            "only the receiver or the agent can approve",
        )
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.who.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowDisputeOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub agent: AccountName,
    pub who: AccountName,
    pub escrow_id: u32,
}

impl BaseOperation for EscrowDisputeOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_parties(&self.from, &self.to, &self.agent)?;
        check(
            self.who == self.from || self.who == self.to,
            "who",
            "only the sender or the receiver can dispute",
        )
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.who.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowReleaseOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub agent: AccountName,
    pub who: AccountName,
    pub receiver: AccountName,
    pub escrow_id: u32,
    pub cbd_amount: Asset,
    pub cedar_amount: Asset,
}

impl BaseOperation for EscrowReleaseOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_parties(&self.from, &self.to, &self.agent)?;
        check(
            self.who == self.from || self.who == self.to || self.who == self.agent,
            "who",
            "only a party to the escrow can release funds",
        )?;
        check(
            self.receiver == self.from || self.receiver == self.to,
            "receiver",
            "funds can only go to the sender or the receiver",
        )?;
        validate_amounts(&self.cbd_amount, &self.cedar_amount)
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.active.insert(self.who.clone());
    }
}
