//! # Authorities and Authority Verification
//!
//! An [`Authority`] is a weighted threshold over keys and other accounts.
//! Every operation declares which accounts must authorize it and at which
//! level (owner, active, posting); verification walks those requirements
//! against the signing keys and any explicit account approvals.
//!
//! ## Levels
//!
//! - Owner authority satisfies active and posting requirements.
//! - Active authority satisfies posting requirements.
//! - Posting requirements cannot share a transaction with active, owner or
//!   other requirements.
//!
//! Verification produces an [`AuthorityCheck`] rather than failing on the
//! first problem, so callers that want to seed missing categories and retry
//! (proposal approvals) can inspect exactly what is missing or unused.

use crate::errors::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use shared_crypto::PublicKey;
use shared_types::AccountName;
use std::collections::{BTreeMap, BTreeSet};

/// Weighted multi-signature threshold.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Authority {
    pub weight_threshold: u32,
    pub account_auths: BTreeMap<AccountName, u16>,
    pub key_auths: BTreeMap<PublicKey, u16>,
}

impl Authority {
    pub fn new(weight_threshold: u32) -> Self {
        Self {
            weight_threshold,
            ..Self::default()
        }
    }

    /// Single key, threshold 1.
    pub fn from_key(key: PublicKey) -> Self {
        Self::new(1).with_key(key, 1)
    }

    pub fn with_key(mut self, key: PublicKey, weight: u16) -> Self {
        self.key_auths.insert(key, weight);
        self
    }

    pub fn with_account(mut self, account: AccountName, weight: u16) -> Self {
        self.account_auths.insert(account, weight);
        self
    }

    pub fn num_auths(&self) -> usize {
        self.account_auths.len() + self.key_auths.len()
    }

    /// True when the weights of every member together cannot reach the
    /// threshold.
    pub fn is_impossible(&self) -> bool {
        let total: u64 = self
            .account_auths
            .values()
            .chain(self.key_auths.values())
            .map(|w| u64::from(*w))
            .sum();
        total < u64::from(self.weight_threshold)
    }

    pub fn validate(&self) -> ProtocolResult<()> {
        for account in self.account_auths.keys() {
            if !account.is_valid() {
                return Err(ProtocolError::invalid(
                    "authority",
                    format!("invalid account {account}"),
                ));
            }
        }
        Ok(())
    }
}

/// Accounts and authorities an operation needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredAuthorities {
    pub active: BTreeSet<AccountName>,
    pub owner: BTreeSet<AccountName>,
    pub posting: BTreeSet<AccountName>,
    pub other: Vec<Authority>,
}

impl RequiredAuthorities {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
            && self.owner.is_empty()
            && self.posting.is_empty()
            && self.other.is_empty()
    }
}

/// Explicit account approvals that stand in for signatures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Approvals {
    pub active: BTreeSet<AccountName>,
    pub owner: BTreeSet<AccountName>,
    pub posting: BTreeSet<AccountName>,
}

/// Authority lookups by account name. `None` means the account is unknown.
pub type AuthorityGetter<'a> = &'a dyn Fn(&AccountName) -> Option<Authority>;

#[derive(Clone, Copy)]
pub struct AuthorityGetters<'a> {
    pub active: AuthorityGetter<'a>,
    pub owner: AuthorityGetter<'a>,
    pub posting: AuthorityGetter<'a>,
}

/// Outcome of authority verification, first failing category wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorityCheck {
    Satisfied,
    MixedPostingAuthority,
    MissingOther,
    MissingActive {
        accounts: BTreeSet<AccountName>,
        used_signatures: BTreeSet<PublicKey>,
    },
    MissingOwner {
        accounts: BTreeSet<AccountName>,
        used_signatures: BTreeSet<PublicKey>,
    },
    MissingPosting {
        accounts: BTreeSet<AccountName>,
        used_signatures: BTreeSet<PublicKey>,
    },
    IrrelevantSignatures {
        unused: BTreeSet<PublicKey>,
    },
    IrrelevantApprovals {
        unused: BTreeSet<AccountName>,
    },
}

impl AuthorityCheck {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }

    pub fn into_result(self) -> ProtocolResult<()> {
        match self {
            Self::Satisfied => Ok(()),
            Self::MixedPostingAuthority => Err(ProtocolError::MixedPostingAuthority),
            Self::MissingOther => Err(ProtocolError::MissingOtherAuthority),
            Self::MissingActive {
                accounts,
                used_signatures,
            } => Err(ProtocolError::MissingActiveAuthority {
                accounts,
                used_signatures,
            }),
            Self::MissingOwner {
                accounts,
                used_signatures,
            } => Err(ProtocolError::MissingOwnerAuthority {
                accounts,
                used_signatures,
            }),
            Self::MissingPosting {
                accounts,
                used_signatures,
            } => Err(ProtocolError::MissingPostingAuthority {
                accounts,
                used_signatures,
            }),
            Self::IrrelevantSignatures { unused } => Err(ProtocolError::IrrelevantSignature(unused)),
            Self::IrrelevantApprovals { unused } => Err(ProtocolError::IrrelevantApproval(unused)),
        }
    }
}

/// Signature and approval bookkeeping for one verification pass.
struct SignState<'a> {
    get_authority: AuthorityGetter<'a>,
    max_recursion: u32,
    /// key -> used
    signatures: BTreeMap<PublicKey, bool>,
    /// explicitly approved account -> used
    approvals: BTreeMap<AccountName, bool>,
    /// accounts found satisfied through recursion
    derived: BTreeSet<AccountName>,
    /// approvals that count for nothing at this level
    inert: BTreeSet<AccountName>,
}

impl<'a> SignState<'a> {
    fn new(
        signatures: &BTreeSet<PublicKey>,
        get_authority: AuthorityGetter<'a>,
        max_recursion: u32,
        approvals: impl IntoIterator<Item = AccountName>,
    ) -> Self {
        Self {
            get_authority,
            max_recursion,
            signatures: signatures.iter().map(|k| (*k, false)).collect(),
            approvals: approvals.into_iter().map(|a| (a, false)).collect(),
            derived: BTreeSet::new(),
            inert: BTreeSet::new(),
        }
    }

    fn signed_by(&mut self, key: &PublicKey) -> bool {
        match self.signatures.get_mut(key) {
            Some(used) => {
                *used = true;
                true
            }
            None => false,
        }
    }

    fn approved(&mut self, account: &AccountName) -> bool {
        if let Some(used) = self.approvals.get_mut(account) {
            *used = true;
            return true;
        }
        self.derived.contains(account)
    }

    /// Account satisfied by approval or by its primary-level authority.
    fn check_account(&mut self, account: &AccountName) -> bool {
        if self.approved(account) {
            return true;
        }
        match (self.get_authority)(account) {
            Some(auth) => self.check(&auth, 0),
            None => false,
        }
    }

    fn check_optional(&mut self, auth: Option<Authority>) -> bool {
        match auth {
            Some(auth) => self.check(&auth, 0),
            None => false,
        }
    }

    fn check(&mut self, auth: &Authority, depth: u32) -> bool {
        let threshold = u64::from(auth.weight_threshold);
        let mut total: u64 = 0;

        for (key, weight) in &auth.key_auths {
            if self.signed_by(key) {
                total += u64::from(*weight);
                if total >= threshold {
                    return true;
                }
            }
        }

        for (account, weight) in &auth.account_auths {
            let satisfied = if self.approved(account) {
                true
            } else if depth == self.max_recursion {
                false
            } else {
                match (self.get_authority)(account) {
                    Some(nested) if self.check(&nested, depth + 1) => {
                        self.derived.insert(account.clone());
                        true
                    }
                    _ => false,
                }
            };
            if satisfied {
                total += u64::from(*weight);
                if total >= threshold {
                    return true;
                }
            }
        }

        total >= threshold
    }

    fn used_signatures(&self) -> BTreeSet<PublicKey> {
        self.signatures
            .iter()
            .filter(|(_, used)| **used)
            .map(|(k, _)| *k)
            .collect()
    }

    fn unused_signatures(&self) -> BTreeSet<PublicKey> {
        self.signatures
            .iter()
            .filter(|(_, used)| !**used)
            .map(|(k, _)| *k)
            .collect()
    }

    fn unused_approvals(&self) -> BTreeSet<AccountName> {
        self.approvals
            .iter()
            .filter(|(_, used)| !**used)
            .map(|(a, _)| a.clone())
            .chain(self.inert.iter().cloned())
            .collect()
    }

    fn leftovers(&self) -> AuthorityCheck {
        let unused = self.unused_signatures();
        if !unused.is_empty() {
            return AuthorityCheck::IrrelevantSignatures { unused };
        }
        let unused = self.unused_approvals();
        if !unused.is_empty() {
            return AuthorityCheck::IrrelevantApprovals { unused };
        }
        AuthorityCheck::Satisfied
    }
}

/// Verify `required` against signing keys and explicit approvals.
pub fn check_authority(
    required: &RequiredAuthorities,
    signatures: &BTreeSet<PublicKey>,
    getters: AuthorityGetters<'_>,
    max_recursion: u32,
    approvals: &Approvals,
) -> AuthorityCheck {
    if !required.posting.is_empty() {
        if !required.active.is_empty() || !required.owner.is_empty() || !required.other.is_empty()
        {
            return AuthorityCheck::MixedPostingAuthority;
        }

        let everyone = approvals
            .posting
            .iter()
            .chain(&approvals.active)
            .chain(&approvals.owner)
            .cloned();
        let mut state = SignState::new(signatures, getters.posting, max_recursion, everyone);

        let missing: BTreeSet<AccountName> = required
            .posting
            .iter()
            .filter(|id| {
                !state.check_account(id)
                    && !state.check_optional((getters.active)(id))
                    && !state.check_optional((getters.owner)(id))
            })
            .cloned()
            .collect();
        if !missing.is_empty() {
            return AuthorityCheck::MissingPosting {
                accounts: missing,
                used_signatures: state.used_signatures(),
            };
        }
        return state.leftovers();
    }

    let active_or_owner = approvals.active.iter().chain(&approvals.owner).cloned();
    let mut state = SignState::new(signatures, getters.active, max_recursion, active_or_owner);
    // Posting approvals never satisfy active or owner requirements.
    state.inert = approvals
        .posting
        .iter()
        .filter(|a| !approvals.active.contains(*a) && !approvals.owner.contains(*a))
        .cloned()
        .collect();

    for auth in &required.other {
        if !state.check(auth, 0) {
            return AuthorityCheck::MissingOther;
        }
    }

    let missing: BTreeSet<AccountName> = required
        .active
        .iter()
        .filter(|id| !state.check_account(id) && !state.check_optional((getters.owner)(id)))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return AuthorityCheck::MissingActive {
            accounts: missing,
            used_signatures: state.used_signatures(),
        };
    }

    let missing: BTreeSet<AccountName> = required
        .owner
        .iter()
        .filter(|id| {
            if approvals.owner.contains(*id) {
                if let Some(used) = state.approvals.get_mut(*id) {
                    *used = true;
                }
                return false;
            }
            !state.check_optional((getters.owner)(id))
        })
        .cloned()
        .collect();
    if !missing.is_empty() {
        return AuthorityCheck::MissingOwner {
            accounts: missing,
            used_signatures: state.used_signatures(),
        };
    }

    state.leftovers()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::PrivateKey;
    use std::collections::HashMap;

    fn key(seed: &str) -> PublicKey {
        PrivateKey::from_seed(seed).unwrap().public_key().unwrap()
    }

    struct Accounts {
        active: HashMap<AccountName, Authority>,
        owner: HashMap<AccountName, Authority>,
        posting: HashMap<AccountName, Authority>,
    }

    impl Accounts {
        fn new(names: &[&str]) -> Self {
            let mut accounts = Self {
                active: HashMap::new(),
                owner: HashMap::new(),
                posting: HashMap::new(),
            };
            for name in names {
                let n = AccountName::from(*name);
                accounts
                    .active
                    .insert(n.clone(), Authority::from_key(key(&format!("{name}-active"))));
                accounts
                    .owner
                    .insert(n.clone(), Authority::from_key(key(&format!("{name}-owner"))));
                accounts
                    .posting
                    .insert(n, Authority::from_key(key(&format!("{name}-posting"))));
            }
            accounts
        }

        fn check(
            &self,
            required: &RequiredAuthorities,
            sigs: &[PublicKey],
            approvals: &Approvals,
        ) -> AuthorityCheck {
            let active = |n: &AccountName| self.active.get(n).cloned();
            let owner = |n: &AccountName| self.owner.get(n).cloned();
            let posting = |n: &AccountName| self.posting.get(n).cloned();
            let getters = AuthorityGetters {
                active: &active,
                owner: &owner,
                posting: &posting,
            };
            let sigs: BTreeSet<PublicKey> = sigs.iter().copied().collect();
            check_authority(required, &sigs, getters, 2, approvals)
        }
    }

    fn active(names: &[&str]) -> RequiredAuthorities {
        RequiredAuthorities {
            active: names.iter().map(|n| AccountName::from(*n)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_active_satisfied_by_active_or_owner_key() {
        let accounts = Accounts::new(&["alice"]);
        let req = active(&["alice"]);
        assert!(accounts
            .check(&req, &[key("alice-active")], &Approvals::default())
            .is_satisfied());
        assert!(accounts
            .check(&req, &[key("alice-owner")], &Approvals::default())
            .is_satisfied());
        assert!(matches!(
            accounts.check(&req, &[key("alice-posting")], &Approvals::default()),
            AuthorityCheck::MissingActive { .. }
        ));
    }

    #[test]
    fn test_extra_signature_is_irrelevant() {
        let accounts = Accounts::new(&["alice", "bob"]);
        let result = accounts.check(
            &active(&["alice"]),
            &[key("alice-active"), key("bob-active")],
            &Approvals::default(),
        );
        assert_eq!(
            result,
            AuthorityCheck::IrrelevantSignatures {
                unused: [key("bob-active")].into_iter().collect()
            }
        );
    }

    #[test]
    fn test_owner_requirement_needs_owner() {
        let accounts = Accounts::new(&["bob"]);
        let req = RequiredAuthorities {
            owner: [AccountName::from("bob")].into_iter().collect(),
            ..Default::default()
        };
        assert!(matches!(
            accounts.check(&req, &[key("bob-active")], &Approvals::default()),
            AuthorityCheck::MissingOwner { .. }
        ));
        assert!(accounts
            .check(&req, &[key("bob-owner")], &Approvals::default())
            .is_satisfied());
        let approvals = Approvals {
            owner: [AccountName::from("bob")].into_iter().collect(),
            ..Default::default()
        };
        assert!(accounts.check(&req, &[], &approvals).is_satisfied());
    }

    #[test]
    fn test_posting_cannot_mix() {
        let accounts = Accounts::new(&["alice"]);
        let req = RequiredAuthorities {
            posting: [AccountName::from("alice")].into_iter().collect(),
            active: [AccountName::from("alice")].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(
            accounts.check(&req, &[key("alice-active")], &Approvals::default()),
            AuthorityCheck::MixedPostingAuthority
        );
    }

    #[test]
    fn test_posting_satisfied_by_any_level() {
        let accounts = Accounts::new(&["alice"]);
        let req = RequiredAuthorities {
            posting: [AccountName::from("alice")].into_iter().collect(),
            ..Default::default()
        };
        for seed in ["alice-posting", "alice-active", "alice-owner"] {
            assert!(accounts
                .check(&req, &[key(seed)], &Approvals::default())
                .is_satisfied());
        }
    }

    #[test]
    fn test_unused_approval_reported() {
        let accounts = Accounts::new(&["alice", "carol"]);
        let approvals = Approvals {
            active: ["alice", "carol"].into_iter().map(AccountName::from).collect(),
            ..Default::default()
        };
        assert_eq!(
            accounts.check(&active(&["alice"]), &[], &approvals),
            AuthorityCheck::IrrelevantApprovals {
                unused: [AccountName::from("carol")].into_iter().collect()
            }
        );
    }

    #[test]
    fn test_account_authority_recursion() {
        let mut accounts = Accounts::new(&["alice", "bob", "multi"]);
        accounts.active.insert(
            "multi".into(),
            Authority::new(2)
                .with_account("alice".into(), 1)
                .with_account("bob".into(), 1),
        );
        let req = active(&["multi"]);
        assert!(matches!(
            accounts.check(&req, &[key("alice-active")], &Approvals::default()),
            AuthorityCheck::MissingActive { .. }
        ));
        assert!(accounts
            .check(&req, &[key("alice-active"), key("bob-active")], &Approvals::default())
            .is_satisfied());
    }

    #[test]
    fn test_missing_reports_used_signatures() {
        let accounts = Accounts::new(&["alice", "bob"]);
        let result = accounts.check(
            &active(&["alice", "bob"]),
            &[key("alice-active")],
            &Approvals::default(),
        );
        assert_eq!(
            result,
            AuthorityCheck::MissingActive {
                accounts: [AccountName::from("bob")].into_iter().collect(),
                used_signatures: [key("alice-active")].into_iter().collect(),
            }
        );
    }

    #[test]
    fn test_impossible_authority() {
        let auth = Authority::new(3).with_key(key("a"), 1).with_key(key("b"), 1);
        assert!(auth.is_impossible());
        assert!(!Authority::from_key(key("a")).is_impossible());
    }
}
