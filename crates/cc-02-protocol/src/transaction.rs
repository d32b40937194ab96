//! # Transactions
//!
//! An ordered list of operations with an expiration and a TaPoS reference
//! to a recent block. The transaction id is derived from the unsigned body;
//! the signature digest additionally commits to the chain id so signatures
//! cannot be replayed on another chain.

use crate::authority::{check_authority, Approvals, AuthorityCheck, AuthorityGetters};
use crate::errors::{ProtocolError, ProtocolResult};
use crate::operations::{required_authorities, Operation};
use serde::{Deserialize, Serialize};
use shared_crypto::{sha256, CompactSignature, PrivateKey, PublicKey, Sha256Writer};
use shared_types::{BlockId, ChainId, Hash, TimePointSec, TransactionId};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration: TimePointSec,
    pub operations: Vec<Operation>,
}

impl Transaction {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            ..Self::default()
        }
    }

    /// Canonical encoding.
    pub fn to_bytes(&self) -> ProtocolResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn digest(&self) -> ProtocolResult<Hash> {
        Ok(sha256(&self.to_bytes()?))
    }

    pub fn id(&self) -> ProtocolResult<TransactionId> {
        Ok(TransactionId::from_digest(&self.digest()?))
    }

    /// Digest that signatures cover: `sha256(chain_id || body)`.
    pub fn sig_digest(&self, chain_id: &ChainId) -> ProtocolResult<Hash> {
        let mut writer = Sha256Writer::new();
        writer.update(chain_id);
        writer.update(&self.to_bytes()?);
        Ok(writer.finalize())
    }

    /// Point the TaPoS fields at `reference`.
    pub fn set_reference_block(&mut self, reference: &BlockId) {
        self.ref_block_num = (reference.block_num() & 0xFFFF) as u16;
        self.ref_block_prefix = reference.ref_prefix();
    }

    pub fn set_expiration(&mut self, expiration: TimePointSec) {
        self.expiration = expiration;
    }

    /// Stateless validation of the whole batch.
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.operations.is_empty() {
            return Err(ProtocolError::EmptyTransaction);
        }
        for op in &self.operations {
            op.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub trx: Transaction,
    pub signatures: Vec<CompactSignature>,
}

impl From<Transaction> for SignedTransaction {
    fn from(trx: Transaction) -> Self {
        Self {
            trx,
            signatures: Vec::new(),
        }
    }
}

impl SignedTransaction {
    pub fn id(&self) -> ProtocolResult<TransactionId> {
        self.trx.id()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.trx.operations
    }

    pub fn expiration(&self) -> TimePointSec {
        self.trx.expiration
    }

    pub fn sign(&mut self, key: &PrivateKey, chain_id: &ChainId) -> ProtocolResult<&CompactSignature> {
        let digest = self.trx.sig_digest(chain_id)?;
        self.signatures.push(key.sign_compact(&digest)?);
        Ok(&self.signatures[self.signatures.len() - 1])
    }

    /// Keys recovered from the signatures. Two signatures from one key are
    /// rejected.
    pub fn get_signature_keys(&self, chain_id: &ChainId) -> ProtocolResult<BTreeSet<PublicKey>> {
        let digest = self.trx.sig_digest(chain_id)?;
        let mut keys = BTreeSet::new();
        for signature in &self.signatures {
            let key = PublicKey::recover(&digest, signature)?;
            if !keys.insert(key) {
                return Err(ProtocolError::DuplicateSignature(key));
            }
        }
        Ok(keys)
    }

    /// Check that the signatures satisfy every authority the operations
    /// require, with no signature left over.
    pub fn verify_authority(
        &self,
        chain_id: &ChainId,
        getters: AuthorityGetters<'_>,
        max_recursion: u32,
    ) -> ProtocolResult<()> {
        let keys = self.get_signature_keys(chain_id)?;
        self.check_authority(&keys, getters, max_recursion, &Approvals::default())
            .into_result()
    }

    pub fn check_authority(
        &self,
        keys: &BTreeSet<PublicKey>,
        getters: AuthorityGetters<'_>,
        max_recursion: u32,
        approvals: &Approvals,
    ) -> AuthorityCheck {
        let required = required_authorities(&self.trx.operations);
        check_authority(&required, keys, getters, max_recursion, approvals)
    }

    /// Leaf of the block merkle tree: digest of the signed transaction.
    pub fn merkle_digest(&self) -> ProtocolResult<Hash> {
        Ok(sha256(&bincode::serialize(self)?))
    }

    pub fn pack_size(&self) -> ProtocolResult<usize> {
        Ok(bincode::serialized_size(self)? as usize)
    }
}
